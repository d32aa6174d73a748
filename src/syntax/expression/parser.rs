//! Recursive descent parser for build-language expressions.
//!
//! Parses one attribute or element value into an [`Expr`] tree. Parsing never
//! fails: the first structural failure produces a single
//! [`ExprKind::Error`] node at the failure offset and the parse stops there.
//! Constructs that were open when the failure happened are returned as
//! partial nodes enclosing that error, so callers can see what was typed.

use std::ops::BitOr;

use smol_str::SmolStr;

use super::error::ExpressionErrorKind;
use super::node::{
    ArgumentLiteral, Expr, ExprKind, FunctionInvocation, InvocationKind, ItemTransform, MetadataRef,
    NameSpan,
};
use crate::base::{TextRange, TextSize};

/// Which constructs are legal at a call site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ExpressionOptions(u8);

impl ExpressionOptions {
    pub const NONE: Self = Self(0);
    /// `@(Item)` references.
    pub const ITEMS: Self = Self(1);
    /// `%(Metadata)` references.
    pub const METADATA: Self = Self(1 << 1);
    /// Top-level `;` splits values.
    pub const LISTS: Self = Self(1 << 2);
    /// Top-level `,` splits values.
    pub const COMMA_LISTS: Self = Self(1 << 3);
    pub const ITEMS_AND_METADATA: Self = Self(Self::ITEMS.0 | Self::METADATA.0);
    pub const ITEMS_METADATA_AND_LISTS: Self =
        Self(Self::ITEMS.0 | Self::METADATA.0 | Self::LISTS.0);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for ExpressionOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Parse `text` into an expression tree.
///
/// `base` is the offset of `text` within the document; every node's range is
/// `base + local offset`.
pub fn parse_expression(text: &str, options: ExpressionOptions, base: TextSize) -> Expr {
    Parser {
        text,
        bytes: text.as_bytes(),
        options,
        base: u32::from(base),
    }
    .parse_value()
}

/// A partial construct that contains the single error node.
type PResult = Result<(Expr, usize), Expr>;

struct Parser<'t> {
    text: &'t str,
    bytes: &'t [u8],
    options: ExpressionOptions,
    base: u32,
}

impl<'t> Parser<'t> {
    #[inline]
    fn range(&self, start: usize, end: usize) -> TextRange {
        TextRange::new(
            TextSize::from(self.base + start as u32),
            TextSize::from(self.base + end as u32),
        )
    }

    #[inline]
    fn peek(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    fn error(&self, kind: ExpressionErrorKind, at: usize, incomplete: Option<Expr>) -> Expr {
        Expr::new(
            self.range(at, at),
            ExprKind::Error {
                kind,
                incomplete: incomplete.map(Box::new),
            },
        )
    }

    fn local(&self, offset: TextSize) -> usize {
        (u32::from(offset) - self.base) as usize
    }

    fn name_span(&self, start: usize, end: usize) -> NameSpan {
        NameSpan {
            name: SmolStr::new(&self.text[start..end]),
            range: self.range(start, end),
        }
    }

    fn skip_ws(&self, mut pos: usize) -> usize {
        while self.peek(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        pos
    }

    fn is_separator(&self, b: u8) -> bool {
        (b == b';' && self.options.contains(ExpressionOptions::LISTS))
            || (b == b',' && self.options.contains(ExpressionOptions::COMMA_LISTS))
    }

    /// Scan an identifier starting at `pos`; returns `pos` if none.
    fn scan_name(&self, pos: usize) -> usize {
        let mut chars = self.text[pos..].char_indices();
        match chars.next() {
            Some((_, c)) if is_name_start(c) => {}
            _ => return pos,
        }
        for (i, c) in chars {
            if !is_name_char(c) {
                return pos + i;
            }
        }
        self.text.len()
    }

    /// Scan a dotted class name such as `System.IO.Path`.
    fn scan_class_name(&self, pos: usize) -> usize {
        let mut end = pos;
        loop {
            let next = self.scan_name(end);
            if next == end {
                return end;
            }
            end = next;
            if self.peek(end) == Some(b'.') {
                end += 1;
            } else {
                return end;
            }
        }
    }

    fn contains_ref_start(s: &str) -> bool {
        s.contains("$(") || s.contains("@(") || s.contains("%(")
    }

    /// Parse a nested region (quoted argument or transform body) with its own options.
    fn sub_expression(&self, start: usize, end: usize, options: ExpressionOptions) -> Expr {
        parse_expression(
            &self.text[start..end],
            options,
            TextSize::from(self.base + start as u32),
        )
    }

    // ========================================================================
    // TOP LEVEL
    // ========================================================================

    fn parse_value(&self) -> Expr {
        let len = self.bytes.len();
        let mut list: Vec<Expr> = Vec::new();
        let mut current: Vec<Expr> = Vec::new();
        let mut element_start = 0;
        let mut text_start = 0;
        let mut pos = 0;
        let mut stopped = false;

        while pos < len {
            let b = self.bytes[pos];
            if self.is_separator(b) {
                self.push_text(&mut current, text_start, pos);
                list.push(self.finish_element(std::mem::take(&mut current), element_start));
                list.push(Expr::new(self.range(pos, pos + 1), ExprKind::ListSeparator(b as char)));
                pos += 1;
                text_start = pos;
                element_start = pos;
                continue;
            }
            if !matches!(b, b'$' | b'@' | b'%') || self.peek(pos + 1) != Some(b'(') {
                pos += 1;
                continue;
            }

            self.push_text(&mut current, text_start, pos);
            let parsed = match b {
                b'$' => self.parse_property(pos),
                b'@' if !self.options.contains(ExpressionOptions::ITEMS) => {
                    Err(self.error(ExpressionErrorKind::ItemsDisallowed, pos, None))
                }
                b'@' => self.parse_item(pos),
                _ if !self.options.contains(ExpressionOptions::METADATA) => {
                    Err(self.error(ExpressionErrorKind::MetadataDisallowed, pos, None))
                }
                _ => self.parse_metadata(pos),
            };
            match parsed {
                Ok((node, end)) => {
                    current.push(node);
                    pos = end;
                    text_start = end;
                }
                Err(partial) => {
                    current.push(partial);
                    stopped = true;
                    break;
                }
            }
        }

        if !stopped {
            self.push_text(&mut current, text_start, len);
        }
        let last = self.finish_element(current, element_start);
        if list.is_empty() {
            return last;
        }
        list.push(last);
        let end = list.last().map_or(len, |n| self.local(n.range.end()));
        Expr::new(self.range(0, end), ExprKind::List(list))
    }

    fn push_text(&self, nodes: &mut Vec<Expr>, start: usize, end: usize) {
        if end > start {
            nodes.push(Expr::new(
                self.range(start, end),
                ExprKind::Text {
                    value: SmolStr::new(&self.text[start..end]),
                    is_pure: false,
                },
            ));
        }
    }

    fn finish_element(&self, mut nodes: Vec<Expr>, start: usize) -> Expr {
        match nodes.len() {
            0 => Expr::new(
                self.range(start, start),
                ExprKind::Text {
                    value: SmolStr::default(),
                    is_pure: true,
                },
            ),
            1 => {
                let mut node = nodes.remove(0);
                if let ExprKind::Text { is_pure, .. } = &mut node.kind {
                    *is_pure = true;
                }
                node
            }
            _ => {
                let start = nodes.iter().map(|n| n.range.start()).min().unwrap_or_default();
                let end = nodes.iter().map(|n| n.range.end()).max().unwrap_or_default();
                Expr::new(TextRange::new(start, end), ExprKind::Concat(nodes))
            }
        }
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    fn parse_property(&self, start: usize) -> PResult {
        let wrap = |inner: Expr, end: usize| {
            Expr::new(self.range(start, end), ExprKind::Property(Box::new(inner)))
        };
        let mut pos = start + 2;

        if self.text[pos..].starts_with("Registry:") {
            let path_start = pos + "Registry:".len();
            return match self.text[path_start..].find(')') {
                Some(i) => {
                    let close = path_start + i;
                    let reg = Expr::new(
                        self.range(path_start, close),
                        ExprKind::RegistryReference(SmolStr::new(&self.text[path_start..close])),
                    );
                    Ok((wrap(reg, close + 1), close + 1))
                }
                None => {
                    let len = self.bytes.len();
                    let reg = Expr::new(
                        self.range(path_start, len),
                        ExprKind::RegistryReference(SmolStr::new(&self.text[path_start..])),
                    );
                    Err(self.error(ExpressionErrorKind::ExpectingRightParen, len, Some(wrap(reg, len))))
                }
            };
        }

        let mut target = if self.peek(pos) == Some(b'[') {
            match self.parse_static(pos) {
                Ok((node, end)) => {
                    pos = end;
                    node
                }
                Err(partial) => {
                    let end = self.local(partial.range.end());
                    return Err(wrap(partial, end));
                }
            }
        } else {
            let name_end = self.scan_name(pos);
            if name_end == pos {
                return Err(self.error(ExpressionErrorKind::ExpectingPropertyName, pos, None));
            }
            let node = Expr::new(
                self.range(pos, name_end),
                ExprKind::Name(SmolStr::new(&self.text[pos..name_end])),
            );
            pos = name_end;
            node
        };

        loop {
            match self.peek(pos) {
                Some(b')') => return Ok((wrap(target, pos + 1), pos + 1)),
                Some(b'.') => {
                    let name_start = pos + 1;
                    let name_end = self.scan_name(name_start);
                    let name = self.name_span(name_start, name_end);
                    if name_end == name_start {
                        let partial = self.invocation(InvocationKind::PropertyMethod, target, name, None, start, name_start);
                        return Err(self.error(
                            ExpressionErrorKind::ExpectingMethodName,
                            name_start,
                            Some(wrap(partial, name_start)),
                        ));
                    }
                    pos = name_end;
                    if self.peek(pos) == Some(b'(') {
                        match self.parse_arguments(pos, b')') {
                            Ok((args, end)) => {
                                target = self.invocation(InvocationKind::PropertyMethod, target, name, Some(args), start, end);
                                pos = end;
                            }
                            Err(args) => {
                                let end = args.last().map_or(pos, |a| self.local(a.range.end()));
                                let partial = self.invocation(InvocationKind::PropertyMethod, target, name, Some(args), start, end);
                                return Err(wrap(partial, end));
                            }
                        }
                    } else {
                        target = self.invocation(InvocationKind::PropertyMethod, target, name, None, start, pos);
                    }
                }
                Some(b'[') => {
                    let name = self.name_span(pos, pos);
                    match self.parse_arguments(pos, b']') {
                        Ok((args, end)) => {
                            target = self.invocation(InvocationKind::Indexer, target, name, Some(args), start, end);
                            pos = end;
                        }
                        Err(args) => {
                            let end = args.last().map_or(pos, |a| self.local(a.range.end()));
                            let partial = self.invocation(InvocationKind::Indexer, target, name, Some(args), start, end);
                            return Err(wrap(partial, end));
                        }
                    }
                }
                _ => {
                    return Err(self.error(
                        ExpressionErrorKind::ExpectingRightParenOrPeriod,
                        pos,
                        Some(wrap(target, pos)),
                    ));
                }
            }
        }
    }

    fn invocation(
        &self,
        kind: InvocationKind,
        target: Expr,
        name: NameSpan,
        arguments: Option<Vec<Expr>>,
        start: usize,
        end: usize,
    ) -> Expr {
        // Static invocations start at their class reference, not at `$(`.
        let start = if kind == InvocationKind::Static {
            self.local(target.range.start()).saturating_sub(1)
        } else {
            self.local(target.range.start()).max(start)
        };
        Expr::new(
            self.range(start, end),
            ExprKind::Invocation(Box::new(FunctionInvocation {
                kind,
                target,
                name,
                arguments,
            })),
        )
    }

    /// `[Class.Name]::Member` or `[Class.Name]::Method(args)`, starting at `[`.
    fn parse_static(&self, open: usize) -> PResult {
        let name_start = open + 1;
        let name_end = self.scan_class_name(name_start);
        if name_end == name_start {
            return Err(self.error(ExpressionErrorKind::ExpectingClassName, name_start, None));
        }
        let class = Expr::new(
            self.range(name_start, name_end),
            ExprKind::ClassReference(SmolStr::new(&self.text[name_start..name_end])),
        );
        if !self.text[name_end..].starts_with("]::") {
            return Err(self.error(ExpressionErrorKind::ExpectingBracketColonColon, name_end, Some(class)));
        }

        let method_start = name_end + 3;
        let method_end = self.scan_name(method_start);
        let name = self.name_span(method_start, method_end);
        if method_end == method_start {
            let partial = self.invocation(InvocationKind::Static, class, name, None, open, method_start);
            return Err(self.error(ExpressionErrorKind::ExpectingMethodName, method_start, Some(partial)));
        }
        if self.peek(method_end) != Some(b'(') {
            let node = self.invocation(InvocationKind::Static, class, name, None, open, method_end);
            return Ok((node, method_end));
        }
        match self.parse_arguments(method_end, b')') {
            Ok((args, end)) => Ok((
                self.invocation(InvocationKind::Static, class, name, Some(args), open, end),
                end,
            )),
            Err(args) => {
                let end = args.last().map_or(method_end, |a| self.local(a.range.end()));
                Err(self.invocation(InvocationKind::Static, class, name, Some(args), open, end))
            }
        }
    }

    // ========================================================================
    // ARGUMENTS
    // ========================================================================

    /// Parse `(a, b)` or `[i]` starting at the opening delimiter.
    ///
    /// On failure the returned arguments end with the node containing the error.
    fn parse_arguments(&self, open: usize, close: u8) -> Result<(Vec<Expr>, usize), Vec<Expr>> {
        let mut args = Vec::new();
        let mut pos = self.skip_ws(open + 1);
        if self.peek(pos) == Some(close) {
            return Ok((args, pos + 1));
        }
        loop {
            match self.parse_argument(pos) {
                Ok((arg, end)) => {
                    args.push(arg);
                    pos = self.skip_ws(end);
                }
                Err(partial) => {
                    args.push(partial);
                    return Err(args);
                }
            }
            match self.peek(pos) {
                Some(b) if b == close => return Ok((args, pos + 1)),
                Some(b',') if close == b')' => pos = self.skip_ws(pos + 1),
                _ => {
                    let kind = if close == b')' {
                        ExpressionErrorKind::ExpectingRightParenOrComma
                    } else {
                        ExpressionErrorKind::ExpectingRightBracket
                    };
                    args.push(self.error(kind, pos, None));
                    return Err(args);
                }
            }
        }
    }

    fn parse_argument(&self, pos: usize) -> PResult {
        let next_is_paren = self.peek(pos + 1) == Some(b'(');
        match self.peek(pos) {
            Some(q @ (b'\'' | b'"' | b'`')) => self.parse_quoted(pos, q),
            Some(b'$') if next_is_paren => self.parse_property(pos),
            Some(b'%') if next_is_paren => {
                if self.options.contains(ExpressionOptions::METADATA) {
                    self.parse_metadata(pos)
                } else {
                    Err(self.error(ExpressionErrorKind::MetadataDisallowed, pos, None))
                }
            }
            Some(b'@') if next_is_paren => {
                if self.options.contains(ExpressionOptions::ITEMS) {
                    self.parse_item(pos)
                } else {
                    Err(self.error(ExpressionErrorKind::ItemsDisallowed, pos, None))
                }
            }
            _ => {
                let mut end = pos;
                while self
                    .peek(end)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'+' | b'-'))
                {
                    end += 1;
                }
                let raw = &self.text[pos..end];
                let literal = if raw.eq_ignore_ascii_case("true") {
                    Some(ArgumentLiteral::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(ArgumentLiteral::Bool(false))
                } else if let Ok(i) = raw.parse::<i64>() {
                    Some(ArgumentLiteral::Int(i))
                } else if raw.contains('.') {
                    raw.parse::<f64>().ok().map(ArgumentLiteral::Float)
                } else {
                    None
                };
                match literal {
                    Some(lit) if !raw.is_empty() => {
                        Ok((Expr::new(self.range(pos, end), ExprKind::Argument(lit)), end))
                    }
                    _ => Err(self.error(ExpressionErrorKind::ExpectingValue, pos, None)),
                }
            }
        }
    }

    /// A quoted argument. Content with references is parsed as a nested expression.
    fn parse_quoted(&self, open: usize, quote: u8) -> PResult {
        let content_start = open + 1;
        let close = self.text[content_start..]
            .find(quote as char)
            .map(|i| content_start + i);
        let content_end = close.unwrap_or(self.bytes.len());
        let content = &self.text[content_start..content_end];

        let node = if Self::contains_ref_start(content) {
            let inner_options = self.options.without(ExpressionOptions::LISTS.union(ExpressionOptions::COMMA_LISTS));
            let inner = self.sub_expression(content_start, content_end, inner_options);
            let end = close.map_or(content_end, |c| c + 1);
            let has_error = inner.error().is_some();
            let node = Expr::new(
                self.range(open, end),
                ExprKind::Quoted {
                    quote: quote as char,
                    expr: Box::new(inner),
                },
            );
            if has_error {
                return Err(node);
            }
            node
        } else {
            let end = close.map_or(content_end, |c| c + 1);
            Expr::new(
                self.range(open, end),
                ExprKind::Argument(ArgumentLiteral::String(SmolStr::new(content))),
            )
        };

        match close {
            Some(c) => Ok((node, c + 1)),
            None => Err(self.error(ExpressionErrorKind::IncompleteString, content_end, Some(node))),
        }
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    fn parse_item(&self, start: usize) -> PResult {
        let wrap = |inner: Expr, end: usize| {
            Expr::new(self.range(start, end), ExprKind::Item(Box::new(inner)))
        };
        let name_start = start + 2;
        let name_end = self.scan_name(name_start);
        if name_end == name_start {
            return Err(self.error(ExpressionErrorKind::ExpectingItemName, name_start, None));
        }
        let mut target = Expr::new(
            self.range(name_start, name_end),
            ExprKind::Name(SmolStr::new(&self.text[name_start..name_end])),
        );
        let mut pos = name_end;

        loop {
            match self.peek(pos) {
                Some(b')') => return Ok((wrap(target, pos + 1), pos + 1)),
                Some(b'-') => {
                    if self.peek(pos + 1) != Some(b'>') {
                        return Err(self.error(
                            ExpressionErrorKind::ExpectingRightAngleBracket,
                            pos + 1,
                            Some(wrap(target, pos + 1)),
                        ));
                    }
                    pos += 2;
                    if self.peek(pos) == Some(b'\'') {
                        match self.parse_transform(target, pos, name_start) {
                            Ok((node, end)) => return Ok((wrap(node, end), end)),
                            Err(partial) => {
                                let end = self.local(partial.range.end());
                                return Err(wrap(partial, end));
                            }
                        }
                    }
                    let method_end = self.scan_name(pos);
                    let name = self.name_span(pos, method_end);
                    if method_end == pos {
                        return Err(self.error(
                            ExpressionErrorKind::ExpectingMethodOrTransform,
                            pos,
                            Some(wrap(target, pos)),
                        ));
                    }
                    pos = method_end;
                    if self.peek(pos) == Some(b'(') {
                        match self.parse_arguments(pos, b')') {
                            Ok((args, end)) => {
                                target = self.invocation(InvocationKind::ItemMethod, target, name, Some(args), name_start, end);
                                pos = end;
                            }
                            Err(args) => {
                                let end = args.last().map_or(pos, |a| self.local(a.range.end()));
                                let partial = self.invocation(InvocationKind::ItemMethod, target, name, Some(args), name_start, end);
                                return Err(wrap(partial, end));
                            }
                        }
                    } else {
                        target = self.invocation(InvocationKind::ItemMethod, target, name, None, name_start, pos);
                    }
                }
                Some(b',') => match self.parse_separator_tail(target, None, pos, name_start) {
                    Ok((node, end)) => return Ok((wrap(node, end), end)),
                    Err(partial) => {
                        let end = self.local(partial.range.end());
                        return Err(wrap(partial, end));
                    }
                },
                _ => {
                    return Err(self.error(
                        ExpressionErrorKind::ExpectingRightParenOrDash,
                        pos,
                        Some(wrap(target, pos)),
                    ));
                }
            }
        }
    }

    fn transform_node(&self, target: Expr, transform: Option<Expr>, separator: Option<Expr>, start: usize, end: usize) -> Expr {
        Expr::new(
            self.range(start, end),
            ExprKind::Transform(Box::new(ItemTransform {
                target,
                transform,
                separator,
            })),
        )
    }

    /// `'body'` after `->`, then an optional `, 'separator'`, then `)`.
    fn parse_transform(&self, target: Expr, open: usize, start: usize) -> PResult {
        let body_start = open + 1;
        let close = self.text[body_start..].find('\'').map(|i| body_start + i);
        let body_end = close.unwrap_or(self.bytes.len());
        let body = self.sub_expression(body_start, body_end, ExpressionOptions::METADATA);

        let Some(close) = close else {
            if body.error().is_some() {
                return Err(self.transform_node(target, Some(body), None, start, body_end));
            }
            let partial = self.transform_node(target, Some(body), None, start, body_end);
            return Err(self.error(ExpressionErrorKind::ExpectingApostrophe, body_end, Some(partial)));
        };
        if body.error().is_some() {
            return Err(self.transform_node(target, Some(body), None, start, close));
        }

        let pos = self.skip_ws(close + 1);
        match self.peek(pos) {
            Some(b')') => Ok((self.transform_node(target, Some(body), None, start, close + 1), pos + 1)),
            Some(b',') => self.parse_separator_tail(target, Some(body), pos, start),
            _ => {
                let partial = self.transform_node(target, Some(body), None, start, close + 1);
                Err(self.error(ExpressionErrorKind::ExpectingRightParenOrComma, pos, Some(partial)))
            }
        }
    }

    /// `, 'separator')` at the end of an item reference, starting at the comma.
    fn parse_separator_tail(&self, target: Expr, transform: Option<Expr>, comma: usize, start: usize) -> PResult {
        let pos = self.skip_ws(comma + 1);
        let quote = match self.peek(pos) {
            Some(q @ (b'\'' | b'"')) => q,
            _ => {
                let partial = self.transform_node(target, transform, None, start, comma + 1);
                return Err(self.error(ExpressionErrorKind::ExpectingValue, pos, Some(partial)));
            }
        };
        match self.parse_quoted(pos, quote) {
            Ok((sep, end)) => {
                let after = self.skip_ws(end);
                let node = self.transform_node(target, transform, Some(sep), start, end);
                if self.peek(after) == Some(b')') {
                    Ok((node, after + 1))
                } else {
                    Err(self.error(ExpressionErrorKind::ExpectingRightParen, after, Some(node)))
                }
            }
            Err(partial) => {
                let end = self.local(partial.range.end());
                Err(self.transform_node(target, transform, Some(partial), start, end))
            }
        }
    }

    // ========================================================================
    // METADATA
    // ========================================================================

    /// `%(Name)` or `%(Item.Name)`. Whitespace is tolerated around names and the dot.
    fn parse_metadata(&self, start: usize) -> PResult {
        let node = |item: Option<NameSpan>, name: NameSpan, end: usize| {
            Expr::new(self.range(start, end), ExprKind::Metadata(MetadataRef { item, name }))
        };
        let first_start = self.skip_ws(start + 2);
        let first_end = self.scan_name(first_start);
        if first_end == first_start {
            return Err(self.error(ExpressionErrorKind::ExpectingMetadataOrItemName, first_start, None));
        }
        let first = self.name_span(first_start, first_end);
        let pos = self.skip_ws(first_end);

        match self.peek(pos) {
            Some(b')') => Ok((node(None, first, pos + 1), pos + 1)),
            Some(b'.') => {
                let second_start = self.skip_ws(pos + 1);
                let second_end = self.scan_name(second_start);
                let second = self.name_span(second_start, second_end);
                if second_end == second_start {
                    return Err(self.error(
                        ExpressionErrorKind::ExpectingMetadataName,
                        second_start,
                        Some(node(Some(first), second, second_start)),
                    ));
                }
                let close = self.skip_ws(second_end);
                if self.peek(close) == Some(b')') {
                    Ok((node(Some(first), second, close + 1), close + 1))
                } else {
                    Err(self.error(
                        ExpressionErrorKind::ExpectingRightParen,
                        close,
                        Some(node(Some(first), second, close)),
                    ))
                }
            }
            _ => Err(self.error(
                ExpressionErrorKind::ExpectingRightParenOrPeriod,
                pos,
                Some(node(None, first, pos)),
            )),
        }
    }
}

/// First character of a property, item, metadata or method name.
pub fn is_name_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Subsequent characters of a name.
pub fn is_name_char(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, options: ExpressionOptions) -> Expr {
        parse_expression(text, options, TextSize::from(0))
    }

    fn error_kind(expr: &Expr) -> Option<ExpressionErrorKind> {
        match &expr.error()?.kind {
            ExprKind::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[test]
    fn test_plain_text_is_pure() {
        let expr = parse("hello world", ExpressionOptions::NONE);
        assert!(expr.is_pure_text());
        assert_eq!(u32::from(expr.range.len()), 11);
    }

    #[test]
    fn test_empty_text() {
        let expr = parse("", ExpressionOptions::LISTS);
        assert!(expr.is_pure_text());
        assert!(expr.range.is_empty());
    }

    #[test]
    fn test_property_name() {
        let expr = parse("$(Foo)", ExpressionOptions::NONE);
        let ExprKind::Property(inner) = &expr.kind else { panic!("{expr:?}") };
        assert_eq!(inner.kind, ExprKind::Name("Foo".into()));
        assert_eq!(inner.range, TextRange::new(2.into(), 5.into()));
        assert_eq!(expr.range, TextRange::new(0.into(), 6.into()));
    }

    #[test]
    fn test_concat_marks_text_impure() {
        let expr = parse("bin\\$(Configuration)\\", ExpressionOptions::NONE);
        let ExprKind::Concat(nodes) = &expr.kind else { panic!("{expr:?}") };
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[0].kind, ExprKind::Text { is_pure: false, .. }));
        assert!(matches!(nodes[1].kind, ExprKind::Property(_)));
    }

    #[test]
    fn test_property_whitespace_is_error() {
        assert_eq!(
            error_kind(&parse("$( Foo)", ExpressionOptions::NONE)),
            Some(ExpressionErrorKind::ExpectingPropertyName)
        );
        assert_eq!(
            error_kind(&parse("$(Foo )", ExpressionOptions::NONE)),
            Some(ExpressionErrorKind::ExpectingRightParenOrPeriod)
        );
    }

    #[test]
    fn test_base_offset_applies() {
        let expr = parse_expression("$(Foo)", ExpressionOptions::NONE, TextSize::from(100));
        assert_eq!(expr.range, TextRange::new(100.into(), 106.into()));
    }

    #[test]
    fn test_items_disallowed() {
        let expr = parse("a @(Foo)", ExpressionOptions::NONE);
        assert_eq!(error_kind(&expr), Some(ExpressionErrorKind::ItemsDisallowed));
        assert_eq!(expr.error().unwrap().range.start(), TextSize::from(2));
    }

    #[test]
    fn test_metadata_disallowed() {
        let expr = parse("%(Foo)", ExpressionOptions::ITEMS);
        assert_eq!(error_kind(&expr), Some(ExpressionErrorKind::MetadataDisallowed));
    }

    #[test]
    fn test_percent_without_paren_is_text() {
        assert!(parse("100%", ExpressionOptions::NONE).is_pure_text());
    }

    #[test]
    fn test_registry_reference() {
        let expr = parse("$(Registry:HKEY_LOCAL_MACHINE\\Software@Value)", ExpressionOptions::NONE);
        let ExprKind::Property(inner) = &expr.kind else { panic!() };
        assert_eq!(
            inner.kind,
            ExprKind::RegistryReference("HKEY_LOCAL_MACHINE\\Software@Value".into())
        );
    }

    #[test]
    fn test_comma_list_only_when_enabled() {
        let expr = parse("a,b", ExpressionOptions::LISTS);
        assert!(expr.is_pure_text());
        let expr = parse("a,b", ExpressionOptions::COMMA_LISTS);
        assert_eq!(expr.values().len(), 2);
    }

    #[test]
    fn test_separator_inside_reference_does_not_split() {
        let expr = parse("$(Foo.Replace(';', ','))", ExpressionOptions::LISTS | ExpressionOptions::COMMA_LISTS);
        assert!(matches!(expr.kind, ExprKind::Property(_)));
    }

    #[test]
    fn test_find_at_property_name() {
        let expr = parse("x$(Foo)y", ExpressionOptions::NONE);
        let node = expr.find_at(TextSize::from(4)).unwrap();
        assert_eq!(node.kind, ExprKind::Name("Foo".into()));
    }
}
