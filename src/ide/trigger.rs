//! Per-keystroke completion trigger classification.
//!
//! Works on the value text from its start up to the caret. One forward scan
//! tracks the open `$(`, `@(`, `%(`, call, bracket and quote frames; the
//! innermost frame and the text typed inside it decide the state and how
//! much text a completion replaces. No document state or I/O is involved.

use smol_str::SmolStr;

use crate::base::TextSize;
use crate::schema::ValueKind;
use crate::syntax::expression::{is_name_char, is_name_start};
use crate::syntax::{Expr, ExprKind, ExpressionOptions, parse_expression};

// ============================================================================
// TYPES
// ============================================================================

/// Why completion is being considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerReason {
    /// The user asked for completion.
    Explicit,
    /// A character was typed; the text already ends with it.
    TypedChar(char),
    Backspace,
}

/// Which top-level separators split the value being edited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListKind {
    #[default]
    None,
    Semicolon,
    Comma,
    SemicolonOrComma,
}

impl ListKind {
    /// The list kind a value of `kind` is written with.
    pub fn for_kind(kind: ValueKind) -> Self {
        match (kind.is_list(), kind.is_comma_list()) {
            (true, true) => ListKind::SemicolonOrComma,
            (true, false) => ListKind::Semicolon,
            (false, true) => ListKind::Comma,
            (false, false) => ListKind::None,
        }
    }

    pub fn is_separator(self, c: char) -> bool {
        match self {
            ListKind::None => false,
            ListKind::Semicolon => c == ';',
            ListKind::Comma => c == ',',
            ListKind::SemicolonOrComma => c == ';' || c == ',',
        }
    }
}

/// What kind of completion applies at the caret.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TriggerState {
    /// A bare value, or the next element of a list.
    Value,
    PropertyName,
    ItemName,
    /// After `%(`: an unqualified metadata name or the item of a qualified one.
    MetadataOrItemName,
    /// After `%(Item.`.
    QualifiedMetadataName { item: SmolStr },
    /// After `$(Name.` or a chained call.
    PropertyFunctionName,
    /// After `@(Name->`.
    ItemFunctionName,
    /// After `$([`.
    PropertyFunctionClassName,
    /// After `$([Class]::`.
    PropertyFunctionStaticName { class: SmolStr },
    /// A bare function argument.
    FunctionArgument,
    /// A path segment after `/` or `\`.
    DirectorySeparator,
}

impl TriggerState {
    /// Whether typing `typed` as the last character of the state's opener
    /// opens completion on its own, before any name character is typed.
    pub fn is_auto_trigger(&self, typed: char) -> bool {
        match self {
            TriggerState::Value => matches!(typed, ';' | ',' | '\''),
            TriggerState::PropertyName | TriggerState::ItemName | TriggerState::MetadataOrItemName => typed == '(',
            TriggerState::QualifiedMetadataName { .. } | TriggerState::PropertyFunctionName => typed == '.',
            TriggerState::ItemFunctionName => typed == '>',
            TriggerState::PropertyFunctionClassName => typed == '[',
            TriggerState::PropertyFunctionStaticName { .. } => typed == ':',
            TriggerState::DirectorySeparator => matches!(typed, '/' | '\\'),
            TriggerState::FunctionArgument => false,
        }
    }

    /// States that name a property, item or metadata.
    pub fn is_name(&self) -> bool {
        matches!(
            self,
            TriggerState::PropertyName
                | TriggerState::ItemName
                | TriggerState::MetadataOrItemName
                | TriggerState::QualifiedMetadataName { .. }
        )
    }
}

/// A classified caret position.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerResult {
    pub state: TriggerState,
    /// Bytes before the caret that a chosen completion replaces.
    pub length: usize,
    /// The parsed expression segment containing the caret.
    pub node: Expr,
    /// Properties on the opposite side of a condition comparison, when the
    /// caret is in a quoted comparand.
    pub comparands: Vec<SmolStr>,
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Classify the caret at the end of `text`.
///
/// `text` is the value from its start up to the caret. Returns `None` when
/// no completion should open.
pub fn get_trigger_state(
    text: &str,
    reason: TriggerReason,
    is_condition: bool,
    list: ListKind,
) -> Option<TriggerResult> {
    if matches!(reason, TriggerReason::TypedChar('\n' | '\r')) {
        return None;
    }
    let list = if is_condition { ListKind::None } else { list };
    let scan = Scan::run(text, is_condition, list);

    let (state, length) = scan.classify(text, reason)?;

    let node_start = scan
        .frames
        .iter()
        .find(|f| f.kind == FrameKind::Comparand)
        .map_or(scan.segment_start, |f| f.start);
    let node = parse_expression(
        &text[node_start..],
        ExpressionOptions::ITEMS_AND_METADATA,
        TextSize::from(node_start as u32),
    );
    let comparands = match scan.frames.last() {
        Some(f) if f.kind == FrameKind::Comparand => scan
            .opposing
            .map(|(start, end)| comparand_properties(&text[start..end], start))
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    Some(TriggerResult {
        state,
        length,
        node,
        comparands,
    })
}

// ============================================================================
// SCANNER
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameKind {
    Property,
    Item,
    Metadata,
    /// `(` of a function call or a condition group.
    Call { group: bool },
    Bracket,
    /// A quoted string inside a reference or call.
    Quote(char),
    /// A `'...'` operand of a condition.
    Comparand,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    kind: FrameKind,
    /// Byte offset just past the opener.
    start: usize,
    /// Start of the current argument, for calls.
    arg_start: usize,
}

impl Frame {
    fn new(kind: FrameKind, start: usize) -> Self {
        Self {
            kind,
            start,
            arg_start: start,
        }
    }
}

#[derive(Debug)]
struct Scan {
    frames: Vec<Frame>,
    /// Start of the top-level segment the caret is in.
    segment_start: usize,
    /// Content span of the last closed comparand.
    last_comparand: Option<(usize, usize)>,
    /// Content span of the comparand compared against the open one.
    opposing: Option<(usize, usize)>,
}

impl Scan {
    fn run(text: &str, is_condition: bool, list: ListKind) -> Self {
        let bytes = text.as_bytes();
        let mut scan = Scan {
            frames: Vec::new(),
            segment_start: 0,
            last_comparand: None,
            opposing: None,
        };
        let mut chars = text.char_indices();
        while let Some((i, c)) = chars.next() {
            let opens_paren = bytes.get(i + 1) == Some(&b'(');
            let reference = match c {
                '$' if opens_paren => Some(FrameKind::Property),
                '@' if opens_paren => Some(FrameKind::Item),
                '%' if opens_paren => Some(FrameKind::Metadata),
                _ => None,
            };
            if let Some(kind) = reference {
                chars.next();
                scan.frames.push(Frame::new(kind, i + 2));
                continue;
            }

            let top = scan.frames.last().map(|f| f.kind);
            match top {
                Some(FrameKind::Quote(q)) => {
                    if c == q {
                        scan.frames.pop();
                    }
                    continue;
                }
                Some(FrameKind::Comparand) => {
                    if c == '\'' {
                        if let Some(frame) = scan.frames.pop() {
                            scan.last_comparand = Some((frame.start, i));
                        }
                        scan.segment_start = i + 1;
                    }
                    continue;
                }
                _ => {}
            }

            let condition_scope =
                is_condition && matches!(top, None | Some(FrameKind::Call { group: true }));
            match c {
                '(' => {
                    let group = text[..i]
                        .chars()
                        .next_back()
                        .is_none_or(|p| !is_name_char(p));
                    scan.frames.push(Frame::new(FrameKind::Call { group }, i + 1));
                    if condition_scope {
                        scan.segment_start = i + 1;
                    }
                }
                '[' => scan.frames.push(Frame::new(FrameKind::Bracket, i + 1)),
                ']' if top == Some(FrameKind::Bracket) => {
                    scan.frames.pop();
                }
                ')' if matches!(
                    top,
                    Some(FrameKind::Property | FrameKind::Item | FrameKind::Metadata | FrameKind::Call { .. })
                ) =>
                {
                    scan.frames.pop();
                    if scan.frames.is_empty() && is_condition {
                        scan.segment_start = i + 1;
                    }
                }
                '\'' if condition_scope => {
                    scan.opposing = scan.last_comparand.filter(|&(_, end)| {
                        let between = text.get(end + 1..i).unwrap_or("").trim();
                        between == "==" || between == "!="
                    });
                    scan.frames.push(Frame::new(FrameKind::Comparand, i + 1));
                }
                '\'' | '"' | '`' if top.is_some() => {
                    scan.frames.push(Frame::new(FrameKind::Quote(c), i + 1));
                }
                ',' if matches!(top, Some(FrameKind::Call { .. })) => {
                    if let Some(frame) = scan.frames.last_mut() {
                        frame.arg_start = i + 1;
                    }
                }
                _ if top.is_none() && list.is_separator(c) => scan.segment_start = i + 1,
                _ if condition_scope && (c.is_whitespace() || matches!(c, '=' | '!' | '<' | '>')) => {
                    scan.segment_start = i + c.len_utf8();
                }
                _ => {}
            }
        }
        scan
    }

    fn classify(&self, text: &str, reason: TriggerReason) -> Option<(TriggerState, usize)> {
        let Some(frame) = self.frames.last() else {
            return bare_value(text, self.segment_start, TriggerState::Value, reason);
        };
        let inner = &text[frame.start..];
        match frame.kind {
            FrameKind::Comparand => bare_value(text, frame.start, TriggerState::Value, reason),
            FrameKind::Quote(_) => bare_value(text, frame.start, TriggerState::FunctionArgument, reason),
            FrameKind::Call { group: true } => bare_value(text, self.segment_start, TriggerState::Value, reason),
            FrameKind::Call { group: false } => {
                let arg = &text[frame.arg_start..];
                let start = frame.arg_start + (arg.len() - arg.trim_start().len());
                bare_value(text, start, TriggerState::FunctionArgument, reason)
            }
            FrameKind::Bracket => {
                let parent = self.frames.len().checked_sub(2).map(|i| self.frames[i])?;
                if parent.kind != FrameKind::Property || parent.start + 1 != frame.start {
                    return None;
                }
                if !inner.chars().all(|c| is_name_char(c) || c == '.')
                    || inner.chars().next().is_some_and(|c| !is_name_start(c))
                {
                    return None;
                }
                gate_name(TriggerState::PropertyFunctionClassName, inner, reason)
            }
            FrameKind::Property => {
                let (state, run) = property_state(inner)?;
                gate_name(state, run, reason)
            }
            FrameKind::Item => {
                let (state, run) = item_state(inner)?;
                gate_name(state, run, reason)
            }
            FrameKind::Metadata => {
                let (state, run) = metadata_state(inner)?;
                gate_name(state, run, reason)
            }
        }
    }
}

// ============================================================================
// CLASSIFIERS
// ============================================================================

/// The longest suffix of name characters.
fn trailing_run(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_name_char(c))
        .last()
        .map_or(text.len(), |(i, _)| i);
    &text[start..]
}

fn is_valid_run(run: &str) -> bool {
    run.chars().next().is_none_or(is_name_start)
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_name_start) && chars.all(is_name_char)
}

fn property_state(inner: &str) -> Option<(TriggerState, &str)> {
    let run = trailing_run(inner);
    if !is_valid_run(run) {
        return None;
    }
    let before = &inner[..inner.len() - run.len()];
    if before.is_empty() {
        return Some((TriggerState::PropertyName, run));
    }
    if let Some(class) = before.strip_prefix('[').and_then(|b| b.strip_suffix("]::")) {
        let valid = !class.is_empty() && class.split('.').all(is_name);
        return valid.then(|| (TriggerState::PropertyFunctionStaticName { class: class.into() }, run));
    }
    let receiver = before.strip_suffix('.')?;
    let last = receiver.chars().next_back()?;
    (is_name_char(last) || last == ')' || last == ']').then_some((TriggerState::PropertyFunctionName, run))
}

fn item_state(inner: &str) -> Option<(TriggerState, &str)> {
    let run = trailing_run(inner);
    if !is_valid_run(run) {
        return None;
    }
    let before = &inner[..inner.len() - run.len()];
    if before.is_empty() {
        return Some((TriggerState::ItemName, run));
    }
    let receiver = before.strip_suffix("->")?;
    (!receiver.trim().is_empty()).then_some((TriggerState::ItemFunctionName, run))
}

fn metadata_state(inner: &str) -> Option<(TriggerState, &str)> {
    let run = trailing_run(inner);
    if !is_valid_run(run) {
        return None;
    }
    let before = &inner[..inner.len() - run.len()];
    if before.trim().is_empty() {
        return Some((TriggerState::MetadataOrItemName, run));
    }
    let item = before.trim_end().strip_suffix('.')?.trim();
    is_name(item).then(|| (TriggerState::QualifiedMetadataName { item: item.into() }, run))
}

/// Apply the trigger reason to a name-like state whose typed part is `run`.
fn gate_name(state: TriggerState, run: &str, reason: TriggerReason) -> Option<(TriggerState, usize)> {
    let accepted = match reason {
        TriggerReason::Explicit => true,
        TriggerReason::TypedChar(c) if run.is_empty() => state.is_auto_trigger(c),
        TriggerReason::TypedChar(c) => run.len() == c.len_utf8() && run.starts_with(c) && is_name_start(c),
        TriggerReason::Backspace => {
            run.is_empty()
                && matches!(
                    state,
                    TriggerState::PropertyName | TriggerState::ItemName | TriggerState::MetadataOrItemName
                )
        }
    };
    accepted.then(|| (state, run.len()))
}

/// Classify a bare value (or function argument) starting at `start`.
fn bare_value(
    text: &str,
    start: usize,
    state: TriggerState,
    reason: TriggerReason,
) -> Option<(TriggerState, usize)> {
    let value = &text[start..];
    let boundary = text[..start].chars().next_back();

    if let Some(sep) = value.rfind(['/', '\\']) {
        let segment = &value[sep + 1..];
        let accepted = match reason {
            TriggerReason::Explicit => !segment.contains(['$', '@', '%', '(', ')']),
            TriggerReason::TypedChar(c) if segment.is_empty() => matches!(c, '/' | '\\'),
            TriggerReason::TypedChar(c) => segment.len() == c.len_utf8() && segment.starts_with(c) && is_name_start(c),
            TriggerReason::Backspace => false,
        };
        return accepted.then_some((TriggerState::DirectorySeparator, segment.len()));
    }

    let run = trailing_run(value);
    let accepted = match reason {
        TriggerReason::Explicit => value.is_empty() || !run.is_empty(),
        TriggerReason::TypedChar(c) if value.is_empty() => {
            state == TriggerState::Value && boundary == Some(c) && state.is_auto_trigger(c)
        }
        TriggerReason::TypedChar(c) => {
            value.len() == c.len_utf8()
                && value.starts_with(c)
                && (is_name_start(c) || (c == '*' && state == TriggerState::Value))
        }
        TriggerReason::Backspace => value.is_empty(),
    };
    let length = if value == "*" { 1 } else { run.len() };
    accepted.then_some((state, length))
}

/// Property names in a comparand made only of `$(Name)` references and text.
fn comparand_properties(text: &str, base: usize) -> Vec<SmolStr> {
    let expr = parse_expression(text, ExpressionOptions::NONE, TextSize::from(base as u32));
    let parts: Vec<&Expr> = match &expr.kind {
        ExprKind::Concat(nodes) => nodes.iter().collect(),
        _ => vec![&expr],
    };
    let mut names = Vec::new();
    for part in parts {
        match &part.kind {
            ExprKind::Property(inner) => match &inner.kind {
                ExprKind::Name(name) => names.push(name.clone()),
                _ => return Vec::new(),
            },
            ExprKind::Text { .. } => {}
            _ => return Vec::new(),
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str, reason: TriggerReason) -> Option<(TriggerState, usize)> {
        get_trigger_state(text, reason, false, ListKind::Semicolon).map(|r| (r.state, r.length))
    }

    #[test]
    fn test_literal_cases() {
        assert_eq!(state("", TriggerReason::Explicit), Some((TriggerState::Value, 0)));
        assert_eq!(state("$(", TriggerReason::Explicit), Some((TriggerState::PropertyName, 0)));
        assert_eq!(state("$(a", TriggerReason::Explicit), Some((TriggerState::PropertyName, 1)));
        assert_eq!(state("$(a-", TriggerReason::Explicit), None);
    }

    #[test]
    fn test_newline_never_triggers() {
        assert_eq!(state("foo\n", TriggerReason::TypedChar('\n')), None);
    }

    #[test]
    fn test_comparands_from_opposite_operand() {
        let result = get_trigger_state(
            "'$(Configuration)|$(Platform)' == '",
            TriggerReason::TypedChar('\''),
            true,
            ListKind::None,
        )
        .unwrap();
        assert_eq!(result.state, TriggerState::Value);
        assert_eq!(result.comparands, ["Configuration", "Platform"]);
    }

    #[test]
    fn test_comparands_require_pure_references() {
        let result =
            get_trigger_state("'$(Foo.Trim())' == 'a", TriggerReason::Explicit, true, ListKind::None).unwrap();
        assert!(result.comparands.is_empty());
        assert_eq!(result.length, 1);
    }

    #[test]
    fn test_node_covers_current_segment() {
        let result = get_trigger_state("a;$(Fo", TriggerReason::Explicit, false, ListKind::Semicolon).unwrap();
        assert!(result.node.range.start() >= TextSize::from(2));
        assert!(result.node.error().is_some());
    }

    #[test]
    fn test_list_kind_for_value_kind() {
        assert_eq!(ListKind::for_kind(ValueKind::STRING), ListKind::None);
        assert_eq!(ListKind::for_kind(ValueKind::STRING.list()), ListKind::Semicolon);
        assert_eq!(ListKind::for_kind(ValueKind::STRING.comma_list()), ListKind::Comma);
    }
}
