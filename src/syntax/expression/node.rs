//! Expression AST.
//!
//! Every node carries its [`TextRange`] in the original document, even when
//! the parser ran over a substring with a base offset.

use smol_str::SmolStr;

use super::error::ExpressionErrorKind;
use crate::base::{TextRange, TextSize};

/// A node in a parsed expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub range: TextRange,
    pub kind: ExprKind,
}

/// The shape of an expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Literal text. `is_pure` is set when the text is a whole value on its
    /// own rather than a fragment of a concatenation.
    Text { value: SmolStr, is_pure: bool },
    /// A `;` or `,` boundary inside a [`ExprKind::List`]. Not a value.
    ListSeparator(char),
    /// `$(...)`, wrapping a name, invocation, or registry reference.
    Property(Box<Expr>),
    /// `@(...)`, wrapping a name, invocation, or transform.
    Item(Box<Expr>),
    /// `%(Name)` or `%(Item.Name)`.
    Metadata(MetadataRef),
    /// A bare property or item name inside `$()`/`@()`.
    Name(SmolStr),
    /// `@(Item->'transform', 'separator')`.
    Transform(Box<ItemTransform>),
    /// `.Method(args)`, `->Method(args)`, `[index]`, or `[Class]::Member(args)`.
    Invocation(Box<FunctionInvocation>),
    /// A literal function argument.
    Argument(ArgumentLiteral),
    /// A quoted function argument containing references, parsed as an expression.
    Quoted { quote: char, expr: Box<Expr> },
    /// `[System.IO.Path]` in a static invocation.
    ClassReference(SmolStr),
    /// `Registry:HKEY_...@Value` inside `$()`.
    RegistryReference(SmolStr),
    /// Adjacent text and references forming a single value.
    Concat(Vec<Expr>),
    /// A separated list of values; boundaries appear as [`ExprKind::ListSeparator`].
    List(Vec<Expr>),
    /// The parse stopped here. `incomplete` holds the partial construct, if any.
    Error {
        kind: ExpressionErrorKind,
        incomplete: Option<Box<Expr>>,
    },
}

/// A metadata reference with optional item qualifier.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRef {
    pub item: Option<NameSpan>,
    pub name: NameSpan,
}

/// A name and its span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameSpan {
    pub name: SmolStr,
    pub range: TextRange,
}

/// `@(target->'transform', 'separator')`.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemTransform {
    pub target: Expr,
    /// `None` for the separator-only form `@(Items, ';')`.
    pub transform: Option<Expr>,
    pub separator: Option<Expr>,
}

/// How an invocation was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// `$(Prop.Method(...))`
    PropertyMethod,
    /// `@(Item->Method(...))`
    ItemMethod,
    /// `$([Class]::Method(...))`
    Static,
    /// `$(Prop[i])`
    Indexer,
}

/// A function or member invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionInvocation {
    pub kind: InvocationKind,
    pub target: Expr,
    /// Method name; empty for indexers.
    pub name: NameSpan,
    /// `None` when written without parentheses (static members such as `NewLine`).
    pub arguments: Option<Vec<Expr>>,
}

/// A literal function argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgumentLiteral {
    String(SmolStr),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Expr {
    pub fn new(range: TextRange, kind: ExprKind) -> Self {
        Self { range, kind }
    }

    pub fn offset(&self) -> TextSize {
        self.range.start()
    }

    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error { .. })
    }

    /// Whether the expression contains only literal text.
    pub fn is_pure_text(&self) -> bool {
        matches!(self.kind, ExprKind::Text { is_pure: true, .. })
    }

    /// The first error node in the tree, if parsing stopped early.
    pub fn error(&self) -> Option<&Expr> {
        self.walk().into_iter().find(|e| e.is_error())
    }

    /// List values, excluding separators. A non-list is a single value.
    pub fn values(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::List(nodes) => nodes
                .iter()
                .filter(|n| !matches!(n.kind, ExprKind::ListSeparator(_)))
                .collect(),
            _ => vec![self],
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Property(inner) | ExprKind::Item(inner) => vec![inner],
            ExprKind::Quoted { expr, .. } => vec![expr],
            ExprKind::Transform(t) => {
                let mut out = vec![&t.target];
                out.extend(t.transform.iter());
                out.extend(t.separator.iter());
                out
            }
            ExprKind::Invocation(inv) => {
                let mut out = vec![&inv.target];
                if let Some(args) = &inv.arguments {
                    out.extend(args.iter());
                }
                out
            }
            ExprKind::Concat(nodes) | ExprKind::List(nodes) => nodes.iter().collect(),
            ExprKind::Error { incomplete, .. } => incomplete.iter().map(|b| b.as_ref()).collect(),
            ExprKind::Text { .. }
            | ExprKind::ListSeparator(_)
            | ExprKind::Metadata(_)
            | ExprKind::Name(_)
            | ExprKind::Argument(_)
            | ExprKind::ClassReference(_)
            | ExprKind::RegistryReference(_) => Vec::new(),
        }
    }

    /// Pre-order traversal of the whole tree.
    pub fn walk(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = node.children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// The deepest node whose span contains `offset` (end-inclusive).
    pub fn find_at(&self, offset: TextSize) -> Option<&Expr> {
        if !self.range.contains_inclusive(offset) && !self.is_error() {
            return None;
        }
        for child in self.children() {
            if let Some(found) = child.find_at(offset) {
                return Some(found);
            }
        }
        self.range.contains_inclusive(offset).then_some(self)
    }
}

impl ExprKind {
    /// A short label for diagnostics and debugging.
    pub fn label(&self) -> &'static str {
        match self {
            ExprKind::Text { .. } => "text",
            ExprKind::ListSeparator(_) => "separator",
            ExprKind::Property(_) => "property",
            ExprKind::Item(_) => "item",
            ExprKind::Metadata(_) => "metadata",
            ExprKind::Name(_) => "name",
            ExprKind::Transform(_) => "transform",
            ExprKind::Invocation(_) => "invocation",
            ExprKind::Argument(_) => "argument",
            ExprKind::Quoted { .. } => "quoted",
            ExprKind::ClassReference(_) => "class",
            ExprKind::RegistryReference(_) => "registry",
            ExprKind::Concat(_) => "concat",
            ExprKind::List(_) => "list",
            ExprKind::Error { .. } => "error",
        }
    }
}
