//! Semantic tokens — syntax highlighting based on semantic analysis.
//!
//! Tokens come from the same document walk that builds resolution contexts,
//! so declarations and expression references are classified the same way
//! everywhere.

use crate::base::{LineIndex, TextRange};
use crate::hir::{ElementScope, WalkHandler, walk_document};
use crate::schema::SymbolKind;
use crate::syntax::{ExprKind, FunctionInvocation, InvocationKind, XDocument};

/// Token type for semantic highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Property,
    Item,
    Metadata,
    Target,
    Task,
    Parameter,
    Function,
    Class,
}

impl TokenType {
    /// Convert to LSP token type index.
    pub fn to_lsp_index(self) -> u32 {
        match self {
            TokenType::Property => 0,
            TokenType::Item => 1,
            TokenType::Metadata => 2,
            TokenType::Target => 3,
            TokenType::Task => 4,
            TokenType::Parameter => 5,
            TokenType::Function => 6,
            TokenType::Class => 7,
        }
    }

    /// LSP legend, indexed by [`TokenType::to_lsp_index`].
    pub const LEGEND: [&'static str; 8] = [
        "variable",
        "type",
        "property",
        "function",
        "class",
        "parameter",
        "method",
        "namespace",
    ];
}

impl From<SymbolKind> for TokenType {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Property | SymbolKind::Constant => TokenType::Property,
            SymbolKind::Item => TokenType::Item,
            SymbolKind::Metadata => TokenType::Metadata,
            SymbolKind::Target => TokenType::Target,
            SymbolKind::Task => TokenType::Task,
            SymbolKind::TaskParameter => TokenType::Parameter,
            SymbolKind::Function => TokenType::Function,
            SymbolKind::Class => TokenType::Class,
        }
    }
}

/// A semantic token for syntax highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticToken {
    /// Line number (0-indexed)
    pub line: u32,
    /// Column number (0-indexed)
    pub col: u32,
    /// Length of the token in bytes
    pub length: u32,
    /// The token type
    pub token_type: TokenType,
    pub is_declaration: bool,
}

/// Get semantic tokens for a document.
///
/// Returns vector of semantic tokens sorted by position. Tokens spanning
/// several lines are dropped.
pub fn semantic_tokens(doc: &XDocument) -> Vec<SemanticToken> {
    let mut collector = TokenCollector {
        index: doc.line_index(),
        tokens: Vec::new(),
    };
    walk_document(doc, &mut collector);

    let mut tokens = collector.tokens;
    // Sort tokens by position (line, then column)
    tokens.sort_by_key(|t| (t.line, t.col));
    tokens.dedup_by_key(|t| (t.line, t.col));
    tokens
}

struct TokenCollector<'a> {
    index: &'a LineIndex,
    tokens: Vec<SemanticToken>,
}

impl TokenCollector<'_> {
    fn push(&mut self, range: TextRange, token_type: TokenType, is_declaration: bool) {
        if range.is_empty() {
            return;
        }
        let (start, end) = self.index.line_cols(range);
        if start.line != end.line {
            return;
        }
        self.tokens.push(SemanticToken {
            line: start.line,
            col: start.col,
            length: end.col - start.col,
            token_type,
            is_declaration,
        });
    }
}

impl WalkHandler for TokenCollector<'_> {
    fn property_declaration(&mut self, _scope: &ElementScope<'_>, _name: &str, range: TextRange) {
        self.push(range, TokenType::Property, true);
    }

    fn item_declaration(&mut self, _scope: &ElementScope<'_>, _name: &str, range: TextRange) {
        self.push(range, TokenType::Item, true);
    }

    fn metadata_declaration(&mut self, _scope: &ElementScope<'_>, _item: &str, _name: &str, range: TextRange) {
        self.push(range, TokenType::Metadata, true);
    }

    fn target_declaration(&mut self, _scope: &ElementScope<'_>, _name: &str, range: TextRange) {
        self.push(range, TokenType::Target, true);
    }

    fn task_declaration(&mut self, _scope: &ElementScope<'_>, _name: &str, range: TextRange) {
        self.push(range, TokenType::Task, true);
    }

    fn task_parameter_declaration(
        &mut self,
        _scope: &ElementScope<'_>,
        _task: &str,
        _name: &str,
        range: TextRange,
        _is_output: bool,
        _is_required: bool,
    ) {
        self.push(range, TokenType::Parameter, true);
    }

    fn task_invocation(&mut self, _scope: &ElementScope<'_>, _name: &str, range: TextRange) {
        self.push(range, TokenType::Task, false);
    }

    fn task_parameter_usage(&mut self, _scope: &ElementScope<'_>, _task: &str, _name: &str, range: TextRange) {
        self.push(range, TokenType::Parameter, false);
    }

    fn task_output(&mut self, _scope: &ElementScope<'_>, _task: &str, _name: &str, range: TextRange) {
        self.push(range, TokenType::Parameter, false);
    }

    fn property_reference(&mut self, _name: &str, range: TextRange) {
        self.push(range, TokenType::Property, false);
    }

    fn item_reference(&mut self, _name: &str, range: TextRange) {
        self.push(range, TokenType::Item, false);
    }

    fn metadata_reference(&mut self, _item: Option<&str>, _name: &str, range: TextRange) {
        self.push(range, TokenType::Metadata, false);
    }

    fn target_reference(&mut self, _name: &str, range: TextRange) {
        self.push(range, TokenType::Target, false);
    }

    fn function_invocation(&mut self, invocation: &FunctionInvocation, _range: TextRange) {
        if invocation.kind == InvocationKind::Static {
            if let ExprKind::ClassReference(_) = invocation.target.kind {
                self.push(invocation.target.range, TokenType::Class, false);
            }
        }
        self.push(invocation.name.range, TokenType::Function, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_and_references() {
        let text = "<Project>\n  <PropertyGroup>\n    <Foo>$(Bar)</Foo>\n  </PropertyGroup>\n</Project>";
        let tokens = semantic_tokens(&XDocument::parse(text));
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.line, t.col, t.length, t.token_type, t.is_declaration))
            .collect();
        assert_eq!(
            summary,
            [
                (2, 5, 3, TokenType::Property, true),
                (2, 11, 3, TokenType::Property, false),
            ]
        );
    }

    #[test]
    fn test_function_tokens() {
        let text = "<Project><PropertyGroup><A>$(B.Trim())</A></PropertyGroup></Project>";
        let tokens = semantic_tokens(&XDocument::parse(text));
        assert!(tokens.iter().any(|t| t.token_type == TokenType::Function && t.length == 4));
    }

    #[test]
    fn test_non_project_root() {
        assert!(semantic_tokens(&XDocument::parse("<Foo><A /></Foo>")).is_empty());
    }
}
