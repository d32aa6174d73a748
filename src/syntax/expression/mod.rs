//! Build-language expressions: `$(Property)`, `@(Item)`, `%(Metadata)`,
//! property and item functions, transforms, and `;`/`,` lists.

mod error;
mod node;
mod parser;

pub use error::ExpressionErrorKind;
pub use node::{
    ArgumentLiteral, Expr, ExprKind, FunctionInvocation, InvocationKind, ItemTransform, MetadataRef,
    NameSpan,
};
pub use parser::{ExpressionOptions, is_name_char, is_name_start, parse_expression};

impl Expr {
    /// The single error node and its ancestors, outermost first.
    pub fn error_path(&self) -> Option<Vec<&Expr>> {
        fn search<'a>(node: &'a Expr, path: &mut Vec<&'a Expr>) -> bool {
            path.push(node);
            if node.is_error() {
                return true;
            }
            for child in node.children() {
                if search(child, path) {
                    return true;
                }
            }
            path.pop();
            false
        }
        let mut path = Vec::new();
        search(self, &mut path).then_some(path)
    }

    /// The error kind, if parsing stopped early.
    pub fn error_kind(&self) -> Option<ExpressionErrorKind> {
        match &self.error()?.kind {
            ExprKind::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
