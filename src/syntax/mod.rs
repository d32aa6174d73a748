//! Syntax layer: the positioned XML tree and the embedded expression language.
//!
//! - [`xml`] - tolerant, span-preserving element/attribute tree
//! - [`expression`] - parser for `$(Property)`, `@(Item)`, `%(Metadata)` values

pub mod expression;
pub mod xml;

pub use expression::{
    ArgumentLiteral, Expr, ExprKind, ExpressionErrorKind, ExpressionOptions, FunctionInvocation, InvocationKind,
    ItemTransform, MetadataRef, NameSpan, parse_expression,
};
pub use xml::{XAttribute, XDocument, XElement, XSpine};
