//! Semantic layer: the document walker and resolution contexts.
//!
//! This module turns a positioned XML tree into symbol knowledge:
//!
//! - [`walk_document`] - grammar-driven traversal with one hook per
//!   declaration and reference site
//! - [`build_resolution_context`] - symbol inference over a file and its
//!   import closure
//! - [`resolve`] - what the symbol under a caret is
//! - [`ReferenceCollector`] - every span naming one symbol
//! - [`validate_document`] - advisory diagnostics for the top-level file

mod build;
mod collector;
mod context;
mod diagnostics;
mod error;
mod host;
mod references;
mod resolve;
mod validate;
mod walker;

pub use build::{BuildOptions, BuildSession, build_resolution_context};
pub use collector::PropertyValueCollector;
pub use context::{AnnotationKind, ContextIter, Import, NavigationAnnotation, ResolutionContext};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use error::{BuildError, LoadError, SdkResolveError};
pub use host::{DocumentSource, ImportRequest, ImportResolver, LoadedDocument, SdkReference, SdkResolver};
pub use references::{ReferenceCollector, ReferenceSpan};
pub use resolve::{CaretValue, Reference, ResolveResult, reference_at, resolve, value_at};
pub use validate::validate_document;
pub use walker::{
    AttributeRole, ElementScope, Value, ValueSite, WalkHandler, attribute_value_shape, content_value_shape,
    root_name, trimmed_text, trimmed_value, walk_document, walk_expression,
};
