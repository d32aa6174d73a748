//! # msbuild-base
//!
//! Core library for understanding MSBuild project files in an editor:
//! expression parsing, symbol inference across the import closure, and the
//! per-keystroke completion trigger engine.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide      → IDE features (completion triggers, completion, hover, references)
//!   ↓
//! project  → Host adapters (file sets, import path probing, SDK resolution)
//!   ↓
//! hir      → Document walker, resolution contexts, validation
//!   ↓
//! schema   → Value kinds, symbol records, built-in vocabulary, grammar
//!   ↓
//! syntax   → Positioned XML tree + expression parser
//!   ↓
//! base     → Primitives (TextRange, LineIndex, case-insensitive names)
//! ```

/// Foundation types: TextRange, LineIndex, SymbolName
pub mod base;

/// XML tree and expression syntax
pub mod syntax;

/// Value kinds, symbols, and the static build-language grammar
pub mod schema;

/// Document walker and resolution contexts
pub mod hir;

/// Host adapters for files, imports and SDKs
pub mod project;

/// IDE features: completion, hover, goto-definition, find-references
pub mod ide;

pub use base::{LineCol, LineIndex, SymbolName, TextRange, TextSize, TextSource};
pub use syntax::expression::{ExpressionOptions, parse_expression};
pub use syntax::xml::XDocument;
