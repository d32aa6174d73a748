//! Foundation types for the MSBuild toolchain.
//!
//! This module provides fundamental types used throughout the engine:
//! - [`TextRange`], [`TextSize`] - Source positions
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`TextSource`] - Offset to slice access over document text
//! - [`SymbolName`] - Case-insensitive symbol identity
//!
//! This module has NO dependencies on other msbuild modules.

mod name;
mod span;

pub use name::{NameRef, SymbolName, SymbolTable, SymbolTableExt, is_private_name};
pub use span::{LineCol, LineIndex, TextRange, TextSize, TextSource};

// Re-export text-size types for convenience
pub use text_size;
