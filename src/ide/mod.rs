//! IDE features — High-level APIs for editor integrations.
//!
//! This module provides the interface between the semantic model (HIR)
//! and an editor protocol layer. Each function corresponds to an editor
//! request.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take data in, return data out
//! 2. **No protocol types**: Uses our own types, converted at the boundary
//! 3. **Composable**: Built on top of HIR queries
//!
//! ## Usage
//!
//! The recommended way to use this module is through `AnalysisHost`:
//!
//! ```ignore
//! use msbuild::ide::{AnalysisHost, TriggerReason};
//!
//! let host = AnalysisHost::new();
//! host.set_file_content("/src/app.proj", "<Project>...</Project>");
//!
//! let analysis = host.analyze(Path::new("/src/app.proj"), &CancellationToken::new())?;
//! let items = analysis.completions(offset, TriggerReason::Explicit);
//! ```

mod analysis;
mod completion;
mod document_links;
mod folding;
mod goto;
mod hover;
mod references;
mod semantic_tokens;
mod trigger;

pub use analysis::{Analysis, AnalysisError, AnalysisHost};
pub use completion::{CompletionContext, CompletionItem, CompletionKind, completions};
pub use document_links::{DocumentLink, document_links};
pub use folding::{FoldingRange, folding_ranges};
pub use goto::{GotoResult, GotoTarget, goto_definition};
pub use hover::{HoverResult, hover};
pub use references::{ReferenceLocation, find_references};
pub use semantic_tokens::{SemanticToken, TokenType, semantic_tokens};
pub use trigger::{ListKind, TriggerReason, TriggerResult, TriggerState, get_trigger_state};
