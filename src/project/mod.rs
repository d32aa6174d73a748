//! Host adapters: document stores, import and SDK resolution on disk,
//! and workspace loading.

mod file_set;
mod import_resolver;
mod sdk;
mod workspace_loader;

pub use file_set::{FileSet, FileSystemSource, OverlaySource};
pub use import_resolver::FileSystemImportResolver;
pub use sdk::{CachingSdkResolver, DirectorySdkResolver};
pub use workspace_loader::{WorkspaceError, WorkspaceLoader, collect_build_files, is_build_file};
