use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::file_set::FileSet;
use crate::hir::LoadError;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("failed to load {} file(s)", .0.len())]
    Load(Vec<LoadError>),
}

/// Whether a path looks like a build file: `*.*proj`, `*.props` or `*.targets`.
pub fn is_build_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    ext.ends_with("proj") || ext == "props" || ext == "targets"
}

/// All build files under `dir`, sorted.
pub fn collect_build_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_build_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}

/// Loads build files from disk into a [`FileSet`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkspaceLoader;

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every build file under `dir`, reading in parallel.
    ///
    /// Files that load are stored even when others fail; the failures are
    /// returned together.
    pub fn load_directory(&self, dir: impl AsRef<Path>, files: &FileSet) -> Result<usize, WorkspaceError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(WorkspaceError::DirectoryNotFound(dir.to_path_buf()));
        }
        let paths = collect_build_files(dir);
        debug!("loading {} build file(s) from {}", paths.len(), dir.display());

        let results: Vec<_> = paths
            .par_iter()
            .map(|path| std::fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e)))
            .collect();

        let mut loaded = 0;
        let mut errors = Vec::new();
        for (path, result) in paths.into_iter().zip(results) {
            match result {
                Ok(text) => {
                    files.set_contents(path, Arc::<str>::from(text));
                    loaded += 1;
                }
                Err(e) => {
                    warn!("{e}");
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(loaded)
        } else {
            Err(WorkspaceError::Load(errors))
        }
    }

    /// Load a single file.
    pub fn load_file(&self, path: impl Into<PathBuf>, files: &FileSet) -> Result<(), LoadError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| LoadError::from_io(&path, e))?;
        files.set_contents(path, Arc::<str>::from(text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_build_file() {
        assert!(is_build_file(Path::new("a.csproj")));
        assert!(is_build_file(Path::new("a.PROJ")));
        assert!(is_build_file(Path::new("Directory.Build.props")));
        assert!(is_build_file(Path::new("x.targets")));
        assert!(!is_build_file(Path::new("a.cs")));
        assert!(!is_build_file(Path::new("Makefile")));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.proj"), "<Project />").unwrap();
        fs::write(dir.path().join("sub/b.targets"), "<Project />").unwrap();
        fs::write(dir.path().join("readme.md"), "# no").unwrap();

        let files = FileSet::new();
        let loaded = WorkspaceLoader::new().load_directory(dir.path(), &files).unwrap();
        assert_eq!(loaded, 2);
        assert!(files.contains(&dir.path().join("sub/b.targets")));
        assert!(!files.contains(&dir.path().join("readme.md")));
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkspaceLoader::new()
            .load_directory(dir.path().join("nope"), &FileSet::new())
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::DirectoryNotFound(_)));
    }
}
