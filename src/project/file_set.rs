//! Document stores: open editor buffers and the file system.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::hir::{DocumentSource, LoadError, LoadedDocument};

/// In-memory path → text store.
///
/// Shared between the host and background builds; reads take a read lock
/// only long enough to clone the text handle.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<IndexMap<PathBuf, LoadedDocument>>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contents of a file, stamping it with the current time.
    pub fn set_contents(&self, path: impl Into<PathBuf>, contents: impl Into<Arc<str>>) {
        let document = LoadedDocument {
            text: contents.into(),
            timestamp: Some(SystemTime::now()),
        };
        self.inner.write().insert(path.into(), document);
    }

    pub fn contents(&self, path: &Path) -> Option<Arc<str>> {
        self.inner.read().get(path).map(|d| d.text.clone())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.read().contains_key(path)
    }

    pub fn remove(&self, path: &Path) -> bool {
        self.inner.write().shift_remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All paths, in insertion order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.inner.read().keys().cloned().collect()
    }
}

impl DocumentSource for FileSet {
    fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
        self.inner
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}

/// Reads documents from disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystemSource;

impl DocumentSource for FileSystemSource {
    fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))?;
        let timestamp = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        Ok(LoadedDocument {
            text: Arc::from(text),
            timestamp,
        })
    }
}

/// Open buffers first, then the file system.
#[derive(Debug)]
pub struct OverlaySource<'a> {
    pub files: &'a FileSet,
    pub fallback: FileSystemSource,
}

impl<'a> OverlaySource<'a> {
    pub fn new(files: &'a FileSet) -> Self {
        Self {
            files,
            fallback: FileSystemSource,
        }
    }
}

impl DocumentSource for OverlaySource<'_> {
    fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
        match self.files.load(path) {
            Ok(doc) => Ok(doc),
            Err(LoadError::NotFound(_)) => self.fallback.load(path),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_set_contents() {
        let files = FileSet::new();
        let path = Path::new("/test.proj");
        assert!(files.contents(path).is_none());

        files.set_contents(path, "<Project />");
        assert_eq!(files.contents(path).as_deref(), Some("<Project />"));
        assert_eq!(files.len(), 1);

        assert!(files.remove(path));
        assert!(files.is_empty());
    }

    #[test]
    fn test_file_set_load_missing() {
        let files = FileSet::new();
        let err = files.load(Path::new("/missing.props")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_overlay_prefers_open_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.props");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "<Project>disk</Project>").unwrap();

        let files = FileSet::new();
        let overlay = OverlaySource::new(&files);
        assert_eq!(&*overlay.load(&path).unwrap().text, "<Project>disk</Project>");

        files.set_contents(&path, "<Project>buffer</Project>");
        assert_eq!(&*overlay.load(&path).unwrap().text, "<Project>buffer</Project>");
    }

    #[test]
    fn test_file_system_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSystemSource.load(&dir.path().join("nope.targets")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
