//! SDK resolvers backed by directories on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::hir::{SdkReference, SdkResolveError, SdkResolver};

/// Looks up `<root>/<Name>/Sdk` (or `<root>/<Name>/<Version>/Sdk`) under each
/// root in order.
#[derive(Clone, Debug, Default)]
pub struct DirectorySdkResolver {
    roots: Vec<PathBuf>,
}

impl DirectorySdkResolver {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl SdkResolver for DirectorySdkResolver {
    fn resolve_sdk(&self, sdk: &SdkReference, _project: &Path) -> Result<Option<PathBuf>, SdkResolveError> {
        if !is_valid_component(&sdk.name) || sdk.version.as_deref().is_some_and(|v| !is_valid_component(v)) {
            return Err(SdkResolveError::InvalidReference(sdk.to_string()));
        }
        for root in &self.roots {
            let mut candidates = Vec::with_capacity(2);
            if let Some(version) = &sdk.version {
                candidates.push(root.join(sdk.name.as_str()).join(version.as_str()).join("Sdk"));
            }
            candidates.push(root.join(sdk.name.as_str()).join("Sdk"));
            for candidate in candidates {
                trace!("probing SDK directory {}", candidate.display());
                if candidate.is_dir() {
                    debug!("resolved SDK '{}' to {}", sdk, candidate.display());
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }
}

fn is_valid_component(text: &str) -> bool {
    !text.is_empty() && text != "." && text != ".." && !text.contains(['/', '\\', ':'])
}

/// Memoizes another resolver's answers, including "not found".
///
/// Readers clone an `Arc` snapshot of the map; writers publish a new map.
/// Errors are not cached.
#[derive(Debug, Default)]
pub struct CachingSdkResolver<R> {
    inner: R,
    cache: RwLock<Arc<FxHashMap<SdkReference, Option<PathBuf>>>>,
}

impl<R: SdkResolver> CachingSdkResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: RwLock::new(Arc::new(FxHashMap::default())),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Forget everything resolved so far.
    pub fn clear(&self) {
        *self.cache.write() = Arc::new(FxHashMap::default());
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl<R: SdkResolver> SdkResolver for CachingSdkResolver<R> {
    fn resolve_sdk(&self, sdk: &SdkReference, project: &Path) -> Result<Option<PathBuf>, SdkResolveError> {
        let snapshot = self.cache.read().clone();
        if let Some(hit) = snapshot.get(sdk) {
            return Ok(hit.clone());
        }
        let resolved = self.inner.resolve_sdk(sdk, project)?;
        let mut guard = self.cache.write();
        let mut next = (**guard).clone();
        next.insert(sdk.clone(), resolved.clone());
        *guard = Arc::new(next);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_directory_resolver_layouts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("My.Sdk/Sdk")).unwrap();
        fs::create_dir_all(dir.path().join("My.Sdk/2.0/Sdk")).unwrap();
        let resolver = DirectorySdkResolver::new([dir.path().to_path_buf()]);
        let project = Path::new("/p.proj");

        let plain = resolver.resolve_sdk(&SdkReference::new("My.Sdk"), project).unwrap();
        assert_eq!(plain, Some(dir.path().join("My.Sdk/Sdk")));

        let versioned = resolver.resolve_sdk(&SdkReference::parse("My.Sdk/2.0").unwrap(), project).unwrap();
        assert_eq!(versioned, Some(dir.path().join("My.Sdk/2.0/Sdk")));

        let missing = resolver.resolve_sdk(&SdkReference::new("Other.Sdk"), project).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_directory_resolver_rejects_paths() {
        let resolver = DirectorySdkResolver::new([PathBuf::from("/sdks")]);
        let err = resolver.resolve_sdk(&SdkReference::new("../etc"), Path::new("/p.proj"));
        assert!(matches!(err, Err(SdkResolveError::InvalidReference(_))));
    }

    struct Counting(AtomicUsize);

    impl SdkResolver for Counting {
        fn resolve_sdk(&self, sdk: &SdkReference, _project: &Path) -> Result<Option<PathBuf>, SdkResolveError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok((sdk.name == "Found").then(|| PathBuf::from("/sdk")))
        }
    }

    #[test]
    fn test_caching_resolver_memoizes_hits_and_misses() {
        let resolver = CachingSdkResolver::new(Counting(AtomicUsize::new(0)));
        let project = Path::new("/p.proj");
        for _ in 0..3 {
            assert!(resolver.resolve_sdk(&SdkReference::new("Found"), project).unwrap().is_some());
            assert!(resolver.resolve_sdk(&SdkReference::new("Missing"), project).unwrap().is_none());
        }
        assert_eq!(resolver.inner().0.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_len(), 2);

        resolver.clear();
        assert_eq!(resolver.cached_len(), 0);
    }
}
