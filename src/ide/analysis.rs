//! Analysis host — owns documents and resolvers, and serves IDE queries.
//!
//! [`AnalysisHost`] builds one [`Analysis`] per top-level file on demand and
//! caches it until any document changes. An `Analysis` is an immutable
//! snapshot: the parsed document, its resolution context and the property
//! values collected while building it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::completion::{CompletionContext, CompletionItem, completions};
use super::document_links::{DocumentLink, document_links};
use super::folding::{FoldingRange, folding_ranges};
use super::goto::{GotoResult, goto_definition};
use super::hover::{HoverResult, hover};
use super::references::{ReferenceLocation, find_references};
use super::semantic_tokens::{SemanticToken, semantic_tokens};
use super::trigger::{ListKind, TriggerReason, get_trigger_state};
use crate::base::{TextRange, TextSize, TextSource};
use crate::hir::{
    BuildError, BuildOptions, BuildSession, Diagnostic, DocumentSource, ImportResolver, LoadError,
    PropertyValueCollector, ResolutionContext, SdkResolver, build_resolution_context, value_at,
};
use crate::project::{
    CachingSdkResolver, DirectorySdkResolver, FileSet, FileSystemImportResolver, OverlaySource, WorkspaceError,
    WorkspaceLoader,
};
use crate::schema::{FunctionTypeProvider, SchemaProvider, SidecarSchemaProvider, StaticFunctionTypeProvider};
use crate::syntax::XDocument;

/// Why a file could not be analyzed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Owns open documents and the host capabilities used to resolve them.
pub struct AnalysisHost {
    files: FileSet,
    sdk_resolver: Arc<dyn SdkResolver>,
    import_resolver: Arc<dyn ImportResolver>,
    functions: Arc<dyn FunctionTypeProvider>,
    schemas: Option<Arc<dyn SchemaProvider>>,
    options: BuildOptions,
    cache: RwLock<AnalysisCache>,
}

/// Snapshots keyed by top-level file. `generation` advances on every
/// invalidation; a build started under an older generation is not cached.
#[derive(Default)]
struct AnalysisCache {
    generation: u64,
    entries: FxHashMap<PathBuf, Arc<Analysis>>,
}

impl AnalysisHost {
    /// A host resolving imports from disk, with no SDK roots.
    pub fn new() -> Self {
        Self {
            files: FileSet::new(),
            sdk_resolver: Arc::new(CachingSdkResolver::new(DirectorySdkResolver::new(Vec::new()))),
            import_resolver: Arc::new(FileSystemImportResolver),
            functions: Arc::new(StaticFunctionTypeProvider),
            schemas: Some(Arc::new(SidecarSchemaProvider)),
            options: BuildOptions::default(),
            cache: RwLock::new(AnalysisCache::default()),
        }
    }

    /// Look for SDKs as `<root>/<Name>/Sdk` under each root.
    pub fn with_sdk_roots(self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.with_sdk_resolver(Arc::new(CachingSdkResolver::new(DirectorySdkResolver::new(roots))))
    }

    pub fn with_sdk_resolver(mut self, resolver: Arc<dyn SdkResolver>) -> Self {
        self.sdk_resolver = resolver;
        self
    }

    pub fn with_import_resolver(mut self, resolver: Arc<dyn ImportResolver>) -> Self {
        self.import_resolver = resolver;
        self
    }

    pub fn with_functions(mut self, functions: Arc<dyn FunctionTypeProvider>) -> Self {
        self.functions = functions;
        self
    }

    /// Replace the explicit schema provider; `None` disables schema loading.
    pub fn with_schemas(mut self, schemas: Option<Arc<dyn SchemaProvider>>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// The open documents.
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Set the in-memory contents of a document, shadowing the disk.
    pub fn set_file_content(&self, path: impl Into<PathBuf>, contents: impl Into<Arc<str>>) {
        self.files.set_contents(path, contents);
        self.invalidate();
    }

    /// Forget a document's in-memory contents.
    pub fn remove_file(&self, path: &Path) -> bool {
        let removed = self.files.remove(path);
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Load every build file under `dir` into the host.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<usize, WorkspaceError> {
        let result = WorkspaceLoader::new().load_directory(dir, &self.files);
        self.invalidate();
        result
    }

    /// Drop every cached analysis. Any document may be imported by any
    /// other, so a change to one invalidates all of them.
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        cache.generation += 1;
        cache.entries.clear();
    }

    /// Analyze `path` as a top-level file, reusing a cached snapshot.
    pub fn analyze(&self, path: &Path, cancel: &CancellationToken) -> Result<Arc<Analysis>, AnalysisError> {
        let generation = {
            let cache = self.cache.read();
            if let Some(hit) = cache.entries.get(path) {
                return Ok(hit.clone());
            }
            cache.generation
        };

        let source = OverlaySource::new(&self.files);
        let loaded = source.load(path)?;
        let doc = XDocument::parse(loaded.text);

        let mut session = BuildSession::new(&*self.sdk_resolver, &*self.import_resolver, &source)
            .with_functions(&*self.functions)
            .with_options(self.options.clone())
            .with_cancellation(cancel.clone());
        if let Some(schemas) = &self.schemas {
            session = session.with_schemas(&**schemas);
        }
        let context = build_resolution_context(path, true, &doc, &mut session)?;
        let values = std::mem::take(&mut session.collector);
        debug!(
            "analyzed {}: {} diagnostics, {} files in closure",
            path.display(),
            context.diagnostics.len(),
            context.contexts().len()
        );

        let analysis = Arc::new(Analysis {
            path: Arc::from(path),
            doc,
            context: Arc::new(context),
            values,
            functions: self.functions.clone(),
        });
        let mut cache = self.cache.write();
        if cache.generation == generation {
            cache.entries.insert(path.to_path_buf(), analysis.clone());
        } else {
            debug!("not caching {}: documents changed during the build", path.display());
        }
        Ok(analysis)
    }

    /// Analyze several top-level files in parallel.
    pub fn analyze_many(
        &self,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Vec<(PathBuf, Result<Arc<Analysis>, AnalysisError>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.analyze(path, cancel)))
            .collect()
    }

    /// Every reference to the symbol at `offset`, across `analysis`'s import closure.
    pub fn find_references(
        &self,
        analysis: &Analysis,
        offset: TextSize,
        include_declaration: bool,
    ) -> Vec<ReferenceLocation> {
        let source = OverlaySource::new(&self.files);
        let files: Vec<Arc<Path>> = analysis.context.contexts().iter().map(|c| c.file.clone()).collect();
        let documents: Vec<(Arc<Path>, XDocument)> = files
            .into_par_iter()
            .filter_map(|file| match source.load(&file) {
                Ok(loaded) => Some((file, XDocument::parse(loaded.text))),
                Err(e) => {
                    warn!("skipping {} in reference search: {}", file.display(), e);
                    None
                }
            })
            .collect();
        find_references(&analysis.doc, offset, &analysis.context, &documents, include_declaration)
    }
}

impl Default for AnalysisHost {
    fn default() -> Self {
        Self::new()
    }
}

/// A built top-level file.
pub struct Analysis {
    pub path: Arc<Path>,
    pub doc: XDocument,
    pub context: Arc<ResolutionContext>,
    /// Literal property values seen while building `context`.
    pub values: PropertyValueCollector,
    functions: Arc<dyn FunctionTypeProvider>,
}

impl Analysis {
    /// Completion candidates for an edit at `offset`, or `None` when the edit
    /// should not open completion.
    pub fn completions(&self, offset: TextSize, reason: TriggerReason) -> Option<Vec<CompletionItem>> {
        let caret = value_at(offset, &self.doc)?;
        let typed = self.doc.slice(TextRange::new(caret.range.start(), offset))?;
        let trigger = get_trigger_state(typed, reason, caret.is_condition, ListKind::for_kind(caret.kind))?;
        let cx = CompletionContext {
            ctx: &self.context,
            functions: &*self.functions,
            values: &self.values,
            value_kind: caret.kind,
            item: caret.item.as_deref(),
            is_condition: caret.is_condition,
        };
        Some(completions(&cx, &trigger))
    }

    pub fn hover(&self, offset: TextSize) -> Option<HoverResult> {
        hover(&self.doc, offset, &self.context, &*self.functions)
    }

    pub fn goto_definition(&self, offset: TextSize) -> Option<GotoResult> {
        goto_definition(&self.doc, offset, &self.context)
    }

    pub fn document_links(&self) -> Vec<DocumentLink> {
        document_links(&self.context, self.doc.line_index())
    }

    pub fn folding_ranges(&self) -> Vec<FoldingRange> {
        folding_ranges(&self.doc)
    }

    pub fn semantic_tokens(&self) -> Vec<SemanticToken> {
        semantic_tokens(&self.doc)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.context.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::ImportRequest;
    use crate::ide::CompletionKind;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn offset_after(text: &str, marker: &str) -> TextSize {
        TextSize::from((text.find(marker).expect("marker") + marker.len()) as u32)
    }

    #[test]
    fn test_property_name_completion() {
        let host = AnalysisHost::new().with_schemas(None);
        let text = "<Project><PropertyGroup><Foo>1</Foo><Bar>$(</Bar></PropertyGroup></Project>";
        host.set_file_content("/w/a.proj", text);
        let analysis = host.analyze(Path::new("/w/a.proj"), &CancellationToken::new()).unwrap();

        let items = analysis
            .completions(offset_after(text, "$("), TriggerReason::TypedChar('('))
            .expect("completion triggered");
        assert!(items.iter().any(|i| i.label == "Foo" && i.kind == CompletionKind::Property));
    }

    #[test]
    fn test_no_completion_outside_values() {
        let host = AnalysisHost::new().with_schemas(None);
        let text = "<Project><PropertyGroup /></Project>";
        host.set_file_content("/w/a.proj", text);
        let analysis = host.analyze(Path::new("/w/a.proj"), &CancellationToken::new()).unwrap();
        assert!(analysis.completions(TextSize::from(3), TriggerReason::Explicit).is_none());
    }

    #[test]
    fn test_cache_invalidation() {
        let host = AnalysisHost::new();
        host.set_file_content("/w/a.proj", "<Project />");
        let cancel = CancellationToken::new();
        let first = host.analyze(Path::new("/w/a.proj"), &cancel).unwrap();
        let second = host.analyze(Path::new("/w/a.proj"), &cancel).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        host.set_file_content("/w/b.props", "<Project />");
        let third = host.analyze(Path::new("/w/a.proj"), &cancel).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    /// Blocks the first import resolution until released.
    struct GatedResolver {
        armed: AtomicBool,
        entered: Barrier,
        release: Barrier,
    }

    impl ImportResolver for GatedResolver {
        fn resolve_import(&self, _request: &ImportRequest<'_>, _properties: &PropertyValueCollector) -> Vec<PathBuf> {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.wait();
                self.release.wait();
            }
            Vec::new()
        }
    }

    #[test]
    fn test_edit_during_build_is_not_cached() {
        let gate = Arc::new(GatedResolver {
            armed: AtomicBool::new(true),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        });
        let host = AnalysisHost::new().with_schemas(None).with_import_resolver(gate.clone());
        let path = Path::new("/w/a.proj");
        host.set_file_content(
            path,
            r#"<Project><Import Project="b.props" /><PropertyGroup><Old>1</Old></PropertyGroup></Project>"#,
        );

        std::thread::scope(|scope| {
            let worker = scope.spawn(|| host.analyze(path, &CancellationToken::new()).unwrap());
            gate.entered.wait();
            host.set_file_content(
                path,
                r#"<Project><Import Project="b.props" /><PropertyGroup><New>1</New></PropertyGroup></Project>"#,
            );
            gate.release.wait();
            let stale = worker.join().unwrap();
            assert!(stale.context.get_property("Old").is_some());
        });

        let current = host.analyze(path, &CancellationToken::new()).unwrap();
        assert!(current.context.get_property("New").is_some());
        assert!(current.context.get_property("Old").is_none());
    }

    #[test]
    fn test_errors() {
        let host = AnalysisHost::new();
        let err = host
            .analyze(Path::new("/nonexistent/a.proj"), &CancellationToken::new())
            .err()
            .expect("missing file");
        assert!(matches!(err, AnalysisError::Load(_)));

        host.set_file_content("/w/a.proj", "<Project />");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = host.analyze(Path::new("/w/a.proj"), &cancel).err().expect("cancelled");
        assert!(matches!(err, AnalysisError::Build(BuildError::Cancelled)));
    }

    #[test]
    fn test_references_and_goto_across_imports() {
        let dir = TempDir::new().unwrap();
        let a = r#"<Project><Import Project="b.props" /><PropertyGroup><X>$(Shared)</X></PropertyGroup></Project>"#;
        let b = "<Project><PropertyGroup><Shared>1</Shared></PropertyGroup></Project>";
        std::fs::write(dir.path().join("a.proj"), a).unwrap();
        std::fs::write(dir.path().join("b.props"), b).unwrap();

        let host = AnalysisHost::new().with_schemas(None);
        assert_eq!(host.load_directory(dir.path()).unwrap(), 2);
        let path = dir.path().join("a.proj");
        let analysis = host.analyze(&path, &CancellationToken::new()).unwrap();
        let offset = TextSize::from(a.find("Shared").unwrap() as u32 + 1);

        let references = host.find_references(&analysis, offset, true);
        assert_eq!(references.len(), 2);
        assert!(references.iter().any(|r| r.is_declaration && r.file.ends_with("b.props")));

        let goto = analysis.goto_definition(offset).expect("definition");
        assert!(goto.targets.iter().all(|t| t.file.ends_with("b.props")));

        let links = analysis.document_links();
        assert_eq!(links.len(), 1);
        assert!(links[0].target_file.ends_with("b.props"));
    }

    #[test]
    fn test_analyze_many() {
        let host = AnalysisHost::new();
        host.set_file_content("/w/a.proj", "<Project />");
        host.set_file_content("/w/b.proj", "<Project />");
        let results = host.analyze_many(
            &[PathBuf::from("/w/a.proj"), PathBuf::from("/w/b.proj")],
            &CancellationToken::new(),
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }
}
