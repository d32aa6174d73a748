//! Building resolution contexts.
//!
//! [`build_resolution_context`] runs the symbol-inferring walker over a file,
//! resolving SDKs and imports depth-first as they are encountered. Each
//! imported file gets its own context, fully built before it is attached to
//! its [`Import`] record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::collector::PropertyValueCollector;
use super::context::{AnnotationKind, Import, NavigationAnnotation, ResolutionContext};
use super::diagnostics::{Diagnostic, codes};
use super::error::BuildError;
use super::host::{DocumentSource, ImportRequest, ImportResolver, SdkReference, SdkResolver};
use super::validate::validate_document;
use super::walker::{ElementScope, Value, ValueSite, WalkHandler, walk_document};
use crate::base::{SymbolTableExt, TextRange};
use crate::schema::{
    BUILTIN_PROPERTIES, BUILTIN_TASKS, ElementKind, FunctionTypeProvider, ItemInfo, MetadataInfo, PropertyInfo,
    SchemaProvider, StaticFunctionTypeProvider, SymbolLocation, TargetInfo, TaskInfo, TaskParameterInfo,
    ValueKind, WELL_KNOWN_METADATA, infer_kind_from_name,
};
use crate::syntax::{Expr, ExprKind, ExpressionOptions, XDocument, XElement, parse_expression};

// ============================================================================
// OPTIONS AND SESSION
// ============================================================================

/// Tunables for a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Upper bound on property-value permutations tried per import path.
    pub max_permutations: usize,
    /// Whether explicit schemas are loaded for each file.
    pub load_schemas: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_permutations: 16,
            load_schemas: true,
        }
    }
}

/// State shared by every file built for one top-level project.
///
/// The host capabilities are read-only. The property collector is
/// append-only. The import stack and the cache of finished contexts are
/// private to the build.
pub struct BuildSession<'h> {
    sdk_resolver: &'h dyn SdkResolver,
    import_resolver: &'h dyn ImportResolver,
    source: &'h dyn DocumentSource,
    schemas: Option<&'h dyn SchemaProvider>,
    functions: &'h dyn FunctionTypeProvider,
    pub collector: PropertyValueCollector,
    pub options: BuildOptions,
    cancel: CancellationToken,
    /// Files currently being built, outermost first.
    in_progress: Vec<PathBuf>,
    /// Finished import contexts, shared between importers.
    built: FxHashMap<PathBuf, Arc<ResolutionContext>>,
    /// Range of the top-level import currently being resolved.
    top_import: Option<TextRange>,
    /// Diagnostics raised below the top level, attached to it when it finishes.
    deferred: Vec<Diagnostic>,
    cycle_reported: bool,
}

impl<'h> BuildSession<'h> {
    pub fn new(
        sdk_resolver: &'h dyn SdkResolver,
        import_resolver: &'h dyn ImportResolver,
        source: &'h dyn DocumentSource,
    ) -> Self {
        Self {
            sdk_resolver,
            import_resolver,
            source,
            schemas: None,
            functions: &StaticFunctionTypeProvider,
            collector: PropertyValueCollector::new(),
            options: BuildOptions::default(),
            cancel: CancellationToken::new(),
            in_progress: Vec::new(),
            built: FxHashMap::default(),
            top_import: None,
            deferred: Vec::new(),
            cycle_reported: false,
        }
    }

    pub fn with_schemas(mut self, schemas: &'h dyn SchemaProvider) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn with_functions(mut self, functions: &'h dyn FunctionTypeProvider) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Seed the collector, e.g. with values gathered by an earlier build.
    pub fn with_collector(mut self, collector: PropertyValueCollector) -> Self {
        self.collector = collector;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn resolve_sdk(&self, sdk: &SdkReference, project: &Path) -> Option<PathBuf> {
        match self.sdk_resolver.resolve_sdk(sdk, project) {
            Ok(Some(dir)) => {
                debug!("resolved SDK {} to {}", sdk, dir.display());
                Some(dir)
            }
            Ok(None) => {
                debug!("SDK {} not found", sdk);
                None
            }
            Err(e) => {
                warn!("SDK resolver failed for {}: {}", sdk, e);
                None
            }
        }
    }
}

// ============================================================================
// BUILD
// ============================================================================

/// Build the resolution context for `path`, whose parsed text is `doc`.
///
/// Only a top-level build collects diagnostics and navigation annotations.
/// Returns `Err(BuildError::Cancelled)` if the session's token fires; no
/// partial context is returned in that case.
pub fn build_resolution_context(
    path: &Path,
    is_top_level: bool,
    doc: &XDocument,
    session: &mut BuildSession<'_>,
) -> Result<ResolutionContext, BuildError> {
    if session.is_cancelled() {
        return Err(BuildError::Cancelled);
    }
    trace!("building resolution context for {}", path.display());
    if is_top_level {
        session.deferred.clear();
        session.cycle_reported = false;
    }
    session.in_progress.push(path.to_path_buf());
    let result = build_file(path, is_top_level, doc, session);
    session.in_progress.pop();
    result
}

fn build_file(
    path: &Path,
    is_top_level: bool,
    doc: &XDocument,
    session: &mut BuildSession<'_>,
) -> Result<ResolutionContext, BuildError> {
    let mut ctx = ResolutionContext::new(Arc::from(path), is_top_level);

    if session.options.load_schemas {
        if let Some(provider) = session.schemas {
            match provider.schema_for(path) {
                Ok(schema) => ctx.schema = schema,
                Err(e) => warn!("failed to load schema for {}: {}", path.display(), e),
            }
        }
    }

    let Some(root) = doc.root().filter(|r| r.name.eq_ignore_ascii_case("Project")) else {
        return Ok(ctx);
    };

    mark_import_properties(doc, &mut session.collector);

    let mut builder = ContextBuilder {
        session: &mut *session,
        ctx: &mut ctx,
        cancelled: false,
    };

    let sdk_dirs = builder.root_sdks(root);
    for (dir, range, sdk) in &sdk_dirs {
        builder.import_file(dir.join("Sdk.props"), *range, Some(sdk.clone()));
    }
    walk_document(doc, &mut builder);
    for (dir, range, sdk) in &sdk_dirs {
        builder.import_file(dir.join("Sdk.targets"), *range, Some(sdk.clone()));
    }

    if builder.cancelled {
        return Err(BuildError::Cancelled);
    }

    if is_top_level {
        let functions = session.functions;
        let mut diagnostics = validate_document(doc, &ctx, functions);
        ctx.diagnostics.append(&mut diagnostics);
        ctx.diagnostics.append(&mut session.deferred);
    }
    debug!(
        "built {}: {} properties, {} items, {} targets, {} tasks, {} imports",
        path.display(),
        ctx.properties.len(),
        ctx.items.len(),
        ctx.targets.len(),
        ctx.tasks.len(),
        ctx.imports.len()
    );
    Ok(ctx)
}

/// Mark every property that appears in an `Import Project` path.
fn mark_import_properties(doc: &XDocument, collector: &mut PropertyValueCollector) {
    for element in doc.elements() {
        if !element.name.eq_ignore_ascii_case("Import") {
            continue;
        }
        let Some(attr) = element.attribute("Project") else { continue };
        let expr = parse_expression(&attr.value, ExpressionOptions::LISTS, attr.value_range.start());
        for node in expr.walk() {
            if let ExprKind::Property(inner) = &node.kind {
                if let ExprKind::Name(name) = &inner.kind {
                    collector.mark(name);
                }
            }
        }
    }
}

// ============================================================================
// CONTEXT BUILDER
// ============================================================================

/// Walk handler that infers symbols and resolves imports into a context.
struct ContextBuilder<'a, 'h> {
    session: &'a mut BuildSession<'h>,
    ctx: &'a mut ResolutionContext,
    cancelled: bool,
}

impl ContextBuilder<'_, '_> {
    fn location(&self, range: TextRange) -> Option<SymbolLocation> {
        Some(SymbolLocation {
            file: self.ctx.file.clone(),
            range,
        })
    }

    fn project_file(&self) -> PathBuf {
        self.session
            .in_progress
            .first()
            .cloned()
            .unwrap_or_else(|| self.ctx.file.to_path_buf())
    }

    fn top_level_error(&mut self, range: TextRange, code: &'static str, message: String) {
        if self.ctx.is_top_level {
            self.ctx.diagnostics.push(Diagnostic::error(range, message).with_code(code));
        }
    }

    fn top_level_warning(&mut self, range: TextRange, code: &'static str, message: String) {
        if self.ctx.is_top_level {
            self.ctx.diagnostics.push(Diagnostic::warning(range, message).with_code(code));
        }
    }

    // ------------------------------------------------------------------------
    // SDKs
    // ------------------------------------------------------------------------

    /// Resolve the `Sdk` attribute and `Sdk` child elements of the root.
    fn root_sdks(&mut self, root: &XElement) -> Vec<(PathBuf, TextRange, SdkReference)> {
        let mut refs = Vec::new();
        if let Some(attr) = root.attribute("Sdk") {
            for sdk in SdkReference::parse_list(&attr.value) {
                refs.push((sdk, attr.value_range));
            }
        }
        for element in root.children_named("Sdk") {
            let Some(name) = element.attribute("Name") else { continue };
            let Some(mut sdk) = SdkReference::parse(&name.value) else { continue };
            if let Some(v) = element.attribute("Version") {
                sdk.version = Some(SmolStr::new(v.value.trim()));
            }
            if let Some(v) = element.attribute("MinimumVersion") {
                sdk.min_version = Some(SmolStr::new(v.value.trim()));
            }
            refs.push((sdk, name.value_range));
        }
        refs.into_iter()
            .filter_map(|(sdk, range)| self.sdk_dir(&sdk, range).map(|dir| (dir, range, sdk)))
            .collect()
    }

    /// Resolve one SDK, recording a warning and an unresolved import on failure.
    fn sdk_dir(&mut self, sdk: &SdkReference, range: TextRange) -> Option<PathBuf> {
        let project = self.project_file();
        match self.session.resolve_sdk(sdk, &project) {
            Some(dir) => {
                if self.ctx.is_top_level {
                    self.ctx.annotations.push(NavigationAnnotation {
                        range,
                        kind: AnnotationKind::Sdk,
                        targets: vec![Arc::from(dir.as_path())],
                    });
                }
                Some(dir)
            }
            None => {
                self.top_level_warning(range, codes::UNRESOLVED_SDK, format!("Could not resolve SDK '{sdk}'"));
                let key = SmolStr::new(format!("sdk:{sdk}"));
                self.ctx.imports.entry(key.clone()).or_insert_with(|| Import {
                    sdk: Some(sdk.clone()),
                    ..Import::unresolved(key, range)
                });
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------------

    fn import_element(&mut self, scope: &ElementScope<'_>) {
        let element = scope.element;
        let Some(attr) = element.attribute("Project") else { return };
        if attr.value.trim().is_empty() {
            return;
        }

        let mut sdk = None;
        let mut sdk_dir = None;
        if let Some(sdk_attr) = element.attribute("Sdk") {
            let Some(mut reference) = SdkReference::parse(&sdk_attr.value) else { return };
            if let Some(v) = element.attribute("Version") {
                reference.version = Some(SmolStr::new(v.value.trim()));
            }
            if let Some(v) = element.attribute("MinimumVersion") {
                reference.min_version = Some(SmolStr::new(v.value.trim()));
            }
            let Some(dir) = self.sdk_dir(&reference, sdk_attr.value_range) else { return };
            sdk = Some(reference);
            sdk_dir = Some(dir);
        }

        let expr = parse_expression(&attr.value, ExpressionOptions::LISTS, attr.value_range.start());
        let project = self.project_file();
        let candidates = {
            let request = ImportRequest {
                importing_file: &self.ctx.file,
                project_file: &project,
                expr: &expr,
                text: &attr.value,
                sdk_dir: sdk_dir.as_deref(),
                max_permutations: self.session.options.max_permutations,
            };
            self.session.import_resolver.resolve_import(&request, &self.session.collector)
        };

        if candidates.is_empty() {
            debug!("import '{}' in {} resolved to no files", attr.value, self.ctx.file.display());
            self.top_level_error(
                attr.range,
                codes::UNRESOLVED_IMPORT,
                format!("Could not resolve import '{}'", attr.value),
            );
            return;
        }

        if self.ctx.is_top_level {
            self.ctx.annotations.push(NavigationAnnotation {
                range: attr.value_range,
                kind: AnnotationKind::Import,
                targets: candidates.iter().map(|p| Arc::from(p.as_path())).collect(),
            });
        }
        for candidate in candidates {
            self.import_file(candidate, attr.range, sdk.clone());
        }
    }

    /// Build and attach the context of one imported file.
    fn import_file(&mut self, path: PathBuf, range: TextRange, sdk: Option<SdkReference>) {
        if self.cancelled {
            return;
        }
        if self.session.is_cancelled() {
            self.cancelled = true;
            return;
        }
        let key = SmolStr::new(path.to_string_lossy());
        if self.ctx.imports.contains_key(&key) {
            return;
        }
        if self.ctx.is_top_level {
            self.session.top_import = Some(range);
        }

        if self.session.in_progress.contains(&path) {
            debug!("skipping import cycle through {}", path.display());
            if !self.session.cycle_reported {
                self.session.cycle_reported = true;
                let range = self.session.top_import.unwrap_or(range);
                self.session.deferred.push(
                    Diagnostic::error(range, format!("Import cycle through '{}'", path.display()))
                        .with_code(codes::IMPORT_CYCLE),
                );
            }
            return;
        }

        if let Some(built) = self.session.built.get(&path) {
            trace!("reusing context for {}", path.display());
            let import = Import {
                sdk,
                context: Some(built.clone()),
                ..Import::unresolved(key.clone(), range)
            };
            self.ctx.imports.insert(key, import);
            return;
        }

        let loaded = match self.session.source.load(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("failed to load import {}: {}", path.display(), e);
                if let Some(sdk) = &sdk {
                    let file = path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
                    self.top_level_warning(
                        range,
                        codes::UNRESOLVED_SDK,
                        format!("SDK '{sdk}' could not load '{file}'"),
                    );
                }
                let import = Import {
                    sdk,
                    ..Import::unresolved(key.clone(), range)
                };
                self.ctx.imports.insert(key, import);
                return;
            }
        };

        let doc = XDocument::parse(loaded.text);
        match build_resolution_context(&path, false, &doc, self.session) {
            Ok(child) => {
                debug!("resolved import {}", path.display());
                let child = Arc::new(child);
                self.session.built.insert(path, child.clone());
                let import = Import {
                    sdk,
                    timestamp: loaded.timestamp,
                    context: Some(child),
                    ..Import::unresolved(key.clone(), range)
                };
                self.ctx.imports.insert(key, import);
            }
            Err(BuildError::Cancelled) => self.cancelled = true,
        }
    }

    // ------------------------------------------------------------------------
    // Inference
    // ------------------------------------------------------------------------

    fn declares_property(&self, name: &str) -> bool {
        self.ctx.properties.contains_named(name)
            || BUILTIN_PROPERTIES.contains_named(name)
            || self.ctx.schema.as_ref().is_some_and(|s| s.properties.contains_named(name))
    }

    fn add_property(&mut self, name: &str, location: Option<SymbolLocation>) {
        let mut info = PropertyInfo::new(name).with_kind(infer_kind_from_name(name, ValueKind::UNKNOWN));
        info.location = location;
        self.ctx.properties.insert(info.name.clone(), info);
    }

    fn add_item(&mut self, name: &str, location: Option<SymbolLocation>) {
        let mut info = ItemInfo::new(name);
        info.location = location;
        self.ctx.items.insert(info.name.clone(), info);
    }

    fn add_metadata(&mut self, item: &str, name: &str, location: Option<SymbolLocation>) {
        if WELL_KNOWN_METADATA.contains_named(name) {
            return;
        }
        if !self.ctx.items.contains_named(item) {
            self.add_item(item, None);
        }
        let Some(owner) = self.ctx.items.get_named_mut(item) else { return };
        if owner.metadata.contains_named(name) {
            return;
        }
        let mut info = MetadataInfo::new(name, Some(owner.name.clone()));
        info.kind = infer_kind_from_name(name, ValueKind::UNKNOWN);
        info.location = location;
        owner.metadata.insert(info.name.clone(), info);
    }

    fn add_target(&mut self, name: &str, location: Option<SymbolLocation>) {
        let mut info = TargetInfo::new(name);
        info.location = location;
        self.ctx.targets.insert(info.name.clone(), info);
    }

    fn add_task_parameter(&mut self, task: &str, name: &str, is_output: bool) {
        let Some(task) = self.ctx.tasks.get_named_mut(task) else { return };
        match task.parameters.get_named_mut(name) {
            Some(param) => param.is_output |= is_output,
            None => {
                let mut param = TaskParameterInfo::new(name);
                param.is_output = is_output;
                task.parameters.insert(param.name.clone(), param);
            }
        }
    }
}

impl WalkHandler for ContextBuilder<'_, '_> {
    fn import(&mut self, _doc: &XDocument, scope: &ElementScope<'_>) {
        self.import_element(scope);
    }

    fn value(&mut self, _doc: &XDocument, scope: &ElementScope<'_>, value: &Value<'_>, expr: &Expr) {
        if value.is_condition() {
            self.session.collector.add_condition(value.text);
        } else if matches!(value.site, ValueSite::Content) && scope.kind == ElementKind::Property {
            self.session.collector.add_expression(&scope.element.name, expr);
        }
    }

    fn property_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        if !self.declares_property(name) {
            self.add_property(name, self.location(range));
        }
    }

    fn item_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        let declared = self.ctx.schema.as_ref().is_some_and(|s| s.items.contains_named(name));
        if !declared && !self.ctx.items.contains_named(name) {
            self.add_item(name, self.location(range));
        }
    }

    fn metadata_declaration(&mut self, _scope: &ElementScope<'_>, item: &str, name: &str, range: TextRange) {
        let declared = self
            .ctx
            .schema
            .as_ref()
            .and_then(|s| s.items.get_named(item))
            .is_some_and(|i| i.metadata.contains_named(name));
        if !declared {
            self.add_metadata(item, name, self.location(range));
        }
    }

    fn target_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        let declared = self.ctx.schema.as_ref().is_some_and(|s| s.targets.contains_named(name));
        if !declared && !self.ctx.targets.contains_named(name) {
            self.add_target(name, self.location(range));
        }
    }

    fn task_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        let location = self.location(range);
        match self.ctx.tasks.get_named_mut(name) {
            Some(task) => {
                if task.is_inferred {
                    task.is_inferred = false;
                    task.location = location;
                }
            }
            None => {
                let mut info = TaskInfo::new(name);
                info.location = location;
                self.ctx.tasks.insert(info.name.clone(), info);
            }
        }
    }

    fn task_parameter_declaration(
        &mut self,
        _scope: &ElementScope<'_>,
        task: &str,
        name: &str,
        _range: TextRange,
        is_output: bool,
        is_required: bool,
    ) {
        self.add_task_parameter(task, name, is_output);
        if let Some(param) = self
            .ctx
            .tasks
            .get_named_mut(task)
            .and_then(|t| t.parameters.get_named_mut(name))
        {
            param.is_required = is_required;
        }
    }

    fn task_invocation(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        if self.ctx.get_task(name).is_some() {
            return;
        }
        let mut info = TaskInfo::new(name);
        info.is_inferred = true;
        info.location = self.location(range);
        self.ctx.tasks.insert(info.name.clone(), info);
    }

    fn task_parameter_usage(&mut self, _scope: &ElementScope<'_>, task: &str, name: &str, _range: TextRange) {
        if BUILTIN_TASKS.contains_named(task) {
            return;
        }
        self.add_task_parameter(task, name, false);
    }

    fn task_output(&mut self, _scope: &ElementScope<'_>, task: &str, name: &str, _range: TextRange) {
        if BUILTIN_TASKS.contains_named(task) {
            return;
        }
        self.add_task_parameter(task, name, true);
    }

    fn property_reference(&mut self, name: &str, _range: TextRange) {
        if self.ctx.get_property(name).is_none() {
            self.add_property(name, None);
        }
    }

    fn item_reference(&mut self, name: &str, _range: TextRange) {
        if self.ctx.get_item(name).is_none() {
            self.add_item(name, None);
        }
    }

    fn metadata_reference(&mut self, item: Option<&str>, name: &str, _range: TextRange) {
        let Some(item) = item else { return };
        if self.ctx.get_metadata(Some(item), name).is_none() {
            self.add_metadata(item, name, None);
        }
    }

    fn target_reference(&mut self, name: &str, _range: TextRange) {
        if self.ctx.get_target(name).is_none() {
            self.add_target(name, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{SymbolTableExt, TextSize};
    use crate::hir::error::{LoadError, SdkResolveError};
    use crate::hir::host::LoadedDocument;
    use parking_lot::Mutex;

    /// In-memory files; imports resolve by literal file name.
    #[derive(Default)]
    struct MemoryHost {
        files: FxHashMap<PathBuf, String>,
        sdks: FxHashMap<String, PathBuf>,
    }

    impl MemoryHost {
        fn file(mut self, path: &str, text: &str) -> Self {
            self.files.insert(PathBuf::from(path), text.to_string());
            self
        }

        fn sdk(mut self, name: &str, dir: &str) -> Self {
            self.sdks.insert(name.to_string(), PathBuf::from(dir));
            self
        }

        fn build(&self, path: &str) -> ResolutionContext {
            let mut session = BuildSession::new(self, self, self);
            let doc = XDocument::parse(self.files[Path::new(path)].as_str());
            build_resolution_context(Path::new(path), true, &doc, &mut session).unwrap()
        }
    }

    impl SdkResolver for MemoryHost {
        fn resolve_sdk(&self, sdk: &SdkReference, _project: &Path) -> Result<Option<PathBuf>, SdkResolveError> {
            Ok(self.sdks.get(sdk.name.as_str()).cloned())
        }
    }

    impl ImportResolver for MemoryHost {
        fn resolve_import(&self, request: &ImportRequest<'_>, _properties: &PropertyValueCollector) -> Vec<PathBuf> {
            let base = request.sdk_dir.unwrap_or(Path::new("/"));
            let path = base.join(request.text.trim());
            if self.files.contains_key(&path) { vec![path] } else { Vec::new() }
        }
    }

    impl DocumentSource for MemoryHost {
        fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
            let text = self.files.get(path).ok_or_else(|| LoadError::NotFound(path.to_path_buf()))?;
            Ok(LoadedDocument {
                text: Arc::from(text.as_str()),
                timestamp: None,
            })
        }
    }

    #[test]
    fn test_infers_items() {
        let host = MemoryHost::default().file("/a.proj", "<Project><ItemGroup><Foo/><Bar/></ItemGroup></Project>");
        let ctx = host.build("/a.proj");
        assert!(ctx.items.contains_named("Foo"));
        assert!(ctx.items.contains_named("Bar"));
        assert!(ctx.items.values().all(|i| i.metadata.is_empty()));
    }

    #[test]
    fn test_infers_metadata_attribute() {
        let host = MemoryHost::default().file("/a.proj", r#"<Project><ItemGroup><Foo Bar="a"/></ItemGroup></Project>"#);
        let ctx = host.build("/a.proj");
        let foo = ctx.items.get_named("Foo").unwrap();
        assert!(foo.metadata.contains_named("Bar"));
    }

    #[test]
    fn test_reserved_property_not_inferred() {
        let host = MemoryHost::default().file(
            "/a.proj",
            "<Project><PropertyGroup><X>$(MSBuildProjectDirectory)</X></PropertyGroup></Project>",
        );
        let ctx = host.build("/a.proj");
        assert!(ctx.properties.contains_named("X"));
        assert!(!ctx.properties.contains_named("MSBuildProjectDirectory"));
    }

    #[test]
    fn test_unresolved_import_reports_once() {
        let host = MemoryHost::default().file("/a.proj", r#"<Project><Import Project="missing.props" /></Project>"#);
        let ctx = host.build("/a.proj");
        let errors: Vec<_> = ctx
            .diagnostics
            .iter()
            .filter(|d| d.code == Some(codes::UNRESOLVED_IMPORT))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(ctx.resolved_imports().count(), 0);
    }

    #[test]
    fn test_import_cycle_terminates() {
        let host = MemoryHost::default()
            .file("/a.proj", r#"<Project><Import Project="b.props" /></Project>"#)
            .file("/b.props", r#"<Project><Import Project="a.proj" /><PropertyGroup><B>1</B></PropertyGroup></Project>"#);
        let ctx = host.build("/a.proj");
        let cycles: Vec<_> = ctx
            .diagnostics
            .iter()
            .filter(|d| d.code == Some(codes::IMPORT_CYCLE))
            .collect();
        assert_eq!(cycles.len(), 1);
        let text = r#"<Project><Import Project="b.props" /></Project>"#;
        let attr = r#"Project="b.props""#;
        let start = TextSize::from(text.find(attr).unwrap() as u32);
        assert_eq!(cycles[0].range, TextRange::at(start, TextSize::of(attr)));
        assert!(ctx.get_property("B").is_some());
    }

    #[test]
    fn test_sdk_missing_targets_warns() {
        let text = r#"<Project Sdk="My.Sdk" />"#;
        let host = MemoryHost::default()
            .file("/a.proj", text)
            .file("/sdk/Sdk.props", "<Project />")
            .sdk("My.Sdk", "/sdk");
        let ctx = host.build("/a.proj");
        let warnings: Vec<_> = ctx
            .diagnostics
            .iter()
            .filter(|d| d.code == Some(codes::UNRESOLVED_SDK))
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(&*warnings[0].message, "SDK 'My.Sdk' could not load 'Sdk.targets'");
        let start = TextSize::from(text.find("My.Sdk").unwrap() as u32);
        assert_eq!(warnings[0].range, TextRange::at(start, TextSize::of("My.Sdk")));
        assert_eq!(ctx.resolved_imports().count(), 1);
    }

    #[test]
    fn test_sdk_imports_wrap_project() {
        let host = MemoryHost::default()
            .file("/a.proj", r#"<Project Sdk="My.Sdk"><PropertyGroup><A>1</A></PropertyGroup></Project>"#)
            .file("/sdk/Sdk.props", "<Project><PropertyGroup><FromProps>1</FromProps></PropertyGroup></Project>")
            .file("/sdk/Sdk.targets", r#"<Project><Target Name="FromTargets" /></Project>"#)
            .sdk("My.Sdk", "/sdk");
        let ctx = host.build("/a.proj");
        let keys: Vec<_> = ctx.imports.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].ends_with("Sdk.props"));
        assert!(keys[1].ends_with("Sdk.targets"));
        assert!(ctx.get_property("FromProps").is_some());
        assert!(ctx.get_target("FromTargets").is_some());
    }

    #[test]
    fn test_unresolved_sdk_warns() {
        let host = MemoryHost::default().file("/a.proj", r#"<Project Sdk="Missing.Sdk" />"#);
        let ctx = host.build("/a.proj");
        assert!(ctx.diagnostics.iter().any(|d| d.code == Some(codes::UNRESOLVED_SDK)));
        assert_eq!(ctx.unresolved_imports().count(), 1);
    }

    #[test]
    fn test_cancelled_build() {
        let host = MemoryHost::default().file("/a.proj", "<Project />");
        let token = CancellationToken::new();
        token.cancel();
        let mut session = BuildSession::new(&host, &host, &host).with_cancellation(token);
        let doc = XDocument::parse("<Project />");
        let result = build_resolution_context(Path::new("/a.proj"), true, &doc, &mut session);
        assert_eq!(result.unwrap_err(), BuildError::Cancelled);
    }

    /// Cancels the build when asked to resolve `cancel_on`, and records loads.
    struct CancellingHost {
        inner: MemoryHost,
        cancel_on: &'static str,
        token: CancellationToken,
        loaded: Mutex<Vec<PathBuf>>,
    }

    impl SdkResolver for CancellingHost {
        fn resolve_sdk(&self, sdk: &SdkReference, project: &Path) -> Result<Option<PathBuf>, SdkResolveError> {
            self.inner.resolve_sdk(sdk, project)
        }
    }

    impl ImportResolver for CancellingHost {
        fn resolve_import(&self, request: &ImportRequest<'_>, properties: &PropertyValueCollector) -> Vec<PathBuf> {
            if request.text.trim() == self.cancel_on {
                self.token.cancel();
            }
            self.inner.resolve_import(request, properties)
        }
    }

    impl DocumentSource for CancellingHost {
        fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
            self.loaded.lock().push(path.to_path_buf());
            self.inner.load(path)
        }
    }

    #[test]
    fn test_cancelled_at_nested_import_boundary() {
        let host = CancellingHost {
            inner: MemoryHost::default()
                .file("/a.proj", r#"<Project><Import Project="b.props" /><Import Project="d.props" /></Project>"#)
                .file("/b.props", r#"<Project><Import Project="c.props" /></Project>"#)
                .file("/c.props", "<Project />")
                .file("/d.props", "<Project />"),
            cancel_on: "c.props",
            token: CancellationToken::new(),
            loaded: Mutex::new(Vec::new()),
        };
        let mut session = BuildSession::new(&host, &host, &host).with_cancellation(host.token.clone());
        let doc = XDocument::parse(host.inner.files[Path::new("/a.proj")].as_str());
        let result = build_resolution_context(Path::new("/a.proj"), true, &doc, &mut session);

        assert_eq!(result.unwrap_err(), BuildError::Cancelled);
        assert_eq!(*host.loaded.lock(), [PathBuf::from("/b.props")]);
    }

    #[test]
    fn test_declared_values_collected_for_import_paths() {
        let host = MemoryHost::default().file(
            "/a.proj",
            r#"<Project><PropertyGroup><Flavor>x</Flavor><Other>y</Other></PropertyGroup><Import Project="$(Flavor).props" /></Project>"#,
        );
        let mut session = BuildSession::new(&host, &host, &host);
        let doc = XDocument::parse(host.files[Path::new("/a.proj")].as_str());
        build_resolution_context(Path::new("/a.proj"), true, &doc, &mut session).unwrap();
        assert_eq!(session.collector.values("Flavor"), ["x"]);
        assert!(session.collector.values("Other").is_empty());
    }

    #[test]
    fn test_task_inference() {
        let host = MemoryHost::default().file(
            "/a.proj",
            r#"<Project>
  <UsingTask TaskName="Declared" AssemblyFile="x.dll">
    <ParameterGroup><Input Required="true" /></ParameterGroup>
  </UsingTask>
  <Target Name="Build">
    <Custom Value="1"><Output TaskParameter="Result" PropertyName="R" /></Custom>
    <Declared Input="x" />
  </Target>
</Project>"#,
        );
        let ctx = host.build("/a.proj");
        let custom = ctx.tasks.get_named("Custom").unwrap();
        assert!(custom.is_inferred);
        assert!(custom.parameters.contains_named("Value"));
        assert!(custom.parameters.get_named("Result").unwrap().is_output);
        let declared = ctx.tasks.get_named("Declared").unwrap();
        assert!(!declared.is_inferred);
        assert!(declared.parameters.get_named("Input").unwrap().is_required);
        assert!(ctx.properties.contains_named("R"));
    }

    #[test]
    fn test_condition_values_collected() {
        let host = MemoryHost::default().file(
            "/a.proj",
            r#"<Project><PropertyGroup Condition="'$(Configuration)' == 'Debug'"><Configuration>Release</Configuration></PropertyGroup></Project>"#,
        );
        let mut session = BuildSession::new(&host, &host, &host);
        let doc = XDocument::parse(host.files[Path::new("/a.proj")].as_str());
        build_resolution_context(Path::new("/a.proj"), true, &doc, &mut session).unwrap();
        assert_eq!(session.collector.values("Configuration"), ["Debug", "Release"]);
    }
}
