//! Resolution contexts: per-file symbol tables over an import closure.
//!
//! A context owns the symbols inferred from its own file and the contexts of
//! the files it imports. Lookups merge these at query time, first match wins:
//!
//! 1. explicit schemas of this context, then of every import (pre-order)
//! 2. built-in vocabulary
//! 3. inferred tables of this context, then of every import (pre-order)
//!
//! Nothing is ever merged in place.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use smol_str::SmolStr;

use super::diagnostics::Diagnostic;
use super::host::SdkReference;
use crate::base::{SymbolName, SymbolTable, SymbolTableExt, TextRange, is_private_name};
use crate::schema::{
    BUILTIN_PROPERTIES, BUILTIN_TASKS, ExplicitSchema, ItemInfo, MetadataInfo, PropertyInfo, SymbolKind, TargetInfo,
    TaskInfo, WELL_KNOWN_METADATA,
};

// ============================================================================
// IMPORTS
// ============================================================================

/// One `Import` element (or implicit SDK import) and what it resolved to.
#[derive(Clone, Debug)]
pub struct Import {
    /// The resolved file path, or the written path when unresolved.
    pub path: SmolStr,
    pub sdk: Option<SdkReference>,
    pub timestamp: Option<SystemTime>,
    /// Span of the import in the importing file.
    pub range: TextRange,
    /// Set once, after the imported file's context is fully built.
    pub context: Option<Arc<ResolutionContext>>,
}

impl Import {
    pub fn unresolved(path: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            path: path.into(),
            sdk: None,
            timestamp: None,
            range,
            context: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.context.is_some()
    }
}

/// What a navigation annotation points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationKind {
    Import,
    Sdk,
}

/// A span in the top-level file that navigates to other files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationAnnotation {
    pub range: TextRange,
    pub kind: AnnotationKind,
    pub targets: Vec<Arc<Path>>,
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Symbols for one file and, through its imports, its whole import closure.
#[derive(Clone, Debug)]
pub struct ResolutionContext {
    pub file: Arc<Path>,
    pub is_top_level: bool,
    pub properties: SymbolTable<PropertyInfo>,
    pub items: SymbolTable<ItemInfo>,
    pub targets: SymbolTable<TargetInfo>,
    pub tasks: SymbolTable<TaskInfo>,
    /// Keyed by resolved path, in import order.
    pub imports: IndexMap<SmolStr, Import, FxBuildHasher>,
    pub schema: Option<Arc<ExplicitSchema>>,
    /// Top-level only.
    pub diagnostics: Vec<Diagnostic>,
    /// Top-level only.
    pub annotations: Vec<NavigationAnnotation>,
}

impl ResolutionContext {
    pub fn new(file: Arc<Path>, is_top_level: bool) -> Self {
        Self {
            file,
            is_top_level,
            properties: SymbolTable::default(),
            items: SymbolTable::default(),
            targets: SymbolTable::default(),
            tasks: SymbolTable::default(),
            imports: IndexMap::default(),
            schema: None,
            diagnostics: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// This context and every resolved import context, pre-order, each file once.
    pub fn contexts(&self) -> Vec<&ResolutionContext> {
        self.iter_contexts().collect()
    }

    /// Lazy form of [`contexts`](Self::contexts).
    pub fn iter_contexts(&self) -> ContextIter<'_> {
        ContextIter {
            stack: vec![self],
            seen: FxHashSet::default(),
        }
    }

    pub fn resolved_imports(&self) -> impl Iterator<Item = &Import> {
        self.imports.values().filter(|i| i.is_resolved())
    }

    pub fn unresolved_imports(&self) -> impl Iterator<Item = &Import> {
        self.imports.values().filter(|i| !i.is_resolved())
    }

    fn find<'a, T: 'a>(
        &'a self,
        explicit: impl Fn(&'a ExplicitSchema) -> Option<&'a T>,
        builtin: Option<&'a T>,
        inferred: impl Fn(&'a ResolutionContext) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.iter_contexts()
            .filter_map(|c| c.schema.as_deref())
            .find_map(explicit)
            .or(builtin)
            .or_else(|| self.iter_contexts().find_map(inferred))
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    pub fn get_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.find(
            |s| s.properties.get_named(name),
            BUILTIN_PROPERTIES.get_named(name),
            |c| c.properties.get_named(name),
        )
    }

    pub fn get_item(&self, name: &str) -> Option<&ItemInfo> {
        self.find(|s| s.items.get_named(name), None, |c| c.items.get_named(name))
    }

    pub fn get_target(&self, name: &str) -> Option<&TargetInfo> {
        self.find(|s| s.targets.get_named(name), None, |c| c.targets.get_named(name))
    }

    pub fn get_task(&self, name: &str) -> Option<&TaskInfo> {
        self.find(
            |s| s.tasks.get_named(name),
            BUILTIN_TASKS.get_named(name),
            |c| c.tasks.get_named(name),
        )
    }

    /// Metadata of `item`, or of any item when `item` is `None`.
    pub fn get_metadata(&self, item: Option<&str>, name: &str) -> Option<&MetadataInfo> {
        let builtin = WELL_KNOWN_METADATA.get_named(name);
        match item {
            Some(item) => self.find(
                |s| s.items.get_named(item)?.metadata.get_named(name),
                builtin,
                |c| c.items.get_named(item)?.metadata.get_named(name),
            ),
            None => self.find(
                |s| s.items.values().find_map(|i| i.metadata.get_named(name)),
                builtin,
                |c| c.items.values().find_map(|i| i.metadata.get_named(name)),
            ),
        }
    }

    pub fn is_known(&self, kind: SymbolKind, name: &str) -> bool {
        match kind {
            SymbolKind::Property => self.get_property(name).is_some(),
            SymbolKind::Item => self.get_item(name).is_some(),
            SymbolKind::Target => self.get_target(name).is_some(),
            SymbolKind::Task => self.get_task(name).is_some(),
            SymbolKind::Metadata => self.get_metadata(None, name).is_some(),
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Completion listings
    // ------------------------------------------------------------------------

    /// Every visible symbol of one table, first-wins in lookup order.
    ///
    /// Names starting with `_` are only listed when this context declares them.
    fn list<'a, T: 'a>(
        &'a self,
        explicit: impl Fn(&'a ExplicitSchema) -> Vec<(&'a SymbolName, &'a T)>,
        builtin: Vec<(&'a SymbolName, &'a T)>,
        inferred: impl Fn(&'a ResolutionContext) -> Vec<(&'a SymbolName, &'a T)>,
    ) -> Vec<&'a T> {
        let contexts = self.contexts();
        let mut seen: SymbolTable<&'a T> = SymbolTable::default();
        let mut offer = |ctx: &ResolutionContext, entries: Vec<(&'a SymbolName, &'a T)>| {
            let own = std::ptr::eq(ctx, self);
            for (name, info) in entries {
                if !own && is_private_name(name.as_str()) {
                    continue;
                }
                seen.entry(name.clone()).or_insert(info);
            }
        };
        for &ctx in &contexts {
            if let Some(schema) = ctx.schema.as_deref() {
                offer(ctx, explicit(schema));
            }
        }
        offer(self, builtin);
        for &ctx in &contexts {
            offer(ctx, inferred(ctx));
        }
        seen.into_values().collect()
    }

    pub fn completion_properties(&self) -> Vec<&PropertyInfo> {
        self.list(|s| s.properties.iter().collect(), BUILTIN_PROPERTIES.iter().collect(), |c| {
            c.properties.iter().collect()
        })
    }

    pub fn completion_items(&self) -> Vec<&ItemInfo> {
        self.list(|s| s.items.iter().collect(), Vec::new(), |c| c.items.iter().collect())
    }

    pub fn completion_targets(&self) -> Vec<&TargetInfo> {
        self.list(|s| s.targets.iter().collect(), Vec::new(), |c| c.targets.iter().collect())
    }

    pub fn completion_tasks(&self) -> Vec<&TaskInfo> {
        self.list(|s| s.tasks.iter().collect(), BUILTIN_TASKS.iter().collect(), |c| c.tasks.iter().collect())
    }

    /// Metadata of `item` (or of every item), followed by well-known metadata.
    pub fn completion_metadata(&self, item: Option<&str>) -> Vec<&MetadataInfo> {
        let mut out = self.list(|s| metadata_of(&s.items, item), Vec::new(), |c| metadata_of(&c.items, item));
        let listed: FxHashSet<&SymbolName> = out.iter().map(|m| &m.name).collect();
        let builtin: Vec<&MetadataInfo> = WELL_KNOWN_METADATA
            .values()
            .filter(|m| !listed.contains(&m.name))
            .collect();
        out.extend(builtin);
        out
    }

    // ------------------------------------------------------------------------
    // Provenance
    // ------------------------------------------------------------------------

    /// Every file of the closure that declares `name`, pre-order.
    pub fn declaring_files(&self, kind: SymbolKind, name: &str) -> Vec<Arc<Path>> {
        let declares_in = |ctx: &ResolutionContext| -> bool {
            let schema = ctx.schema.as_deref();
            match kind {
                SymbolKind::Property => {
                    ctx.properties.contains_named(name) || schema.is_some_and(|s| s.properties.contains_named(name))
                }
                SymbolKind::Item => ctx.items.contains_named(name) || schema.is_some_and(|s| s.items.contains_named(name)),
                SymbolKind::Target => {
                    ctx.targets.contains_named(name) || schema.is_some_and(|s| s.targets.contains_named(name))
                }
                SymbolKind::Task => ctx.tasks.contains_named(name) || schema.is_some_and(|s| s.tasks.contains_named(name)),
                SymbolKind::Metadata => ctx.items.values().any(|i| i.metadata.contains_named(name)),
                _ => false,
            }
        };
        self.iter_contexts()
            .filter(|c| declares_in(*c))
            .map(|c| c.file.clone())
            .collect()
    }

    /// The context built for `file`, if it is in the closure.
    pub fn context_for(&self, file: &Path) -> Option<&ResolutionContext> {
        self.iter_contexts().find(|c| &*c.file == file)
    }
}

/// Pre-order walk over an import closure. See [`ResolutionContext::iter_contexts`].
pub struct ContextIter<'a> {
    stack: Vec<&'a ResolutionContext>,
    seen: FxHashSet<&'a Path>,
}

impl<'a> Iterator for ContextIter<'a> {
    type Item = &'a ResolutionContext;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ctx) = self.stack.pop() {
            if !self.seen.insert(&*ctx.file) {
                continue;
            }
            let mark = self.stack.len();
            self.stack.extend(ctx.imports.values().filter_map(|i| i.context.as_deref()));
            self.stack[mark..].reverse();
            return Some(ctx);
        }
        None
    }
}

fn metadata_of<'t>(items: &'t SymbolTable<ItemInfo>, item: Option<&str>) -> Vec<(&'t SymbolName, &'t MetadataInfo)> {
    match item {
        Some(item) => items
            .get_named(item)
            .map(|i| i.metadata.iter().collect())
            .unwrap_or_default(),
        None => items.values().flat_map(|i| i.metadata.iter()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx(path: &str, top: bool) -> ResolutionContext {
        ResolutionContext::new(Arc::from(PathBuf::from(path)), top)
    }

    fn with_import(mut parent: ResolutionContext, child: ResolutionContext) -> ResolutionContext {
        let key = SmolStr::new(child.file.to_string_lossy());
        parent.imports.insert(
            key.clone(),
            Import {
                context: Some(Arc::new(child)),
                ..Import::unresolved(key, TextRange::default())
            },
        );
        parent
    }

    fn add_property(ctx: &mut ResolutionContext, name: &str) {
        let info = PropertyInfo::new(name);
        ctx.properties.insert(info.name.clone(), info);
    }

    #[test]
    fn test_lookup_through_imports() {
        let mut imported = ctx("/b.props", false);
        add_property(&mut imported, "FromImport");
        let top = with_import(ctx("/a.proj", true), imported);

        assert!(top.get_property("fromimport").is_some());
        assert!(top.get_property("MSBuildProjectDirectory").is_some());
        assert!(top.get_property("Missing").is_none());
        assert_eq!(top.contexts().len(), 2);
    }

    #[test]
    fn test_closure_is_pre_order_and_deduplicated() {
        let shared = Arc::new(ctx("/shared.props", false));
        let attach = |mut parent: ResolutionContext, child: Arc<ResolutionContext>| {
            let key = SmolStr::new(child.file.to_string_lossy());
            parent.imports.insert(
                key.clone(),
                Import {
                    context: Some(child),
                    ..Import::unresolved(key, TextRange::default())
                },
            );
            parent
        };
        let b = attach(ctx("/b.props", false), shared.clone());
        let c = attach(ctx("/c.props", false), shared);
        let top = attach(attach(ctx("/a.proj", true), Arc::new(b)), Arc::new(c));

        let files: Vec<_> = top.iter_contexts().map(|c| c.file.to_string_lossy().into_owned()).collect();
        assert_eq!(files, ["/a.proj", "/b.props", "/shared.props", "/c.props"]);
        assert!(top.context_for(Path::new("/c.props")).is_some());
        assert!(top.context_for(Path::new("/d.props")).is_none());
    }

    #[test]
    fn test_explicit_schema_wins_over_inferred() {
        let mut schema = ExplicitSchema::default();
        let info = PropertyInfo::new("Foo").with_description("declared");
        schema.properties.insert(info.name.clone(), info);

        let mut imported = ctx("/b.props", false);
        imported.schema = Some(Arc::new(schema));
        let mut top = ctx("/a.proj", true);
        add_property(&mut top, "Foo");
        let top = with_import(top, imported);

        let found = top.get_property("Foo").unwrap();
        assert_eq!(found.description.as_deref(), Some("declared"));
    }

    #[test]
    fn test_private_names_hidden_from_importers() {
        let mut imported = ctx("/b.props", false);
        add_property(&mut imported, "_Private");
        add_property(&mut imported, "Public");
        let top = with_import(ctx("/a.proj", true), imported);

        let names: Vec<_> = top.completion_properties().iter().map(|p| p.name.to_string()).collect();
        assert!(names.contains(&"Public".to_string()));
        assert!(!names.contains(&"_Private".to_string()));
        assert!(top.get_property("_Private").is_some());

        let child = top.context_for(Path::new("/b.props")).unwrap();
        let names: Vec<_> = child.completion_properties().iter().map(|p| p.name.to_string()).collect();
        assert!(names.contains(&"_Private".to_string()));
    }

    #[test]
    fn test_declaring_files_case_insensitive() {
        let mut imported = ctx("/b.props", false);
        add_property(&mut imported, "FOO");
        let mut top = ctx("/a.proj", true);
        add_property(&mut top, "Foo");
        let top = with_import(top, imported);

        let files = top.declaring_files(SymbolKind::Property, "foo");
        assert_eq!(files.len(), 2);
        assert_eq!(&*files[0], Path::new("/a.proj"));
    }

    #[test]
    fn test_completion_metadata_includes_well_known() {
        let mut top = ctx("/a.proj", true);
        let mut item = ItemInfo::new("Compile");
        let meta = MetadataInfo::new("Link", Some(item.name.clone()));
        item.metadata.insert(meta.name.clone(), meta);
        top.items.insert(item.name.clone(), item);

        let names: Vec<_> = top
            .completion_metadata(Some("compile"))
            .iter()
            .map(|m| m.name.to_string())
            .collect();
        assert_eq!(names[0], "Link");
        assert!(names.iter().any(|n| n == "FullPath"));
    }
}
