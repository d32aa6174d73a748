//! Single-symbol reference collection for find-references and rename.

use super::resolve::{Reference, ResolveResult};
use super::walker::{ElementScope, WalkHandler, walk_document};
use crate::base::TextRange;
use crate::schema::SymbolKind;
use crate::syntax::{ExprKind, FunctionInvocation, InvocationKind, XDocument};

/// One occurrence of the collected symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceSpan {
    pub range: TextRange,
    pub is_declaration: bool,
}

/// Walk handler that records every span naming one symbol.
#[derive(Clone, Debug)]
pub struct ReferenceCollector {
    target: Reference,
    spans: Vec<ReferenceSpan>,
}

impl ReferenceCollector {
    /// A collector for the symbol in `result`, if it has one.
    pub fn for_result(result: &ResolveResult) -> Option<Self> {
        result.reference.clone().map(Self::new)
    }

    pub fn new(target: Reference) -> Self {
        Self {
            target,
            spans: Vec::new(),
        }
    }

    pub fn target(&self) -> &Reference {
        &self.target
    }

    /// Walk `doc` and return the spans found in it, in document order.
    pub fn collect(&mut self, doc: &XDocument) -> Vec<ReferenceSpan> {
        self.spans.clear();
        walk_document(doc, self);
        self.spans.sort_by_key(|s| s.range.start());
        self.spans.dedup();
        std::mem::take(&mut self.spans)
    }

    fn record(&mut self, kind: SymbolKind, name: &str, owner: Option<&str>, range: TextRange, is_declaration: bool) {
        if self.target.same_symbol(kind, name, owner) {
            self.spans.push(ReferenceSpan { range, is_declaration });
        }
    }
}

impl WalkHandler for ReferenceCollector {
    fn property_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        self.record(SymbolKind::Property, name, None, range, true);
    }

    fn item_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        self.record(SymbolKind::Item, name, None, range, true);
    }

    fn metadata_declaration(&mut self, _scope: &ElementScope<'_>, item: &str, name: &str, range: TextRange) {
        self.record(SymbolKind::Metadata, name, Some(item), range, true);
    }

    fn target_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        self.record(SymbolKind::Target, name, None, range, true);
    }

    fn task_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        self.record(SymbolKind::Task, name, None, range, true);
    }

    fn task_parameter_declaration(
        &mut self,
        _scope: &ElementScope<'_>,
        task: &str,
        name: &str,
        range: TextRange,
        _is_output: bool,
        _is_required: bool,
    ) {
        self.record(SymbolKind::TaskParameter, name, Some(task), range, true);
    }

    fn task_invocation(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        self.record(SymbolKind::Task, name, None, range, false);
    }

    fn task_parameter_usage(&mut self, _scope: &ElementScope<'_>, task: &str, name: &str, range: TextRange) {
        self.record(SymbolKind::TaskParameter, name, Some(task), range, false);
    }

    fn task_output(&mut self, _scope: &ElementScope<'_>, task: &str, name: &str, range: TextRange) {
        self.record(SymbolKind::TaskParameter, name, Some(task), range, false);
    }

    fn property_reference(&mut self, name: &str, range: TextRange) {
        self.record(SymbolKind::Property, name, None, range, false);
    }

    fn item_reference(&mut self, name: &str, range: TextRange) {
        self.record(SymbolKind::Item, name, None, range, false);
    }

    fn metadata_reference(&mut self, item: Option<&str>, name: &str, range: TextRange) {
        self.record(SymbolKind::Metadata, name, item, range, false);
    }

    fn target_reference(&mut self, name: &str, range: TextRange) {
        self.record(SymbolKind::Target, name, None, range, false);
    }

    fn function_invocation(&mut self, invocation: &FunctionInvocation, _range: TextRange) {
        let class = match (&invocation.kind, &invocation.target.kind) {
            (InvocationKind::Static, ExprKind::ClassReference(class)) => {
                self.record(SymbolKind::Class, class, None, invocation.target.range, false);
                Some(class.as_str())
            }
            _ => None,
        };
        self.record(SymbolKind::Function, &invocation.name.name, class, invocation.name.range, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextSource;

    fn collect(text: &str, kind: SymbolKind, name: &str) -> Vec<String> {
        let doc = XDocument::parse(text);
        let target = Reference {
            kind,
            name: name.into(),
            owner: None,
            range: TextRange::default(),
        };
        ReferenceCollector::new(target)
            .collect(&doc)
            .iter()
            .map(|s| format!("{}{}", if s.is_declaration { "decl:" } else { "" }, doc.slice(s.range).unwrap_or("")))
            .collect()
    }

    #[test]
    fn test_property_declarations_and_uses() {
        let spans = collect(
            r#"<Project><PropertyGroup><Foo>1</Foo><Bar>$(FOO);$(foo.Trim())</Bar></PropertyGroup><Target Name="T" Condition="'$(Foo)' != ''" /></Project>"#,
            SymbolKind::Property,
            "foo",
        );
        assert_eq!(spans, ["decl:Foo", "FOO", "foo", "Foo"]);
    }

    #[test]
    fn test_target_references_in_lists() {
        let spans = collect(
            r#"<Project><Target Name="Build" /><Target Name="Pack" DependsOnTargets="Build; Restore" AfterTargets="build" /></Project>"#,
            SymbolKind::Target,
            "Build",
        );
        assert_eq!(spans, ["decl:Build", "Build", "build"]);
    }

    #[test]
    fn test_metadata_owner_filter() {
        let doc = XDocument::parse(
            r#"<Project><ItemGroup><A Include="x" Link="1" /><B Include="y" Link="2" /></ItemGroup></Project>"#,
        );
        let target = Reference {
            kind: SymbolKind::Metadata,
            name: "Link".into(),
            owner: Some("A".into()),
            range: TextRange::default(),
        };
        let spans = ReferenceCollector::new(target).collect(&doc);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_declaration);
    }
}
