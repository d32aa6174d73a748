//! Caret resolution: what schema element, attribute and symbol an offset maps to.
//!
//! The XML spine under the caret is mapped through the element grammar. When
//! the caret is in a value, the value is parsed and the reference under the
//! caret is found with the same expression traversal the walker uses.

use smol_str::SmolStr;

use super::context::ResolutionContext;
use super::walker::{
    AttributeRole, ElementScope, WalkHandler, attribute_value_shape, content_value_shape, trimmed_text,
    trimmed_value, walk_expression,
};
use crate::base::{TextRange, TextSize, TextSource};
use crate::schema::{BaseKind, ElementKind, SymbolKind, ValueKind};
use crate::syntax::{
    Expr, ExprKind, ExpressionOptions, FunctionInvocation, InvocationKind, XDocument, XSpine, parse_expression,
};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// A symbol referenced at the caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub kind: SymbolKind,
    pub name: SmolStr,
    /// Item owning a metadata reference, task owning a parameter, or class
    /// of a static function.
    pub owner: Option<SmolStr>,
    pub range: TextRange,
}

impl Reference {
    fn new(kind: SymbolKind, name: &str, owner: Option<&str>, range: TextRange) -> Self {
        Self {
            kind,
            name: SmolStr::new(name),
            owner: owner.map(SmolStr::new),
            range,
        }
    }

    /// Whether `other` names the same symbol, ignoring case.
    pub fn same_symbol(&self, kind: SymbolKind, name: &str, owner: Option<&str>) -> bool {
        if self.kind != kind || !self.name.eq_ignore_ascii_case(name) {
            return false;
        }
        match (self.owner.as_deref(), owner) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => true,
        }
    }
}

/// The answer to "what is at this offset".
#[derive(Clone, Debug, PartialEq)]
pub struct ResolveResult {
    pub element: ElementKind,
    pub element_name: SmolStr,
    /// The attribute under the caret, if any.
    pub attribute: Option<SmolStr>,
    /// Kind of the value under the caret, if the caret is in a value.
    pub value_kind: Option<ValueKind>,
    pub reference: Option<Reference>,
}

impl ResolveResult {
    /// The reference, if it names a symbol known to `ctx`.
    pub fn is_known(&self, ctx: &ResolutionContext) -> bool {
        match &self.reference {
            Some(r) if r.kind == SymbolKind::Metadata => ctx.get_metadata(r.owner.as_deref(), &r.name).is_some(),
            Some(r) => ctx.is_known(r.kind, &r.name),
            None => false,
        }
    }
}

// ============================================================================
// RESOLVE
// ============================================================================

/// Resolve the element, attribute and symbol at `offset`.
///
/// Returns `None` when the caret is outside the recognized grammar.
pub fn resolve(offset: TextSize, doc: &XDocument, _ctx: &ResolutionContext) -> Option<ResolveResult> {
    let spine = doc.spine_at(offset);
    let scope = scope_at(&spine)?;
    let element = scope.element;
    let mut result = ResolveResult {
        element: scope.kind,
        element_name: element.name.clone(),
        attribute: None,
        value_kind: None,
        reference: None,
    };

    if element.name_range.contains_inclusive(offset) && element.start_tag_range.contains(offset) {
        result.reference = element_reference(&scope);
        return Some(result);
    }

    if let Some(attr) = spine.attribute {
        result.attribute = Some(attr.name.clone());
        let role = AttributeRole::of(&scope, &attr.name);
        if attr.name_range.contains_inclusive(offset) {
            result.reference = match role {
                AttributeRole::Metadata => scope
                    .item
                    .map(|item| Reference::new(SymbolKind::Metadata, &attr.name, Some(item), attr.name_range)),
                AttributeRole::TaskParameter => scope
                    .task
                    .map(|task| Reference::new(SymbolKind::TaskParameter, &attr.name, Some(task), attr.name_range)),
                _ => None,
            };
            return Some(result);
        }
        if attr.value_range.contains_inclusive(offset) {
            let (kind, options) = attribute_value_shape(&scope, &attr.name, role);
            result.value_kind = Some(kind);
            if let Some(declared) = declaration_reference(&scope, &attr.name) {
                result.reference = trimmed_value(attr)
                    .filter(|(_, range)| range.contains_inclusive(offset))
                    .map(|(name, range)| Reference::new(declared.0, name, declared.1, range));
                return Some(result);
            }
            result.reference = value_reference(&scope, &attr.value, attr.value_range.start(), kind, options, offset);
            return Some(result);
        }
        return Some(result);
    }

    if matches!(scope.kind, ElementKind::Property | ElementKind::Metadata) {
        if let Some(range) = element.text_range().filter(|r| r.contains_inclusive(offset)) {
            let (kind, options) = content_value_shape(&scope);
            result.value_kind = Some(kind);
            let text = doc.slice(range).unwrap_or("");
            result.reference = value_reference(&scope, text, range.start(), kind, options, offset);
        }
    }
    Some(result)
}

/// Map a spine through the element grammar. `None` if any element is unknown.
fn scope_at<'d>(spine: &XSpine<'d>) -> Option<ElementScope<'d>> {
    let (root, rest) = spine.elements.split_first()?;
    if !root.name.eq_ignore_ascii_case("Project") {
        return None;
    }
    let mut scope = ElementScope::root(root);
    for &element in rest {
        let kind = scope.schema().child(&element.name)?;
        scope = scope.child(element, kind);
    }
    Some(scope)
}

/// The expression value under a caret.
#[derive(Clone, Debug, PartialEq)]
pub struct CaretValue {
    /// Span of the whole value text.
    pub range: TextRange,
    pub kind: ValueKind,
    pub options: ExpressionOptions,
    pub is_condition: bool,
    /// Item owning unqualified metadata in the value.
    pub item: Option<SmolStr>,
}

/// The attribute value or element text containing `offset`, with its kind.
pub fn value_at(offset: TextSize, doc: &XDocument) -> Option<CaretValue> {
    let spine = doc.spine_at(offset);
    let scope = scope_at(&spine)?;
    let item = scope.item.map(SmolStr::new);
    if let Some(attr) = spine.attribute {
        if !attr.value_range.contains_inclusive(offset) || declaration_reference(&scope, &attr.name).is_some() {
            return None;
        }
        let role = AttributeRole::of(&scope, &attr.name);
        let (kind, options) = attribute_value_shape(&scope, &attr.name, role);
        return Some(CaretValue {
            range: attr.value_range,
            kind,
            options,
            is_condition: kind.base() == BaseKind::Condition,
            item,
        });
    }
    if !matches!(scope.kind, ElementKind::Property | ElementKind::Metadata) {
        return None;
    }
    let range = scope
        .element
        .text_range()
        .filter(|r| r.contains_inclusive(offset))?;
    let (kind, options) = content_value_shape(&scope);
    Some(CaretValue {
        range,
        kind,
        options,
        is_condition: false,
        item,
    })
}

/// The symbol an element's own name declares or uses.
fn element_reference(scope: &ElementScope<'_>) -> Option<Reference> {
    let element = scope.element;
    let range = element.name_range;
    let (kind, owner) = match scope.kind {
        ElementKind::Property => (SymbolKind::Property, None),
        ElementKind::Item | ElementKind::ItemDefinition => (SymbolKind::Item, None),
        ElementKind::Metadata => (SymbolKind::Metadata, scope.item),
        ElementKind::Task => (SymbolKind::Task, None),
        ElementKind::Parameter => (SymbolKind::TaskParameter, scope.task),
        _ => return None,
    };
    Some(Reference::new(kind, &element.name, owner, range))
}

/// Attributes whose value is a declaration rather than an expression.
fn declaration_reference<'a>(scope: &ElementScope<'a>, attribute: &str) -> Option<(SymbolKind, Option<&'a str>)> {
    let is = |name: &str| attribute.eq_ignore_ascii_case(name);
    match scope.kind {
        ElementKind::Target if is("Name") => Some((SymbolKind::Target, None)),
        ElementKind::Output if is("PropertyName") => Some((SymbolKind::Property, None)),
        ElementKind::Output if is("ItemName") => Some((SymbolKind::Item, None)),
        ElementKind::Output if is("TaskParameter") => Some((SymbolKind::TaskParameter, scope.task)),
        ElementKind::UsingTask if is("TaskName") => Some((SymbolKind::Task, None)),
        _ => None,
    }
}

fn value_reference(
    scope: &ElementScope<'_>,
    text: &str,
    base: TextSize,
    kind: ValueKind,
    options: ExpressionOptions,
    offset: TextSize,
) -> Option<Reference> {
    let expr = parse_expression(text, options, base);
    if let Some(found) = reference_at(&expr, offset, scope.item) {
        return Some(found);
    }
    let symbol = match kind.base() {
        BaseKind::TargetName => SymbolKind::Target,
        BaseKind::PropertyName => SymbolKind::Property,
        BaseKind::ItemName => SymbolKind::Item,
        BaseKind::MetadataName => SymbolKind::Metadata,
        BaseKind::TaskName => SymbolKind::Task,
        _ => return None,
    };
    let owner = (symbol == SymbolKind::Metadata).then_some(scope.item).flatten();
    expr.values()
        .into_iter()
        .filter_map(trimmed_text)
        .find(|(_, range)| range.contains_inclusive(offset))
        .map(|(name, range)| Reference::new(symbol, name, owner, range))
}

/// The reference in `expr` whose name span contains `offset`.
pub fn reference_at(expr: &Expr, offset: TextSize, ambient_item: Option<&str>) -> Option<Reference> {
    let mut finder = ReferenceAt { offset, found: None };
    walk_expression(&mut finder, expr, ambient_item);
    finder.found
}

struct ReferenceAt {
    offset: TextSize,
    found: Option<Reference>,
}

impl ReferenceAt {
    fn offer(&mut self, kind: SymbolKind, name: &str, owner: Option<&str>, range: TextRange) {
        if self.found.is_none() && range.contains_inclusive(self.offset) {
            self.found = Some(Reference::new(kind, name, owner, range));
        }
    }
}

impl WalkHandler for ReferenceAt {
    fn property_reference(&mut self, name: &str, range: TextRange) {
        self.offer(SymbolKind::Property, name, None, range);
    }

    fn item_reference(&mut self, name: &str, range: TextRange) {
        self.offer(SymbolKind::Item, name, None, range);
    }

    fn metadata_reference(&mut self, item: Option<&str>, name: &str, range: TextRange) {
        self.offer(SymbolKind::Metadata, name, item, range);
    }

    fn function_invocation(&mut self, invocation: &FunctionInvocation, _range: TextRange) {
        if invocation.kind == InvocationKind::Indexer {
            return;
        }
        let class = match &invocation.target.kind {
            ExprKind::ClassReference(class) if invocation.kind == InvocationKind::Static => {
                self.offer(SymbolKind::Class, class, None, invocation.target.range);
                Some(class.as_str())
            }
            _ => None,
        };
        self.offer(SymbolKind::Function, &invocation.name.name, class, invocation.name.range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    fn resolve_at(text: &str, marker: &str) -> Option<ResolveResult> {
        let offset = text.find(marker).expect("marker") as u32;
        let doc = XDocument::parse(text);
        let ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        resolve(TextSize::from(offset + 1), &doc, &ctx)
    }

    fn reference(result: Option<ResolveResult>) -> Reference {
        result.and_then(|r| r.reference).expect("reference")
    }

    #[test]
    fn test_property_element_name() {
        let r = reference(resolve_at("<Project><PropertyGroup><Foo>1</Foo></PropertyGroup></Project>", "Foo"));
        assert_eq!(r.kind, SymbolKind::Property);
        assert_eq!(r.name, "Foo");
    }

    #[test]
    fn test_property_reference_in_value() {
        let r = reference(resolve_at(
            "<Project><PropertyGroup><A>x$(Bar)y</A></PropertyGroup></Project>",
            "Bar",
        ));
        assert_eq!(r.kind, SymbolKind::Property);
        assert_eq!(r.name, "Bar");
    }

    #[test]
    fn test_metadata_attribute_owner() {
        let r = reference(resolve_at(
            r#"<Project><ItemGroup><Compile Include="a" Link="b" /></ItemGroup></Project>"#,
            "Link",
        ));
        assert_eq!(r.kind, SymbolKind::Metadata);
        assert_eq!(r.owner.as_deref(), Some("Compile"));
    }

    #[test]
    fn test_target_name_declaration_and_usage() {
        let text = r#"<Project><Target Name="Build" DependsOnTargets="Restore;Compile" /></Project>"#;
        let r = reference(resolve_at(text, "Build"));
        assert_eq!((r.kind, r.name.as_str()), (SymbolKind::Target, "Build"));
        let r = reference(resolve_at(text, "Compile"));
        assert_eq!((r.kind, r.name.as_str()), (SymbolKind::Target, "Compile"));
    }

    #[test]
    fn test_transform_metadata_uses_item() {
        let r = reference(resolve_at(
            r#"<Project><Target Name="T"><Message Text="@(Foo->'%(Identity)')" /></Target></Project>"#,
            "Identity",
        ));
        assert_eq!(r.kind, SymbolKind::Metadata);
        assert_eq!(r.owner.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_unknown_element_resolves_to_none() {
        assert!(resolve_at("<Project><Bogus><X/></Bogus></Project>", "X").is_none());
    }

    #[test]
    fn test_value_at_condition_and_content() {
        let text = r#"<Project><PropertyGroup Condition="'$(A)' == ''"><Foo>$(Bar)</Foo></PropertyGroup></Project>"#;
        let doc = XDocument::parse(text);
        let at = |marker: &str| TextSize::from(text.find(marker).expect("marker") as u32 + 1);

        let value = value_at(at("$(A)"), &doc).expect("condition value");
        assert!(value.is_condition);

        let value = value_at(at("$(Bar)"), &doc).expect("content value");
        assert!(!value.is_condition);
        assert_eq!(doc.slice(value.range), Some("$(Bar)"));
    }

    #[test]
    fn test_same_symbol_ignores_case() {
        let r = Reference::new(SymbolKind::Property, "Foo", None, TextRange::default());
        assert!(r.same_symbol(SymbolKind::Property, "FOO", None));
        assert!(!r.same_symbol(SymbolKind::Item, "Foo", None));
    }
}
