//! Grammar-driven document walker.
//!
//! [`walk_document`] traverses a build file using the static element grammar
//! and calls a [`WalkHandler`] at every declaration and reference site. The
//! walker itself performs no mutation; the schema builder, validator and
//! reference collector are handlers over the same traversal.
//!
//! Rules:
//! - only recognized elements are descended into
//! - an unrecognized element is reported once, directly under its recognized
//!   parent, and its subtree is skipped
//! - every expression-bearing attribute and element value is parsed and its
//!   references are reported, with the ambient item name propagated into
//!   unqualified metadata references

use crate::base::{TextRange, TextSize, TextSource};
use crate::schema::{
    AttributeSchema, BaseKind, ElementKind, ElementSchema, ExprScope, ValueKind, infer_kind_from_name,
    schema, well_known_property_kind,
};
use crate::syntax::{
    Expr, ExprKind, ExpressionOptions, FunctionInvocation, XAttribute, XDocument, XElement, parse_expression,
};

// ============================================================================
// SCOPES AND VALUES
// ============================================================================

/// A recognized element and what surrounds it.
#[derive(Clone, Copy, Debug)]
pub struct ElementScope<'a> {
    pub element: &'a XElement,
    pub kind: ElementKind,
    /// Item name for items, item definitions and their metadata.
    pub item: Option<&'a str>,
    /// Task name for task invocations, their outputs, and `UsingTask` bodies.
    pub task: Option<&'a str>,
    /// Whether the element is nested inside a `Target`.
    pub in_target: bool,
}

impl<'a> ElementScope<'a> {
    pub fn schema(&self) -> &'static ElementSchema {
        schema(self.kind)
    }

    /// Scope for the child `element` of kind `kind`.
    pub fn child(&self, element: &'a XElement, kind: ElementKind) -> ElementScope<'a> {
        let item = match kind {
            ElementKind::Item | ElementKind::ItemDefinition => Some(element.name.as_str()),
            ElementKind::Metadata => self.item,
            _ => None,
        };
        let task = match kind {
            ElementKind::Task => Some(element.name.as_str()),
            ElementKind::UsingTask => element.attribute("TaskName").map(|a| a.value.as_str()),
            ElementKind::Output | ElementKind::ParameterGroup | ElementKind::Parameter => self.task,
            _ => None,
        };
        ElementScope {
            element,
            kind,
            item,
            task,
            in_target: self.in_target || self.kind == ElementKind::Target,
        }
    }

    /// Scope for the root `Project` element.
    pub fn root(element: &'a XElement) -> ElementScope<'a> {
        ElementScope {
            element,
            kind: ElementKind::Project,
            item: None,
            task: None,
            in_target: false,
        }
    }
}

/// How an attribute on a recognized element is interpreted.
#[derive(Clone, Copy, Debug)]
pub enum AttributeRole {
    Known(&'static AttributeSchema),
    /// Metadata written as an attribute of an item.
    Metadata,
    /// A parameter of a task invocation.
    TaskParameter,
    Unknown,
}

impl AttributeRole {
    pub fn of(scope: &ElementScope<'_>, name: &str) -> AttributeRole {
        let schema = scope.schema();
        if let Some(attr) = schema.attribute(name) {
            return AttributeRole::Known(attr);
        }
        if !schema.abstract_attributes || name.starts_with("xmlns") {
            return AttributeRole::Unknown;
        }
        match scope.kind {
            ElementKind::Task => AttributeRole::TaskParameter,
            _ => AttributeRole::Metadata,
        }
    }
}

/// Where a value was written.
#[derive(Clone, Copy, Debug)]
pub enum ValueSite<'a> {
    Attribute(&'a XAttribute, AttributeRole),
    /// Text content of a property or metadata element.
    Content,
}

/// An expression-bearing value.
#[derive(Clone, Copy, Debug)]
pub struct Value<'a> {
    pub site: ValueSite<'a>,
    pub kind: ValueKind,
    pub options: ExpressionOptions,
    pub text: &'a str,
    pub range: TextRange,
}

impl Value<'_> {
    pub fn is_condition(&self) -> bool {
        self.kind.base() == BaseKind::Condition
    }

    pub fn attribute_schema(&self) -> Option<&'static AttributeSchema> {
        match self.site {
            ValueSite::Attribute(_, AttributeRole::Known(schema)) => Some(schema),
            _ => None,
        }
    }
}

fn options_for(scope: ExprScope, kind: ValueKind, in_target: bool) -> ExpressionOptions {
    let (items, metadata) = match scope {
        ExprScope::None => (false, false),
        ExprScope::Properties => (in_target, in_target),
        ExprScope::Items => (true, in_target),
        ExprScope::ItemsAndMetadata => (true, true),
    };
    kind.expression_options(items, metadata)
}

/// Kind and expression options for an attribute value.
pub fn attribute_value_shape(scope: &ElementScope<'_>, name: &str, role: AttributeRole) -> (ValueKind, ExpressionOptions) {
    match role {
        AttributeRole::Known(attr) => (attr.kind, options_for(attr.scope, attr.kind, scope.in_target)),
        AttributeRole::Metadata => {
            let kind = infer_kind_from_name(name, ValueKind::UNKNOWN).list();
            (kind, options_for(ExprScope::ItemsAndMetadata, kind, scope.in_target))
        }
        AttributeRole::TaskParameter => {
            let kind = ValueKind::UNKNOWN.list();
            (kind, options_for(ExprScope::ItemsAndMetadata, kind, true))
        }
        AttributeRole::Unknown => (ValueKind::UNKNOWN, ExpressionOptions::NONE),
    }
}

/// Kind and expression options for the text content of a property or metadata element.
pub fn content_value_shape(scope: &ElementScope<'_>) -> (ValueKind, ExpressionOptions) {
    let name = scope.element.name.as_str();
    match scope.kind {
        ElementKind::Property => {
            let declared = well_known_property_kind(&name.into()).unwrap_or(ValueKind::UNKNOWN);
            let kind = infer_kind_from_name(name, declared).list();
            (kind, options_for(ExprScope::Properties, kind, scope.in_target))
        }
        _ => {
            let kind = infer_kind_from_name(name, ValueKind::UNKNOWN).list();
            (kind, options_for(ExprScope::ItemsAndMetadata, kind, scope.in_target))
        }
    }
}

// ============================================================================
// HANDLER
// ============================================================================

/// Callbacks for every declaration and reference site. All default to no-ops.
#[allow(unused_variables)]
pub trait WalkHandler {
    /// A recognized element, before its attributes and children.
    fn element(&mut self, doc: &XDocument, scope: &ElementScope<'_>) {}

    /// An unrecognized child of a recognized element. Its subtree is not walked.
    fn unknown_element(&mut self, doc: &XDocument, parent: &ElementScope<'_>, element: &XElement) {}

    fn unknown_attribute(&mut self, doc: &XDocument, scope: &ElementScope<'_>, attribute: &XAttribute) {}

    /// An `Import` element. Called after its attributes' values.
    fn import(&mut self, doc: &XDocument, scope: &ElementScope<'_>) {}

    /// A parsed value and its expression tree, before its references are reported.
    fn value(&mut self, doc: &XDocument, scope: &ElementScope<'_>, value: &Value<'_>, expr: &Expr) {}

    fn property_declaration(&mut self, scope: &ElementScope<'_>, name: &str, range: TextRange) {}
    fn item_declaration(&mut self, scope: &ElementScope<'_>, name: &str, range: TextRange) {}
    fn metadata_declaration(&mut self, scope: &ElementScope<'_>, item: &str, name: &str, range: TextRange) {}
    fn target_declaration(&mut self, scope: &ElementScope<'_>, name: &str, range: TextRange) {}
    /// A `UsingTask` declaration.
    fn task_declaration(&mut self, scope: &ElementScope<'_>, name: &str, range: TextRange) {}
    /// A `ParameterGroup` parameter of a `UsingTask`.
    fn task_parameter_declaration(
        &mut self,
        scope: &ElementScope<'_>,
        task: &str,
        name: &str,
        range: TextRange,
        is_output: bool,
        is_required: bool,
    ) {
    }

    /// A task invoked inside a target.
    fn task_invocation(&mut self, scope: &ElementScope<'_>, name: &str, range: TextRange) {}
    /// A parameter set on a task invocation.
    fn task_parameter_usage(&mut self, scope: &ElementScope<'_>, task: &str, name: &str, range: TextRange) {}
    /// `Output TaskParameter="..."` under a task invocation.
    fn task_output(&mut self, scope: &ElementScope<'_>, task: &str, name: &str, range: TextRange) {}

    fn property_reference(&mut self, name: &str, range: TextRange) {}
    fn item_reference(&mut self, name: &str, range: TextRange) {}
    /// `item` is the explicit qualifier or the ambient item, if any.
    fn metadata_reference(&mut self, item: Option<&str>, name: &str, range: TextRange) {}
    fn target_reference(&mut self, name: &str, range: TextRange) {}
    fn function_invocation(&mut self, invocation: &FunctionInvocation, range: TextRange) {}
}

// ============================================================================
// DOCUMENT TRAVERSAL
// ============================================================================

/// Walk a whole document. Does nothing when the root is not `Project`.
pub fn walk_document<H: WalkHandler + ?Sized>(doc: &XDocument, handler: &mut H) {
    let Some(root) = doc.root() else { return };
    if !root.name.eq_ignore_ascii_case("Project") {
        tracing::trace!("root element '{}' is not Project", root.name);
        return;
    }
    Walker { doc, handler }.walk_element(&ElementScope::root(root));
}

struct Walker<'d, 'h, H: ?Sized> {
    doc: &'d XDocument,
    handler: &'h mut H,
}

impl<'d, H: WalkHandler + ?Sized> Walker<'d, '_, H> {
    fn walk_element(&mut self, scope: &ElementScope<'d>) {
        let element = scope.element;
        self.handler.element(self.doc, scope);
        self.declarations(scope);

        for attribute in &element.attributes {
            self.walk_attribute(scope, attribute);
        }

        let schema = scope.schema();
        if schema.has_value {
            if let Some(range) = element.text_range() {
                let (kind, options) = content_value_shape(scope);
                if scope.kind == ElementKind::Property || scope.kind == ElementKind::Metadata {
                    self.walk_value(scope, ValueSite::Content, kind, options, range, false);
                }
            }
        }

        if scope.kind == ElementKind::Import {
            self.handler.import(self.doc, scope);
        }

        if schema.opaque {
            return;
        }
        for child in &element.children {
            match schema.child(&child.name) {
                Some(kind) => self.walk_element(&scope.child(child, kind)),
                None => self.handler.unknown_element(self.doc, scope, child),
            }
        }
    }

    /// Declarations made by the element's own name.
    fn declarations(&mut self, scope: &ElementScope<'d>) {
        let element = scope.element;
        let name = element.name.as_str();
        let range = element.name_range;
        match scope.kind {
            ElementKind::Property => self.handler.property_declaration(scope, name, range),
            ElementKind::Item | ElementKind::ItemDefinition => self.handler.item_declaration(scope, name, range),
            ElementKind::Metadata => {
                if let Some(item) = scope.item {
                    self.handler.metadata_declaration(scope, item, name, range);
                }
            }
            ElementKind::Task => self.handler.task_invocation(scope, name, range),
            ElementKind::UsingTask => {
                if let Some((task, range)) = element.attribute("TaskName").and_then(trimmed_value) {
                    self.handler.task_declaration(scope, task, range);
                }
            }
            ElementKind::Parameter => {
                if let Some(task) = scope.task {
                    let is_output = flag(element, "Output");
                    let is_required = flag(element, "Required");
                    self.handler
                        .task_parameter_declaration(scope, task, name, range, is_output, is_required);
                }
            }
            _ => {}
        }
    }

    fn walk_attribute(&mut self, scope: &ElementScope<'d>, attribute: &'d XAttribute) {
        let role = AttributeRole::of(scope, &attribute.name);
        let mut declares = false;
        match role {
            AttributeRole::Unknown => {
                self.handler.unknown_attribute(self.doc, scope, attribute);
                return;
            }
            AttributeRole::Metadata => {
                if let Some(item) = scope.item {
                    self.handler
                        .metadata_declaration(scope, item, &attribute.name, attribute.name_range);
                }
            }
            AttributeRole::TaskParameter => {
                if let Some(task) = scope.task {
                    self.handler
                        .task_parameter_usage(scope, task, &attribute.name, attribute.name_range);
                }
            }
            AttributeRole::Known(schema) => {
                declares = self.attribute_declaration(scope, schema, attribute);
            }
        }
        let (kind, options) = attribute_value_shape(scope, &attribute.name, role);
        self.walk_value(
            scope,
            ValueSite::Attribute(attribute, role),
            kind,
            options,
            attribute.value_range,
            declares,
        );
    }

    /// Attributes whose value declares a symbol. Returns whether one was declared.
    fn attribute_declaration(
        &mut self,
        scope: &ElementScope<'d>,
        schema: &'static AttributeSchema,
        attribute: &'d XAttribute,
    ) -> bool {
        let Some((value, range)) = trimmed_value(attribute) else {
            return false;
        };
        match (scope.kind, schema.name) {
            (ElementKind::Target, "Name") => self.handler.target_declaration(scope, value, range),
            (ElementKind::Output, "PropertyName") => self.handler.property_declaration(scope, value, range),
            (ElementKind::Output, "ItemName") => self.handler.item_declaration(scope, value, range),
            (ElementKind::Output, "TaskParameter") => match scope.task {
                Some(task) => self.handler.task_output(scope, task, value, range),
                None => return false,
            },
            (ElementKind::UsingTask, "TaskName") => {}
            _ => return false,
        }
        true
    }

    fn walk_value(
        &mut self,
        scope: &ElementScope<'d>,
        site: ValueSite<'d>,
        kind: ValueKind,
        options: ExpressionOptions,
        range: TextRange,
        declares: bool,
    ) {
        let text = self.doc.slice(range).unwrap_or("");
        let expr = parse_expression(text, options, range.start());
        let value = Value {
            site,
            kind,
            options,
            text,
            range,
        };
        self.handler.value(self.doc, scope, &value, &expr);
        walk_expression(self.handler, &expr, scope.item);
        if !declares {
            self.literal_names(scope, kind, &expr);
        }
    }

    /// Literal names in name-kind values, e.g. `DependsOnTargets="Build;Test"`.
    fn literal_names(&mut self, scope: &ElementScope<'d>, kind: ValueKind, expr: &Expr) {
        let base = kind.base();
        if !matches!(
            base,
            BaseKind::TargetName | BaseKind::PropertyName | BaseKind::ItemName | BaseKind::MetadataName
        ) {
            return;
        }
        for value in expr.values() {
            let Some((name, range)) = trimmed_text(value) else { continue };
            match base {
                BaseKind::TargetName => self.handler.target_reference(name, range),
                BaseKind::PropertyName => self.handler.property_reference(name, range),
                BaseKind::ItemName => self.handler.item_reference(name, range),
                _ => self.handler.metadata_reference(scope.item, name, range),
            }
        }
    }
}

fn flag(element: &XElement, name: &str) -> bool {
    element
        .attribute(name)
        .is_some_and(|a| a.value.trim().eq_ignore_ascii_case("true"))
}

/// An attribute value with surrounding whitespace removed, and its span.
pub fn trimmed_value(attribute: &XAttribute) -> Option<(&str, TextRange)> {
    trim_span(&attribute.value, attribute.value_range.start())
}

/// The trimmed text of a pure text node, and its span.
pub fn trimmed_text(expr: &Expr) -> Option<(&str, TextRange)> {
    match &expr.kind {
        ExprKind::Text { value, .. } => trim_span(value, expr.range.start()),
        _ => None,
    }
}

fn trim_span(text: &str, start: TextSize) -> Option<(&str, TextRange)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = text.len() - text.trim_start().len();
    let start = start + TextSize::from(lead as u32);
    Some((trimmed, TextRange::at(start, TextSize::of(trimmed))))
}

// ============================================================================
// EXPRESSION TRAVERSAL
// ============================================================================

/// Report every reference in `expr`.
///
/// Unqualified metadata inside an item transform refers to that item; outside
/// one it refers to `ambient_item`.
pub fn walk_expression<H: WalkHandler + ?Sized>(handler: &mut H, expr: &Expr, ambient_item: Option<&str>) {
    match &expr.kind {
        ExprKind::Property(inner) => walk_reference(handler, inner, false, ambient_item),
        ExprKind::Item(inner) => walk_reference(handler, inner, true, ambient_item),
        ExprKind::Metadata(m) => {
            if let Some(item) = &m.item {
                handler.item_reference(&item.name, item.range);
            }
            let item = m.item.as_ref().map(|i| i.name.as_str()).or(ambient_item);
            handler.metadata_reference(item, &m.name.name, m.name.range);
        }
        ExprKind::Error { .. } => {}
        _ => {
            for child in expr.children() {
                walk_expression(handler, child, ambient_item);
            }
        }
    }
}

fn walk_reference<H: WalkHandler + ?Sized>(handler: &mut H, node: &Expr, in_item: bool, ambient_item: Option<&str>) {
    match &node.kind {
        ExprKind::Name(name) => {
            if in_item {
                handler.item_reference(name, node.range);
            } else {
                handler.property_reference(name, node.range);
            }
        }
        ExprKind::Invocation(inv) => {
            walk_reference(handler, &inv.target, in_item, ambient_item);
            handler.function_invocation(inv, node.range);
            let ambient = if in_item { root_name(&inv.target).or(ambient_item) } else { ambient_item };
            for arg in inv.arguments.iter().flatten() {
                walk_expression(handler, arg, ambient);
            }
        }
        ExprKind::Transform(t) => {
            walk_reference(handler, &t.target, true, ambient_item);
            let item = root_name(&t.target).or(ambient_item);
            if let Some(body) = &t.transform {
                walk_expression(handler, body, item);
            }
            if let Some(separator) = &t.separator {
                walk_expression(handler, separator, ambient_item);
            }
        }
        ExprKind::ClassReference(_) | ExprKind::RegistryReference(_) | ExprKind::Error { .. } => {}
        _ => walk_expression(handler, node, ambient_item),
    }
}

/// The item or property name at the root of an invocation or transform chain.
pub fn root_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Name(name) => Some(name),
        ExprKind::Invocation(inv) => root_name(&inv.target),
        ExprKind::Transform(t) => root_name(&t.target),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl WalkHandler for Recorder {
        fn unknown_element(&mut self, _doc: &XDocument, _parent: &ElementScope<'_>, element: &XElement) {
            self.events.push(format!("unknown {}", element.name));
        }
        fn property_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, _range: TextRange) {
            self.events.push(format!("decl property {name}"));
        }
        fn item_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, _range: TextRange) {
            self.events.push(format!("decl item {name}"));
        }
        fn metadata_declaration(&mut self, _scope: &ElementScope<'_>, item: &str, name: &str, _range: TextRange) {
            self.events.push(format!("decl metadata {item}.{name}"));
        }
        fn target_declaration(&mut self, _scope: &ElementScope<'_>, name: &str, _range: TextRange) {
            self.events.push(format!("decl target {name}"));
        }
        fn task_invocation(&mut self, _scope: &ElementScope<'_>, name: &str, _range: TextRange) {
            self.events.push(format!("task {name}"));
        }
        fn task_output(&mut self, _scope: &ElementScope<'_>, task: &str, name: &str, _range: TextRange) {
            self.events.push(format!("output {task}.{name}"));
        }
        fn property_reference(&mut self, name: &str, _range: TextRange) {
            self.events.push(format!("ref property {name}"));
        }
        fn item_reference(&mut self, name: &str, _range: TextRange) {
            self.events.push(format!("ref item {name}"));
        }
        fn metadata_reference(&mut self, item: Option<&str>, name: &str, _range: TextRange) {
            self.events.push(format!("ref metadata {}.{name}", item.unwrap_or("?")));
        }
        fn target_reference(&mut self, name: &str, _range: TextRange) {
            self.events.push(format!("ref target {name}"));
        }
    }

    fn walk(text: &str) -> Vec<String> {
        let doc = XDocument::parse(text);
        let mut recorder = Recorder::default();
        walk_document(&doc, &mut recorder);
        recorder.events
    }

    #[test]
    fn test_declarations() {
        let events = walk(
            r#"<Project>
  <PropertyGroup><Foo>$(Bar)</Foo></PropertyGroup>
  <ItemGroup><Compile Include="a.cs" Link="x"><Visible>false</Visible></Compile></ItemGroup>
</Project>"#,
        );
        assert_eq!(
            events,
            [
                "decl property Foo",
                "ref property Bar",
                "decl item Compile",
                "decl metadata Compile.Link",
                "decl metadata Compile.Visible",
            ]
        );
    }

    #[test]
    fn test_unknown_subtree_reported_once() {
        let events = walk("<Project><Bogus><Nested/></Bogus><PropertyGroup/></Project>");
        assert_eq!(events, ["unknown Bogus"]);
    }

    #[test]
    fn test_transform_propagates_item_to_metadata() {
        let events = walk(
            r#"<Project><Target Name="T" DependsOnTargets="A;B"><Message Text="@(Foo->'%(Filename)')" /></Target></Project>"#,
        );
        assert!(events.contains(&"decl target T".to_string()));
        assert!(events.contains(&"ref target A".to_string()));
        assert!(events.contains(&"ref target B".to_string()));
        assert!(events.contains(&"task Message".to_string()));
        assert!(events.contains(&"ref item Foo".to_string()));
        assert!(events.contains(&"ref metadata Foo.Filename".to_string()));
    }

    #[test]
    fn test_output_declares_property() {
        let events = walk(
            r#"<Project><Target Name="T"><Exec Command="x"><Output TaskParameter="ExitCode" PropertyName="Code" /></Exec></Target></Project>"#,
        );
        assert!(events.contains(&"output Exec.ExitCode".to_string()));
        assert!(events.contains(&"decl property Code".to_string()));
        assert!(!events.contains(&"ref property Code".to_string()));
    }

    #[test]
    fn test_non_project_root_is_ignored() {
        assert!(walk("<Foo><PropertyGroup/></Foo>").is_empty());
    }

    #[test]
    fn test_trimmed_value_span() {
        let doc = XDocument::parse(r#"<Target Name="  Build " />"#);
        let attr = doc.root().unwrap().attribute("Name").unwrap();
        let (name, range) = trimmed_value(attr).unwrap();
        assert_eq!(name, "Build");
        assert_eq!(doc.slice(range), Some("Build"));
    }
}
