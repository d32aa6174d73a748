//! Advisory validation of a top-level build file.

use rustc_hash::FxHashSet;

use super::context::ResolutionContext;
use super::diagnostics::{Diagnostic, DiagnosticCollector, codes};
use super::walker::{ElementScope, Value, ValueSite, WalkHandler, walk_document};
use crate::base::{TextRange, TextSize};
use crate::schema::{BaseKind, ElementKind, FunctionTypeProvider, ValueKind, known_values};
use crate::syntax::{Expr, ExprKind, FunctionInvocation, InvocationKind, XAttribute, XDocument, XElement};

/// Validate `doc` against the grammar and the symbols in `ctx`.
pub fn validate_document(
    doc: &XDocument,
    ctx: &ResolutionContext,
    functions: &dyn FunctionTypeProvider,
) -> Vec<Diagnostic> {
    let mut validator = Validator {
        ctx,
        functions,
        diagnostics: DiagnosticCollector::new(),
    };
    walk_document(doc, &mut validator);
    validator.diagnostics.take()
}

struct Validator<'a> {
    ctx: &'a ResolutionContext,
    functions: &'a dyn FunctionTypeProvider,
    diagnostics: DiagnosticCollector,
}

impl Validator<'_> {
    fn required_attributes(&mut self, scope: &ElementScope<'_>) {
        let element = scope.element;
        for attr in scope.schema().attributes.iter().filter(|a| a.required) {
            if element.attribute(attr.name).is_none() {
                self.diagnostics.error(
                    element.name_range,
                    codes::MISSING_ATTRIBUTE,
                    format!("Element '{}' requires attribute '{}'", element.name, attr.name),
                );
            }
        }
    }

    fn unique_children(&mut self, scope: &ElementScope<'_>) {
        let schema = scope.schema();
        let mut seen = FxHashSet::default();
        for child in &scope.element.children {
            let Some(kind) = schema.child(&child.name) else { continue };
            if kind.schema().unique && !seen.insert(kind) {
                self.diagnostics.error(
                    child.name_range,
                    codes::DUPLICATE_ELEMENT,
                    format!("Element '{}' may only appear once here", child.name),
                );
            }
        }
    }

    /// `Include`, `Update` and `Remove` are mutually exclusive on an item.
    fn item_operations(&mut self, scope: &ElementScope<'_>) {
        let element = scope.element;
        let present: Vec<&XAttribute> = ["Include", "Update", "Remove"]
            .iter()
            .filter_map(|name| element.attribute(name))
            .collect();
        if let [first, rest @ ..] = present.as_slice() {
            for attr in rest {
                self.diagnostics.error(
                    attr.name_range,
                    codes::DUPLICATE_ELEMENT,
                    format!("'{}' cannot be combined with '{}'", attr.name, first.name),
                );
            }
        } else if !scope.in_target {
            self.diagnostics.error(
                element.name_range,
                codes::MISSING_ATTRIBUTE,
                format!("Item '{}' requires one of 'Include', 'Update' or 'Remove'", element.name),
            );
        }
    }

    fn check_literal(&mut self, kind: ValueKind, text: &str, range: TextRange) {
        let base = kind.base();
        let valid = match base {
            BaseKind::Bool => text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false"),
            BaseKind::Int => text.parse::<i64>().is_ok(),
            BaseKind::Float => text.parse::<f64>().is_ok(),
            BaseKind::Guid | BaseKind::ProjectKindGuid => {
                uuid::Uuid::parse_str(text.trim_start_matches('{').trim_end_matches('}')).is_ok()
            }
            BaseKind::Url => url::Url::parse(text).is_ok(),
            BaseKind::Version => is_version(text),
            BaseKind::VersionSuffixed => is_version(text.split(['-', '+']).next().unwrap_or("")),
            BaseKind::Lcid => text.parse::<u32>().is_ok(),
            BaseKind::ContinueOnError | BaseKind::Importance | BaseKind::TaskArchitecture | BaseKind::TaskRuntime => {
                if let Some(values) = known_values(kind) {
                    if !values.iter().any(|v| v.name.matches(text)) {
                        self.diagnostics.warning(
                            range,
                            codes::UNKNOWN_VALUE,
                            format!("Unknown {} value '{}'", base.as_str(), text),
                        );
                    }
                }
                return;
            }
            _ => return,
        };
        if !valid {
            self.diagnostics.error(
                range,
                codes::INVALID_VALUE,
                format!("Invalid {} value '{}'", base.as_str(), text),
            );
        }
    }
}

fn is_version(text: &str) -> bool {
    let parts: Vec<_> = text.split('.').collect();
    (2..=4).contains(&parts.len()) && parts.iter().all(|p| p.parse::<u32>().is_ok())
}

fn has_references(expr: &Expr) -> bool {
    expr.walk().into_iter().any(|e| {
        matches!(
            e.kind,
            ExprKind::Property(_) | ExprKind::Item(_) | ExprKind::Metadata(_)
        )
    })
}

impl WalkHandler for Validator<'_> {
    fn element(&mut self, _doc: &XDocument, scope: &ElementScope<'_>) {
        self.required_attributes(scope);
        self.unique_children(scope);
        if scope.kind == ElementKind::Item {
            self.item_operations(scope);
        }
    }

    fn unknown_element(&mut self, _doc: &XDocument, parent: &ElementScope<'_>, element: &XElement) {
        self.diagnostics.error(
            element.name_range,
            codes::UNKNOWN_ELEMENT,
            format!("Unknown element '{}' in '{}'", element.name, parent.element.name),
        );
    }

    fn unknown_attribute(&mut self, _doc: &XDocument, scope: &ElementScope<'_>, attribute: &XAttribute) {
        if attribute.name.starts_with("xmlns") {
            return;
        }
        self.diagnostics.error(
            attribute.name_range,
            codes::UNKNOWN_ATTRIBUTE,
            format!("Unknown attribute '{}' on '{}'", attribute.name, scope.element.name),
        );
    }

    fn value(&mut self, _doc: &XDocument, _scope: &ElementScope<'_>, value: &Value<'_>, expr: &Expr) {
        if let ValueSite::Attribute(attr, _) = value.site {
            let required = value.attribute_schema().is_some_and(|a| a.required);
            if required && value.text.trim().is_empty() {
                self.diagnostics.error(
                    attr.range,
                    codes::EMPTY_VALUE,
                    format!("Attribute '{}' must not be empty", attr.name),
                );
                return;
            }
        }

        if let Some(error) = expr.error() {
            let start = error.range.start();
            let end = value.range.end().max(start);
            let range = if start < end { TextRange::new(start, end) } else { error.range };
            let message = expr.error_kind().map(|k| k.to_string()).unwrap_or_default();
            self.diagnostics.error(range, codes::EXPRESSION_SYNTAX, message);
            return;
        }

        if value.kind.is_literal() {
            if has_references(expr) {
                self.diagnostics.error(
                    value.range,
                    codes::EXPRESSION_NOT_ALLOWED,
                    "Expressions are not allowed in this value",
                );
            }
        }

        for item in expr.values() {
            if let ExprKind::Text { value: text, .. } = &item.kind {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let lead = text.len() - text.trim_start().len();
                let start = item.range.start() + TextSize::from(lead as u32);
                let range = TextRange::at(start, TextSize::of(trimmed));
                self.check_literal(value.kind, trimmed, range);
            }
        }
    }

    fn task_invocation(&mut self, _scope: &ElementScope<'_>, name: &str, range: TextRange) {
        if self.ctx.get_task(name).is_some_and(|t| t.is_inferred) {
            self.diagnostics.warning(
                range,
                codes::UNDEFINED_TASK,
                format!("Task '{name}' is not defined"),
            );
        }
    }

    fn function_invocation(&mut self, invocation: &FunctionInvocation, _range: TextRange) {
        let name = invocation.name.name.as_str();
        let known = match invocation.kind {
            InvocationKind::Indexer => true,
            InvocationKind::PropertyMethod => self.functions.find_property_function(name).is_some(),
            InvocationKind::ItemMethod => self.functions.find_item_function(name).is_some(),
            InvocationKind::Static => {
                let ExprKind::ClassReference(class) = &invocation.target.kind else { return };
                if self.functions.find_class(class).is_none() {
                    self.diagnostics.warning(
                        invocation.target.range,
                        codes::UNKNOWN_FUNCTION,
                        format!("Unknown class '{class}'"),
                    );
                    return;
                }
                self.functions.find_static_function(class, name).is_some()
            }
        };
        if !known && !name.is_empty() {
            self.diagnostics.warning(
                invocation.name.range,
                codes::UNKNOWN_FUNCTION,
                format!("Unknown function '{name}'"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SymbolName;
    use crate::schema::{StaticFunctionTypeProvider, TaskInfo};
    use std::path::Path;
    use std::sync::Arc;

    fn validate(text: &str) -> Vec<Diagnostic> {
        let doc = XDocument::parse(text);
        let ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        validate_document(&doc, &ctx, &StaticFunctionTypeProvider)
    }

    fn codes_of(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics.iter().filter_map(|d| d.code).collect()
    }

    #[test]
    fn test_unknown_element_reported_once() {
        let diagnostics = validate("<Project><Bogus><Nested /></Bogus></Project>");
        assert_eq!(codes_of(&diagnostics), [codes::UNKNOWN_ELEMENT]);
    }

    #[test]
    fn test_missing_required_attribute() {
        let diagnostics = validate("<Project><Target /></Project>");
        assert_eq!(codes_of(&diagnostics), [codes::MISSING_ATTRIBUTE]);
    }

    #[test]
    fn test_empty_required_value() {
        let diagnostics = validate(r#"<Project><Import Project="" /></Project>"#);
        assert_eq!(codes_of(&diagnostics), [codes::EMPTY_VALUE]);
    }

    #[test]
    fn test_invalid_bool() {
        let diagnostics = validate(
            r#"<Project><Target Name="T"><Message Text="x" ContinueOnError="maybe" /></Target><PropertyGroup><Enabled>true</Enabled></PropertyGroup></Project>"#,
        );
        assert!(codes_of(&diagnostics).contains(&codes::UNKNOWN_VALUE));
    }

    #[test]
    fn test_invalid_guid() {
        let diagnostics = validate(
            "<Project><PropertyGroup><ProjectGuid>{not-a-guid}</ProjectGuid><OtherGuid>{6F2A3C5E-8A8B-4E1D-9F6C-2B3A4D5E6F70}</OtherGuid></PropertyGroup></Project>",
        );
        assert_eq!(codes_of(&diagnostics), [codes::INVALID_VALUE]);
    }

    #[test]
    fn test_invalid_url() {
        let diagnostics = validate(
            "<Project><PropertyGroup><PackageProjectUrl>http://exa mple</PackageProjectUrl><RepositoryUrl>https://example.com/repo.git</RepositoryUrl></PropertyGroup></Project>",
        );
        assert_eq!(codes_of(&diagnostics), [codes::INVALID_VALUE]);
        assert_eq!(&*diagnostics[0].message, "Invalid url value 'http://exa mple'");
    }

    #[test]
    fn test_expression_syntax_error() {
        let diagnostics = validate("<Project><PropertyGroup><A>$(B</A></PropertyGroup></Project>");
        assert_eq!(codes_of(&diagnostics), [codes::EXPRESSION_SYNTAX]);
        assert_eq!(&*diagnostics[0].message, "Expecting ')' or '.'");
    }

    #[test]
    fn test_duplicate_otherwise() {
        let diagnostics = validate(
            r#"<Project><Choose><When Condition="true" /><Otherwise /><Otherwise /></Choose></Project>"#,
        );
        assert_eq!(codes_of(&diagnostics), [codes::DUPLICATE_ELEMENT]);
    }

    #[test]
    fn test_include_and_remove_conflict() {
        let diagnostics = validate(r#"<Project><ItemGroup><A Include="x" Remove="y" /></ItemGroup></Project>"#);
        assert_eq!(codes_of(&diagnostics), [codes::DUPLICATE_ELEMENT]);
    }

    #[test]
    fn test_unknown_function() {
        let diagnostics = validate(
            "<Project><PropertyGroup><A>$(B.Trim())</A><C>$(B.Frobnicate())</C><D>$([System.Nope]::X())</D></PropertyGroup></Project>",
        );
        assert_eq!(codes_of(&diagnostics), [codes::UNKNOWN_FUNCTION, codes::UNKNOWN_FUNCTION]);
    }

    #[test]
    fn test_undefined_task() {
        let doc = XDocument::parse(r#"<Project><Target Name="T"><Custom /></Target></Project>"#);
        let mut ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        let mut task = TaskInfo::new("Custom");
        task.is_inferred = true;
        ctx.tasks.insert(SymbolName::new("Custom"), task);
        let diagnostics = validate_document(&doc, &ctx, &StaticFunctionTypeProvider);
        assert_eq!(codes_of(&diagnostics), [codes::UNDEFINED_TASK]);
    }
}
