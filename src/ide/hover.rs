//! Hover information for the symbol, attribute or element under the caret.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{SymbolTableExt, TextRange, TextSize};
use crate::hir::{Reference, ResolutionContext, resolve};
use crate::schema::{FunctionTypeProvider, SymbolInfo, SymbolKind, ValueKind, schema};
use crate::syntax::XDocument;

/// What the caret is over.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverResult {
    pub range: TextRange,
    /// Symbol kind, or `None` for elements and attributes.
    pub kind: Option<SymbolKind>,
    pub name: SmolStr,
    pub value_kind: Option<ValueKind>,
    pub description: Option<SmolStr>,
    /// Files of the import closure that declare the symbol.
    pub seen_in: Vec<Arc<Path>>,
}

impl HoverResult {
    /// Markdown rendering for editors.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let label = self.kind.map_or("element", |k| k.display());
        let _ = write!(out, "**{}** `{}`", label, self.name);
        if let Some(kind) = self.value_kind.filter(|k| !k.is_unknown()) {
            let _ = write!(out, ": `{kind}`");
        }
        if let Some(description) = &self.description {
            let _ = write!(out, "\n\n{description}");
        }
        if !self.seen_in.is_empty() {
            out.push_str("\n\nSeen in:");
            for file in &self.seen_in {
                let _ = write!(out, "\n- {}", file.display());
            }
        }
        out
    }
}

/// Hover for the caret at `offset`.
pub fn hover(
    doc: &XDocument,
    offset: TextSize,
    ctx: &ResolutionContext,
    functions: &dyn FunctionTypeProvider,
) -> Option<HoverResult> {
    let result = resolve(offset, doc, ctx)?;
    if let Some(reference) = &result.reference {
        return Some(symbol_hover(reference, ctx, functions));
    }

    let spine = doc.spine_at(offset);
    let element = spine.leaf()?;
    if let Some(attr) = spine.attribute.filter(|a| a.name_range.contains_inclusive(offset)) {
        let element_schema = schema(result.element);
        let known = element_schema.attribute(&attr.name)?;
        return Some(HoverResult {
            range: attr.name_range,
            kind: None,
            name: attr.name.clone(),
            value_kind: Some(known.kind),
            description: Some(SmolStr::new(known.description)),
            seen_in: Vec::new(),
        });
    }
    if element.name_range.contains_inclusive(offset) {
        let element_schema = schema(result.element);
        return Some(HoverResult {
            range: element.name_range,
            kind: None,
            name: element.name.clone(),
            value_kind: None,
            description: Some(SmolStr::new(element_schema.description)),
            seen_in: Vec::new(),
        });
    }
    None
}

fn symbol_hover(reference: &Reference, ctx: &ResolutionContext, functions: &dyn FunctionTypeProvider) -> HoverResult {
    let name = reference.name.as_str();
    let owner = reference.owner.as_deref();
    let info: Option<(ValueKind, Option<&str>)> = match reference.kind {
        SymbolKind::Property => ctx.get_property(name).map(describe),
        SymbolKind::Item => ctx.get_item(name).map(describe),
        SymbolKind::Metadata => ctx.get_metadata(owner, name).map(describe),
        SymbolKind::Target => ctx.get_target(name).map(describe),
        SymbolKind::Task => ctx.get_task(name).map(describe),
        SymbolKind::TaskParameter => owner
            .and_then(|task| ctx.get_task(task))
            .and_then(|task| task.parameters.get_named(name))
            .map(|p| (p.kind, p.description.as_deref())),
        SymbolKind::Function => {
            let function = match owner {
                Some(class) => functions.find_static_function(class, name),
                None => functions
                    .find_property_function(name)
                    .or_else(|| functions.find_item_function(name)),
            };
            function.map(|f| (f.return_kind, f.description.as_deref()))
        }
        SymbolKind::Class => functions
            .find_class(name)
            .map(|c| (ValueKind::UNKNOWN, c.description.as_deref())),
        SymbolKind::Constant => None,
    };
    let seen_in = match reference.kind {
        SymbolKind::Property | SymbolKind::Item | SymbolKind::Metadata | SymbolKind::Target | SymbolKind::Task => {
            ctx.declaring_files(reference.kind, name)
        }
        _ => Vec::new(),
    };
    HoverResult {
        range: reference.range,
        kind: Some(reference.kind),
        name: reference.name.clone(),
        value_kind: info.map(|(kind, _)| kind),
        description: info.and_then(|(_, d)| d).map(SmolStr::new),
        seen_in,
    }
}

fn describe<T: SymbolInfo>(info: &T) -> (ValueKind, Option<&str>) {
    (info.value_kind(), info.description())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyInfo, StaticFunctionTypeProvider};

    fn hover_at(text: &str, marker: &str, ctx: &ResolutionContext) -> Option<HoverResult> {
        let doc = XDocument::parse(text);
        let offset = TextSize::from(text.find(marker).expect("marker") as u32 + 1);
        hover(&doc, offset, ctx, &StaticFunctionTypeProvider)
    }

    #[test]
    fn test_property_hover_with_description() {
        let mut ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        ctx.properties.insert(
            "Foo".into(),
            PropertyInfo::new("Foo").with_description("The foo").with_kind(ValueKind::BOOL),
        );
        let text = "<Project><PropertyGroup><Bar>$(FOO)</Bar></PropertyGroup></Project>";
        let result = hover_at(text, "FOO", &ctx).expect("hover");
        assert_eq!(result.kind, Some(SymbolKind::Property));
        assert_eq!(result.description.as_deref(), Some("The foo"));
        assert_eq!(result.value_kind, Some(ValueKind::BOOL));
        assert_eq!(&*result.seen_in[0], Path::new("/a.proj"));
        assert!(result.to_markdown().contains("Seen in"));
    }

    #[test]
    fn test_element_hover() {
        let ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        let result = hover_at("<Project><ItemGroup /></Project>", "ItemGroup", &ctx).expect("hover");
        assert_eq!(result.kind, None);
        assert_eq!(result.name, "ItemGroup");
        assert!(result.description.is_some());
    }

    #[test]
    fn test_function_hover() {
        let ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        let text = "<Project><PropertyGroup><A>$(B.Trim())</A></PropertyGroup></Project>";
        let result = hover_at(text, "Trim", &ctx).expect("hover");
        assert_eq!(result.kind, Some(SymbolKind::Function));
        assert!(result.description.is_some());
    }
}
