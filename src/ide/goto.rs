//! Go-to-definition: symbol declarations and import targets.

use std::path::Path;
use std::sync::Arc;

use crate::base::{SymbolTableExt, TextRange, TextSize};
use crate::hir::{ResolutionContext, resolve};
use crate::schema::{SymbolKind, SymbolLocation};
use crate::syntax::XDocument;

/// A definition site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoTarget {
    pub file: Arc<Path>,
    /// Declaration span, or `None` to open the file itself.
    pub range: Option<TextRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoResult {
    /// The span the request was made on.
    pub origin: TextRange,
    pub targets: Vec<GotoTarget>,
}

/// Definitions of whatever is at `offset`.
///
/// Import and SDK values navigate to the files they resolved to. Symbols
/// navigate to every declaration recorded in the import closure.
pub fn goto_definition(doc: &XDocument, offset: TextSize, ctx: &ResolutionContext) -> Option<GotoResult> {
    if let Some(annotation) = ctx
        .annotations
        .iter()
        .find(|a| a.range.contains_inclusive(offset))
    {
        let targets = annotation
            .targets
            .iter()
            .map(|file| GotoTarget {
                file: file.clone(),
                range: None,
            })
            .collect();
        return Some(GotoResult {
            origin: annotation.range,
            targets,
        });
    }

    let reference = resolve(offset, doc, ctx)?.reference?;
    let name = reference.name.as_str();
    let owner = reference.owner.as_deref();
    let mut targets: Vec<GotoTarget> = Vec::new();
    for c in ctx.contexts() {
        let location: Option<&SymbolLocation> = match reference.kind {
            SymbolKind::Property => c.properties.get_named(name).and_then(|p| p.location.as_ref()),
            SymbolKind::Item => c.items.get_named(name).and_then(|i| i.location.as_ref()),
            SymbolKind::Target => c.targets.get_named(name).and_then(|t| t.location.as_ref()),
            SymbolKind::Task => c.tasks.get_named(name).and_then(|t| t.location.as_ref()),
            SymbolKind::Metadata => match owner {
                Some(item) => c
                    .items
                    .get_named(item)
                    .and_then(|i| i.metadata.get_named(name))
                    .and_then(|m| m.location.as_ref()),
                None => c
                    .items
                    .values()
                    .find_map(|i| i.metadata.get_named(name).and_then(|m| m.location.as_ref())),
            },
            _ => None,
        };
        if let Some(location) = location {
            let target = GotoTarget {
                file: location.file.clone(),
                range: Some(location.range),
            };
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    (!targets.is_empty()).then_some(GotoResult {
        origin: reference.range,
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{AnnotationKind, NavigationAnnotation};
    use crate::schema::TargetInfo;

    #[test]
    fn test_goto_target_declaration() {
        let text = r#"<Project><Target Name="Build" /><Target Name="Pack" DependsOnTargets="Build" /></Project>"#;
        let doc = XDocument::parse(text);
        let file: Arc<Path> = Arc::from(Path::new("/a.proj"));
        let decl = TextRange::new(TextSize::from(23), TextSize::from(28));
        let mut ctx = ResolutionContext::new(file.clone(), true);
        let mut info = TargetInfo::new("Build");
        info.location = Some(SymbolLocation {
            file: file.clone(),
            range: decl,
        });
        ctx.targets.insert("Build".into(), info);

        let offset = TextSize::from(text.rfind("Build").unwrap() as u32 + 1);
        let result = goto_definition(&doc, offset, &ctx).expect("definition");
        assert_eq!(result.targets, [GotoTarget { file, range: Some(decl) }]);
    }

    #[test]
    fn test_goto_import_annotation() {
        let text = r#"<Project><Import Project="a.props" /></Project>"#;
        let doc = XDocument::parse(text);
        let mut ctx = ResolutionContext::new(Arc::from(Path::new("/p.proj")), true);
        let start = text.find("a.props").unwrap() as u32;
        let range = TextRange::new(TextSize::from(start), TextSize::from(start + 7));
        ctx.annotations.push(NavigationAnnotation {
            range,
            kind: AnnotationKind::Import,
            targets: vec![Arc::from(Path::new("/a.props"))],
        });
        let result = goto_definition(&doc, TextSize::from(start + 2), &ctx).expect("definition");
        assert_eq!(result.origin, range);
        assert_eq!(&*result.targets[0].file, Path::new("/a.props"));
        assert!(result.targets[0].range.is_none());
    }
}
