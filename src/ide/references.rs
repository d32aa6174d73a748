//! Find-references across a set of documents.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::base::{TextRange, TextSize};
use crate::hir::{ReferenceCollector, ResolutionContext, resolve};
use crate::syntax::XDocument;

/// One occurrence of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLocation {
    pub file: Arc<Path>,
    pub range: TextRange,
    pub is_declaration: bool,
}

/// Every occurrence, across `documents`, of the symbol at `offset` in `doc`.
///
/// Documents are searched in parallel; results keep the order of
/// `documents`, then document order within each.
pub fn find_references(
    doc: &XDocument,
    offset: TextSize,
    ctx: &ResolutionContext,
    documents: &[(Arc<Path>, XDocument)],
    include_declaration: bool,
) -> Vec<ReferenceLocation> {
    let Some(collector) = resolve(offset, doc, ctx).and_then(|r| ReferenceCollector::for_result(&r)) else {
        return Vec::new();
    };
    documents
        .par_iter()
        .map(|(file, document)| {
            collector
                .clone()
                .collect(document)
                .into_iter()
                .filter(|span| include_declaration || !span.is_declaration)
                .map(|span| ReferenceLocation {
                    file: file.clone(),
                    range: span.range,
                    is_declaration: span.is_declaration,
                })
                .collect::<Vec<_>>()
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_across_documents() {
        let a = r#"<Project><PropertyGroup><Foo>1</Foo></PropertyGroup></Project>"#;
        let b = r#"<Project><Target Name="T" Condition="'$(foo)' == '1'" /></Project>"#;
        let documents = vec![
            (Arc::from(Path::new("/a.props")), XDocument::parse(a)),
            (Arc::from(Path::new("/b.targets")), XDocument::parse(b)),
        ];
        let ctx = ResolutionContext::new(Arc::from(Path::new("/a.props")), true);
        let offset = TextSize::from(a.find("Foo").unwrap() as u32 + 1);

        let all = find_references(&documents[0].1, offset, &ctx, &documents, true);
        assert_eq!(all.len(), 2);
        assert!(all[0].is_declaration);
        assert_eq!(&*all[1].file, Path::new("/b.targets"));

        let uses = find_references(&documents[0].1, offset, &ctx, &documents, false);
        assert_eq!(uses.len(), 1);
    }

    #[test]
    fn test_nothing_at_offset() {
        let doc = XDocument::parse("<Project />");
        let ctx = ResolutionContext::new(Arc::from(Path::new("/a.proj")), true);
        assert!(find_references(&doc, TextSize::from(1), &ctx, &[], true).is_empty());
    }
}
