//! Document links — clickable import and SDK references.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use crate::base::LineIndex;
use crate::hir::{AnnotationKind, ResolutionContext};

/// A document link target.
#[derive(Debug, Clone)]
pub struct DocumentLink {
    /// The span of the link in the source file.
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// The file the link opens.
    pub target_file: Arc<Path>,
    /// Tooltip text for the link.
    pub tooltip: Cow<'static, str>,
}

/// Get document links for a top-level file.
///
/// Returns one link per resolved file of each `Import` value and each SDK
/// reference.
pub fn document_links(ctx: &ResolutionContext, line_index: &LineIndex) -> Vec<DocumentLink> {
    let mut links = Vec::new();
    for annotation in &ctx.annotations {
        let (start, end) = line_index.line_cols(annotation.range);
        for target in &annotation.targets {
            let tooltip = match annotation.kind {
                AnnotationKind::Import => Cow::Owned(format!("Import {}", target.display())),
                AnnotationKind::Sdk => Cow::Borrowed("Open SDK directory"),
            };
            links.push(DocumentLink {
                start_line: start.line,
                start_col: start.col,
                end_line: end.line,
                end_col: end.col,
                target_file: target.clone(),
                tooltip,
            });
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{TextRange, TextSize};
    use crate::hir::NavigationAnnotation;

    #[test]
    fn test_links_per_target() {
        let text = "<Project>\n  <Import Project=\"*.props\" />\n</Project>";
        let mut ctx = ResolutionContext::new(Arc::from(Path::new("/p.proj")), true);
        let start = text.find("*.props").unwrap() as u32;
        ctx.annotations.push(NavigationAnnotation {
            range: TextRange::new(TextSize::from(start), TextSize::from(start + 7)),
            kind: AnnotationKind::Import,
            targets: vec![Arc::from(Path::new("/a.props")), Arc::from(Path::new("/b.props"))],
        });

        let links = document_links(&ctx, &LineIndex::new(text));
        assert_eq!(links.len(), 2);
        assert_eq!((links[0].start_line, links[0].start_col), (1, 19));
        assert_eq!(&*links[1].target_file, Path::new("/b.props"));
    }
}
