//! Import path evaluation against the file system.
//!
//! An `Import Project` value is evaluated by substituting file-relative
//! reserved properties and, for other properties, every literal value the
//! build has collected for them. Each permutation is resolved relative to
//! the importing file (or the SDK directory) and wildcards are expanded.
//! Only existing files are returned.

use std::path::{Component, Path, PathBuf};

use glob::MatchOptions;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::hir::{ImportRequest, ImportResolver, PropertyValueCollector};
use crate::syntax::{Expr, ExprKind};

/// Resolves imports to existing files on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystemImportResolver;

impl ImportResolver for FileSystemImportResolver {
    fn resolve_import(&self, request: &ImportRequest<'_>, properties: &PropertyValueCollector) -> Vec<PathBuf> {
        let base_dir = request
            .sdk_dir
            .map(Path::to_path_buf)
            .or_else(|| request.importing_file.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for value in request.expr.values() {
            for text in evaluate(value, request, properties) {
                for part in text.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                    let normalized = part.replace('\\', "/");
                    let path = if Path::new(&normalized).is_absolute() {
                        PathBuf::from(normalized)
                    } else {
                        base_dir.join(normalized)
                    };
                    let path = normalize(&path);
                    let found = if has_wildcard(&path) {
                        expand_wildcards(&path)
                    } else if path.is_file() {
                        vec![path]
                    } else {
                        trace!("import candidate {} does not exist", path.display());
                        Vec::new()
                    };
                    for file in found {
                        if seen.insert(file.clone()) {
                            out.push(file);
                        }
                    }
                }
            }
        }
        debug!("import '{}' resolved to {} file(s)", request.text, out.len());
        out
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Every string one list value can evaluate to, at most `max_permutations`.
fn evaluate(value: &Expr, request: &ImportRequest<'_>, properties: &PropertyValueCollector) -> Vec<String> {
    let limit = request.max_permutations.max(1);
    let segments: Vec<&Expr> = match &value.kind {
        ExprKind::Concat(nodes) => nodes.iter().collect(),
        _ => vec![value],
    };

    let mut results = vec![String::new()];
    for segment in segments {
        let choices: Vec<String> = match &segment.kind {
            ExprKind::Text { value, .. } => vec![value.to_string()],
            ExprKind::Property(inner) => match &inner.kind {
                ExprKind::Name(name) => property_values(name, request, properties),
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };
        let mut next = Vec::with_capacity(results.len() * choices.len());
        'outer: for prefix in &results {
            for choice in &choices {
                if next.len() >= limit {
                    break 'outer;
                }
                next.push(format!("{prefix}{choice}"));
            }
        }
        results = next;
    }
    results
}

/// Values a property may take while evaluating an import path.
fn property_values(name: &str, request: &ImportRequest<'_>, properties: &PropertyValueCollector) -> Vec<String> {
    if let Some(value) = reserved_value(name, request) {
        return vec![value];
    }
    let values = properties.values(name);
    if values.is_empty() {
        vec![String::new()]
    } else {
        values.iter().map(|v| v.to_string()).collect()
    }
}

fn reserved_value(name: &str, request: &ImportRequest<'_>) -> Option<String> {
    let this = request.importing_file;
    let project = request.project_file;
    let dir_with_slash = |p: &Path| {
        let mut dir = p.parent().map(|d| d.to_string_lossy().into_owned()).unwrap_or_default();
        if !dir.ends_with('/') && !dir.ends_with('\\') {
            dir.push('/');
        }
        dir
    };
    let file_name = |p: &Path| p.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
    let stem = |p: &Path| p.file_stem().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = |p: &Path| {
        p.extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    };

    let value = match name.to_ascii_lowercase().as_str() {
        "msbuildthisfiledirectory" => dir_with_slash(this),
        "msbuildthisfile" => file_name(this),
        "msbuildthisfilename" => stem(this),
        "msbuildthisfileextension" => extension(this),
        "msbuildthisfilefullpath" => this.to_string_lossy().into_owned(),
        "msbuildprojectdirectory" => project.parent().map(|d| d.to_string_lossy().into_owned()).unwrap_or_default(),
        "msbuildprojectfile" => file_name(project),
        "msbuildprojectname" => stem(project),
        "msbuildprojectextension" => extension(project),
        "msbuildprojectfullpath" => project.to_string_lossy().into_owned(),
        _ => return None,
    };
    Some(value)
}

// ============================================================================
// PATHS AND WILDCARDS
// ============================================================================

/// Remove `.` and resolve `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn has_wildcard(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?'])
}

/// Existing files matching a path with `*`, `?` and `**` segments, sorted.
///
/// Matching is case-insensitive. The literal directory prefix is escaped so
/// bracket characters in it are not read as patterns.
fn expand_wildcards(path: &Path) -> Vec<PathBuf> {
    let components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let Some(split) = components.iter().position(|c| c.contains(['*', '?'])) else {
        return Vec::new();
    };
    let root: PathBuf = components[..split].iter().collect();
    let mut pattern = glob::Pattern::escape(&root.to_string_lossy());
    if !pattern.is_empty() && !pattern.ends_with('/') {
        pattern.push('/');
    }
    pattern.push_str(&components[split..].join("/"));

    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        ..Default::default()
    };
    let entries = match glob::glob_with(&pattern, options) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("invalid import wildcard '{pattern}': {err}");
            return Vec::new();
        }
    };
    let mut out: Vec<PathBuf> = entries.filter_map(Result::ok).filter(|p| p.is_file()).collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ExpressionOptions, parse_expression};
    use crate::base::TextSize;
    use std::fs;

    fn resolve(importing: &Path, value: &str, collector: &PropertyValueCollector) -> Vec<PathBuf> {
        let expr = parse_expression(value, ExpressionOptions::LISTS, TextSize::from(0));
        let request = ImportRequest {
            importing_file: importing,
            project_file: importing,
            expr: &expr,
            text: value,
            sdk_dir: None,
            max_permutations: 16,
        };
        FileSystemImportResolver.resolve_import(&request, collector)
    }

    #[test]
    fn test_wildcard_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/Common.PROPS"), "<Project />").unwrap();
        fs::write(dir.path().join("build/other.targets"), "<Project />").unwrap();
        let project = dir.path().join("a.proj");

        let found = resolve(&project, "build/*.props", &PropertyValueCollector::new());
        assert_eq!(found, [dir.path().join("build/Common.PROPS")]);
        let found = resolve(&project, "build/c?mmon.*", &PropertyValueCollector::new());
        assert_eq!(found, [dir.path().join("build/Common.PROPS")]);
    }

    #[test]
    fn test_relative_and_this_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.props"), "<Project />").unwrap();
        let project = dir.path().join("a.proj");
        let collector = PropertyValueCollector::new();

        assert_eq!(resolve(&project, "common.props", &collector), [dir.path().join("common.props")]);
        assert_eq!(
            resolve(&project, "$(MSBuildThisFileDirectory)common.props", &collector),
            [dir.path().join("common.props")]
        );
        assert!(resolve(&project, "missing.props", &collector).is_empty());
    }

    #[test]
    fn test_permutes_collected_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Debug.props"), "<Project />").unwrap();
        fs::write(dir.path().join("Release.props"), "<Project />").unwrap();
        let project = dir.path().join("a.proj");
        let mut collector = PropertyValueCollector::new();
        collector.add("Configuration", "Debug");
        collector.add("Configuration", "Release");
        collector.add("Configuration", "Missing");

        let found = resolve(&project, "$(Configuration).props", &collector);
        assert_eq!(found, [dir.path().join("Debug.props"), dir.path().join("Release.props")]);
    }

    #[test]
    fn test_recursive_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/a.targets"), "<Project />").unwrap();
        fs::write(dir.path().join("x/y/b.targets"), "<Project />").unwrap();
        fs::write(dir.path().join("x/y/c.props"), "<Project />").unwrap();
        let project = dir.path().join("a.proj");

        let found = resolve(&project, "x/**/*.targets", &PropertyValueCollector::new());
        assert_eq!(found, [dir.path().join("x/a.targets"), dir.path().join("x/y/b.targets")]);
    }

    #[test]
    fn test_parent_directory_and_backslashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("shared.props"), "<Project />").unwrap();
        let project = dir.path().join("src").join("a.proj");

        let found = resolve(&project, r"..\shared.props", &PropertyValueCollector::new());
        assert_eq!(found, [dir.path().join("shared.props")]);
    }
}
