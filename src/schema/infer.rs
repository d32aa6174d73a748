//! Best-effort value kind inference from property and metadata names.

use super::value_kind::{BaseKind, ValueKind};

const BOOL_PREFIXES: &[&str] = &["Enable", "Disable", "Require", "Use", "Allow"];

const SUFFIXES: &[(&str, BaseKind, bool)] = &[
    ("DependsOn", BaseKind::TargetName, true),
    ("Directories", BaseKind::Folder, true),
    ("Directory", BaseKind::Folder, false),
    ("FileName", BaseKind::Filename, false),
    ("Enabled", BaseKind::Bool, false),
    ("Required", BaseKind::Bool, false),
    ("Paths", BaseKind::FileOrFolder, true),
    ("Path", BaseKind::FileOrFolder, false),
    ("Files", BaseKind::File, true),
    ("File", BaseKind::File, false),
    ("Guid", BaseKind::Guid, false),
    ("Dir", BaseKind::Folder, false),
    ("Url", BaseKind::Url, false),
    ("Ext", BaseKind::Extension, false),
];

/// Infer a kind for `name` from naming conventions.
///
/// Returns `declared` unchanged when it is already known.
pub fn infer_kind_from_name(name: &str, declared: ValueKind) -> ValueKind {
    if !declared.is_unknown() {
        return declared;
    }
    for prefix in BOOL_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_case(name, prefix) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                return ValueKind::BOOL;
            }
        }
    }
    for &(suffix, base, list) in SUFFIXES {
        if name.len() > suffix.len() && ends_with_ignore_case(name, suffix) {
            let kind = ValueKind::new(base);
            return if list { kind.list() } else { kind };
        }
    }
    declared
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &name[prefix.len()..])
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(name: &str) -> ValueKind {
        infer_kind_from_name(name, ValueKind::UNKNOWN)
    }

    #[test]
    fn test_bool_prefixes_need_word_boundary() {
        assert_eq!(infer("EnableDefaultItems"), ValueKind::BOOL);
        assert_eq!(infer("UseWpf"), ValueKind::BOOL);
        assert_eq!(infer("Username"), ValueKind::UNKNOWN);
        assert_eq!(infer("Allowance"), ValueKind::UNKNOWN);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(infer("OutputPath").base(), BaseKind::FileOrFolder);
        assert_eq!(infer("IntermediateOutputDir").base(), BaseKind::Folder);
        assert_eq!(infer("ProjectGuid").base(), BaseKind::Guid);
        assert_eq!(infer("AssemblyFileName").base(), BaseKind::Filename);
        assert_eq!(infer("SignAssemblyRequired"), ValueKind::BOOL);
        let depends = infer("BuildDependsOn");
        assert_eq!(depends.base(), BaseKind::TargetName);
        assert!(depends.is_list());
    }

    #[test]
    fn test_declared_kind_is_never_overridden() {
        let declared = ValueKind::new(BaseKind::String);
        assert_eq!(infer_kind_from_name("EnableFoo", declared), declared);
    }

    #[test]
    fn test_bare_suffix_is_not_inferred() {
        assert_eq!(infer("Path"), ValueKind::UNKNOWN);
    }
}
