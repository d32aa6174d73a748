//! Value kinds: a base kind plus orthogonal list/literal modifiers.

use std::fmt;
use std::str::FromStr;

use crate::syntax::ExpressionOptions;

/// The base kind of a value, with modifiers stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BaseKind {
    #[default]
    Unknown,
    Bool,
    Int,
    Float,
    String,
    Guid,
    ProjectKindGuid,
    Url,
    Version,
    VersionSuffixed,
    DateTime,
    Char,
    Object,
    Lcid,
    Culture,

    // Name references
    PropertyName,
    ItemName,
    MetadataName,
    TargetName,
    TaskName,
    TaskParameterName,
    TaskOutputParameterName,

    // Paths
    File,
    Folder,
    FolderWithSlash,
    FileOrFolder,
    Extension,
    Filename,
    ProjectFile,
    TaskAssemblyName,
    TaskAssemblyFile,
    TaskFactory,

    // SDKs and frameworks
    Sdk,
    SdkVersion,
    SdkWithVersion,
    TargetFramework,
    TargetFrameworkIdentifier,
    TargetFrameworkVersion,
    TargetFrameworkProfile,
    NuGetId,
    NuGetVersion,

    // Closed sets
    Condition,
    ContinueOnError,
    Importance,
    Configuration,
    Platform,
    TaskArchitecture,
    TaskRuntime,
    ToolsVersion,
    HostOS,
    Encoding,
}

impl BaseKind {
    /// Stable lowercase name, used in explicit schema files.
    pub fn as_str(self) -> &'static str {
        match self {
            BaseKind::Unknown => "unknown",
            BaseKind::Bool => "bool",
            BaseKind::Int => "int",
            BaseKind::Float => "float",
            BaseKind::String => "string",
            BaseKind::Guid => "guid",
            BaseKind::ProjectKindGuid => "project-kind-guid",
            BaseKind::Url => "url",
            BaseKind::Version => "version",
            BaseKind::VersionSuffixed => "version-suffixed",
            BaseKind::DateTime => "datetime",
            BaseKind::Char => "char",
            BaseKind::Object => "object",
            BaseKind::Lcid => "lcid",
            BaseKind::Culture => "culture",
            BaseKind::PropertyName => "property-name",
            BaseKind::ItemName => "item-name",
            BaseKind::MetadataName => "metadata-name",
            BaseKind::TargetName => "target-name",
            BaseKind::TaskName => "task-name",
            BaseKind::TaskParameterName => "task-parameter-name",
            BaseKind::TaskOutputParameterName => "task-output-parameter-name",
            BaseKind::File => "file",
            BaseKind::Folder => "folder",
            BaseKind::FolderWithSlash => "folder-with-slash",
            BaseKind::FileOrFolder => "file-or-folder",
            BaseKind::Extension => "extension",
            BaseKind::Filename => "filename",
            BaseKind::ProjectFile => "project-file",
            BaseKind::TaskAssemblyName => "task-assembly-name",
            BaseKind::TaskAssemblyFile => "task-assembly-file",
            BaseKind::TaskFactory => "task-factory",
            BaseKind::Sdk => "sdk",
            BaseKind::SdkVersion => "sdk-version",
            BaseKind::SdkWithVersion => "sdk-with-version",
            BaseKind::TargetFramework => "target-framework",
            BaseKind::TargetFrameworkIdentifier => "target-framework-identifier",
            BaseKind::TargetFrameworkVersion => "target-framework-version",
            BaseKind::TargetFrameworkProfile => "target-framework-profile",
            BaseKind::NuGetId => "nuget-id",
            BaseKind::NuGetVersion => "nuget-version",
            BaseKind::Condition => "condition",
            BaseKind::ContinueOnError => "continue-on-error",
            BaseKind::Importance => "importance",
            BaseKind::Configuration => "configuration",
            BaseKind::Platform => "platform",
            BaseKind::TaskArchitecture => "task-architecture",
            BaseKind::TaskRuntime => "task-runtime",
            BaseKind::ToolsVersion => "tools-version",
            BaseKind::HostOS => "host-os",
            BaseKind::Encoding => "encoding",
        }
    }

    const ALL: &'static [BaseKind] = &[
        BaseKind::Unknown,
        BaseKind::Bool,
        BaseKind::Int,
        BaseKind::Float,
        BaseKind::String,
        BaseKind::Guid,
        BaseKind::ProjectKindGuid,
        BaseKind::Url,
        BaseKind::Version,
        BaseKind::VersionSuffixed,
        BaseKind::DateTime,
        BaseKind::Char,
        BaseKind::Object,
        BaseKind::Lcid,
        BaseKind::Culture,
        BaseKind::PropertyName,
        BaseKind::ItemName,
        BaseKind::MetadataName,
        BaseKind::TargetName,
        BaseKind::TaskName,
        BaseKind::TaskParameterName,
        BaseKind::TaskOutputParameterName,
        BaseKind::File,
        BaseKind::Folder,
        BaseKind::FolderWithSlash,
        BaseKind::FileOrFolder,
        BaseKind::Extension,
        BaseKind::Filename,
        BaseKind::ProjectFile,
        BaseKind::TaskAssemblyName,
        BaseKind::TaskAssemblyFile,
        BaseKind::TaskFactory,
        BaseKind::Sdk,
        BaseKind::SdkVersion,
        BaseKind::SdkWithVersion,
        BaseKind::TargetFramework,
        BaseKind::TargetFrameworkIdentifier,
        BaseKind::TargetFrameworkVersion,
        BaseKind::TargetFrameworkProfile,
        BaseKind::NuGetId,
        BaseKind::NuGetVersion,
        BaseKind::Condition,
        BaseKind::ContinueOnError,
        BaseKind::Importance,
        BaseKind::Configuration,
        BaseKind::Platform,
        BaseKind::TaskArchitecture,
        BaseKind::TaskRuntime,
        BaseKind::ToolsVersion,
        BaseKind::HostOS,
        BaseKind::Encoding,
    ];

    /// Look up a base kind by its [`as_str`](Self::as_str) name, ignoring case.
    pub fn from_name(name: &str) -> Option<BaseKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }

    /// Kinds whose values are file system paths.
    pub fn is_path(self) -> bool {
        matches!(
            self,
            BaseKind::File
                | BaseKind::Folder
                | BaseKind::FolderWithSlash
                | BaseKind::FileOrFolder
                | BaseKind::ProjectFile
                | BaseKind::TaskAssemblyFile
        )
    }
}

const LIST: u8 = 1;
const COMMA_LIST: u8 = 1 << 1;
const LITERAL: u8 = 1 << 2;

/// A [`BaseKind`] with list and literal modifiers.
///
/// Modifiers are independent of the base kind; match on [`ValueKind::base`],
/// never on the whole value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueKind {
    base: BaseKind,
    modifiers: u8,
}

impl ValueKind {
    pub const UNKNOWN: ValueKind = ValueKind::new(BaseKind::Unknown);
    pub const STRING: ValueKind = ValueKind::new(BaseKind::String);
    pub const BOOL: ValueKind = ValueKind::new(BaseKind::Bool);

    pub const fn new(base: BaseKind) -> Self {
        Self { base, modifiers: 0 }
    }

    /// Allow a `;`-separated list of this kind.
    pub const fn list(self) -> Self {
        Self {
            base: self.base,
            modifiers: self.modifiers | LIST,
        }
    }

    /// Allow a `,`-separated list of this kind.
    pub const fn comma_list(self) -> Self {
        Self {
            base: self.base,
            modifiers: self.modifiers | COMMA_LIST,
        }
    }

    /// Forbid expressions in values of this kind.
    pub const fn literal(self) -> Self {
        Self {
            base: self.base,
            modifiers: self.modifiers | LITERAL,
        }
    }

    #[inline]
    pub const fn base(self) -> BaseKind {
        self.base
    }

    pub const fn without_modifiers(self) -> Self {
        Self::new(self.base)
    }

    pub const fn is_list(self) -> bool {
        self.modifiers & LIST != 0
    }

    pub const fn is_comma_list(self) -> bool {
        self.modifiers & COMMA_LIST != 0
    }

    pub const fn is_literal(self) -> bool {
        self.modifiers & LITERAL != 0
    }

    pub const fn allows_lists(self) -> bool {
        self.modifiers & (LIST | COMMA_LIST) != 0
    }

    pub const fn allows_expressions(self) -> bool {
        !self.is_literal()
    }

    pub const fn is_unknown(self) -> bool {
        matches!(self.base, BaseKind::Unknown)
    }

    /// Expression options for a value of this kind in a given element context.
    pub fn expression_options(self, items: bool, metadata: bool) -> ExpressionOptions {
        let mut options = ExpressionOptions::NONE;
        if items {
            options = options | ExpressionOptions::ITEMS;
        }
        if metadata {
            options = options | ExpressionOptions::METADATA;
        }
        if self.is_list() {
            options = options | ExpressionOptions::LISTS;
        }
        if self.is_comma_list() {
            options = options | ExpressionOptions::COMMA_LISTS;
        }
        options
    }
}

impl From<BaseKind> for ValueKind {
    fn from(base: BaseKind) -> Self {
        ValueKind::new(base)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())?;
        if self.is_list() {
            f.write_str("-list")?;
        }
        if self.is_comma_list() {
            f.write_str("-comma-list")?;
        }
        if self.is_literal() {
            f.write_str("-literal")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueKind({self})")
    }
}

/// Error returned when a kind name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown value kind '{0}'")]
pub struct UnknownKindError(pub String);

impl FromStr for ValueKind {
    type Err = UnknownKindError;

    /// Parse `base[-list][-comma-list][-literal]`, e.g. `file-list`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        let mut modifiers = 0;
        loop {
            if let Some(stripped) = rest.strip_suffix("-literal") {
                modifiers |= LITERAL;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_suffix("-comma-list") {
                modifiers |= COMMA_LIST;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_suffix("-list") {
                modifiers |= LIST;
                rest = stripped;
            } else {
                break;
            }
        }
        let base = BaseKind::from_name(rest).ok_or_else(|| UnknownKindError(s.to_string()))?;
        Ok(ValueKind { base, modifiers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_are_orthogonal() {
        let kind = ValueKind::new(BaseKind::File).list().literal();
        assert_eq!(kind.base(), BaseKind::File);
        assert!(kind.is_list());
        assert!(kind.allows_lists());
        assert!(!kind.allows_expressions());
        assert_eq!(kind.without_modifiers(), ValueKind::new(BaseKind::File));
    }

    #[test]
    fn test_only_literal_forbids_expressions() {
        assert!(ValueKind::new(BaseKind::Bool).list().allows_expressions());
        assert!(!ValueKind::new(BaseKind::Bool).literal().allows_expressions());
    }

    #[test]
    fn test_parse_kind_names() {
        let kind: ValueKind = "file-list".parse().unwrap();
        assert_eq!(kind, ValueKind::new(BaseKind::File).list());
        let kind: ValueKind = "Target-Name-comma-list".parse().unwrap();
        assert_eq!(kind, ValueKind::new(BaseKind::TargetName).comma_list());
        assert!("nonsense".parse::<ValueKind>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        let kind = ValueKind::new(BaseKind::ProjectFile).list();
        assert_eq!(kind.to_string(), "project-file-list");
        assert_eq!(kind.to_string().parse::<ValueKind>().unwrap(), kind);
    }

    #[test]
    fn test_expression_options_follow_modifiers() {
        let options = ValueKind::new(BaseKind::File).list().expression_options(true, false);
        assert!(options.contains(ExpressionOptions::ITEMS));
        assert!(options.contains(ExpressionOptions::LISTS));
        assert!(!options.contains(ExpressionOptions::METADATA));
        assert!(!options.contains(ExpressionOptions::COMMA_LISTS));
    }
}
