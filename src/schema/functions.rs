//! Property, item, static and condition function metadata.
//!
//! The permitted class and function set is an explicit allow-list, so the
//! default provider is a static table rather than open discovery.

use once_cell::sync::Lazy;
use smol_str::SmolStr;

use super::symbols::{ClassInfo, FunctionInfo, FunctionParameter};
use super::value_kind::{BaseKind, ValueKind};
use crate::base::SymbolName;

/// Supplies function and class metadata by name.
pub trait FunctionTypeProvider: Send + Sync {
    /// Instance functions on property values, e.g. `$(Foo.Trim())`.
    fn property_functions(&self) -> &[FunctionInfo];

    /// Item functions, e.g. `@(Foo->Distinct())`.
    fn item_functions(&self) -> &[FunctionInfo];

    /// Classes usable in `$([Class]::Member)`.
    fn classes(&self) -> &[ClassInfo];

    /// Static members of a class; empty for unknown classes.
    fn static_functions(&self, class: &str) -> &[FunctionInfo];

    /// Functions usable in conditions, e.g. `Exists('path')`.
    fn condition_functions(&self) -> &[FunctionInfo];

    fn find_class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes().iter().find(|c| c.name.matches(name))
    }

    fn find_property_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.property_functions().iter().find(|f| f.name.matches(name))
    }

    fn find_item_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.item_functions().iter().find(|f| f.name.matches(name))
    }

    fn find_static_function(&self, class: &str, name: &str) -> Option<&FunctionInfo> {
        self.static_functions(class).iter().find(|f| f.name.matches(name))
    }
}

// ============================================================================
// STATIC TABLES
// ============================================================================

type Param = (&'static str, BaseKind);

fn function(name: &str, ret: BaseKind, params: &[Param], description: &str) -> FunctionInfo {
    FunctionInfo {
        name: SymbolName::new(name),
        description: Some(SmolStr::new(description)),
        return_kind: ValueKind::new(ret),
        parameters: params
            .iter()
            .map(|&(name, kind)| FunctionParameter {
                name: SmolStr::new(name),
                kind: ValueKind::new(kind),
            })
            .collect(),
        is_property: false,
    }
}

fn member(name: &str, ret: BaseKind, description: &str) -> FunctionInfo {
    FunctionInfo {
        is_property: true,
        ..function(name, ret, &[], description)
    }
}

use BaseKind::{Bool, Char, DateTime, File, Float, Folder, Int, Object, String as Str, Version};

static STRING_FUNCTIONS: Lazy<Vec<FunctionInfo>> = Lazy::new(|| {
    vec![
        member("Length", Int, "Number of characters"),
        function("Contains", Bool, &[("value", Str)], "Whether the value contains a substring"),
        function("StartsWith", Bool, &[("value", Str)], "Whether the value starts with a prefix"),
        function("EndsWith", Bool, &[("value", Str)], "Whether the value ends with a suffix"),
        function("IndexOf", Int, &[("value", Str)], "Index of the first occurrence of a substring"),
        function("LastIndexOf", Int, &[("value", Str)], "Index of the last occurrence of a substring"),
        function("Replace", Str, &[("oldValue", Str), ("newValue", Str)], "Replaces every occurrence of a substring"),
        function("Substring", Str, &[("startIndex", Int), ("length", Int)], "Extracts a substring"),
        function("ToLower", Str, &[], "Converts to lowercase"),
        function("ToLowerInvariant", Str, &[], "Converts to lowercase using the invariant culture"),
        function("ToUpper", Str, &[], "Converts to uppercase"),
        function("ToUpperInvariant", Str, &[], "Converts to uppercase using the invariant culture"),
        function("Trim", Str, &[], "Removes leading and trailing whitespace"),
        function("TrimStart", Str, &[("trimChars", Char)], "Removes leading characters"),
        function("TrimEnd", Str, &[("trimChars", Char)], "Removes trailing characters"),
        function("PadLeft", Str, &[("totalWidth", Int)], "Pads on the left"),
        function("PadRight", Str, &[("totalWidth", Int)], "Pads on the right"),
        function("Split", Str, &[("separator", Char)], "Splits into substrings"),
        function("Equals", Bool, &[("value", Str)], "Whether the values are equal"),
        function("CompareTo", Int, &[("value", Str)], "Compares two values"),
        function("Remove", Str, &[("startIndex", Int)], "Removes characters from an index"),
        function("Insert", Str, &[("startIndex", Int), ("value", Str)], "Inserts a substring"),
    ]
});

static ITEM_FUNCTIONS: Lazy<Vec<FunctionInfo>> = Lazy::new(|| {
    vec![
        function("Count", Int, &[], "Number of values"),
        function("Distinct", Str, &[], "Removes duplicate values"),
        function("DistinctWithCase", Str, &[], "Removes duplicate values, comparing case"),
        function("Reverse", Str, &[], "Reverses the order of values"),
        function("AnyHaveMetadataValue", Bool, &[("metadataName", Str), ("metadataValue", Str)], "Whether any value has the given metadata value"),
        function("ClearMetadata", Str, &[], "Removes all custom metadata"),
        function("HasMetadata", Str, &[("metadataName", Str)], "Values that have the metadata"),
        function("WithMetadataValue", Str, &[("metadataName", Str), ("metadataValue", Str)], "Values whose metadata has the value"),
        function("Metadata", Str, &[("metadataName", Str)], "Values of the metadata"),
        function("DirectoryName", Folder, &[], "Directory of each value"),
        function("Combine", File, &[("path", Str)], "Combines each value with a path"),
        function("Exists", File, &[], "Values that exist on disk"),
        function("GetPathsOfAllDirectoriesAbove", Folder, &[], "Every ancestor directory"),
    ]
});

static CONDITION_FUNCTIONS: Lazy<Vec<FunctionInfo>> = Lazy::new(|| {
    vec![
        function("Exists", Bool, &[("path", Str)], "Whether the file or folder exists"),
        function("HasTrailingSlash", Bool, &[("path", Str)], "Whether the value ends with a slash"),
    ]
});

struct StaticClass {
    info: ClassInfo,
    members: Vec<FunctionInfo>,
}

fn class(name: &str, description: &str, members: Vec<FunctionInfo>) -> StaticClass {
    StaticClass {
        info: ClassInfo {
            name: SymbolName::new(name),
            description: Some(SmolStr::new(description)),
        },
        members,
    }
}

static STATIC_CLASSES: Lazy<Vec<StaticClass>> = Lazy::new(|| {
    vec![
        class("MSBuild", "Build engine intrinsic functions", vec![
            function("Add", Float, &[("a", Float), ("b", Float)], "Adds two numbers"),
            function("Subtract", Float, &[("a", Float), ("b", Float)], "Subtracts two numbers"),
            function("Multiply", Float, &[("a", Float), ("b", Float)], "Multiplies two numbers"),
            function("Divide", Float, &[("a", Float), ("b", Float)], "Divides two numbers"),
            function("Modulo", Float, &[("a", Float), ("b", Float)], "Remainder of a division"),
            function("EnsureTrailingSlash", Folder, &[("path", Str)], "Adds a trailing slash if missing"),
            function("GetDirectoryNameOfFileAbove", Folder, &[("startingDirectory", Folder), ("fileName", Str)], "Finds a file in an ancestor directory"),
            function("GetPathOfFileAbove", File, &[("file", Str), ("startingDirectory", Folder)], "Full path of a file in an ancestor directory"),
            function("MakeRelative", Str, &[("basePath", Str), ("path", Str)], "Makes a path relative to another"),
            function("NormalizeDirectory", Folder, &[("path", Str)], "Normalizes a directory path"),
            function("NormalizePath", File, &[("path", Str)], "Normalizes a path"),
            function("ValueOrDefault", Str, &[("value", Str), ("defaultValue", Str)], "The value, or a default when empty"),
            function("VersionEquals", Bool, &[("a", Version), ("b", Version)], "Compares two versions"),
            function("VersionGreaterThan", Bool, &[("a", Version), ("b", Version)], "Compares two versions"),
            function("VersionLessThan", Bool, &[("a", Version), ("b", Version)], "Compares two versions"),
            function("GetTargetFrameworkIdentifier", Str, &[("targetFramework", Str)], "Framework identifier of a target framework"),
            function("GetTargetFrameworkVersion", Version, &[("targetFramework", Str)], "Framework version of a target framework"),
            function("IsOSPlatform", Bool, &[("platform", Str)], "Whether the host is the given platform"),
            function("IsOsUnixLike", Bool, &[], "Whether the host is Unix-like"),
            function("StableStringHash", Int, &[("value", Str)], "Stable hash of a string"),
            function("Escape", Str, &[("value", Str)], "Escapes special characters"),
            function("Unescape", Str, &[("value", Str)], "Unescapes special characters"),
        ]),
        class("System.IO.Path", "Path manipulation", vec![
            member("DirectorySeparatorChar", Char, "Platform directory separator"),
            function("Combine", File, &[("path1", Str), ("path2", Str)], "Combines paths"),
            function("GetDirectoryName", Folder, &[("path", File)], "Directory part of a path"),
            function("GetExtension", Str, &[("path", File)], "Extension of a path"),
            function("GetFileName", Str, &[("path", File)], "File name of a path"),
            function("GetFileNameWithoutExtension", Str, &[("path", File)], "File name without extension"),
            function("GetFullPath", File, &[("path", File)], "Absolute path"),
            function("GetTempPath", Folder, &[], "Temporary directory"),
            function("IsPathRooted", Bool, &[("path", File)], "Whether a path is absolute"),
        ]),
        class("System.IO.File", "File queries", vec![
            function("Exists", Bool, &[("path", File)], "Whether the file exists"),
            function("GetCreationTime", DateTime, &[("path", File)], "Creation time"),
            function("GetLastWriteTime", DateTime, &[("path", File)], "Last write time"),
            function("ReadAllText", Str, &[("path", File)], "Contents of the file"),
        ]),
        class("System.IO.Directory", "Directory queries", vec![
            function("Exists", Bool, &[("path", Folder)], "Whether the directory exists"),
            function("GetDirectories", Folder, &[("path", Folder)], "Subdirectories"),
            function("GetFiles", File, &[("path", Folder)], "Files in the directory"),
            function("GetParent", Folder, &[("path", Folder)], "Parent directory"),
        ]),
        class("System.String", "String utilities", vec![
            member("Empty", Str, "The empty string"),
            function("Concat", Str, &[("a", Str), ("b", Str)], "Concatenates values"),
            function("Copy", Str, &[("value", Str)], "Copies a value"),
            function("Format", Str, &[("format", Str), ("arg", Object)], "Formats a value"),
            function("IsNullOrEmpty", Bool, &[("value", Str)], "Whether the value is empty"),
            function("IsNullOrWhiteSpace", Bool, &[("value", Str)], "Whether the value is blank"),
            function("Join", Str, &[("separator", Str), ("values", Str)], "Joins values"),
        ]),
        class("System.Environment", "Process environment", vec![
            member("CommandLine", Str, "Command line of the process"),
            member("Is64BitOperatingSystem", Bool, "Whether the OS is 64-bit"),
            member("Is64BitProcess", Bool, "Whether the process is 64-bit"),
            member("MachineName", Str, "Name of the machine"),
            member("NewLine", Str, "Platform newline"),
            member("ProcessorCount", Int, "Number of processors"),
            member("UserName", Str, "Current user"),
            function("GetEnvironmentVariable", Str, &[("variable", Str)], "Value of an environment variable"),
            function("GetFolderPath", Folder, &[("folder", Str)], "Path of a special folder"),
        ]),
        class("System.Math", "Arithmetic", vec![
            function("Abs", Float, &[("value", Float)], "Absolute value"),
            function("Ceiling", Float, &[("value", Float)], "Smallest integer not less than the value"),
            function("Floor", Float, &[("value", Float)], "Largest integer not greater than the value"),
            function("Max", Float, &[("a", Float), ("b", Float)], "Larger of two values"),
            function("Min", Float, &[("a", Float), ("b", Float)], "Smaller of two values"),
        ]),
        class("System.Guid", "GUID utilities", vec![
            function("NewGuid", BaseKind::Guid, &[], "A new random GUID"),
        ]),
        class("System.DateTime", "Date and time", vec![
            member("Now", DateTime, "Current local time"),
            member("Today", DateTime, "Current date"),
            member("UtcNow", DateTime, "Current UTC time"),
        ]),
        class("System.Convert", "Value conversion", vec![
            function("ToBase64String", Str, &[("value", Object)], "Encodes bytes as base64"),
            function("ToInt32", Int, &[("value", Str)], "Parses an integer"),
        ]),
        class("System.Version", "Version parsing", vec![
            function("Parse", Version, &[("input", Str)], "Parses a version"),
        ]),
        class("System.Text.RegularExpressions.Regex", "Regular expressions", vec![
            function("IsMatch", Bool, &[("input", Str), ("pattern", Str)], "Whether the input matches"),
            function("Match", Str, &[("input", Str), ("pattern", Str)], "First match"),
            function("Replace", Str, &[("input", Str), ("pattern", Str), ("replacement", Str)], "Replaces matches"),
            function("Escape", Str, &[("input", Str)], "Escapes regex metacharacters"),
        ]),
        class("System.OperatingSystem", "Operating system checks", vec![
            function("IsWindows", Bool, &[], "Whether the host is Windows"),
            function("IsLinux", Bool, &[], "Whether the host is Linux"),
            function("IsMacOS", Bool, &[], "Whether the host is macOS"),
        ]),
        class("System.Runtime.InteropServices.RuntimeInformation", "Runtime information", vec![
            member("OSArchitecture", Str, "Architecture of the OS"),
            member("ProcessArchitecture", Str, "Architecture of the process"),
            member("OSDescription", Str, "Description of the OS"),
            member("FrameworkDescription", Str, "Description of the runtime"),
        ]),
    ]
});

static CLASS_INFOS: Lazy<Vec<ClassInfo>> =
    Lazy::new(|| STATIC_CLASSES.iter().map(|c| c.info.clone()).collect());

/// The default provider over the built-in allow-list.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticFunctionTypeProvider;

impl FunctionTypeProvider for StaticFunctionTypeProvider {
    fn property_functions(&self) -> &[FunctionInfo] {
        &STRING_FUNCTIONS
    }

    fn item_functions(&self) -> &[FunctionInfo] {
        &ITEM_FUNCTIONS
    }

    fn classes(&self) -> &[ClassInfo] {
        &CLASS_INFOS
    }

    fn static_functions(&self, class: &str) -> &[FunctionInfo] {
        STATIC_CLASSES
            .iter()
            .find(|c| c.info.name.matches(class))
            .map(|c| c.members.as_slice())
            .unwrap_or(&[])
    }

    fn condition_functions(&self) -> &[FunctionInfo] {
        &CONDITION_FUNCTIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookup_is_case_insensitive() {
        let provider = StaticFunctionTypeProvider;
        assert!(provider.find_class("system.io.path").is_some());
        let combine = provider.find_static_function("System.IO.Path", "combine").unwrap();
        assert_eq!(combine.parameters.len(), 2);
        assert_eq!(combine.return_kind.base(), BaseKind::File);
    }

    #[test]
    fn test_unknown_class_has_no_members() {
        let provider = StaticFunctionTypeProvider;
        assert!(provider.static_functions("System.Reflection.Assembly").is_empty());
        assert!(provider.find_class("System.Reflection.Assembly").is_none());
    }

    #[test]
    fn test_property_members_without_parens() {
        let provider = StaticFunctionTypeProvider;
        assert!(provider.find_property_function("Length").unwrap().is_property);
        assert!(!provider.find_property_function("Trim").unwrap().is_property);
    }

    #[test]
    fn test_condition_functions() {
        let names: Vec<_> = StaticFunctionTypeProvider
            .condition_functions()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["Exists", "HasTrailingSlash"]);
    }
}
