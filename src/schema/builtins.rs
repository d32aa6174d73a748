//! Built-in vocabulary: reserved properties, well-known metadata, common
//! tasks, and closed value sets.
//!
//! Process-wide read-only tables. They are consulted at lookup time and are
//! never merged into per-file inferred tables.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::symbols::{ConstantInfo, MetadataInfo, PropertyInfo, TaskInfo, TaskParameterInfo};
use super::value_kind::{BaseKind, ValueKind};
use crate::base::{SymbolName, SymbolTable};

const fn kind(base: BaseKind) -> ValueKind {
    ValueKind::new(base)
}

static RESERVED_PROPERTIES: &[(&str, BaseKind, &str)] = &[
    ("MSBuildProjectDirectory", BaseKind::Folder, "Directory of the project file, without a trailing slash"),
    ("MSBuildProjectDirectoryNoRoot", BaseKind::Folder, "Project directory without the drive or root"),
    ("MSBuildProjectExtension", BaseKind::Extension, "Extension of the project file, including the period"),
    ("MSBuildProjectFile", BaseKind::Filename, "File name of the project file, including the extension"),
    ("MSBuildProjectFullPath", BaseKind::File, "Absolute path of the project file"),
    ("MSBuildProjectName", BaseKind::Filename, "File name of the project file, without the extension"),
    ("MSBuildThisFile", BaseKind::Filename, "File name of the file containing the reference"),
    ("MSBuildThisFileDirectory", BaseKind::FolderWithSlash, "Directory of the file containing the reference, with a trailing slash"),
    ("MSBuildThisFileDirectoryNoRoot", BaseKind::FolderWithSlash, "Directory of the current file without the drive or root"),
    ("MSBuildThisFileExtension", BaseKind::Extension, "Extension of the file containing the reference"),
    ("MSBuildThisFileFullPath", BaseKind::File, "Absolute path of the file containing the reference"),
    ("MSBuildThisFileName", BaseKind::Filename, "File name of the current file, without the extension"),
    ("MSBuildBinPath", BaseKind::Folder, "Directory of the build engine binaries"),
    ("MSBuildExtensionsPath", BaseKind::Folder, "Root of the build extensions directory"),
    ("MSBuildExtensionsPath32", BaseKind::Folder, "32-bit build extensions directory"),
    ("MSBuildExtensionsPath64", BaseKind::Folder, "64-bit build extensions directory"),
    ("MSBuildSDKsPath", BaseKind::Folder, "Directory containing the SDKs"),
    ("MSBuildToolsPath", BaseKind::Folder, "Directory of the build tools"),
    ("MSBuildToolsVersion", BaseKind::ToolsVersion, "Version of the toolset in use"),
    ("MSBuildVersion", BaseKind::Version, "Version of the build engine"),
    ("MSBuildStartupDirectory", BaseKind::Folder, "Directory the build was started from"),
    ("MSBuildNodeCount", BaseKind::Int, "Maximum number of concurrent build nodes"),
    ("MSBuildLastTaskResult", BaseKind::Bool, "Result of the last task that ran"),
    ("MSBuildProgramFiles32", BaseKind::Folder, "32-bit program files directory"),
    ("MSBuildRuntimeType", BaseKind::String, "Runtime the build engine is running on"),
    ("MSBuildAssemblyVersion", BaseKind::Version, "Assembly version of the build engine"),
    ("MSBuildFileVersion", BaseKind::Version, "File version of the build engine"),
    ("MSBuildSemanticVersion", BaseKind::VersionSuffixed, "Semantic version of the build engine"),
    ("MSBuildProjectDefaultTargets", BaseKind::TargetName, "Default targets of the project"),
    ("MSBuildInteractive", BaseKind::Bool, "Whether the build may prompt the user"),
    ("OS", BaseKind::String, "Host operating system family"),
];

/// Properties set by the build engine.
pub static BUILTIN_PROPERTIES: Lazy<SymbolTable<PropertyInfo>> = Lazy::new(|| {
    RESERVED_PROPERTIES
        .iter()
        .map(|&(name, base, description)| {
            let kind = if base == BaseKind::TargetName { kind(base).list() } else { kind(base) };
            let info = PropertyInfo::new(name).with_description(description).with_kind(kind).reserved();
            (info.name.clone(), info)
        })
        .collect()
});

static WELL_KNOWN: &[(&str, BaseKind, &str)] = &[
    ("FullPath", BaseKind::File, "Full path of the item"),
    ("RootDir", BaseKind::Folder, "Root directory of the item"),
    ("Filename", BaseKind::Filename, "File name of the item, without the extension"),
    ("Extension", BaseKind::Extension, "Extension of the item"),
    ("RelativeDir", BaseKind::FolderWithSlash, "Directory of the item relative to the project"),
    ("Directory", BaseKind::Folder, "Directory of the item, without the root"),
    ("RecursiveDir", BaseKind::FolderWithSlash, "Part of the path matched by a `**` wildcard"),
    ("Identity", BaseKind::String, "Item specification as written in the Include attribute"),
    ("ModifiedTime", BaseKind::DateTime, "Time the item was last modified"),
    ("CreatedTime", BaseKind::DateTime, "Time the item was created"),
    ("AccessedTime", BaseKind::DateTime, "Time the item was last accessed"),
    ("DefiningProjectFullPath", BaseKind::File, "Full path of the project that defined the item"),
    ("DefiningProjectDirectory", BaseKind::Folder, "Directory of the project that defined the item"),
    ("DefiningProjectName", BaseKind::Filename, "Name of the project that defined the item"),
    ("DefiningProjectExtension", BaseKind::Extension, "Extension of the project that defined the item"),
];

/// Metadata computed for every item.
pub static WELL_KNOWN_METADATA: Lazy<SymbolTable<MetadataInfo>> = Lazy::new(|| {
    WELL_KNOWN
        .iter()
        .map(|&(name, base, description)| {
            let mut info = MetadataInfo::new(name, None);
            info.description = Some(description.into());
            info.kind = kind(base);
            info.is_reserved = true;
            (info.name.clone(), info)
        })
        .collect()
});

type TaskSpec = (&'static str, &'static str, &'static [(&'static str, BaseKind, bool, bool)]);

// (name, description, [(parameter, kind, required, output)])
static COMMON_TASKS: &[TaskSpec] = &[
    ("Message", "Logs a message", &[
        ("Text", BaseKind::String, false, false),
        ("Importance", BaseKind::Importance, false, false),
    ]),
    ("Warning", "Logs a warning", &[
        ("Text", BaseKind::String, false, false),
        ("Code", BaseKind::String, false, false),
    ]),
    ("Error", "Logs an error and stops the build", &[
        ("Text", BaseKind::String, false, false),
        ("Code", BaseKind::String, false, false),
    ]),
    ("Exec", "Runs a command", &[
        ("Command", BaseKind::String, true, false),
        ("WorkingDirectory", BaseKind::Folder, false, false),
        ("ExitCode", BaseKind::Int, false, true),
        ("IgnoreExitCode", BaseKind::Bool, false, false),
    ]),
    ("Copy", "Copies files", &[
        ("SourceFiles", BaseKind::File, true, false),
        ("DestinationFolder", BaseKind::Folder, false, false),
        ("DestinationFiles", BaseKind::File, false, false),
        ("SkipUnchangedFiles", BaseKind::Bool, false, false),
        ("CopiedFiles", BaseKind::File, false, true),
    ]),
    ("Delete", "Deletes files", &[
        ("Files", BaseKind::File, true, false),
        ("DeletedFiles", BaseKind::File, false, true),
    ]),
    ("MakeDir", "Creates directories", &[
        ("Directories", BaseKind::Folder, true, false),
        ("DirectoriesCreated", BaseKind::Folder, false, true),
    ]),
    ("RemoveDir", "Removes directories", &[
        ("Directories", BaseKind::Folder, true, false),
    ]),
    ("Touch", "Updates file timestamps", &[
        ("Files", BaseKind::File, true, false),
        ("AlwaysCreate", BaseKind::Bool, false, false),
    ]),
    ("WriteLinesToFile", "Writes lines to a file", &[
        ("File", BaseKind::File, true, false),
        ("Lines", BaseKind::String, false, false),
        ("Overwrite", BaseKind::Bool, false, false),
    ]),
    ("ReadLinesFromFile", "Reads lines from a file", &[
        ("File", BaseKind::File, true, false),
        ("Lines", BaseKind::String, false, true),
    ]),
    ("CallTarget", "Invokes targets in the current project", &[
        ("Targets", BaseKind::TargetName, false, false),
        ("TargetOutputs", BaseKind::String, false, true),
    ]),
    ("MSBuild", "Builds other projects", &[
        ("Projects", BaseKind::ProjectFile, true, false),
        ("Targets", BaseKind::TargetName, false, false),
        ("Properties", BaseKind::String, false, false),
        ("TargetOutputs", BaseKind::String, false, true),
    ]),
];

/// Tasks provided by the build engine itself.
pub static BUILTIN_TASKS: Lazy<SymbolTable<TaskInfo>> = Lazy::new(|| {
    COMMON_TASKS
        .iter()
        .map(|&(name, description, params)| {
            let mut task = TaskInfo::new(name);
            task.description = Some(description.into());
            for &(param, base, required, output) in params {
                let mut info = TaskParameterInfo::new(param);
                info.kind = if base.is_path() || base == BaseKind::TargetName {
                    kind(base).list()
                } else {
                    kind(base)
                };
                info.is_required = required;
                info.is_output = output;
                task.parameters.insert(info.name.clone(), info);
            }
            (task.name.clone(), task)
        })
        .collect()
});

fn constants(values: &[(&str, Option<&str>)]) -> Vec<ConstantInfo> {
    values.iter().map(|&(name, desc)| ConstantInfo::new(name, desc)).collect()
}

static CONSTANTS: Lazy<FxHashMap<BaseKind, Vec<ConstantInfo>>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert(BaseKind::Bool, constants(&[("true", None), ("false", None)]));
    map.insert(
        BaseKind::ContinueOnError,
        constants(&[
            ("WarnAndContinue", Some("Log failures as warnings and continue")),
            ("true", Some("Same as WarnAndContinue")),
            ("ErrorAndContinue", Some("Log failures as errors and continue")),
            ("ErrorAndStop", Some("Log failures as errors and stop")),
            ("false", Some("Same as ErrorAndStop")),
        ]),
    );
    map.insert(
        BaseKind::Importance,
        constants(&[("high", None), ("normal", None), ("low", None)]),
    );
    map.insert(
        BaseKind::Configuration,
        constants(&[("Debug", None), ("Release", None)]),
    );
    map.insert(
        BaseKind::Platform,
        constants(&[("AnyCPU", None), ("x86", None), ("x64", None), ("ARM", None), ("ARM64", None)]),
    );
    map.insert(
        BaseKind::TaskArchitecture,
        constants(&[("*", Some("Any architecture")), ("CurrentArchitecture", None), ("x86", None), ("x64", None), ("arm64", None)]),
    );
    map.insert(
        BaseKind::TaskRuntime,
        constants(&[("*", Some("Any runtime")), ("CurrentRuntime", None), ("CLR2", None), ("CLR4", None), ("NET", None)]),
    );
    map.insert(
        BaseKind::ToolsVersion,
        constants(&[("2.0", None), ("3.5", None), ("4.0", None), ("12.0", None), ("14.0", None), ("15.0", None), ("Current", None)]),
    );
    map.insert(
        BaseKind::TargetFrameworkIdentifier,
        constants(&[
            (".NETFramework", None),
            (".NETStandard", None),
            (".NETCoreApp", None),
            ("MonoAndroid", None),
            ("Xamarin.iOS", None),
        ]),
    );
    map.insert(
        BaseKind::HostOS,
        constants(&[("Windows_NT", None), ("Unix", None), ("OSX", None)]),
    );
    map
});

/// The closed value set for a kind, if it has one. Modifiers are ignored.
pub fn known_values(kind: ValueKind) -> Option<&'static [ConstantInfo]> {
    CONSTANTS.get(&kind.base()).map(Vec::as_slice)
}

/// Whether `name` is a reserved (engine-defined) property.
pub fn is_reserved_property(name: &str) -> bool {
    use crate::base::SymbolTableExt;
    BUILTIN_PROPERTIES.get_named(name).is_some_and(|p| p.is_reserved)
}

/// Built-in kind for a well-known property that has a closed value set.
pub fn well_known_property_kind(name: &SymbolName) -> Option<ValueKind> {
    const WELL_KNOWN_KINDS: &[(&str, BaseKind)] = &[
        ("Configuration", BaseKind::Configuration),
        ("Platform", BaseKind::Platform),
        ("TargetFramework", BaseKind::TargetFramework),
        ("TargetFrameworkIdentifier", BaseKind::TargetFrameworkIdentifier),
        ("TargetFrameworkVersion", BaseKind::TargetFrameworkVersion),
        ("ProjectGuid", BaseKind::Guid),
        ("LangVersion", BaseKind::String),
        ("OutputType", BaseKind::String),
    ];
    WELL_KNOWN_KINDS
        .iter()
        .find(|(n, _)| name.matches(n))
        .map(|&(_, base)| kind(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SymbolTableExt;

    #[test]
    fn test_reserved_properties_are_case_insensitive() {
        let info = BUILTIN_PROPERTIES.get_named("msbuildprojectdirectory").unwrap();
        assert!(info.is_reserved);
        assert_eq!(info.kind.base(), BaseKind::Folder);
        assert!(is_reserved_property("MSBuildThisFileDirectory"));
        assert!(!is_reserved_property("OutputPath"));
    }

    #[test]
    fn test_known_values_ignore_modifiers() {
        let values = known_values(ValueKind::new(BaseKind::Bool).list()).unwrap();
        assert_eq!(values.len(), 2);
        assert!(known_values(ValueKind::STRING).is_none());
    }

    #[test]
    fn test_builtin_tasks_have_parameters() {
        let exec = BUILTIN_TASKS.get_named("exec").unwrap();
        let command = exec.parameters.get_named("Command").unwrap();
        assert!(command.is_required);
        assert!(exec.parameters.get_named("ExitCode").unwrap().is_output);
    }

    #[test]
    fn test_well_known_metadata() {
        assert!(WELL_KNOWN_METADATA.contains_named("fullpath"));
        assert!(WELL_KNOWN_METADATA.get_named("Filename").unwrap().item.is_none());
    }
}
