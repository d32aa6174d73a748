//! Static structure of the build language.
//!
//! Each [`ElementKind`] maps to an [`ElementSchema`] describing its fixed
//! children, its "abstract" wildcard child (an element whose *name* is the
//! declared symbol, like an item under `ItemGroup`), and its attributes.

use super::value_kind::{BaseKind, ValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Project,
    PropertyGroup,
    /// Abstract: any child of `PropertyGroup`.
    Property,
    ItemGroup,
    /// Abstract: any child of `ItemGroup`.
    Item,
    ItemDefinitionGroup,
    /// Abstract: any child of `ItemDefinitionGroup`.
    ItemDefinition,
    /// Abstract: any child of an item or item definition.
    Metadata,
    Target,
    /// Abstract: any non-structural child of `Target`.
    Task,
    Output,
    OnError,
    Import,
    ImportGroup,
    Choose,
    When,
    Otherwise,
    UsingTask,
    ParameterGroup,
    /// Abstract: any child of `ParameterGroup`.
    Parameter,
    /// The `Task` child of `UsingTask`, holding inline task code.
    TaskBody,
    ProjectExtensions,
    Sdk,
}

/// Which references an attribute or element value may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExprScope {
    /// Literal text only.
    None,
    /// `$()` only.
    Properties,
    /// `$()` and `@()`.
    Items,
    /// `$()`, `@()` and `%()`.
    ItemsAndMetadata,
}

#[derive(Debug)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    pub scope: ExprScope,
}

impl AttributeSchema {
    const fn new(name: &'static str, kind: ValueKind, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
            scope: ExprScope::Properties,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn scope(mut self, scope: ExprScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn is_condition(&self) -> bool {
        self.kind.base() == BaseKind::Condition
    }
}

#[derive(Debug)]
pub struct ElementSchema {
    pub kind: ElementKind,
    /// Fixed element name; empty for abstract elements.
    pub name: &'static str,
    pub description: &'static str,
    pub attributes: &'static [AttributeSchema],
    pub children: &'static [ElementKind],
    pub abstract_child: Option<ElementKind>,
    /// Attributes not listed in `attributes` declare metadata or task parameters.
    pub abstract_attributes: bool,
    /// Text content is an expression value.
    pub has_value: bool,
    /// Contents are not part of the build language.
    pub opaque: bool,
    /// May appear at most once in its parent.
    pub unique: bool,
}

impl ElementSchema {
    const fn new(kind: ElementKind, name: &'static str, description: &'static str) -> Self {
        Self {
            kind,
            name,
            description,
            attributes: &[],
            children: &[],
            abstract_child: None,
            abstract_attributes: false,
            has_value: false,
            opaque: false,
            unique: false,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.name.is_empty()
    }

    /// Resolve a child element name. Fixed children win over the abstract child.
    pub fn child(&self, name: &str) -> Option<ElementKind> {
        self.children
            .iter()
            .copied()
            .find(|&k| schema(k).name.eq_ignore_ascii_case(name))
            .or(self.abstract_child)
    }

    pub fn attribute(&self, name: &str) -> Option<&'static AttributeSchema> {
        self.attributes.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

const fn k(base: BaseKind) -> ValueKind {
    ValueKind::new(base)
}

const CONDITION: AttributeSchema = AttributeSchema::new(
    "Condition",
    k(BaseKind::Condition),
    "Condition that must be true for this element to be evaluated",
)
.scope(ExprScope::ItemsAndMetadata);

const LABEL: AttributeSchema =
    AttributeSchema::new("Label", k(BaseKind::String).literal(), "Optional label for tooling").scope(ExprScope::None);

const GROUP_ATTRIBUTES: &[AttributeSchema] = &[CONDITION, LABEL];

const PROJECT_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("Sdk", k(BaseKind::SdkWithVersion).list().literal(), "SDKs imported implicitly by this project")
        .scope(ExprScope::None),
    AttributeSchema::new("DefaultTargets", k(BaseKind::TargetName).list(), "Targets built when none are specified"),
    AttributeSchema::new("InitialTargets", k(BaseKind::TargetName).list(), "Targets run before any others"),
    AttributeSchema::new("ToolsVersion", k(BaseKind::ToolsVersion).literal(), "Toolset version").scope(ExprScope::None),
    AttributeSchema::new(
        "TreatAsLocalProperty",
        k(BaseKind::PropertyName).list(),
        "Global properties that may be overridden in this project",
    ),
    AttributeSchema::new("xmlns", k(BaseKind::Url).literal(), "XML namespace").scope(ExprScope::None),
];

const ITEM_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("Include", k(BaseKind::FileOrFolder).list(), "Values to include in the item")
        .scope(ExprScope::Items),
    AttributeSchema::new("Exclude", k(BaseKind::FileOrFolder).list(), "Values to exclude from the Include")
        .scope(ExprScope::Items),
    AttributeSchema::new("Remove", k(BaseKind::FileOrFolder).list(), "Values to remove from the item")
        .scope(ExprScope::Items),
    AttributeSchema::new("Update", k(BaseKind::FileOrFolder).list(), "Values whose metadata is updated")
        .scope(ExprScope::Items),
    AttributeSchema::new("KeepMetadata", k(BaseKind::MetadataName).list(), "Metadata to keep"),
    AttributeSchema::new("RemoveMetadata", k(BaseKind::MetadataName).list(), "Metadata to remove"),
    AttributeSchema::new("KeepDuplicates", k(BaseKind::Bool), "Whether duplicate values are kept"),
    AttributeSchema::new("MatchOnMetadata", k(BaseKind::MetadataName).list(), "Metadata used to match Remove values"),
    AttributeSchema::new("MatchOnMetadataOptions", k(BaseKind::String), "How MatchOnMetadata compares values"),
    CONDITION,
    LABEL,
];

const TARGET_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("Name", k(BaseKind::TargetName).literal(), "Name of the target")
        .required()
        .scope(ExprScope::None),
    AttributeSchema::new("DependsOnTargets", k(BaseKind::TargetName).list(), "Targets to run before this one"),
    AttributeSchema::new("BeforeTargets", k(BaseKind::TargetName).list(), "Targets this one runs before"),
    AttributeSchema::new("AfterTargets", k(BaseKind::TargetName).list(), "Targets this one runs after"),
    AttributeSchema::new("Inputs", k(BaseKind::File).list(), "Inputs used for incremental builds")
        .scope(ExprScope::ItemsAndMetadata),
    AttributeSchema::new("Outputs", k(BaseKind::File).list(), "Outputs used for incremental builds")
        .scope(ExprScope::ItemsAndMetadata),
    AttributeSchema::new("Returns", k(BaseKind::String).list(), "Values returned to callers")
        .scope(ExprScope::ItemsAndMetadata),
    AttributeSchema::new("KeepDuplicateOutputs", k(BaseKind::Bool), "Whether duplicate returns are kept"),
    CONDITION,
    LABEL,
];

const TASK_ATTRIBUTES: &[AttributeSchema] = &[
    CONDITION,
    AttributeSchema::new("ContinueOnError", k(BaseKind::ContinueOnError), "What to do when the task fails"),
    AttributeSchema::new("Architecture", k(BaseKind::TaskArchitecture), "Architecture the task runs under"),
    AttributeSchema::new("Runtime", k(BaseKind::TaskRuntime), "Runtime the task runs under"),
    AttributeSchema::new("MSBuildArchitecture", k(BaseKind::TaskArchitecture), "Architecture the task runs under"),
    AttributeSchema::new("MSBuildRuntime", k(BaseKind::TaskRuntime), "Runtime the task runs under"),
];

const OUTPUT_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("TaskParameter", k(BaseKind::TaskOutputParameterName).literal(), "Output parameter to read")
        .required()
        .scope(ExprScope::None),
    AttributeSchema::new("PropertyName", k(BaseKind::PropertyName).literal(), "Property receiving the value")
        .scope(ExprScope::None),
    AttributeSchema::new("ItemName", k(BaseKind::ItemName).literal(), "Item receiving the values")
        .scope(ExprScope::None),
    CONDITION,
];

const ON_ERROR_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("ExecuteTargets", k(BaseKind::TargetName).list(), "Targets run when a task fails").required(),
    CONDITION,
];

const IMPORT_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("Project", k(BaseKind::ProjectFile).list(), "Path of the file to import").required(),
    AttributeSchema::new("Sdk", k(BaseKind::SdkWithVersion).literal(), "SDK the path is relative to")
        .scope(ExprScope::None),
    AttributeSchema::new("Version", k(BaseKind::SdkVersion).literal(), "SDK version").scope(ExprScope::None),
    AttributeSchema::new("MinimumVersion", k(BaseKind::SdkVersion).literal(), "Minimum SDK version")
        .scope(ExprScope::None),
    CONDITION,
    LABEL,
];

const WHEN_ATTRIBUTES: &[AttributeSchema] = &[AttributeSchema::new(
    "Condition",
    k(BaseKind::Condition),
    "Condition selecting this branch",
)
.required()
.scope(ExprScope::ItemsAndMetadata)];

const USING_TASK_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("TaskName", k(BaseKind::TaskName).literal(), "Name of the task").required().scope(ExprScope::None),
    AttributeSchema::new("AssemblyName", k(BaseKind::TaskAssemblyName), "Assembly containing the task"),
    AttributeSchema::new("AssemblyFile", k(BaseKind::TaskAssemblyFile), "File containing the task"),
    AttributeSchema::new("TaskFactory", k(BaseKind::TaskFactory), "Factory that creates the task"),
    AttributeSchema::new("Architecture", k(BaseKind::TaskArchitecture), "Required architecture"),
    AttributeSchema::new("Runtime", k(BaseKind::TaskRuntime), "Required runtime"),
    AttributeSchema::new("Override", k(BaseKind::Bool), "Whether this declaration takes precedence"),
    CONDITION,
];

const PARAMETER_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("ParameterType", k(BaseKind::String).literal(), "Type of the parameter").scope(ExprScope::None),
    AttributeSchema::new("Output", k(BaseKind::Bool).literal(), "Whether this is an output parameter").scope(ExprScope::None),
    AttributeSchema::new("Required", k(BaseKind::Bool).literal(), "Whether the parameter is required").scope(ExprScope::None),
];

const TASK_BODY_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("Evaluate", k(BaseKind::Bool), "Whether the body is evaluated"),
];

const SDK_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::new("Name", k(BaseKind::Sdk).literal(), "Name of the SDK").required().scope(ExprScope::None),
    AttributeSchema::new("Version", k(BaseKind::SdkVersion).literal(), "SDK version").scope(ExprScope::None),
    AttributeSchema::new("MinimumVersion", k(BaseKind::SdkVersion).literal(), "Minimum SDK version")
        .scope(ExprScope::None),
];

// ============================================================================
// ELEMENTS
// ============================================================================

use ElementKind as E;

static PROJECT: ElementSchema = ElementSchema {
    attributes: PROJECT_ATTRIBUTES,
    children: &[
        E::PropertyGroup,
        E::ItemGroup,
        E::ItemDefinitionGroup,
        E::Target,
        E::Import,
        E::ImportGroup,
        E::Choose,
        E::UsingTask,
        E::ProjectExtensions,
        E::Sdk,
    ],
    ..ElementSchema::new(E::Project, "Project", "Root element of a build file")
};

static PROPERTY_GROUP: ElementSchema = ElementSchema {
    attributes: GROUP_ATTRIBUTES,
    abstract_child: Some(E::Property),
    ..ElementSchema::new(E::PropertyGroup, "PropertyGroup", "Groups property definitions")
};

static PROPERTY: ElementSchema = ElementSchema {
    attributes: &[CONDITION],
    has_value: true,
    ..ElementSchema::new(E::Property, "", "Defines a property")
};

static ITEM_GROUP: ElementSchema = ElementSchema {
    attributes: GROUP_ATTRIBUTES,
    abstract_child: Some(E::Item),
    ..ElementSchema::new(E::ItemGroup, "ItemGroup", "Groups item definitions")
};

static ITEM: ElementSchema = ElementSchema {
    attributes: ITEM_ATTRIBUTES,
    abstract_child: Some(E::Metadata),
    abstract_attributes: true,
    ..ElementSchema::new(E::Item, "", "Adds values to an item")
};

static ITEM_DEFINITION_GROUP: ElementSchema = ElementSchema {
    attributes: GROUP_ATTRIBUTES,
    abstract_child: Some(E::ItemDefinition),
    ..ElementSchema::new(E::ItemDefinitionGroup, "ItemDefinitionGroup", "Groups default metadata for items")
};

static ITEM_DEFINITION: ElementSchema = ElementSchema {
    attributes: &[CONDITION],
    abstract_child: Some(E::Metadata),
    abstract_attributes: true,
    ..ElementSchema::new(E::ItemDefinition, "", "Default metadata for an item")
};

static METADATA: ElementSchema = ElementSchema {
    attributes: &[CONDITION],
    has_value: true,
    ..ElementSchema::new(E::Metadata, "", "Defines item metadata")
};

static TARGET: ElementSchema = ElementSchema {
    attributes: TARGET_ATTRIBUTES,
    children: &[E::PropertyGroup, E::ItemGroup, E::OnError],
    abstract_child: Some(E::Task),
    ..ElementSchema::new(E::Target, "Target", "A named sequence of tasks")
};

static TASK: ElementSchema = ElementSchema {
    attributes: TASK_ATTRIBUTES,
    children: &[E::Output],
    abstract_attributes: true,
    ..ElementSchema::new(E::Task, "", "Runs a task")
};

static OUTPUT: ElementSchema = ElementSchema {
    attributes: OUTPUT_ATTRIBUTES,
    ..ElementSchema::new(E::Output, "Output", "Stores a task output in a property or item")
};

static ON_ERROR: ElementSchema = ElementSchema {
    attributes: ON_ERROR_ATTRIBUTES,
    ..ElementSchema::new(E::OnError, "OnError", "Targets run when a task fails")
};

static IMPORT: ElementSchema = ElementSchema {
    attributes: IMPORT_ATTRIBUTES,
    ..ElementSchema::new(E::Import, "Import", "Imports the contents of another file")
};

static IMPORT_GROUP: ElementSchema = ElementSchema {
    attributes: GROUP_ATTRIBUTES,
    children: &[E::Import],
    ..ElementSchema::new(E::ImportGroup, "ImportGroup", "Groups imports under a condition")
};

static CHOOSE: ElementSchema = ElementSchema {
    children: &[E::When, E::Otherwise],
    ..ElementSchema::new(E::Choose, "Choose", "Selects the first When whose condition is true")
};

static WHEN: ElementSchema = ElementSchema {
    attributes: WHEN_ATTRIBUTES,
    children: &[E::PropertyGroup, E::ItemGroup, E::Choose],
    ..ElementSchema::new(E::When, "When", "A conditional branch")
};

static OTHERWISE: ElementSchema = ElementSchema {
    children: &[E::PropertyGroup, E::ItemGroup, E::Choose],
    unique: true,
    ..ElementSchema::new(E::Otherwise, "Otherwise", "Branch used when no When matches")
};

static USING_TASK: ElementSchema = ElementSchema {
    attributes: USING_TASK_ATTRIBUTES,
    children: &[E::ParameterGroup, E::TaskBody],
    ..ElementSchema::new(E::UsingTask, "UsingTask", "Declares a task")
};

static PARAMETER_GROUP: ElementSchema = ElementSchema {
    abstract_child: Some(E::Parameter),
    unique: true,
    ..ElementSchema::new(E::ParameterGroup, "ParameterGroup", "Parameters of an inline task")
};

static PARAMETER: ElementSchema = ElementSchema {
    attributes: PARAMETER_ATTRIBUTES,
    ..ElementSchema::new(E::Parameter, "", "A task parameter")
};

static TASK_BODY: ElementSchema = ElementSchema {
    attributes: TASK_BODY_ATTRIBUTES,
    opaque: true,
    unique: true,
    ..ElementSchema::new(E::TaskBody, "Task", "Body of an inline task")
};

static PROJECT_EXTENSIONS: ElementSchema = ElementSchema {
    opaque: true,
    unique: true,
    ..ElementSchema::new(E::ProjectExtensions, "ProjectExtensions", "Tool-specific data ignored by the build")
};

static SDK: ElementSchema = ElementSchema {
    attributes: SDK_ATTRIBUTES,
    ..ElementSchema::new(E::Sdk, "Sdk", "Imports an SDK")
};

/// The schema for an element kind.
pub fn schema(kind: ElementKind) -> &'static ElementSchema {
    match kind {
        E::Project => &PROJECT,
        E::PropertyGroup => &PROPERTY_GROUP,
        E::Property => &PROPERTY,
        E::ItemGroup => &ITEM_GROUP,
        E::Item => &ITEM,
        E::ItemDefinitionGroup => &ITEM_DEFINITION_GROUP,
        E::ItemDefinition => &ITEM_DEFINITION,
        E::Metadata => &METADATA,
        E::Target => &TARGET,
        E::Task => &TASK,
        E::Output => &OUTPUT,
        E::OnError => &ON_ERROR,
        E::Import => &IMPORT,
        E::ImportGroup => &IMPORT_GROUP,
        E::Choose => &CHOOSE,
        E::When => &WHEN,
        E::Otherwise => &OTHERWISE,
        E::UsingTask => &USING_TASK,
        E::ParameterGroup => &PARAMETER_GROUP,
        E::Parameter => &PARAMETER,
        E::TaskBody => &TASK_BODY,
        E::ProjectExtensions => &PROJECT_EXTENSIONS,
        E::Sdk => &SDK,
    }
}

impl ElementKind {
    pub fn schema(self) -> &'static ElementSchema {
        schema(self)
    }

    /// Elements whose name is the declared symbol.
    pub fn is_abstract(self) -> bool {
        self.schema().is_abstract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_children_win_over_abstract() {
        let target = schema(ElementKind::Target);
        assert_eq!(target.child("PropertyGroup"), Some(ElementKind::PropertyGroup));
        assert_eq!(target.child("Message"), Some(ElementKind::Task));
        assert_eq!(target.child("onerror"), Some(ElementKind::OnError));
    }

    #[test]
    fn test_project_has_no_abstract_child() {
        assert_eq!(schema(ElementKind::Project).child("Foo"), None);
        assert_eq!(schema(ElementKind::Project).child("ItemGroup"), Some(ElementKind::ItemGroup));
    }

    #[test]
    fn test_using_task_body_is_not_abstract_task() {
        let using_task = schema(ElementKind::UsingTask);
        assert_eq!(using_task.child("Task"), Some(ElementKind::TaskBody));
        assert!(schema(ElementKind::TaskBody).opaque);
    }

    #[test]
    fn test_required_attributes() {
        let import = schema(ElementKind::Import);
        assert!(import.attribute("project").unwrap().required);
        assert!(!import.attribute("Condition").unwrap().required);
        assert!(import.attribute("Condition").unwrap().is_condition());
    }

    #[test]
    fn test_abstract_kinds() {
        assert!(ElementKind::Item.is_abstract());
        assert!(ElementKind::Metadata.is_abstract());
        assert!(!ElementKind::ItemGroup.is_abstract());
    }
}
