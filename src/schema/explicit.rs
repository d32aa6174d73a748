//! Explicit schemas: declared properties, items, targets and tasks with
//! descriptions and kinds, loaded from JSON.
//!
//! ```json
//! {
//!   "properties": { "OutputPath": { "description": "Output folder", "kind": "folder" } },
//!   "items": { "Compile": { "description": "Source files", "kind": "file",
//!                           "metadata": { "Link": { "kind": "file" } } } },
//!   "targets": { "Build": { "description": "Builds the project" } },
//!   "tasks": { "Csc": { "parameters": { "Sources": { "kind": "file-list", "required": true } } } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

use super::symbols::{ItemInfo, MetadataInfo, PropertyInfo, TargetInfo, TaskInfo, TaskParameterInfo};
use super::value_kind::{UnknownKindError, ValueKind};
use crate::base::{SymbolName, SymbolTable};

/// Errors loading an explicit schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid kind for '{name}': {source}")]
    Kind {
        name: String,
        #[source]
        source: UnknownKindError,
    },
}

/// Declared symbols for one build file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplicitSchema {
    pub properties: SymbolTable<PropertyInfo>,
    pub items: SymbolTable<ItemInfo>,
    pub targets: SymbolTable<TargetInfo>,
    pub tasks: SymbolTable<TaskInfo>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawSchema {
    properties: BTreeMap<String, RawSymbol>,
    items: BTreeMap<String, RawItem>,
    targets: BTreeMap<String, RawSymbol>,
    tasks: BTreeMap<String, RawTask>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSymbol {
    description: Option<String>,
    kind: Option<String>,
    default_value: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawItem {
    description: Option<String>,
    kind: Option<String>,
    metadata: BTreeMap<String, RawSymbol>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawTask {
    description: Option<String>,
    parameters: BTreeMap<String, RawParameter>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawParameter {
    description: Option<String>,
    kind: Option<String>,
    required: bool,
    output: bool,
}

fn parse_kind(name: &str, kind: Option<&str>) -> Result<ValueKind, SchemaError> {
    match kind {
        None => Ok(ValueKind::UNKNOWN),
        Some(kind) => kind.parse().map_err(|source| SchemaError::Kind {
            name: name.to_string(),
            source,
        }),
    }
}

impl ExplicitSchema {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_json::from_str(text)?;
        let mut schema = ExplicitSchema::default();

        for (name, raw) in raw.properties {
            let mut info = PropertyInfo::new(name.as_str()).with_kind(parse_kind(&name, raw.kind.as_deref())?);
            info.description = raw.description.map(SmolStr::from);
            info.default_value = raw.default_value.map(SmolStr::from);
            schema.properties.insert(info.name.clone(), info);
        }
        for (name, raw) in raw.items {
            let mut item = ItemInfo::new(name.as_str());
            item.description = raw.description.map(SmolStr::from);
            item.kind = parse_kind(&name, raw.kind.as_deref())?;
            for (meta_name, raw_meta) in raw.metadata {
                let mut meta = MetadataInfo::new(meta_name.as_str(), Some(item.name.clone()));
                meta.description = raw_meta.description.map(SmolStr::from);
                meta.kind = parse_kind(&meta_name, raw_meta.kind.as_deref())?;
                item.metadata.insert(meta.name.clone(), meta);
            }
            schema.items.insert(item.name.clone(), item);
        }
        for (name, raw) in raw.targets {
            let mut target = TargetInfo::new(name.as_str());
            target.description = raw.description.map(SmolStr::from);
            schema.targets.insert(target.name.clone(), target);
        }
        for (name, raw) in raw.tasks {
            let mut task = TaskInfo::new(name.as_str());
            task.description = raw.description.map(SmolStr::from);
            for (param_name, raw_param) in raw.parameters {
                let mut param = TaskParameterInfo::new(param_name.as_str());
                param.description = raw_param.description.map(SmolStr::from);
                param.kind = parse_kind(&param_name, raw_param.kind.as_deref())?;
                param.is_required = raw_param.required;
                param.is_output = raw_param.output;
                task.parameters.insert(param.name.clone(), param);
            }
            schema.tasks.insert(task.name.clone(), task);
        }
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.items.is_empty() && self.targets.is_empty() && self.tasks.is_empty()
    }

    pub fn property(&self, name: &SymbolName) -> Option<&PropertyInfo> {
        self.properties.get(name)
    }
}

/// Finds the explicit schema for a build file.
pub trait SchemaProvider: Send + Sync {
    fn schema_for(&self, file: &Path) -> Result<Option<Arc<ExplicitSchema>>, SchemaError>;
}

/// Looks for a `<file>.buildschema.json` next to each build file.
#[derive(Clone, Copy, Debug, Default)]
pub struct SidecarSchemaProvider;

impl SidecarSchemaProvider {
    pub const SUFFIX: &'static str = ".buildschema.json";

    pub fn sidecar_path(file: &Path) -> PathBuf {
        let mut name = file.as_os_str().to_owned();
        name.push(Self::SUFFIX);
        PathBuf::from(name)
    }
}

impl SchemaProvider for SidecarSchemaProvider {
    fn schema_for(&self, file: &Path) -> Result<Option<Arc<ExplicitSchema>>, SchemaError> {
        let path = Self::sidecar_path(file);
        if !path.is_file() {
            return Ok(None);
        }
        ExplicitSchema::load(&path).map(|s| Some(Arc::new(s)))
    }
}
