//! Schema and type system.
//!
//! - [`ValueKind`]: base kind plus list/literal modifiers
//! - symbol records ([`PropertyInfo`], [`ItemInfo`], ...)
//! - built-in vocabulary and the static element grammar
//! - explicit schemas and the function type provider

mod builtins;
mod explicit;
mod functions;
mod infer;
mod language;
mod symbols;
mod value_kind;

pub use builtins::{
    BUILTIN_PROPERTIES, BUILTIN_TASKS, WELL_KNOWN_METADATA, is_reserved_property, known_values,
    well_known_property_kind,
};
pub use explicit::{ExplicitSchema, SchemaError, SchemaProvider, SidecarSchemaProvider};
pub use functions::{FunctionTypeProvider, StaticFunctionTypeProvider};
pub use infer::infer_kind_from_name;
pub use language::{AttributeSchema, ElementKind, ElementSchema, ExprScope, schema};
pub use symbols::{
    ClassInfo, ConstantInfo, FunctionInfo, FunctionParameter, ItemInfo, MetadataInfo, PropertyInfo,
    SymbolInfo, SymbolKind, SymbolLocation, TargetInfo, TaskInfo, TaskParameterInfo,
};
pub use value_kind::{BaseKind, UnknownKindError, ValueKind};
