//! Symbol records shared by built-in, explicit, and inferred schemas.

use std::path::Path;
use std::sync::Arc;

use smol_str::SmolStr;

use super::value_kind::ValueKind;
use crate::base::{SymbolName, SymbolTable, TextRange};

// ============================================================================
// SYMBOL KINDS
// ============================================================================

/// The kind of a named symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Property,
    Item,
    /// Owned by an item.
    Metadata,
    Target,
    Task,
    /// Owned by a task.
    TaskParameter,
    Constant,
    Function,
    Class,
}

impl SymbolKind {
    /// Human-readable kind name.
    pub fn display(&self) -> &'static str {
        match self {
            SymbolKind::Property => "property",
            SymbolKind::Item => "item",
            SymbolKind::Metadata => "metadata",
            SymbolKind::Target => "target",
            SymbolKind::Task => "task",
            SymbolKind::TaskParameter => "task parameter",
            SymbolKind::Constant => "value",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
        }
    }
}

/// Where a symbol was first declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolLocation {
    pub file: Arc<Path>,
    pub range: TextRange,
}

/// Common view over every symbol record.
pub trait SymbolInfo {
    fn name(&self) -> &SymbolName;
    fn symbol_kind(&self) -> SymbolKind;
    fn description(&self) -> Option<&str> {
        None
    }
    fn value_kind(&self) -> ValueKind {
        ValueKind::UNKNOWN
    }
    fn location(&self) -> Option<&SymbolLocation> {
        None
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
    pub kind: ValueKind,
    pub default_value: Option<SmolStr>,
    /// Set by the build engine; may not be assigned.
    pub is_reserved: bool,
    pub location: Option<SymbolLocation>,
}

impl PropertyInfo {
    pub fn new(name: impl Into<SymbolName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: ValueKind::UNKNOWN,
            default_value: None,
            is_reserved: false,
            location: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<SmolStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn reserved(mut self) -> Self {
        self.is_reserved = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
    /// Kind of the item's `Include` values.
    pub kind: ValueKind,
    pub metadata: SymbolTable<MetadataInfo>,
    pub location: Option<SymbolLocation>,
}

impl ItemInfo {
    pub fn new(name: impl Into<SymbolName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: ValueKind::UNKNOWN,
            metadata: SymbolTable::default(),
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataInfo {
    pub name: SymbolName,
    /// The owning item; `None` for well-known metadata available on every item.
    pub item: Option<SymbolName>,
    pub description: Option<SmolStr>,
    pub kind: ValueKind,
    /// Computed by the engine (`FullPath`, `Filename`, ...).
    pub is_reserved: bool,
    pub location: Option<SymbolLocation>,
}

impl MetadataInfo {
    pub fn new(name: impl Into<SymbolName>, item: Option<SymbolName>) -> Self {
        Self {
            name: name.into(),
            item,
            description: None,
            kind: ValueKind::UNKNOWN,
            is_reserved: false,
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TargetInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
    pub location: Option<SymbolLocation>,
}

impl TargetInfo {
    pub fn new(name: impl Into<SymbolName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
    pub parameters: SymbolTable<TaskParameterInfo>,
    /// Discovered from usage rather than declared by `UsingTask`.
    pub is_inferred: bool,
    pub location: Option<SymbolLocation>,
}

impl TaskInfo {
    pub fn new(name: impl Into<SymbolName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: SymbolTable::default(),
            is_inferred: false,
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskParameterInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
    pub kind: ValueKind,
    pub is_output: bool,
    pub is_required: bool,
}

impl TaskParameterInfo {
    pub fn new(name: impl Into<SymbolName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: ValueKind::UNKNOWN,
            is_output: false,
            is_required: false,
        }
    }
}

/// A member of a closed value set, e.g. `true` for bool.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
}

impl ConstantInfo {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: SymbolName::new(name),
            description: description.map(SmolStr::new),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionParameter {
    pub name: SmolStr,
    pub kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
    pub return_kind: ValueKind,
    pub parameters: Vec<FunctionParameter>,
    /// Property access without parentheses, e.g. `Length`.
    pub is_property: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassInfo {
    pub name: SymbolName,
    pub description: Option<SmolStr>,
}

// ============================================================================
// SymbolInfo impls
// ============================================================================

macro_rules! impl_symbol_info {
    ($ty:ty, $kind:expr, kind: $vk:ident, location: $loc:ident) => {
        impl SymbolInfo for $ty {
            fn name(&self) -> &SymbolName {
                &self.name
            }
            fn symbol_kind(&self) -> SymbolKind {
                $kind
            }
            fn description(&self) -> Option<&str> {
                self.description.as_deref()
            }
            fn value_kind(&self) -> ValueKind {
                impl_symbol_info!(@kind self $vk)
            }
            fn location(&self) -> Option<&SymbolLocation> {
                impl_symbol_info!(@loc self $loc)
            }
        }
    };
    (@kind $s:ident yes) => { $s.kind };
    (@kind $s:ident no) => { ValueKind::UNKNOWN };
    (@kind $s:ident returns) => { $s.return_kind };
    (@loc $s:ident yes) => { $s.location.as_ref() };
    (@loc $s:ident no) => { None };
}

impl_symbol_info!(PropertyInfo, SymbolKind::Property, kind: yes, location: yes);
impl_symbol_info!(ItemInfo, SymbolKind::Item, kind: yes, location: yes);
impl_symbol_info!(MetadataInfo, SymbolKind::Metadata, kind: yes, location: yes);
impl_symbol_info!(TargetInfo, SymbolKind::Target, kind: no, location: yes);
impl_symbol_info!(TaskInfo, SymbolKind::Task, kind: no, location: yes);
impl_symbol_info!(TaskParameterInfo, SymbolKind::TaskParameter, kind: yes, location: no);
impl_symbol_info!(ConstantInfo, SymbolKind::Constant, kind: no, location: no);
impl_symbol_info!(FunctionInfo, SymbolKind::Function, kind: returns, location: no);
impl_symbol_info!(ClassInfo, SymbolKind::Class, kind: no, location: no);
