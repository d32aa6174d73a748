//! Completion candidates for a classified caret.
//!
//! The trigger engine decides what kind of name or value is being typed;
//! this module lists the candidates for that state from the resolution
//! context, the built-in vocabulary and the function type provider.

use std::path::Path;

use smol_str::SmolStr;
use tracing::debug;

use super::trigger::{TriggerResult, TriggerState};
use crate::hir::{PropertyValueCollector, ResolutionContext};
use crate::schema::{
    BaseKind, ClassInfo, ConstantInfo, FunctionInfo, FunctionTypeProvider, SymbolInfo, ValueKind, known_values,
};
use crate::syntax::ExprKind;

/// What a completion candidate is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Property,
    Item,
    Metadata,
    Target,
    Task,
    Function,
    Class,
    /// A member of a closed value set or a value seen elsewhere in the build.
    Value,
    File,
    Folder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: SmolStr,
    pub kind: CompletionKind,
    /// Short type information, e.g. the value kind or a signature.
    pub detail: Option<SmolStr>,
    pub documentation: Option<SmolStr>,
}

impl CompletionItem {
    fn new(label: impl Into<SmolStr>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
        }
    }

    fn from_symbol(info: &dyn SymbolInfo, kind: CompletionKind) -> Self {
        let value_kind = info.value_kind();
        Self {
            label: SmolStr::new(info.name().as_str()),
            kind,
            detail: (!value_kind.is_unknown()).then(|| SmolStr::new(value_kind.to_string())),
            documentation: info.description().map(SmolStr::new),
        }
    }

    fn from_function(info: &FunctionInfo) -> Self {
        let params: Vec<String> = info
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind))
            .collect();
        let detail = if info.is_property {
            format!("{}: {}", info.name, info.return_kind)
        } else {
            format!("{}({}): {}", info.name, params.join(", "), info.return_kind)
        };
        Self {
            label: SmolStr::new(info.name.as_str()),
            kind: CompletionKind::Function,
            detail: Some(detail.into()),
            documentation: info.description.clone(),
        }
    }

    fn from_class(info: &ClassInfo) -> Self {
        Self {
            label: SmolStr::new(info.name.as_str()),
            kind: CompletionKind::Class,
            detail: None,
            documentation: info.description.clone(),
        }
    }

    fn from_constant(info: &ConstantInfo) -> Self {
        Self {
            label: SmolStr::new(info.name.as_str()),
            kind: CompletionKind::Value,
            detail: None,
            documentation: info.description.clone(),
        }
    }
}

/// Everything completion needs besides the trigger.
#[derive(Clone, Copy)]
pub struct CompletionContext<'a> {
    pub ctx: &'a ResolutionContext,
    pub functions: &'a dyn FunctionTypeProvider,
    /// Literal property values collected while building `ctx`.
    pub values: &'a PropertyValueCollector,
    /// Kind of the value being edited.
    pub value_kind: ValueKind,
    /// Item owning unqualified metadata at the caret.
    pub item: Option<&'a str>,
    pub is_condition: bool,
}

/// Candidates for `trigger`, in lookup order.
pub fn completions(cx: &CompletionContext<'_>, trigger: &TriggerResult) -> Vec<CompletionItem> {
    let ctx = cx.ctx;
    let items = match &trigger.state {
        TriggerState::Value => value_completions(cx, trigger),
        TriggerState::PropertyName => properties(ctx),
        TriggerState::ItemName => items(ctx),
        TriggerState::MetadataOrItemName => {
            let mut out = metadata(ctx, cx.item);
            out.extend(items(ctx));
            out
        }
        TriggerState::QualifiedMetadataName { item } => metadata(ctx, Some(item)),
        TriggerState::PropertyFunctionName => functions(cx.functions.property_functions()),
        TriggerState::ItemFunctionName => functions(cx.functions.item_functions()),
        TriggerState::PropertyFunctionClassName => cx.functions.classes().iter().map(CompletionItem::from_class).collect(),
        TriggerState::PropertyFunctionStaticName { class } => functions(cx.functions.static_functions(class)),
        TriggerState::FunctionArgument => Vec::new(),
        TriggerState::DirectorySeparator => path_completions(ctx, trigger),
    };
    debug!("{} completion(s) for {:?}", items.len(), trigger.state);
    items
}

fn properties(ctx: &ResolutionContext) -> Vec<CompletionItem> {
    ctx.completion_properties()
        .into_iter()
        .map(|p| CompletionItem::from_symbol(p, CompletionKind::Property))
        .collect()
}

fn items(ctx: &ResolutionContext) -> Vec<CompletionItem> {
    ctx.completion_items()
        .into_iter()
        .map(|i| CompletionItem::from_symbol(i, CompletionKind::Item))
        .collect()
}

fn metadata(ctx: &ResolutionContext, item: Option<&str>) -> Vec<CompletionItem> {
    ctx.completion_metadata(item)
        .into_iter()
        .map(|m| CompletionItem::from_symbol(m, CompletionKind::Metadata))
        .collect()
}

fn functions(infos: &[FunctionInfo]) -> Vec<CompletionItem> {
    infos.iter().map(CompletionItem::from_function).collect()
}

fn value_completions(cx: &CompletionContext<'_>, trigger: &TriggerResult) -> Vec<CompletionItem> {
    let ctx = cx.ctx;
    if !trigger.comparands.is_empty() {
        return comparand_values(cx, &trigger.comparands);
    }

    let mut out: Vec<CompletionItem> = known_values(cx.value_kind)
        .unwrap_or(&[])
        .iter()
        .map(CompletionItem::from_constant)
        .collect();
    match cx.value_kind.base() {
        BaseKind::PropertyName => out.extend(properties(ctx)),
        BaseKind::ItemName => out.extend(items(ctx)),
        BaseKind::MetadataName => out.extend(metadata(ctx, cx.item)),
        BaseKind::TargetName => out.extend(
            ctx.completion_targets()
                .into_iter()
                .map(|t| CompletionItem::from_symbol(t, CompletionKind::Target)),
        ),
        BaseKind::TaskName => out.extend(
            ctx.completion_tasks()
                .into_iter()
                .map(|t| CompletionItem::from_symbol(t, CompletionKind::Task)),
        ),
        _ => {}
    }
    if cx.is_condition {
        out.extend(functions(cx.functions.condition_functions()));
    }
    out
}

/// Known and collected values of the properties a comparand is compared with.
fn comparand_values(cx: &CompletionContext<'_>, comparands: &[SmolStr]) -> Vec<CompletionItem> {
    let mut out: Vec<CompletionItem> = Vec::new();
    let mut push = |item: CompletionItem| {
        if !out.iter().any(|o| o.label.eq_ignore_ascii_case(&item.label)) {
            out.push(item);
        }
    };
    for name in comparands {
        let kind = cx
            .ctx
            .get_property(name)
            .map_or(ValueKind::UNKNOWN, |p| p.kind);
        for constant in known_values(kind).unwrap_or(&[]) {
            push(CompletionItem::from_constant(constant));
        }
        for value in cx.values.values(name) {
            let mut item = CompletionItem::new(value.clone(), CompletionKind::Value);
            item.detail = Some(SmolStr::new(format!("value of {name}")));
            push(item);
        }
    }
    out
}

/// Entries of the directory typed so far, relative to the file being edited.
fn path_completions(ctx: &ResolutionContext, trigger: &TriggerResult) -> Vec<CompletionItem> {
    let ExprKind::Text { value, .. } = &trigger.node.kind else {
        return Vec::new();
    };
    let Some(sep) = value.rfind(['/', '\\']) else {
        return Vec::new();
    };
    let typed = value[..sep].replace('\\', "/");
    let typed = Path::new(&typed);
    let dir = if typed.is_absolute() {
        typed.to_path_buf()
    } else {
        match ctx.file.parent() {
            Some(parent) => parent.join(typed),
            None => return Vec::new(),
        }
    };
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut out: Vec<CompletionItem> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let kind = if entry.file_type().ok()?.is_dir() {
                CompletionKind::Folder
            } else {
                CompletionKind::File
            };
            Some(CompletionItem::new(name, kind))
        })
        .collect();
    out.sort_by(|a, b| a.label.cmp(&b.label));
    out
}
