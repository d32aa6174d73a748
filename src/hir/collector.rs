//! Append-only record of literal property values seen during a build.
//!
//! Import path evaluation permutes over these values, and completion offers
//! them as comparands in conditions. Declared values are kept only for
//! properties that an import path references, plus a few configuration
//! properties that are almost always switched on. Condition comparisons are
//! always kept.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::{SymbolName, SymbolTable, SymbolTableExt};
use crate::syntax::{Expr, ExprKind};

/// Distinct values kept per property.
const MAX_VALUES_PER_PROPERTY: usize = 32;

/// Properties whose declared values are collected without being marked.
const ALWAYS_COLLECTED: &[&str] = &["Configuration", "Platform", "TargetFramework", "RuntimeIdentifier"];

#[derive(Clone, Debug, Default)]
pub struct PropertyValueCollector {
    /// Properties referenced by import paths.
    marked: FxHashSet<SymbolName>,
    values: SymbolTable<Vec<SmolStr>>,
}

impl PropertyValueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an import path depends on `name`.
    pub fn mark(&mut self, name: &str) {
        self.marked.insert(SymbolName::new(name));
    }

    /// Whether declared values of `name` are recorded.
    pub fn is_collected(&self, name: &str) -> bool {
        self.marked.contains(&SymbolName::new(name)) || ALWAYS_COLLECTED.iter().any(|p| p.eq_ignore_ascii_case(name))
    }

    /// Record a literal value. Values are deduplicated ignoring case.
    pub fn add(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let entry = self.values.entry(SymbolName::new(name)).or_default();
        if entry.len() < MAX_VALUES_PER_PROPERTY && !entry.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            entry.push(SmolStr::new(value));
        }
    }

    /// Record a declared property value when it is plain text and the
    /// property is collected.
    pub fn add_expression(&mut self, name: &str, expr: &Expr) {
        if !self.is_collected(name) {
            return;
        }
        if let ExprKind::Text { value, .. } = &expr.kind {
            self.add(name, value);
        }
    }

    /// Record `'$(Name)' == 'value'` comparisons in a condition.
    pub fn add_condition(&mut self, condition: &str) {
        for (property, value) in condition_comparisons(condition) {
            self.add(property, value);
        }
    }

    pub fn values(&self, name: &str) -> &[SmolStr] {
        self.values.get_named(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.marked.is_empty()
    }
}

/// Pairs of `(property, literal)` from `'$(P)' == 'lit'` style comparisons,
/// in either operand order.
fn condition_comparisons(condition: &str) -> Vec<(&str, &str)> {
    let operands = quoted_operands(condition);
    let mut out = Vec::new();
    for pair in operands.windows(2) {
        let (left, _, left_end) = pair[0];
        let (right, right_start, _) = pair[1];
        let between = condition.get(left_end..right_start).unwrap_or("").trim();
        if between != "==" && between != "!=" {
            continue;
        }
        match (lone_property(left), lone_property(right)) {
            (Some(p), None) if !right.contains("$(") => out.push((p, right)),
            (None, Some(p)) if !left.contains("$(") => out.push((p, left)),
            _ => {}
        }
    }
    out
}

/// Each `'...'` operand as (content, opening quote offset, offset past closing quote).
fn quoted_operands(condition: &str) -> Vec<(&str, usize, usize)> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(open) = condition[pos..].find('\'').map(|i| pos + i) {
        let Some(close) = condition[open + 1..].find('\'').map(|i| open + 1 + i) else {
            break;
        };
        out.push((&condition[open + 1..close], open, close + 1));
        pos = close + 1;
    }
    out
}

fn lone_property(operand: &str) -> Option<&str> {
    let inner = operand.trim().strip_prefix("$(")?.strip_suffix(')')?;
    (!inner.is_empty() && inner.chars().all(|c| c.is_alphanumeric() || c == '_')).then_some(inner)
}
