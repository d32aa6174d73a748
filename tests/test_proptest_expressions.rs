//! Property-based checks for the expression parser and trigger engine.
//!
//! Inputs are drawn from an alphabet rich in expression punctuation so that
//! references, calls, transforms, lists and truncated constructs all occur.
#![cfg(feature = "proptest")]

use msbuild::ide::{ListKind, TriggerReason, get_trigger_state};
use msbuild::syntax::ExprKind;
use msbuild::{ExpressionOptions, TextSize, parse_expression};
use proptest::prelude::*;

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

fn arb_expression_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_$@%().;,'\\[\\]:>\\- ]{0,32}"
}

fn arb_options() -> impl Strategy<Value = ExpressionOptions> {
    prop_oneof![
        Just(ExpressionOptions::NONE),
        Just(ExpressionOptions::ITEMS_AND_METADATA),
        Just(ExpressionOptions::ITEMS_METADATA_AND_LISTS),
        Just(ExpressionOptions::ITEMS_METADATA_AND_LISTS | ExpressionOptions::COMMA_LISTS),
    ]
}

fn arb_reason() -> impl Strategy<Value = TriggerReason> {
    prop_oneof![
        Just(TriggerReason::Explicit),
        Just(TriggerReason::Backspace),
        "[a-z$@%(.;'/*]".prop_map(|s| TriggerReason::TypedChar(s.chars().next().unwrap_or('a'))),
    ]
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parse_is_idempotent(text in arb_expression_text(), options in arb_options()) {
        let first = parse_expression(&text, options, TextSize::from(0));
        let second = parse_expression(&text, options, TextSize::from(0));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn node_ranges_stay_in_bounds(text in arb_expression_text(), options in arb_options(), base in 0u32..1000) {
        let expr = parse_expression(&text, options, TextSize::from(base));
        let end = TextSize::from(base + text.len() as u32);
        for node in expr.walk() {
            prop_assert!(node.range.start() >= TextSize::from(base));
            prop_assert!(node.range.end() <= end);
        }
    }

    #[test]
    fn text_and_name_nodes_reslice(text in arb_expression_text(), options in arb_options(), base in 0u32..1000) {
        let expr = parse_expression(&text, options, TextSize::from(base));
        for node in expr.walk() {
            let start = (u32::from(node.range.start()) - base) as usize;
            let end = (u32::from(node.range.end()) - base) as usize;
            match &node.kind {
                ExprKind::Text { value, .. } | ExprKind::Name(value) => {
                    prop_assert_eq!(&text[start..end], value.as_str());
                }
                _ => {}
            }
        }
    }

    #[test]
    fn at_most_one_error_node(text in arb_expression_text(), options in arb_options()) {
        let expr = parse_expression(&text, options, TextSize::from(0));
        prop_assert!(expr.walk().iter().filter(|n| n.is_error()).count() <= 1);
    }

    #[test]
    fn trigger_length_within_text(text in arb_expression_text(), reason in arb_reason(), is_condition in any::<bool>()) {
        if let Some(result) = get_trigger_state(&text, reason, is_condition, ListKind::SemicolonOrComma) {
            prop_assert!(result.length <= text.len());
        }
    }
}
