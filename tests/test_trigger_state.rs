//! Completion trigger classification matrix.

use msbuild::ide::{ListKind, TriggerReason, TriggerState, get_trigger_state};
use rstest::rstest;

fn classify(text: &str, reason: TriggerReason, list: ListKind) -> Option<(TriggerState, usize)> {
    get_trigger_state(text, reason, false, list).map(|r| (r.state, r.length))
}

#[rstest]
#[case("", TriggerReason::Explicit, Some((TriggerState::Value, 0)))]
#[case("$(", TriggerReason::Explicit, Some((TriggerState::PropertyName, 0)))]
#[case("$(a", TriggerReason::Explicit, Some((TriggerState::PropertyName, 1)))]
#[case("$(a-", TriggerReason::Explicit, None)]
#[case("$(", TriggerReason::TypedChar('('), Some((TriggerState::PropertyName, 0)))]
#[case("@(", TriggerReason::TypedChar('('), Some((TriggerState::ItemName, 0)))]
#[case("%(", TriggerReason::TypedChar('('), Some((TriggerState::MetadataOrItemName, 0)))]
#[case("$(Foo.", TriggerReason::TypedChar('.'), Some((TriggerState::PropertyFunctionName, 0)))]
#[case("@(Foo->", TriggerReason::TypedChar('>'), Some((TriggerState::ItemFunctionName, 0)))]
#[case("$([", TriggerReason::TypedChar('['), Some((TriggerState::PropertyFunctionClassName, 0)))]
#[case("$(", TriggerReason::Backspace, Some((TriggerState::PropertyName, 0)))]
#[case("$(a", TriggerReason::Backspace, None)]
#[case("a", TriggerReason::TypedChar('a'), Some((TriggerState::Value, 1)))]
#[case("ab", TriggerReason::TypedChar('b'), None)]
#[case("*", TriggerReason::TypedChar('*'), Some((TriggerState::Value, 1)))]
#[case("$(Foo.Bar(*", TriggerReason::TypedChar('*'), None)]
#[case("foo/", TriggerReason::TypedChar('/'), Some((TriggerState::DirectorySeparator, 0)))]
#[case("foo/b", TriggerReason::TypedChar('b'), Some((TriggerState::DirectorySeparator, 1)))]
#[case("a;", TriggerReason::TypedChar(';'), Some((TriggerState::Value, 0)))]
fn test_trigger_matrix(
    #[case] text: &str,
    #[case] reason: TriggerReason,
    #[case] expected: Option<(TriggerState, usize)>,
) {
    assert_eq!(classify(text, reason, ListKind::Semicolon), expected, "{text:?} {reason:?}");
}

#[test]
fn test_static_function_name() {
    let result = classify("$([System.IO.Path]::", TriggerReason::TypedChar(':'), ListKind::None);
    assert_eq!(
        result,
        Some((
            TriggerState::PropertyFunctionStaticName {
                class: "System.IO.Path".into()
            },
            0
        ))
    );
}

#[test]
fn test_qualified_metadata_name() {
    let result = classify("%(Compile.", TriggerReason::TypedChar('.'), ListKind::None);
    assert_eq!(
        result,
        Some((TriggerState::QualifiedMetadataName { item: "Compile".into() }, 0))
    );
}

#[test]
fn test_separator_needs_list_kind() {
    assert_eq!(classify("a,", TriggerReason::TypedChar(','), ListKind::None), None);
    assert_eq!(
        classify("a,", TriggerReason::TypedChar(','), ListKind::Comma),
        Some((TriggerState::Value, 0))
    );
}

#[test]
fn test_newline_never_triggers() {
    assert_eq!(classify("a", TriggerReason::TypedChar('\n'), ListKind::None), None);
}

#[test]
fn test_condition_comparands() {
    let result = get_trigger_state(
        "'$(Configuration)' == '",
        TriggerReason::TypedChar('\''),
        true,
        ListKind::Semicolon,
    )
    .expect("trigger");
    assert_eq!(result.state, TriggerState::Value);
    assert_eq!(result.length, 0);
    assert_eq!(result.comparands, ["Configuration"]);
}

#[test]
fn test_condition_ignores_list_separators() {
    let result = get_trigger_state("'a;", TriggerReason::TypedChar(';'), true, ListKind::Semicolon);
    assert!(result.is_none());
}
