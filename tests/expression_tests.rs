//! Integration tests for `if` test expressions

use snippet_press::expr::{evaluate, TestExpression};
use snippet_press::Data;

fn user() -> Data {
    Data::new().with(
        "user",
        Data::new()
            .with("name", "Ada")
            .with("age", 36)
            .with("roles", vec!["admin", "dev"])
            .with("active", true),
    )
}

#[test]
fn test_comparisons_over_paths() {
    let data = user();
    let holds = |e: &str| evaluate(e, &data).expect("Should evaluate");

    assert!(holds("{{user.age}} >= 18"));
    assert!(holds("{{user.age}} == '36'"));
    assert!(!holds("{{user.age}} === '36'"));
    assert!(holds("'{{user.name}}' == 'Ada' && {{user.active}}"));
    assert!(holds("{{user.missing}} == undefined || false"));
    assert!(holds("!({{user.age}} < 30)"));
}

#[test]
fn test_substituted_strings_are_literals() {
    let data = Data::new().with("q", "1 == 1 || true");
    assert_eq!(evaluate("'{{q}}' == 'x'", &data).ok(), Some(false));
    assert_eq!(evaluate("'[{{q}}]' == '[1 == 1 || true]'", &data).ok(), Some(true));
}

#[test]
fn test_no_code_execution_syntax() {
    for expression in ["alert(1)", "{{a}}; true", "x = 1", "{{a}} + 1 > 0"] {
        assert!(
            evaluate(expression, &Data::new()).is_err(),
            "Expected {:?} to be rejected",
            expression
        );
    }
}

#[test]
fn test_error_report_names_expression() {
    let err = TestExpression::parse("({{a}} > 1").expect_err("Should fail");
    assert_eq!(err.expression, "({{a}} > 1");
    let report = err.format("if");
    assert!(report.contains("({{a}} > 1"));
}

#[test]
fn test_bare_references_must_be_boolean_true() {
    let data = user();
    assert_eq!(evaluate("{{user.active}}", &data).ok(), Some(true));
    assert_eq!(evaluate("{{user.age}}", &data).ok(), Some(false));
    assert_eq!(evaluate("{{user.name}}", &data).ok(), Some(false));
    assert_eq!(evaluate("{{user.age}} && true", &data).ok(), Some(true));
}
