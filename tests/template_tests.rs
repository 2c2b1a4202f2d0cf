// tests/template_tests.rs

use binding_expr::template::{Segment, TemplateError, extract, split};

fn literal(text: &str) -> Segment {
    Segment::Literal(text.to_string())
}

fn expression(code: &str) -> Segment {
    Segment::Expression(code.to_string())
}

// ============================================================================
// Splitting
// ============================================================================

#[test]
fn test_split_segments() {
    let test_cases = vec![
        ("", vec![]),
        ("plain", vec![literal("plain")]),
        ("${a}", vec![expression("a")]),
        (
            "Hello ${name}!",
            vec![literal("Hello "), expression("name"), literal("!")],
        ),
        ("${a}${b}", vec![expression("a"), expression("b")]),
        ("cost: $5 {x}", vec![literal("cost: $5 {x}")]),
    ];

    for (input, expected) in test_cases {
        assert_eq!(split(input).unwrap(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_nested_braces() {
    assert_eq!(
        split("${ {a: {b: 1}}[k] } end").unwrap(),
        vec![expression(" {a: {b: 1}}[k] "), literal(" end")]
    );
}

#[test]
fn test_braces_inside_strings() {
    assert_eq!(
        split(r#"${ "}" + a }x"#).unwrap(),
        vec![expression(r#" "}" + a "#), literal("x")]
    );
    assert_eq!(
        split(r#"${ 'a\'}' }"#).unwrap(),
        vec![expression(r#" 'a\'}' "#)]
    );
}

#[test]
fn test_braces_inside_regex() {
    assert_eq!(
        split("${ /}/.test(a) }").unwrap(),
        vec![expression(" /}/.test(a) ")]
    );
    assert_eq!(
        split(r"${ s.replace(/[}\/]/g, '') }").unwrap(),
        vec![expression(r" s.replace(/[}\/]/g, '') ")]
    );
}

#[test]
fn test_division_is_not_regex() {
    assert_eq!(
        split("${a / b}/${c}").unwrap(),
        vec![expression("a / b"), literal("/"), expression("c")]
    );
}

#[test]
fn test_unterminated_span() {
    let test_cases = vec![("abc ${a", 4), ("${ '}' ", 0), ("${ {a: 1} ", 0)];

    for (input, position) in test_cases {
        assert_eq!(
            split(input),
            Err(TemplateError::Unterminated { position }),
            "Failed for input: {}",
            input
        );
    }
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn test_extract() {
    let test_cases = vec![
        ("", r#""""#),
        ("plain", r#""plain""#),
        ("${a.b}", "a.b"),
        ("aaa${bbb}${ccc()}", r#""aaa" + (bbb) + (ccc())"#),
        ("Hello ${name}!", r#""Hello " + (name) + "!""#),
        (r#"say "hi" ${x}"#, r#""say \"hi\" " + (x)"#),
        ("${a ? 1 : 2}px", r#"(a ? 1 : 2) + "px""#),
    ];

    for (input, expected) in test_cases {
        assert_eq!(extract(input).unwrap(), expected, "Failed for input: {}", input);
    }
}
