// tests/codegen_tests.rs

use binding_expr::ast::{BinOp, Node, Symbol, UnaryOp};
use binding_expr::codegen::{GenerationError, generate};
use binding_expr::parser::parse;

fn print(source: &str) -> String {
    generate(&parse(source).unwrap()).unwrap()
}

fn binary(op: BinOp, left: Node, right: Node) -> Node {
    Node::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, expr: Node) -> Node {
    Node::Unary {
        op,
        expr: Box::new(expr),
    }
}

fn sym(name: &str) -> Node {
    Node::symbol(name)
}

// ============================================================================
// Canonical Spacing
// ============================================================================

#[test]
fn test_spacing_is_normalized() {
    let test_cases = vec![
        ("a+b*c", "a + b * c"),
        ("a  ===b", "a === b"),
        ("f( a,b )", "f(a, b)"),
        ("[1,2 ,3]", "[1, 2, 3]"),
        ("{a:1,'b':x}", "{a: 1, 'b': x}"),
        ("a?b:c", "a ? b : c"),
        ("a . b [ c ]", "a.b[c]"),
        ("'x' in  obj", "'x' in obj"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(print(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_leaves_keep_raw_text() {
    let test_cases = vec![
        r"'it\'s'",
        r#""tab\t""#,
        "0x1F",
        "017",
        "1.50",
        "1e3",
        "/a+[/]/gi",
        "null",
        "true",
    ];

    for input in test_cases {
        assert_eq!(print(input), input, "Failed for input: {}", input);
    }
}

#[test]
fn test_unary_spacing() {
    let test_cases = vec![
        ("!a", "!a"),
        ("!!a", "!!a"),
        ("!-a", "!-a"),
        ("-a", "-a"),
        ("- -a", "- -a"),
        ("+ +a", "+ +a"),
        ("-+a", "-+a"),
        ("-(-a)", "-(-a)"),
        ("typeof a", "typeof a"),
        ("void 0", "void 0"),
        ("typeof !a", "typeof !a"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(print(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_parsed_parentheses_round_trip() {
    let test_cases = vec!["(a + b) * c", "(a ? b : c).d", "!(a && b)", "((a))"];

    for input in test_cases {
        assert_eq!(print(input), input, "Failed for input: {}", input);
    }
}

// ============================================================================
// Arrow Functions
// ============================================================================

#[test]
fn test_arrows_print_as_functions() {
    let test_cases = vec![
        ("x => x * 2", "function(x){return x * 2}"),
        ("(a, b) => a + b", "function(a, b){return a + b}"),
        ("() => 1", "function(){return 1}"),
        (
            "items.map(x => x ? 1 : 2)",
            "items.map(function(x){return x ? 1 : 2})",
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(print(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Hand-built Trees
// ============================================================================

#[test]
fn test_precedence_parentheses_added() {
    let test_cases = vec![
        (
            binary(BinOp::Multiply, binary(BinOp::Add, sym("a"), sym("b")), sym("c")),
            "(a + b) * c",
        ),
        (
            binary(BinOp::Subtract, sym("a"), binary(BinOp::Subtract, sym("b"), sym("c"))),
            "a - (b - c)",
        ),
        (
            binary(BinOp::Subtract, binary(BinOp::Subtract, sym("a"), sym("b")), sym("c")),
            "a - b - c",
        ),
        (
            Node::property(binary(BinOp::Add, sym("a"), sym("b")), "c"),
            "(a + b).c",
        ),
        (
            unary(UnaryOp::Not, binary(BinOp::And, sym("a"), sym("b"))),
            "!(a && b)",
        ),
        (
            binary(
                BinOp::Add,
                Node::Conditional {
                    condition: Box::new(sym("a")),
                    yes: Box::new(sym("b")),
                    alternative: Box::new(sym("c")),
                },
                Node::number(1.0),
            ),
            "(a ? b : c) + 1",
        ),
        (
            unary(UnaryOp::Negate, unary(UnaryOp::Negate, sym("a"))),
            "- -a",
        ),
    ];

    for (node, expected) in test_cases {
        assert_eq!(generate(&node).unwrap(), expected);
    }
}

#[test]
fn test_nested_conditional_condition() {
    let inner = Node::Conditional {
        condition: Box::new(sym("a")),
        yes: Box::new(sym("b")),
        alternative: Box::new(sym("c")),
    };
    let outer = Node::Conditional {
        condition: Box::new(inner.clone()),
        yes: Box::new(sym("d")),
        alternative: Box::new(inner),
    };
    assert_eq!(generate(&outer).unwrap(), "(a ? b : c) ? d : a ? b : c");
}

#[test]
fn test_arrow_callee_is_wrapped() {
    let arrow = Node::Arrow {
        params: vec![Symbol::new("x")],
        body: Box::new(sym("x")),
    };
    let call = Node::call(arrow, vec![Node::number(1.0)]);
    assert_eq!(generate(&call).unwrap(), "(function(x){return x})(1)");
}

#[test]
fn test_built_leaves() {
    assert_eq!(generate(&Node::string("a\"b")).unwrap(), r#""a\"b""#);
    assert_eq!(generate(&Node::number(1.5)).unwrap(), "1.5");
    assert_eq!(generate(&Node::number(-0.25)).unwrap(), "-0.25");
    assert_eq!(generate(&Node::property(sym("a"), "b-c")).unwrap(), r#"a["b-c"]"#);
    assert_eq!(generate(&Node::property(sym("a"), "$b_1")).unwrap(), "a.$b_1");
}

#[test]
fn test_filter_is_not_printable() {
    let ast = parse("a | f").unwrap();
    assert_eq!(
        generate(&ast),
        Err(GenerationError::UnsupportedNode { kind: "Filter" })
    );
}
