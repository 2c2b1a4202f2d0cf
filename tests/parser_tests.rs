// tests/parser_tests.rs

use binding_expr::ast::{BinOp, LiteralValue, Node, ObjectKey, PropertyKey, UnaryOp};
use binding_expr::lexer::LexError;
use binding_expr::parser::{ParseError, Parser, parse};

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
// Literals and Symbols
// ============================================================================

#[test]
fn test_parse_literals() {
    let test_cases = vec![
        ("42", LiteralValue::Number(42.0), "42"),
        ("0x10", LiteralValue::Number(16.0), "0x10"),
        ("'hi'", LiteralValue::String("hi".to_string()), "'hi'"),
        (r#""hi""#, LiteralValue::String("hi".to_string()), r#""hi""#),
        ("true", LiteralValue::Boolean(true), "true"),
        ("false", LiteralValue::Boolean(false), "false"),
        ("null", LiteralValue::Null, "null"),
        (
            "/a+/g",
            LiteralValue::Regex {
                pattern: "a+".to_string(),
                flags: "g".to_string(),
            },
            "/a+/g",
        ),
    ];

    for (input, expected, raw) in test_cases {
        match parse(input).unwrap() {
            Node::Literal(literal) => {
                assert_eq!(literal.value, expected, "Failed for input: {}", input);
                assert_eq!(literal.raw, raw, "Failed for input: {}", input);
            }
            other => panic!("Expected literal for {}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_parse_symbol() {
    assert_eq!(parse("user").unwrap(), sym("user"));
    assert_eq!(parse("$scope").unwrap(), sym("$scope"));
}

// ============================================================================
// Operators and Precedence
// ============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    assert_eq!(
        parse("a + b * c").unwrap(),
        binary(BinOp::Add, sym("a"), binary(BinOp::Multiply, sym("b"), sym("c")))
    );
}

#[test]
fn test_left_associativity() {
    assert_eq!(
        parse("a - b - c").unwrap(),
        binary(BinOp::Subtract, binary(BinOp::Subtract, sym("a"), sym("b")), sym("c"))
    );
}

#[test]
fn test_precedence_levels() {
    assert_eq!(
        parse("a || b && c == d < e + f * g").unwrap(),
        binary(
            BinOp::Or,
            sym("a"),
            binary(
                BinOp::And,
                sym("b"),
                binary(
                    BinOp::Equal,
                    sym("c"),
                    binary(
                        BinOp::LessThan,
                        sym("d"),
                        binary(BinOp::Add, sym("e"), binary(BinOp::Multiply, sym("f"), sym("g")))
                    )
                )
            )
        )
    );
}

#[test]
fn test_in_operator() {
    assert_eq!(
        parse("'a' in obj").unwrap(),
        binary(BinOp::In, parse("'a'").unwrap(), sym("obj"))
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        parse("-a * b").unwrap(),
        binary(BinOp::Multiply, unary(UnaryOp::Negate, sym("a")), sym("b"))
    );
    assert_eq!(
        parse("!!done").unwrap(),
        unary(UnaryOp::Not, unary(UnaryOp::Not, sym("done")))
    );
    assert_eq!(
        parse("typeof a === 'string'").unwrap(),
        binary(
            BinOp::StrictEqual,
            unary(UnaryOp::Typeof, sym("a")),
            parse("'string'").unwrap()
        )
    );
    assert_eq!(parse("void 0").unwrap(), unary(UnaryOp::Void, Node::number(0.0)));
    assert_eq!(parse("+x").unwrap(), unary(UnaryOp::Plus, sym("x")));
}

#[test]
fn test_parentheses_are_kept() {
    assert_eq!(
        parse("(a + b) * c").unwrap(),
        binary(
            BinOp::Multiply,
            Node::Parentheses(Box::new(binary(BinOp::Add, sym("a"), sym("b")))),
            sym("c")
        )
    );
}

#[test]
fn test_conditional_is_right_associative() {
    let expected = Node::Conditional {
        condition: Box::new(sym("a")),
        yes: Box::new(sym("b")),
        alternative: Box::new(Node::Conditional {
            condition: Box::new(sym("c")),
            yes: Box::new(sym("d")),
            alternative: Box::new(sym("e")),
        }),
    };
    assert_eq!(parse("a ? b : c ? d : e").unwrap(), expected);
}

#[test]
fn test_conditional_condition_takes_binary() {
    match parse("a || b ? 1 : 2").unwrap() {
        Node::Conditional { condition, .. } => {
            assert_eq!(*condition, binary(BinOp::Or, sym("a"), sym("b")));
        }
        other => panic!("Expected conditional, got {:?}", other),
    }
}

// ============================================================================
// Member Access and Calls
// ============================================================================

#[test]
fn test_member_chain() {
    let expected = Node::call(
        Node::Property {
            object: Box::new(Node::property(sym("a"), "b")),
            key: PropertyKey::Computed(Box::new(sym("c"))),
        },
        vec![sym("d")],
    );
    assert_eq!(parse("a.b[c](d)").unwrap(), expected);
}

#[test]
fn test_reserved_property_names() {
    assert_eq!(
        parse("a.class.new").unwrap(),
        Node::property(Node::property(sym("a"), "class"), "new")
    );
}

#[test]
fn test_call_arguments() {
    assert_eq!(parse("f()").unwrap(), Node::call(sym("f"), vec![]));
    assert_eq!(
        parse("f(1, x,)").unwrap(),
        Node::call(sym("f"), vec![Node::number(1.0), sym("x")])
    );
}

#[test]
fn test_property_name_required_after_dot() {
    assert!(matches!(
        parse("a.1"),
        Err(ParseError::UnexpectedToken { .. }) | Err(ParseError::Lex(_))
    ));
    assert!(matches!(parse("a.(b)"), Err(ParseError::UnexpectedToken { position: 2, .. })));
}

// ============================================================================
// Arrays and Objects
// ============================================================================

#[test]
fn test_array_literal() {
    assert_eq!(
        parse("[1, a, [b],]").unwrap(),
        Node::Array(vec![Node::number(1.0), sym("a"), Node::Array(vec![sym("b")])])
    );
    assert_eq!(parse("[]").unwrap(), Node::Array(vec![]));
}

#[test]
fn test_object_literal() {
    let Node::Object(properties) = parse(r#"{a: 1, "b-c": x, 3: y, true: z,}"#).unwrap() else {
        panic!("Expected object");
    };

    assert_eq!(properties.len(), 4);
    assert!(matches!(&properties[0].key, ObjectKey::Symbol(s) if s.name == "a"));
    assert!(matches!(&properties[1].key, ObjectKey::Literal(l) if l.raw == r#""b-c""#));
    assert!(matches!(&properties[2].key, ObjectKey::Literal(l) if l.value == LiteralValue::Number(3.0)));
    assert!(matches!(&properties[3].key, ObjectKey::Literal(l) if l.value == LiteralValue::Boolean(true)));
    assert_eq!(properties[1].value, sym("x"));
}

#[test]
fn test_object_literal_errors() {
    assert!(matches!(parse("{[a]: 1}"), Err(ParseError::InvalidObjectKey { position: 1 })));
    assert!(matches!(parse("{a}"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse("{a: 1 b: 2}"), Err(ParseError::UnexpectedToken { .. })));
}

// ============================================================================
// Arrow Functions
// ============================================================================

#[test]
fn test_single_param_arrow() {
    match parse("x => x * 2").unwrap() {
        Node::Arrow { params, body } => {
            assert_eq!(params.len(), 1);
            assert_eq!(params[0].name, "x");
            assert_eq!(*body, binary(BinOp::Multiply, sym("x"), Node::number(2.0)));
        }
        other => panic!("Expected arrow, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_arrow_params() {
    let test_cases = vec![("() => 1", 0), ("(a) => a", 1), ("(a, b) => a + b", 2)];

    for (input, count) in test_cases {
        match parse(input).unwrap() {
            Node::Arrow { params, .. } => assert_eq!(params.len(), count, "Failed for input: {}", input),
            other => panic!("Expected arrow for {}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_arrow_as_argument() {
    let ast = parse("items.filter(x => x.done).length").unwrap();
    let Node::Property { object, key } = ast else {
        panic!("Expected property");
    };
    assert_eq!(key, PropertyKey::Name("length".to_string()));

    let Node::Call { args, .. } = *object else {
        panic!("Expected call");
    };
    assert!(matches!(&args[0], Node::Arrow { .. }));
}

#[test]
fn test_arrow_body_is_conditional() {
    match parse("x => x ? 1 : 2").unwrap() {
        Node::Arrow { body, .. } => assert!(matches!(*body, Node::Conditional { .. })),
        other => panic!("Expected arrow, got {:?}", other),
    }
}

#[test]
fn test_invalid_arrow_params() {
    for input in ["(a.b) => 1", "(1) => 1", "(a, 'b') => 1"] {
        assert!(
            matches!(parse(input), Err(ParseError::InvalidArrowParams { position: 0 })),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_comma_expression_rejected() {
    assert!(matches!(parse("(a, b)"), Err(ParseError::CommaExpression { position: 0 })));
    assert!(matches!(parse("x + (a, b)"), Err(ParseError::CommaExpression { position: 4 })));
}

#[test]
fn test_empty_parentheses_need_arrow() {
    assert!(matches!(parse("()"), Err(ParseError::UnexpectedToken { .. })));
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_pipeline() {
    match parse("price | currency('EUR', 2) | upper").unwrap() {
        Node::Filter { expr, stages } => {
            assert_eq!(*expr, sym("price"));
            assert_eq!(stages.len(), 2);
            assert_eq!(stages[0].callee.name, "currency");
            assert_eq!(stages[0].args.len(), 2);
            assert_eq!(stages[1].callee.name, "upper");
            assert!(stages[1].args.is_empty());
        }
        other => panic!("Expected filter, got {:?}", other),
    }
}

#[test]
fn test_filter_input_is_full_expression() {
    match parse("a ? b : c | f").unwrap() {
        Node::Filter { expr, .. } => assert!(matches!(*expr, Node::Conditional { .. })),
        other => panic!("Expected filter, got {:?}", other),
    }
}

#[test]
fn test_invalid_filter_stages() {
    let test_cases = vec![("a | f.g", 4), ("a | 1", 4), ("a | f(1)(2)", 4)];

    for (input, position) in test_cases {
        match parse(input) {
            Err(ParseError::InvalidFilter { position: found }) => {
                assert_eq!(found, position, "Failed for input: {}", input)
            }
            other => panic!("Expected InvalidFilter for {}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_filter_only_at_top_level() {
    assert!(matches!(parse("(a | f)"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse("g(a | f)"), Err(ParseError::UnexpectedToken { .. })));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_trailing_tokens() {
    match parse("a b") {
        Err(err @ ParseError::UnexpectedToken { .. }) => {
            assert_eq!(
                err.to_string(),
                "Unexpected identifier 'b' at position 2, expected end of input"
            );
        }
        other => panic!("Expected UnexpectedToken, got {:?}", other),
    }
}

#[test]
fn test_lex_errors_propagate() {
    assert!(matches!(
        parse("a = 1"),
        Err(ParseError::Lex(LexError::OperatorNotAllowed { .. }))
    ));
    assert!(matches!(
        parse("this.x"),
        Err(ParseError::Lex(LexError::KeywordNotAllowed { .. }))
    ));
}

#[test]
fn test_incomplete_input() {
    for input in ["", "a +", "f(a", "[1, 2", "a ? b", "a ? b :"] {
        assert!(
            matches!(parse(input), Err(ParseError::UnexpectedToken { .. })),
            "Failed for input: {:?}",
            input
        );
    }
}

#[test]
fn test_parser_from_source() {
    let mut parser = Parser::from_source("a.b").unwrap();
    assert_eq!(parser.parse().unwrap(), Node::property(sym("a"), "b"));
}
