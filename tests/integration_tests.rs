use std::collections::BTreeMap;

use binding_expr::{
    CompileConfig, CompileError, ConfigError, EvalError, JsonAccessor, ParseError, TransformError, Value,
    compile, compile_template,
    value::Function,
};
use serde_json::json;

fn hooks() -> Value {
    Value::object(BTreeMap::from([
        (
            "upper".to_string(),
            Value::Function(Function::native("upper", |_, args| {
                Ok(Value::String(
                    args.first().map(Value::to_js_string).unwrap_or_default().to_uppercase(),
                ))
            })),
        ),
        (
            "currency".to_string(),
            Value::Function(Function::native("currency", |_, args| {
                let amount = args.first().map(Value::to_number).unwrap_or(f64::NAN);
                let unit = args.get(1).map(Value::to_js_string).unwrap_or_else(|| "EUR".to_string());
                Ok(Value::String(format!("{} {}", amount, unit)))
            })),
        ),
        ("label".to_string(), Value::string("Total")),
    ]))
}

fn eval_expr(source: &str, scope: serde_json::Value) -> Result<Value, String> {
    let compiled = compile(source, &CompileConfig::default()).map_err(|e| e.to_string())?;
    let accessor = JsonAccessor::new().with("scope", scope);
    compiled
        .call(&accessor, &[hooks()])
        .map_err(|e| format!("{:?}", e))
}

fn eval_template(source: &str, scope: serde_json::Value) -> Result<Value, String> {
    let compiled = compile_template(source, &CompileConfig::default()).map_err(|e| e.to_string())?;
    let accessor = JsonAccessor::new().with("scope", scope);
    compiled
        .call(&accessor, &[hooks()])
        .map_err(|e| format!("{:?}", e))
}

fn doc() -> serde_json::Value {
    json!({
        "user": {"name": "Ada", "age": 36, "tags": ["admin", "dev"]},
        "items": [
            {"title": "pen", "price": 2, "done": true},
            {"title": "ink", "price": 5, "done": false},
            {"title": "pad", "price": 3, "done": true}
        ],
        "rate": 2,
        "ready": true,
        "empty": null
    })
}

#[test]
fn test_field_access() {
    assert_eq!(eval_expr("user.name", doc()).unwrap(), Value::string("Ada"));
    assert_eq!(eval_expr("user['age'] + 1", doc()).unwrap(), Value::Number(37.0));
    assert_eq!(eval_expr("user.tags[1]", doc()).unwrap(), Value::string("dev"));
    assert_eq!(eval_expr("items.length", doc()).unwrap(), Value::Number(3.0));
}

#[test]
fn test_missing_paths_are_undefined() {
    assert_eq!(eval_expr("missing.deep.path", doc()).unwrap(), Value::Undefined);
    assert_eq!(eval_expr("empty.x", doc()).unwrap(), Value::Undefined);
    assert_eq!(eval_expr("typeof missing", doc()).unwrap(), Value::string("undefined"));
}

#[test]
fn test_arithmetic_and_logic() {
    let test_cases = vec![
        ("1 + 2 * 3", Value::Number(7.0)),
        ("(1 + 2) * 3", Value::Number(9.0)),
        ("7 % 4", Value::Number(3.0)),
        ("'a' + 1", Value::string("a1")),
        ("'3' * '4'", Value::Number(12.0)),
        ("1 == '1'", Value::Boolean(true)),
        ("1 === '1'", Value::Boolean(false)),
        ("null == undefined", Value::Boolean(true)),
        ("ready && user.name", Value::string("Ada")),
        ("empty || 'fallback'", Value::string("fallback")),
        ("!ready", Value::Boolean(false)),
        ("'name' in user", Value::Boolean(true)),
        ("user.age > 30 ? 'senior' : 'junior'", Value::string("senior")),
        ("void 0", Value::Undefined),
        ("-user.age", Value::Number(-36.0)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_expr(input, doc()).unwrap(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_string_methods() {
    let test_cases = vec![
        ("user.name.toUpperCase()", Value::string("ADA")),
        ("user.name.slice(1)", Value::string("da")),
        ("user.name.indexOf('a')", Value::Number(2.0)),
        ("user.name.replace(/a/g, 'o')", Value::string("Ado")),
        ("user.name.replace(/(A)/, '[$1]')", Value::string("[A]da")),
        ("'a,b'.split(',').length", Value::Number(2.0)),
        ("/^a/i.test(user.name)", Value::Boolean(true)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_expr(input, doc()).unwrap(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_array_methods_with_arrows() {
    let test_cases = vec![
        ("items.filter(x => x.done).length", Value::Number(2.0)),
        (
            "items.map(x => x.price * rate).reduce((a, b) => a + b, 0)",
            Value::Number(20.0),
        ),
        ("items.find(x => !x.done).title", Value::string("ink")),
        ("items.some(x => x.price > 4)", Value::Boolean(true)),
        ("items.every(x => x.done)", Value::Boolean(false)),
        ("user.tags.join('/')", Value::string("admin/dev")),
        ("user.tags.includes('dev')", Value::Boolean(true)),
        ("items.map(x => x.title).slice(-1)[0]", Value::string("pad")),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_expr(input, doc()).unwrap(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_builtins() {
    let test_cases = vec![
        ("Math.max(user.age, 40)", Value::Number(40.0)),
        ("Math.round(2.5)", Value::Number(3.0)),
        ("parseInt('42px')", Value::Number(42.0)),
        ("JSON.stringify(user.tags)", Value::string(r#"["admin","dev"]"#)),
        ("Object.keys(user).length", Value::Number(3.0)),
        ("Array.isArray(items)", Value::Boolean(true)),
        ("isNaN(user.name * 1)", Value::Boolean(true)),
        ("encodeURIComponent('a b')", Value::string("a%20b")),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_expr(input, doc()).unwrap(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_unsupported_builtin() {
    let err = eval_expr("Promise.resolve(1)", doc()).unwrap_err();
    assert!(err.contains("Unsupported"), "{}", err);
}

#[test]
fn test_direct_hooks() {
    assert_eq!(eval_expr("upper(user.name)", doc()).unwrap(), Value::string("ADA"));
    assert_eq!(eval_expr("$hooks.label + ':'", doc()).unwrap(), Value::string("Total:"));
    assert_eq!(
        eval_expr("items[1].price | currency('USD')", doc()).unwrap(),
        Value::string("5 USD")
    );
    assert_eq!(
        eval_expr("user.name | upper", doc()).unwrap(),
        Value::string("ADA")
    );
}

#[test]
fn test_runtime_type_errors() {
    let err = eval_expr("nothing()", doc()).unwrap_err();
    assert!(err.contains("TypeError"), "{}", err);

    let err = eval_expr("$hooks.missing.x", doc()).unwrap_err();
    assert!(err.contains("Cannot read properties of undefined"), "{}", err);
}

// ============================================================================
// Compile Results
// ============================================================================

#[test]
fn test_compiled_parts() {
    let compiled = compile("user.name + upper($hooks.label)", &CompileConfig::default()).unwrap();
    assert_eq!(
        compiled.code,
        r#"$_get_by_any("scope", "user", "name") + $hooks.upper($hooks.label)"#
    );
    assert_eq!(compiled.watchers, vec!["scope.user.name".to_string()]);
    assert_eq!(
        compiled.parameters,
        vec!["$_get_by_any".to_string(), "$hooks".to_string()]
    );
}

#[test]
fn test_arity_is_checked() {
    let compiled = compile("1", &CompileConfig::default()).unwrap();
    let accessor = JsonAccessor::new();
    assert_eq!(
        compiled.call(&accessor, &[]),
        Err(EvalError::Arity {
            expected: 1,
            found: 0
        })
    );
}

#[test]
fn test_closure_accessor() {
    let compiled = compile("a.b + c[0]", &CompileConfig::default()).unwrap();
    let accessor = |tag: &str, keys: &[Value]| -> Result<Value, EvalError> {
        let keys: Vec<String> = keys.iter().map(Value::to_js_string).collect();
        Ok(Value::String(format!("<{}:{}>", tag, keys.join("."))))
    };
    assert_eq!(
        compiled.call(&accessor, &[Value::Undefined]).unwrap(),
        Value::string("<scope:a.b><scope:c.0>")
    );
}

#[test]
fn test_accessor_errors_propagate() {
    let compiled = compile("a", &CompileConfig::default()).unwrap();
    let accessor = |_: &str, _: &[Value]| -> Result<Value, EvalError> {
        Err(EvalError::Accessor("offline".to_string()))
    };
    assert_eq!(
        compiled.call(&accessor, &[Value::Undefined]),
        Err(EvalError::Accessor("offline".to_string()))
    );
}

#[test]
fn test_config_from_json() {
    let config = CompileConfig::from_json(
        r#"{
            "symbols": [
                {"symbol": "vm", "level": true},
                {"symbol": "fns", "direct": true},
                {"symbol": "store"}
            ],
            "call": "fns",
            "default": "vm",
            "dollar": "store"
        }"#,
    )
    .unwrap();

    let compiled = compile("fmt(x) + $count + $vm1.y", &config).unwrap();
    assert_eq!(
        compiled.code,
        r#"$fns.fmt($_get_by_any("vm", "x")) + $_get_by_any("store", "count") + $_get_by_any("vm1", "y")"#
    );
    assert_eq!(compiled.watchers, vec!["vm.x", "store.count", "vm1.y"]);
    assert_eq!(compiled.parameters, vec!["$_get_by_any", "$fns"]);
}

#[test]
fn test_compile_errors() {
    let config = CompileConfig::default();
    assert!(matches!(compile("a +", &config), Err(CompileError::Parse(_))));
    assert!(matches!(
        compile("$nope + 1", &config),
        Err(CompileError::Transform(TransformError::UnknownDollar { .. }))
    ));
    assert!(matches!(
        compile("a = 1", &config),
        Err(CompileError::Parse(ParseError::Lex(_)))
    ));

    let invalid = CompileConfig::new("scope", "hooks").symbol("scope");
    assert!(matches!(
        compile("a", &invalid),
        Err(CompileError::Config(ConfigError::UnknownSymbol { role: "call", .. }))
    ));
    assert!(matches!(
        CompileConfig::from_json("{\"symbols\": 1}"),
        Err(ConfigError::Json(_))
    ));
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_compile() {
    let compiled = compile_template("Hello ${user.name}, ${user.name | upper}!", &CompileConfig::default()).unwrap();
    assert_eq!(
        compiled.code,
        r#""Hello " + ($_get_by_any("scope", "user", "name")) + ", " + ($hooks.upper($_get_by_any("scope", "user", "name"))) + "!""#
    );
    assert_eq!(compiled.watchers, vec!["scope.user.name".to_string()]);
}

#[test]
fn test_template_shapes() {
    let config = CompileConfig::default();
    assert_eq!(compile_template("", &config).unwrap().code, r#""""#);
    assert_eq!(compile_template("static", &config).unwrap().code, r#""static""#);
    assert_eq!(
        compile_template("${rate}", &config).unwrap().code,
        r#"$_get_by_any("scope", "rate")"#
    );
}

#[test]
fn test_template_eval() {
    assert_eq!(
        eval_template("Hello ${user.name}!", doc()).unwrap(),
        Value::string("Hello Ada!")
    );
    assert_eq!(
        eval_template("${items.length} items, ${items.filter(x => x.done).length} done", doc()).unwrap(),
        Value::string("3 items, 2 done")
    );
    assert_eq!(
        eval_template("${ {a: '}'}.a }", doc()).unwrap(),
        Value::string("}")
    );
}

#[test]
fn test_template_errors() {
    let config = CompileConfig::default();
    assert!(matches!(
        compile_template("Hi ${name", &config),
        Err(CompileError::Template(_))
    ));
    assert!(matches!(
        compile_template("Hi ${a +}", &config),
        Err(CompileError::Parse(_))
    ));
}
