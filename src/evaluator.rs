use std::{collections::BTreeMap, rc::Rc};

use thiserror::Error;

use crate::{
    ast::{BinOp, LiteralValue, Node, ObjectKey, PropertyKey, UnaryOp},
    transform::ACCESSOR,
    value::{Closure, Function, JsRegex, Value, number_to_string},
};

/// Errors that can occur while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Invalid operation for the given value
    #[error("Type error: {0}")]
    TypeError(String),

    /// Name with no binding
    #[error("Reference error: {0} is not defined")]
    ReferenceError(String),

    /// Built-in that has no runtime counterpart
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid regular expression /{pattern}/: {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Wrong number of direct values passed to a compiled expression
    #[error("Expected {expected} direct values, got {found}")]
    Arity { expected: usize, found: usize },

    /// Failure reported by the host accessor
    #[error("Accessor error: {0}")]
    Accessor(String),
}

/// Host side of `$_get_by_any(typeTag, ...keys)`.
pub trait Accessor {
    fn get(&self, type_tag: &str, keys: &[Value]) -> Result<Value, EvalError>;
}

impl<F> Accessor for F
where
    F: Fn(&str, &[Value]) -> Result<Value, EvalError>,
{
    fn get(&self, type_tag: &str, keys: &[Value]) -> Result<Value, EvalError> {
        self(type_tag, keys)
    }
}

/// Accessor over one JSON document per type tag.
///
/// Walking past a missing or `null` value yields `undefined` rather than an
/// error.
#[derive(Debug, Clone, Default)]
pub struct JsonAccessor {
    roots: BTreeMap<String, Value>,
}

impl JsonAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_tag: impl Into<String>, document: serde_json::Value) {
        self.roots.insert(type_tag.into(), Value::from(document));
    }

    pub fn with(mut self, type_tag: impl Into<String>, document: serde_json::Value) -> Self {
        self.insert(type_tag, document);
        self
    }
}

impl Accessor for JsonAccessor {
    fn get(&self, type_tag: &str, keys: &[Value]) -> Result<Value, EvalError> {
        let mut current = self.roots.get(type_tag).cloned().unwrap_or(Value::Undefined);
        for key in keys {
            if current.is_nullish() {
                return Ok(Value::Undefined);
            }
            current = get_member(&current, key)?;
        }
        Ok(current)
    }
}

/// Local bindings introduced by arrow function parameters.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub locals: BTreeMap<String, Value>,
}

/// Tree-walking interpreter for transformed expressions.
///
/// Reads of non-direct symbols go through the [`Accessor`]; direct symbols
/// are bound by name (including the `$`) with [`Evaluator::bind`].
///
/// # Examples
///
/// ```
/// use binding_expr::evaluator::{Evaluator, JsonAccessor};
/// use binding_expr::parser::parse;
/// use binding_expr::Value;
/// use serde_json::json;
///
/// let accessor = JsonAccessor::new().with("scope", json!({"price": 40}));
/// let ast = parse(r#"$_get_by_any("scope", "price") * 2"#).unwrap();
///
/// let result = Evaluator::new(&accessor).eval(&ast).unwrap();
/// assert_eq!(result, Value::Number(80.0));
/// ```
pub struct Evaluator<'a> {
    accessor: &'a dyn Accessor,
    direct: BTreeMap<String, Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(accessor: &'a dyn Accessor) -> Self {
        Evaluator {
            accessor,
            direct: BTreeMap::new(),
        }
    }

    /// Binds a direct symbol, e.g. `$hooks`.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.direct.insert(name.into(), value);
    }

    pub fn eval(&self, node: &Node) -> Result<Value, EvalError> {
        self.eval_node(node, &EvalContext::default())
    }

    fn eval_node(&self, node: &Node, ctx: &EvalContext) -> Result<Value, EvalError> {
        match node {
            Node::Conditional {
                condition,
                yes,
                alternative,
            } => {
                if self.eval_node(condition, ctx)?.is_truthy() {
                    self.eval_node(yes, ctx)
                } else {
                    self.eval_node(alternative, ctx)
                }
            }
            Node::Unary { op, expr } => {
                let value = self.eval_node(expr, ctx)?;
                Ok(apply_unary(*op, &value))
            }
            Node::Binary { op, left, right } => {
                let left = self.eval_node(left, ctx)?;
                match op {
                    BinOp::And if !left.is_truthy() => Ok(left),
                    BinOp::Or if left.is_truthy() => Ok(left),
                    BinOp::And | BinOp::Or => self.eval_node(right, ctx),
                    _ => {
                        let right = self.eval_node(right, ctx)?;
                        apply_binop(*op, &left, &right)
                    }
                }
            }
            Node::Property { object, key } => {
                let object = self.eval_node(object, ctx)?;
                let key = self.eval_key(key, ctx)?;
                get_member(&object, &key)
            }
            Node::Literal(literal) => match &literal.value {
                LiteralValue::String(s) => Ok(Value::String(s.clone())),
                LiteralValue::Number(n) => Ok(Value::Number(*n)),
                LiteralValue::Boolean(b) => Ok(Value::Boolean(*b)),
                LiteralValue::Null => Ok(Value::Null),
                LiteralValue::Regex { pattern, flags } => {
                    Ok(Value::Regex(Rc::new(compile_regex(pattern, flags)?)))
                }
            },
            Node::Symbol(symbol) => self.lookup(&symbol.name, ctx),
            Node::Call { callee, args } => self.eval_call(callee, args, ctx),
            Node::Array(elements) => Ok(Value::array(self.eval_args(elements, ctx)?)),
            Node::Object(properties) => {
                let mut entries = BTreeMap::new();
                for property in properties {
                    let key = match &property.key {
                        ObjectKey::Symbol(symbol) => symbol.name.clone(),
                        ObjectKey::Literal(literal) => match &literal.value {
                            LiteralValue::String(s) => s.clone(),
                            LiteralValue::Number(n) => number_to_string(*n),
                            _ => literal.raw.clone(),
                        },
                    };
                    entries.insert(key, self.eval_node(&property.value, ctx)?);
                }
                Ok(Value::object(entries))
            }
            Node::Parentheses(inner) => self.eval_node(inner, ctx),
            Node::Filter { .. } => Err(EvalError::Unsupported(
                "filter pipelines must be transformed before evaluation".to_string(),
            )),
            Node::Arrow { params, body } => Ok(Value::Function(Function::Closure(Rc::new(Closure {
                params: params.iter().map(|p| p.name.clone()).collect(),
                body: body.as_ref().clone(),
                captured: ctx.locals.clone(),
            })))),
        }
    }

    fn eval_key(&self, key: &PropertyKey, ctx: &EvalContext) -> Result<Value, EvalError> {
        match key {
            PropertyKey::Name(name) => Ok(Value::String(name.clone())),
            PropertyKey::Computed(expr) => self.eval_node(expr, ctx),
        }
    }

    fn eval_args(&self, args: &[Node], ctx: &EvalContext) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|arg| self.eval_node(arg, ctx)).collect()
    }

    fn lookup(&self, name: &str, ctx: &EvalContext) -> Result<Value, EvalError> {
        if let Some(value) = ctx.locals.get(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.direct.get(name) {
            return Ok(value.clone());
        }
        match global(name)? {
            Some(value) => Ok(value),
            None => Err(EvalError::ReferenceError(name.to_string())),
        }
    }

    fn eval_call(&self, callee: &Node, args: &[Node], ctx: &EvalContext) -> Result<Value, EvalError> {
        match callee {
            Node::Symbol(symbol) if symbol.name == ACCESSOR && !ctx.locals.contains_key(ACCESSOR) => {
                let args = self.eval_args(args, ctx)?;
                let Some((tag, keys)) = args.split_first() else {
                    return Err(EvalError::TypeError(format!("{}() requires a type tag", ACCESSOR)));
                };
                self.accessor.get(&tag.to_js_string(), keys)
            }
            Node::Property { object, key } => {
                let this = self.eval_node(object, ctx)?;
                let key = self.eval_key(key, ctx)?;
                let args = self.eval_args(args, ctx)?;

                let name = key.to_js_string();
                if let Some(result) = self.call_method(&this, &name, &args)? {
                    return Ok(result);
                }
                let func = get_member(&this, &key)?;
                self.call_value(&func, &this, &args, &name)
            }
            _ => {
                let func = self.eval_node(callee, ctx)?;
                let args = self.eval_args(args, ctx)?;
                self.call_value(&func, &Value::Undefined, &args, callee.kind_name())
            }
        }
    }

    fn call_value(&self, func: &Value, this: &Value, args: &[Value], name: &str) -> Result<Value, EvalError> {
        match func {
            Value::Function(func) => self.call_function(func, this, args),
            _ => Err(EvalError::TypeError(format!("{} is not a function", name))),
        }
    }

    /// Calls a native function or an arrow closure.
    pub fn call_function(&self, func: &Function, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
        match func {
            Function::Native { func, .. } => func(this, args),
            Function::Closure(closure) => {
                let mut locals = closure.captured.clone();
                for (i, param) in closure.params.iter().enumerate() {
                    locals.insert(param.clone(), args.get(i).cloned().unwrap_or(Value::Undefined));
                }
                self.eval_node(&closure.body, &EvalContext { locals })
            }
        }
    }

    /// Built-in string, array and regex methods. `None` when `this` has no
    /// built-in method called `name`.
    fn call_method(&self, this: &Value, name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
        let result = match this {
            Value::String(s) => self.string_method(s, name, args)?,
            Value::Array(items) => self.array_method(this, items, name, args)?,
            Value::Regex(re) => match name {
                "test" => Some(Value::Boolean(re.regex.is_match(&arg(args, 0).to_js_string()))),
                _ => None,
            },
            _ => None,
        };
        Ok(result)
    }

    fn string_method(&self, s: &str, name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
        let result = match name {
            "toUpperCase" => Value::String(s.to_uppercase()),
            "toLowerCase" => Value::String(s.to_lowercase()),
            "trim" => Value::string(s.trim()),
            "includes" => Value::Boolean(s.contains(&arg(args, 0).to_js_string())),
            "startsWith" => Value::Boolean(s.starts_with(&arg(args, 0).to_js_string())),
            "endsWith" => Value::Boolean(s.ends_with(&arg(args, 0).to_js_string())),
            "indexOf" => {
                let needle = arg(args, 0).to_js_string();
                let index = s.find(&needle).map(|b| s[..b].chars().count() as f64);
                Value::Number(index.unwrap_or(-1.0))
            }
            "slice" => {
                let chars: Vec<char> = s.chars().collect();
                let start = relative_index(args.first(), chars.len(), 0);
                let end = relative_index(args.get(1), chars.len(), chars.len());
                Value::String(chars.get(start..end.max(start)).unwrap_or_default().iter().collect())
            }
            "split" => {
                let parts: Vec<Value> = match arg(args, 0) {
                    Value::Undefined => vec![Value::string(s)],
                    Value::Regex(re) => re.regex.split(s).map(Value::string).collect(),
                    separator => {
                        let separator = separator.to_js_string();
                        if separator.is_empty() {
                            s.chars().map(|c| Value::String(c.to_string())).collect()
                        } else {
                            s.split(separator.as_str()).map(Value::string).collect()
                        }
                    }
                };
                Value::array(parts)
            }
            "replace" => self.string_replace(s, &arg(args, 0), &arg(args, 1))?,
            "concat" => {
                let mut out = s.to_string();
                for a in args {
                    out.push_str(&a.to_js_string());
                }
                Value::String(out)
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn string_replace(&self, s: &str, pattern: &Value, replacement: &Value) -> Result<Value, EvalError> {
        let mut out = String::new();
        let mut last = 0;

        match pattern {
            Value::Regex(re) => {
                let global = re.flags.contains('g');
                for caps in re.regex.captures_iter(s) {
                    let Some(m) = caps.get(0) else {
                        continue;
                    };
                    out.push_str(&s[last..m.start()]);
                    match replacement {
                        Value::Function(f) => {
                            let replaced = self.call_function(f, &Value::Undefined, &[Value::string(m.as_str())])?;
                            out.push_str(&replaced.to_js_string());
                        }
                        other => caps.expand(&other.to_js_string(), &mut out),
                    }
                    last = m.end();
                    if !global {
                        break;
                    }
                }
            }
            other => {
                let needle = other.to_js_string();
                if let Some(start) = s.find(&needle) {
                    out.push_str(&s[..start]);
                    match replacement {
                        Value::Function(f) => {
                            let replaced = self.call_function(f, &Value::Undefined, &[Value::string(needle.as_str())])?;
                            out.push_str(&replaced.to_js_string());
                        }
                        other => out.push_str(&other.to_js_string()),
                    }
                    last = start + needle.len();
                }
            }
        }

        out.push_str(&s[last..]);
        Ok(Value::String(out))
    }

    fn array_method(
        &self,
        this: &Value,
        items: &[Value],
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EvalError> {
        let result = match name {
            "map" => {
                let f = callback(args, name)?;
                let mut mapped = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    mapped.push(self.call_function(f, &Value::Undefined, &[item.clone(), Value::Number(i as f64), this.clone()])?);
                }
                Value::array(mapped)
            }
            "filter" => {
                let f = callback(args, name)?;
                let mut kept = vec![];
                for (i, item) in items.iter().enumerate() {
                    if self.call_function(f, &Value::Undefined, &[item.clone(), Value::Number(i as f64), this.clone()])?.is_truthy() {
                        kept.push(item.clone());
                    }
                }
                Value::array(kept)
            }
            "some" | "every" | "find" | "findIndex" => {
                let f = callback(args, name)?;
                let mut found = None;
                for (i, item) in items.iter().enumerate() {
                    let hit = self
                        .call_function(f, &Value::Undefined, &[item.clone(), Value::Number(i as f64), this.clone()])?
                        .is_truthy();
                    // `every` stops on the first miss, the others on the first hit.
                    if hit != (name == "every") {
                        found = Some((i, item));
                        break;
                    }
                }
                match (name, found) {
                    ("some", found) => Value::Boolean(found.is_some()),
                    ("every", found) => Value::Boolean(found.is_none()),
                    ("find", Some((_, item))) => item.clone(),
                    ("find", None) => Value::Undefined,
                    (_, Some((i, _))) => Value::Number(i as f64),
                    (_, None) => Value::Number(-1.0),
                }
            }
            "reduce" => {
                let f = callback(args, name)?;
                let mut iter = items.iter().enumerate();
                let mut acc = match args.get(1) {
                    Some(initial) => initial.clone(),
                    None => match iter.next() {
                        Some((_, first)) => first.clone(),
                        None => {
                            return Err(EvalError::TypeError(
                                "Reduce of empty array with no initial value".to_string(),
                            ));
                        }
                    },
                };
                for (i, item) in iter {
                    acc = self.call_function(f, &Value::Undefined, &[acc, item.clone(), Value::Number(i as f64), this.clone()])?;
                }
                acc
            }
            "includes" => {
                let needle = arg(args, 0);
                Value::Boolean(items.iter().any(|item| same_value_zero(item, &needle)))
            }
            "indexOf" => {
                let needle = arg(args, 0);
                let index = items.iter().position(|item| item.strict_equals(&needle));
                Value::Number(index.map(|i| i as f64).unwrap_or(-1.0))
            }
            "join" => {
                let separator = match arg(args, 0) {
                    Value::Undefined => ",".to_string(),
                    other => other.to_js_string(),
                };
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                    .collect();
                Value::String(parts.join(&separator))
            }
            "slice" => {
                let start = relative_index(args.first(), items.len(), 0);
                let end = relative_index(args.get(1), items.len(), items.len());
                Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
            }
            "concat" => {
                let mut joined = items.to_vec();
                for a in args {
                    match a {
                        Value::Array(more) => joined.extend(more.iter().cloned()),
                        other => joined.push(other.clone()),
                    }
                }
                Value::array(joined)
            }
            "reverse" => Value::array(items.iter().rev().cloned().collect()),
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn callback<'v>(args: &'v [Value], method: &str) -> Result<&'v Function, EvalError> {
    match args.first() {
        Some(Value::Function(f)) => Ok(f),
        _ => Err(EvalError::TypeError(format!(".{}() requires a function argument", method))),
    }
}

/// Resolves a possibly negative `slice` bound against `len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    let n = match value {
        None | Some(Value::Undefined) => return default,
        Some(v) => v.to_number(),
    };
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

/// Canonical array index spelling (`"0"`, `"12"`, not `"01"`).
fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

/// `object[key]`. Reading from `undefined` or `null` is a type error; a
/// missing property is `undefined`.
pub fn get_member(object: &Value, key: &Value) -> Result<Value, EvalError> {
    let name = key.to_js_string();
    if object.is_nullish() {
        return Err(EvalError::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            object.to_js_string(),
            name
        )));
    }

    let value = match object {
        Value::String(s) => match (name.as_str(), array_index(&name)) {
            ("length", _) => Value::Number(s.chars().count() as f64),
            (_, Some(i)) => s
                .chars()
                .nth(i)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        },
        Value::Array(items) => match (name.as_str(), array_index(&name)) {
            ("length", _) => Value::Number(items.len() as f64),
            (_, Some(i)) => items.get(i).cloned().unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        },
        Value::Object(entries) => entries.get(&name).cloned().unwrap_or(Value::Undefined),
        Value::Regex(re) => match name.as_str() {
            "source" => Value::String(re.source.clone()),
            "flags" => Value::String(re.flags.clone()),
            "global" => Value::Boolean(re.flags.contains('g')),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    };
    Ok(value)
}

fn apply_unary(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Boolean(!value.is_truthy()),
        UnaryOp::Negate => Value::Number(-value.to_number()),
        UnaryOp::Plus => Value::Number(value.to_number()),
        UnaryOp::Typeof => Value::string(value.type_of()),
        UnaryOp::Void => Value::Undefined,
    }
}

fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Regex(_) | Value::Function(_) => {
            Value::String(value.to_js_string())
        }
        other => other.clone(),
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let result = match op {
        BinOp::Add => {
            let (l, r) = (to_primitive(left), to_primitive(right));
            if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                Value::String(format!("{}{}", l.to_js_string(), r.to_js_string()))
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinOp::Modulo => Value::Number(left.to_number() % right.to_number()),
        BinOp::Equal => Value::Boolean(left.loose_equals(right)),
        BinOp::NotEqual => Value::Boolean(!left.loose_equals(right)),
        BinOp::StrictEqual => Value::Boolean(left.strict_equals(right)),
        BinOp::StrictNotEqual => Value::Boolean(!left.strict_equals(right)),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            Value::Boolean(compare(op, left, right))
        }
        BinOp::In => {
            let key = left.to_js_string();
            match right {
                Value::Object(entries) => Value::Boolean(entries.contains_key(&key)),
                Value::Array(items) => Value::Boolean(
                    key == "length" || array_index(&key).is_some_and(|i| i < items.len()),
                ),
                other => {
                    return Err(EvalError::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key,
                        other.to_js_string()
                    )));
                }
            }
        }
        BinOp::And | BinOp::Or => {
            if (op == BinOp::And) == left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
    };
    Ok(result)
}

fn compare(op: BinOp, left: &Value, right: &Value) -> bool {
    let (l, r) = (to_primitive(left), to_primitive(right));
    if let (Value::String(a), Value::String(b)) = (&l, &r) {
        return match op {
            BinOp::LessThan => a < b,
            BinOp::GreaterThan => a > b,
            BinOp::LessEqual => a <= b,
            _ => a >= b,
        };
    }

    let (a, b) = (l.to_number(), r.to_number());
    match op {
        BinOp::LessThan => a < b,
        BinOp::GreaterThan => a > b,
        BinOp::LessEqual => a <= b,
        _ => a >= b,
    }
}

/// Compiles a regex literal. `i`, `m` and `s` become inline flags; the
/// remaining JS flags do not change matching here.
pub fn compile_regex(pattern: &str, flags: &str) -> Result<JsRegex, EvalError> {
    let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
    let source = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", inline, pattern)
    };

    let regex = regex::Regex::new(&source).map_err(|e| EvalError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(JsRegex {
        source: pattern.to_string(),
        flags: flags.to_string(),
        regex,
    })
}

// Built-in globals

fn native<F>(name: &'static str, func: F) -> Value
where
    F: Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static,
{
    Value::Function(Function::native(name, func))
}

fn number_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map(Value::to_number).unwrap_or(f64::NAN)
}

/// Value of a built-in global. Globals without a runtime counterpart are
/// [`EvalError::Unsupported`].
fn global(name: &str) -> Result<Option<Value>, EvalError> {
    let value = match name {
        "undefined" => Value::Undefined,
        "NaN" => Value::Number(f64::NAN),
        "Infinity" => Value::Number(f64::INFINITY),
        "isNaN" => native("isNaN", |_, args| Ok(Value::Boolean(number_arg(args, 0).is_nan()))),
        "isFinite" => native("isFinite", |_, args| Ok(Value::Boolean(number_arg(args, 0).is_finite()))),
        "parseInt" => native("parseInt", |_, args| {
            let radix = args.get(1).map(Value::to_number);
            Ok(Value::Number(parse_int(&arg(args, 0).to_js_string(), radix)))
        }),
        "parseFloat" => native("parseFloat", |_, args| {
            Ok(Value::Number(parse_float(&arg(args, 0).to_js_string())))
        }),
        "encodeURIComponent" => native("encodeURIComponent", |_, args| {
            Ok(Value::String(encode_uri_component(&arg(args, 0).to_js_string())))
        }),
        "decodeURIComponent" => native("decodeURIComponent", |_, args| {
            decode_uri_component(&arg(args, 0).to_js_string()).map(Value::String)
        }),
        "Number" => native("Number", |_, args| {
            Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0)))
        }),
        "String" => native("String", |_, args| {
            Ok(Value::String(args.first().map(Value::to_js_string).unwrap_or_default()))
        }),
        "Boolean" => native("Boolean", |_, args| Ok(Value::Boolean(arg(args, 0).is_truthy()))),
        "Math" => math(),
        "JSON" => json(),
        "Object" => object(),
        "Array" => Value::object(BTreeMap::from([(
            "isArray".to_string(),
            native("isArray", |_, args| Ok(Value::Boolean(matches!(arg(args, 0), Value::Array(_))))),
        )])),
        "Promise" | "Symbol" | "Error" | "RegExp" | "encodeURI" | "decodeURI" => {
            return Err(EvalError::Unsupported(format!("{} is not available", name)));
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn js_round(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn js_sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 { n } else { n.signum() }
}

fn math() -> Value {
    let unary: [(&'static str, fn(f64) -> f64); 7] = [
        ("abs", f64::abs),
        ("ceil", f64::ceil),
        ("floor", f64::floor),
        ("round", js_round),
        ("sqrt", f64::sqrt),
        ("trunc", f64::trunc),
        ("sign", js_sign),
    ];

    let mut entries = BTreeMap::new();
    for (name, f) in unary {
        entries.insert(
            name.to_string(),
            native(name, move |_, args| Ok(Value::Number(f(number_arg(args, 0))))),
        );
    }
    entries.insert(
        "max".to_string(),
        native("max", |_, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(f64::NEG_INFINITY, |acc, n| {
                if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.max(n) }
            })))
        }),
    );
    entries.insert(
        "min".to_string(),
        native("min", |_, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(f64::INFINITY, |acc, n| {
                if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.min(n) }
            })))
        }),
    );
    entries.insert(
        "pow".to_string(),
        native("pow", |_, args| Ok(Value::Number(number_arg(args, 0).powf(number_arg(args, 1))))),
    );
    entries.insert("PI".to_string(), Value::Number(std::f64::consts::PI));
    entries.insert("E".to_string(), Value::Number(std::f64::consts::E));
    Value::object(entries)
}

fn json() -> Value {
    Value::object(BTreeMap::from([
        (
            "stringify".to_string(),
            native("stringify", |_, args| match arg(args, 0) {
                Value::Undefined | Value::Function(_) => Ok(Value::Undefined),
                value => serde_json::to_string(&value.to_json())
                    .map(Value::String)
                    .map_err(|e| EvalError::TypeError(e.to_string())),
            }),
        ),
        (
            "parse".to_string(),
            native("parse", |_, args| {
                serde_json::from_str::<serde_json::Value>(&arg(args, 0).to_js_string())
                    .map(Value::from)
                    .map_err(|e| EvalError::TypeError(format!("JSON.parse: {}", e)))
            }),
        ),
    ]))
}

fn object() -> Value {
    fn entries_of(value: &Value) -> Vec<(String, Value)> {
        match value {
            Value::Object(entries) => entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
                .collect(),
            _ => vec![],
        }
    }

    fn guarded(args: &[Value], name: &str) -> Result<Value, EvalError> {
        let target = arg(args, 0);
        if target.is_nullish() {
            return Err(EvalError::TypeError(format!(
                "Object.{}() called on {}",
                name,
                target.to_js_string()
            )));
        }
        Ok(target)
    }

    Value::object(BTreeMap::from([
        (
            "keys".to_string(),
            native("keys", |_, args| {
                let target = guarded(args, "keys")?;
                Ok(Value::array(entries_of(&target).into_iter().map(|(k, _)| Value::String(k)).collect()))
            }),
        ),
        (
            "values".to_string(),
            native("values", |_, args| {
                let target = guarded(args, "values")?;
                Ok(Value::array(entries_of(&target).into_iter().map(|(_, v)| v).collect()))
            }),
        ),
        (
            "entries".to_string(),
            native("entries", |_, args| {
                let target = guarded(args, "entries")?;
                Ok(Value::array(
                    entries_of(&target)
                        .into_iter()
                        .map(|(k, v)| Value::array(vec![Value::String(k), v]))
                        .collect(),
                ))
            }),
        ),
    ]))
}

fn parse_int(s: &str, radix: Option<f64>) -> f64 {
    let s = s.trim_start();
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };

    let mut radix = radix.map(|r| r as i64).unwrap_or(0);
    let hex_prefixed = s.starts_with("0x") || s.starts_with("0X");
    let s = if (radix == 0 || radix == 16) && hex_prefixed {
        radix = 16;
        &s[2..]
    } else {
        s
    };
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let radix = radix as u32;
    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    sign * digits
        .iter()
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(*d))
}

fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let digits_from = |from: usize| from + bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

fn encode_uri_component(s: &str) -> String {
    let mut out = String::new();
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || "-_.!~*'()".contains(c) {
            out.push(c);
        } else {
            let mut buf = [0; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

fn decode_uri_component(s: &str) -> Result<String, EvalError> {
    let malformed = || EvalError::TypeError("URI malformed".to_string());
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s
                .get(i + 1..i + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .ok_or_else(malformed)?;
            out.push(u8::from_str_radix(hex, 16).map_err(|_| malformed())?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| malformed())
}
