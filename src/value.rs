use std::{collections::BTreeMap, fmt, rc::Rc};

use crate::{ast::Node, evaluator::EvalError};

/// Runtime value produced by evaluating a compiled expression.
///
/// Values follow JS semantics: there is a single number type, `undefined`
/// and `null` are distinct, and arrays and objects compare by identity.
///
/// # Examples
///
/// ```
/// use binding_expr::Value;
///
/// let n = Value::Number(42.0);
/// assert_eq!(n.to_js_string(), "42");
///
/// let list = Value::array(vec![Value::Number(1.0), Value::Null]);
/// assert_eq!(list.to_js_string(), "1,");
/// ```
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    /// Keys are kept sorted.
    Object(Rc<BTreeMap<String, Value>>),
    Regex(Rc<JsRegex>),
    Function(Function),
}

/// A compiled regex literal.
pub struct JsRegex {
    pub source: String,
    pub flags: String,
    pub regex: regex::Regex,
}

pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, EvalError>;

#[derive(Clone)]
pub enum Function {
    /// Built-in, called with `this` and the arguments.
    Native { name: &'static str, func: Rc<NativeFn> },
    /// Arrow function with the local bindings visible where it was created.
    Closure(Rc<Closure>),
}

pub struct Closure {
    pub params: Vec<String>,
    pub body: Node,
    pub captured: BTreeMap<String, Value>,
}

impl Function {
    pub fn native<F>(name: &'static str, func: F) -> Function
    where
        F: Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Function::Native {
            name,
            func: Rc::new(func),
        }
    }

    fn same(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native { func: a, .. }, Function::Native { func: b, .. }) => Rc::ptr_eq(a, b),
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(items))
    }

    pub fn object(entries: BTreeMap<String, Value>) -> Value {
        Value::Object(Rc::new(entries))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// JS truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Regex(_) => "object",
        }
    }

    /// `ToNumber`
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_js_string()),
            _ => f64::NAN,
        }
    }

    /// `ToString`
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Regex(re) => format!("/{}/{}", re.source, re.flags),
            Value::Function(_) => "function () { [native code] }".to_string(),
        }
    }

    fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Regex(a), Value::Regex(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.same(b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Boolean(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Boolean(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (a, b) if a.is_primitive() != b.is_primitive() => {
                let (primitive, object) = if a.is_primitive() { (a, b) } else { (b, a) };
                primitive.loose_equals(&Value::String(object.to_js_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// JSON form of this value. `undefined`, functions and non-finite
    /// numbers become `null`; object entries holding `undefined` are dropped.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .filter(|(_, v)| !matches!(v, Value::Undefined | Value::Function(_)))
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Regex(_) => serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => {
                Value::object(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Structural comparison, used by tests and diagnostics. Functions and
/// regexes compare by identity and source respectively.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.source == b.source && a.flags == b.flags,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Regex(re) => write!(f, "/{}/{}", re.source, re.flags),
            Value::Function(Function::Native { name, .. }) => write!(f, "[Function: {}]", name),
            Value::Function(Function::Closure(c)) => write!(f, "[Function ({})]", c.params.join(", ")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

/// JS `Number.prototype.toString()` for radix 10.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", n);
    }

    let exp = format!("{:e}", n);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exp,
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// `ToNumber` applied to a string.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    let radix = |digits: &str, radix: u32| {
        if digits.is_empty() {
            return f64::NAN;
        }
        digits
            .chars()
            .try_fold(0.0, |acc, c| {
                c.to_digit(radix)
                    .map(|d| acc * f64::from(radix) + f64::from(d))
            })
            .unwrap_or(f64::NAN)
    };
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return radix(hex, 16);
    }
    if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        return radix(oct, 8);
    }
    if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        return radix(bin, 2);
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}
