use crate::ast::{BinOp, UnaryOp};
use crate::value::number_to_string;

/// Abstract Syntax Tree node representing one parsed binding expression.
///
/// Trees are built once by the parser and never mutated afterwards. Passes
/// that rewrite the tree (see [`crate::transform`]) return a new tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ternary conditional
    ///
    /// # Example
    /// ```text
    /// ready ? "yes" : "no"
    /// ```
    Conditional {
        condition: Box<Node>,
        yes: Box<Node>,
        alternative: Box<Node>,
    },

    /// Prefix operation
    ///
    /// # Examples
    /// ```text
    /// !done
    /// typeof value
    /// ```
    Unary { op: UnaryOp, expr: Box<Node> },

    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Member access
    ///
    /// # Examples
    /// ```text
    /// user.name        // key: Name("name")
    /// items[index]     // key: Computed(Symbol(index))
    /// ```
    Property { object: Box<Node>, key: PropertyKey },

    /// String, number, boolean, null or regex literal
    Literal(Literal),

    /// Free name
    Symbol(Symbol),

    /// Function or method call
    ///
    /// # Examples
    /// ```text
    /// format(date)
    /// list.join(", ")
    /// ```
    Call { callee: Box<Node>, args: Vec<Node> },

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [a, b, 3]
    /// ```
    Array(Vec<Node>),

    /// Object literal
    ///
    /// # Example
    /// ```text
    /// {label: name, "data-id": id}
    /// ```
    Object(Vec<ObjectProperty>),

    /// Explicit grouping, kept so code generation round-trips the source
    Parentheses(Box<Node>),

    /// Filter pipeline, only ever at the root of a parsed expression
    ///
    /// # Example
    /// ```text
    /// price | currency("EUR") | upper
    /// ```
    Filter {
        expr: Box<Node>,
        stages: Vec<FilterStage>,
    },

    /// Arrow function with an expression body
    ///
    /// # Examples
    /// ```text
    /// x => x * 2
    /// (a, b) => a + b
    /// ```
    Arrow { params: Vec<Symbol>, body: Box<Node> },
}

/// Key of a [`Node::Property`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// `.name`
    Name(String),
    /// `[expr]`
    Computed(Box<Node>),
}

/// Decoded literal value with the source text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

impl Literal {
    /// A string literal with a double-quoted, JSON-escaped `raw`.
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        let raw = serde_json::Value::String(value.clone()).to_string();
        Literal {
            value: LiteralValue::String(value),
            raw,
        }
    }

    pub fn number(value: f64) -> Self {
        Literal {
            value: LiteralValue::Number(value),
            raw: number_to_string(value),
        }
    }

    /// The key text this literal contributes to a watcher path.
    pub fn as_path_segment(&self) -> Option<String> {
        match &self.value {
            LiteralValue::String(s) => Some(s.clone()),
            LiteralValue::Number(n) => Some(number_to_string(*n)),
            _ => None,
        }
    }
}

/// A name together with its exact source spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub raw: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Symbol {
            raw: name.clone(),
            name,
        }
    }
}

/// Object literal keys are restricted to atoms.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    Literal(Literal),
    Symbol(Symbol),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: ObjectKey,
    pub value: Node,
}

/// One `| name(args)` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    pub callee: Symbol,
    pub args: Vec<Node>,
}

/// The field through which a parent holds a child node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Condition,
    Yes,
    Alternative,
    Operand,
    Left,
    Right,
    Object,
    Key,
    Callee,
    Argument(usize),
    Element(usize),
    Value(usize),
    Inner,
    Input,
    StageArgument(usize, usize),
    Body,
}

impl Node {
    pub fn symbol(name: impl Into<String>) -> Node {
        Node::Symbol(Symbol::new(name))
    }

    pub fn string(value: impl Into<String>) -> Node {
        Node::Literal(Literal::string(value))
    }

    pub fn number(value: f64) -> Node {
        Node::Literal(Literal::number(value))
    }

    pub fn property(object: Node, key: impl Into<String>) -> Node {
        Node::Property {
            object: Box::new(object),
            key: PropertyKey::Name(key.into()),
        }
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Node {
        Node::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Conditional { .. } => "Conditional",
            Node::Unary { .. } => "Unary",
            Node::Binary { .. } => "Binary",
            Node::Property { .. } => "Property",
            Node::Literal(_) => "Literal",
            Node::Symbol(_) => "Symbol",
            Node::Call { .. } => "Call",
            Node::Array(_) => "Array",
            Node::Object(_) => "Object",
            Node::Parentheses(_) => "Parentheses",
            Node::Filter { .. } => "Filter",
            Node::Arrow { .. } => "Arrow",
        }
    }

    /// Rebuilds this node with every child node replaced by `f(child, edge)`.
    ///
    /// Object keys, arrow parameters and filter stage callees are not nodes
    /// and are copied unchanged.
    pub fn try_map_children<E, F>(&self, mut f: F) -> Result<Node, E>
    where
        F: FnMut(&Node, Edge) -> Result<Node, E>,
    {
        let rebuilt = match self {
            Node::Conditional {
                condition,
                yes,
                alternative,
            } => Node::Conditional {
                condition: Box::new(f(condition, Edge::Condition)?),
                yes: Box::new(f(yes, Edge::Yes)?),
                alternative: Box::new(f(alternative, Edge::Alternative)?),
            },
            Node::Unary { op, expr } => Node::Unary {
                op: *op,
                expr: Box::new(f(expr, Edge::Operand)?),
            },
            Node::Binary { op, left, right } => Node::Binary {
                op: *op,
                left: Box::new(f(left, Edge::Left)?),
                right: Box::new(f(right, Edge::Right)?),
            },
            Node::Property { object, key } => Node::Property {
                object: Box::new(f(object, Edge::Object)?),
                key: match key {
                    PropertyKey::Name(name) => PropertyKey::Name(name.clone()),
                    PropertyKey::Computed(expr) => PropertyKey::Computed(Box::new(f(expr, Edge::Key)?)),
                },
            },
            Node::Literal(_) | Node::Symbol(_) => self.clone(),
            Node::Call { callee, args } => {
                let callee = Box::new(f(callee, Edge::Callee)?);
                let mut new_args = Vec::with_capacity(args.len());
                for (i, arg) in args.iter().enumerate() {
                    new_args.push(f(arg, Edge::Argument(i))?);
                }
                Node::Call {
                    callee,
                    args: new_args,
                }
            }
            Node::Array(elements) => {
                let mut new_elements = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    new_elements.push(f(element, Edge::Element(i))?);
                }
                Node::Array(new_elements)
            }
            Node::Object(properties) => {
                let mut new_properties = Vec::with_capacity(properties.len());
                for (i, property) in properties.iter().enumerate() {
                    new_properties.push(ObjectProperty {
                        key: property.key.clone(),
                        value: f(&property.value, Edge::Value(i))?,
                    });
                }
                Node::Object(new_properties)
            }
            Node::Parentheses(inner) => Node::Parentheses(Box::new(f(inner, Edge::Inner)?)),
            Node::Filter { expr, stages } => {
                let expr = Box::new(f(expr, Edge::Input)?);
                let mut new_stages = Vec::with_capacity(stages.len());
                for (s, stage) in stages.iter().enumerate() {
                    let mut args = Vec::with_capacity(stage.args.len());
                    for (i, arg) in stage.args.iter().enumerate() {
                        args.push(f(arg, Edge::StageArgument(s, i))?);
                    }
                    new_stages.push(FilterStage {
                        callee: stage.callee.clone(),
                        args,
                    });
                }
                Node::Filter {
                    expr,
                    stages: new_stages,
                }
            }
            Node::Arrow { params, body } => Node::Arrow {
                params: params.clone(),
                body: Box::new(f(body, Edge::Body)?),
            },
        };
        Ok(rebuilt)
    }

    /// Direct child nodes in source order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Conditional {
                condition,
                yes,
                alternative,
            } => vec![condition.as_ref(), yes.as_ref(), alternative.as_ref()],
            Node::Unary { expr, .. } => vec![expr.as_ref()],
            Node::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Node::Property { object, key } => match key {
                PropertyKey::Name(_) => vec![object.as_ref()],
                PropertyKey::Computed(expr) => vec![object.as_ref(), expr.as_ref()],
            },
            Node::Literal(_) | Node::Symbol(_) => vec![],
            Node::Call { callee, args } => {
                let mut children = vec![callee.as_ref()];
                children.extend(args.iter());
                children
            }
            Node::Array(elements) => elements.iter().collect(),
            Node::Object(properties) => properties.iter().map(|p| &p.value).collect(),
            Node::Parentheses(inner) => vec![inner.as_ref()],
            Node::Filter { expr, stages } => {
                let mut children = vec![expr.as_ref()];
                children.extend(stages.iter().flat_map(|stage| stage.args.iter()));
                children
            }
            Node::Arrow { body, .. } => vec![body.as_ref()],
        }
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}
