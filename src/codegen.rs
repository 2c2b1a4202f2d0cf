//! Source text generation for binding expression trees.
//!
//! The printer uses fixed spacing: one space around binary and conditional
//! operators and after commas, none anywhere else. Leaves are re-emitted
//! from the exact text they were lexed from, so quoting and number notation
//! survive a round trip.
//!
//! Arrow functions are printed as anonymous `function` expressions.
//!
//! # Examples
//!
//! ```
//! use binding_expr::{codegen::generate, parser::parse};
//!
//! let ast = parse("items.map(x => x * 2)").unwrap();
//! assert_eq!(generate(&ast).unwrap(), "items.map(function(x){return x * 2})");
//! ```

use thiserror::Error;

use crate::ast::{Node, ObjectKey, PropertyKey, UnaryOp};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Cannot generate code for a {kind} node")]
    UnsupportedNode { kind: &'static str },
}

pub struct CodePrinter;

impl CodePrinter {
    pub fn new() -> Self {
        CodePrinter
    }

    pub fn print(&self, node: &Node) -> Result<String, GenerationError> {
        match node {
            Node::Conditional {
                condition,
                yes,
                alternative,
            } => Ok(format!(
                "{} ? {} : {}",
                self.print_operand(condition, CONDITIONAL + 1)?,
                self.print(yes)?,
                self.print(alternative)?
            )),
            Node::Unary { op, expr } => self.print_unary(*op, expr),
            Node::Binary { op, left, right } => {
                let precedence = op.precedence();
                Ok(format!(
                    "{} {} {}",
                    self.print_operand(left, precedence)?,
                    op.as_str(),
                    self.print_operand(right, precedence + 1)?
                ))
            }
            Node::Property { object, key } => {
                let object = self.print_operand(object, POSTFIX)?;
                match key {
                    PropertyKey::Name(name) if is_identifier(name) => Ok(format!("{}.{}", object, name)),
                    PropertyKey::Name(name) => Ok(format!("{}[{}]", object, quote(name))),
                    PropertyKey::Computed(expr) => Ok(format!("{}[{}]", object, self.print(expr)?)),
                }
            }
            Node::Literal(literal) => Ok(literal.raw.clone()),
            Node::Symbol(symbol) => Ok(symbol.raw.clone()),
            Node::Call { callee, args } => Ok(format!(
                "{}({})",
                self.print_operand(callee, POSTFIX)?,
                self.print_list(args)?
            )),
            Node::Array(elements) => Ok(format!("[{}]", self.print_list(elements)?)),
            Node::Object(properties) => {
                let mut items = Vec::with_capacity(properties.len());
                for property in properties {
                    let key = match &property.key {
                        ObjectKey::Literal(literal) => &literal.raw,
                        ObjectKey::Symbol(symbol) => &symbol.raw,
                    };
                    items.push(format!("{}: {}", key, self.print(&property.value)?));
                }
                Ok(format!("{{{}}}", items.join(", ")))
            }
            Node::Parentheses(inner) => Ok(format!("({})", self.print(inner)?)),
            Node::Arrow { params, body } => {
                let params: Vec<&str> = params.iter().map(|p| p.raw.as_str()).collect();
                Ok(format!(
                    "function({}){{return {}}}",
                    params.join(", "),
                    self.print(body)?
                ))
            }
            Node::Filter { .. } => Err(GenerationError::UnsupportedNode {
                kind: node.kind_name(),
            }),
        }
    }

    fn print_list(&self, nodes: &[Node]) -> Result<String, GenerationError> {
        let items = nodes
            .iter()
            .map(|node| self.print(node))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items.join(", "))
    }

    fn print_unary(&self, op: UnaryOp, expr: &Node) -> Result<String, GenerationError> {
        let operand = self.print_operand(expr, UNARY)?;
        let spaced = match op {
            UnaryOp::Negate | UnaryOp::Plus => operand.starts_with(op.as_str()),
            _ => op.is_word(),
        };
        if spaced {
            Ok(format!("{} {}", op.as_str(), operand))
        } else {
            Ok(format!("{}{}", op.as_str(), operand))
        }
    }

    /// Prints `node`, wrapping it in parentheses when it binds looser than
    /// `min_precedence`. Parsed trees already carry their own `Parentheses`.
    fn print_operand(&self, node: &Node, min_precedence: u8) -> Result<String, GenerationError> {
        let text = self.print(node)?;
        if precedence(node) < min_precedence {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }
}

impl Default for CodePrinter {
    fn default() -> Self {
        Self::new()
    }
}

const ARROW: u8 = 0;
const CONDITIONAL: u8 = 0;
const UNARY: u8 = 7;
const POSTFIX: u8 = 8;

fn precedence(node: &Node) -> u8 {
    match node {
        Node::Arrow { .. } => ARROW,
        Node::Conditional { .. } | Node::Filter { .. } => CONDITIONAL,
        Node::Binary { op, .. } => op.precedence(),
        Node::Unary { .. } => UNARY,
        _ => POSTFIX,
    }
}

/// Whether `name` can follow a `.` as-is.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Renders `node` as source text.
pub fn generate(node: &Node) -> Result<String, GenerationError> {
    CodePrinter::new().print(node)
}
