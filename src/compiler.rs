use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{BinOp, Node},
    codegen::{GenerationError, generate},
    config::{CompileConfig, ConfigError},
    evaluator::{Accessor, EvalError, Evaluator},
    parser::{ParseError, parse},
    template::{self, Segment, TemplateError},
    transform::{TransformError, Transformer},
    value::Value,
};

/// Failure of any compilation stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// A compiled binding expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Transformed tree.
    pub ast: Node,
    /// Source text of the transformed tree.
    pub code: String,
    /// Dependency paths, e.g. `scope.user.name`.
    pub watchers: Vec<String>,
    /// Calling convention of `code`: the accessor, then each direct symbol.
    pub parameters: Vec<String>,
}

impl Compiled {
    /// Evaluates the expression. `direct` holds one value per direct symbol,
    /// in configured order.
    pub fn call(&self, accessor: &dyn Accessor, direct: &[Value]) -> Result<Value, EvalError> {
        let names = self.parameters.get(1..).unwrap_or_default();
        if names.len() != direct.len() {
            return Err(EvalError::Arity {
                expected: names.len(),
                found: direct.len(),
            });
        }

        let mut evaluator = Evaluator::new(accessor);
        for (name, value) in names.iter().zip(direct) {
            evaluator.bind(name.clone(), value.clone());
        }
        evaluator.eval(&self.ast)
    }
}

/// Parses, transforms and generates one expression.
///
/// # Examples
///
/// ```
/// use binding_expr::{CompileConfig, compile};
///
/// let config = CompileConfig::new("scope", "hooks").symbol("scope").direct("hooks");
/// let compiled = compile("a + $hooks.b", &config).unwrap();
///
/// assert_eq!(compiled.code, r#"$_get_by_any("scope", "a") + $hooks.b"#);
/// assert_eq!(compiled.watchers, vec!["scope.a"]);
/// ```
pub fn compile(source: &str, config: &CompileConfig) -> Result<Compiled, CompileError> {
    config.validate()?;

    let ast = parse(source)?;
    let output = Transformer::new(config).transform(&ast)?;
    let code = generate(&output.ast)?;
    debug!(code = %code, watchers = output.watchers.len(), "compiled expression");

    Ok(Compiled {
        ast: output.ast,
        code,
        watchers: output.watchers,
        parameters: config.parameters(),
    })
}

/// Compiles every `${...}` span of a template and joins the pieces with
/// `+`, merging the watchers of all spans.
pub fn compile_template(source: &str, config: &CompileConfig) -> Result<Compiled, CompileError> {
    config.validate()?;

    let mut parts = vec![];
    let mut watchers = vec![];
    let mut seen = HashSet::new();

    for segment in template::split(source)? {
        match segment {
            Segment::Literal(text) => parts.push(Node::string(text)),
            Segment::Expression(expression) => {
                let compiled = compile(&expression, config)?;
                for watcher in compiled.watchers {
                    if seen.insert(watcher.clone()) {
                        watchers.push(watcher);
                    }
                }
                parts.push(Node::Parentheses(Box::new(compiled.ast)));
            }
        }
    }

    let ast = concatenate(parts);
    let code = generate(&ast)?;
    debug!(code = %code, watchers = watchers.len(), "compiled template");

    Ok(Compiled {
        ast,
        code,
        watchers,
        parameters: config.parameters(),
    })
}

/// `"a" + (b) + ...`; a single part stands alone and no parts is `""`.
fn concatenate(parts: Vec<Node>) -> Node {
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Node::string("");
    };

    let rest: Vec<Node> = parts.collect();
    if rest.is_empty() {
        return match first {
            Node::Parentheses(inner) => *inner,
            other => other,
        };
    }
    rest.into_iter().fold(first, |acc, part| Node::Binary {
        op: BinOp::Add,
        left: Box::new(acc),
        right: Box::new(part),
    })
}
