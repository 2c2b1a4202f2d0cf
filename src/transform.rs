//! Tree rewriting between parsing and code generation.
//!
//! The transform resolves free names against the configured symbols and
//! turns reads of non-direct symbols into accessor calls, so that
//!
//! ```text
//! user.name + $hooks.format(total)
//! ```
//!
//! becomes
//!
//! ```text
//! $_get_by_any("scope", "user", "name") + $hooks.format($_get_by_any("scope", "total"))
//! ```
//!
//! with the watchers `scope.user.name` and `scope.total`.
//!
//! Every pass takes a tree by reference and builds a new one. Running the
//! transform on its own output with the same config changes nothing.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Edge, Node, PropertyKey, Symbol},
    config::{CompileConfig, SymbolTable},
};

/// Name of the accessor parameter of compiled code.
pub const ACCESSOR: &str = "$_get_by_any";

/// Globals that are never resolved against a container.
static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "undefined",
        "NaN",
        "Infinity",
        "isFinite",
        "isNaN",
        "parseFloat",
        "parseInt",
        "decodeURI",
        "decodeURIComponent",
        "encodeURI",
        "encodeURIComponent",
        "Object",
        "Boolean",
        "Symbol",
        "Error",
        "Promise",
        "Array",
        "String",
        "RegExp",
        "Number",
        "JSON",
        "Math",
        ACCESSOR,
    ]
    .into_iter()
    .collect()
});

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("Unknown symbol '{name}': no dollar symbol is configured")]
    UnknownDollar { name: String },
}

/// Rewritten tree plus the dependency paths it reads.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub ast: Node,
    pub watchers: Vec<String>,
}

pub struct Transformer<'a> {
    config: &'a CompileConfig,
    table: SymbolTable,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a CompileConfig) -> Self {
        Transformer {
            config,
            table: SymbolTable::new(config),
        }
    }

    pub fn config(&self) -> &CompileConfig {
        self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.table
    }

    pub fn transform(&self, ast: &Node) -> Result<TransformOutput, TransformError> {
        if let Some(hook) = &self.config.on_before_process
            && let Some(output) = hook(self, ast)
        {
            debug!("before-process hook replaced the transform");
            return Ok(output);
        }

        let ast = desugar_filters(ast);
        let ast = self.wrap_bare_symbol(ast);
        let ast = self.resolve(&ast, false, &[])?;
        let ast = self.rewrite_accessors(&ast, &[])?;

        if let Some(hook) = &self.config.on_after_process
            && let Some(output) = hook(self, &ast)
        {
            debug!("after-process hook replaced the transform");
            return Ok(output);
        }

        let watchers = collect_watchers(&ast);
        debug!(watchers = watchers.len(), "transformed expression");
        Ok(TransformOutput { ast, watchers })
    }

    /// `name` read off the dollar container when it is `$`-prefixed and one
    /// is configured, otherwise off the default container.
    fn lift(&self, name: &str) -> Node {
        match (name.strip_prefix('$'), &self.config.dollar) {
            (Some(stripped), Some(dollar)) => container_property(dollar, stripped),
            _ => container_property(&self.config.default, name),
        }
    }

    /// An expression that is nothing but an unrecognized name.
    fn wrap_bare_symbol(&self, ast: Node) -> Node {
        match ast {
            Node::Symbol(symbol) if !self.table.is_recognized(&symbol.raw) => self.lift(&symbol.name),
            other => other,
        }
    }

    fn resolve(&self, node: &Node, is_callee: bool, scope: &[&str]) -> Result<Node, TransformError> {
        match node {
            Node::Symbol(symbol) => self.resolve_symbol(symbol, is_callee, scope),
            Node::Arrow { params, body } => {
                let inner = extend_scope(scope, params);
                Ok(Node::Arrow {
                    params: params.clone(),
                    body: Box::new(self.resolve(body, false, &inner)?),
                })
            }
            _ => node.try_map_children(|child, edge| self.resolve(child, edge == Edge::Callee, scope)),
        }
    }

    fn resolve_symbol(&self, symbol: &Symbol, is_callee: bool, scope: &[&str]) -> Result<Node, TransformError> {
        let name = symbol.name.as_str();
        if self.table.is_recognized(&symbol.raw) || is_builtin(name) || scope.contains(&name) {
            return Ok(Node::Symbol(symbol.clone()));
        }

        if name.starts_with('$') && !self.config.allow_unknown_dollar && self.config.dollar.is_none() {
            return Err(TransformError::UnknownDollar {
                name: name.to_string(),
            });
        }

        if is_callee {
            Ok(container_property(&self.config.call, name))
        } else {
            Ok(self.lift(name))
        }
    }

    fn rewrite_accessors(&self, node: &Node, scope: &[&str]) -> Result<Node, TransformError> {
        match node {
            Node::Arrow { params, body } => {
                let inner = extend_scope(scope, params);
                Ok(Node::Arrow {
                    params: params.clone(),
                    body: Box::new(self.rewrite_accessors(body, &inner)?),
                })
            }
            // The last key stays a member access on the accessor result so
            // the method keeps its receiver.
            Node::Call { callee, args } => {
                if let Node::Property { object, key } = callee.as_ref()
                    && let Some(accessor) = self.accessor_call(object, scope)?
                {
                    let callee = Node::Property {
                        object: Box::new(accessor),
                        key: self.rewrite_key(key, scope)?,
                    };
                    let mut new_args = Vec::with_capacity(args.len());
                    for arg in args {
                        new_args.push(self.rewrite_accessors(arg, scope)?);
                    }
                    return Ok(Node::call(callee, new_args));
                }
                node.try_map_children(|child, _| self.rewrite_accessors(child, scope))
            }
            _ => match self.accessor_call(node, scope)? {
                Some(accessor) => Ok(accessor),
                None => node.try_map_children(|child, _| self.rewrite_accessors(child, scope)),
            },
        }
    }

    fn rewrite_key(&self, key: &PropertyKey, scope: &[&str]) -> Result<PropertyKey, TransformError> {
        match key {
            PropertyKey::Name(name) => Ok(PropertyKey::Name(name.clone())),
            PropertyKey::Computed(expr) => Ok(PropertyKey::Computed(Box::new(
                self.rewrite_accessors(expr, scope)?,
            ))),
        }
    }

    /// `$_get_by_any(tag, ...keys)` for a member chain rooted at a
    /// recognized, non-direct, unshadowed symbol.
    fn accessor_call(&self, node: &Node, scope: &[&str]) -> Result<Option<Node>, TransformError> {
        let mut keys = vec![];
        let mut current = node;
        while let Node::Property { object, key } = current {
            keys.push(key);
            current = object;
        }

        let Node::Symbol(symbol) = current else {
            return Ok(None);
        };
        if scope.contains(&symbol.name.as_str()) {
            return Ok(None);
        }
        match self.table.recognize(&symbol.raw) {
            Some(recognized) if !recognized.direct => {}
            _ => return Ok(None),
        }

        let tag = symbol.raw.strip_prefix('$').unwrap_or(&symbol.raw);
        let mut args = vec![Node::string(tag)];
        for key in keys.into_iter().rev() {
            args.push(match key {
                PropertyKey::Name(name) => Node::string(name.as_str()),
                PropertyKey::Computed(expr) => self.rewrite_accessors(expr, scope)?,
            });
        }
        Ok(Some(Node::call(Node::symbol(ACCESSOR), args)))
    }
}

/// Folds `expr | f | g(x)` into `g(f(expr), x)`.
fn desugar_filters(ast: &Node) -> Node {
    match ast {
        Node::Filter { expr, stages } => stages.iter().fold(expr.as_ref().clone(), |acc, stage| {
            let mut args = Vec::with_capacity(stage.args.len() + 1);
            args.push(acc);
            args.extend(stage.args.iter().cloned());
            Node::call(Node::Symbol(stage.callee.clone()), args)
        }),
        other => other.clone(),
    }
}

fn container_property(container: &str, key: &str) -> Node {
    Node::property(Node::symbol(format!("${}", container)), key)
}

fn extend_scope<'s>(scope: &[&'s str], params: &'s [Symbol]) -> Vec<&'s str> {
    let mut inner = scope.to_vec();
    inner.extend(params.iter().map(|p| p.name.as_str()));
    inner
}

/// Dotted paths of the leading literal arguments of every accessor call,
/// in pre-order and without duplicates.
pub fn collect_watchers(ast: &Node) -> Vec<String> {
    let mut watchers = vec![];
    let mut seen = HashSet::new();

    ast.walk(&mut |node| {
        let Node::Call { callee, args } = node else {
            return;
        };
        if !matches!(callee.as_ref(), Node::Symbol(s) if s.name == ACCESSOR) {
            return;
        }

        let segments: Vec<String> = args
            .iter()
            .map_while(|arg| match arg {
                Node::Literal(literal) => literal.as_path_segment(),
                _ => None,
            })
            .collect();
        if segments.is_empty() {
            return;
        }

        let path = segments.join(".");
        if seen.insert(path.clone()) {
            watchers.push(path);
        }
    });
    watchers
}

/// Runs every pass with `config`.
pub fn transform(ast: &Node, config: &CompileConfig) -> Result<TransformOutput, TransformError> {
    Transformer::new(config).transform(ast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desugar_filters() {
        let ast = crate::parser::parse("a | f | g(1)").unwrap();
        let expected = crate::parser::parse("g(f(a), 1)").unwrap();
        assert_eq!(desugar_filters(&ast), expected);
    }

    #[test]
    fn test_watchers_skip_non_literal_runs() {
        let ast = crate::parser::parse(r#"$_get_by_any("scope", x, "b") + $_get_by_any(y)"#).unwrap();
        assert_eq!(collect_watchers(&ast), vec!["scope".to_string()]);
    }
}
