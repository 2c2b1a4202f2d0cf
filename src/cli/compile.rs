//! Compile and evaluate binding expressions from the command line

use std::{fs, path::Path};

use serde_json::json;
use tracing::debug;

use super::{CliError, data_bindings};
use crate::{CompileConfig, Compiled, Lexer, ast::TokenKind, compile, compile_template};

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Expression, or template with `--template`
    pub expression: String,
    /// Treat the input as a `${...}` template
    pub template: bool,
}

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    pub expression: String,
    pub template: bool,
    /// JSON object with type tags and direct symbols
    pub data: Option<String>,
}

/// Reads a JSON config file, or falls back to the default
/// `scope`/`hooks` configuration.
pub fn load_config(path: Option<&Path>) -> Result<CompileConfig, CliError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let config = CompileConfig::from_json(&text)?;
            config.validate()?;
            debug!(path = %path.display(), symbols = config.symbols.len(), "loaded config");
            Ok(config)
        }
        None => Ok(CompileConfig::default()),
    }
}

fn run_compile(expression: &str, template: bool, config: &CompileConfig) -> Result<Compiled, CliError> {
    let compiled = if template {
        compile_template(expression, config)?
    } else {
        compile(expression, config)?
    };
    Ok(compiled)
}

/// Execute a compile operation, returning `{code, watchers, parameters}`
pub fn execute_compile(options: &CompileOptions, config: &CompileConfig) -> Result<serde_json::Value, CliError> {
    let compiled = run_compile(&options.expression, options.template, config)?;
    Ok(json!({
        "code": compiled.code,
        "watchers": compiled.watchers,
        "parameters": compiled.parameters,
    }))
}

/// Execute an eval operation against `--data`
pub fn execute_eval(options: &EvalOptions, config: &CompileConfig) -> Result<serde_json::Value, CliError> {
    let compiled = run_compile(&options.expression, options.template, config)?;

    let data = match &options.data {
        Some(text) => serde_json::from_str(text)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    let (accessor, direct) = data_bindings(config, data)?;

    let result = compiled.call(&accessor, &direct)?;
    Ok(result.to_json())
}

/// Dump the token stream, one `kind raw` line per token
pub fn execute_tokens(expression: &str) -> Result<Vec<String>, CliError> {
    let tokens = Lexer::new(expression).tokenize()?;
    Ok(tokens
        .iter()
        .filter(|token| token.kind != TokenKind::Eof)
        .map(|token| format!("{:>4}  {:<24} {}", token.position, token.kind.to_string(), token.raw))
        .collect())
}
