//! CLI support for binding-expr
//!
//! Provides programmatic access to the `bexpr` subcommands so they can be
//! embedded in other tools.

mod compile;
mod convert;

pub use compile::{CompileOptions, EvalOptions, execute_compile, execute_eval, execute_tokens, load_config};
pub use convert::data_bindings;

use std::io;

use thiserror::Error;

use crate::{CompileError, ConfigError, EvalError, LexError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// `--data` was not a JSON object
    #[error("Data must be a JSON object mapping type tags and direct symbols to values")]
    InvalidData,
}
