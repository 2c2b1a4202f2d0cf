pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod template;
pub mod transform;
pub mod value;

pub use ast::{BinOp, Node, Token, UnaryOp};
pub use codegen::{GenerationError, generate};
pub use compiler::{CompileError, Compiled, compile, compile_template};
pub use config::{CompileConfig, ConfigError, SymbolConfig};
pub use evaluator::{Accessor, EvalError, Evaluator, JsonAccessor};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser, parse};
pub use template::{TemplateError, extract};
pub use transform::{TransformError, TransformOutput, Transformer, transform};
pub use value::Value;
