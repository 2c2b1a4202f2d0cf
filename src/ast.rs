//! # Binding Expressions - Abstract Syntax Tree
//!
//! This module defines the tokens and the Abstract Syntax Tree (AST) for
//! binding expressions, the restricted JS-like language used to author data
//! bindings inside templates.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes and the child-rebuilding helpers
//!   used by the rewriting passes
//! - **[operators]** - Operator tokens, binary and prefix operators
//!
//! ## Quick Start
//!
//! ```text
//! user.name + " (" + count + ")"
//! ```
//!
//! parses into a tree of `Binary` nodes over `Property`, `Literal` and
//! `Symbol` leaves.
//!
//! ## Core Concepts
//!
//! ### Lossless leaves
//!
//! Every `Literal` and `Symbol` keeps the exact source text it was lexed from
//! (`raw`), next to its decoded value. Code generation re-emits `raw`, so
//! `'it\'s'` stays single-quoted and `0x1f` stays hexadecimal.
//!
//! ### Filter pipelines
//!
//! ```text
//! price | currency("EUR") | upper
//! ```
//!
//! is kept as a `Filter` node by the parser and desugared into nested calls
//! (`upper(currency(price, "EUR"))`) by the transform.
//!
//! ### Arrow functions
//!
//! ```text
//! items.filter(x => x.done).length
//! ```
//!
//! Arrow bodies are single expressions. Parameters are always plain symbols.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{
    Edge, FilterStage, Literal, LiteralValue, Node, ObjectKey, ObjectProperty, PropertyKey, Symbol,
};
pub use operators::{BinOp, Operator, UnaryOp};
pub use tokens::{Atom, Token, TokenKind};
