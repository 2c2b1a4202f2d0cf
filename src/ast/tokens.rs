use std::fmt;

use crate::ast::Operator;

/// The three reserved value words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    True,
    False,
    Null,
}

impl Atom {
    pub fn from_word(word: &str) -> Option<Atom> {
        match word {
            "true" => Some(Atom::True),
            "false" => Some(Atom::False),
            "null" => Some(Atom::Null),
            _ => None,
        }
    }
}

/// Token kinds, each carrying its decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// End of input
    Eof,

    /// A supported operator
    ///
    /// # Examples
    /// ```text
    /// +  ===  &&  typeof  in  |
    /// ```
    Operator(Operator),

    /// One of `( ) [ ] { } , : . ;`
    Punctuation(char),

    /// Quoted string, escapes already decoded
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'it\'s'
    /// "\x41B"
    /// ```
    String(String),

    /// Numeric literal (decimal, hex or octal)
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0x1f
    /// 017
    /// 1.5e-3
    /// ```
    Number(f64),

    /// Plain name
    ///
    /// Words directly after `.` are always identifiers, reserved or not.
    Identifier(String),

    /// `true`, `false` or `null`
    Atom(Atom),

    /// Regular expression literal
    ///
    /// Only produced where a value is expected; elsewhere `/` is division.
    ///
    /// # Examples
    /// ```text
    /// /ab+c/gi
    /// /[/]/
    /// ```
    Regex { pattern: String, flags: String },

    /// `=>`
    Arrow,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Operator(op) => write!(f, "operator '{}'", op),
            TokenKind::Punctuation(c) => write!(f, "'{}'", c),
            TokenKind::String(s) => write!(f, "string {:?}", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Atom(Atom::True) => write!(f, "'true'"),
            TokenKind::Atom(Atom::False) => write!(f, "'false'"),
            TokenKind::Atom(Atom::Null) => write!(f, "'null'"),
            TokenKind::Regex { pattern, flags } => write!(f, "regex /{}/{}", pattern, flags),
            TokenKind::Arrow => write!(f, "'=>'"),
        }
    }
}

/// A lexed token: its kind, the exact source text and where it started.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            raw: raw.into(),
            position,
        }
    }

    pub fn is_punctuation(&self, c: char) -> bool {
        self.kind == TokenKind::Punctuation(c)
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }
}
