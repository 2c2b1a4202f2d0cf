use std::collections::HashSet;

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::trace;

use crate::ast::{Atom, Operator, Token, TokenKind};

/// Every operator spelling of the host language, supported or not.
///
/// Operators are scanned by longest match against this table, so that
/// `>>=` is reported as `>>=` rather than as `>` followed by `>=`.
static OPERATOR_TABLE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "+", "-", "*", "/", "%", "**", "<", ">", "<=", ">=", "==", "===", "!=", "!==", "&&",
        "||", "!", "?", "|", "&", "^", "~", "<<", ">>", ">>>", "=", "+=", "-=", "*=", "/=",
        "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=", "||=", "++", "--", "=>",
    ]
    .into_iter()
    .collect()
});

/// Reserved words that never start an expression.
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "do",
        "else", "enum", "export", "extends", "finally", "for", "function", "if", "import",
        "return", "super", "switch", "this", "throw", "try", "var", "while", "with", "yield",
        "let", "static", "implements", "interface", "package", "private", "protected", "public",
    ]
    .into_iter()
    .collect()
});

const FORBIDDEN_WORD_OPERATORS: &[&str] = &["instanceof", "new", "delete"];
const OPERATOR_CHARS: &str = "+-*/%<>=!&|^~?";
const PUNCTUATION: &str = "()[]{},:.;";
const REGEX_FLAGS: &str = "dgimsuy";

/// Errors raised while tokenizing. Every variant records the character
/// offset at which the problem was detected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("Unterminated string constant starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Unterminated regular expression starting at position {position}")]
    UnterminatedRegex { position: usize },

    #[error("Invalid escape sequence '\\{sequence}' at position {position}")]
    InvalidEscape { sequence: String, position: usize },

    #[error("Invalid number '{raw}' at position {position}")]
    InvalidNumber { raw: String, position: usize },

    #[error("Invalid regular expression flags '{flags}' at position {position}")]
    InvalidRegexFlags { flags: String, position: usize },

    #[error("Operator '{op}' is not allowed in expression (position {position})")]
    OperatorNotAllowed { op: String, position: usize },

    #[error("Keyword '{word}' is not allowed in expression (position {position})")]
    KeywordNotAllowed { word: String, position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::UnterminatedRegex { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidNumber { position, .. }
            | LexError::InvalidRegexFlags { position, .. }
            | LexError::OperatorNotAllowed { position, .. }
            | LexError::KeywordNotAllowed { position, .. } => *position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    /// A value (rather than an operator) may start here, so `/` opens a
    /// regex literal instead of dividing.
    value_expected: bool,
    /// The previous token was `.`, so the next word is a property name.
    after_dot: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            value_expected: true,
            after_dot: false,
        }
    }

    /// Whether `/` at the cursor would currently start a regex literal.
    pub fn value_expected(&self) -> bool {
        self.value_expected
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_identifier_part(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_word(&mut self, start: usize) -> Result<TokenKind, LexError> {
        let word = self.read_identifier();

        if self.after_dot {
            return Ok(TokenKind::Identifier(word));
        }
        if let Some(atom) = Atom::from_word(&word) {
            return Ok(TokenKind::Atom(atom));
        }
        if let Some(op) = Operator::from_spelling(&word) {
            return Ok(TokenKind::Operator(op));
        }
        if FORBIDDEN_WORD_OPERATORS.contains(&word.as_str()) {
            return Err(LexError::OperatorNotAllowed {
                op: word,
                position: start,
            });
        }
        if RESERVED_WORDS.contains(word.as_str()) {
            return Err(LexError::KeywordNotAllowed {
                word,
                position: start,
            });
        }
        Ok(TokenKind::Identifier(word))
    }

    fn read_operator(&mut self, start: usize) -> Result<TokenKind, LexError> {
        let mut op = String::new();
        while let Some(ch) = self.current_char() {
            let mut candidate = op.clone();
            candidate.push(ch);
            if !OPERATOR_TABLE.contains(candidate.as_str()) {
                break;
            }
            op = candidate;
            self.advance();
        }

        if op == "=>" {
            return Ok(TokenKind::Arrow);
        }
        match Operator::from_spelling(&op) {
            Some(supported) => Ok(TokenKind::Operator(supported)),
            None => Err(LexError::OperatorNotAllowed { op, position: start }),
        }
    }

    /// Scans a numeric literal.
    ///
    /// Letters and digits keep the literal going so that `1a` is reported
    /// as one malformed number, but a second `x`, a second exponent marker
    /// or a second `.` ends it: `0x1x` is `0x1` followed by `x`.
    fn read_number(&mut self, start: usize) -> Result<TokenKind, LexError> {
        let mut raw = String::new();
        let mut has_x = false;
        let mut has_e = false;
        let mut has_dot = false;
        let mut after_e = false;

        while let Some(ch) = self.current_char() {
            let accept = match ch {
                'x' | 'X' => !has_x,
                'e' | 'E' if !has_x => !has_e,
                '+' | '-' => after_e,
                '.' => !has_dot && !has_x && !has_e,
                c => c.is_alphanumeric(),
            };
            if !accept {
                break;
            }

            match ch {
                'x' | 'X' => has_x = true,
                'e' | 'E' if !has_x => has_e = true,
                '.' => has_dot = true,
                _ => {}
            }
            after_e = matches!(ch, 'e' | 'E') && !has_x;
            raw.push(ch);
            self.advance();
        }

        match parse_number(&raw) {
            Some(value) => Ok(TokenKind::Number(value)),
            None => Err(LexError::InvalidNumber {
                raw,
                position: start,
            }),
        }
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\n' | '\r' => break,
                '\\' => {
                    self.advance();
                    self.read_escape(&mut result)?;
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    /// Decodes one escape sequence; the cursor sits just past the backslash.
    fn read_escape(&mut self, out: &mut String) -> Result<(), LexError> {
        let escape_start = self.position - 1;
        let Some(ch) = self.current_char() else {
            return Ok(());
        };

        if let Some(first) = ch.to_digit(8) {
            // \0 .. \377: up to three digits after 0-3, two after 4-7
            let limit = if first <= 3 { 3 } else { 2 };
            let mut value = 0u32;
            let mut len = 0;
            while len < limit {
                match self.current_char().and_then(|c| c.to_digit(8)) {
                    Some(digit) => {
                        value = value * 8 + digit;
                        len += 1;
                        self.advance();
                    }
                    None => break,
                }
            }
            out.push(char::from(value as u8));
            return Ok(());
        }

        self.advance();
        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'v' => out.push('\u{b}'),
            'f' => out.push('\u{c}'),
            'x' => {
                let code = self.read_hex('x', 2, escape_start)?;
                out.push(char::from(code as u8));
            }
            'u' => {
                let code = self.read_unicode_escape(escape_start)?;
                out.push(code);
            }
            // line continuation
            '\n' => {}
            '\r' => {
                if self.current_char() == Some('\n') {
                    self.advance();
                }
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn read_hex(&mut self, marker: char, len: usize, escape_start: usize) -> Result<u32, LexError> {
        let mut digits = String::new();
        for _ in 0..len {
            match self.current_char() {
                Some(c) if c.is_ascii_hexdigit() => {
                    digits.push(c);
                    self.advance();
                }
                other => {
                    let mut sequence = format!("{}{}", marker, digits);
                    sequence.extend(other);
                    return Err(LexError::InvalidEscape {
                        sequence,
                        position: escape_start,
                    });
                }
            }
        }
        u32::from_str_radix(&digits, 16).map_err(|_| LexError::InvalidEscape {
            sequence: format!("{}{}", marker, digits),
            position: escape_start,
        })
    }

    /// `\uXXXX`, pairing a high surrogate with a following `\uXXXX` low one.
    fn read_unicode_escape(&mut self, escape_start: usize) -> Result<char, LexError> {
        let high = self.read_hex('u', 4, escape_start)?;

        if (0xD800..=0xDBFF).contains(&high)
            && self.current_char() == Some('\\')
            && self.peek_char(1) == Some('u')
        {
            let checkpoint = self.position;
            self.position += 2;
            let low = self.read_hex('u', 4, checkpoint)?;
            if (0xDC00..=0xDFFF).contains(&low) {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(combined) {
                    return Ok(c);
                }
            }
        }

        char::from_u32(high).ok_or_else(|| LexError::InvalidEscape {
            sequence: format!("u{:04X}", high),
            position: escape_start,
        })
    }

    fn read_regex(&mut self, start: usize) -> Result<TokenKind, LexError> {
        self.advance(); // opening slash
        let mut pattern = String::new();
        let mut in_class = false;

        loop {
            let Some(ch) = self.current_char() else {
                return Err(LexError::UnterminatedRegex { position: start });
            };
            match ch {
                '\n' | '\r' => return Err(LexError::UnterminatedRegex { position: start }),
                '\\' => {
                    pattern.push(ch);
                    self.advance();
                    match self.current_char() {
                        Some(next) if next != '\n' && next != '\r' => {
                            pattern.push(next);
                            self.advance();
                        }
                        _ => return Err(LexError::UnterminatedRegex { position: start }),
                    }
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                    self.advance();
                }
                ']' if in_class => {
                    in_class = false;
                    pattern.push(ch);
                    self.advance();
                }
                '/' if !in_class => {
                    self.advance();
                    break;
                }
                _ => {
                    pattern.push(ch);
                    self.advance();
                }
            }
        }

        if pattern.is_empty() {
            return Err(LexError::UnexpectedChar {
                ch: '/',
                position: start,
            });
        }

        let flags = self.read_identifier();
        let mut seen = HashSet::new();
        if !flags.chars().all(|c| REGEX_FLAGS.contains(c) && seen.insert(c)) {
            return Err(LexError::InvalidRegexFlags {
                flags,
                position: start,
            });
        }

        Ok(TokenKind::Regex { pattern, flags })
    }

    /// Updates the context flags from the token just emitted.
    fn record(&mut self, token: &Token) {
        self.after_dot = token.is_punctuation('.');
        self.value_expected = match &token.kind {
            TokenKind::Operator(_) | TokenKind::Arrow => true,
            TokenKind::Punctuation(c) => matches!(c, '(' | '[' | '{' | ',' | ':' | '.' | ';'),
            _ => false,
        };
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;

        let kind = match self.current_char() {
            None => TokenKind::Eof,
            Some(ch) if ch.is_ascii_digit() => self.read_number(start)?,
            Some('.') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)?
            }
            Some(quote @ ('"' | '\'')) => TokenKind::String(self.read_string(quote, start)?),
            Some('/') if self.value_expected => self.read_regex(start)?,
            Some(ch) if PUNCTUATION.contains(ch) => {
                self.advance();
                TokenKind::Punctuation(ch)
            }
            Some(ch) if OPERATOR_CHARS.contains(ch) => self.read_operator(start)?,
            Some(ch) if is_identifier_start(ch) => self.read_word(start)?,
            Some(ch) => return Err(LexError::UnexpectedChar { ch, position: start }),
        };

        let raw: String = self.input[start..self.position].iter().collect();
        let token = Token::new(kind, raw, start);
        self.record(&token);
        trace!(position = start, raw = %token.raw, "token");
        Ok(token)
    }

    /// Lexes the remaining input, ending with the `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Decodes the text of a numeric literal: hex, legacy octal or decimal.
fn parse_number(raw: &str) -> Option<f64> {
    if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return parse_radix(digits, 16);
    }
    if raw.len() > 1 && raw.starts_with('0') && raw[1..].chars().all(|c| c.is_digit(8)) {
        return parse_radix(&raw[1..], 8);
    }
    if raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return raw.parse::<f64>().ok();
    }
    None
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0f64, |acc, c| {
        c.to_digit(radix)
            .map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

#[test]
fn test_atoms_and_word_operators() {
    let mut lexer = Lexer::new("true null typeof in");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Atom(Atom::True));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Atom(Atom::Null));
    assert_eq!(
        lexer.next_token().unwrap().kind,
        TokenKind::Operator(Operator::Typeof)
    );
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Operator(Operator::In));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_parse_number_forms() {
    assert_eq!(parse_number("0x1F"), Some(31.0));
    assert_eq!(parse_number("017"), Some(15.0));
    assert_eq!(parse_number("019"), Some(19.0));
    assert_eq!(parse_number("1.5e2"), Some(150.0));
    assert_eq!(parse_number("0x"), None);
    assert_eq!(parse_number("1e"), None);
    assert_eq!(parse_number("12abc"), None);
}
