use std::mem;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Atom, BinOp, FilterStage, Literal, LiteralValue, Node, ObjectKey, ObjectProperty,
        Operator, PropertyKey, Symbol, Token, TokenKind,
    },
    lexer::{LexError, Lexer},
};

/// Grammar errors. Lexing failures surface through [`ParseError::Lex`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Unexpected {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("Arrow function parameters must be plain names (position {position})")]
    InvalidArrowParams { position: usize },

    #[error("Comma expressions are not allowed inside parentheses (position {position})")]
    CommaExpression { position: usize },

    #[error("Filter stage must be a name or a call of a name (position {position})")]
    InvalidFilter { position: usize },

    #[error("Object keys must be names, strings or numbers (position {position})")]
    InvalidObjectKey { position: usize },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    /// Convenience constructor over a source string.
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        Parser::new(Lexer::new(source))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current_token, next))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current_token.kind.to_string(),
            position: self.current_token.position,
        }
    }

    fn expect_punctuation(&mut self, c: char) -> Result<(), ParseError> {
        if !self.current_token.is_punctuation(c) {
            return Err(self.unexpected(&format!("'{}'", c)));
        }
        self.advance()?;
        Ok(())
    }

    fn check_punctuation(&self, c: char) -> bool {
        self.current_token.is_punctuation(c)
    }

    fn check_operator(&self, op: Operator) -> bool {
        self.current_token.is_operator(op)
    }

    /// Parses one complete expression; trailing tokens are an error.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        let expr = self.parse_filter()?;
        if self.current_token.kind != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }
        debug!(kind = expr.kind_name(), "parsed expression");
        Ok(expr)
    }

    /// `expr | name | name(args) ...`
    fn parse_filter(&mut self) -> Result<Node, ParseError> {
        let expr = self.parse_expression()?;

        let mut stages = vec![];
        while self.check_operator(Operator::Pipe) {
            self.advance()?;
            stages.push(self.parse_filter_stage()?);
        }

        if stages.is_empty() {
            Ok(expr)
        } else {
            Ok(Node::Filter {
                expr: Box::new(expr),
                stages,
            })
        }
    }

    fn parse_filter_stage(&mut self) -> Result<FilterStage, ParseError> {
        let position = self.current_token.position;
        match self.parse_postfix()? {
            Node::Symbol(callee) => Ok(FilterStage {
                callee,
                args: vec![],
            }),
            Node::Call { callee, args } => match *callee {
                Node::Symbol(callee) => Ok(FilterStage { callee, args }),
                _ => Err(ParseError::InvalidFilter { position }),
            },
            _ => Err(ParseError::InvalidFilter { position }),
        }
    }

    /// Conditional level: `condition ? yes : alternative`, right-associative.
    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let condition = self.parse_binary(0)?;

        if !self.check_operator(Operator::Question) {
            return Ok(condition);
        }
        self.advance()?;
        let yes = self.parse_expression()?;
        self.expect_punctuation(':')?;
        let alternative = self.parse_expression()?;

        Ok(Node::Conditional {
            condition: Box::new(condition),
            yes: Box::new(yes),
            alternative: Box::new(alternative),
        })
    }

    fn current_binary_op(&self) -> Option<BinOp> {
        match &self.current_token.kind {
            TokenKind::Operator(op) => op.binary(),
            _ => None,
        }
    }

    /// Precedence climbing over [`BinOp::precedence`]; operators of equal
    /// precedence associate to the left.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Node, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.current_binary_op() {
            let precedence = op.precedence();
            if precedence <= min_precedence {
                break;
            }
            self.advance()?;
            let right = self.parse_binary(precedence)?;

            left = Node::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        let op = match &self.current_token.kind {
            TokenKind::Operator(op) => op.unary(),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance()?;
                let expr = self.parse_unary()?; // right-recursive
                Ok(Node::Unary {
                    op,
                    expr: Box::new(expr),
                })
            }
            None => self.parse_postfix(),
        }
    }

    /// An atom followed by any chain of `.name`, `[expr]` and `(args)`.
    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_primary()?;
        if matches!(expr, Node::Arrow { .. }) {
            return Ok(expr);
        }

        loop {
            if self.check_punctuation('.') {
                self.advance()?;

                let name = match &self.current_token.kind {
                    TokenKind::Identifier(name) => name.clone(),
                    _ => return Err(self.unexpected("property name after '.'")),
                };
                self.advance()?;

                expr = Node::Property {
                    object: Box::new(expr),
                    key: PropertyKey::Name(name),
                };
            } else if self.check_punctuation('[') {
                self.advance()?;
                let key = self.parse_expression()?;
                self.expect_punctuation(']')?;

                expr = Node::Property {
                    object: Box::new(expr),
                    key: PropertyKey::Computed(Box::new(key)),
                };
            } else if self.check_punctuation('(') {
                self.advance()?;
                let args = self.parse_list(')')?;

                expr = Node::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    /// A trailing comma is allowed.
    fn parse_list(&mut self, close: char) -> Result<Vec<Node>, ParseError> {
        let mut items = vec![];

        while !self.check_punctuation(close) {
            items.push(self.parse_expression()?);

            if !self.check_punctuation(close) {
                self.expect_punctuation(',')?;
            }
        }

        self.expect_punctuation(close)?;
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let position = self.current_token.position;

        match &self.current_token.kind {
            TokenKind::Punctuation('(') => {
                self.advance()?;
                self.parse_parenthesized(position)
            }
            TokenKind::Punctuation('[') => {
                self.advance()?;
                Ok(Node::Array(self.parse_list(']')?))
            }
            TokenKind::Punctuation('{') => {
                self.advance()?;
                self.parse_object_literal()
            }
            TokenKind::Identifier(_) => {
                let token = self.advance()?;
                let symbol = symbol_from_token(token);

                if self.current_token.kind == TokenKind::Arrow {
                    self.advance()?;
                    let body = self.parse_expression()?;
                    return Ok(Node::Arrow {
                        params: vec![symbol],
                        body: Box::new(body),
                    });
                }
                Ok(Node::Symbol(symbol))
            }
            TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::Atom(_)
            | TokenKind::Regex { .. } => {
                let token = self.advance()?;
                Ok(Node::Literal(literal_from_token(token)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// After `(`: a grouped expression, or the parameter list of an arrow.
    fn parse_parenthesized(&mut self, position: usize) -> Result<Node, ParseError> {
        let items = self.parse_list(')')?;

        if self.current_token.kind == TokenKind::Arrow {
            self.advance()?;

            let mut params = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Node::Symbol(symbol) => params.push(symbol),
                    _ => return Err(ParseError::InvalidArrowParams { position }),
                }
            }

            let body = self.parse_expression()?;
            return Ok(Node::Arrow {
                params,
                body: Box::new(body),
            });
        }

        let mut items = items.into_iter();
        match (items.next(), items.next()) {
            (Some(expr), None) => Ok(Node::Parentheses(Box::new(expr))),
            (Some(_), Some(_)) => Err(ParseError::CommaExpression { position }),
            (None, _) => Err(self.unexpected("'=>' after empty parentheses")),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Node, ParseError> {
        let mut properties = vec![];

        while !self.check_punctuation('}') {
            let position = self.current_token.position;
            let key = match &self.current_token.kind {
                TokenKind::Identifier(_) => ObjectKey::Symbol(symbol_from_token(self.advance()?)),
                TokenKind::String(_) | TokenKind::Number(_) | TokenKind::Atom(_) => {
                    ObjectKey::Literal(literal_from_token(self.advance()?))
                }
                _ => return Err(ParseError::InvalidObjectKey { position }),
            };

            self.expect_punctuation(':')?;

            let value = self.parse_expression()?;
            properties.push(ObjectProperty { key, value });

            if !self.check_punctuation('}') {
                self.expect_punctuation(',')?;
            }
        }

        self.expect_punctuation('}')?;
        Ok(Node::Object(properties))
    }
}

fn symbol_from_token(token: Token) -> Symbol {
    match token.kind {
        TokenKind::Identifier(name) => Symbol {
            name,
            raw: token.raw,
        },
        _ => Symbol::new(token.raw),
    }
}

fn literal_from_token(token: Token) -> Literal {
    let value = match token.kind {
        TokenKind::String(s) => LiteralValue::String(s),
        TokenKind::Number(n) => LiteralValue::Number(n),
        TokenKind::Atom(Atom::True) => LiteralValue::Boolean(true),
        TokenKind::Atom(Atom::False) => LiteralValue::Boolean(false),
        TokenKind::Atom(Atom::Null) => LiteralValue::Null,
        TokenKind::Regex { pattern, flags } => LiteralValue::Regex { pattern, flags },
        _ => LiteralValue::String(token.raw.clone()),
    };
    Literal {
        value,
        raw: token.raw,
    }
}

/// Parses a complete expression from source text.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    Parser::from_source(source)?.parse()
}
