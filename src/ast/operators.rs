use std::fmt;

/// Operators the lexer accepts.
///
/// Anything else in the JS operator table (assignment, `++`, bitwise, ...)
/// is rejected during lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    In,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    Typeof,
    Void,
    /// `?` of the conditional operator
    Question,
    /// `|` of a filter pipeline
    Pipe,
}

impl Operator {
    /// Looks up a supported operator by its spelling.
    pub fn from_spelling(s: &str) -> Option<Operator> {
        let op = match s {
            "||" => Operator::Or,
            "&&" => Operator::And,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "===" => Operator::StrictEqual,
            "!==" => Operator::StrictNotEqual,
            "<" => Operator::LessThan,
            ">" => Operator::GreaterThan,
            "<=" => Operator::LessEqual,
            ">=" => Operator::GreaterEqual,
            "in" => Operator::In,
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Star,
            "/" => Operator::Slash,
            "%" => Operator::Percent,
            "!" => Operator::Not,
            "typeof" => Operator::Typeof,
            "void" => Operator::Void,
            "?" => Operator::Question,
            "|" => Operator::Pipe,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::StrictEqual => "===",
            Operator::StrictNotEqual => "!==",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::In => "in",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Not => "!",
            Operator::Typeof => "typeof",
            Operator::Void => "void",
            Operator::Question => "?",
            Operator::Pipe => "|",
        }
    }

    /// The binary operator this token denotes, if any.
    pub fn binary(&self) -> Option<BinOp> {
        let op = match self {
            Operator::Or => BinOp::Or,
            Operator::And => BinOp::And,
            Operator::Equal => BinOp::Equal,
            Operator::NotEqual => BinOp::NotEqual,
            Operator::StrictEqual => BinOp::StrictEqual,
            Operator::StrictNotEqual => BinOp::StrictNotEqual,
            Operator::LessThan => BinOp::LessThan,
            Operator::GreaterThan => BinOp::GreaterThan,
            Operator::LessEqual => BinOp::LessEqual,
            Operator::GreaterEqual => BinOp::GreaterEqual,
            Operator::In => BinOp::In,
            Operator::Plus => BinOp::Add,
            Operator::Minus => BinOp::Subtract,
            Operator::Star => BinOp::Multiply,
            Operator::Slash => BinOp::Divide,
            Operator::Percent => BinOp::Modulo,
            _ => return None,
        };
        Some(op)
    }

    /// The prefix operator this token denotes, if any.
    pub fn unary(&self) -> Option<UnaryOp> {
        let op = match self {
            Operator::Not => UnaryOp::Not,
            Operator::Minus => UnaryOp::Negate,
            Operator::Plus => UnaryOp::Plus,
            Operator::Typeof => UnaryOp::Typeof,
            Operator::Void => UnaryOp::Void,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Logical
    /// Logical OR (`||`)
    Or,
    /// Logical AND (`&&`)
    And,

    // Equality
    /// Loose equal (`==`)
    Equal,
    /// Loose not equal (`!=`)
    NotEqual,
    /// Strict equal (`===`)
    StrictEqual,
    /// Strict not equal (`!==`)
    StrictNotEqual,

    // Relational
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Property membership (`in`)
    In,

    // Arithmetic
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Remainder (`%`)
    Modulo,
}

impl BinOp {
    /// Binding power, 1 (loosest) to 6 (tightest).
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Equal | BinOp::NotEqual | BinOp::StrictEqual | BinOp::StrictNotEqual => 3,
            BinOp::LessThan
            | BinOp::GreaterThan
            | BinOp::LessEqual
            | BinOp::GreaterEqual
            | BinOp::In => 4,
            BinOp::Add | BinOp::Subtract => 5,
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::StrictEqual => "===",
            BinOp::StrictNotEqual => "!==",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::In => "in",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
        }
    }

    /// Word operators need a space before their operand.
    pub fn is_word(&self) -> bool {
        matches!(self, UnaryOp::Typeof | UnaryOp::Void)
    }
}
