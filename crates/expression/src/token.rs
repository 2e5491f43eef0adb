//! Token definitions for the rule lexer

use std::fmt;

/// Kinds of tokens produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier such as `min` or `oneof`
    Ident(String),
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Float(f64),
    /// String literal with escapes already processed
    String(String),
    /// `true` / `false`
    Boolean(bool),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==`
    Equal,
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier '{name}'"),
            Self::Integer(n) => write!(f, "integer {n}"),
            Self::Float(n) => write!(f, "float {n}"),
            Self::String(s) => write!(f, "string {s:?}"),
            Self::Boolean(b) => write!(f, "boolean {b}"),
            Self::LeftParen => f.write_str("'('"),
            Self::RightParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
            Self::And => f.write_str("'&&'"),
            Self::Or => f.write_str("'||'"),
            Self::Equal => f.write_str("'=='"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Self { kind, position }
    }
}
