//! Error types for rule-expression parsing
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;

/// Errors raised while tokenizing or parsing a rule expression.
///
/// Positions are byte offsets into the rule string.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The rule string contains nothing but whitespace
    #[error("empty rule expression")]
    Empty,

    /// A character that cannot start any token
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    /// A string literal without its closing quote
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    /// A numeric literal that does not fit its type
    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber { text: String, position: usize },

    /// The token stream does not match the grammar
    #[error("expected {expected} at position {position}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },
}

impl ParseError {
    /// Get error code for categorization
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "RULE:EMPTY",
            Self::UnexpectedChar { .. } => "RULE:CHAR",
            Self::UnterminatedString { .. } => "RULE:STRING",
            Self::InvalidNumber { .. } => "RULE:NUMBER",
            Self::UnexpectedToken { .. } => "RULE:SYNTAX",
        }
    }

    pub(crate) fn unexpected(
        expected: &'static str,
        found: impl Into<String>,
        position: usize,
    ) -> Self {
        Self::UnexpectedToken {
            expected,
            found: found.into(),
            position,
        }
    }
}

/// Result type alias for parsing
pub type ParseResult<T> = Result<T, ParseError>;
