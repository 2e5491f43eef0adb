//! Lexer for tokenizing rule strings
//!
//! Converts a rule such as `zero || (min==3 && max(10))` into tokens.

use crate::error::{ParseError, ParseResult};
use crate::token::{Token, TokenKind};

/// Lexer over a rule string
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from an input string
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenize the entire input string, ending with an `Eof` token
    pub fn tokenize(&mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity((self.input.len() / 4).max(4));

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let start = self.position;
        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        let kind = match ch {
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            ',' => self.single(TokenKind::Comma),
            '&' if self.peek() == Some('&') => self.double(TokenKind::And),
            '|' if self.peek() == Some('|') => self.double(TokenKind::Or),
            '=' if self.peek() == Some('=') => self.double(TokenKind::Equal),
            '"' | '\'' => self.read_string(ch)?,
            '-' | '+' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            ch if ch.is_ascii_digit() => self.read_number()?,
            ch if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
            _ => {
                return Err(ParseError::UnexpectedChar {
                    ch,
                    position: start,
                });
            }
        };

        Ok(Token::new(kind, start))
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek(&self) -> Option<char> {
        let current = self.current_char()?;
        self.input[self.position + current.len_utf8()..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        self.advance();
        kind
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> ParseResult<TokenKind> {
        let start = self.position;
        self.advance();

        let mut value = String::new();
        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                c if c == quote => return Ok(TokenKind::String(value)),
                '\\' => {
                    let Some(escaped) = self.current_char() else {
                        break;
                    };
                    self.advance();
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                other => value.push(other),
            }
        }

        Err(ParseError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> ParseResult<TokenKind> {
        let start = self.position;
        if matches!(self.current_char(), Some('-' | '+')) {
            self.advance();
        }

        let mut is_float = false;
        while let Some(ch) = self.current_char() {
            match ch {
                '0'..='9' | '_' => self.advance(),
                '.' if !is_float && self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    is_float = true;
                    self.advance();
                }
                'e' | 'E' => {
                    is_float = true;
                    self.advance();
                    if matches!(self.current_char(), Some('-' | '+')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }

        let text: String = self.input[start..self.position]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let invalid = || ParseError::InvalidNumber {
            text: self.input[start..self.position].to_string(),
            position: start,
        };

        if is_float {
            text.parse().map(TokenKind::Float).map_err(|_| invalid())
        } else {
            text.parse().map(TokenKind::Integer).map_err(|_| invalid())
        }
    }

    fn read_identifier(&mut self) -> TokenKind {
        let start = self.position;
        while self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }

        match &self.input[start..self.position] {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            ident => TokenKind::Ident(ident.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_and_calls() {
        assert_eq!(
            kinds("zero || (min==3 && max(10))"),
            vec![
                TokenKind::Ident("zero".into()),
                TokenKind::Or,
                TokenKind::LeftParen,
                TokenKind::Ident("min".into()),
                TokenKind::Equal,
                TokenKind::Integer(3),
                TokenKind::And,
                TokenKind::Ident("max".into()),
                TokenKind::LeftParen,
                TokenKind::Integer(10),
                TokenKind::RightParen,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"f(-1, 2.5, 1e3, "a\"b", 'c', true)"#),
            vec![
                TokenKind::Ident("f".into()),
                TokenKind::LeftParen,
                TokenKind::Integer(-1),
                TokenKind::Comma,
                TokenKind::Float(2.5),
                TokenKind::Comma,
                TokenKind::Float(1000.0),
                TokenKind::Comma,
                TokenKind::String("a\"b".into()),
                TokenKind::Comma,
                TokenKind::String("c".into()),
                TokenKind::Comma,
                TokenKind::Boolean(true),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new(r#"oneof("a"#).tokenize().unwrap_err();
        assert_eq!(err, ParseError::UnterminatedString { position: 6 });
    }

    #[test]
    fn test_single_ampersand_is_rejected() {
        let err = Lexer::new("a & b").tokenize().unwrap_err();
        assert_eq!(err, ParseError::UnexpectedChar { ch: '&', position: 2 });
    }
}
