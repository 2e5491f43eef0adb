//! Parser for converting tokens into a rule AST
//!
//! Recursive descent with `||` binding looser than `&&`:
//!
//! ```text
//! rule    := or EOF
//! or      := and ( "||" and )*
//! and     := primary ( "&&" primary )*
//! primary := "(" or ")" | IDENT [ "(" [ arg ( "," arg )* ] ")" | "==" operand ]
//! arg     := literal | or
//! operand := literal | IDENT | "(" or ")"
//! literal := INTEGER | FLOAT | STRING | BOOLEAN
//! ```
//!
//! The right side of `==` is a single operand, so `min==limit && max==10`
//! is two comparisons.

use crate::ast::{ArgExpr, Expr};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Parse a rule string into an expression tree
pub fn parse_expr(input: &str) -> ParseResult<Expr> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.len() == 1 {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or()?;
    parser.expect(&TokenKind::Eof, "end of input")?;
    Ok(expr)
}

/// Parser over a token list
struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let first = self.parse_and()?;
        if self.current().kind != TokenKind::Or {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.eat(&TokenKind::Or) {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::Or(operands))
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let first = self.parse_primary()?;
        if self.current().kind != TokenKind::And {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.eat(&TokenKind::And) {
            operands.push(self.parse_primary()?);
        }
        Ok(Expr::And(operands))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::LeftParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name, args })
                } else if self.eat(&TokenKind::Equal) {
                    let value = self.parse_operand()?;
                    Ok(Expr::Eq {
                        name,
                        value: Box::new(value),
                    })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            other => Err(ParseError::unexpected(
                "identifier or '('",
                other.to_string(),
                token.position,
            )),
        }
    }

    /// Parse call arguments; the opening paren is already consumed.
    fn parse_args(&mut self) -> ParseResult<Vec<ArgExpr>> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::RightParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_arg()?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RightParen, "',' or ')'")?;
            return Ok(args);
        }
    }

    fn parse_arg(&mut self) -> ParseResult<ArgExpr> {
        match self.parse_literal() {
            Some(literal) => Ok(literal),
            None => Ok(ArgExpr::Expr(Box::new(self.parse_or()?))),
        }
    }

    /// The right side of `==`: a literal, one identifier, or a parenthesized rule.
    fn parse_operand(&mut self) -> ParseResult<ArgExpr> {
        if let Some(literal) = self.parse_literal() {
            return Ok(literal);
        }

        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(ArgExpr::Expr(Box::new(Expr::Ident(name))))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(ArgExpr::Expr(Box::new(expr)))
            }
            other => Err(ParseError::unexpected(
                "literal, identifier or '('",
                other.to_string(),
                token.position,
            )),
        }
    }

    fn parse_literal(&mut self) -> Option<ArgExpr> {
        let literal = match &self.current().kind {
            TokenKind::Integer(n) => ArgExpr::Integer(*n),
            TokenKind::Float(n) => ArgExpr::Float(*n),
            TokenKind::String(s) => ArgExpr::String(s.clone()),
            TokenKind::Boolean(b) => ArgExpr::Boolean(*b),
            _ => return None,
        };
        self.advance();
        Some(literal)
    }

    fn current(&self) -> &Token {
        // The token list always ends with Eof and we never advance past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            let token = self.current();
            Err(ParseError::unexpected(
                expected,
                token.kind.to_string(),
                token.position,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("a || b && c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(vec![ident("a"), Expr::And(vec![ident("b"), ident("c")])])
        );
    }

    #[test]
    fn test_flattened_chains() {
        let expr = parse_expr("a && b && c").unwrap();
        assert_eq!(expr, Expr::And(vec![ident("a"), ident("b"), ident("c")]));
    }

    #[test]
    fn test_eq_and_call() {
        let expr = parse_expr("zero || (min==3 && max(10))").unwrap();
        assert_eq!(
            expr,
            Expr::Or(vec![
                ident("zero"),
                Expr::And(vec![
                    Expr::Eq {
                        name: "min".into(),
                        value: Box::new(ArgExpr::Integer(3)),
                    },
                    Expr::Call {
                        name: "max".into(),
                        args: vec![ArgExpr::Integer(10)],
                    },
                ]),
            ])
        );
    }

    #[test]
    fn test_nested_validator_argument() {
        let expr = parse_expr("array(min(1) && max(3), zero)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "array".into(),
                args: vec![
                    ArgExpr::Expr(Box::new(Expr::And(vec![
                        Expr::Call {
                            name: "min".into(),
                            args: vec![ArgExpr::Integer(1)],
                        },
                        Expr::Call {
                            name: "max".into(),
                            args: vec![ArgExpr::Integer(3)],
                        },
                    ]))),
                    ArgExpr::Expr(Box::new(ident("zero"))),
                ],
            }
        );
    }

    #[test]
    fn test_eq_takes_one_operand() {
        let eq = |name: &str, value: ArgExpr| Expr::Eq {
            name: name.into(),
            value: Box::new(value),
        };
        let expr = parse_expr("min==limit && max==10").unwrap();
        assert_eq!(
            expr,
            Expr::And(vec![
                eq("min", ArgExpr::Expr(Box::new(ident("limit")))),
                eq("max", ArgExpr::Integer(10)),
            ])
        );

        let expr = parse_expr("array==(zero || short) || max==3").unwrap();
        assert_eq!(
            expr,
            Expr::Or(vec![
                eq(
                    "array",
                    ArgExpr::Expr(Box::new(Expr::Or(vec![ident("zero"), ident("short")])))
                ),
                eq("max", ArgExpr::Integer(3)),
            ])
        );

        assert!(matches!(
            parse_expr("min==&&"),
            Err(ParseError::UnexpectedToken { position: 5, .. })
        ));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_expr("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_expr("min(1"),
            Err(ParseError::UnexpectedToken { position: 5, .. })
        ));
        assert!(matches!(
            parse_expr("a b"),
            Err(ParseError::UnexpectedToken { position: 2, .. })
        ));
        assert!(matches!(
            parse_expr("&& a"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
    }
}
