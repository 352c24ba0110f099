//! Recursive descent parser for the math language.
//!
//! Precedence, loosest first:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | or | `or` |
//! | and | `and` |
//! | not | `not` (prefix) |
//! | comparison | `< <= > >= == !=` (chainable) |
//! | sum | `+ -` |
//! | term | `* / // %` |
//! | unary | `+ -` (prefix) |
//! | power | `**` (right associative, binds tighter than a unary minus on its left) |
//! | primary | literals, names, calls, `( )`, `[ ]` |

use super::ast::{BinaryOp, CompareOp, Expr, LogicalOp, UnaryOp};
use super::SafeMathError;
use crate::lexer::{tokenize, Spanned, Token};

/// Maximum nesting of parentheses, calls and prefix operators.
const MAX_DEPTH: usize = 64;

/// Parse a complete expression.
pub fn parse(source: &str) -> Result<Expr, SafeMathError> {
    let tokens = tokenize(source).map_err(|errors| {
        let first = &errors[0];
        SafeMathError::InvalidExpression(format!(
            "{} at position {}",
            first.token, first.span.start
        ))
    })?;

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned<Token>>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone())?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), SafeMathError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{expected}'")))
        }
    }

    fn expect_end(&self) -> Result<(), SafeMathError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unexpected("expected end of expression")),
        }
    }

    fn unexpected(&self, context: &str) -> SafeMathError {
        match self.tokens.get(self.pos) {
            Some(spanned) => SafeMathError::InvalidExpression(format!(
                "unexpected '{}' at position {} ({context})",
                spanned.token, spanned.span.start
            )),
            None => SafeMathError::InvalidExpression(format!(
                "unexpected end of expression ({context})"
            )),
        }
    }

    fn enter(&mut self) -> Result<(), SafeMathError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SafeMathError::InvalidExpression(
                "expression is nested too deeply".to_string(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse a full expression: `or` is the lowest precedence.
    fn parse_expr(&mut self) -> Result<Expr, SafeMathError> {
        self.enter()?;
        let result = self.parse_or();
        self.leave();
        result
    }

    fn parse_or(&mut self) -> Result<Expr, SafeMathError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SafeMathError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, SafeMathError> {
        if self.eat(&Token::Not) {
            self.enter()?;
            let operand = self.parse_not();
            self.leave();
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand?),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SafeMathError> {
        let first = self.parse_sum()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                Some(Token::EqEq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::Ne,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_sum()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    /// Parse a sum: handles + and -.
    fn parse_sum(&mut self) -> Result<Expr, SafeMathError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse a term: handles * / // %.
    fn parse_term(&mut self) -> Result<Expr, SafeMathError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary operators: + and - prefix.
    fn parse_unary(&mut self) -> Result<Expr, SafeMathError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    /// Parse `primary ** unary`; the exponent may carry its own sign.
    fn parse_power(&mut self) -> Result<Expr, SafeMathError> {
        let base = self.parse_primary()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.parse_unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, SafeMathError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("expected a value"));
        };

        match token {
            Token::Int(n) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            Token::Float(x) => {
                self.advance();
                Ok(Expr::Float(x))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::LParen) {
                    let args = self.parse_items(Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LParen => {
                self.advance();
                let first = self.parse_expr()?;
                if self.eat(&Token::RParen) {
                    return Ok(first);
                }
                self.expect(Token::Comma)?;
                let mut items = vec![first];
                items.extend(self.parse_items(Token::RParen)?);
                Ok(Expr::List(items))
            }
            Token::LBracket => {
                self.advance();
                Ok(Expr::List(self.parse_items(Token::RBracket)?))
            }
            _ => Err(self.unexpected("expected a value")),
        }
    }

    /// Comma separated items up to `close`; a trailing comma is allowed.
    fn parse_items(&mut self, close: Token) -> Result<Vec<Expr>, SafeMathError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
