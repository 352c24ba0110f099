//! Lexer for the kidshell math language.
//!
//! Converts an expression into a stream of tokens using the logos lexer
//! generator. Only expression syntax exists here: there are no statements,
//! no attribute access and no assignment.
//!
//! # Token Categories
//!
//! - **Literals**: integers, floats (`1.5`, `.5`, `2e3`), strings, `True`/`False`
//! - **Operators**: `+ - * / // % **`, comparisons, `and`/`or`/`not`
//! - **Punctuation**: `( ) [ ] ,`
//! - **Identifiers**: variables, constants and function names

use logos::{Logos, Span};
use std::fmt;

/// A token with its span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexerError {
    #[default]
    UnexpectedCharacter,
    InvalidEscape,
    /// Literal too long to represent.
    InvalidNumber,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter => write!(f, "unexpected character"),
            LexerError::InvalidEscape => write!(f, "invalid escape sequence"),
            LexerError::InvalidNumber => write!(f, "invalid number"),
        }
    }
}

/// Tokens produced by the math lexer.
///
/// Keywords are `#[token]`s so they win over the identifier regex at equal length.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[token("True")]
    True,

    #[token("False")]
    False,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    #[regex(r"[0-9]+", lex_int)]
    Int(i128),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", lex_float)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", lex_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", lex_float)]
    Float(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, lex_string)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, lex_string)]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("**")]
    DoubleStar,

    #[token("*")]
    #[token("×")]
    Star,

    #[token("//")]
    DoubleSlash,

    #[token("/")]
    #[token("÷")]
    Slash,

    #[token("%")]
    Percent,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("<=")]
    Le,

    #[token(">=")]
    Ge,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(x) => write!(f, "{x}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::DoubleStar => write!(f, "**"),
            Token::Star => write!(f, "*"),
            Token::DoubleSlash => write!(f, "//"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Lex an integer literal.
fn lex_int(lex: &mut logos::Lexer<Token>) -> Result<i128, LexerError> {
    lex.slice().parse().map_err(|_| LexerError::InvalidNumber)
}

/// Lex a float literal.
fn lex_float(lex: &mut logos::Lexer<Token>) -> Result<f64, LexerError> {
    lex.slice().parse().map_err(|_| LexerError::InvalidNumber)
}

/// Lex a quoted string literal, processing escape sequences.
fn lex_string(lex: &mut logos::Lexer<Token>) -> Result<String, LexerError> {
    let s = lex.slice();
    parse_string_literal(&s[1..s.len() - 1])
}

fn parse_string_literal(body: &str) -> Result<String, LexerError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            _ => return Err(LexerError::InvalidEscape),
        }
    }
    Ok(out)
}

/// Tokenize an expression, collecting every lexer error.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Spanned<LexerError>>> {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, span) in lexer.spanned() {
        match result {
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(err) => errors.push(Spanned::new(err, span)),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("lex ok")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            kinds("2 ** 3 // 4 <= 5"),
            vec![
                Token::Int(2),
                Token::DoubleStar,
                Token::Int(3),
                Token::DoubleSlash,
                Token::Int(4),
                Token::Le,
                Token::Int(5),
            ]
        );
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(kinds("1.5"), vec![Token::Float(1.5)]);
        assert_eq!(kinds(".5"), vec![Token::Float(0.5)]);
        assert_eq!(kinds("2e3"), vec![Token::Float(2000.0)]);
        assert_eq!(kinds("5."), vec![Token::Float(5.0)]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("not True and android"),
            vec![
                Token::Not,
                Token::True,
                Token::And,
                Token::Ident("android".into()),
            ]
        );
    }

    #[test]
    fn test_kid_symbols_alias_operators() {
        assert_eq!(kinds("6 × 7"), vec![Token::Int(6), Token::Star, Token::Int(7)]);
        assert_eq!(kinds("8 ÷ 2"), vec![Token::Int(8), Token::Slash, Token::Int(2)]);
    }

    #[test]
    fn test_strings_unescape() {
        assert_eq!(kinds(r#""a\"b""#), vec![Token::Str("a\"b".into())]);
        assert_eq!(kinds("'hi'"), vec![Token::Str("hi".into())]);
    }

    #[test]
    fn test_errors() {
        let errors = tokenize("2 = 3").expect_err("bare = is not a token");
        assert_eq!(errors[0].token, LexerError::UnexpectedCharacter);
        assert_eq!(errors[0].span, 2..3);

        let errors = tokenize("'open").expect_err("unterminated");
        assert_eq!(errors[0].token, LexerError::UnexpectedCharacter);

        let huge = "9".repeat(60);
        let errors = tokenize(&huge).expect_err("too long for i128");
        assert_eq!(errors[0].token, LexerError::InvalidNumber);
    }
}
