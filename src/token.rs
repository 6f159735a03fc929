//! Token definitions for Slanguage
//!
//! This module defines all the tokens that the lexer can produce. The
//! `logos` derive on [`TokenKind`] carries the whole scanning table:
//! keywords, literals, operators, punctuation, and the keyword-delimited
//! comment forms (`Cancelled` to end of line, `Blocked` .. `Unblocked`).

use crate::lexer::LexError;
use crate::span::Span;
use logos::{Logos, Skip};
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the text of this token from source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// All possible token types in Slanguage
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // ============ Literals ============

    /// Integer literal: 42
    #[regex(r"[0-9]+")]
    Int,

    /// Float literal: 3.14, .5, 2.
    ///
    /// At most one decimal point; a second one in the same run of digits is
    /// a lex error rather than two adjacent literals.
    #[regex(r"[0-9]*\.[0-9]*")]
    #[regex(r"[0-9]*\.[0-9]*\.[0-9.]*", more_than_one_decimal_point)]
    Float,

    /// Character literal: 'a'
    #[regex(r"'[^']'")]
    CharLit,

    /// String literal: "hello" (no escape processing)
    #[regex(r#""[^"]*""#)]
    #[regex(r#""[^"]*"#, unterminated_string)]
    Str,

    /// Boolean literal `facts` (true)
    #[token("facts")]
    Facts,

    /// Boolean literal `cap` (false)
    #[token("cap")]
    Cap,

    // ============ Keywords ============

    /// `pluh` introduces a function definition
    #[token("pluh")]
    Def,

    /// `plug` introduces an extern declaration
    #[token("plug")]
    Extern,

    /// `cookUp` introduces a variable declaration
    #[token("cookUp")]
    Let,

    /// `spillingTheTeaAbout` introduces the module
    #[token("spillingTheTeaAbout")]
    Program,

    /// `gang` (arrays; lexed but not lowered)
    #[token("gang")]
    Array,

    // ============ Control flow ============

    #[token("fr?")]
    If,
    #[token("ong?")]
    Elseif,
    #[token("justLikeThat?")]
    Else,
    #[token("holdUp")]
    While,
    /// `ratioed` (for loops; lexed but not lowered)
    #[token("ratioed")]
    For,
    #[token("ghost")]
    Break,
    #[token("rizz")]
    Continue,
    /// `yeet` and its synonym `periodt`
    #[token("yeet")]
    #[token("periodt")]
    Return,

    // ============ Comments ============
    // Comment openers are matched as tokens so they win over identifier
    // recognition; the callbacks consume the comment body and skip.
    #[token("Cancelled", line_comment)]
    LineComment,

    #[token("Blocked", block_comment)]
    BlockComment,

    // ============ Operators ============

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    #[token("=")]
    Eq,
    #[token("!")]
    Not,

    // ============ Punctuation ============

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,

    // ============ Identifiers ============

    /// Identifier: starts alphabetic, continues with alphanumerics, `_`, or
    /// `?` (so `fr?`-style keywords and names lex as single words)
    #[regex(r"[a-zA-Z][a-zA-Z0-9_?]*")]
    Ident,

    // ============ Special ============

    /// End of file
    Eof,
}

fn line_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> Skip {
    let rest = lex.remainder();
    let end = rest.find('\n').unwrap_or(rest.len());
    lex.bump(end);
    Skip
}

fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> Skip {
    let rest = lex.remainder();
    match rest.find("Unblocked") {
        Some(pos) => lex.bump(pos + "Unblocked".len()),
        // Unterminated block comment runs to end of input.
        None => lex.bump(rest.len()),
    }
    Skip
}

fn unterminated_string(lex: &mut logos::Lexer<'_, TokenKind>) -> Result<(), LexError> {
    Err(LexError::UnterminatedString(lex.slice().to_string()))
}

fn more_than_one_decimal_point(lex: &mut logos::Lexer<'_, TokenKind>) -> Result<(), LexError> {
    Err(LexError::MoreThanOneDecimalPoint(lex.slice().to_string()))
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::CharLit => "char literal",
            TokenKind::Str => "string literal",
            TokenKind::Facts => "facts",
            TokenKind::Cap => "cap",
            TokenKind::Def => "pluh",
            TokenKind::Extern => "plug",
            TokenKind::Let => "cookUp",
            TokenKind::Program => "spillingTheTeaAbout",
            TokenKind::Array => "gang",
            TokenKind::If => "fr?",
            TokenKind::Elseif => "ong?",
            TokenKind::Else => "justLikeThat?",
            TokenKind::While => "holdUp",
            TokenKind::For => "ratioed",
            TokenKind::Break => "ghost",
            TokenKind::Continue => "rizz",
            TokenKind::Return => "yeet",
            TokenKind::LineComment => "comment",
            TokenKind::BlockComment => "comment",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Eq => "=",
            TokenKind::Not => "!",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Pipe => "|",
            TokenKind::Ident => "identifier",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
