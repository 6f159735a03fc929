//! Lexer for Slanguage
//!
//! The lexer converts source code into a stream of tokens, drawn one at a
//! time on demand. It uses the `logos` crate for the scanning tables; the
//! token patterns themselves live in [`crate::token`].

use crate::span::Span;
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors
///
/// All of these are fatal for the running compilation.
#[derive(Error, Debug, Clone, PartialEq, Default)]
pub enum LexError {
    /// Produced by the scanner for input no pattern matches; the lexer
    /// wrapper replaces it with [`LexError::InvalidLiteral`] carrying the
    /// offending text.
    #[default]
    #[error("invalid literal")]
    Invalid,

    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("unterminated string literal: {0}")]
    UnterminatedString(String),

    #[error("more than one decimal point in number: {0}")]
    MoreThanOneDecimalPoint(String),
}

/// The lexer for Slanguage
///
/// Not restartable mid-stream; create a fresh instance to re-scan.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
        }
    }

    /// Get the source code
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Get the next token
    ///
    /// The final token is [`TokenKind::Eof`]; further calls keep
    /// returning it.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Ok(Token::new(kind, Span::new(span.start, span.end)))
            }
            Some(Err(LexError::Invalid)) => {
                Err(LexError::InvalidLiteral(self.inner.slice().to_string()))
            }
            Some(Err(e)) => Err(e),
            None => {
                let pos = self.source.len();
                Ok(Token::new(TokenKind::Eof, Span::new(pos, pos)))
            }
        }
    }

    /// Collect all tokens into a vector, ending with the Eof token
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

/// Helper function to lex source code
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn token_texts(source: &str) -> Vec<String> {
        lex(source)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.text(source).to_string())
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(token_kinds("   \t\r\n  "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords() {
        let kinds = token_kinds(
            "pluh plug cookUp spillingTheTeaAbout fr? ong? justLikeThat? holdUp ghost rizz yeet",
        );
        assert_eq!(
            kinds,
            vec![
                TokenKind::Def,
                TokenKind::Extern,
                TokenKind::Let,
                TokenKind::Program,
                TokenKind::If,
                TokenKind::Elseif,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Return,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_return_synonyms() {
        assert_eq!(
            token_kinds("periodt yeet"),
            vec![TokenKind::Return, TokenKind::Return, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unused_keywords_still_lex() {
        assert_eq!(
            token_kinds("ratioed gang"),
            vec![TokenKind::For, TokenKind::Array, TokenKind::Eof]
        );
    }

    #[test]
    fn test_literals() {
        let kinds = token_kinds("1 12 1.234567 facts cap 'a' \"hello\" 31.87");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Facts,
                TokenKind::Cap,
                TokenKind::CharLit,
                TokenKind::Str,
                TokenKind::Float,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_negative_number_is_two_tokens() {
        assert_eq!(
            token_kinds("-123"),
            vec![TokenKind::Minus, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn test_leading_dot_float() {
        let tokens = lex(".5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].text(".5"), ".5");
        assert_eq!(".5".parse::<f64>().unwrap(), 0.5);
    }

    #[test]
    fn test_two_decimal_points() {
        let err = lex("1.2.3").unwrap_err();
        assert_eq!(err, LexError::MoreThanOneDecimalPoint("1.2.3".to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex("\"hello").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString("\"hello".to_string()));
    }

    #[test]
    fn test_bad_char_literal() {
        assert!(lex("'ab'").is_err());
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            token_kinds("Cancelled this whole line is gone\ncookUp"),
            vec![TokenKind::Let, TokenKind::Eof]
        );
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(
            token_kinds("pluh Blocked anything\nat all Unblocked plug"),
            vec![TokenKind::Def, TokenKind::Extern, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_eof() {
        assert_eq!(
            token_kinds("pluh Blocked never closed"),
            vec![TokenKind::Def, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment_word_prefix_is_identifier() {
        assert_eq!(
            token_kinds("Blockedish Cancelledish"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment_words_inside_string() {
        let source = "\"Blocked is just text Unblocked\"";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text(source), source);
    }

    #[test]
    fn test_operators() {
        let kinds = token_kinds("+ - * / % == != < > <= >= = !");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Eq,
                TokenKind::Not,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            token_kinds("( ) { } : , |"),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Pipe,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_identifiers_with_question_marks() {
        assert_eq!(
            token_texts("bonjour under_score has?mark fr?x"),
            vec!["bonjour", "under_score", "has?mark", "fr?x", ""]
        );
    }

    #[test]
    fn test_prototype_stream() {
        let kinds = token_kinds("plug func(x : int) : int");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Extern,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("yeet");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Return);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_single_eof() {
        let tokens = lex("pluh main(): int { yeet 42 }").unwrap();
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_relexing_is_deterministic() {
        let source = "pluh f(a: int): int { yeet a + 1 }";
        assert_eq!(lex(source).unwrap(), lex(source).unwrap());
    }

    #[test]
    fn test_whitespace_insertion_keeps_token_kinds() {
        let compact = token_kinds("pluh f(a:int):int{yeet a+1}");
        let spaced = token_kinds("pluh  f ( a : int ) : int \n { yeet a + 1 }");
        assert_eq!(compact, spaced);
    }
}
