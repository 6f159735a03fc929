//! Parser for Slanguage
//!
//! A recursive descent parser with one token of lookahead. Expressions are
//! parsed by operator-precedence climbing over unary-prefixed atoms. The
//! first error aborts the parse; there is no recovery.

use crate::ast::{
    BinOp, Expr, FunctionDecl, Module, Param, Prototype, Stmt, UnaryOp, VALUE_SINK, VOID_TYPE,
};
use crate::lexer::{LexError, Lexer};
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, got: {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("invalid numeric literal: {0}")]
    InvalidNumber(String),

    #[error("unary operator cannot be applied to char or string: {0}")]
    UnaryOnTextLiteral(String),

    #[error("expected return type {expected} for pluh: {name}")]
    MissingReturn { name: String, expected: String },
}

/// Parse result
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a source string into a module AST
pub fn parse(source: &str) -> ParseResult<Module> {
    Parser::new(source)?.parse_module()
}

/// The parser for Slanguage
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
}

impl<'src> Parser<'src> {
    /// Create a new parser, fetching the first token
    pub fn new(source: &'src str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Get text of a token
    fn text(&self, token: &Token) -> &'src str {
        token.text(self.lexer.source())
    }

    /// The current token's lexeme, as diagnostics should print it
    fn found(&self) -> String {
        if self.current.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            self.text(&self.current).to_string()
        }
    }

    /// Advance to the next token, returning the one that was current
    fn advance(&mut self) -> ParseResult<Token> {
        let previous = self.current;
        self.current = self.lexer.next_token()?;
        Ok(previous)
    }

    /// Check if the current token matches
    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token if it matches
    fn consume(&mut self, kind: TokenKind) -> ParseResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token if it matches, otherwise error
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.found(),
        }
    }

    // ============ Top-level parsing ============

    /// Parse a complete module: `spillingTheTeaAbout NAME` followed by
    /// declarations until end of file
    pub fn parse_module(&mut self) -> ParseResult<Module> {
        self.expect(TokenKind::Program)?;
        let name_tok = self.expect(TokenKind::Ident)?;
        let name = self.text(&name_tok).to_string();

        let mut functions = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Def => functions.push(self.parse_function()?),
                TokenKind::Extern => functions.push(self.parse_extern()?),
                TokenKind::Eof => break,
                _ => return Err(self.unexpected("pluh or plug")),
            }
        }

        Ok(Module { name, functions })
    }

    /// Parse a function definition: `pluh prototype compound`
    fn parse_function(&mut self) -> ParseResult<FunctionDecl> {
        self.advance()?;
        let proto = self.parse_prototype()?;
        let body = self.parse_compound()?;

        // A body "returns" iff its final statement is a return; only the
        // outermost compound is inspected.
        if proto.return_type != VOID_TYPE && !ends_with_return(&body) {
            return Err(ParseError::MissingReturn {
                name: proto.name.clone(),
                expected: proto.return_type.clone(),
            });
        }

        Ok(FunctionDecl {
            proto,
            body: Some(body),
        })
    }

    /// Parse an extern declaration: `plug prototype`
    fn parse_extern(&mut self) -> ParseResult<FunctionDecl> {
        self.advance()?;
        let proto = self.parse_prototype()?;
        Ok(FunctionDecl { proto, body: None })
    }

    /// Parse a prototype: `name ( params ) : return-type`
    fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        let name_tok = self.expect(TokenKind::Ident)?;
        let name = self.text(&name_tok).to_string();

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.check(TokenKind::Ident) {
            let pname_tok = self.advance()?;
            let pname = self.text(&pname_tok).to_string();
            self.expect(TokenKind::Colon)?;
            let pty_tok = self.expect(TokenKind::Ident)?;
            params.push(Param {
                name: pname,
                ty: self.text(&pty_tok).to_string(),
            });
            if !self.consume(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::Colon)?;
        let ret_tok = self.expect(TokenKind::Ident)?;
        let return_type = self.text(&ret_tok).to_string();

        Ok(Prototype {
            name,
            params,
            return_type,
        })
    }

    // ============ Statements ============

    /// Parse a compound statement: `{ statements }`
    fn parse_compound(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.unexpected("}"));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance()?;
        Ok(Stmt::Compound(statements))
    }

    /// Parse a statement, dispatched on the leading token
    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.current.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Ident => self.parse_assign_or_call(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => {
                self.advance()?;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance()?;
                Ok(Stmt::Continue)
            }
            TokenKind::Return => {
                self.advance()?;
                Ok(Stmt::Return(self.parse_expression()?))
            }
            TokenKind::LBrace => self.parse_compound(),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Parse `cookUp name : type` with an optional `= expr` initializer
    fn parse_let(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        let name_tok = self.expect(TokenKind::Ident)?;
        let name = self.text(&name_tok).to_string();
        self.expect(TokenKind::Colon)?;
        let ty_tok = self.expect(TokenKind::Ident)?;
        let ty = self.text(&ty_tok).to_string();

        if self.consume(TokenKind::Eq)? {
            let value = self.parse_expression()?;
            Ok(Stmt::DeclareInit { name, ty, value })
        } else {
            Ok(Stmt::Declare { name, ty })
        }
    }

    /// Parse `name = expr` or a call-as-statement `name ( args )`; the
    /// latter is stored as an assignment to the value sink
    fn parse_assign_or_call(&mut self) -> ParseResult<Stmt> {
        let name_tok = self.advance()?;
        let name = self.text(&name_tok).to_string();

        if self.consume(TokenKind::Eq)? {
            let value = self.parse_expression()?;
            Ok(Stmt::Assign { name, value })
        } else if self.consume(TokenKind::LParen)? {
            let args = self.parse_call_args()?;
            Ok(Stmt::Assign {
                name: VALUE_SINK.to_string(),
                value: Expr::Call { callee: name, args },
            })
        } else {
            Err(self.unexpected("= or ("))
        }
    }

    /// Parse `fr? expr compound` with an optional `ong?` chain or
    /// `justLikeThat? statement` else branch
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        let condition = self.parse_expression()?;
        let then_branch = Box::new(self.parse_compound()?);

        let else_branch = if self.check(TokenKind::Elseif) {
            // `ong?` chains parse as a conditional in the else slot
            Box::new(self.parse_if()?)
        } else if self.consume(TokenKind::Else)? {
            Box::new(self.parse_statement()?)
        } else {
            Box::new(Stmt::Compound(Vec::new()))
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// Parse `holdUp expr compound`
    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        let condition = self.parse_expression()?;
        let body = Box::new(self.parse_compound()?);
        Ok(Stmt::While { condition, body })
    }

    // ============ Expressions ============

    /// Parse a full expression
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;
        self.parse_binary_rhs(0, lhs)
    }

    /// The binary operator and precedence for a token, if it is one.
    /// Levels: comparisons 10, additive 20, multiplicative 40.
    fn binary_op(kind: TokenKind) -> Option<(BinOp, i32)> {
        Some(match kind {
            TokenKind::Lt => (BinOp::Lt, 10),
            TokenKind::LtEq => (BinOp::Le, 10),
            TokenKind::Gt => (BinOp::Gt, 10),
            TokenKind::GtEq => (BinOp::Ge, 10),
            TokenKind::EqEq => (BinOp::Eq, 10),
            TokenKind::NotEq => (BinOp::Ne, 10),
            TokenKind::Plus => (BinOp::Add, 20),
            TokenKind::Minus => (BinOp::Sub, 20),
            TokenKind::Star => (BinOp::Mul, 40),
            TokenKind::Slash => (BinOp::Div, 40),
            TokenKind::Percent => (BinOp::Rem, 40),
            _ => return None,
        })
    }

    /// Precedence-climbing loop for the right-hand side of binary
    /// operations
    fn parse_binary_rhs(&mut self, min_precedence: i32, mut lhs: Expr) -> ParseResult<Expr> {
        while let Some((op, precedence)) = Self::binary_op(self.current.kind) {
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            let mut rhs = self.parse_unary()?;

            if let Some((_, next_precedence)) = Self::binary_op(self.current.kind) {
                if precedence < next_precedence {
                    rhs = self.parse_binary_rhs(precedence + 1, rhs)?;
                }
            }

            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// Parse a unary-prefixed expression; `+ - !` bind tightest
    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.current.kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_atom(),
        };
        self.advance()?;

        if matches!(self.current.kind, TokenKind::CharLit | TokenKind::Str) {
            return Err(ParseError::UnaryOnTextLiteral(self.found()));
        }

        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parse an atom: a literal, a variable or call, or a parenthesized
    /// expression
    fn parse_atom(&mut self) -> ParseResult<Expr> {
        match self.current.kind {
            TokenKind::Ident => self.parse_ident_or_call(),
            TokenKind::Int => {
                let tok = self.advance()?;
                let text = self.text(&tok);
                text.parse::<i32>()
                    .map(Expr::Int)
                    .map_err(|_| ParseError::InvalidNumber(text.to_string()))
            }
            TokenKind::Float => {
                let tok = self.advance()?;
                let text = self.text(&tok);
                text.parse::<f64>()
                    .map(Expr::Float)
                    .map_err(|_| ParseError::InvalidNumber(text.to_string()))
            }
            TokenKind::Facts => {
                self.advance()?;
                Ok(Expr::Bool(true))
            }
            TokenKind::Cap => {
                self.advance()?;
                Ok(Expr::Bool(false))
            }
            TokenKind::CharLit => {
                let tok = self.advance()?;
                let text = self.text(&tok);
                let c = text[1..text.len() - 1].chars().next().unwrap_or('\0');
                Ok(Expr::Char(c))
            }
            TokenKind::Str => {
                let tok = self.advance()?;
                let text = self.text(&tok);
                Ok(Expr::Str(text[1..text.len() - 1].to_string()))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse an identifier atom, which becomes a call when followed by `(`
    fn parse_ident_or_call(&mut self) -> ParseResult<Expr> {
        let tok = self.advance()?;
        let name = self.text(&tok).to_string();

        if self.consume(TokenKind::LParen)? {
            let args = self.parse_call_args()?;
            Ok(Expr::Call { callee: name, args })
        } else {
            Ok(Expr::Variable(name))
        }
    }

    /// Parse a comma-separated argument list; the opening `(` is already
    /// consumed
    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(TokenKind::RParen) {
                    break;
                }
                if !self.consume(TokenKind::Comma)? {
                    return Err(self.unexpected(", or )"));
                }
            }
        }
        self.advance()?;
        Ok(args)
    }
}

fn ends_with_return(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Compound(statements) => matches!(statements.last(), Some(Stmt::Return(_))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_module() {
        let module = parse("spillingTheTeaAbout demo").unwrap();
        assert_eq!(module.name, "demo");
        assert!(module.functions.is_empty());
    }

    #[test]
    fn test_return_constant() {
        let module = parse("spillingTheTeaAbout demo pluh main(): int { yeet 42 }").unwrap();
        assert_eq!(module.functions.len(), 1);
        let func = &module.functions[0];
        assert_eq!(func.proto.name, "main");
        assert_eq!(func.proto.return_type, "int");
        assert_eq!(
            func.body,
            Some(Stmt::Compound(vec![Stmt::Return(Expr::Int(42))]))
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        let module =
            parse("spillingTheTeaAbout demo pluh f(a: int, b: int): int { yeet a + b * 2 }")
                .unwrap();
        let func = &module.functions[0];
        assert_eq!(func.proto.params.len(), 2);
        let Some(Stmt::Compound(statements)) = &func.body else {
            panic!("expected compound body");
        };
        assert_eq!(
            statements[0],
            Stmt::Return(Expr::Binary {
                op: BinOp::Add,
                lhs: Box::new(Expr::Variable("a".to_string())),
                rhs: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    lhs: Box::new(Expr::Variable("b".to_string())),
                    rhs: Box::new(Expr::Int(2)),
                }),
            })
        );
    }

    #[test]
    fn test_leading_dot_float_value() {
        let module = parse("spillingTheTeaAbout demo pluh f(): float { yeet .5 }").unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        assert_eq!(statements[0], Stmt::Return(Expr::Float(0.5)));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let module =
            parse("spillingTheTeaAbout demo pluh f(a: int, b: int): int { yeet (a + b) * 2 }")
                .unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        let Stmt::Return(Expr::Binary { op, lhs, .. }) = &statements[0] else {
            panic!("expected return of binary expression");
        };
        assert_eq!(*op, BinOp::Mul);
        assert!(matches!(**lhs, Expr::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn test_comparison_binds_loosest() {
        let module = parse("spillingTheTeaAbout demo pluh f(a: int): bool { yeet a + 1 < 2 * 3 }")
            .unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        let Stmt::Return(Expr::Binary { op, .. }) = &statements[0] else {
            panic!("expected return of binary expression");
        };
        assert_eq!(*op, BinOp::Lt);
    }

    #[test]
    fn test_extern_has_no_body() {
        let module = parse("spillingTheTeaAbout demo plug puts(s: string): int").unwrap();
        let func = &module.functions[0];
        assert!(func.is_extern());
        assert_eq!(func.proto.params[0].ty, "string");
    }

    #[test]
    fn test_call_as_statement_uses_sink() {
        let module = parse(
            "spillingTheTeaAbout demo \
             plug puts(s: string): int \
             pluh main(): int { puts(\"hi\") yeet 0 }",
        )
        .unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[1].body else {
            panic!("expected compound body");
        };
        assert_eq!(
            statements[0],
            Stmt::Assign {
                name: VALUE_SINK.to_string(),
                value: Expr::Call {
                    callee: "puts".to_string(),
                    args: vec![Expr::Str("hi".to_string())],
                },
            }
        );
    }

    #[test]
    fn test_if_without_else_gets_empty_compound() {
        let module =
            parse("spillingTheTeaAbout demo pluh f(a: int): int { fr? a < 0 { a = 0 } yeet a }")
                .unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        let Stmt::If { else_branch, .. } = &statements[0] else {
            panic!("expected if statement");
        };
        assert_eq!(**else_branch, Stmt::Compound(Vec::new()));
    }

    #[test]
    fn test_elseif_chain_nests_in_else_slot() {
        let source = "spillingTheTeaAbout demo \
            pluh f(a: int): int { \
                fr? a == 0 { a = 1 } \
                ong? a == 1 { a = 2 } \
                justLikeThat? { a = 3 } \
                yeet a \
            }";
        let module = parse(source).unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        let Stmt::If { else_branch, .. } = &statements[0] else {
            panic!("expected if statement");
        };
        let Stmt::If {
            else_branch: inner_else,
            ..
        } = &**else_branch
        else {
            panic!("expected nested if for ong? chain");
        };
        assert!(matches!(**inner_else, Stmt::Compound(_)));
    }

    #[test]
    fn test_while_with_break_and_continue() {
        let source = "spillingTheTeaAbout demo \
            pluh g(): int { \
                cookUp i: int = 0 \
                holdUp i < 10 { fr? i == 5 { ghost } justLikeThat? { i = i + 1 } } \
                yeet i \
            }";
        let module = parse(source).unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        assert!(matches!(statements[1], Stmt::While { .. }));
    }

    #[test]
    fn test_declaration_without_initializer() {
        let module = parse("spillingTheTeaAbout demo pluh f(): npc { cookUp x: float }").unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        assert_eq!(
            statements[0],
            Stmt::Declare {
                name: "x".to_string(),
                ty: "float".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_expression_after_yeet() {
        let err = parse("spillingTheTeaAbout demo pluh h(): int { yeet }").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: "}".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_return_on_non_void_function() {
        let err = parse("spillingTheTeaAbout demo pluh f(): int { cookUp x: int }").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingReturn {
                name: "f".to_string(),
                expected: "int".to_string(),
            }
        );
    }

    #[test]
    fn test_void_function_needs_no_return() {
        assert!(parse("spillingTheTeaAbout demo pluh f(): npc { cookUp x: int }").is_ok());
    }

    #[test]
    fn test_nested_compound_return_does_not_count() {
        // Only the final statement of the outermost compound is inspected.
        let err = parse("spillingTheTeaAbout demo pluh f(): int { { yeet 1 } }").unwrap_err();
        assert!(matches!(err, ParseError::MissingReturn { .. }));
    }

    #[test]
    fn test_unary_on_string_rejected() {
        let err = parse("spillingTheTeaAbout demo pluh f(): int { yeet -\"hi\" }").unwrap_err();
        assert!(matches!(err, ParseError::UnaryOnTextLiteral(_)));
    }

    #[test]
    fn test_unary_chain() {
        let module = parse("spillingTheTeaAbout demo pluh f(): bool { yeet !facts }").unwrap();
        let Some(Stmt::Compound(statements)) = &module.functions[0].body else {
            panic!("expected compound body");
        };
        assert_eq!(
            statements[0],
            Stmt::Return(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Bool(true)),
            })
        );
    }

    #[test]
    fn test_missing_colon_in_prototype() {
        let err = parse("spillingTheTeaAbout demo pluh f(a int): int { yeet 0 }").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: ":".to_string(),
                found: "int".to_string(),
            }
        );
    }

    #[test]
    fn test_statement_keyword_outside_grammar() {
        let err = parse("spillingTheTeaAbout demo pluh f(): npc { ratioed }").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "statement".to_string(),
                found: "ratioed".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_twice_is_structurally_equal() {
        let source = "spillingTheTeaAbout demo \
            plug puts(s: string): int \
            pluh main(): int { \
                cookUp i: int = 0 \
                holdUp i < 3 { i = i + 1 } \
                yeet i \
            }";
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
    }
}
