//! Main parser coordinator.
//!
//! This module provides the [`Parser`] struct and core parsing
//! infrastructure: the error type, helper methods, panic-mode recovery, and
//! the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following
//! organization:
//! - This module: Parser struct, helper methods, recovery, and coordination
//! - `declarations`: Parsing struct, variable, and function declarations
//! - `statements`: Parsing statements (if, while, for, etc.)
//! - `expressions`: Parsing expressions with precedence climbing
//!
//! Parser methods are split across multiple files using `impl Parser`
//! blocks, allowing each module to extend the Parser with related
//! functionality while maintaining access to the shared parser state.
//!
//! # Error recovery
//!
//! Parse errors never abort the parse. Each error is reported to the
//! diagnostic engine, the parser synchronizes to the next statement or
//! top-level declaration boundary, and parsing continues, so a best-effort
//! tree always comes out the other end.

use std::fmt;

use crate::diagnostics::DiagnosticEngine;
use crate::lang::LangOptions;
use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::source::{SourceLocation, Span};

/// Parser error type. Raised internally and converted to a diagnostic at
/// the nearest recovery point.
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Recursive descent parser for the C subset.
pub struct Parser<'a> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) options: &'a LangOptions,
    pub(crate) diagnostics: &'a mut DiagnosticEngine,
}

impl<'a> Parser<'a> {
    pub fn new(
        tokens: Vec<Token>,
        options: &'a LangOptions,
        diagnostics: &'a mut DiagnosticEngine,
    ) -> Self {
        Self {
            tokens,
            position: 0,
            options,
            diagnostics,
        }
    }

    /// Parses the entire translation unit. Always produces a [`Program`];
    /// declarations that fail to parse are reported and skipped.
    pub fn parse_program(&mut self) -> Program {
        let start = self.current_location();
        let mut decls = Vec::new();

        while !self.is_at_end() {
            match self.parse_top_level_declaration() {
                Ok(decl) => decls.push(decl),
                Err(error) => {
                    self.diagnostics.error(error.location, error.message);
                    self.synchronize_top_level();
                }
            }
        }

        let end = if self.position > 0 {
            self.previous_location()
        } else {
            start
        };
        Program {
            decls,
            span: Span::new(start, end),
        }
    }

    /// Skips tokens until a plausible start of the next top-level
    /// declaration.
    pub(crate) fn synchronize_top_level(&mut self) {
        self.advance(); // consume the offending token
        while !self.is_at_end() {
            if matches!(
                self.previous().kind,
                TokenKind::Semicolon | TokenKind::RBrace
            ) {
                return;
            }
            if self.is_type_keyword() || self.check(&TokenKind::Struct) {
                return;
            }
            self.advance();
        }
    }

    /// Skips tokens until after the next `;` or just before the enclosing
    /// `}`, keeping the rest of the surrounding block parseable. A `}` is
    /// never consumed here: it belongs to the enclosing block.
    pub(crate) fn synchronize_statement(&mut self) {
        if !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            self.advance(); // consume the offending token
        }
        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if self.check(&TokenKind::RBrace) {
                return;
            }
            self.advance();
        }
    }

    // ===== Helper methods =====

    pub(crate) fn is_type_keyword(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Int
                | TokenKind::Char
                | TokenKind::Void
                | TokenKind::Bool
                | TokenKind::Struct
                | TokenKind::Const
        )
    }

    pub(crate) fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().loc
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().loc
    }

    /// Span from `start` to the most recently consumed token.
    pub(crate) fn span_from(&self, start: SourceLocation) -> Span {
        Span::new(start, self.previous_location())
    }

    pub(crate) fn error(
        &self,
        message: impl Into<String>,
    ) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect(
        &mut self,
        kind: &TokenKind,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("{}, found {}", message, self.peek().kind)))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect(&TokenKind::LParen, &format!("expected '(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect(&TokenKind::RParen, &format!("expected ')' {ctx}"))
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect(&TokenKind::LBrace, &format!("expected '{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect(&TokenKind::RBrace, &format!("expected '}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect(&TokenKind::Semicolon, &format!("expected ';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!(
                "expected identifier, found {}",
                self.peek().kind
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::parse_recovering;

    #[test]
    fn test_parse_simple_function() {
        let (program, diagnostics) = parse_recovering("int main() { return 0; }");

        assert!(!diagnostics.has_uncompilable_error());
        assert_eq!(program.decls.len(), 1);
        match &program.decls[0] {
            AstNode::FunctionDecl {
                name,
                params,
                return_type,
                body,
                ..
            } => {
                assert_eq!(name, "main");
                assert_eq!(params.len(), 0);
                assert_eq!(return_type.base, BaseType::Int);
                assert!(body.is_some());
            }
            _ => panic!("expected function definition"),
        }
    }

    #[test]
    fn test_recovery_keeps_later_declarations() {
        let source = "int broken( { return 0; }\nint fine(void) { return 1; }";
        let (program, diagnostics) = parse_recovering(source);

        assert!(diagnostics.has_uncompilable_error());
        // The second function survives the first one's parse error.
        assert!(program.decls.iter().any(|d| matches!(
            d,
            AstNode::FunctionDecl { name, .. } if name == "fine"
        )));
    }

    #[test]
    fn test_statement_recovery_keeps_block() {
        let source = "int main() { int x = ; int y = 2; return y; }";
        let (program, diagnostics) = parse_recovering(source);

        assert!(diagnostics.has_uncompilable_error());
        match &program.decls[0] {
            AstNode::FunctionDecl { body: Some(body), .. } => {
                match body.as_ref() {
                    AstNode::Compound { stmts, .. } => {
                        // The bad declaration is dropped; y and return stay.
                        assert_eq!(stmts.len(), 2);
                    }
                    _ => panic!("expected compound body"),
                }
            }
            _ => panic!("expected function definition"),
        }
    }
}
