//! Statement parsing implementation.
//!
//! This module handles parsing of all statement forms:
//!
//! - Variable declarations: `int x = 42;`
//! - Control flow: `if`, `while`, `for`, `do-while`, `switch`
//! - Jump statements: `return`, `break`, `continue`, `goto`
//! - Compound statements: `{ ... }`
//! - Labels and the null statement `;`
//! - Expression statements (the expression node itself is the statement)
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::lang::Standard;
use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser<'_> {
    /// Parse a braced block into a `Compound` node.
    pub(crate) fn parse_compound_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_lbrace("before block")?;
        let stmts = self.parse_block_statements();
        self.expect_rbrace("after block")?;

        Ok(AstNode::Compound {
            stmts,
            span: self.span_from(start),
        })
    }

    /// Parse statements up to the closing `}` of the enclosing block.
    /// Statements that fail to parse are reported and skipped; the rest of
    /// the block is kept.
    pub(crate) fn parse_block_statements(&mut self) -> Vec<AstNode> {
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.diagnostics.error(error.location, error.message);
                    self.synchronize_statement();
                }
            }
        }

        stmts
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();

        if self.match_kind(&TokenKind::Return) {
            return self.parse_return_statement();
        }
        if self.match_kind(&TokenKind::If) {
            return self.parse_if_statement();
        }
        if self.match_kind(&TokenKind::While) {
            return self.parse_while_statement();
        }
        if self.match_kind(&TokenKind::Do) {
            return self.parse_do_while_statement();
        }
        if self.match_kind(&TokenKind::For) {
            return self.parse_for_statement();
        }
        if self.match_kind(&TokenKind::Switch) {
            return self.parse_switch_statement();
        }

        if self.match_kind(&TokenKind::Break) {
            self.expect_semicolon("after 'break'")?;
            return Ok(AstNode::Break {
                span: self.span_from(start),
            });
        }
        if self.match_kind(&TokenKind::Continue) {
            self.expect_semicolon("after 'continue'")?;
            return Ok(AstNode::Continue {
                span: self.span_from(start),
            });
        }
        if self.match_kind(&TokenKind::Goto) {
            let label = self.expect_identifier()?;
            self.expect_semicolon("after 'goto'")?;
            return Ok(AstNode::Goto {
                label,
                span: self.span_from(start),
            });
        }

        if self.match_kind(&TokenKind::Semicolon) {
            return Ok(AstNode::NullStmt {
                span: self.span_from(start),
            });
        }

        if self.check(&TokenKind::LBrace) {
            return self.parse_compound_statement();
        }

        // Label: identifier followed by a colon.
        if matches!(self.peek().kind, TokenKind::Ident(_))
            && self
                .peek_ahead(1)
                .map(|t| matches!(t.kind, TokenKind::Colon))
                .unwrap_or(false)
        {
            let name = self.expect_identifier()?;
            self.expect(&TokenKind::Colon, "expected ':' after label")?;
            return Ok(AstNode::Label {
                name,
                span: self.span_from(start),
            });
        }

        // Variable declaration: type followed by identifier.
        if self.is_type_keyword() {
            let var_type = self.parse_type()?;
            let name = self.expect_identifier()?;
            return self.parse_var_decl_rest(var_type, name, start);
        }

        // Otherwise an expression statement; the expression node itself is
        // the statement.
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(expr)
    }

    /// Parse return statement (keyword already consumed).
    fn parse_return_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon("after return")?;

        Ok(AstNode::Return {
            expr,
            span: self.span_from(start),
        })
    }

    /// Parse if statement (keyword already consumed).
    fn parse_if_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        self.expect_lparen("after 'if'")?;
        let cond = Box::new(self.parse_expression()?);
        self.expect_rparen("after if condition")?;

        let then_branch = Box::new(self.parse_statement_or_block()?);
        let else_branch = if self.match_kind(&TokenKind::Else) {
            Some(Box::new(self.parse_statement_or_block()?))
        } else {
            None
        };

        Ok(AstNode::If {
            cond,
            then_branch,
            else_branch,
            span: self.span_from(start),
        })
    }

    /// Parse while statement (keyword already consumed).
    fn parse_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        self.expect_lparen("after 'while'")?;
        let cond = Box::new(self.parse_expression()?);
        self.expect_rparen("after while condition")?;

        let body = Box::new(self.parse_statement_or_block()?);

        Ok(AstNode::While {
            cond,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse do-while statement (keyword already consumed).
    fn parse_do_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        let body = Box::new(self.parse_statement_or_block()?);

        self.expect(&TokenKind::While, "expected 'while' after do body")?;
        self.expect_lparen("after 'while'")?;
        let cond = Box::new(self.parse_expression()?);
        self.expect_rparen("after do-while condition")?;
        self.expect_semicolon("after do-while")?;

        Ok(AstNode::DoWhile {
            body,
            cond,
            span: self.span_from(start),
        })
    }

    /// Parse for statement (keyword already consumed).
    fn parse_for_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        self.expect_lparen("after 'for'")?;

        let init = if self.match_kind(&TokenKind::Semicolon) {
            None
        } else if self.is_type_keyword() {
            if self.options.standard == Standard::C89 {
                self.diagnostics.error(
                    self.current_location(),
                    "variable declaration in for loop is a C99 feature",
                );
            }
            let decl_start = self.current_location();
            let var_type = self.parse_type()?;
            let name = self.expect_identifier()?;
            // The declaration consumes its own semicolon.
            Some(Box::new(self.parse_var_decl_rest(var_type, name, decl_start)?))
        } else {
            let expr = self.parse_expression()?;
            self.expect_semicolon("after for init")?;
            Some(Box::new(expr))
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon("after for condition")?;

        let inc = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_rparen("after for clauses")?;

        let body = Box::new(self.parse_statement_or_block()?);

        Ok(AstNode::For {
            init,
            cond,
            inc,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse switch statement (keyword already consumed).
    fn parse_switch_statement(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        self.expect_lparen("after 'switch'")?;
        let cond = Box::new(self.parse_expression()?);
        self.expect_rparen("after switch expression")?;
        self.expect_lbrace("before switch body")?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.match_kind(&TokenKind::Case) {
                let case_start = self.previous_location();
                let value = Box::new(self.parse_expression()?);
                self.expect(&TokenKind::Colon, "expected ':' after case value")?;
                let stmts = self.parse_case_statements();
                cases.push(AstNode::Case {
                    value,
                    stmts,
                    span: self.span_from(case_start),
                });
            } else if self.match_kind(&TokenKind::Default) {
                let default_start = self.previous_location();
                self.expect(&TokenKind::Colon, "expected ':' after 'default'")?;
                let stmts = self.parse_case_statements();
                cases.push(AstNode::DefaultCase {
                    stmts,
                    span: self.span_from(default_start),
                });
            } else {
                return Err(self.error("expected 'case' or 'default' in switch body"));
            }
        }

        self.expect_rbrace("after switch body")?;

        Ok(AstNode::Switch {
            cond,
            cases,
            span: self.span_from(start),
        })
    }

    /// Parse the statements belonging to one case label.
    fn parse_case_statements(&mut self) -> Vec<AstNode> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::Case)
            && !self.check(&TokenKind::Default)
            && !self.check(&TokenKind::RBrace)
            && !self.is_at_end()
        {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.diagnostics.error(error.location, error.message);
                    self.synchronize_statement();
                }
            }
        }
        stmts
    }

    /// Parse a statement or a braced block (for if/while/for bodies).
    pub(crate) fn parse_statement_or_block(&mut self) -> Result<AstNode, ParseError> {
        if self.check(&TokenKind::LBrace) {
            self.parse_compound_statement()
        } else {
            self.parse_statement()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::{parse_recovering, parse_recovering_with};

    fn first_body(program: &Program) -> &[AstNode] {
        match &program.decls[0] {
            AstNode::FunctionDecl { body: Some(body), .. } => match body.as_ref() {
                AstNode::Compound { stmts, .. } => stmts,
                _ => panic!("expected compound body"),
            },
            _ => panic!("expected function definition"),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let (program, diagnostics) = parse_recovering(
            "int sign(int x) { if (x > 0) return 1; else return 0; }",
        );

        assert!(!diagnostics.has_uncompilable_error());
        let stmts = first_body(&program);
        assert!(matches!(
            &stmts[0],
            AstNode::If { else_branch: Some(_), .. }
        ));
    }

    #[test]
    fn test_parse_loops() {
        let source = r#"
            void spin(int n) {
                int total = 0;
                for (int i = 0; i < n; i++) total += i;
                while (total > 0) total--;
                do { total++; } while (total < 3);
            }
        "#;
        let (program, diagnostics) = parse_recovering(source);

        assert!(!diagnostics.has_uncompilable_error());
        let stmts = first_body(&program);
        assert!(matches!(&stmts[1], AstNode::For { init: Some(_), .. }));
        assert!(matches!(&stmts[2], AstNode::While { .. }));
        assert!(matches!(&stmts[3], AstNode::DoWhile { .. }));
    }

    #[test]
    fn test_parse_switch() {
        let source = r#"
            int pick(int x) {
                switch (x) {
                    case 1: return 10;
                    case 2: return 20;
                    default: return 0;
                }
            }
        "#;
        let (program, diagnostics) = parse_recovering(source);

        assert!(!diagnostics.has_uncompilable_error());
        let stmts = first_body(&program);
        match &stmts[0] {
            AstNode::Switch { cases, .. } => {
                assert_eq!(cases.len(), 3);
                assert!(matches!(cases[2], AstNode::DefaultCase { .. }));
            }
            _ => panic!("expected switch"),
        }
    }

    #[test]
    fn test_goto_and_label() {
        let source = "void f(void) { goto out; out: ; }";
        let (program, diagnostics) = parse_recovering(source);

        assert!(!diagnostics.has_uncompilable_error());
        let stmts = first_body(&program);
        assert!(matches!(&stmts[0], AstNode::Goto { label, .. } if label == "out"));
        assert!(matches!(&stmts[1], AstNode::Label { name, .. } if name == "out"));
        assert!(matches!(&stmts[2], AstNode::NullStmt { .. }));
    }

    #[test]
    fn test_for_decl_rejected_in_c89() {
        let source = "void f(void) { for (int i = 0; i < 3; i++) ; }";
        let (_, diagnostics) = parse_recovering_with(source, &["-std=c89"]);
        assert!(diagnostics.has_uncompilable_error());

        let (_, diagnostics) = parse_recovering(source);
        assert!(!diagnostics.has_uncompilable_error());
    }
}
