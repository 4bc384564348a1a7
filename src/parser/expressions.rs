//! Expression parsing implementation.
//!
//! This module handles parsing of expressions using precedence climbing for
//! binary operators and recursive descent for everything else.
//!
//! # Supported Expressions
//!
//! - Literals: integers (decimal and hex), characters, strings, `NULL`,
//!   and in the C++ dialect `true`/`false`/`nullptr`
//! - Identifiers
//! - Binary operators: arithmetic, comparison, logical, bitwise
//! - Unary operators: `-`, `!`, `~`, `&`, `*`, `++`, `--`
//! - Postfix: `[]`, `.`, `->`, `()`, `++`, `--`
//! - Ternary `? :`, assignment, compound assignment
//! - Type casts `(type)expr` and `sizeof`
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::source::{SourceLocation, Span};

impl Parser<'_> {
    /// Parse expression (top-level entry point).
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative) on top of the ternary level.
    fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_ternary()?;

        if self.match_kind(&TokenKind::Assign) {
            let rhs = self.parse_assignment()?;
            let span = Span::new(expr.span().start, rhs.span().end);
            return Ok(AstNode::Assignment {
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                span,
            });
        }

        let compound_op = if self.match_kind(&TokenKind::PlusEq) {
            Some(BinOp::Add)
        } else if self.match_kind(&TokenKind::MinusEq) {
            Some(BinOp::Sub)
        } else if self.match_kind(&TokenKind::StarEq) {
            Some(BinOp::Mul)
        } else if self.match_kind(&TokenKind::SlashEq) {
            Some(BinOp::Div)
        } else if self.match_kind(&TokenKind::PercentEq) {
            Some(BinOp::Mod)
        } else {
            None
        };

        if let Some(op) = compound_op {
            let rhs = self.parse_assignment()?;
            let span = Span::new(expr.span().start, rhs.span().end);
            return Ok(AstNode::CompoundAssignment {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                span,
            });
        }

        Ok(expr)
    }

    /// Parse ternary: `cond ? then : else`.
    fn parse_ternary(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_binary(0)?;

        if self.match_kind(&TokenKind::Question) {
            let then_expr = self.parse_expression()?;
            self.expect(&TokenKind::Colon, "expected ':' in ternary expression")?;
            let else_expr = self.parse_ternary()?;
            let span = Span::new(expr.span().start, else_expr.span().end);

            return Ok(AstNode::Conditional {
                cond: Box::new(expr),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span,
            });
        }

        Ok(expr)
    }

    /// Parse left-associative binary operators by precedence climbing.
    /// `min_level` indexes [`BINARY_LEVELS`].
    fn parse_binary(&mut self, min_level: usize) -> Result<AstNode, ParseError> {
        if min_level >= BINARY_LEVELS.len() {
            return self.parse_cast();
        }

        let mut left = self.parse_binary(min_level + 1)?;

        loop {
            let op = BINARY_LEVELS[min_level]
                .iter()
                .find(|(kind, _)| self.check(kind))
                .map(|(_, op)| *op);

            let Some(op) = op else { break };
            self.advance();

            let right = self.parse_binary(min_level + 1)?;
            let span = Span::new(left.span().start, right.span().end);
            left = AstNode::BinaryOp {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// Parse cast: `(type)expr`, distinguished from a parenthesized
    /// expression by lookahead.
    fn parse_cast(&mut self) -> Result<AstNode, ParseError> {
        if self.check(&TokenKind::LParen) {
            let saved_pos = self.position;
            let start = self.current_location();

            if self.try_parse_cast_prefix() {
                self.position = saved_pos;
                self.advance(); // consume '('
                let target_type = self.parse_type()?;
                self.expect_rparen("after cast type")?;
                let expr = self.parse_cast()?;
                let span = Span::new(start, expr.span().end);

                return Ok(AstNode::Cast {
                    target_type,
                    expr: Box::new(expr),
                    span,
                });
            }
            self.position = saved_pos;
        }

        self.parse_unary()
    }

    /// Lookahead for `(type)`. Leaves the position wherever it lands; the
    /// caller restores it.
    fn try_parse_cast_prefix(&mut self) -> bool {
        if !self.match_kind(&TokenKind::LParen) {
            return false;
        }
        if self.parse_type().is_err() {
            return false;
        }
        self.match_kind(&TokenKind::RParen)
    }

    /// Parse prefix unary operators and `sizeof`.
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();

        let op = if self.match_kind(&TokenKind::Bang) {
            Some(UnOp::Not)
        } else if self.match_kind(&TokenKind::Tilde) {
            Some(UnOp::BitNot)
        } else if self.match_kind(&TokenKind::Minus) {
            Some(UnOp::Neg)
        } else if self.match_kind(&TokenKind::Amp) {
            Some(UnOp::AddrOf)
        } else if self.match_kind(&TokenKind::Star) {
            Some(UnOp::Deref)
        } else if self.match_kind(&TokenKind::PlusPlus) {
            Some(UnOp::PreInc)
        } else if self.match_kind(&TokenKind::MinusMinus) {
            Some(UnOp::PreDec)
        } else {
            None
        };

        if let Some(op) = op {
            let operand = self.parse_unary()?;
            let span = Span::new(start, operand.span().end);
            return Ok(AstNode::UnaryOp {
                op,
                operand: Box::new(operand),
                span,
            });
        }

        // Unary plus: just the operand.
        if self.match_kind(&TokenKind::Plus) {
            return self.parse_unary();
        }

        if self.match_kind(&TokenKind::Sizeof) {
            return self.parse_sizeof(start);
        }

        self.parse_postfix()
    }

    /// Parse `sizeof(type)` or `sizeof(expr)` (keyword already consumed).
    fn parse_sizeof(
        &mut self,
        start: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        self.expect_lparen("after 'sizeof'")?;

        let saved_pos = self.position;
        if self.is_type_keyword() {
            if let Ok(target_type) = self.parse_type() {
                if self.match_kind(&TokenKind::RParen) {
                    return Ok(AstNode::SizeofType {
                        target_type,
                        span: self.span_from(start),
                    });
                }
            }
            self.position = saved_pos;
        }

        let expr = self.parse_expression()?;
        self.expect_rparen("after sizeof expression")?;

        Ok(AstNode::SizeofExpr {
            expr: Box::new(expr),
            span: self.span_from(start),
        })
    }

    /// Parse postfix operators: `++`, `--`, `[]`, `.`, `->`, call.
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_kind(&TokenKind::PlusPlus) {
                let span = Span::new(expr.span().start, self.previous_location());
                expr = AstNode::UnaryOp {
                    op: UnOp::PostInc,
                    operand: Box::new(expr),
                    span,
                };
            } else if self.match_kind(&TokenKind::MinusMinus) {
                let span = Span::new(expr.span().start, self.previous_location());
                expr = AstNode::UnaryOp {
                    op: UnOp::PostDec,
                    operand: Box::new(expr),
                    span,
                };
            } else if self.match_kind(&TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect(&TokenKind::RBracket, "expected ']' after array index")?;
                let span = Span::new(expr.span().start, self.previous_location());
                expr = AstNode::ArraySubscript {
                    base: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.match_kind(&TokenKind::Dot) {
                let member = self.expect_identifier()?;
                let span = Span::new(expr.span().start, self.previous_location());
                expr = AstNode::Member {
                    base: Box::new(expr),
                    member,
                    arrow: false,
                    span,
                };
            } else if self.match_kind(&TokenKind::Arrow) {
                let member = self.expect_identifier()?;
                let span = Span::new(expr.span().start, self.previous_location());
                expr = AstNode::Member {
                    base: Box::new(expr),
                    member,
                    arrow: true,
                    span,
                };
            } else if self.match_kind(&TokenKind::LParen) {
                let args = self.parse_argument_list()?;
                self.expect_rparen("after function arguments")?;

                let start = expr.span().start;
                let callee = match expr {
                    AstNode::DeclRef { name, .. } => name,
                    _ => {
                        return Err(self.error(
                            "called object is not a function name",
                        ));
                    }
                };
                expr = AstNode::Call {
                    callee,
                    args,
                    span: Span::new(start, self.previous_location()),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list contents: `expr, expr, ...`.
    fn parse_argument_list(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary expressions: literals, identifiers, parentheses.
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek().kind.clone() {
            TokenKind::IntLiteral(value) => {
                self.advance();
                Ok(AstNode::IntLiteral {
                    value,
                    span: Span::at(loc),
                })
            }
            TokenKind::CharLiteral(value) => {
                self.advance();
                Ok(AstNode::CharLiteral {
                    value,
                    span: Span::at(loc),
                })
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                Ok(AstNode::StringLiteral {
                    value,
                    span: Span::at(loc),
                })
            }
            TokenKind::BoolLiteral(value) => {
                self.advance();
                Ok(AstNode::BoolLiteral {
                    value,
                    span: Span::at(loc),
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(AstNode::NullLiteral { span: Span::at(loc) })
            }
            TokenKind::Nullptr => {
                self.advance();
                Ok(AstNode::NullptrLiteral { span: Span::at(loc) })
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(AstNode::DeclRef {
                    name,
                    span: Span::at(loc),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            other => Err(self.error(format!("unexpected token: {}", other))),
        }
    }
}

/// Binary operator levels from loosest to tightest binding.
const BINARY_LEVELS: &[&[(TokenKind, BinOp)]] = &[
    &[(TokenKind::OrOr, BinOp::Or)],
    &[(TokenKind::AndAnd, BinOp::And)],
    &[(TokenKind::Pipe, BinOp::BitOr)],
    &[(TokenKind::Caret, BinOp::BitXor)],
    &[(TokenKind::Amp, BinOp::BitAnd)],
    &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::NotEq, BinOp::Ne)],
    &[
        (TokenKind::Lt, BinOp::Lt),
        (TokenKind::Le, BinOp::Le),
        (TokenKind::Gt, BinOp::Gt),
        (TokenKind::Ge, BinOp::Ge),
    ],
    &[(TokenKind::Shl, BinOp::Shl), (TokenKind::Shr, BinOp::Shr)],
    &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
    &[
        (TokenKind::Star, BinOp::Mul),
        (TokenKind::Slash, BinOp::Div),
        (TokenKind::Percent, BinOp::Mod),
    ],
];
