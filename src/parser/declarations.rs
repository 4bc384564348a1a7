//! Declaration parsing implementation.
//!
//! This module handles parsing of declarations:
//!
//! - Struct definitions: `struct Name { ... };`
//! - Function definitions and prototypes: `type name(params) { ... }` or
//!   `type name(params);`, including `(void)` and a trailing `...`
//! - Variable declarations: `type name[[size]]* [= init];` (top-level and
//!   inside blocks)
//! - Type parsing: const qualifier, base types, pointers, arrays
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::source::SourceLocation;

impl Parser<'_> {
    /// Parse a top-level declaration: struct definition, function, or
    /// global variable.
    pub(crate) fn parse_top_level_declaration(&mut self) -> Result<AstNode, ParseError> {
        // Distinguish:
        //   struct Name { ... };            <- struct definition
        //   struct Name func_name(...) ...  <- declaration with struct type
        if self.check(&TokenKind::Struct) {
            let saved_pos = self.position;
            self.advance(); // consume 'struct'

            if matches!(self.peek().kind, TokenKind::Ident(_)) {
                self.advance(); // consume struct name
                if self.check(&TokenKind::LBrace) {
                    self.position = saved_pos;
                    self.advance(); // consume 'struct' again
                    return self.parse_struct_definition();
                }
            }

            self.position = saved_pos;
        }

        self.parse_typed_declaration()
    }

    /// Parse struct definition: `struct Name { fields };`. The `struct`
    /// keyword has already been consumed.
    pub(crate) fn parse_struct_definition(&mut self) -> Result<AstNode, ParseError> {
        let start = self.previous_location();

        let name = self.expect_identifier()?;
        self.expect_lbrace("after struct name")?;

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let field_start = self.current_location();
            let field_type = self.parse_type()?;
            let field_name = self.expect_identifier()?;
            self.expect_semicolon("after struct field")?;

            fields.push(Field {
                name: field_name,
                field_type,
                span: self.span_from(field_start),
            });
        }

        self.expect_rbrace("after struct fields")?;
        self.expect_semicolon("after struct definition")?;

        Ok(AstNode::RecordDecl {
            name,
            fields,
            span: self.span_from(start),
        })
    }

    /// Parse a declaration that starts with a type: a function definition,
    /// a function prototype, or a variable declaration.
    fn parse_typed_declaration(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        let decl_type = self.parse_type()?;
        let name = self.expect_identifier()?;

        if self.check(&TokenKind::LParen) {
            self.parse_function_rest(decl_type, name, start)
        } else {
            self.parse_var_decl_rest(decl_type, name, start)
        }
    }

    /// Parse the remainder of a function after `type name`: parameter list
    /// and either a body (definition) or `;` (prototype).
    fn parse_function_rest(
        &mut self,
        return_type: Type,
        name: String,
        start: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        self.expect_lparen("after function name")?;
        let (params, variadic) = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        let body = if self.match_kind(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_compound_statement()?))
        };

        Ok(AstNode::FunctionDecl {
            name,
            params,
            variadic,
            return_type,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse parameter list contents (the parentheses stay with the
    /// caller): `(type name, ..., ...)`. Returns the parameters and whether
    /// the list ended in an ellipsis.
    pub(crate) fn parse_parameter_list(
        &mut self,
    ) -> Result<(Vec<Param>, bool), ParseError> {
        let mut params = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok((params, false));
        }

        // (void) means no parameters.
        if self.check(&TokenKind::Void)
            && self
                .peek_ahead(1)
                .map(|t| matches!(t.kind, TokenKind::RParen))
                .unwrap_or(false)
        {
            self.advance();
            return Ok((params, false));
        }

        let mut variadic = false;
        loop {
            if self.match_kind(&TokenKind::Ellipsis) {
                variadic = true;
                break;
            }

            let start = self.current_location();
            let param_type = self.parse_type()?;
            let name = self.expect_identifier()?;
            params.push(Param {
                name,
                param_type,
                span: self.span_from(start),
            });

            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }

        Ok((params, variadic))
    }

    /// Parse type: `[const] base_type [*]* [[size]]*`.
    pub(crate) fn parse_type(&mut self) -> Result<Type, ParseError> {
        let mut is_const = false;
        if self.match_kind(&TokenKind::Const) {
            is_const = true;
        }

        let base = if self.match_kind(&TokenKind::Int) {
            BaseType::Int
        } else if self.match_kind(&TokenKind::Char) {
            BaseType::Char
        } else if self.match_kind(&TokenKind::Void) {
            BaseType::Void
        } else if self.match_kind(&TokenKind::Bool) {
            BaseType::Bool
        } else if self.match_kind(&TokenKind::Struct) {
            let name = self.expect_identifier()?;
            BaseType::Struct(name)
        } else {
            return Err(self.error(format!(
                "expected type, found {}",
                self.peek().kind
            )));
        };

        let mut pointer_depth = 0;
        while self.match_kind(&TokenKind::Star) {
            pointer_depth += 1;
        }

        let mut array_dims = Vec::new();
        while self.match_kind(&TokenKind::LBracket) {
            array_dims.push(self.parse_array_dimension()?);
        }

        Ok(Type {
            base,
            is_const,
            pointer_depth,
            array_dims,
        })
    }

    /// Parse one array dimension after a consumed `[`: either `]` (unsized)
    /// or a constant size followed by `]`.
    pub(crate) fn parse_array_dimension(
        &mut self,
    ) -> Result<Option<usize>, ParseError> {
        if self.check(&TokenKind::RBracket) {
            self.advance();
            return Ok(None);
        }

        let size_expr = self.parse_expression()?;
        let size = match size_expr {
            AstNode::IntLiteral { value, .. } if value >= 0 => value as usize,
            _ => {
                return Err(
                    self.error("array size must be a constant non-negative integer")
                );
            }
        };
        self.expect(&TokenKind::RBracket, "expected ']' after array size")?;
        Ok(Some(size))
    }

    /// Parse the remainder of a variable declaration after `type name`:
    /// trailing array dimensions, optional initializer, `;`.
    pub(crate) fn parse_var_decl_rest(
        &mut self,
        mut var_type: Type,
        name: String,
        start: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        // C-style array dimensions after the variable name: int arr[5];
        while self.match_kind(&TokenKind::LBracket) {
            let dim = self.parse_array_dimension()?;
            var_type.array_dims.push(dim);
        }

        let init = if self.match_kind(&TokenKind::Assign) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect_semicolon("after variable declaration")?;

        Ok(AstNode::VarDecl {
            name,
            var_type,
            init,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::parse_recovering;

    #[test]
    fn test_parse_struct() {
        let (program, diagnostics) =
            parse_recovering("struct Point { int x; int y; };");

        assert!(!diagnostics.has_uncompilable_error());
        assert_eq!(program.decls.len(), 1);
        match &program.decls[0] {
            AstNode::RecordDecl { name, fields, .. } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].name, "y");
            }
            _ => panic!("expected struct definition"),
        }
    }

    #[test]
    fn test_parse_prototype_and_global() {
        let source = "int add(int a, int b);\nint counter = 0;";
        let (program, diagnostics) = parse_recovering(source);

        assert!(!diagnostics.has_uncompilable_error());
        assert_eq!(program.decls.len(), 2);
        assert!(matches!(
            &program.decls[0],
            AstNode::FunctionDecl { body: None, params, .. } if params.len() == 2
        ));
        assert!(matches!(
            &program.decls[1],
            AstNode::VarDecl { name, init: Some(_), .. } if name == "counter"
        ));
    }

    #[test]
    fn test_parse_variadic_prototype() {
        let (program, diagnostics) =
            parse_recovering("int printf(const char *format, ...);");

        assert!(!diagnostics.has_uncompilable_error());
        match &program.decls[0] {
            AstNode::FunctionDecl {
                variadic, params, ..
            } => {
                assert!(*variadic);
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].param_type.to_string(), "const char *");
            }
            _ => panic!("expected function declaration"),
        }
    }

    #[test]
    fn test_parse_struct_return_type() {
        let source = "struct Point { int x; };\nstruct Point origin(void) { struct Point p; return p; }";
        let (program, diagnostics) = parse_recovering(source);

        assert!(!diagnostics.has_uncompilable_error());
        assert_eq!(program.decls.len(), 2);
        assert!(matches!(
            &program.decls[1],
            AstNode::FunctionDecl { name, .. } if name == "origin"
        ));
    }

    #[test]
    fn test_array_dimensions_after_name() {
        let (program, diagnostics) = parse_recovering("int grid[3][4];");

        assert!(!diagnostics.has_uncompilable_error());
        match &program.decls[0] {
            AstNode::VarDecl { var_type, .. } => {
                assert_eq!(var_type.array_dims, vec![Some(3), Some(4)]);
            }
            _ => panic!("expected variable declaration"),
        }
    }
}
