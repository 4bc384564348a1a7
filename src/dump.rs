//! Pretty tree dumper.
//!
//! Writes the translation unit as an indentation-based tree, one node per
//! line, in deterministic pre-order: node kind, the node's address as a
//! memory-identity tag for cross-referencing, the source span, and
//! kind-specific attributes. Output is syntax-highlighted when requested;
//! apart from the identity tags (which vary run to run) the text is
//! byte-stable for identical input.
//!
//! Span positions abbreviate like diagnostics do: the file name appears
//! when it changes, `line:` when only the line changed, `col:` when the
//! line is unchanged.

use std::io::{self, Write};

use crossterm::style::Stylize;

use crate::parser::ast::*;
use crate::source::{FileId, SourceLocation, SourceMap, Span};

/// Pre-order tree printer over one translation unit.
pub struct AstDumper<'a, W: Write> {
    sources: &'a SourceMap,
    out: W,
    color: bool,
    last_file: Option<FileId>,
    last_line: u32,
}

/// One printable child: a real node, or a parameter/field line synthesized
/// from its owning declaration.
enum Child<'n> {
    Node(&'n AstNode),
    Param(&'n Param),
    Field(&'n Field),
}

impl<'a, W: Write> AstDumper<'a, W> {
    pub fn new(sources: &'a SourceMap, out: W, color: bool) -> Self {
        Self {
            sources,
            out,
            color,
            last_file: None,
            last_line: 0,
        }
    }

    /// Dumps the whole tree rooted at the translation unit.
    pub fn dump(&mut self, program: &Program) -> io::Result<()> {
        let kind = self.paint_decl("TranslationUnitDecl");
        let addr = self.paint_addr(format!("{:p}", program as *const Program));
        let span = self.format_span(program.span);
        writeln!(self.out, "{} {} {}", kind, addr, span)?;

        let count = program.decls.len();
        for (index, decl) in program.decls.iter().enumerate() {
            // Each top-level declaration prints a full position.
            self.last_file = None;
            self.dump_child(&Child::Node(decl), "", index + 1 == count)?;
        }
        Ok(())
    }

    fn dump_child(
        &mut self,
        child: &Child<'_>,
        prefix: &str,
        is_last: bool,
    ) -> io::Result<()> {
        let connector = if is_last { "`-" } else { "|-" };
        write!(self.out, "{}{}", prefix, connector)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "| " });
        match child {
            Child::Param(param) => {
                let line = format!(
                    "{} {} {} {} {}",
                    self.paint_decl("ParmVarDecl"),
                    self.paint_addr(format!("{:p}", *param as *const Param)),
                    self.format_span(param.span),
                    self.paint_name(&param.name),
                    self.paint_type(&param.param_type.to_string()),
                );
                writeln!(self.out, "{}", line)
            }
            Child::Field(field) => {
                let line = format!(
                    "{} {} {} {} {}",
                    self.paint_decl("FieldDecl"),
                    self.paint_addr(format!("{:p}", *field as *const Field)),
                    self.format_span(field.span),
                    self.paint_name(&field.name),
                    self.paint_type(&field.field_type.to_string()),
                );
                writeln!(self.out, "{}", line)
            }
            Child::Node(node) => {
                let node = *node;
                self.write_node_line(node)?;
                let children = children_of(node);
                let count = children.len();
                for (index, grandchild) in children.iter().enumerate() {
                    self.dump_child(grandchild, &child_prefix, index + 1 == count)?;
                }
                Ok(())
            }
        }
    }

    /// Writes the one-line description of `node` (kind, tag, span,
    /// attributes) without its children.
    fn write_node_line(&mut self, node: &AstNode) -> io::Result<()> {
        let addr = self.paint_addr(format!("{:p}", node as *const AstNode));
        let span = self.format_span(node.span());

        let (kind, attrs) = match node {
            AstNode::FunctionDecl {
                name,
                params,
                variadic,
                return_type,
                ..
            } => {
                let fn_type = function_type(return_type, params, *variadic);
                (
                    self.paint_decl("FunctionDecl"),
                    format!(
                        " {} {}",
                        self.paint_name(name),
                        self.paint_type(&fn_type)
                    ),
                )
            }
            AstNode::RecordDecl { name, .. } => (
                self.paint_decl("RecordDecl"),
                format!(" struct {} definition", self.paint_name(name)),
            ),
            AstNode::VarDecl { name, var_type, init, .. } => (
                self.paint_decl("VarDecl"),
                format!(
                    " {} {}{}",
                    self.paint_name(name),
                    self.paint_type(&var_type.to_string()),
                    if init.is_some() { " cinit" } else { "" },
                ),
            ),

            AstNode::Compound { .. } => (self.paint_stmt("CompoundStmt"), String::new()),
            AstNode::If { else_branch, .. } => (
                self.paint_stmt("IfStmt"),
                if else_branch.is_some() {
                    " has_else".to_string()
                } else {
                    String::new()
                },
            ),
            AstNode::While { .. } => (self.paint_stmt("WhileStmt"), String::new()),
            AstNode::DoWhile { .. } => (self.paint_stmt("DoStmt"), String::new()),
            AstNode::For { .. } => (self.paint_stmt("ForStmt"), String::new()),
            AstNode::Switch { .. } => (self.paint_stmt("SwitchStmt"), String::new()),
            AstNode::Case { .. } => (self.paint_stmt("CaseStmt"), String::new()),
            AstNode::DefaultCase { .. } => {
                (self.paint_stmt("DefaultStmt"), String::new())
            }
            AstNode::Break { .. } => (self.paint_stmt("BreakStmt"), String::new()),
            AstNode::Continue { .. } => {
                (self.paint_stmt("ContinueStmt"), String::new())
            }
            AstNode::Goto { label, .. } => (
                self.paint_stmt("GotoStmt"),
                format!(" {}", self.paint_name(label)),
            ),
            AstNode::Label { name, .. } => (
                self.paint_stmt("LabelStmt"),
                format!(" {}", self.paint_name(name)),
            ),
            AstNode::Return { .. } => (self.paint_stmt("ReturnStmt"), String::new()),
            AstNode::NullStmt { .. } => (self.paint_stmt("NullStmt"), String::new()),

            AstNode::IntLiteral { value, .. } => (
                self.paint_stmt("IntegerLiteral"),
                format!(
                    " {} {}",
                    self.paint_type("'int'"),
                    self.paint_value(&value.to_string())
                ),
            ),
            AstNode::CharLiteral { value, .. } => (
                self.paint_stmt("CharacterLiteral"),
                format!(
                    " {} {}",
                    self.paint_type("'char'"),
                    self.paint_value(&value.to_string())
                ),
            ),
            AstNode::StringLiteral { value, .. } => (
                self.paint_stmt("StringLiteral"),
                format!(
                    " {} \"{}\"",
                    self.paint_type(&format!("char [{}]", value.len() + 1)),
                    value.escape_default(),
                ),
            ),
            AstNode::BoolLiteral { value, .. } => (
                self.paint_stmt("BoolLiteral"),
                format!(
                    " {} {}",
                    self.paint_type("'bool'"),
                    self.paint_value(if *value { "true" } else { "false" })
                ),
            ),
            AstNode::NullLiteral { .. } => (
                self.paint_stmt("NullLiteral"),
                format!(" {}", self.paint_type("'void *'")),
            ),
            AstNode::NullptrLiteral { .. } => (
                self.paint_stmt("NullptrLiteral"),
                format!(" {}", self.paint_type("'nullptr_t'")),
            ),
            AstNode::DeclRef { name, .. } => (
                self.paint_stmt("DeclRefExpr"),
                format!(" {}", self.paint_name(name)),
            ),
            AstNode::BinaryOp { op, .. } => (
                self.paint_stmt("BinaryOperator"),
                format!(" '{}'", op.spelling()),
            ),
            AstNode::UnaryOp { op, .. } => (
                self.paint_stmt("UnaryOperator"),
                format!(
                    " {} '{}'",
                    if op.is_postfix() { "postfix" } else { "prefix" },
                    op.spelling()
                ),
            ),
            AstNode::Conditional { .. } => {
                (self.paint_stmt("ConditionalOperator"), String::new())
            }
            AstNode::Assignment { .. } => {
                (self.paint_stmt("BinaryOperator"), " '='".to_string())
            }
            AstNode::CompoundAssignment { op, .. } => (
                self.paint_stmt("CompoundAssignOperator"),
                format!(" '{}='", op.spelling()),
            ),
            AstNode::Call { callee, .. } => (
                self.paint_stmt("CallExpr"),
                format!(" {}", self.paint_name(callee)),
            ),
            AstNode::ArraySubscript { .. } => {
                (self.paint_stmt("ArraySubscriptExpr"), String::new())
            }
            AstNode::Member { member, arrow, .. } => (
                self.paint_stmt("MemberExpr"),
                format!(" {}{}", if *arrow { "->" } else { "." }, member),
            ),
            AstNode::Cast { target_type, .. } => (
                self.paint_stmt("CStyleCastExpr"),
                format!(" {}", self.paint_type(&target_type.to_string())),
            ),
            AstNode::SizeofType { target_type, .. } => (
                self.paint_stmt("SizeofExpr"),
                format!(" sizeof {}", self.paint_type(&target_type.to_string())),
            ),
            AstNode::SizeofExpr { .. } => {
                (self.paint_stmt("SizeofExpr"), String::new())
            }
        };

        writeln!(self.out, "{} {} {}{}", kind, addr, span, attrs)
    }

    /// Formats a span, abbreviating against the previously printed
    /// position.
    fn format_span(&mut self, span: Span) -> String {
        let text = if span.start == span.end {
            format!("<{}>", self.format_loc(span.start))
        } else {
            let start = self.format_loc(span.start);
            let end = self.format_loc(span.end);
            format!("<{}, {}>", start, end)
        };
        self.paint_loc(&text)
    }

    fn format_loc(&mut self, loc: SourceLocation) -> String {
        let text = if self.last_file != Some(loc.file) {
            format!(
                "{}:{}:{}",
                self.sources.name(loc.file),
                loc.line,
                loc.column
            )
        } else if self.last_line != loc.line {
            format!("line:{}:{}", loc.line, loc.column)
        } else {
            format!("col:{}", loc.column)
        };
        self.last_file = Some(loc.file);
        self.last_line = loc.line;
        text
    }

    // ===== Styling helpers =====

    fn paint_decl(&self, s: &str) -> String {
        if self.color {
            s.green().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_stmt(&self, s: &str) -> String {
        if self.color {
            s.magenta().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_addr(&self, s: String) -> String {
        if self.color {
            s.yellow().to_string()
        } else {
            s
        }
    }

    fn paint_loc(&self, s: &str) -> String {
        if self.color {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_name(&self, s: &str) -> String {
        if self.color {
            s.cyan().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_type(&self, s: &str) -> String {
        let quoted = if s.starts_with('\'') {
            s.to_string()
        } else {
            format!("'{}'", s)
        };
        if self.color {
            quoted.green().to_string()
        } else {
            quoted
        }
    }

    fn paint_value(&self, s: &str) -> String {
        if self.color {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Renders a function's type the way the dump shows it: `int (int, char *)`.
fn function_type(return_type: &Type, params: &[Param], variadic: bool) -> String {
    let mut parts: Vec<String> =
        params.iter().map(|p| p.param_type.to_string()).collect();
    if variadic {
        parts.push("...".to_string());
    }
    format!("{} ({})", return_type, parts.join(", "))
}

/// The printable children of a node, in dump order.
fn children_of(node: &AstNode) -> Vec<Child<'_>> {
    let mut children = Vec::new();
    match node {
        AstNode::FunctionDecl { params, body, .. } => {
            children.extend(params.iter().map(Child::Param));
            if let Some(body) = body {
                children.push(Child::Node(body.as_ref()));
            }
        }
        AstNode::RecordDecl { fields, .. } => {
            children.extend(fields.iter().map(Child::Field));
        }
        AstNode::VarDecl { init, .. } => {
            if let Some(init) = init {
                children.push(Child::Node(init.as_ref()));
            }
        }
        AstNode::Compound { stmts, .. } => {
            children.extend(stmts.iter().map(Child::Node));
        }
        AstNode::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            children.push(Child::Node(cond.as_ref()));
            children.push(Child::Node(then_branch.as_ref()));
            if let Some(else_branch) = else_branch {
                children.push(Child::Node(else_branch.as_ref()));
            }
        }
        AstNode::While { cond, body, .. } => {
            children.push(Child::Node(cond.as_ref()));
            children.push(Child::Node(body.as_ref()));
        }
        AstNode::DoWhile { body, cond, .. } => {
            children.push(Child::Node(body.as_ref()));
            children.push(Child::Node(cond.as_ref()));
        }
        AstNode::For {
            init,
            cond,
            inc,
            body,
            ..
        } => {
            children.extend(init.as_deref().map(Child::Node));
            children.extend(cond.as_deref().map(Child::Node));
            children.extend(inc.as_deref().map(Child::Node));
            children.push(Child::Node(body.as_ref()));
        }
        AstNode::Switch { cond, cases, .. } => {
            children.push(Child::Node(cond.as_ref()));
            children.extend(cases.iter().map(Child::Node));
        }
        AstNode::Case { value, stmts, .. } => {
            children.push(Child::Node(value.as_ref()));
            children.extend(stmts.iter().map(Child::Node));
        }
        AstNode::DefaultCase { stmts, .. } => {
            children.extend(stmts.iter().map(Child::Node));
        }
        AstNode::Return { expr, .. } => {
            children.extend(expr.as_deref().map(Child::Node));
        }
        AstNode::BinaryOp { lhs, rhs, .. }
        | AstNode::Assignment { lhs, rhs, .. }
        | AstNode::CompoundAssignment { lhs, rhs, .. } => {
            children.push(Child::Node(lhs.as_ref()));
            children.push(Child::Node(rhs.as_ref()));
        }
        AstNode::UnaryOp { operand, .. } => {
            children.push(Child::Node(operand.as_ref()));
        }
        AstNode::Conditional {
            cond,
            then_expr,
            else_expr,
            ..
        } => {
            children.push(Child::Node(cond.as_ref()));
            children.push(Child::Node(then_expr.as_ref()));
            children.push(Child::Node(else_expr.as_ref()));
        }
        AstNode::Call { args, .. } => {
            children.extend(args.iter().map(Child::Node));
        }
        AstNode::ArraySubscript { base, index, .. } => {
            children.push(Child::Node(base.as_ref()));
            children.push(Child::Node(index.as_ref()));
        }
        AstNode::Member { base, .. } => children.push(Child::Node(base.as_ref())),
        AstNode::Cast { expr, .. } | AstNode::SizeofExpr { expr, .. } => {
            children.push(Child::Node(expr.as_ref()));
        }
        AstNode::Break { .. }
        | AstNode::Continue { .. }
        | AstNode::Goto { .. }
        | AstNode::Label { .. }
        | AstNode::NullStmt { .. }
        | AstNode::IntLiteral { .. }
        | AstNode::CharLiteral { .. }
        | AstNode::StringLiteral { .. }
        | AstNode::BoolLiteral { .. }
        | AstNode::NullLiteral { .. }
        | AstNode::NullptrLiteral { .. }
        | AstNode::DeclRef { .. }
        | AstNode::SizeofType { .. } => {}
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::parse_recovering;
    use crate::source::SourceMap;

    fn dump_plain(source: &str) -> String {
        let (program, diagnostics) = parse_recovering(source);
        assert!(
            !diagnostics.has_uncompilable_error(),
            "unexpected parse errors"
        );

        let mut sources = SourceMap::new();
        sources.add_file("input.c", source);
        let mut rendered = Vec::new();
        AstDumper::new(&sources, &mut rendered, false)
            .dump(&program)
            .unwrap();
        String::from_utf8(rendered).unwrap()
    }

    #[test]
    fn test_empty_main_shape() {
        let dump = dump_plain("int main() {}");
        let lines: Vec<&str> = dump.lines().collect();

        assert!(lines[0].starts_with("TranslationUnitDecl 0x"));
        assert!(lines[1].starts_with("`-FunctionDecl 0x"));
        assert!(lines[1].contains("<input.c:1:1, col:13>"));
        assert!(lines[1].contains("main 'int ()'"));
        assert!(lines[2].starts_with("  `-CompoundStmt 0x"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_top_level_order_matches_source() {
        let dump = dump_plain("int first(void) { return 1; }\nint second(void) { return 2; }");
        let first = dump.find("first").unwrap();
        let second = dump.find("second").unwrap();
        assert!(first < second);

        // Non-final children use the |- connector.
        assert!(dump.contains("|-FunctionDecl"));
        assert!(dump.contains("`-FunctionDecl"));
    }

    #[test]
    fn test_operator_attributes() {
        let dump = dump_plain("int main() { int x = 1 + 2; x += 3; return x++; }");
        assert!(dump.contains("BinaryOperator"));
        assert!(dump.contains("'+'"));
        assert!(dump.contains("CompoundAssignOperator"));
        assert!(dump.contains("'+='"));
        assert!(dump.contains("UnaryOperator"));
        assert!(dump.contains("postfix '++'"));
        assert!(dump.contains("IntegerLiteral"));
    }

    #[test]
    fn test_variadic_function_type() {
        let dump = dump_plain("int printf(const char *format, ...);");
        assert!(dump.contains("'int (const char *, ...)'"));
        assert!(dump.contains("ParmVarDecl"));
    }
}
