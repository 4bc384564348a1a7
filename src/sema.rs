//! Semantic analysis over the recovered tree.
//!
//! A scope-stacked symbol table drives the checks the dumper's consumers
//! rely on: undeclared identifiers, undeclared or misused functions,
//! redefinitions, `const` violations, and misplaced jump statements are
//! errors; dubious-but-legal constructs (unused locals, suspicious returns)
//! are `-Wall` warnings. Everything is reported through the shared
//! diagnostic engine; the tree itself is never modified.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::diagnostics::DiagnosticEngine;
use crate::lang::LangOptions;
use crate::parser::ast::{AstNode, BaseType, Program, Type};
use crate::source::Span;

struct FuncSig {
    param_count: usize,
    variadic: bool,
    has_body: bool,
}

struct VarInfo {
    is_const: bool,
    is_param: bool,
    used: bool,
    span: Span,
}

pub struct SemanticAnalyzer<'a> {
    options: &'a LangOptions,
    diagnostics: &'a mut DiagnosticEngine,
    functions: FxHashMap<String, FuncSig>,
    structs: FxHashSet<String>,
    scopes: Vec<FxHashMap<String, VarInfo>>,
    loop_depth: usize,
    switch_depth: usize,
    labels: Vec<String>,
    gotos: Vec<(String, Span)>,
    in_void_function: bool,
    current_function: String,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(
        options: &'a LangOptions,
        diagnostics: &'a mut DiagnosticEngine,
    ) -> Self {
        Self {
            options,
            diagnostics,
            functions: FxHashMap::default(),
            structs: FxHashSet::default(),
            scopes: vec![FxHashMap::default()], // global scope
            loop_depth: 0,
            switch_depth: 0,
            labels: Vec::new(),
            gotos: Vec::new(),
            in_void_function: false,
            current_function: String::new(),
        }
    }

    /// Checks the whole translation unit. Declarations are collected first,
    /// so definition order does not matter for lookups.
    pub fn analyze(&mut self, program: &Program) {
        for decl in &program.decls {
            self.collect_decl(decl);
        }
        for decl in &program.decls {
            if let AstNode::FunctionDecl {
                name,
                params,
                return_type,
                body: Some(body),
                ..
            } = decl
            {
                self.check_function(name, params, return_type, body);
            }
        }
    }

    fn collect_decl(&mut self, decl: &AstNode) {
        match decl {
            AstNode::FunctionDecl {
                name,
                params,
                variadic,
                body,
                span,
                ..
            } => {
                let sig = FuncSig {
                    param_count: params.len(),
                    variadic: *variadic,
                    has_body: body.is_some(),
                };
                match self.functions.get_mut(name) {
                    None => {
                        self.functions.insert(name.clone(), sig);
                    }
                    Some(existing) => {
                        if existing.has_body && sig.has_body {
                            self.diagnostics.error(
                                span.start,
                                format!("redefinition of '{}'", name),
                            );
                        } else if existing.param_count != sig.param_count
                            || existing.variadic != sig.variadic
                        {
                            self.diagnostics.error(
                                span.start,
                                format!("conflicting types for '{}'", name),
                            );
                        } else {
                            existing.has_body |= sig.has_body;
                        }
                    }
                }
            }
            AstNode::RecordDecl { name, span, .. } => {
                if !self.structs.insert(name.clone()) {
                    self.diagnostics.error(
                        span.start,
                        format!("redefinition of 'struct {}'", name),
                    );
                }
            }
            AstNode::VarDecl {
                name,
                var_type,
                init,
                span,
            } => {
                self.check_var_type(var_type, *span);
                self.declare(name, var_type.is_const, false, *span);
                if let Some(init) = init {
                    self.visit_expr(init);
                }
            }
            _ => {}
        }
    }

    fn check_function(
        &mut self,
        name: &str,
        params: &[crate::parser::ast::Param],
        return_type: &Type,
        body: &AstNode,
    ) {
        self.current_function = name.to_string();
        self.in_void_function = return_type.is_void();
        self.labels.clear();
        self.gotos.clear();

        // Parameters share the body's outermost scope, so the body's
        // compound node is unwrapped here rather than visited.
        self.push_scope();
        for param in params {
            self.check_var_type(&param.param_type, param.span);
            self.declare(&param.name, param.param_type.is_const, true, param.span);
        }

        match body {
            AstNode::Compound { stmts, .. } => {
                for stmt in stmts {
                    self.visit_stmt(stmt);
                }
            }
            other => self.visit_stmt(other),
        }

        self.pop_scope();

        let unresolved: Vec<(String, Span)> = self
            .gotos
            .iter()
            .filter(|(label, _)| !self.labels.contains(label))
            .cloned()
            .collect();
        for (label, span) in unresolved {
            self.diagnostics.error(
                span.start,
                format!("use of undeclared label '{}'", label),
            );
        }
    }

    fn visit_stmt(&mut self, stmt: &AstNode) {
        match stmt {
            AstNode::VarDecl {
                name,
                var_type,
                init,
                span,
            } => {
                self.check_var_type(var_type, *span);
                self.declare(name, var_type.is_const, false, *span);
                if let Some(init) = init {
                    self.visit_expr(init);
                }
            }
            AstNode::Compound { stmts, .. } => {
                self.push_scope();
                for stmt in stmts {
                    self.visit_stmt(stmt);
                }
                self.pop_scope();
            }
            AstNode::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.visit_expr(cond);
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            AstNode::While { cond, body, .. } => {
                self.visit_expr(cond);
                self.loop_depth += 1;
                self.visit_stmt(body);
                self.loop_depth -= 1;
            }
            AstNode::DoWhile { body, cond, .. } => {
                self.loop_depth += 1;
                self.visit_stmt(body);
                self.loop_depth -= 1;
                self.visit_expr(cond);
            }
            AstNode::For {
                init,
                cond,
                inc,
                body,
                ..
            } => {
                // A declaration in the init clause is scoped to the loop.
                self.push_scope();
                if let Some(init) = init {
                    self.visit_stmt(init);
                }
                if let Some(cond) = cond {
                    self.visit_expr(cond);
                }
                if let Some(inc) = inc {
                    self.visit_expr(inc);
                }
                self.loop_depth += 1;
                self.visit_stmt(body);
                self.loop_depth -= 1;
                self.pop_scope();
            }
            AstNode::Switch { cond, cases, .. } => {
                self.visit_expr(cond);
                self.switch_depth += 1;
                for case in cases {
                    match case {
                        AstNode::Case { value, stmts, .. } => {
                            self.visit_expr(value);
                            for stmt in stmts {
                                self.visit_stmt(stmt);
                            }
                        }
                        AstNode::DefaultCase { stmts, .. } => {
                            for stmt in stmts {
                                self.visit_stmt(stmt);
                            }
                        }
                        _ => {}
                    }
                }
                self.switch_depth -= 1;
            }
            AstNode::Break { span } => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.diagnostics.error(
                        span.start,
                        "'break' statement not in loop or switch statement",
                    );
                }
            }
            AstNode::Continue { span } => {
                if self.loop_depth == 0 {
                    self.diagnostics.error(
                        span.start,
                        "'continue' statement not in loop statement",
                    );
                }
            }
            AstNode::Goto { label, span } => {
                self.gotos.push((label.clone(), *span));
            }
            AstNode::Label { name, span } => {
                if self.labels.contains(name) {
                    self.diagnostics.error(
                        span.start,
                        format!("redefinition of label '{}'", name),
                    );
                } else {
                    self.labels.push(name.clone());
                }
            }
            AstNode::Return { expr, span } => {
                match (expr, self.in_void_function) {
                    (Some(_), true) => self.warn(
                        *span,
                        format!(
                            "void function '{}' should not return a value",
                            self.current_function
                        ),
                    ),
                    (None, false) => self.warn(
                        *span,
                        format!(
                            "non-void function '{}' should return a value",
                            self.current_function
                        ),
                    ),
                    _ => {}
                }
                if let Some(expr) = expr {
                    self.visit_expr(expr);
                }
            }
            AstNode::NullStmt { .. } => {}
            // Anything else used in statement position is an expression.
            expr => self.visit_expr(expr),
        }
    }

    fn visit_expr(&mut self, expr: &AstNode) {
        match expr {
            AstNode::DeclRef { name, span } => {
                if self.mark_used(name) {
                    return;
                }
                if self.functions.contains_key(name) {
                    return; // function designator
                }
                self.diagnostics.error(
                    span.start,
                    format!("use of undeclared identifier '{}'", name),
                );
            }
            AstNode::Call { callee, args, span } => {
                match self.functions.get(callee) {
                    None => self.diagnostics.error(
                        span.start,
                        format!("call to undeclared function '{}'", callee),
                    ),
                    Some(sig) => {
                        if args.len() < sig.param_count {
                            self.diagnostics.error(
                                span.start,
                                format!(
                                    "too few arguments to function call '{}': expected {}{}, have {}",
                                    callee,
                                    if sig.variadic { "at least " } else { "" },
                                    sig.param_count,
                                    args.len()
                                ),
                            );
                        } else if !sig.variadic && args.len() > sig.param_count {
                            self.diagnostics.error(
                                span.start,
                                format!(
                                    "too many arguments to function call '{}': expected {}, have {}",
                                    callee,
                                    sig.param_count,
                                    args.len()
                                ),
                            );
                        }
                    }
                }
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            AstNode::Assignment { lhs, rhs, .. }
            | AstNode::CompoundAssignment { lhs, rhs, .. } => {
                self.check_assignable(lhs);
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            AstNode::BinaryOp { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            AstNode::UnaryOp { operand, .. } => self.visit_expr(operand),
            AstNode::Conditional {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                self.visit_expr(cond);
                self.visit_expr(then_expr);
                self.visit_expr(else_expr);
            }
            AstNode::ArraySubscript { base, index, .. } => {
                self.visit_expr(base);
                self.visit_expr(index);
            }
            AstNode::Member { base, .. } => self.visit_expr(base),
            AstNode::Cast { expr, .. } => self.visit_expr(expr),
            AstNode::SizeofExpr { expr, .. } => self.visit_expr(expr),
            _ => {}
        }
    }

    fn check_assignable(&mut self, lhs: &AstNode) {
        if let AstNode::DeclRef { name, span } = lhs {
            let is_const = self
                .scopes
                .iter()
                .rev()
                .find_map(|scope| scope.get(name))
                .map(|info| info.is_const)
                .unwrap_or(false);
            if is_const {
                self.diagnostics.error(
                    span.start,
                    format!("cannot assign to const variable '{}'", name),
                );
            }
        }
    }

    fn check_var_type(&mut self, var_type: &Type, span: Span) {
        if let BaseType::Struct(name) = &var_type.base {
            if var_type.pointer_depth == 0 && !self.structs.contains(name) {
                self.diagnostics.error(
                    span.start,
                    format!("variable has incomplete type 'struct {}'", name),
                );
            }
        }
    }

    fn declare(&mut self, name: &str, is_const: bool, is_param: bool, span: Span) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name) {
                self.diagnostics
                    .error(span.start, format!("redefinition of '{}'", name));
                return;
            }
            scope.insert(
                name.to_string(),
                VarInfo {
                    is_const,
                    is_param,
                    used: false,
                    span,
                },
            );
        }
    }

    /// Marks `name` used in the innermost scope that declares it. Returns
    /// false if no scope does.
    fn mark_used(&mut self, name: &str) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(info) = scope.get_mut(name) {
                info.used = true;
                return true;
            }
        }
        false
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pops a scope, reporting its unused names in source order.
    fn pop_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<(String, VarInfo)> = scope
            .into_iter()
            .filter(|(_, info)| !info.used)
            .collect();
        unused.sort_by_key(|(_, info)| (info.span.start.line, info.span.start.column));

        for (name, info) in unused {
            let what = if info.is_param { "parameter" } else { "variable" };
            self.warn(info.span, format!("unused {} '{}'", what, name));
        }
    }

    fn warn(&mut self, span: Span, message: String) {
        if self.options.warn_all {
            self.diagnostics.warning(span.start, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::parse_recovering_with;

    fn analyze(source: &str, args: &[&str]) -> DiagnosticEngine {
        let (program, mut diagnostics) = parse_recovering_with(source, args);
        let options = LangOptions::from_args("input.c", args).unwrap();
        SemanticAnalyzer::new(&options, &mut diagnostics).analyze(&program);
        diagnostics
    }

    #[test]
    fn test_clean_program() {
        let diagnostics = analyze(
            "int add(int a, int b) { return a + b; }\nint main(void) { return add(1, 2); }",
            &["-Wall"],
        );
        assert!(!diagnostics.has_uncompilable_error());
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_undeclared_identifier() {
        let diagnostics = analyze("int main(void) { return missing; }", &[]);
        assert!(diagnostics.has_uncompilable_error());
        assert!(diagnostics.diagnostics().iter().any(|d| {
            d.message.contains("use of undeclared identifier 'missing'")
        }));
    }

    #[test]
    fn test_undeclared_function_call() {
        let diagnostics = analyze("int main(void) { return magic(); }", &[]);
        assert!(diagnostics.has_uncompilable_error());
        assert!(diagnostics.diagnostics().iter().any(|d| {
            d.message.contains("call to undeclared function 'magic'")
        }));
    }

    #[test]
    fn test_argument_count_checking() {
        let diagnostics = analyze(
            "int add(int a, int b) { return a + b; }\nint main(void) { return add(1); }",
            &[],
        );
        assert!(diagnostics.has_uncompilable_error());

        // Variadic calls only have a lower bound.
        let diagnostics = analyze(
            "#include <stdio.h>\nint main(void) { printf(\"%d %d\", 1, 2); return 0; }",
            &[],
        );
        assert!(!diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_const_assignment_rejected() {
        let diagnostics = analyze(
            "int main(void) { const int limit = 10; limit = 20; return limit; }",
            &[],
        );
        assert!(diagnostics.has_uncompilable_error());
        assert!(diagnostics.diagnostics().iter().any(|d| {
            d.message.contains("cannot assign to const variable 'limit'")
        }));
    }

    #[test]
    fn test_break_outside_loop() {
        let diagnostics = analyze("int main(void) { break; return 0; }", &[]);
        assert!(diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_goto_undeclared_label() {
        let diagnostics = analyze("int main(void) { goto nowhere; return 0; }", &[]);
        assert!(diagnostics.has_uncompilable_error());
        assert!(diagnostics.diagnostics().iter().any(|d| {
            d.message.contains("use of undeclared label 'nowhere'")
        }));
    }

    #[test]
    fn test_unused_variable_warning_gated_by_wall() {
        let source = "int main(void) { int unused = 1; return 0; }";

        let diagnostics = analyze(source, &["-Wall"]);
        assert!(!diagnostics.has_uncompilable_error());
        assert_eq!(diagnostics.warning_count(), 1);

        let diagnostics = analyze(source, &[]);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_redefinition_of_function() {
        let diagnostics = analyze(
            "int f(void) { return 1; }\nint f(void) { return 2; }",
            &[],
        );
        assert!(diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_prototype_then_definition_ok() {
        let diagnostics = analyze(
            "int f(int x);\nint f(int x) { return x; }\nint main(void) { return f(3); }",
            &[],
        );
        assert!(!diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_incomplete_struct_type() {
        let diagnostics = analyze("int main(void) { struct Ghost g; return 0; }", &[]);
        assert!(diagnostics.has_uncompilable_error());

        // Pointers to undeclared structs are fine.
        let diagnostics =
            analyze("int main(void) { struct Ghost *g = NULL; return g == NULL; }", &[]);
        assert!(!diagnostics.has_uncompilable_error());
    }
}
