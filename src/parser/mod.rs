//! C source code parser.
//!
//! This module transforms preprocessed source text into an Abstract Syntax
//! Tree (AST):
//! - [`lexer`]: Tokenization (expanded text → tokens)
//! - [`parse`]: Parser struct, helpers, recovery, and the parse entry point
//! - [`declarations`], [`statements`], [`expressions`]: the grammar, as
//!   `impl Parser` blocks
//! - [`ast`]: AST node definitions
//!
//! # Supported C Subset
//!
//! - Types: `int`, `char`, `void`, structs, pointers, arrays (plus `bool`
//!   in the C++ dialect)
//! - Declarations: functions (definitions, prototypes, variadics), structs,
//!   global and local variables
//! - Statements: control flow (`if`, `while`, `do-while`, `for`, `switch`),
//!   jumps (`return`, `break`, `continue`, `goto`), labels, blocks
//! - Expressions: arithmetic, logical, bitwise, ternary, calls, casts,
//!   `sizeof`
//! - No typedefs, unions, enums, or function pointers
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for
//! binary operators. Errors are reported to the diagnostic engine and the
//! parser resynchronizes, so a best-effort tree is always produced.

pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod statements;

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared pipeline helper for parser unit tests.

    use crate::diagnostics::DiagnosticEngine;
    use crate::lang::LangOptions;
    use crate::parser::ast::Program;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;
    use crate::preprocess::Preprocessor;
    use crate::source::SourceMap;

    /// Runs preprocessor, lexer, and parser over `source` as `input.c`.
    pub(crate) fn parse_recovering(source: &str) -> (Program, DiagnosticEngine) {
        parse_recovering_with(source, &[])
    }

    pub(crate) fn parse_recovering_with(
        source: &str,
        args: &[&str],
    ) -> (Program, DiagnosticEngine) {
        let options = LangOptions::from_args("input.c", args).unwrap();
        let mut sources = SourceMap::new();
        let main = sources.add_file("input.c", source);
        let mut diagnostics = DiagnosticEngine::new(false);

        let expanded =
            Preprocessor::new(&options, None, &mut sources, &mut diagnostics)
                .expand(main);
        let tokens =
            Lexer::new(&expanded, &options, &mut diagnostics).tokenize();
        let program =
            Parser::new(tokens, &options, &mut diagnostics).parse_program();

        (program, diagnostics)
    }
}
