//! The parsed-program handle and the build-from-code entry point.
//!
//! [`build_ast_from_code_with_args`] runs the entire front end
//! (preprocessing, lexing, parsing, semantic analysis) synchronously and
//! hands back an [`AstUnit`] that exclusively owns everything the parse
//! produced. The only way to get no unit at all is an unusable invocation
//! (bad arguments); source problems always yield a unit whose diagnostic
//! state says the tree cannot be trusted. Callers must therefore check
//! [`DiagnosticEngine::has_uncompilable_error`] before relying on the tree,
//! but dumping a best-effort tree stays available to those who want it.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crossterm::tty::IsTty;

use crate::diagnostics::DiagnosticEngine;
use crate::dump::AstDumper;
use crate::lang::{ArgError, LangOptions};
use crate::parser::ast::Program;
use crate::parser::lexer::Lexer;
use crate::parser::parse::Parser;
use crate::preprocess::Preprocessor;
use crate::sema::SemanticAnalyzer;
use crate::source::SourceMap;

/// Why no program handle could be produced at all. Distinct from source
/// errors, which do produce a (best-effort) handle.
#[derive(Debug)]
pub enum BuildError {
    /// The invocation arguments were unusable; nothing was parsed.
    InvalidArguments(ArgError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::InvalidArguments(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::InvalidArguments(err) => Some(err),
        }
    }
}

impl From<ArgError> for BuildError {
    fn from(err: ArgError) -> Self {
        BuildError::InvalidArguments(err)
    }
}

/// The parsed program together with all state produced while parsing it:
/// the source map, the diagnostic log, the language options, and the tree.
/// Dropping the unit releases everything.
pub struct AstUnit {
    sources: SourceMap,
    diagnostics: DiagnosticEngine,
    options: LangOptions,
    program: Program,
}

impl AstUnit {
    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    /// The translation-unit node: the traversal root for dumping. Present
    /// even when diagnostics recorded unrecoverable errors.
    pub fn translation_unit(&self) -> &Program {
        &self.program
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn lang_options(&self) -> &LangOptions {
        &self.options
    }

    /// Dumps the tree to `out`. Whether to dump after errors is the
    /// caller's policy, not this library's.
    pub fn dump<W: Write>(&self, out: W, color: bool) -> io::Result<()> {
        AstDumper::new(&self.sources, out, color).dump(&self.program)
    }

    /// Dumps the tree to stdout, highlighted when stdout is a terminal.
    pub fn dump_stdout(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let color = stdout.is_tty();
        let lock = stdout.lock();
        self.dump(lock, color)
    }
}

/// Builds a translation unit from in-memory source text.
///
/// `code` is the entire source text; `args` are applied as invocation
/// arguments in order; `filename` is a virtual name used for diagnostics
/// and dialect selection; `toolchain_path` locates the toolchain executable
/// whose install layout provides the resource directory (it is never
/// executed).
///
/// Diagnostics are rendered to stderr before returning, whatever the
/// outcome.
pub fn build_ast_from_code_with_args(
    code: &str,
    args: &[&str],
    filename: &str,
    toolchain_path: &str,
) -> Result<AstUnit, BuildError> {
    let options = LangOptions::from_args(filename, args)?;

    let mut sources = SourceMap::new();
    let main = sources.add_file(filename, code);
    let mut diagnostics = DiagnosticEngine::new(options.suppress_warnings);

    let expanded = Preprocessor::new(
        &options,
        resource_dir(toolchain_path),
        &mut sources,
        &mut diagnostics,
    )
    .expand(main);

    let tokens = Lexer::new(&expanded, &options, &mut diagnostics).tokenize();
    let program = Parser::new(tokens, &options, &mut diagnostics).parse_program();
    SemanticAnalyzer::new(&options, &mut diagnostics).analyze(&program);

    diagnostics.render_to_stderr(&sources);

    Ok(AstUnit {
        sources,
        diagnostics,
        options,
        program,
    })
}

/// The resource directory lives next to the toolchain executable.
fn resource_dir(toolchain_path: &str) -> Option<PathBuf> {
    Path::new(toolchain_path)
        .parent()
        .map(|dir| dir.join("include"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLCHAIN: &str = "/opt/ctree/bin/ctree";

    #[test]
    fn test_valid_program_builds() {
        let unit = build_ast_from_code_with_args(
            "int main(void) { return 0; }",
            &["-std=c11", "-Wall"],
            "input.c",
            TOOLCHAIN,
        )
        .expect("build failed");

        assert!(!unit.diagnostics().has_uncompilable_error());
        assert_eq!(unit.translation_unit().decls.len(), 1);
    }

    #[test]
    fn test_invalid_arguments_yield_no_unit() {
        let result = build_ast_from_code_with_args(
            "int main(void) { return 0; }",
            &["-std=c++20"],
            "input.c",
            TOOLCHAIN,
        );
        assert!(matches!(result, Err(BuildError::InvalidArguments(_))));
    }

    #[test]
    fn test_source_errors_still_yield_a_unit() {
        let unit = build_ast_from_code_with_args(
            "int main(void) { return }",
            &[],
            "input.c",
            TOOLCHAIN,
        )
        .expect("a unit should exist even for broken source");

        assert!(unit.diagnostics().has_uncompilable_error());
        // The best-effort tree still has the translation-unit root.
        assert_eq!(unit.translation_unit().decls.len(), 1);
    }

    #[test]
    fn test_dialect_follows_extension_not_content() {
        let source = "bool flip(bool b) { return !b; }";

        let unit =
            build_ast_from_code_with_args(source, &[], "input.cc", TOOLCHAIN)
                .expect("build failed");
        assert!(!unit.diagnostics().has_uncompilable_error());

        let unit =
            build_ast_from_code_with_args(source, &[], "input.c", TOOLCHAIN)
                .expect("build failed");
        assert!(unit.diagnostics().has_uncompilable_error());
    }

    #[test]
    fn test_dump_is_available_regardless_of_errors() {
        let unit = build_ast_from_code_with_args(
            "int main(void) { return oops; }",
            &[],
            "input.c",
            TOOLCHAIN,
        )
        .expect("build failed");
        assert!(unit.diagnostics().has_uncompilable_error());

        let mut rendered = Vec::new();
        unit.dump(&mut rendered, false).expect("dump failed");
        let rendered = String::from_utf8(rendered).unwrap();
        assert!(rendered.contains("TranslationUnitDecl"));
        assert!(rendered.contains("FunctionDecl"));
    }
}
