//! Diagnostic collection and rendering.
//!
//! Every stage of the front end reports into one [`DiagnosticEngine`], which
//! records diagnostics in emission order and answers the single question the
//! driver cares about: did anything unrecoverable happen? Rendering writes
//! GNU-style `file:line:col: severity: message` lines with the offending
//! source line and a caret underneath.

use std::io::{self, Write};

use crossterm::style::Stylize;
use crossterm::tty::IsTty;

use crate::source::{SourceLocation, SourceMap};

/// Diagnostic severity, ordered from least to most severe.
///
/// `Error` and `Fatal` both mark the translation unit as uncompilable; the
/// distinction is that a `Fatal` diagnostic also stopped the stage that
/// raised it (e.g. an include that could not be read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal error",
        }
    }
}

/// A single recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
}

/// Accumulates diagnostics for one translation unit.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    suppress_warnings: bool,
}

impl DiagnosticEngine {
    pub fn new(suppress_warnings: bool) -> Self {
        Self {
            diagnostics: Vec::new(),
            suppress_warnings,
        }
    }

    pub fn report(
        &mut self,
        severity: Severity,
        location: Option<SourceLocation>,
        message: impl Into<String>,
    ) {
        if severity == Severity::Warning && self.suppress_warnings {
            return;
        }
        self.diagnostics.push(Diagnostic {
            severity,
            message: message.into(),
            location,
        });
    }

    pub fn error(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.report(Severity::Error, Some(location), message);
    }

    pub fn fatal(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.report(Severity::Fatal, Some(location), message);
    }

    pub fn warning(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.report(Severity::Warning, Some(location), message);
    }

    pub fn note(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.report(Severity::Note, Some(location), message);
    }

    /// True when any diagnostic of `Error` or `Fatal` severity was recorded.
    /// A best-effort tree may still exist, but it cannot be trusted.
    pub fn has_uncompilable_error(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Renders every recorded diagnostic followed by a summary line.
    pub fn render_all<W: Write>(
        &self,
        sources: &SourceMap,
        out: &mut W,
        color: bool,
    ) -> io::Result<()> {
        for diagnostic in &self.diagnostics {
            render_one(diagnostic, sources, out, color)?;
        }

        let errors = self.error_count();
        let warnings = self.warning_count();
        match (warnings, errors) {
            (0, 0) => {}
            (w, 0) => writeln!(out, "{} warning{} generated.", w, plural(w))?,
            (0, e) => writeln!(out, "{} error{} generated.", e, plural(e))?,
            (w, e) => writeln!(
                out,
                "{} warning{} and {} error{} generated.",
                w,
                plural(w),
                e,
                plural(e)
            )?,
        }
        Ok(())
    }

    /// Renders to stderr, colored when stderr is a terminal.
    pub fn render_to_stderr(&self, sources: &SourceMap) {
        let stderr = io::stderr();
        let color = stderr.is_tty();
        let mut lock = stderr.lock();
        // Ignore write failures here: diagnostics are a side channel and a
        // closed stderr must not abort the dump.
        let _ = self.render_all(sources, &mut lock, color);
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn render_one<W: Write>(
    diagnostic: &Diagnostic,
    sources: &SourceMap,
    out: &mut W,
    color: bool,
) -> io::Result<()> {
    let label = diagnostic.severity.label();
    let label = if color {
        match diagnostic.severity {
            Severity::Note => label.dark_grey().bold().to_string(),
            Severity::Warning => label.magenta().bold().to_string(),
            Severity::Error | Severity::Fatal => label.red().bold().to_string(),
        }
    } else {
        label.to_string()
    };

    match diagnostic.location {
        Some(loc) => {
            let position = format!(
                "{}:{}:{}:",
                sources.name(loc.file),
                loc.line,
                loc.column
            );
            let position = if color {
                position.bold().to_string()
            } else {
                position
            };
            writeln!(out, "{} {}: {}", position, label, diagnostic.message)?;

            let line_text = sources.line_text(loc.file, loc.line);
            if !line_text.is_empty() {
                writeln!(out, "{}", line_text)?;
                let pad = " ".repeat(loc.column.saturating_sub(1) as usize);
                let caret = if color {
                    "^".green().bold().to_string()
                } else {
                    "^".to_string()
                };
                writeln!(out, "{}{}", pad, caret)?;
            }
        }
        None => writeln!(out, "{}: {}", label, diagnostic.message)?,
    }
    Ok(())
}
