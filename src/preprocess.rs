//! Textual preprocessing of one translation unit.
//!
//! The preprocessor flattens the virtual input buffer and everything it
//! includes into a single expanded text, substituting object-like macros as
//! it goes. Each output line is tagged with the file and line it came from,
//! so every later stage reports positions in terms of the user's sources.
//!
//! Supported directives: `#include` (quoted and angle forms), `#define`
//! (object-like), `#undef`, `#ifdef`, `#ifndef`, `#else`, `#endif`. Anything
//! else is diagnosed and skipped. Quoted includes search the including
//! file's directory first; both forms then try the `-I` paths, the resource
//! directory next to the toolchain executable, and finally the builtin
//! headers embedded in the binary.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::diagnostics::DiagnosticEngine;
use crate::headers::builtin_headers;
use crate::lang::LangOptions;
use crate::source::{FileId, SourceLocation, SourceMap, MAIN_FILE};

/// Origin of one line of expanded output.
#[derive(Debug, Clone, Copy)]
struct LineOrigin {
    file: FileId,
    line: u32,
}

/// The flattened translation unit: expanded text plus a table mapping each
/// expanded line back to the user source it came from.
#[derive(Debug)]
pub struct ExpandedSource {
    text: String,
    origins: Vec<LineOrigin>,
}

impl ExpandedSource {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Maps a position in the expanded text back to the originating file
    /// and line. Positions past the last line (the end-of-file token) clamp
    /// to the final line.
    pub fn location(&self, expanded_line: u32, column: u32) -> SourceLocation {
        if self.origins.is_empty() {
            return SourceLocation::new(MAIN_FILE, 1, column);
        }
        let index = (expanded_line.saturating_sub(1) as usize)
            .min(self.origins.len() - 1);
        let origin = self.origins[index];
        SourceLocation::new(origin.file, origin.line, column)
    }
}

/// Conditional-inclusion state for one `#ifdef`/`#ifndef` frame.
struct CondFrame {
    active: bool,
    taken: bool,
    line: u32,
}

pub struct Preprocessor<'a> {
    options: &'a LangOptions,
    resource_dir: Option<PathBuf>,
    sources: &'a mut SourceMap,
    diagnostics: &'a mut DiagnosticEngine,
    macros: FxHashMap<String, String>,
    builtin: FxHashMap<&'static str, &'static str>,
    file_dirs: FxHashMap<FileId, PathBuf>,
    out_text: String,
    out_origins: Vec<LineOrigin>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(
        options: &'a LangOptions,
        resource_dir: Option<PathBuf>,
        sources: &'a mut SourceMap,
        diagnostics: &'a mut DiagnosticEngine,
    ) -> Self {
        Self {
            options,
            resource_dir,
            sources,
            diagnostics,
            macros: FxHashMap::default(),
            builtin: builtin_headers(),
            file_dirs: FxHashMap::default(),
            out_text: String::new(),
            out_origins: Vec::new(),
        }
    }

    /// Preprocesses the registered main buffer and consumes the
    /// preprocessor. The result always exists; problems along the way are
    /// reported through the diagnostic engine.
    pub fn expand(mut self, main: FileId) -> ExpandedSource {
        self.process_file(main, 0);
        ExpandedSource {
            text: self.out_text,
            origins: self.out_origins,
        }
    }

    fn process_file(&mut self, file: FileId, depth: usize) {
        let text = self.sources.file(file).text.clone();
        let mut cond_stack: Vec<CondFrame> = Vec::new();
        let mut in_comment = false;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index as u32 + 1;
            let trimmed = raw.trim_start();

            if !in_comment && trimmed.starts_with('#') {
                let active = cond_stack.iter().all(|frame| frame.active);
                self.handle_directive(
                    trimmed,
                    file,
                    line_no,
                    depth,
                    active,
                    &mut cond_stack,
                );
                continue;
            }

            if cond_stack.iter().all(|frame| frame.active) {
                let mut expanded = String::with_capacity(raw.len());
                self.substitute_into(raw, &mut in_comment, 16, &mut expanded);
                self.push_line(expanded, file, line_no);
            } else if in_comment {
                // Still have to find the end of a block comment that opened
                // inside an active region.
                in_comment = !raw.contains("*/");
            }
        }

        if let Some(frame) = cond_stack.last() {
            self.diagnostics.error(
                SourceLocation::new(file, frame.line, 1),
                "unterminated conditional directive",
            );
        }
    }

    fn push_line(&mut self, line: String, file: FileId, line_no: u32) {
        self.out_text.push_str(&line);
        self.out_text.push('\n');
        self.out_origins.push(LineOrigin { file, line: line_no });
    }

    fn handle_directive(
        &mut self,
        trimmed: &str,
        file: FileId,
        line_no: u32,
        depth: usize,
        active: bool,
        cond_stack: &mut Vec<CondFrame>,
    ) {
        let loc = SourceLocation::new(file, line_no, 1);
        let rest = trimmed[1..].trim_start();
        // The directive name ends at the first non-letter, so forms like
        // `#include<stdio.h>` parse too.
        let name_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (name, args) = rest.split_at(name_end);
        let args = args.trim();

        match name {
            "ifdef" | "ifndef" => {
                if args.is_empty() {
                    self.diagnostics
                        .error(loc, format!("macro name missing in #{}", name));
                }
                let parent_active = active;
                let defined = self.macros.contains_key(args);
                let wanted = if name == "ifdef" { defined } else { !defined };
                cond_stack.push(CondFrame {
                    active: parent_active && wanted,
                    taken: wanted,
                    line: line_no,
                });
            }
            "else" => {
                let above = cond_stack.len().saturating_sub(1);
                let parent_active =
                    cond_stack[..above].iter().all(|f| f.active);
                match cond_stack.last_mut() {
                    Some(frame) => {
                        frame.active = parent_active && !frame.taken;
                        frame.taken = true;
                    }
                    None => self
                        .diagnostics
                        .error(loc, "#else without matching #ifdef"),
                }
            }
            "endif" => {
                if cond_stack.pop().is_none() {
                    self.diagnostics.error(loc, "#endif without matching #ifdef");
                }
            }
            _ if !active => {}
            "include" => self.handle_include(args, file, line_no, depth),
            "define" => self.handle_define(args, loc),
            "undef" => {
                if args.is_empty() {
                    self.diagnostics.error(loc, "macro name missing in #undef");
                } else {
                    self.macros.remove(args);
                }
            }
            "" => {}
            other => self.diagnostics.error(
                loc,
                format!("unsupported preprocessor directive '#{}'", other),
            ),
        }
    }

    fn handle_define(&mut self, args: &str, loc: SourceLocation) {
        let mut chars = args.char_indices();
        let name_end = loop {
            match chars.next() {
                Some((i, c)) if i == 0 && !is_ident_start(c) => break 0,
                Some((i, c)) if i > 0 && !is_ident_continue(c) => break i,
                Some(_) => {}
                None => break args.len(),
            }
        };
        if name_end == 0 {
            self.diagnostics.error(loc, "macro name missing in #define");
            return;
        }

        let name = &args[..name_end];
        let rest = &args[name_end..];
        if rest.starts_with('(') {
            self.diagnostics.error(
                loc,
                format!(
                    "function-like macro '{}' is not supported; only object-like macros are",
                    name
                ),
            );
            return;
        }

        self.macros.insert(name.to_string(), rest.trim().to_string());
    }

    fn handle_include(
        &mut self,
        spec: &str,
        file: FileId,
        line_no: u32,
        depth: usize,
    ) {
        let loc = SourceLocation::new(file, line_no, 1);

        if depth + 1 > self.options.max_include_depth {
            self.diagnostics.fatal(
                loc,
                format!(
                    "include depth limit ({}) exceeded",
                    self.options.max_include_depth
                ),
            );
            return;
        }

        let (target, quoted) = match parse_include_spec(spec) {
            Some(parsed) => parsed,
            None => {
                self.diagnostics.error(
                    loc,
                    "expected \"FILENAME\" or <FILENAME> after #include",
                );
                return;
            }
        };

        let includer_dir = self.file_dirs.get(&file).cloned();
        match self.resolve_include(&target, quoted, includer_dir.as_deref()) {
            Some((name, text, dir)) => {
                let id = self.sources.add_file(name, text);
                if let Some(dir) = dir {
                    self.file_dirs.insert(id, dir);
                }
                self.process_file(id, depth + 1);
            }
            None => {
                self.diagnostics
                    .fatal(loc, format!("'{}' file not found", target));
            }
        }
    }

    /// Returns (display name, contents, containing directory). Builtin
    /// headers have no containing directory.
    fn resolve_include(
        &self,
        target: &str,
        quoted: bool,
        includer_dir: Option<&Path>,
    ) -> Option<(String, String, Option<PathBuf>)> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if quoted {
            if let Some(dir) = includer_dir {
                candidates.push(dir.join(target));
            }
        }
        for dir in &self.options.include_paths {
            candidates.push(dir.join(target));
        }
        if let Some(resource) = &self.resource_dir {
            candidates.push(resource.join(target));
        }

        for candidate in candidates {
            if let Ok(text) = fs::read_to_string(&candidate) {
                let dir = candidate.parent().map(Path::to_path_buf);
                return Some((candidate.display().to_string(), text, dir));
            }
        }

        self.builtin
            .get(target)
            .map(|text| (target.to_string(), (*text).to_string(), None))
    }

    /// Copies one line into `out` with object-like macros substituted.
    /// String literals, character literals, and comments pass through
    /// untouched; `in_comment` carries block-comment state across lines.
    fn substitute_into(
        &self,
        raw: &str,
        in_comment: &mut bool,
        depth: usize,
        out: &mut String,
    ) {
        let chars: Vec<char> = raw.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            if *in_comment {
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    out.push_str("*/");
                    i += 2;
                    *in_comment = false;
                } else {
                    out.push(chars[i]);
                    i += 1;
                }
                continue;
            }

            let c = chars[i];
            match c {
                '/' if chars.get(i + 1) == Some(&'/') => {
                    out.extend(&chars[i..]);
                    return;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    out.push_str("/*");
                    i += 2;
                    *in_comment = true;
                }
                '"' | '\'' => {
                    out.push(c);
                    i += 1;
                    while i < chars.len() {
                        out.push(chars[i]);
                        if chars[i] == '\\' && i + 1 < chars.len() {
                            out.push(chars[i + 1]);
                            i += 2;
                            continue;
                        }
                        i += 1;
                        if chars[i - 1] == c {
                            break;
                        }
                    }
                }
                c if is_ident_start(c) => {
                    let start = i;
                    while i < chars.len() && is_ident_continue(chars[i]) {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    match self.macros.get(&word) {
                        Some(replacement) if depth > 0 => {
                            let mut nested_comment = false;
                            self.substitute_into(
                                &replacement.clone(),
                                &mut nested_comment,
                                depth - 1,
                                out,
                            );
                        }
                        _ => out.push_str(&word),
                    }
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
}

fn parse_include_spec(spec: &str) -> Option<(String, bool)> {
    let spec = spec.trim();
    if spec.len() >= 2 && spec.starts_with('"') && spec.ends_with('"') {
        return Some((spec[1..spec.len() - 1].to_string(), true));
    }
    if spec.len() >= 2 && spec.starts_with('<') && spec.ends_with('>') {
        return Some((spec[1..spec.len() - 1].to_string(), false));
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::LangOptions;

    fn expand(source: &str) -> (ExpandedSource, DiagnosticEngine, SourceMap) {
        let options = LangOptions::from_args("input.c", &[]).unwrap();
        let mut sources = SourceMap::new();
        let main = sources.add_file("input.c", source);
        let mut diagnostics = DiagnosticEngine::new(false);
        let expanded =
            Preprocessor::new(&options, None, &mut sources, &mut diagnostics)
                .expand(main);
        (expanded, diagnostics, sources)
    }

    #[test]
    fn test_object_macro_substitution() {
        let (expanded, diagnostics, _) =
            expand("#define N 10\nint x = N;\n");
        assert_eq!(expanded.text(), "int x = 10;\n");
        assert!(!diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_macros_skip_strings_and_comments() {
        let (expanded, _, _) = expand(
            "#define N 10\nchar *s = \"N\"; // N stays\nint y = N; /* N */\n",
        );
        assert!(expanded.text().contains("\"N\""));
        assert!(expanded.text().contains("// N stays"));
        assert!(expanded.text().contains("int y = 10; /* N */"));
    }

    #[test]
    fn test_chained_macros_expand() {
        let (expanded, _, _) =
            expand("#define A B\n#define B 5\nint x = A;\n");
        assert_eq!(expanded.text(), "int x = 5;\n");
    }

    #[test]
    fn test_ifdef_skipping() {
        let (expanded, diagnostics, _) = expand(
            "#define YES 1\n#ifdef YES\nint a;\n#else\nint b;\n#endif\n#ifdef NO\nint c;\n#endif\n",
        );
        assert_eq!(expanded.text(), "int a;\n");
        assert!(!diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_unterminated_conditional_reported() {
        let (_, diagnostics, _) = expand("#ifdef X\nint a;\n");
        assert!(diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let (_, diagnostics, _) = expand("#include <no_such_header.h>\n");
        assert!(diagnostics.has_uncompilable_error());
        assert!(diagnostics.diagnostics()[0]
            .message
            .contains("file not found"));
    }

    #[test]
    fn test_builtin_header_include() {
        let (expanded, diagnostics, sources) =
            expand("#include <stdio.h>\nint main(void) { return 0; }\n");
        assert!(!diagnostics.has_uncompilable_error());
        assert!(expanded.text().contains("int printf(const char *format, ...);"));
        assert_eq!(sources.name(FileId(1)), "stdio.h");
    }

    #[test]
    fn test_stdbool_macros_apply() {
        let (expanded, _, _) =
            expand("#include <stdbool.h>\nbool flag = true;\n");
        assert!(expanded.text().contains("int flag = 1;"));
    }

    #[test]
    fn test_function_like_macro_rejected() {
        let (_, diagnostics, _) = expand("#define SQ(x) ((x) * (x))\n");
        assert!(diagnostics.has_uncompilable_error());
    }

    #[test]
    fn test_line_origins_survive_includes() {
        let (expanded, _, _) =
            expand("#include <stddef.h>\nint x;\n");
        // The last expanded line is `int x;`, which came from line 2 of the
        // main buffer.
        let last = expanded.text().lines().count() as u32;
        let loc = expanded.location(last, 1);
        assert_eq!(loc.file, MAIN_FILE);
        assert_eq!(loc.line, 2);
    }
}
