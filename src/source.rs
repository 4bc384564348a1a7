//! Source file bookkeeping shared by the preprocessor, lexer, and dumper.
//!
//! A parse may pull in several pieces of text: the caller-supplied virtual
//! buffer plus any headers the preprocessor includes. Every piece is
//! registered in a [`SourceMap`] and addressed by [`FileId`], so a
//! [`SourceLocation`] stays meaningful after the translation unit has been
//! flattened into one expanded text.

/// Index of a file registered in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// The caller-supplied virtual buffer is always registered first.
pub const MAIN_FILE: FileId = FileId(0);

/// One registered piece of source text: the virtual input buffer or an
/// included header.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

/// Owns every piece of source text consulted during a parse.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap::default()
    }

    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            name: name.into(),
            text: text.into(),
        });
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn name(&self, id: FileId) -> &str {
        &self.file(id).name
    }

    /// Returns one source line (1-based) for caret diagnostics. Out-of-range
    /// lines come back empty rather than panicking.
    pub fn line_text(&self, id: FileId, line: u32) -> &str {
        self.file(id)
            .text
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .unwrap_or("")
    }
}

/// A point in a registered source file. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

/// The stretch of source text a node was parsed from. `end` is the start of
/// the node's final token, not one past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// A zero-width span for single-token constructs.
    pub fn at(loc: SourceLocation) -> Self {
        Self {
            start: loc,
            end: loc,
        }
    }
}
