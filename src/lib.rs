//! # Introduction
//!
//! ctree parses one in-memory C (or C++-dialect) source buffer into a
//! syntax tree and pretty-prints it. The whole front end runs in a single
//! synchronous call and hands back an [`AstUnit`] that owns the tree, the
//! diagnostic log, and every piece of source text consulted along the way.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Preprocessor → Lexer → Parser → Sema → AstUnit → Dump
//! ```
//!
//! 1. [`preprocess`] — flattens `#include`s and object-like macros into one
//!    expanded text with a line table back to the user's sources.
//! 2. [`parser`] — tokenises the expanded text and builds an AST, with
//!    panic-mode recovery so a best-effort tree always exists.
//! 3. [`sema`] — scope-checked symbol analysis; errors and `-Wall`
//!    warnings land in the shared [`diagnostics`] engine.
//! 4. [`unit`] — the owning [`AstUnit`] handle and the
//!    [`build_ast_from_code_with_args`] entry point.
//! 5. [`dump`] — deterministic pre-order tree printing with optional
//!    syntax highlighting.
//!
//! ## Dialects
//!
//! The virtual filename's extension selects the source language: `.c`/`.h`
//! parse as C, `.cc`/`.cpp`/`.cxx`/`.hpp` as the C++ variant (which adds
//! `bool`, `true`, `false`, and `nullptr`). `-std=` picks a standard within
//! the selected family.

pub mod diagnostics;
pub mod dump;
pub mod headers;
pub mod lang;
pub mod parser;
pub mod preprocess;
pub mod sema;
pub mod source;
pub mod unit;

pub use unit::{build_ast_from_code_with_args, AstUnit, BuildError};
