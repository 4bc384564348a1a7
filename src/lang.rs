//! Invocation arguments and language options.
//!
//! The front end receives an ordered list of flag strings. Flags are applied
//! in order, so a later `-std=` or warning flag overrides an earlier one.
//! The virtual filename is consulted only for its extension, which selects
//! the source dialect; a `-std=` from the wrong family is rejected.

use std::fmt;
use std::path::PathBuf;

/// Source language family, selected by the virtual filename's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    C,
    Cxx,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::C => "C",
            Dialect::Cxx => "C++",
        }
    }
}

/// Language standard selected with `-std=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    C89,
    C99,
    C11,
    C17,
    Cxx11,
    Cxx17,
    Cxx20,
}

impl Standard {
    pub fn dialect(self) -> Dialect {
        match self {
            Standard::C89 | Standard::C99 | Standard::C11 | Standard::C17 => {
                Dialect::C
            }
            Standard::Cxx11 | Standard::Cxx17 | Standard::Cxx20 => Dialect::Cxx,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Standard::C89 => "c89",
            Standard::C99 => "c99",
            Standard::C11 => "c11",
            Standard::C17 => "c17",
            Standard::Cxx11 => "c++11",
            Standard::Cxx17 => "c++17",
            Standard::Cxx20 => "c++20",
        }
    }

    fn from_name(name: &str) -> Option<Standard> {
        match name {
            "c89" | "c90" => Some(Standard::C89),
            "c99" => Some(Standard::C99),
            "c11" => Some(Standard::C11),
            "c17" | "c18" => Some(Standard::C17),
            "c++11" => Some(Standard::Cxx11),
            "c++17" => Some(Standard::Cxx17),
            "c++20" => Some(Standard::Cxx20),
            _ => None,
        }
    }
}

/// Error produced when the invocation arguments themselves are unusable.
///
/// This is the "front end failed to start" condition: no parse is attempted
/// and no program handle is produced.
#[derive(Debug)]
pub struct ArgError {
    pub message: String,
}

impl ArgError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ArgError {}

/// Options controlling the front end, assembled from the virtual filename
/// and the invocation argument list.
#[derive(Debug, Clone)]
pub struct LangOptions {
    pub dialect: Dialect,
    pub standard: Standard,
    pub warn_all: bool,
    pub suppress_warnings: bool,
    pub include_paths: Vec<PathBuf>,
    pub max_include_depth: usize,
}

impl LangOptions {
    /// Builds the options for one invocation. The dialect comes from
    /// `filename`'s extension; `args` are applied left to right on top of
    /// the dialect's defaults.
    pub fn from_args(filename: &str, args: &[&str]) -> Result<LangOptions, ArgError> {
        let dialect = dialect_for(filename)?;
        let mut options = LangOptions {
            dialect,
            standard: match dialect {
                Dialect::C => Standard::C11,
                Dialect::Cxx => Standard::Cxx17,
            },
            warn_all: false,
            suppress_warnings: false,
            include_paths: Vec::new(),
            max_include_depth: 64,
        };

        let mut iter = args.iter();
        while let Some(&arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("-std=") {
                let standard = Standard::from_name(name).ok_or_else(|| {
                    ArgError::new(format!("invalid value '{}' in '-std='", name))
                })?;
                if standard.dialect() != dialect {
                    return Err(ArgError::new(format!(
                        "invalid argument '-std={}' not allowed with '{}'",
                        name,
                        dialect.name()
                    )));
                }
                options.standard = standard;
            } else if arg == "-Wall" {
                options.warn_all = true;
            } else if arg == "-Wno-all" {
                options.warn_all = false;
            } else if arg == "-w" {
                options.suppress_warnings = true;
            } else if let Some(dir) = arg.strip_prefix("-I") {
                if dir.is_empty() {
                    let dir = iter.next().ok_or_else(|| {
                        ArgError::new("argument to '-I' is missing")
                    })?;
                    options.include_paths.push(PathBuf::from(*dir));
                } else {
                    options.include_paths.push(PathBuf::from(dir));
                }
            } else if let Some(depth) = arg.strip_prefix("-fmax-include-depth=") {
                let depth = depth.parse::<usize>().map_err(|_| {
                    ArgError::new(format!(
                        "invalid value '{}' in '-fmax-include-depth='",
                        depth
                    ))
                })?;
                options.max_include_depth = depth;
            } else {
                return Err(ArgError::new(format!("unknown argument '{}'", arg)));
            }
        }

        Ok(options)
    }
}

/// The extension family decides the language; the buffer contents never do.
fn dialect_for(filename: &str) -> Result<Dialect, ArgError> {
    let extension = filename.rsplit('.').next().unwrap_or("");
    match extension {
        "c" | "h" => Ok(Dialect::C),
        "cc" | "cpp" | "cxx" | "hpp" => Ok(Dialect::Cxx),
        _ => Err(ArgError::new(format!(
            "cannot determine the source language of '{}'",
            filename
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_dialect() {
        let options = LangOptions::from_args("input.c", &[]).unwrap();
        assert_eq!(options.dialect, Dialect::C);
        assert_eq!(options.standard, Standard::C11);

        let options = LangOptions::from_args("input.cc", &[]).unwrap();
        assert_eq!(options.dialect, Dialect::Cxx);
        assert_eq!(options.standard, Standard::Cxx17);
    }

    #[test]
    fn test_later_flags_override_earlier() {
        let options =
            LangOptions::from_args("input.c", &["-std=c89", "-std=c99"]).unwrap();
        assert_eq!(options.standard, Standard::C99);

        let options =
            LangOptions::from_args("input.c", &["-Wall", "-Wno-all"]).unwrap();
        assert!(!options.warn_all);
    }

    #[test]
    fn test_std_must_match_dialect() {
        let err = LangOptions::from_args("input.c", &["-std=c++20"]).unwrap_err();
        assert!(err.message.contains("not allowed with 'C'"));
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let err = LangOptions::from_args("input.c", &["-fwhatever"]).unwrap_err();
        assert!(err.message.contains("unknown argument"));
    }

    #[test]
    fn test_include_paths_both_forms() {
        let options =
            LangOptions::from_args("input.c", &["-I/usr/inc", "-I", "local"])
                .unwrap();
        assert_eq!(options.include_paths.len(), 2);
        assert_eq!(options.include_paths[1], PathBuf::from("local"));
    }

    #[test]
    fn test_unrecognized_extension_rejected() {
        assert!(LangOptions::from_args("input.rs", &[]).is_err());
    }
}
