// ctree: parse a C source string and dump its syntax tree.

use std::process;

use ctree::{build_ast_from_code_with_args, BuildError};

/// Compiled-in location of this toolchain's own executable. The front end
/// only uses it to find the resource directory installed next to the
/// binary; it never runs it.
const TOOLCHAIN_PATH: &str = env!("CTREE_TOOLCHAIN");

/// Invocation arguments handed to every parse. Order matters: later flags
/// override earlier ones in the front end's own flag handling.
const INVOCATION_ARGS: [&str; 2] = ["-std=c11", "-Wall"];

/// Virtual filename for the input buffer. The `.c` extension selects the C
/// dialect; the buffer never touches the filesystem.
const VIRTUAL_FILENAME: &str = "input.c";

fn main() {
    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        let program_name = args.first().map(|s| s.as_str()).unwrap_or("ctree");
        eprintln!("Error: no source text provided");
        eprintln!();
        eprintln!("Usage: {} '<source-code>'", program_name);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} 'int main() {{ return 0; }}'", program_name);
        process::exit(2);
    }

    let code = &args[1];

    // This parses the code and hands back an AstUnit: the tree together
    // with all of the other state produced during parsing (the diagnostic
    // log, the source map, the symbol checks). Diagnostics have already
    // been written to stderr by the time it returns.
    let unit = match build_ast_from_code_with_args(
        code,
        &INVOCATION_ARGS,
        VIRTUAL_FILENAME,
        TOOLCHAIN_PATH,
    ) {
        Ok(unit) => unit,
        Err(BuildError::InvalidArguments(err)) => {
            // The front end itself is unusable; nothing was parsed.
            eprintln!("ctree: error: {}", err);
            process::exit(1);
        }
    };

    // A best-effort tree exists even after errors, but this driver treats
    // an unrecoverable diagnostic the same as total failure.
    if unit.diagnostics().has_uncompilable_error() {
        process::exit(1);
    }

    // Dump the entire tree.
    if let Err(err) = unit.dump_stdout() {
        eprintln!("ctree: error: failed to write dump: {}", err);
        process::exit(1);
    }
}
