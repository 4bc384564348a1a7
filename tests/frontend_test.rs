// Integration tests for the front-end library.

use std::fs;
use std::path::PathBuf;

use ctree::build_ast_from_code_with_args;
use ctree::parser::ast::AstNode;

const TOOLCHAIN: &str = "/opt/ctree/bin/ctree";

/// Blanks out the memory-identity tags (`0x...`) a dump carries, which are
/// expected to vary run to run.
fn strip_identity_tags(dump: &str) -> String {
    let mut out = String::with_capacity(dump.len());
    let mut rest = dump;
    while let Some(pos) = rest.find("0x") {
        out.push_str(&rest[..pos]);
        out.push_str("0x");
        rest = &rest[pos + 2..];
        let digits = rest
            .find(|c: char| !c.is_ascii_hexdigit())
            .unwrap_or(rest.len());
        rest = &rest[digits..];
    }
    out.push_str(rest);
    out
}

fn dump_plain(source: &str, args: &[&str]) -> String {
    let unit = build_ast_from_code_with_args(source, args, "input.c", TOOLCHAIN)
        .expect("build failed");
    assert!(
        !unit.diagnostics().has_uncompilable_error(),
        "unexpected errors in test source"
    );

    let mut rendered = Vec::new();
    unit.dump(&mut rendered, false).expect("dump failed");
    String::from_utf8(rendered).expect("dump is not UTF-8")
}

#[test]
fn test_one_node_per_top_level_declaration_in_order() {
    let source = r#"
        struct Point {
            int x;
            int y;
        };

        int origin_distance(struct Point *p);

        int main(void) {
            struct Point p;
            p.x = 3;
            p.y = 4;
            return origin_distance(&p);
        }

        int origin_distance(struct Point *p) {
            return p->x * p->x + p->y * p->y;
        }
    "#;
    let dump = dump_plain(source, &["-std=c11", "-Wall"]);
    let lines: Vec<&str> = dump.lines().collect();

    assert!(lines[0].starts_with("TranslationUnitDecl"));

    // Exactly one child line per top-level declaration, in source order.
    let top_level: Vec<&str> = lines
        .iter()
        .skip(1)
        .filter(|line| line.starts_with("|-") || line.starts_with("`-"))
        .copied()
        .collect();
    assert_eq!(top_level.len(), 4);
    assert!(top_level[0].contains("RecordDecl"));
    assert!(top_level[1].contains("FunctionDecl"));
    assert!(top_level[1].contains("origin_distance"));
    assert!(top_level[2].contains("main"));
    assert!(top_level[3].contains("origin_distance"));
    assert!(top_level[3].starts_with("`-"));
}

#[test]
fn test_empty_function_definition_property() {
    let unit = build_ast_from_code_with_args(
        "int main() {}",
        &["-std=c11", "-Wall"],
        "input.c",
        TOOLCHAIN,
    )
    .expect("build failed");

    assert!(!unit.diagnostics().has_uncompilable_error());
    assert_eq!(unit.diagnostics().error_count(), 0);

    let decls = &unit.translation_unit().decls;
    assert_eq!(decls.len(), 1);
    match &decls[0] {
        AstNode::FunctionDecl {
            name, body, span, ..
        } => {
            assert_eq!(name, "main");
            assert_eq!(span.start.line, 1);
            assert_eq!(span.start.column, 1);
            match body.as_deref() {
                Some(AstNode::Compound { stmts, .. }) => {
                    assert!(stmts.is_empty());
                }
                other => panic!("expected empty compound body, got {:?}", other),
            }
        }
        other => panic!("expected function definition, got {:?}", other),
    }
}

#[test]
fn test_dump_idempotent_modulo_identity_tags() {
    let source = "int square(int n) { return n * n; }\nint main(void) { return square(7); }";

    let first = dump_plain(source, &["-std=c11", "-Wall"]);
    let second = dump_plain(source, &["-std=c11", "-Wall"]);

    assert_eq!(strip_identity_tags(&first), strip_identity_tags(&second));
}

#[test]
fn test_include_via_search_path() {
    let dir = std::env::temp_dir().join(format!("ctree-inc-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("failed to create include dir");
    fs::write(dir.join("helpers.h"), "int helper(int x);\n")
        .expect("failed to write header");

    let include_flag = format!("-I{}", dir.display());
    let unit = build_ast_from_code_with_args(
        "#include \"helpers.h\"\nint main(void) { return helper(1); }",
        &[include_flag.as_str()],
        "input.c",
        TOOLCHAIN,
    )
    .expect("build failed");

    assert!(!unit.diagnostics().has_uncompilable_error());
    // The prototype from the header is part of the tree.
    assert_eq!(unit.translation_unit().decls.len(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_resource_directory_next_to_toolchain() {
    let root: PathBuf =
        std::env::temp_dir().join(format!("ctree-res-{}", std::process::id()));
    let resource = root.join("include");
    fs::create_dir_all(&resource).expect("failed to create resource dir");
    fs::write(resource.join("answer.h"), "int answer(void);\n")
        .expect("failed to write header");

    let toolchain = root.join("ctree");
    let unit = build_ast_from_code_with_args(
        "#include <answer.h>\nint main(void) { return answer(); }",
        &[],
        "input.c",
        toolchain.to_str().expect("non-UTF-8 temp path"),
    )
    .expect("build failed");

    assert!(!unit.diagnostics().has_uncompilable_error());

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_builtin_headers_cover_missing_resource_dir() {
    let unit = build_ast_from_code_with_args(
        "#include <stdio.h>\n#include <stdlib.h>\nint main(void) { printf(\"%d\", 1); return 0; }",
        &["-Wall"],
        "input.c",
        "/definitely/not/installed/ctree",
    )
    .expect("build failed");

    assert!(!unit.diagnostics().has_uncompilable_error());
}

#[test]
fn test_warnings_do_not_block_the_dump() {
    let unit = build_ast_from_code_with_args(
        "int main(void) { int unused = 3; return 0; }",
        &["-Wall"],
        "input.c",
        TOOLCHAIN,
    )
    .expect("build failed");

    assert!(!unit.diagnostics().has_uncompilable_error());
    assert_eq!(unit.diagnostics().warning_count(), 1);

    let mut rendered = Vec::new();
    unit.dump(&mut rendered, false).expect("dump failed");
    assert!(!rendered.is_empty());
}

#[test]
fn test_cxx_dialect_via_extension() {
    let source = "bool invert(bool b) { return !b; }\nint main() { return invert(true) ? 1 : 0; }";

    let unit = build_ast_from_code_with_args(
        source,
        &["-std=c++20", "-Wall"],
        "input.cc",
        TOOLCHAIN,
    )
    .expect("build failed");
    assert!(!unit.diagnostics().has_uncompilable_error());

    let mut rendered = Vec::new();
    unit.dump(&mut rendered, false).expect("dump failed");
    let dump = String::from_utf8(rendered).unwrap();
    assert!(dump.contains("BoolLiteral"));
    assert!(dump.contains("'bool (bool)'"));
}
