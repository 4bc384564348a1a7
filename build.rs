use std::env;
use std::path::PathBuf;

// The driver carries a compiled-in path to the toolchain executable; the
// front end only uses it to locate the resource directory installed next to
// the binary.
fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let profile = env::var("PROFILE").unwrap();
    let exe = manifest_dir
        .join("target")
        .join(profile)
        .join(format!("ctree{}", env::consts::EXE_SUFFIX));
    println!("cargo:rustc-env=CTREE_TOOLCHAIN={}", exe.display());
    println!("cargo:rerun-if-changed=build.rs");
}
