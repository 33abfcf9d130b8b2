//! Stamps the binary with where it was built from: `woolly --version` prints
//! the crate version on a release tag and `dev@<short hash>` anywhere else.

use std::process::{Command, Output};

fn git(args: &[&str]) -> Option<Output> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
}

fn main() {
    for watched in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }

    // Outside a checkout (crates.io tarball) both stay empty/false.
    let hash = git(&["rev-parse", "--short", "HEAD"])
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_default();
    let on_release_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    println!("cargo:rustc-env=WOOLLY_GIT_HASH={hash}");
    println!("cargo:rustc-env=WOOLLY_ON_RELEASE_TAG={on_release_tag}");
}
