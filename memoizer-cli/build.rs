// Build script that injects the version reported by `memoizer --version`
//
// Uses `git describe` when the build runs inside a git checkout and falls back
// to CARGO_PKG_VERSION otherwise.

use std::process::Command;

fn main() {
    let version = get_git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=MEMOIZER_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn get_git_version() -> Option<String> {
    // e.g. "v0.1.0", "v0.1.0-5-gabc123", "abc123-dirty"
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();

    match described.strip_prefix('v') {
        // Tagged, possibly with commits on top: keep the tag's version
        Some(tagged) => Some(tagged.split('-').next().unwrap_or(tagged).to_string()),
        // Untagged: package version plus the abbreviated commit
        None => Some(format!("{}-{}", env!("CARGO_PKG_VERSION"), described)),
    }
}
