//! Embeds the build's git revision as `GIT_HASH` for /health and startup logs.

use std::process::Command;

/// Run git, returning trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=INGEST_GATE_BUILD_REV");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    // Container builds ship without .git and pass the revision in.
    let revision = std::env::var("INGEST_GATE_BUILD_REV")
        .ok()
        .filter(|rev| !rev.is_empty())
        .or_else(|| {
            let rev = git(&["rev-parse", "--short=10", "HEAD"])?;
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|changes| !changes.is_empty());
            Some(if dirty { format!("{rev}+dirty") } else { rev })
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={revision}");
}
