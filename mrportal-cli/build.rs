use std::process::Command;

/// Release tarballs carry no `.git`; packagers pass the revision in instead.
const OVERRIDE: &str = "MRPORTAL_BUILD_SHA";

fn git_revision(repo_root: &str) -> Option<String> {
    let out = Command::new("git")
        .args(["-C", repo_root, "describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!rev.is_empty()).then_some(rev)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = format!("{manifest_dir}/..");

    println!("cargo:rerun-if-env-changed={OVERRIDE}");
    println!("cargo:rerun-if-changed={repo_root}/.git/HEAD");

    let revision = std::env::var(OVERRIDE)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| git_revision(&repo_root))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=MRPORTAL_BUILD_SHA={revision}");
}
