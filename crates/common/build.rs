use std::env;
use std::path::PathBuf;
use std::process::Command;

#[path = "build/git.rs"]
mod git;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=build/git.rs");
    println!("cargo:rerun-if-env-changed=REPO_VERSION");

    // unstaged edits do not touch any of these, so `-dirty` only refreshes
    // once something is staged or committed
    if let Some(git_dir) = git_output(&["rev-parse", "--absolute-git-dir"]) {
        for path in git::watched_paths(&PathBuf::from(git_dir)) {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }

    // an explicitly provided version (e.g. from CI) wins over git
    let repo_version = env::var("REPO_VERSION").ok().or_else(git_describe);
    if let Some(repo_version) = repo_version {
        println!("cargo:rustc-env=REPO_VERSION={}", repo_version);
    }

    if let Ok(profile) = env::var("PROFILE") {
        println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    }

    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_").map(str::to_lowercase))
        .collect();
    features.sort();
    if !features.is_empty() {
        println!("cargo:rustc-env=BUILD_FEATURES={}", features.join(","));
    }

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );

    if let Some(rust_version) = rustc_version() {
        println!("cargo:rustc-env=RUST_VERSION={}", rust_version);
    }
    if let Ok(target) = env::var("TARGET") {
        println!("cargo:rustc-env=BUILD_TARGET={}", target);
    }
    if let Ok(host) = env::var("HOST") {
        println!("cargo:rustc-env=BUILD_HOST={}", host);
    }
}

fn git_describe() -> Option<String> {
    git_output(&["describe", "--tags", "--always", "--dirty"])
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let stdout = stdout.trim();
    (!stdout.is_empty()).then(|| stdout.to_string())
}

fn rustc_version() -> Option<String> {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let output = Command::new(rustc).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|v| v.trim().to_string())
}
