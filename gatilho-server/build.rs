//! Embeds GIT_HASH, BUILD_TIMESTAMP and BUILD_PROFILE for the startup log line

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string()).filter(|s| !s.is_empty())
}

fn main() {
    // Source tarballs have no repository
    let git_hash = git(&["describe", "--always", "--dirty", "--abbrev=8"])
        .unwrap_or_else(|| "unknown".to_string());

    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("GIT_HASH", git_hash),
        ("BUILD_TIMESTAMP", built_at),
        ("BUILD_PROFILE", profile),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }
}
