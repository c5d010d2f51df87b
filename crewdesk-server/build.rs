//! Stamps the crewdesk-server binary with its source revision, build time
//! and cargo profile for the startup banner.
//!
//! `CREWDESK_GIT_HASH` overrides the revision for builds made outside a git
//! checkout (release tarballs, container images).

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let revision = String::from_utf8(output.stdout).ok()?;
    Some(revision.trim().to_string()).filter(|r| !r.is_empty())
}

fn main() {
    let revision = env::var("CREWDESK_GIT_HASH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(git_revision)
        .unwrap_or_else(|| UNKNOWN.to_string());

    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    println!("cargo:rustc-env=GIT_HASH={}", revision);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", built_at);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}
