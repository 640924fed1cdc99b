//! Build and version metadata, embedded at compile time by `build.rs`.

use serde::Serialize;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit SHA at build time, or "unknown" outside a checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// RFC 3339 build timestamp, or "unknown".
pub const BUILD_TIMESTAMP: &str = match option_env!("VERGEN_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// `{version}` or `{version}+{sha7}[.dirty]` when git metadata is known.
pub fn version_string() -> String {
    if GIT_SHA == "unknown" {
        return PKG_VERSION.to_string();
    }
    let dirty = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{}{dirty}", &GIT_SHA[..7.min(GIT_SHA.len())])
}

/// Version details reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_branch: &'static str,
    pub built_at: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: version_string(),
            git_branch: GIT_BRANCH,
            built_at: BUILD_TIMESTAMP,
        }
    }
}
