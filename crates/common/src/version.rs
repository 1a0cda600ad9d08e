use serde::{Deserialize, Serialize};
use std::fmt;

/// Reported whenever a piece of build metadata was not embedded at compile time.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildInfo {
    pub package_version: String,
    pub git_hash: String,
    pub build_profile: String,
    pub build_features: String,
    pub build_timestamp: String,
    pub rust_version: String,
    pub target: String,
    pub host: String,
}

impl BuildInfo {
    pub fn new() -> Self {
        Self {
            package_version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: option_env!("REPO_VERSION").unwrap_or(UNKNOWN).to_string(),
            build_profile: option_env!("BUILD_PROFILE").unwrap_or(UNKNOWN).to_string(),
            build_features: option_env!("BUILD_FEATURES").unwrap_or("none").to_string(),
            build_timestamp: option_env!("BUILD_TIMESTAMP")
                .unwrap_or(UNKNOWN)
                .to_string(),
            rust_version: option_env!("RUST_VERSION").unwrap_or(UNKNOWN).to_string(),
            target: option_env!("BUILD_TARGET").unwrap_or(UNKNOWN).to_string(),
            host: option_env!("BUILD_HOST").unwrap_or(UNKNOWN).to_string(),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} build with {} on {} for {}",
            self.package_version,
            self.git_hash,
            self.build_profile,
            self.rust_version,
            self.build_timestamp,
            self.target
        )
    }
}

/// The version a service reports on `/_version` and in its startup record.
///
/// This is the repository version embedded by the build script, or
/// [`UNKNOWN`] when the build had no version control metadata available.
pub fn version() -> String {
    resolve_version(option_env!("REPO_VERSION"))
}

pub fn build_info() -> BuildInfo {
    BuildInfo::new()
}

fn resolve_version(embedded: Option<&str>) -> String {
    match embedded.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
