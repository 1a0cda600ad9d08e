pub mod config;
pub mod logger;
pub mod version;

// shared with the build script, compiled here so its tests run
#[cfg(test)]
#[path = "../build/git.rs"]
mod build_git;
