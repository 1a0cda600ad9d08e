//! Git files whose changes make `git describe` answer differently.

use std::path::{Path, PathBuf};

/// `HEAD` moves on checkout and commit, `refs` and `packed-refs` on new
/// commits and tags, `index` when changes are staged.
const WATCHED: [&str; 4] = ["HEAD", "index", "packed-refs", "refs"];

/// The watched paths under `git_dir` that exist.
///
/// Missing paths are left out, cargo would otherwise rerun the build
/// script on every build.
pub fn watched_paths(git_dir: &Path) -> Vec<PathBuf> {
    WATCHED
        .iter()
        .map(|name| git_dir.join(name))
        .filter(|path| path.exists())
        .collect()
}
