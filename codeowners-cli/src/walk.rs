use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Version control metadata with this name is never listed. Directories are
/// not descended into, and gitfiles left by submodules and worktrees are
/// skipped.
pub const VCS_DIR: &str = ".git";

/// Walk `root` depth first, yielding every non-directory beneath it in file
/// name order. A `root` that isn't a directory yields itself. Leading `./`
/// components are stripped from the yielded paths.
pub fn walk_files(root: impl AsRef<Path>) -> impl Iterator<Item = walkdir::Result<PathBuf>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_vcs_entry(entry))
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => None,
            Ok(entry) => Some(Ok(strip_cur_dir(entry.path()))),
            Err(err) => Some(Err(err)),
        })
}

/// Render a path with `/` separators, the form used by CODEOWNERS patterns
/// and `git ls-files`.
pub fn to_slash(path: &Path) -> String {
    let mut rendered = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => rendered.push('/'),
            component => {
                if !rendered.is_empty() && !rendered.ends_with('/') {
                    rendered.push('/');
                }
                rendered.push_str(&component.as_os_str().to_string_lossy());
            }
        }
    }
    rendered
}

fn is_vcs_entry(entry: &DirEntry) -> bool {
    entry.file_name() == VCS_DIR
}

fn strip_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .skip_while(|c| matches!(c, Component::CurDir))
        .collect()
}
