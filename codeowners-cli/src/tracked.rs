use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{bail, Context, Result};

/// Paths known to version control, relative to the working directory and
/// `/`-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFiles(HashSet<String>);

impl TrackedFiles {
    /// Parse the NUL-separated output of `git ls-files -z`.
    pub fn from_ls_files_output(output: &[u8]) -> Self {
        output
            .split(|&b| b == 0)
            .filter(|path| !path.is_empty())
            .map(|path| String::from_utf8_lossy(path).into_owned())
            .collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for TrackedFiles {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Source of the tracked file listing.
pub trait TrackedFileLister {
    fn tracked_files(&self) -> Result<TrackedFiles>;
}

/// Lists tracked files by running `git ls-files` in a working directory.
pub struct GitLsFiles {
    dir: PathBuf,
}

impl GitLsFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn ensure_work_tree(&self) -> Result<()> {
        let output = git(&self.dir)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .context("run git rev-parse")?;

        if !output.status.success() || String::from_utf8_lossy(&output.stdout).trim() != "true" {
            bail!("not a git repository: {}", self.dir.display());
        }
        Ok(())
    }
}

impl TrackedFileLister for GitLsFiles {
    fn tracked_files(&self) -> Result<TrackedFiles> {
        self.ensure_work_tree()?;

        let output = git(&self.dir)
            .args(["ls-files", "-z"])
            .output()
            .context("run git ls-files")?;

        if !output.status.success() {
            bail!(
                "git ls-files failed (exit={}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(TrackedFiles::from_ls_files_output(&output.stdout))
    }
}

fn git(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir);
    cmd
}
