use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::{
    report::{FilterConfig, Reporter},
    resolve::Resolver,
    tracked::TrackedFiles,
    walk::{to_slash, walk_files},
};

/// Counts for a single root path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub untracked: usize,
    pub reported: usize,
}

/// Runs every file beneath a root through the tracked-file gate, the resolver
/// and the filter, writing the surviving lines to the reporter.
pub struct Pipeline<'a, W> {
    config: &'a FilterConfig,
    resolver: &'a Resolver,
    tracked: Option<&'a TrackedFiles>,
    reporter: Reporter<W>,
}

impl<'a, W: Write> Pipeline<'a, W> {
    /// `tracked` must be given when the config asks for tracked files only.
    pub fn new(
        config: &'a FilterConfig,
        resolver: &'a Resolver,
        tracked: Option<&'a TrackedFiles>,
        reporter: Reporter<W>,
    ) -> Self {
        Self {
            config,
            resolver,
            tracked,
            reporter,
        }
    }

    /// Process every file beneath `root`. Stops at the first error.
    pub fn run(&mut self, root: &Path) -> Result<Summary> {
        debug!(root = %root.display(), "walking");
        let mut summary = Summary::default();

        for path in walk_files(root) {
            let path = path.with_context(|| format!("failed to walk {}", root.display()))?;
            let display_path = to_slash(&path);
            summary.files += 1;

            if let Some(tracked) = self.tracked {
                if !tracked.contains(&display_path) {
                    trace!(path = %display_path, "skipping untracked file");
                    summary.untracked += 1;
                    continue;
                }
            }

            let resolution = self.resolver.resolve(&path)?;
            trace!(path = %display_path, ?resolution, "resolved");

            let reported = self
                .reporter
                .report(&display_path, resolution.owners(), self.config)
                .context("failed to write output")?;
            if reported {
                summary.reported += 1;
            }
        }

        Ok(summary)
    }

    #[cfg(test)]
    pub fn into_reporter(self) -> Reporter<W> {
        self.reporter
    }
}
