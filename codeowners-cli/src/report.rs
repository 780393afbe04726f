use std::{collections::HashSet, fmt, io::Write};

use codeowners_rs::Owner;

/// Printed in place of the owner list for files nobody owns.
pub const UNOWNED_MARKER: &str = "(unowned)";

/// Minimum width of the path column.
pub const PATH_COLUMN_WIDTH: usize = 70;

/// Which files and owners to report, built once from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    owner_filters: HashSet<String>,
    show_unowned: bool,
    tracked_only: bool,
}

impl FilterConfig {
    /// The `@` sigil is optional on owner filters, so it's stripped here and
    /// compared against [`Owner::name`].
    pub fn new<S: AsRef<str>>(
        owner_filters: impl IntoIterator<Item = S>,
        show_unowned: bool,
        tracked_only: bool,
    ) -> Self {
        Self {
            owner_filters: owner_filters
                .into_iter()
                .map(|owner| owner.as_ref().trim_start_matches('@').to_owned())
                .collect(),
            show_unowned,
            tracked_only,
        }
    }

    pub fn tracked_only(&self) -> bool {
        self.tracked_only
    }

    fn has_owner_filters(&self) -> bool {
        !self.owner_filters.is_empty()
    }

    fn is_shown(&self, owner: &Owner) -> bool {
        if self.has_owner_filters() {
            self.owner_filters.contains(owner.name())
        } else {
            !self.show_unowned
        }
    }
}

/// What to print after the path, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
    Unowned,
    Owners(Vec<&'a Owner>),
}

impl fmt::Display for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Unowned => f.write_str(UNOWNED_MARKER),
            Payload::Owners(owners) => {
                for (idx, owner) in owners.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", owner)?;
                }
                Ok(())
            }
        }
    }
}

/// Decide whether a file is reported and with which owners. `owners` is
/// `None` for unowned files. Owners are kept in rule order; `None` is
/// returned when nothing is left to show.
pub fn decide<'a>(owners: Option<&'a [Owner]>, config: &FilterConfig) -> Option<Payload<'a>> {
    let Some(owners) = owners.filter(|owners| !owners.is_empty()) else {
        // Unowned files are hidden when filtering by owner, unless asked for.
        return (!config.has_owner_filters() || config.show_unowned).then_some(Payload::Unowned);
    };

    let shown = owners
        .iter()
        .filter(|owner| config.is_shown(owner))
        .collect::<Vec<_>>();
    (!shown.is_empty()).then_some(Payload::Owners(shown))
}

/// Writes one line per reported file to an output sink.
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Report `path` according to `config`. Returns whether a line was
    /// written.
    pub fn report(
        &mut self,
        path: &str,
        owners: Option<&[Owner]>,
        config: &FilterConfig,
    ) -> std::io::Result<bool> {
        match decide(owners, config) {
            Some(payload) => {
                writeln!(self.out, "{:<width$}  {}", path, payload, width = PATH_COLUMN_WIDTH)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
