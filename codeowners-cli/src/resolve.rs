use std::path::Path;

use anyhow::{Context, Result};
use codeowners_rs::{Owner, Rule, RuleSet};
use tracing::{debug, enabled, trace, Level};

/// The outcome of looking up a path's owners. A path matched by a rule with
/// no owners is kept apart from one no rule matches, even though both are
/// reported as unowned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Unmatched,
    NoOwners(&'a Rule),
    Owned(&'a Rule),
}

impl<'a> Resolution<'a> {
    /// The owners to report, or `None` if the path is unowned.
    pub fn owners(&self) -> Option<&'a [Owner]> {
        match *self {
            Resolution::Owned(rule) => Some(rule.owners.as_slice()),
            Resolution::Unmatched | Resolution::NoOwners(_) => None,
        }
    }
}

/// Looks up owners in a loaded CODEOWNERS file.
pub struct Resolver {
    ruleset: RuleSet,
}

impl Resolver {
    pub fn new(ruleset: RuleSet) -> Self {
        Self { ruleset }
    }

    /// Load the CODEOWNERS file at `file`, or from one of the standard
    /// locations under the working directory when no file is given.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let ruleset = match file {
            Some(file) => codeowners_rs::from_path(file),
            None => codeowners_rs::from_standard_location("."),
        }
        .context("failed to load CODEOWNERS")?;

        debug!(rules = ruleset.rules().len(), "loaded CODEOWNERS");
        Ok(Self::new(ruleset))
    }

    pub fn resolve(&self, path: &Path) -> Result<Resolution<'_>> {
        if enabled!(Level::TRACE) {
            let lines = self.matching_lines(path)?;
            trace!(path = %path.display(), ?lines, "matching rules");
        }

        let rule = self
            .ruleset
            .matching_rule(path)
            .with_context(|| format!("failed to match {}", path.display()))?;

        Ok(match rule {
            None => Resolution::Unmatched,
            Some(rule) if rule.owners.is_empty() => Resolution::NoOwners(rule),
            Some(rule) => Resolution::Owned(rule),
        })
    }

    /// Line numbers of every rule matching `path`, in file order. The last
    /// one decides ownership.
    pub fn matching_lines(&self, path: &Path) -> Result<Vec<usize>> {
        let rules = self
            .ruleset
            .all_matching_rules(path)
            .with_context(|| format!("failed to match {}", path.display()))?;
        Ok(rules.into_iter().map(|rule| rule.line).collect())
    }
}

#[cfg(test)]
mod tests {
    use codeowners_rs::parser;

    use super::*;

    fn resolver(source: &str) -> Resolver {
        let result = parser::parse(source);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        Resolver::new(RuleSet::try_new(result.rules).unwrap())
    }

    #[test]
    fn test_resolutions() {
        let resolver = resolver("*.go @backend @org/go\n/vendor/\n");

        let owned = resolver.resolve(Path::new("cmd/main.go")).unwrap();
        assert!(matches!(owned, Resolution::Owned(rule) if rule.line == 1));
        let owners = owned.owners().unwrap();
        assert_eq!(
            owners.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
            vec!["@backend", "@org/go"]
        );

        let no_owners = resolver.resolve(Path::new("vendor/lib.go")).unwrap();
        assert!(matches!(no_owners, Resolution::NoOwners(rule) if rule.line == 2));
        assert_eq!(no_owners.owners(), None);

        let unmatched = resolver.resolve(Path::new("README.md")).unwrap();
        assert_eq!(unmatched, Resolution::Unmatched);
        assert_eq!(unmatched.owners(), None);
    }

    #[test]
    fn test_matching_lines() {
        let resolver = resolver("* @everyone\n*.go @backend\n/docs/ @docs\n");

        assert_eq!(resolver.matching_lines(Path::new("cmd/main.go")).unwrap(), vec![1, 2]);
        assert_eq!(resolver.matching_lines(Path::new("docs/a.md")).unwrap(), vec![1, 3]);
        assert!(resolver.matching_lines(Path::new(".")).is_err());
    }

    #[test]
    fn test_resolve_error_has_context() {
        let resolver = resolver("* @a\n");
        let err = resolver.resolve(Path::new(".")).unwrap_err();
        assert_eq!(format!("{:#}", err), "failed to match .: path is empty");
    }
}
