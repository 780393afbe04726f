//! Parsing and matching for CODEOWNERS files.
//!
//! A [`RuleSet`] is usually obtained with [`from_path`] or
//! [`from_standard_location`], then queried with
//! [`RuleSet::matching_rule`] to find who owns a given path.

pub mod parser;
mod patternset;
mod ruleset;

use std::path::{Path, PathBuf};

pub use ruleset::{InvalidOwnerError, MatchError, Owner, OwnerKind, PatternError, Rule, RuleSet};

/// Locations searched by [`from_standard_location`], in order of precedence.
pub const STANDARD_LOCATIONS: &[&str] = &[".github/CODEOWNERS", "CODEOWNERS", "docs/CODEOWNERS"];

/// Errors that can occur while loading a CODEOWNERS file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}:{line}: invalid pattern '{pattern}': {source}", .path.display())]
    InvalidPattern {
        path: PathBuf,
        line: usize,
        pattern: String,
        source: regex::Error,
    },

    #[error("no CODEOWNERS file found in {} (looked for {})", .dir.display(), STANDARD_LOCATIONS.join(", "))]
    NotFound { dir: PathBuf },
}

/// Load a CODEOWNERS file from an explicit path. The first parse error, if
/// any, fails the load.
pub fn from_path(path: impl AsRef<Path>) -> Result<RuleSet, LoadError> {
    let path = path.as_ref();
    let result = parser::parse_file(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;

    if let Some(err) = result.errors.into_iter().next() {
        return Err(LoadError::Parse {
            path: path.to_owned(),
            line: err.line,
            message: err.message,
        });
    }

    RuleSet::try_new(result.rules).map_err(|err| LoadError::InvalidPattern {
        path: path.to_owned(),
        line: err.rule.line,
        pattern: err.rule.pattern,
        source: err.source,
    })
}

/// Find the CODEOWNERS file beneath `dir` at one of the [`STANDARD_LOCATIONS`]
/// and load it.
pub fn from_standard_location(dir: impl AsRef<Path>) -> Result<RuleSet, LoadError> {
    let dir = dir.as_ref();
    match find_standard_location(dir) {
        Some(path) => from_path(path),
        None => Err(LoadError::NotFound {
            dir: dir.to_owned(),
        }),
    }
}

/// Return the first of the [`STANDARD_LOCATIONS`] beneath `dir` that exists.
pub fn find_standard_location(dir: impl AsRef<Path>) -> Option<PathBuf> {
    STANDARD_LOCATIONS
        .iter()
        .map(|location| dir.as_ref().join(location))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CODEOWNERS");
        fs::write(&path, "*.go @backend\n/docs/ @org/writers docs@example.com\n").unwrap();

        let ruleset = from_path(&path).unwrap();
        let rule = ruleset.matching_rule("cmd/main.go").unwrap().unwrap();
        assert_eq!(rule.pattern, "*.go");
        assert_eq!(rule.line, 1);
        assert!(ruleset.matching_rule("README.md").unwrap().is_none());
    }

    #[test]
    fn test_from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CODEOWNERS");
        fs::write(&path, "# owners\n*.go @backend\n*.rs not-an-owner\n").unwrap();

        match from_path(&path) {
            Err(LoadError::Parse { line, message, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(message, "invalid owner: not-an-owner");
            }
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = from_path(dir.path().join("CODEOWNERS")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().starts_with("failed to read "));
    }

    #[test]
    fn test_standard_location_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".github")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/CODEOWNERS"), "* @docs\n").unwrap();
        assert_eq!(
            find_standard_location(dir.path()),
            Some(dir.path().join("docs/CODEOWNERS"))
        );

        fs::write(dir.path().join("CODEOWNERS"), "* @root\n").unwrap();
        fs::write(dir.path().join(".github/CODEOWNERS"), "* @github\n").unwrap();
        let ruleset = from_standard_location(dir.path()).unwrap();
        let owners = ruleset.owners("any/file").unwrap().unwrap();
        assert_eq!(owners[0].to_string(), "@github");
    }

    #[test]
    fn test_standard_location_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = from_standard_location(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().contains(".github/CODEOWNERS"));
    }
}
