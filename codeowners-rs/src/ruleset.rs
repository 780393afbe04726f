use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patternset::{Builder, Matcher};

/// A CODEOWNERS rule: a pattern and the owners of the paths it matches. An
/// empty `owners` list explicitly marks matching paths as unowned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub owners: Vec<Owner>,
    /// 1-based line number of the rule in its source file.
    pub line: usize,
}

/// A set of rules compiled into a single matcher. Rules later in the set take
/// precedence over earlier ones.
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    matcher: Matcher,
}

impl RuleSet {
    /// Compile a rule set. Fails if one of the rule patterns can't be turned
    /// into a matcher.
    pub fn try_new(rules: Vec<Rule>) -> Result<Self, PatternError> {
        let mut builder = Builder::new();
        for rule in &rules {
            if let Err(source) = builder.add(&rule.pattern) {
                return Err(PatternError {
                    rule: rule.clone(),
                    source,
                });
            }
        }
        Ok(Self {
            rules,
            matcher: builder.build(),
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Return the rule that determines ownership of `path`: the last rule in
    /// the file whose pattern matches, or `None` if nothing matches.
    pub fn matching_rule(&self, path: impl AsRef<Path>) -> Result<Option<&Rule>, MatchError> {
        let path = normalize_path(path.as_ref())?;
        Ok(self
            .matcher
            .matching_patterns(&path)
            .into_iter()
            .max()
            .map(|idx| &self.rules[idx]))
    }

    /// Return every rule whose pattern matches `path`, in file order.
    pub fn all_matching_rules(&self, path: impl AsRef<Path>) -> Result<Vec<&Rule>, MatchError> {
        let path = normalize_path(path.as_ref())?;
        let mut ids = self.matcher.matching_patterns(&path);
        ids.sort_unstable();
        Ok(ids.into_iter().map(|idx| &self.rules[idx]).collect())
    }

    /// Return the owners of `path`, or `None` if no rule matches or the
    /// matching rule has no owners.
    pub fn owners(&self, path: impl AsRef<Path>) -> Result<Option<&[Owner]>, MatchError> {
        Ok(self
            .matching_rule(path)?
            .filter(|rule| !rule.owners.is_empty())
            .map(|rule| rule.owners.as_slice()))
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

// CODEOWNERS patterns use `/` separators, so paths are matched in that form
// regardless of platform. `.` and root components carry no information for
// matching and are dropped.
fn normalize_path(path: &Path) -> Result<String, MatchError> {
    let mut normalized = String::new();
    for component in path.components() {
        let segment = match component {
            Component::Normal(segment) => segment
                .to_str()
                .ok_or_else(|| MatchError::NonUtf8Path(path.to_owned()))?,
            Component::ParentDir => "..",
            Component::CurDir | Component::RootDir | Component::Prefix(_) => continue,
        };
        if !normalized.is_empty() {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        return Err(MatchError::EmptyPath);
    }
    Ok(normalized)
}

/// Errors returned when a path can't be matched against a [`RuleSet`].
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("path is empty")]
    EmptyPath,
}

/// A rule whose pattern couldn't be compiled.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern '{}' on line {}: {source}", .rule.pattern, .rule.line)]
pub struct PatternError {
    pub rule: Rule,
    pub source: regex::Error,
}

/// The kind of identity an [`Owner`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    /// A GitHub user, written `@login`.
    User,
    /// A GitHub team, written `@org/team`.
    Team,
    /// An email address.
    Email,
}

/// An owner as written in a CODEOWNERS file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    value: String,
    kind: OwnerKind,
}

impl Owner {
    pub fn new(value: String, kind: OwnerKind) -> Self {
        Self { value, kind }
    }

    pub fn kind(&self) -> OwnerKind {
        self.kind
    }

    /// The owner's identity without the `@` sigil used for users and teams.
    /// Email addresses are returned unchanged.
    pub fn name(&self) -> &str {
        match self.kind {
            OwnerKind::User | OwnerKind::Team => self.value.trim_start_matches('@'),
            OwnerKind::Email => &self.value,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A[A-Z0-9a-z\._'%\+\-]+@[A-Za-z0-9\.\-]+\.[A-Za-z]{2,6}\z").expect("valid regex")
});
static TEAM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A@[a-zA-Z0-9\-]+/[a-zA-Z0-9_\-]+\z").expect("valid regex"));
static USER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A@[a-zA-Z0-9\-_]+\z").expect("valid regex"));

impl TryFrom<String> for Owner {
    type Error = InvalidOwnerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let kind = if USER_REGEX.is_match(&value) {
            OwnerKind::User
        } else if TEAM_REGEX.is_match(&value) {
            OwnerKind::Team
        } else if EMAIL_REGEX.is_match(&value) {
            OwnerKind::Email
        } else {
            return Err(InvalidOwnerError(value));
        };
        Ok(Self { value, kind })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid owner: {0}")]
pub struct InvalidOwnerError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset(rules: &[(&str, &str)]) -> RuleSet {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(idx, (pattern, owners))| Rule {
                pattern: pattern.to_string(),
                owners: owners
                    .split_whitespace()
                    .map(|o| Owner::try_from(o.to_string()).unwrap())
                    .collect(),
                line: idx + 1,
            })
            .collect();
        RuleSet::try_new(rules).unwrap()
    }

    #[test]
    fn test_owner_kinds() {
        let examples = [
            ("@alice", Some(OwnerKind::User), "alice"),
            ("@org/team-x", Some(OwnerKind::Team), "org/team-x"),
            ("dev@example.com", Some(OwnerKind::Email), "dev@example.com"),
            ("alice", None, ""),
            ("@org/team/extra", None, ""),
            ("@", None, ""),
        ];
        for (text, kind, name) in examples {
            match Owner::try_from(text.to_string()) {
                Ok(owner) => {
                    assert_eq!(Some(owner.kind()), kind, "kind mismatch for {}", text);
                    assert_eq!(owner.name(), name);
                    assert_eq!(owner.to_string(), text);
                }
                Err(err) => {
                    assert_eq!(kind, None, "expected {} to be valid", text);
                    assert_eq!(err.to_string(), format!("invalid owner: {}", text));
                }
            }
        }
    }

    #[test]
    fn test_last_matching_rule_wins() {
        let rs = ruleset(&[
            ("*", "@everyone"),
            ("*.go", "@backend"),
            ("/docs/", "@org/writers"),
            ("/docs/generated/", ""),
        ]);

        let owners = |path: &str| {
            rs.owners(path)
                .unwrap()
                .map(|owners| owners.iter().map(|o| o.to_string()).collect::<Vec<_>>())
        };
        assert_eq!(owners("README.md"), Some(vec!["@everyone".to_owned()]));
        assert_eq!(owners("cmd/main.go"), Some(vec!["@backend".to_owned()]));
        assert_eq!(owners("docs/main.go"), Some(vec!["@org/writers".to_owned()]));
        assert_eq!(owners("docs/generated/api.md"), None);

        let rule = rs.matching_rule("docs/generated/api.md").unwrap().unwrap();
        assert_eq!(rule.line, 4);
        assert!(rule.owners.is_empty());
    }

    #[test]
    fn test_all_matching_rules() {
        let rs = ruleset(&[("*.go", "@a"), ("/cmd/", "@b"), ("*.rs", "@c")]);
        let lines = rs
            .all_matching_rules("cmd/main.go")
            .unwrap()
            .iter()
            .map(|r| r.line)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_debug_lists_rules() {
        let rs = ruleset(&[("*.go", "@backend")]);
        let debug = format!("{:?}", rs);
        assert!(debug.starts_with("RuleSet { rules: [Rule { pattern: \"*.go\""), "{}", debug);
        assert!(!debug.contains("matcher"), "{}", debug);
    }

    #[test]
    fn test_path_normalization() {
        let rs = ruleset(&[("/src/", "@a")]);
        assert!(rs.matching_rule("./src/lib.rs").unwrap().is_some());
        assert!(rs.matching_rule("src/lib.rs").unwrap().is_some());
        assert!(rs.matching_rule("lib/src/lib.rs").unwrap().is_none());
        assert!(matches!(rs.matching_rule("."), Err(MatchError::EmptyPath)));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let rs = ruleset(&[("/src/", "@a")]);
        let non_utf8 = Path::new(OsStr::from_bytes(b"src/\xff.rs"));
        assert!(matches!(
            rs.matching_rule(non_utf8),
            Err(MatchError::NonUtf8Path(_))
        ));
    }
}
