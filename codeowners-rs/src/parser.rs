use std::{fs, path::Path};

use crate::ruleset::{Owner, Rule};

/// Parse a CODEOWNERS file from a string, returning a `ParseResult` containing
/// the parsed rules and any errors encountered.
pub fn parse(source: &str) -> ParseResult {
    let mut rules = Vec::new();
    let mut errors = Vec::new();

    for (idx, text) in source.lines().enumerate() {
        let line = idx + 1;
        let mut tokens = tokenize(text).into_iter();
        let Some(pattern) = tokens.next() else {
            continue;
        };

        if pattern.contains('\0') {
            errors.push(ParseError::new(line, "patterns cannot contain null bytes"));
            continue;
        }

        let mut owners = Vec::new();
        for token in tokens {
            match Owner::try_from(token) {
                Ok(owner) => owners.push(owner),
                Err(err) => errors.push(ParseError::new(line, err.to_string())),
            }
        }

        rules.push(Rule {
            pattern,
            owners,
            line,
        });
    }

    ParseResult { rules, errors }
}

/// Parse a CODEOWNERS file from a file path, reading the contents of the file
/// and returning a `ParseResult` containing the parsed rules and any errors
/// encountered.
pub fn parse_file(path: &Path) -> std::io::Result<ParseResult> {
    let source = fs::read_to_string(path)?;
    Ok(parse(&source))
}

/// The result of parsing a CODEOWNERS file. If `errors` is non-empty, `rules`
/// may be missing owners that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub rules: Vec<Rule>,
    pub errors: Vec<ParseError>,
}

/// An error encountered while parsing a CODEOWNERS file, with the 1-based line
/// number it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

// Split a line into whitespace-separated tokens, stopping at the first
// unescaped `#`. Backslashes are kept in the token so the pattern matcher can
// tell an escaped wildcard from a real one.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            ' ' | '\t' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '#' => break,
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
