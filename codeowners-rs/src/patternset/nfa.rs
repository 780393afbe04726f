use regex::Regex;

/// A non-deterministic automaton over path segments. Each transition consumes
/// one segment of a `/`-separated path; epsilon transitions lead to states
/// with a `*` self loop, which is how `**` and floating patterns are modelled.
#[derive(Clone)]
pub(crate) struct Nfa {
    states: Vec<State>,
}

impl Nfa {
    pub(crate) const START_STATE: StateId = StateId(0);

    pub(crate) fn new() -> Self {
        Self {
            states: vec![State::new()],
        }
    }

    pub(crate) fn add_state(&mut self) -> StateId {
        self.states.push(State::new());
        StateId(self.states.len() as u32 - 1)
    }

    #[inline]
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[usize::from(id)]
    }

    #[inline]
    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[usize::from(id)]
    }

    pub(crate) fn initial_states(&self) -> Vec<StateId> {
        let mut states = vec![Self::START_STATE];
        states.extend(self.epsilon_transition_from(Self::START_STATE));
        states
    }

    pub(crate) fn transitions_from(&self, id: StateId) -> impl Iterator<Item = &Transition> {
        self.state(id).transitions.iter()
    }

    pub(crate) fn epsilon_transition_from(&self, id: StateId) -> Option<StateId> {
        self.state(id).epsilon_transition
    }

    #[cfg(test)]
    pub(crate) fn states_iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct StateId(u32);

impl From<StateId> for usize {
    fn from(id: StateId) -> usize {
        id.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct State {
    pub(crate) terminal_for_patterns: Vec<usize>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) epsilon_transition: Option<StateId>,
}

impl State {
    fn new() -> Self {
        Self {
            terminal_for_patterns: Vec::new(),
            transitions: Vec::new(),
            epsilon_transition: None,
        }
    }

    pub(crate) fn mark_as_terminal(&mut self, pattern_id: usize) {
        self.terminal_for_patterns.push(pattern_id);
    }

    pub(crate) fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) path_segment: String,
    pub(crate) target: StateId,
    condition: SegmentCondition,
}

impl Transition {
    pub(crate) fn new(path_segment: String, target: StateId) -> Result<Transition, regex::Error> {
        let condition = SegmentCondition::new(&path_segment)?;
        Ok(Self {
            path_segment,
            target,
            condition,
        })
    }

    pub(crate) fn is_match(&self, segment: &str) -> bool {
        self.condition.is_match(segment)
    }
}

// Most segments in real CODEOWNERS files are literals or have a single
// leading or trailing star, so those get a fast path and only the rest are
// compiled to a regex.
#[derive(Debug, Clone)]
enum SegmentCondition {
    Unconditional,
    Literal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(Regex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Star,
    Question,
    Char(char),
}

impl SegmentCondition {
    fn new(glob: &str) -> Result<Self, regex::Error> {
        let tokens = tokenize(glob);
        if tokens == [Token::Star] {
            return Ok(Self::Unconditional);
        }

        let leading_star = tokens.first() == Some(&Token::Star);
        let trailing_star = tokens.len() > 1 && tokens.last() == Some(&Token::Star);
        let inner = &tokens[leading_star as usize..tokens.len() - trailing_star as usize];

        if inner.iter().any(|t| !matches!(t, Token::Char(_))) {
            return Ok(Self::Regex(to_regex(&tokens)?));
        }

        let literal = inner
            .iter()
            .filter_map(|t| match t {
                Token::Char(c) => Some(*c),
                _ => None,
            })
            .collect::<String>();
        Ok(match (leading_star, trailing_star) {
            (false, false) => Self::Literal(literal),
            (false, true) => Self::Prefix(literal),
            (true, false) => Self::Suffix(literal),
            (true, true) => Self::Contains(literal),
        })
    }

    fn is_match(&self, segment: &str) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Literal(literal) => segment == literal,
            Self::Prefix(prefix) => segment.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => segment.ends_with(suffix.as_str()),
            Self::Contains(needle) => {
                memchr::memmem::find(segment.as_bytes(), needle.as_bytes()).is_some()
            }
            Self::Regex(re) => re.is_match(segment),
        }
    }
}

fn tokenize(glob: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(glob.len());
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            // A trailing backslash has nothing to escape, so it's literal.
            '\\' => Token::Char(chars.next().unwrap_or('\\')),
            '*' => Token::Star,
            '?' => Token::Question,
            c => Token::Char(c),
        });
    }
    tokens
}

fn to_regex(tokens: &[Token]) -> Result<Regex, regex::Error> {
    let mut regex = String::with_capacity(tokens.len() + 8);
    regex.push_str(r"\A");
    for token in tokens {
        match token {
            Token::Star => regex.push_str(r"[^/]*"),
            Token::Question => regex.push_str(r"[^/]"),
            Token::Char(c) => {
                if regex_syntax::is_meta_character(*c) {
                    regex.push('\\');
                }
                regex.push(*c);
            }
        }
    }
    regex.push_str(r"\z");
    Regex::new(&regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(glob: &str) -> SegmentCondition {
        SegmentCondition::new(glob).unwrap()
    }

    #[test]
    fn test_condition_kinds() {
        assert!(matches!(condition("*"), SegmentCondition::Unconditional));
        assert!(matches!(condition("foo"), SegmentCondition::Literal(l) if l == "foo"));
        assert!(matches!(condition("foo*"), SegmentCondition::Prefix(p) if p == "foo"));
        assert!(matches!(condition("*.rs"), SegmentCondition::Suffix(s) if s == ".rs"));
        assert!(matches!(condition("*test*"), SegmentCondition::Contains(c) if c == "test"));
        assert!(matches!(condition("f\\*o"), SegmentCondition::Literal(l) if l == "f*o"));
        assert!(matches!(condition("a*b"), SegmentCondition::Regex(_)));
        assert!(matches!(condition("?.rs"), SegmentCondition::Regex(_)));
    }

    #[test]
    fn test_condition_matching() {
        let examples = [
            ("*.rs", "lib.rs", true),
            ("*.rs", "lib.go", false),
            ("thanos-*", "thanos-query", true),
            ("thanos-*", "loki", false),
            ("*sdk*", "go-sdk-v2", true),
            ("a?c", "abc", true),
            ("a?c", "ac", false),
            ("a*b*c", "axxbyyc", true),
            ("a*b*c", "axxbyy", false),
            ("v1.[0-9]", "v1.[0-9]", true),
            ("v1.[0-9]", "v1.5", false),
            ("foo\\ bar", "foo bar", true),
            ("trailing\\", "trailing\\", true),
        ];
        for (glob, segment, expected) in examples {
            assert_eq!(
                condition(glob).is_match(segment),
                expected,
                "{:?} against {:?}",
                glob,
                segment
            );
        }
    }
}
