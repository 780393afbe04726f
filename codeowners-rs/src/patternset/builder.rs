use super::{
    nfa::{Nfa, StateId, Transition},
    Matcher,
};

/// Builder for a patternset [`Matcher`]. Patterns are identified by the order
/// in which they're added, starting from zero.
#[derive(Clone)]
pub struct Builder {
    nfa: Nfa,
    next_pattern_id: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            nfa: Nfa::new(),
            next_pattern_id: 0,
        }
    }

    /// Consume the builder, returning a [`Matcher`] for the patterns added.
    pub fn build(self) -> Matcher {
        Matcher::new(self.nfa)
    }

    /// Add a pattern, returning its id. Fails if a wildcard segment can't be
    /// compiled.
    pub fn add(&mut self, pattern: &str) -> Result<usize, regex::Error> {
        let pattern_id = self.next_pattern_id;
        self.next_pattern_id += 1;

        // A leading slash anchors the pattern to the root.
        let (pattern, leading_slash) = match pattern.strip_prefix('/') {
            Some(pattern) => (pattern, true),
            None => (pattern, false),
        };

        // Only files are matched, so a trailing slash just means "everything
        // below this directory".
        let (pattern, trailing_slash) = match pattern.strip_suffix('/') {
            Some(pattern) => (pattern, true),
            None => (pattern, false),
        };

        let segments = pattern.split('/').collect::<Vec<_>>();

        // Single-segment patterns without a leading slash may match at any
        // depth; everything else is anchored.
        let mut state_id = Nfa::START_STATE;
        if !leading_slash && segments.len() == 1 {
            state_id = self.add_epsilon_transition(state_id)?;
        }

        for segment in &segments {
            state_id = match *segment {
                "**" => self.add_epsilon_transition(state_id)?,
                _ => self.add_transition(state_id, segment)?,
            };
        }

        // `dir/` and `dir/**` match the contents of `dir` but not `dir`
        // itself, so at least one more segment is required.
        if trailing_slash || segments.last() == Some(&"**") {
            state_id = self.add_transition(state_id, "*")?;
        }

        // Patterns match everything below them, except those ending in a
        // single `*` segment, which only match one level deep.
        if segments.last() != Some(&"*") {
            state_id = self.add_epsilon_transition(state_id)?;
        }

        self.nfa.state_mut(state_id).mark_as_terminal(pattern_id);
        Ok(pattern_id)
    }

    // Follow or create a transition from `from_id` that consumes `segment`.
    // Self loops are skipped so a literal `*` segment never reuses a `**`
    // state.
    fn add_transition(&mut self, from_id: StateId, segment: &str) -> Result<StateId, regex::Error> {
        let existing = self
            .nfa
            .transitions_from(from_id)
            .find(|t| t.path_segment == segment && t.target != from_id)
            .map(|t| t.target);
        if let Some(target) = existing {
            return Ok(target);
        }

        let state_id = self.nfa.add_state();
        let transition = Transition::new(segment.to_owned(), state_id)?;
        self.nfa.state_mut(from_id).add_transition(transition);
        Ok(state_id)
    }

    // Return a state reachable from `from_id` by an epsilon transition, which
    // loops on any segment. Consecutive `**` collapse into the same state.
    fn add_epsilon_transition(&mut self, from_id: StateId) -> Result<StateId, regex::Error> {
        let is_loop = self
            .nfa
            .transitions_from(from_id)
            .any(|t| t.path_segment == "*" && t.target == from_id);
        if is_loop {
            return Ok(from_id);
        }

        if let Some(to_id) = self.nfa.epsilon_transition_from(from_id) {
            return Ok(to_id);
        }

        let state_id = self.nfa.add_state();
        let self_loop = Transition::new("*".to_owned(), state_id)?;
        self.nfa.state_mut(state_id).add_transition(self_loop);
        self.nfa.state_mut(from_id).epsilon_transition = Some(state_id);
        Ok(state_id)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
