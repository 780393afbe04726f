use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use super::nfa::{Nfa, StateId};

/// Matches paths against a set of patterns. Created using a
/// [`super::Builder`].
///
/// The states reached after each directory prefix are cached, so matching
/// many files in the same directory only steps through the automaton once per
/// directory. The cache is shared between clones.
#[derive(Clone)]
pub struct Matcher {
    nfa: Nfa,
    prefix_cache: Arc<RwLock<HashMap<String, Vec<StateId>>>>,
}

impl Matcher {
    pub(crate) fn new(nfa: Nfa) -> Matcher {
        Self {
            nfa,
            prefix_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the ids of all patterns matching a `/`-separated path. Ids are
    /// in no particular order.
    pub fn matching_patterns(&self, path: &str) -> Vec<usize> {
        let segments = path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
        let Some((file_name, dirs)) = segments.split_last() else {
            return Vec::new();
        };

        let dir_states = self.states_for_dir(dirs);
        let mut matches = self
            .step(&dir_states, file_name)
            .into_iter()
            .flat_map(|id| self.nfa.state(id).terminal_for_patterns.iter().copied())
            .collect::<Vec<_>>();
        matches.sort_unstable();
        matches.dedup();
        matches
    }

    fn states_for_dir(&self, dirs: &[&str]) -> Vec<StateId> {
        let Some((last, parents)) = dirs.split_last() else {
            return self.nfa.initial_states();
        };

        let key = dirs.join("/");
        if let Some(states) = self.cached_states(&key) {
            return states;
        }

        let states = self.step(&self.states_for_dir(parents), last);
        self.cache_states(key, states.clone());
        states
    }

    // Follow every transition matching `segment` from `from_states`, then any
    // epsilon transitions from the states reached.
    fn step(&self, from_states: &[StateId], segment: &str) -> Vec<StateId> {
        let mut next_states = Vec::new();
        for &state_id in from_states {
            next_states.extend(
                self.nfa
                    .transitions_from(state_id)
                    .filter(|transition| transition.is_match(segment))
                    .map(|transition| transition.target),
            );
        }

        let epsilon_states = next_states
            .iter()
            .filter_map(|&id| self.nfa.epsilon_transition_from(id))
            .collect::<Vec<_>>();
        next_states.extend(epsilon_states);
        next_states.sort_unstable();
        next_states.dedup();
        next_states
    }

    fn cached_states(&self, dir: &str) -> Option<Vec<StateId>> {
        self.prefix_cache
            .read()
            .expect("valid lock")
            .get(dir)
            .cloned()
    }

    fn cache_states(&self, dir: String, states: Vec<StateId>) {
        self.prefix_cache
            .write()
            .expect("valid lock")
            .insert(dir, states);
    }
}
