//! This module defines the `Machine` struct, the static description of a nondeterministic
//! Turing Machine: its states, alphabets and transition table. A `Machine` is built once by
//! the loader and then shared read-only by every branch the simulator explores.

use crate::types::{Transition, BLANK_SYMBOL};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A nondeterministic single-tape Turing Machine.
///
/// The transition table maps a `(state, symbol)` pair to an ordered list of transitions.
/// An absent or empty list means the branch dies; a list with several entries is a point of
/// non-determinism, explored in the order the entries were added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// The name of the machine.
    pub name: String,
    /// Every state the machine may be in.
    pub states: HashSet<String>,
    /// Symbols an input string may consist of.
    pub input_alphabet: HashSet<char>,
    /// Symbols that may appear on the tape, including the blank.
    pub tape_alphabet: HashSet<char>,
    /// The state a run starts in.
    pub start_state: String,
    /// Reaching this state accepts the input.
    pub accept_state: String,
    /// The designated reject state.
    pub reject_state: String,
    /// Transition table keyed by state, then by the symbol under the head.
    pub transitions: HashMap<String, HashMap<char, Vec<Transition>>>,
}

impl Machine {
    /// Creates a machine with the given name and no states, symbols or transitions.
    ///
    /// The tape alphabet starts out containing only the blank symbol.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: HashSet::new(),
            input_alphabet: HashSet::new(),
            tape_alphabet: HashSet::from([BLANK_SYMBOL]),
            start_state: String::new(),
            accept_state: String::new(),
            reject_state: String::new(),
            transitions: HashMap::new(),
        }
    }

    /// Appends a transition for `(state, read)`.
    ///
    /// Transitions for the same key accumulate in insertion order; that order is the
    /// tie-break the simulator uses when a configuration fans out.
    pub fn add_transition(&mut self, state: impl Into<String>, read: char, transition: Transition) {
        self.transitions
            .entry(state.into())
            .or_default()
            .entry(read)
            .or_default()
            .push(transition);
    }

    /// Returns the transitions applicable when `symbol` is read in `state`.
    ///
    /// Nothing is synthesized: a blank cell must be matched by a rule on [`BLANK_SYMBOL`].
    pub fn lookup(&self, state: &str, symbol: char) -> &[Transition] {
        self.transitions
            .get(state)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over every `(state, read, transition)` entry of the table.
    pub fn entries(&self) -> impl Iterator<Item = (&str, char, &Transition)> {
        self.transitions.iter().flat_map(|(state, by_symbol)| {
            by_symbol.iter().flat_map(move |(&read, transitions)| {
                transitions.iter().map(move |t| (state.as_str(), read, t))
            })
        })
    }

    /// Returns the total number of transitions in the table.
    pub fn transition_count(&self) -> usize {
        self.transitions
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Checks whether no `(state, symbol)` pair has more than one transition.
    pub fn is_deterministic(&self) -> bool {
        self.transitions
            .values()
            .flat_map(HashMap::values)
            .all(|transitions| transitions.len() <= 1)
    }

    /// Returns the states sorted by name, for stable display.
    pub fn sorted_states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self.states.iter().map(String::as_str).collect();
        states.sort_unstable();
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn create_branching_machine() -> Machine {
        let mut machine = Machine::new("Branching Test");
        machine.states = ["q0", "q1", "acc", "rej"].map(String::from).into();
        machine.input_alphabet = HashSet::from(['a']);
        machine.tape_alphabet = HashSet::from(['a', 'b', BLANK_SYMBOL]);
        machine.start_state = "q0".to_string();
        machine.accept_state = "acc".to_string();
        machine.reject_state = "rej".to_string();

        machine.add_transition("q0", 'a', Transition::new("q0", 'a', Direction::Right));
        machine.add_transition("q0", 'a', Transition::new("q1", 'b', Direction::Right));
        machine.add_transition("q1", BLANK_SYMBOL, Transition::new("acc", '_', Direction::Right));
        machine
    }

    #[test]
    fn test_new_machine_is_empty() {
        let machine = Machine::new("Empty");

        assert_eq!(machine.name, "Empty");
        assert!(machine.states.is_empty());
        assert!(machine.tape_alphabet.contains(&BLANK_SYMBOL));
        assert_eq!(machine.transition_count(), 0);
        assert!(machine.is_deterministic());
    }

    #[test]
    fn test_lookup_preserves_insertion_order() {
        let machine = create_branching_machine();

        let transitions = machine.lookup("q0", 'a');
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].next_state, "q0");
        assert_eq!(transitions[1].next_state, "q1");
        assert_eq!(transitions[1].write, 'b');
    }

    #[test]
    fn test_lookup_missing_entry_is_empty() {
        let machine = create_branching_machine();

        assert!(machine.lookup("q0", 'b').is_empty());
        assert!(machine.lookup("q1", 'a').is_empty());
        assert!(machine.lookup("missing", 'a').is_empty());
    }

    #[test]
    fn test_lookup_blank_is_literal() {
        let machine = create_branching_machine();

        assert_eq!(machine.lookup("q1", BLANK_SYMBOL).len(), 1);
        // A space is not the blank symbol.
        assert!(machine.lookup("q1", ' ').is_empty());
    }

    #[test]
    fn test_transition_count_and_determinism() {
        let machine = create_branching_machine();

        assert_eq!(machine.transition_count(), 3);
        assert!(!machine.is_deterministic());
        assert_eq!(machine.entries().count(), 3);
    }

    #[test]
    fn test_sorted_states() {
        let machine = create_branching_machine();

        assert_eq!(machine.sorted_states(), vec!["acc", "q0", "q1", "rej"]);
    }
}
