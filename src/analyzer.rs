//! This module provides functions for analyzing machine definitions before they are simulated.
//! The checks enforce the structural invariants of a `Machine`: the alphabets nest correctly,
//! the special states exist, and every transition only mentions known states and symbols.

use crate::machine::Machine;
use crate::types::{Direction, TuringMachineError, BLANK_SYMBOL};
use std::collections::HashSet;

/// Represents the problems that can be found while analyzing a `Machine`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Indicates structural problems with the machine (no states, blank missing, etc.).
    StructuralError(String),
    /// Indicates input symbols that are not part of the tape alphabet.
    InputNotOnTape(Vec<char>),
    /// Indicates start, accept or reject states that are not declared states.
    UndefinedSpecialStates(Vec<String>),
    /// Indicates transitions that leave from, or lead to, undeclared states.
    UndefinedStates(Vec<String>),
    /// Indicates transitions that read or write symbols outside the tape alphabet.
    UndefinedSymbols(Vec<String>),
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::StructuralError(msg) => TuringMachineError::ValidationError(msg),
            AnalysisError::InputNotOnTape(symbols) => TuringMachineError::ValidationError(
                format!("Input symbols missing from tape alphabet: {:?}", symbols),
            ),
            AnalysisError::UndefinedSpecialStates(states) => TuringMachineError::ValidationError(
                format!("Start, accept or reject state is not declared: {:?}", states),
            ),
            AnalysisError::UndefinedStates(transitions) => TuringMachineError::ValidationError(
                format!("Transitions reference undeclared states: {:?}", transitions),
            ),
            AnalysisError::UndefinedSymbols(transitions) => {
                TuringMachineError::ValidationError(format!(
                    "Transitions use symbols outside the tape alphabet: {:?}",
                    transitions
                ))
            }
        }
    }
}

/// Analyzes a `Machine` for structural errors.
///
/// Runs every check and reports the first failure. Unknown move directions are not an analysis
/// error; a run reports them when a branch actually reaches the offending transition.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TuringMachineError::ValidationError)` if any invariant is violated.
pub fn analyze(machine: &Machine) -> Result<(), TuringMachineError> {
    let errors = [
        check_structure,
        check_alphabets,
        check_special_states,
        check_transition_states,
        check_transition_symbols,
    ]
    .iter()
    .filter_map(|f| f(machine).err())
    .collect::<Vec<_>>();

    if let Some(first_error) = errors.into_iter().next() {
        return Err(first_error.into());
    }

    Ok(())
}

/// Returns the declared states that cannot be reached from the start state, sorted by name.
///
/// Reachability follows the transition graph only; it ignores whether a transition can
/// actually fire on some tape.
pub fn unreachable_states(machine: &Machine) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = vec![machine.start_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(by_symbol) = machine.transitions.get(state) {
            for transition in by_symbol.values().flatten() {
                if !visited.contains(transition.next_state.as_str()) {
                    queue.push(&transition.next_state);
                }
            }
        }
    }

    let mut unreachable: Vec<String> = machine
        .states
        .iter()
        .filter(|state| !visited.contains(state.as_str()))
        .cloned()
        .collect();

    unreachable.sort(); // Sort for deterministic output
    unreachable
}

/// Returns the `(state, symbol)` keys whose transitions use a direction other than `L` or `R`.
pub fn unknown_directions(machine: &Machine) -> Vec<(String, char)> {
    let mut keys: Vec<(String, char)> = machine
        .entries()
        .filter(|(_, _, t)| matches!(t.direction, Direction::Unknown(_)))
        .map(|(state, read, _)| (state.to_string(), read))
        .collect();

    keys.sort();
    keys.dedup();
    keys
}

/// Checks the basic shape of the machine: it declares states and its tape alphabet holds
/// the blank symbol.
fn check_structure(machine: &Machine) -> Result<(), AnalysisError> {
    if machine.states.is_empty() {
        return Err(AnalysisError::StructuralError("No states defined".to_string()));
    }

    if machine.states.iter().any(|state| state.is_empty()) {
        return Err(AnalysisError::StructuralError(
            "State names must not be empty".to_string(),
        ));
    }

    if !machine.tape_alphabet.contains(&BLANK_SYMBOL) {
        return Err(AnalysisError::StructuralError(format!(
            "Tape alphabet must contain the blank symbol '{}'",
            BLANK_SYMBOL
        )));
    }

    Ok(())
}

/// Checks that the tape alphabet is a superset of the input alphabet.
fn check_alphabets(machine: &Machine) -> Result<(), AnalysisError> {
    let mut missing: Vec<char> = machine
        .input_alphabet
        .difference(&machine.tape_alphabet)
        .copied()
        .collect();

    if !missing.is_empty() {
        missing.sort();
        return Err(AnalysisError::InputNotOnTape(missing));
    }

    Ok(())
}

/// Checks that the start, accept and reject states are declared.
fn check_special_states(machine: &Machine) -> Result<(), AnalysisError> {
    let mut undefined: Vec<String> = [
        &machine.start_state,
        &machine.accept_state,
        &machine.reject_state,
    ]
    .into_iter()
    .filter(|state| !machine.states.contains(*state))
    .cloned()
    .collect();

    if !undefined.is_empty() {
        undefined.dedup();
        return Err(AnalysisError::UndefinedSpecialStates(undefined));
    }

    Ok(())
}

/// Checks that every transition leaves from and leads to a declared state.
fn check_transition_states(machine: &Machine) -> Result<(), AnalysisError> {
    let mut undefined: Vec<String> = machine
        .entries()
        .filter(|(state, _, t)| {
            !machine.states.contains(*state) || !machine.states.contains(&t.next_state)
        })
        .map(|(state, read, t)| format!("({}, '{}') -> {}", state, read, t.next_state))
        .collect();

    if !undefined.is_empty() {
        undefined.sort();
        return Err(AnalysisError::UndefinedStates(undefined));
    }

    Ok(())
}

/// Checks that every transition reads and writes symbols of the tape alphabet.
fn check_transition_symbols(machine: &Machine) -> Result<(), AnalysisError> {
    let mut undefined: Vec<String> = machine
        .entries()
        .filter(|(_, read, t)| {
            !machine.tape_alphabet.contains(read) || !machine.tape_alphabet.contains(&t.write)
        })
        .map(|(state, read, t)| format!("({}, '{}') writes '{}'", state, read, t.write))
        .collect();

    if !undefined.is_empty() {
        undefined.sort();
        return Err(AnalysisError::UndefinedSymbols(undefined));
    }

    Ok(())
}
