//! This module turns the outcome of a run into something a person or a program can read:
//! the plain-text report printed by the command line, and a serializable summary.

use crate::simulator::{Outcome, Verdict};
use crate::types::Step;
use serde::{Deserialize, Serialize};
use std::fmt;

impl Verdict {
    /// The headline printed for this verdict.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Accept => "Accept!",
            Verdict::Reject => "Reject!",
            Verdict::ResourceExhausted => "Depth limit reached!",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The plain-text report of a run.
///
/// ```text
/// Accept!
/// Depth of tree: 5
/// Number of transitions simulated: 6
/// Average non-determinism per state: 1.20
/// ```
///
/// With path detail enabled, an accepted run also lists every step and the final tape.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    outcome: &'a Outcome,
    show_path: bool,
}

impl<'a> Report<'a> {
    pub fn new(outcome: &'a Outcome, show_path: bool) -> Self {
        Self { outcome, show_path }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.outcome.stats();

        writeln!(f, "{}", self.outcome.verdict())?;
        writeln!(f, "Depth of tree: {}", stats.depth)?;
        writeln!(f, "Number of transitions simulated: {}", stats.states_explored)?;
        writeln!(
            f,
            "Average non-determinism per state: {:.2}",
            stats.average_nondeterminism()
        )?;

        if let Some(trace) = self.outcome.trace().filter(|_| self.show_path) {
            writeln!(f)?;
            writeln!(f, "Path taken:")?;
            for (number, step) in trace.path.iter().enumerate() {
                writeln!(f, "Step {}: {}", number + 1, step)?;
            }
            writeln!(f, "Final Tape Configuration: {}", trace.tape)?;
        }

        Ok(())
    }
}

/// A machine-readable summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub machine: String,
    pub input: String,
    pub verdict: Verdict,
    pub depth: usize,
    pub states_explored: usize,
    pub average_nondeterminism: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Step>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_tape: Option<FinalTape>,
}

/// The final tape of an accepted run, split at the head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalTape {
    pub left: String,
    pub right: String,
}

impl Summary {
    pub fn new(machine: &str, input: &str, outcome: &Outcome) -> Self {
        let stats = outcome.stats();
        let trace = outcome.trace();

        Self {
            machine: machine.to_string(),
            input: input.to_string(),
            verdict: outcome.verdict(),
            depth: stats.depth,
            states_explored: stats.states_explored,
            average_nondeterminism: stats.average_nondeterminism(),
            path: trace.map(|trace| trace.path.clone()),
            final_tape: trace.map(|trace| FinalTape {
                left: trace.tape.left().iter().collect(),
                right: trace.tape.right().iter().collect(),
            }),
        }
    }

    /// Serializes the summary as a single line of JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
