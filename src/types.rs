//! This module defines the core data structures and types shared by the machine definition,
//! the loader and the breadth-first simulator: symbols, transitions, path steps and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The blank symbol implicitly filling every tape cell that was never written.
pub const BLANK_SYMBOL: char = '_';
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_MACHINE_SIZE: usize = 65536; // 64KB
/// The default depth bound at which a run gives up exploring.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Represents the direction the head moves after a transition is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// A direction token the machine definition used that is neither `L` nor `R`.
    ///
    /// The token is kept as-is so a run that reaches it can fail with
    /// [`TuringMachineError::MalformedMachine`].
    Unknown(String),
}

impl Direction {
    /// Interprets a direction token from a machine definition.
    pub fn from_token(token: &str) -> Self {
        match token {
            "L" => Direction::Left,
            "R" => Direction::Right,
            other => Direction::Unknown(other.to_string()),
        }
    }

    /// Returns the token this direction is written as in a machine definition.
    pub fn token(&self) -> &str {
        match self {
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::Unknown(token) => token,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A single entry of the transition table: what to do after reading a symbol in a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine moves to.
    pub next_state: String,
    /// The symbol written to the cell under the head.
    pub write: char,
    /// Where the head moves afterwards.
    pub direction: Direction,
}

impl Transition {
    pub fn new(next_state: impl Into<String>, write: char, direction: Direction) -> Self {
        Self {
            next_state: next_state.into(),
            write,
            direction,
        }
    }
}

/// One step of a computation path, as recorded by the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The state the step was taken from.
    pub from: String,
    /// The symbol that was under the head.
    pub read: char,
    /// The state the step led to.
    pub to: String,
    /// The symbol written in place of `read`.
    pub write: char,
    /// The direction the head moved.
    pub direction: Direction,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, '{}') -> ({}, '{}', {})",
            self.from, self.read, self.to, self.write, self.direction
        )
    }
}

/// Represents the errors that can occur while loading or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// Indicates a syntax error, or a missing section, in a machine definition.
    #[error("Machine parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a machine definition that violates a structural invariant.
    #[error("Machine validation error: {0}")]
    ValidationError(String),
    /// Indicates an error reading machine definitions from the file system.
    #[error("File error: {0}")]
    FileError(String),
    /// A branch reached a transition whose direction is neither left nor right.
    #[error("Malformed machine: transition ({state}, '{symbol}') has invalid direction {direction:?}")]
    MalformedMachine {
        state: String,
        symbol: char,
        direction: String,
    },
}
