//! This crate provides the core logic for tracing nondeterministic Turing Machines.
//! It includes modules for loading machine definitions from a tabular format, validating them,
//! exploring every computation branch breadth-first, and reporting the outcome.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod report;
pub mod simulator;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the `Machine` struct from the machine module.
pub use machine::Machine;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `MachineInfo`, `MachineManager`, and `MACHINES` from the programs module.
pub use programs::{MachineInfo, MachineManager, MACHINES};
/// Re-exports the plain-text and machine-readable report types.
pub use report::{FinalTape, Report, Summary};
/// Re-exports the breadth-first simulator and the types describing a run.
pub use simulator::{simulate, Outcome, RunOptions, RunStats, Simulator, Tape, Trace, Verdict};
/// Re-exports the machine building blocks and error type from the types module.
pub use types::{
    Direction, Step, Transition, TuringMachineError, BLANK_SYMBOL, DEFAULT_MAX_DEPTH,
    MAX_MACHINE_SIZE,
};
