//! This module provides the `MachineLoader` struct, responsible for loading machine definitions
//! from files, directories and strings.

use crate::machine::Machine;
use crate::parser::parse;
use crate::types::TuringMachineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The file extension of tabular machine definitions.
pub const MACHINE_EXTENSION: &str = "csv";

/// `MachineLoader` is a utility struct for loading machine definitions.
/// It provides methods to load a machine from a file or from string content,
/// and to discover and load every `.csv` file within a directory.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read, parsed and validated.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError)` if the file content is not a valid definition.
    pub fn load_machine(path: &Path) -> Result<Machine, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), bytes = content.len(), "loading machine");
        parse(&content)
    }

    /// Loads a single machine from the provided string content.
    pub fn load_machine_from_string(content: &str) -> Result<Machine, TuringMachineError> {
        parse(content)
    }

    /// Loads every machine definition (`.csv` extension) from a given directory.
    ///
    /// Directories and files with other extensions are skipped. Results are sorted by path so
    /// the order does not depend on the file system.
    ///
    /// # Returns
    ///
    /// * `Vec<Result<(PathBuf, Machine), TuringMachineError>>` - one element per candidate file,
    ///   holding either the loaded machine or the error that prevented loading it.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Machine), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();

        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(TuringMachineError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }

        paths.sort();

        results.extend(
            paths
                .into_iter()
                .filter(|path| {
                    !path.is_dir() && path.extension().is_some_and(|ext| ext == MACHINE_EXTENSION)
                })
                .map(|path| match Self::load_machine(&path) {
                    Ok(machine) => Ok((path, machine)),
                    Err(e) => Err(TuringMachineError::FileError(format!(
                        "Failed to load machine from {}: {}",
                        path.display(),
                        e
                    ))),
                }),
        );

        results
    }
}
