use crate::machine::Machine;
use crate::parser::parse;
use crate::types::TuringMachineError;

use std::sync::RwLock;
use tracing::warn;

// Default embedded machines
const MACHINE_TEXTS: [&str; 6] = [
    include_str!("../machines/equal-01s.csv"),
    include_str!("../machines/equal-01s-dtm.csv"),
    include_str!("../machines/a-plus.csv"),
    include_str!("../machines/a-plus-dtm.csv"),
    include_str!("../machines/abc-star.csv"),
    include_str!("../machines/abc-star-dtm.csv"),
];

lazy_static::lazy_static! {
    pub static ref MACHINES: RwLock<Vec<Machine>> = RwLock::new(Vec::new());
}

pub struct MachineManager;

impl MachineManager {
    /// Parse the embedded machines into the registry, once.
    pub fn load() -> Result<(), TuringMachineError> {
        let mut write_guard = MACHINES.write().map_err(|_| {
            TuringMachineError::FileError("Failed to acquire write lock".to_string())
        })?;

        if !write_guard.is_empty() {
            return Ok(());
        }

        for (index, text) in MACHINE_TEXTS.iter().enumerate() {
            match parse(text) {
                Ok(machine) => write_guard.push(machine),
                Err(e) => warn!(index, error = %e, "failed to parse embedded machine"),
            }
        }

        Ok(())
    }

    /// Get the number of available machines
    pub fn get_machine_count() -> usize {
        let _ = Self::load();

        MACHINES.read().map(|machines| machines.len()).unwrap_or(0)
    }

    /// Get a machine by its index
    pub fn get_machine_by_index(index: usize) -> Result<Machine, TuringMachineError> {
        let _ = Self::load();

        MACHINES
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Machine index {} out of range", index))
            })
    }

    /// Get a machine by its name, ignoring case
    pub fn get_machine_by_name(name: &str) -> Result<Machine, TuringMachineError> {
        let _ = Self::load();

        MACHINES
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|machine| machine.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Machine '{}' not found", name))
            })
    }

    /// List all machine names
    pub fn list_machine_names() -> Vec<String> {
        let _ = Self::load();

        MACHINES
            .read()
            .map(|machines| machines.iter().map(|machine| machine.name.clone()).collect())
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get information about a machine by its index
    pub fn get_machine_info(index: usize) -> Result<MachineInfo, TuringMachineError> {
        let machine = Self::get_machine_by_index(index)?;

        Ok(MachineInfo {
            index,
            name: machine.name.clone(),
            start_state: machine.start_state.clone(),
            state_count: machine.states.len(),
            transition_count: machine.transition_count(),
            deterministic: machine.is_deterministic(),
        })
    }

    /// Get the original text of a machine by its index
    pub fn get_machine_text_by_index(index: usize) -> Result<&'static str, TuringMachineError> {
        MACHINE_TEXTS.get(index).copied().ok_or_else(|| {
            TuringMachineError::ValidationError(format!(
                "Machine text index {} out of range",
                index
            ))
        })
    }
}

#[derive(Debug, Clone)]
pub struct MachineInfo {
    pub index: usize,
    pub name: String,
    pub start_state: String,
    pub state_count: usize,
    pub transition_count: usize,
    pub deterministic: bool,
}
