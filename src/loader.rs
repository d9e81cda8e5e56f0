//! This module provides the `ProgramLoader` struct, responsible for loading machine
//! definitions and tape inputs from files and strings.

use crate::definition::{MachineDefinition, ValidationOptions};
use crate::parser::parse_with_options;
use crate::types::{TuringMachineError, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// The file extension of machine definition files.
pub const DEFINITION_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading machine definitions.
/// It provides methods to load definitions from individual files, from string content,
/// and to discover and load all `.tm` files within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single machine definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if the file is successfully read, parsed and validated.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read or is too large.
    /// * Any parse or validation error otherwise.
    pub fn load_program(
        path: &Path,
        options: ValidationOptions,
    ) -> Result<MachineDefinition, TuringMachineError> {
        let content = read_file(path)?;

        if content.len() > MAX_PROGRAM_SIZE {
            return Err(TuringMachineError::FileError(format!(
                "Definition {} is larger than {} bytes",
                path.display(),
                MAX_PROGRAM_SIZE
            )));
        }

        parse_with_options(&content, options)
    }

    /// Loads a single machine definition from the provided string content.
    pub fn load_program_from_string(
        content: &str,
        options: ValidationOptions,
    ) -> Result<MachineDefinition, TuringMachineError> {
        parse_with_options(content, options)
    }

    /// Reads tape input from a file, dropping line breaks.
    ///
    /// The text still has to be tokenized against a definition; see
    /// [`crate::tape::Tape::from_input`].
    pub fn load_tape(path: &Path) -> Result<String, TuringMachineError> {
        let content = read_file(path)?;
        Ok(content.lines().collect())
    }

    /// Loads all machine definitions (`.tm` extension) from a given directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// is either the path and definition, or the error met while loading that file.
    pub fn load_programs(
        directory: &Path,
        options: ValidationOptions,
    ) -> Vec<Result<(PathBuf, MachineDefinition), TuringMachineError>> {
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

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir()
                    || path
                        .extension()
                        .is_none_or(|ext| ext != DEFINITION_EXTENSION)
                {
                    return None;
                }

                Some(Self::load_program(&path, options).map(|definition| (path, definition)))
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by_key(|result| match result {
            Ok((path, _)) => Some(path.clone()),
            Err(_) => None,
        });

        results
    }
}

fn read_file(path: &Path) -> Result<String, TuringMachineError> {
    fs::read_to_string(path).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}
