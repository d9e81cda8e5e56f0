//! Bundled sample machines, parsed once on first use.

use crate::definition::MachineDefinition;
use crate::types::TuringMachineError;

/// Embedded definition texts, each paired with an input it is meant to be run on.
const PROGRAM_TEXTS: [(&str, &str); 4] = [
    (include_str!("../machines/binary-increment.tm"), "1011"),
    (include_str!("../machines/even-zeros.tm"), "1001"),
    (include_str!("../machines/palindrome.tm"), "abba"),
    (include_str!("../machines/zeros-then-ones.tm"), "000111"),
];

/// A bundled machine together with its source text and a sample input.
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub definition: MachineDefinition,
    pub text: &'static str,
    pub sample_input: &'static str,
}

impl ProgramInfo {
    pub fn name(&self) -> &str {
        self.definition.name()
    }
}

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<ProgramInfo> = {
        let mut programs = Vec::new();

        for (text, sample_input) in PROGRAM_TEXTS {
            match crate::parser::parse(text) {
                Ok(definition) => programs.push(ProgramInfo {
                    index: programs.len(),
                    definition,
                    text,
                    sample_input,
                }),
                Err(e) => log::error!("Failed to parse bundled program: {}", e),
            }
        }

        programs
    };
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<&'static ProgramInfo, TuringMachineError> {
        PROGRAMS.get(index).ok_or_else(|| {
            TuringMachineError::UnknownProgram(format!("index {} out of range", index))
        })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<&'static ProgramInfo, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| TuringMachineError::UnknownProgram(format!("'{}'", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|program| program.definition.name()).collect()
    }

    /// Search for programs whose name contains `query`
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .filter(|program| program.name().to_lowercase().contains(&query))
            .map(|program| program.index)
            .collect()
    }

    /// Get the source text of a program by its index
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, TuringMachineError> {
        Self::get_program_by_index(index).map(|program| program.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Classification, TuringMachine};
    use crate::tape::Tape;

    fn run(name: &str, input: &str) -> (Classification, String) {
        let program = ProgramManager::get_program_by_name(name).unwrap();
        let tape = Tape::from_input(&program.definition, input).unwrap();
        let mut machine = TuringMachine::new(&program.definition, tape).unwrap();
        let outcome = machine.run().unwrap();
        (outcome.classification, machine.tape().to_string())
    }

    #[test]
    fn test_all_programs_parse() {
        assert_eq!(ProgramManager::get_program_count(), PROGRAM_TEXTS.len());
    }

    #[test]
    fn test_sample_inputs_halt() {
        for program in PROGRAMS.iter() {
            let tape = Tape::from_input(&program.definition, program.sample_input).unwrap();
            let mut machine = TuringMachine::new(&program.definition, tape).unwrap();
            let outcome = machine.run().unwrap();
            assert_ne!(
                outcome.classification,
                Classification::Aborted,
                "{} did not halt on its sample input",
                program.name()
            );
        }
    }

    #[test]
    fn test_get_program_by_index() {
        assert!(ProgramManager::get_program_by_index(0).is_ok());
        assert!(matches!(
            ProgramManager::get_program_by_index(999),
            Err(TuringMachineError::UnknownProgram(_))
        ));
    }

    #[test]
    fn test_get_program_by_name() {
        let program = ProgramManager::get_program_by_name("binary increment").unwrap();
        assert_eq!(program.name(), "Binary Increment");
        assert_eq!(program.text, PROGRAM_TEXTS[0].0);

        assert!(ProgramManager::get_program_by_name("Nonexistent").is_err());
    }

    #[test]
    fn test_list_and_search() {
        let names = ProgramManager::list_program_names();
        assert!(names.contains(&"Palindrome"));
        assert!(names.contains(&"Even Zeros"));

        assert_eq!(ProgramManager::search_programs("ZERO").len(), 2);
        assert!(ProgramManager::search_programs("nonexistent").is_empty());
    }

    #[test]
    fn test_program_text_by_index() {
        let text = ProgramManager::get_program_text_by_index(1).unwrap();
        assert!(text.contains("NAME: Even Zeros"));
        assert!(ProgramManager::get_program_text_by_index(999).is_err());
    }

    #[test]
    fn test_binary_increment() {
        assert_eq!(run("Binary Increment", "11"), (Classification::Accepted, "100".into()));
        assert_eq!(run("Binary Increment", "1011"), (Classification::Accepted, "1100".into()));
        assert_eq!(run("Binary Increment", ""), (Classification::Accepted, "1".into()));
    }

    #[test]
    fn test_even_zeros() {
        assert_eq!(run("Even Zeros", "1001").0, Classification::Accepted);
        assert_eq!(run("Even Zeros", "").0, Classification::Accepted);
        assert_eq!(run("Even Zeros", "0111").0, Classification::Rejected);
    }

    #[test]
    fn test_palindrome() {
        for input in ["", "a", "abba", "aba", "babbab"] {
            assert_eq!(run("Palindrome", input).0, Classification::Accepted, "{input}");
        }
        for input in ["ab", "abb", "aab"] {
            assert_eq!(run("Palindrome", input).0, Classification::Rejected, "{input}");
        }
    }

    #[test]
    fn test_zeros_then_ones() {
        for input in ["", "01", "0011", "000111"] {
            assert_eq!(run("Zeros Then Ones", input).0, Classification::Accepted, "{input}");
        }
        for input in ["0", "1", "10", "001", "011", "0101"] {
            assert_eq!(run("Zeros Then Ones", input).0, Classification::Rejected, "{input}");
        }
    }
}
