//! This crate provides the core logic for a single-tape Turing machine interpreter.
//! It includes modules for parsing machine definitions, validating them, running them
//! step by step against a tape, and a small collection of bundled sample machines.

pub mod definition;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the definition model and its builder.
pub use definition::{
    DefinitionBuilder, MachineDefinition, RawTransition, Transition, ValidationOptions,
};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the execution engine and the values it reports.
pub use machine::{
    Classification, HaltReason, Outcome, RunConfig, Status, Step, StepObserver, StepRecord,
    TuringMachine,
};
/// Re-exports the parsing entry points from the parser module.
pub use parser::{parse, parse_with_options};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the core value types and the error enum from the types module.
pub use types::{
    Alphabet, Direction, State, StateSet, Symbol, TokenSet, TuringMachineError,
    DEFAULT_BLANK_SYMBOL, MAX_PROGRAM_SIZE,
};
