//! This module defines the immutable `MachineDefinition` (the formal 7-tuple) and the
//! `DefinitionBuilder` that validates raw fields before any machine is run.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{
    Alphabet, Direction, State, StateSet, Symbol, TuringMachineError, DEFAULT_BLANK_SYMBOL,
};

/// The right-hand side of a transition: where to go, what to write, and where to move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine enters.
    pub next_state: State,
    /// The symbol written under the head.
    pub write: Symbol,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

/// A transition record as it appears in a definition, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTransition {
    /// `state read next write direction`
    Full {
        state: String,
        read: String,
        next: String,
        write: String,
        direction: String,
    },
    /// `state read next`, only valid when `next` is the accept or reject state.
    Shorthand {
        state: String,
        read: String,
        next: String,
    },
}

impl RawTransition {
    /// Builds a record from the whitespace-separated tokens of one definition line.
    ///
    /// Returns `None` unless there are exactly three or five tokens.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        let token = |i: usize| tokens[i].as_ref().to_string();
        match tokens.len() {
            5 => Some(RawTransition::Full {
                state: token(0),
                read: token(1),
                next: token(2),
                write: token(3),
                direction: token(4),
            }),
            3 => Some(RawTransition::Shorthand {
                state: token(0),
                read: token(1),
                next: token(2),
            }),
            _ => None,
        }
    }

    pub fn state(&self) -> &str {
        match self {
            RawTransition::Full { state, .. } | RawTransition::Shorthand { state, .. } => state,
        }
    }

    pub fn read(&self) -> &str {
        match self {
            RawTransition::Full { read, .. } | RawTransition::Shorthand { read, .. } => read,
        }
    }

    pub fn next(&self) -> &str {
        match self {
            RawTransition::Full { next, .. } | RawTransition::Shorthand { next, .. } => next,
        }
    }
}

impl fmt::Display for RawTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTransition::Full {
                state,
                read,
                next,
                write,
                direction,
            } => write!(f, "{state} {read} {next} {write} {direction}"),
            RawTransition::Shorthand { state, read, next } => write!(f, "{state} {read} {next}"),
        }
    }
}

/// Options that change how strictly a definition is validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Only allow ASCII characters in declared states and symbols.
    pub strict: bool,
}

impl ValidationOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// A validated, immutable single-tape Turing machine.
///
/// Instances can only be obtained from [`DefinitionBuilder::build`], so every invariant of
/// the formal model holds for the lifetime of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDefinition {
    name: String,
    states: StateSet,
    input_alphabet: Alphabet,
    tape_alphabet: Alphabet,
    blank: Symbol,
    start: State,
    accept: State,
    reject: State,
    transitions: HashMap<(State, Symbol), Transition>,
}

impl MachineDefinition {
    pub fn builder() -> DefinitionBuilder {
        DefinitionBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &StateSet {
        &self.states
    }

    pub fn input_alphabet(&self) -> &Alphabet {
        &self.input_alphabet
    }

    pub fn tape_alphabet(&self) -> &Alphabet {
        &self.tape_alphabet
    }

    pub fn blank(&self) -> &Symbol {
        &self.blank
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    pub fn accept(&self) -> &State {
        &self.accept
    }

    pub fn reject(&self) -> &State {
        &self.reject
    }

    /// Looks up the transition for `state` reading `symbol`.
    pub fn transition(&self, state: &State, symbol: &Symbol) -> Option<&Transition> {
        // Cloning a token only bumps a reference count.
        self.transitions.get(&(state.clone(), symbol.clone()))
    }

    /// Iterates over every `(state, symbol) -> transition` entry, in no particular order.
    pub fn transitions(&self) -> impl Iterator<Item = (&State, &Symbol, &Transition)> + '_ {
        self.transitions
            .iter()
            .map(|((state, symbol), transition)| (state, symbol, transition))
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Tape symbols that are neither input symbols nor the blank.
    pub fn tape_only_symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.tape_alphabet
            .iter()
            .filter(|symbol| !self.input_alphabet.contains(*symbol) && **symbol != self.blank)
    }

    /// Returns `true` for the accept and reject states.
    pub fn is_final(&self, state: &State) -> bool {
        *state == self.accept || *state == self.reject
    }
}

/// Accumulates the raw fields of a machine and validates them into a [`MachineDefinition`].
///
/// Fields may be supplied in any order. Nothing is checked until [`DefinitionBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct DefinitionBuilder {
    name: Option<String>,
    states: Option<Vec<String>>,
    input_alphabet: Option<Vec<String>>,
    tape_alphabet: Option<Vec<String>>,
    blank: Option<String>,
    start: Option<String>,
    accept: Option<String>,
    reject: Option<String>,
    transitions: Option<Vec<RawTransition>>,
    options: ValidationOptions,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    pub fn input_alphabet<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_alphabet = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn tape_alphabet<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tape_alphabet = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the blank symbol. Defaults to [`DEFAULT_BLANK_SYMBOL`].
    pub fn blank(mut self, blank: impl Into<String>) -> Self {
        self.blank = Some(blank.into());
        self
    }

    pub fn start(mut self, state: impl Into<String>) -> Self {
        self.start = Some(state.into());
        self
    }

    pub fn accept(mut self, state: impl Into<String>) -> Self {
        self.accept = Some(state.into());
        self
    }

    pub fn reject(mut self, state: impl Into<String>) -> Self {
        self.reject = Some(state.into());
        self
    }

    /// Opens the transition section. A definition without one is incomplete, even if it
    /// would contain no records.
    pub fn transitions<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = RawTransition>,
    {
        self.transitions
            .get_or_insert_with(Vec::new)
            .extend(records);
        self
    }

    /// Adds one full `state read next write direction` record.
    pub fn transition(
        self,
        state: &str,
        read: &str,
        next: &str,
        write: &str,
        direction: &str,
    ) -> Self {
        self.transitions([RawTransition::Full {
            state: state.into(),
            read: read.into(),
            next: next.into(),
            write: write.into(),
            direction: direction.into(),
        }])
    }

    /// Adds one shorthand `state read next` record.
    pub fn halting_transition(self, state: &str, read: &str, next: &str) -> Self {
        self.transitions([RawTransition::Shorthand {
            state: state.into(),
            read: read.into(),
            next: next.into(),
        }])
    }

    pub fn options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the accumulated fields and produces an immutable definition.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// required fields, strict-mode characters, special states, alphabet containment,
    /// and finally each transition record in the order it was supplied.
    pub fn build(self) -> Result<MachineDefinition, TuringMachineError> {
        let states = check_required(self.states, "STATE")?;
        let input_alphabet = check_required(self.input_alphabet, "SIGMA")?;
        let tape_alphabet = check_required(self.tape_alphabet, "GAMMA")?;
        let start = check_required(self.start, "START")?;
        let accept = check_required(self.accept, "ACCEPT")?;
        let reject = check_required(self.reject, "REJECT")?;
        let records = check_required(self.transitions, "DELTA")?;
        let blank = self
            .blank
            .unwrap_or_else(|| DEFAULT_BLANK_SYMBOL.to_string());

        if states.is_empty() {
            return Err(TuringMachineError::MissingRequiredField("STATE".into()));
        }

        check_tokens(&states, "STATE", self.options)?;
        check_tokens(&input_alphabet, "SIGMA", self.options)?;
        check_tokens(&tape_alphabet, "GAMMA", self.options)?;

        let states: StateSet = states.into_iter().map(State::from).collect();
        let input_alphabet: Alphabet = input_alphabet.into_iter().map(Symbol::from).collect();
        let tape_alphabet: Alphabet = tape_alphabet.into_iter().map(Symbol::from).collect();

        let start = check_state(&states, start, "START")?;
        let accept = check_state(&states, accept, "ACCEPT")?;
        let reject = check_state(&states, reject, "REJECT")?;

        if let Some(symbol) = input_alphabet.first_missing_from(&tape_alphabet) {
            return Err(TuringMachineError::NonAlphabetSymbol {
                symbol: symbol.to_string(),
                context: "SIGMA (every input symbol must also be in GAMMA)".into(),
            });
        }

        let blank = Symbol::from(blank);
        if !tape_alphabet.contains(&blank) || input_alphabet.contains(&blank) {
            return Err(TuringMachineError::NonAlphabetSymbol {
                symbol: blank.to_string(),
                context: "BLANK (the blank must be in GAMMA but not in SIGMA)".into(),
            });
        }

        let mut transitions = HashMap::with_capacity(records.len());
        for record in &records {
            let (key, transition) =
                check_transition(record, &states, &tape_alphabet, &blank, &accept, &reject)?;

            if transitions.contains_key(&key) {
                return Err(TuringMachineError::AmbiguousTransition {
                    state: key.0.to_string(),
                    symbol: key.1.to_string(),
                    record: record.to_string(),
                });
            }
            transitions.insert(key, transition);
        }

        let definition = MachineDefinition {
            name: self.name.unwrap_or_default(),
            states,
            input_alphabet,
            tape_alphabet,
            blank,
            start,
            accept,
            reject,
            transitions,
        };

        debug!(
            "built machine '{}': {} states, {} tape symbols, {} transitions",
            definition.name,
            definition.states.len(),
            definition.tape_alphabet.len(),
            definition.transitions.len()
        );

        Ok(definition)
    }
}

/// Checks if a required field is present, returning an `Err` naming it if not.
fn check_required<T>(value: Option<T>, field: &str) -> Result<T, TuringMachineError> {
    value.ok_or_else(|| TuringMachineError::MissingRequiredField(field.to_string()))
}

/// Rejects empty tokens, tokens with whitespace, and (in strict mode) non-ASCII tokens.
fn check_tokens(
    tokens: &[String],
    field: &str,
    options: ValidationOptions,
) -> Result<(), TuringMachineError> {
    for token in tokens {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(TuringMachineError::NonAlphabetSymbol {
                symbol: token.clone(),
                context: format!("{field} (tokens must be non-empty and contain no whitespace)"),
            });
        }

        if options.strict && !token.is_ascii() {
            return Err(TuringMachineError::NonAlphabetSymbol {
                symbol: token.clone(),
                context: format!("{field} (strict mode allows only ASCII characters)"),
            });
        }
    }

    Ok(())
}

fn check_state(
    states: &StateSet,
    label: String,
    context: &str,
) -> Result<State, TuringMachineError> {
    if !states.contains(label.as_str()) {
        return Err(TuringMachineError::UnknownStateReference {
            state: label,
            context: context.to_string(),
        });
    }

    Ok(State::from(label))
}

fn check_symbol(
    alphabet: &Alphabet,
    token: &str,
    record: &RawTransition,
) -> Result<Symbol, TuringMachineError> {
    if !alphabet.contains(token) {
        return Err(TuringMachineError::NonAlphabetSymbol {
            symbol: token.to_string(),
            context: format!("transition '{record}' (not in GAMMA)"),
        });
    }

    Ok(Symbol::from(token))
}

/// Validates one transition record and converts it into a keyed transition.
fn check_transition(
    record: &RawTransition,
    states: &StateSet,
    tape_alphabet: &Alphabet,
    blank: &Symbol,
    accept: &State,
    reject: &State,
) -> Result<((State, Symbol), Transition), TuringMachineError> {
    let context = || format!("transition '{record}'");

    let state = check_state(states, record.state().to_string(), &context())?;
    let read = check_symbol(tape_alphabet, record.read(), record)?;
    let next_state = check_state(states, record.next().to_string(), &context())?;

    let transition = match record {
        RawTransition::Shorthand { .. } => {
            if next_state != *accept && next_state != *reject {
                return Err(TuringMachineError::IncompleteTransitionRecord {
                    record: record.to_string(),
                    accept: accept.to_string(),
                    reject: reject.to_string(),
                });
            }

            // Never applied: entering accept or reject neither writes nor moves.
            Transition {
                next_state,
                write: blank.clone(),
                direction: Direction::Left,
            }
        }
        RawTransition::Full {
            write, direction, ..
        } => Transition {
            next_state,
            write: check_symbol(tape_alphabet, write, record)?,
            direction: Direction::from_token(direction, &record.to_string())?,
        },
    };

    Ok(((state, read), transition))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DefinitionBuilder {
        MachineDefinition::builder()
            .name("Test")
            .states(["q0", "q1", "qa", "qr"])
            .input_alphabet(["0", "1"])
            .tape_alphabet(["0", "1", "B"])
            .start("q0")
            .accept("qa")
            .reject("qr")
    }

    #[test]
    fn test_build_simple_definition() {
        let definition = base()
            .transition("q0", "0", "q1", "1", "R")
            .halting_transition("q1", "B", "qa")
            .build()
            .unwrap();

        assert_eq!(definition.name(), "Test");
        assert_eq!(definition.states().len(), 4);
        assert_eq!(definition.blank(), &Symbol::from("B"));
        assert_eq!(definition.transition_count(), 2);

        let transition = definition
            .transition(&"q0".into(), &"0".into())
            .unwrap();
        assert_eq!(
            transition,
            &Transition {
                next_state: "q1".into(),
                write: "1".into(),
                direction: Direction::Right,
            }
        );
        assert!(definition.transition(&"q1".into(), &"0".into()).is_none());
    }

    #[test]
    fn test_shorthand_is_stored_as_blank_left() {
        let definition = base()
            .halting_transition("q0", "1", "qr")
            .build()
            .unwrap();

        let transition = definition
            .transition(&"q0".into(), &"1".into())
            .unwrap();
        assert_eq!(transition.next_state, "qr");
        assert_eq!(transition.write, "B");
        assert_eq!(transition.direction, Direction::Left);
    }

    #[test]
    fn test_empty_transition_section_is_allowed() {
        let definition = base().transitions([]).build().unwrap();
        assert_eq!(definition.transition_count(), 0);
    }

    #[test]
    fn test_missing_fields_are_reported_in_order() {
        let error = MachineDefinition::builder().build().unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MissingRequiredField("STATE".into())
        );

        let error = MachineDefinition::builder()
            .states(["q0"])
            .input_alphabet(["0"])
            .tape_alphabet(["0", "B"])
            .start("q0")
            .accept("q0")
            .build()
            .unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MissingRequiredField("REJECT".into())
        );
    }

    #[test]
    fn test_missing_transition_section() {
        let error = base().build().unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MissingRequiredField("DELTA".into())
        );
    }

    #[test]
    fn test_empty_state_set() {
        let error = base()
            .states(Vec::<String>::new())
            .transitions([])
            .build()
            .unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MissingRequiredField("STATE".into())
        );
    }

    #[test]
    fn test_unknown_start_state() {
        let error = base().start("q9").transitions([]).build().unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::UnknownStateReference { ref state, ref context }
                if state == "q9" && context == "START"
        ));
    }

    #[test]
    fn test_input_alphabet_must_be_subset() {
        let error = base()
            .input_alphabet(["0", "1", "2"])
            .transitions([])
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol == "2"
        ));
    }

    #[test]
    fn test_blank_must_not_be_input_symbol() {
        let error = base()
            .input_alphabet(["0", "1", "B"])
            .transitions([])
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol == "B"
        ));
    }

    #[test]
    fn test_custom_blank_must_be_in_tape_alphabet() {
        let error = base().blank("_").transitions([]).build().unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol == "_"
        ));

        let definition = base()
            .tape_alphabet(["0", "1", "_"])
            .blank("_")
            .transitions([])
            .build()
            .unwrap();
        assert_eq!(definition.blank(), "_");
    }

    #[test]
    fn test_unknown_source_state() {
        let error = base()
            .transition("q7", "0", "q1", "1", "R")
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::UnknownStateReference { ref state, .. } if state == "q7"
        ));
    }

    #[test]
    fn test_unknown_destination_state() {
        let error = base()
            .transition("q0", "0", "q7", "1", "R")
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::UnknownStateReference { ref state, .. } if state == "q7"
        ));
    }

    #[test]
    fn test_read_symbol_outside_tape_alphabet() {
        let error = base()
            .transition("q0", "2", "q1", "1", "R")
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol == "2"
        ));
    }

    #[test]
    fn test_write_symbol_outside_tape_alphabet() {
        let error = base()
            .transition("q0", "0", "q1", "X", "R")
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol == "X"
        ));
    }

    #[test]
    fn test_invalid_direction() {
        let error = base()
            .transition("q0", "0", "q1", "1", "S")
            .build()
            .unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::InvalidDirection {
                direction: "S".into(),
                record: "q0 0 q1 1 S".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_key_is_ambiguous() {
        let error = base()
            .transition("q0", "0", "q1", "1", "R")
            .transition("q0", "0", "q0", "0", "L")
            .build()
            .unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::AmbiguousTransition {
                state: "q0".into(),
                symbol: "0".into(),
                record: "q0 0 q0 0 L".into(),
            }
        );
    }

    #[test]
    fn test_shorthand_to_ordinary_state_is_incomplete() {
        let error = base().halting_transition("q0", "0", "q1").build().unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::IncompleteTransitionRecord {
                record: "q0 0 q1".into(),
                accept: "qa".into(),
                reject: "qr".into(),
            }
        );
    }

    #[test]
    fn test_strict_mode_rejects_non_ascii_tokens() {
        let lenient = base()
            .states(["q0", "q1", "qa", "qr", "qλ"])
            .transitions([])
            .build();
        assert!(lenient.is_ok());

        let error = base()
            .states(["q0", "q1", "qa", "qr", "qλ"])
            .transitions([])
            .options(ValidationOptions::strict())
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol == "qλ"
        ));
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let error = base()
            .input_alphabet(["0", ""])
            .transitions([])
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::NonAlphabetSymbol { ref symbol, .. } if symbol.is_empty()
        ));
    }

    #[test]
    fn test_tape_only_symbols() {
        let definition = base()
            .tape_alphabet(["0", "1", "X", "B"])
            .transitions([])
            .build()
            .unwrap();

        let extra: Vec<&str> = definition.tape_only_symbols().map(Symbol::as_str).collect();
        assert_eq!(extra, vec!["X"]);
    }

    #[test]
    fn test_raw_transition_from_tokens() {
        assert_eq!(
            RawTransition::from_tokens(&["q0", "0", "qa"]),
            Some(RawTransition::Shorthand {
                state: "q0".into(),
                read: "0".into(),
                next: "qa".into(),
            })
        );
        assert!(RawTransition::from_tokens(&["q0", "0", "q1", "1"]).is_none());
        assert_eq!(
            RawTransition::from_tokens(&["q0", "0", "q1", "1", "R"])
                .unwrap()
                .to_string(),
            "q0 0 q1 1 R"
        );
    }
}
