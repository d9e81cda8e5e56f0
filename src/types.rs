//! This module defines the core data structures and types used throughout the Turing Machine
//! interpreter: symbols, states, directions, ordered token sets, and the error type.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;

use crate::Rule;

/// The blank symbol used when a definition does not declare one.
pub const DEFAULT_BLANK_SYMBOL: &str = "B";
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// Declares a cheaply clonable, interned-by-content token type.
macro_rules! token_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(token: impl Into<Arc<str>>) -> Self {
                Self(token.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                Self::new(token)
            }
        }

        impl From<String> for $name {
            fn from(token: String) -> Self {
                Self::new(token)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }
    };
}

token_type!(
    /// An atomic tape symbol. Equality is exact token match; a symbol may span several characters.
    Symbol
);

token_type!(
    /// An atomic machine state label.
    State
);

/// Represents the possible directions the tape head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Parses a direction token as written in a transition record (`L` or `R`).
    ///
    /// `record` is only used to give the error some context.
    pub fn from_token(token: &str, record: &str) -> Result<Self, TuringMachineError> {
        match token {
            "L" => Ok(Direction::Left),
            "R" => Ok(Direction::Right),
            _ => Err(TuringMachineError::InvalidDirection {
                direction: token.to_string(),
                record: record.to_string(),
            }),
        }
    }

    /// The single-letter token for this direction.
    pub fn token(&self) -> &'static str {
        match self {
            Direction::Left => "L",
            Direction::Right => "R",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A set of tokens that remembers declaration order.
///
/// Membership checks are hash lookups; iteration yields tokens in the order they
/// were first inserted, which keeps diagnostics and rendering stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet<T: Eq + Hash> {
    order: Vec<T>,
    members: HashSet<T>,
}

/// The input or tape alphabet of a machine.
pub type Alphabet = TokenSet<Symbol>;
/// The state set of a machine.
pub type StateSet = TokenSet<State>;

impl<T: Clone + Eq + Hash> TokenSet<T> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Inserts a token, returning `false` if it was already present.
    pub fn insert(&mut self, token: T) -> bool {
        if self.members.contains(&token) {
            return false;
        }
        self.members.insert(token.clone());
        self.order.push(token);
        true
    }

    pub fn contains<Q>(&self, token: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.members.contains(token)
    }

    /// Returns the first token (in declaration order) that is not a member of `other`.
    pub fn first_missing_from<'a>(&'a self, other: &TokenSet<T>) -> Option<&'a T> {
        self.order.iter().find(|token| !other.contains(*token))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T: Clone + Eq + Hash> Default for TokenSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> FromIterator<T> for TokenSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

impl<'a, T: Clone + Eq + Hash> IntoIterator for &'a TokenSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Represents the errors that can occur while building or running a Turing Machine.
///
/// Every variant is fatal. Accepting, rejecting and aborting are not errors; they are
/// reported through [`crate::machine::Outcome`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A required definition field was never supplied.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    /// A state label that is not part of the declared state set.
    #[error("Unknown state '{state}' referenced in {context}")]
    UnknownStateReference { state: String, context: String },
    /// A declared token or transition symbol falls outside its allowed alphabet.
    #[error("Symbol '{symbol}' is not allowed in {context}")]
    NonAlphabetSymbol { symbol: String, context: String },
    /// Two transition records share the same `(state, symbol)` key.
    #[error("Ambiguous transition: state '{state}' already has a rule for '{symbol}' (at '{record}')")]
    AmbiguousTransition {
        state: String,
        symbol: String,
        record: String,
    },
    /// A shorthand record whose destination is neither the accept nor the reject state.
    #[error("Transition '{record}' gives no symbol to write or direction to move, but its destination is not the accept ({accept}) or reject ({reject}) state")]
    IncompleteTransitionRecord {
        record: String,
        accept: String,
        reject: String,
    },
    /// A direction token other than `L` or `R`.
    #[error("Invalid direction '{direction}' in transition '{record}', expected L or R")]
    InvalidDirection { direction: String, record: String },
    /// A tape symbol outside the alphabet it must belong to.
    #[error("Symbol '{0}' on tape is not in the alphabet")]
    SymbolNotInAlphabet(String),
    /// The engine was asked to write a symbol outside the tape alphabet.
    #[error("Transition writes symbol '{0}' which is not in the tape alphabet")]
    InvalidWriteSymbol(String),
    /// Indicates an error during the parsing of a machine definition.
    #[error("Definition parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// A tape built for another blank or tape alphabet than the machine's definition.
    #[error("Tape does not fit the machine definition: {0}")]
    IncompatibleTape(String),
    /// No bundled program matches the requested name or index.
    #[error("Unknown program: {0}")]
    UnknownProgram(String),
}
