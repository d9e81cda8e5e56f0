//! This module defines the `Tape`, an unbounded single-head tape that grows on demand in
//! both directions.
//!
//! Cells live in a `VecDeque`, so materializing a blank cell at either end is amortized
//! O(1). The tape remembers where the leftmost input cell sits inside the buffer,
//! which gives every cell a stable signed position for diagnostics.

use std::collections::VecDeque;
use std::fmt;

use crate::definition::MachineDefinition;
use crate::types::{Alphabet, Direction, Symbol, TuringMachineError};

/// A single-tape Turing machine tape with one read/write head.
#[derive(Debug, Clone)]
pub struct Tape<'a> {
    cells: VecDeque<Symbol>,
    head: usize,
    /// Buffer index of the cell that was leftmost when the tape was created.
    origin: usize,
    blank: Symbol,
    alphabet: &'a Alphabet,
}

impl<'a> Tape<'a> {
    /// Creates a tape holding `initial`, with the head on the leftmost symbol.
    ///
    /// Every initial symbol must belong to `input_alphabet` or be the blank. An empty input
    /// yields a tape with a single blank cell under the head.
    ///
    /// # Errors
    ///
    /// * `TuringMachineError::SymbolNotInAlphabet` for the first offending symbol.
    pub fn new(
        initial: Vec<Symbol>,
        input_alphabet: &Alphabet,
        tape_alphabet: &'a Alphabet,
        blank: Symbol,
    ) -> Result<Self, TuringMachineError> {
        if let Some(symbol) = initial
            .iter()
            .find(|symbol| **symbol != blank && !input_alphabet.contains(*symbol))
        {
            return Err(TuringMachineError::SymbolNotInAlphabet(symbol.to_string()));
        }

        let mut cells = VecDeque::from(initial);
        if cells.is_empty() {
            cells.push_back(blank.clone());
        }

        Ok(Self {
            cells,
            head: 0,
            origin: 0,
            blank,
            alphabet: tape_alphabet,
        })
    }

    /// Creates a tape for `definition` from already tokenized input.
    pub fn for_definition(
        definition: &'a MachineDefinition,
        initial: Vec<Symbol>,
    ) -> Result<Self, TuringMachineError> {
        Self::new(
            initial,
            definition.input_alphabet(),
            definition.tape_alphabet(),
            definition.blank().clone(),
        )
    }

    /// Creates a tape for `definition` from raw input text.
    ///
    /// See [`Tape::tokenize`] for how the text is split into symbols.
    pub fn from_input(
        definition: &'a MachineDefinition,
        input: &str,
    ) -> Result<Self, TuringMachineError> {
        let symbols = Self::tokenize(input, definition.input_alphabet(), definition.blank())?;
        Self::for_definition(definition, symbols)
    }

    /// Splits input text into symbols of `input_alphabet ∪ {blank}`.
    ///
    /// Whitespace is removed first. Among all ways of splitting the remaining text, the one
    /// that takes the longest possible symbol at each point is chosen, so single-character
    /// alphabets behave as one symbol per character.
    ///
    /// # Errors
    ///
    /// * `TuringMachineError::SymbolNotInAlphabet` naming the character at the furthest
    ///   point any split of the text can reach.
    pub fn tokenize(
        input: &str,
        input_alphabet: &Alphabet,
        blank: &Symbol,
    ) -> Result<Vec<Symbol>, TuringMachineError> {
        let text: String = input.split_whitespace().collect();

        let mut candidates: Vec<&Symbol> = input_alphabet
            .iter()
            .chain(std::iter::once(blank))
            .collect();
        candidates.sort_by_key(|symbol| std::cmp::Reverse(symbol.as_str().len()));

        // next[i] is the symbol that starts a complete split of text[i..].
        let end = text.len();
        let mut next: Vec<Option<&Symbol>> = vec![None; end + 1];
        let mut complete = vec![false; end + 1];
        complete[end] = true;

        for start in (0..end).rev().filter(|&i| text.is_char_boundary(i)) {
            let rest = &text[start..];
            next[start] = candidates.iter().copied().find(|symbol| {
                rest.starts_with(symbol.as_str()) && complete[start + symbol.as_str().len()]
            });
            complete[start] = next[start].is_some();
        }

        if !complete[0] {
            let offending = Self::furthest_reach(&text, &candidates);
            return Err(TuringMachineError::SymbolNotInAlphabet(offending));
        }

        let mut symbols = Vec::new();
        let mut start = 0;
        while let Some(symbol) = next[start] {
            symbols.push(symbol.clone());
            start += symbol.as_str().len();
        }

        Ok(symbols)
    }

    /// Returns the character at the furthest offset reachable by matching symbols from the
    /// start of `text`.
    fn furthest_reach(text: &str, candidates: &[&Symbol]) -> String {
        let mut reachable = vec![false; text.len() + 1];
        reachable[0] = true;
        let mut furthest = 0;

        for start in 0..text.len() {
            if !reachable[start] {
                continue;
            }
            furthest = start;
            for symbol in candidates {
                if text[start..].starts_with(symbol.as_str()) {
                    reachable[start + symbol.as_str().len()] = true;
                }
            }
        }

        text[furthest..].chars().next().map(String::from).unwrap_or_default()
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> &Symbol {
        &self.cells[self.head]
    }

    /// Overwrites the cell under the head, returning the symbol that was there.
    ///
    /// # Errors
    ///
    /// * `TuringMachineError::SymbolNotInAlphabet` if `symbol` is not in the tape alphabet.
    pub fn write(&mut self, symbol: Symbol) -> Result<Symbol, TuringMachineError> {
        if !self.alphabet.contains(&symbol) {
            return Err(TuringMachineError::SymbolNotInAlphabet(symbol.to_string()));
        }

        Ok(std::mem::replace(&mut self.cells[self.head], symbol))
    }

    /// Moves the head one cell to the left, materializing a blank cell if needed.
    pub fn move_left(&mut self) {
        if self.head == 0 {
            self.cells.push_front(self.blank.clone());
            self.origin += 1;
        } else {
            self.head -= 1;
        }
    }

    /// Moves the head one cell to the right, materializing a blank cell if needed.
    pub fn move_right(&mut self) {
        self.head += 1;
        if self.head == self.cells.len() {
            self.cells.push_back(self.blank.clone());
        }
    }

    /// Moves the head in `direction`.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
        }
    }

    /// Iterates over every materialized cell, leftmost first.
    pub fn cells(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.cells.iter()
    }

    /// Number of materialized cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// A tape always holds at least the cell under the head.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index of the head within [`Tape::cells`].
    pub fn head_index(&self) -> usize {
        self.head
    }

    /// Signed head position, where 0 is the leftmost cell of the initial input.
    pub fn position(&self) -> i64 {
        self.head as i64 - self.origin as i64
    }

    pub fn blank(&self) -> &Symbol {
        &self.blank
    }

    /// The tape alphabet every cell is drawn from.
    pub fn alphabet(&self) -> &Alphabet {
        self.alphabet
    }
}

/// Renders the materialized region with leading and trailing blanks trimmed.
impl fmt::Display for Tape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.cells.iter().position(|cell| *cell != self.blank);
        let last = self.cells.iter().rposition(|cell| *cell != self.blank);

        if let (Some(first), Some(last)) = (first, last) {
            for cell in self.cells.range(first..=last) {
                f.write_str(cell.as_str())?;
            }
        }

        Ok(())
    }
}
