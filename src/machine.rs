//! This module defines the `TuringMachine` execution engine, which applies the step relation
//! of a [`MachineDefinition`] to a [`Tape`] until the machine accepts, rejects, or is aborted.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::definition::MachineDefinition;
use crate::tape::Tape;
use crate::types::{Direction, State, Symbol, TuringMachineError};

/// Run-time limits that can stop a machine before it halts on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Abort once this many steps have been executed.
    pub step_limit: Option<usize>,
    /// Abort as soon as the machine enters this state.
    pub halt_state: Option<State>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn halt_state(mut self, state: impl Into<State>) -> Self {
        self.halt_state = Some(state.into());
        self
    }
}

/// The execution status of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The machine can still take steps.
    Running,
    Accepted,
    Rejected,
    /// Stopped by a step limit or halt state.
    Aborted,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Running)
    }
}

/// The terminal classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Accepted,
    Rejected,
    Aborted,
}

impl From<Classification> for Status {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Accepted => Status::Accepted,
            Classification::Rejected => Status::Rejected,
            Classification::Aborted => Status::Aborted,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HaltReason {
    /// A transition entered the accept state.
    AcceptState,
    /// A transition entered the reject state.
    RejectState,
    /// No transition exists for the current state and symbol.
    NoTransition { state: State, symbol: Symbol },
    /// The configured step limit was reached.
    StepLimit { limit: usize },
    /// The machine entered the configured halt state.
    HaltState { state: State },
}

impl HaltReason {
    pub fn classification(&self) -> Classification {
        match self {
            HaltReason::AcceptState => Classification::Accepted,
            HaltReason::RejectState | HaltReason::NoTransition { .. } => Classification::Rejected,
            HaltReason::StepLimit { .. } | HaltReason::HaltState { .. } => {
                Classification::Aborted
            }
        }
    }
}

/// An immutable snapshot of one applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// The state the machine was in before the step.
    pub prior_state: State,
    /// The symbol under the head before the step.
    pub read: Symbol,
    /// The symbol written, or `None` when the step entered the accept or reject state.
    pub write: Option<Symbol>,
    /// The state the machine is in after the step.
    pub next_state: State,
    /// The head movement, or `None` when the step entered the accept or reject state.
    pub direction: Option<Direction>,
    /// The step count after this step.
    pub step_count: usize,
}

/// The result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub classification: Classification,
    pub step_count: usize,
    pub reason: HaltReason,
    /// The transition that entered the accept or reject state, if that is how the run ended.
    pub final_step: Option<StepRecord>,
}

/// Represents the result of a single call to [`TuringMachine::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A transition was applied and the machine keeps running.
    Continue(StepRecord),
    /// The machine has halted.
    Halt(Outcome),
}

/// Receives every applied transition of a run.
///
/// Observers are how renderers and pacing hook into a run; they see immutable snapshots
/// and cannot change what the machine does.
pub trait StepObserver {
    /// Called after each applied transition, including the one entering accept or reject.
    fn on_step(&mut self, step: &StepRecord, tape: &Tape<'_>);

    /// Called once when the run halts.
    fn on_halt(&mut self, _outcome: &Outcome, _tape: &Tape<'_>) {}
}

impl<F> StepObserver for F
where
    F: FnMut(&StepRecord, &Tape<'_>),
{
    fn on_step(&mut self, step: &StepRecord, tape: &Tape<'_>) {
        self(step, tape)
    }
}

/// Represents a single-tape Turing Machine run.
///
/// The machine borrows its definition and owns its tape. It starts in the definition's
/// start state with a step count of zero.
pub struct TuringMachine<'a> {
    definition: &'a MachineDefinition,
    initial_tape: Tape<'a>,
    tape: Tape<'a>,
    state: State,
    step_count: usize,
    config: RunConfig,
    outcome: Option<Outcome>,
}

impl<'a> TuringMachine<'a> {
    /// Creates a new machine for `definition` running on `tape`, without run limits.
    ///
    /// # Errors
    ///
    /// * `TuringMachineError::IncompatibleTape` if the tape was built with another blank or
    ///   tape alphabet than the definition's.
    pub fn new(
        definition: &'a MachineDefinition,
        tape: Tape<'a>,
    ) -> Result<Self, TuringMachineError> {
        if tape.blank() != definition.blank() {
            return Err(TuringMachineError::IncompatibleTape(format!(
                "blank '{}' differs from '{}'",
                tape.blank(),
                definition.blank()
            )));
        }

        let alphabet = tape.alphabet();
        if !std::ptr::eq(alphabet, definition.tape_alphabet())
            && alphabet != definition.tape_alphabet()
        {
            return Err(TuringMachineError::IncompatibleTape(
                "tape alphabet differs from the definition's".into(),
            ));
        }

        Ok(Self {
            definition,
            initial_tape: tape.clone(),
            tape,
            state: definition.start().clone(),
            step_count: 0,
            config: RunConfig::default(),
            outcome: None,
        })
    }

    /// Creates a new machine with run limits.
    ///
    /// # Errors
    ///
    /// * `TuringMachineError::UnknownStateReference` if the halt state is not a state of
    ///   the definition.
    /// * `TuringMachineError::IncompatibleTape` as for [`TuringMachine::new`].
    pub fn with_config(
        definition: &'a MachineDefinition,
        tape: Tape<'a>,
        config: RunConfig,
    ) -> Result<Self, TuringMachineError> {
        if let Some(state) = &config.halt_state {
            if !definition.states().contains(state) {
                return Err(TuringMachineError::UnknownStateReference {
                    state: state.to_string(),
                    context: "halt state".into(),
                });
            }
        }

        let mut machine = Self::new(definition, tape)?;
        machine.config = config;
        Ok(machine)
    }

    /// Executes a single step of the machine.
    ///
    /// Once the machine has halted, every further call returns the same outcome without
    /// touching the tape. A failed step leaves the state, step count and tape unchanged.
    ///
    /// # Errors
    ///
    /// * `TuringMachineError::InvalidWriteSymbol` if a transition writes a symbol outside the
    ///   tape alphabet. Validated definitions never do.
    pub fn step(&mut self) -> Result<Step, TuringMachineError> {
        if let Some(outcome) = &self.outcome {
            return Ok(Step::Halt(outcome.clone()));
        }

        if let Some(limit) = self.config.step_limit {
            if self.step_count == limit {
                return Ok(Step::Halt(self.halt(HaltReason::StepLimit { limit }, None)));
            }
        }

        if self.config.halt_state.as_ref() == Some(&self.state) {
            let state = self.state.clone();
            return Ok(Step::Halt(self.halt(HaltReason::HaltState { state }, None)));
        }

        let definition = self.definition;
        let read = self.tape.read().clone();
        let transition = match definition.transition(&self.state, &read) {
            Some(transition) => transition,
            None => {
                let reason = HaltReason::NoTransition {
                    state: self.state.clone(),
                    symbol: read,
                };
                return Ok(Step::Halt(self.halt(reason, None)));
            }
        };

        let next_state = &transition.next_state;
        let final_reason = if self.config.halt_state.as_ref() == Some(next_state)
            && definition.is_final(next_state)
        {
            // Entering a final state that is also the halt state still aborts.
            Some(HaltReason::HaltState {
                state: next_state.clone(),
            })
        } else if next_state == definition.accept() {
            Some(HaltReason::AcceptState)
        } else if next_state == definition.reject() {
            Some(HaltReason::RejectState)
        } else {
            None
        };

        if final_reason.is_none() {
            if !definition.tape_alphabet().contains(&transition.write) {
                return Err(TuringMachineError::InvalidWriteSymbol(
                    transition.write.to_string(),
                ));
            }
            self.tape.write(transition.write.clone())?;
            self.tape.shift(transition.direction);
        }

        let prior_state = std::mem::replace(&mut self.state, next_state.clone());
        self.step_count += 1;

        let applied = final_reason.is_none();
        let record = StepRecord {
            prior_state,
            read,
            write: applied.then(|| transition.write.clone()),
            next_state: next_state.clone(),
            direction: applied.then_some(transition.direction),
            step_count: self.step_count,
        };
        trace!("step {}: {:?}", self.step_count, record);

        match final_reason {
            Some(reason) => Ok(Step::Halt(self.halt(reason, Some(record)))),
            None => Ok(Step::Continue(record)),
        }
    }

    /// Runs the machine until it halts.
    ///
    /// Machines that never halt only stop if a step limit or halt state is configured.
    pub fn run(&mut self) -> Result<Outcome, TuringMachineError> {
        loop {
            if let Step::Halt(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    /// Runs the machine until it halts, reporting every step to `observer`.
    pub fn run_with<O>(&mut self, observer: &mut O) -> Result<Outcome, TuringMachineError>
    where
        O: StepObserver + ?Sized,
    {
        loop {
            match self.step()? {
                Step::Continue(record) => observer.on_step(&record, &self.tape),
                Step::Halt(outcome) => {
                    if let Some(record) = &outcome.final_step {
                        observer.on_step(record, &self.tape);
                    }
                    observer.on_halt(&outcome, &self.tape);
                    return Ok(outcome);
                }
            }
        }
    }

    /// Resets the machine to its initial configuration.
    /// This restores the tape, the state and the step count.
    pub fn reset(&mut self) {
        self.tape = self.initial_tape.clone();
        self.state = self.definition.start().clone();
        self.step_count = 0;
        self.outcome = None;
    }

    /// Records the terminal outcome of the run.
    fn halt(&mut self, reason: HaltReason, final_step: Option<StepRecord>) -> Outcome {
        let outcome = Outcome {
            classification: reason.classification(),
            step_count: self.step_count,
            reason,
            final_step,
        };
        debug!(
            "machine '{}' halted: {:?} after {} steps ({:?})",
            self.definition.name(),
            outcome.classification,
            outcome.step_count,
            outcome.reason
        );

        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.outcome
            .as_ref()
            .map_or(Status::Running, |outcome| outcome.classification.into())
    }

    /// Returns the outcome, once the machine has halted.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Returns the number of transitions applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn tape(&self) -> &Tape<'a> {
        &self.tape
    }

    pub fn definition(&self) -> &'a MachineDefinition {
        self.definition
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}
