//! Property-based tests for the tape and the execution engine.
//!
//! Machines are generated over a fixed state set and tape alphabet with a random,
//! possibly partial, transition table. Every run is bounded by a step limit.

use proptest::prelude::*;
use tmi::{MachineDefinition, RunConfig, Step, StepRecord, Tape, TuringMachine};

const STATES: [&str; 5] = ["q0", "q1", "q2", "qa", "qr"];
const WORKING_STATES: usize = 3;
const TAPE_ALPHABET: [&str; 4] = ["0", "1", "X", "B"];
const STEP_LIMIT: usize = 200;

prop_compose! {
    fn arbitrary_definition()(
        rules in proptest::collection::vec(
            proptest::option::of((0..STATES.len(), 0..TAPE_ALPHABET.len(), any::<bool>())),
            WORKING_STATES * TAPE_ALPHABET.len(),
        )
    ) -> MachineDefinition {
        let mut builder = MachineDefinition::builder()
            .name("generated")
            .states(STATES)
            .input_alphabet(["0", "1"])
            .tape_alphabet(TAPE_ALPHABET)
            .start("q0")
            .accept("qa")
            .reject("qr")
            .transitions(Vec::new());

        for (index, rule) in rules.iter().enumerate() {
            if let Some((next, write, right)) = rule {
                builder = builder.transition(
                    STATES[index / TAPE_ALPHABET.len()],
                    TAPE_ALPHABET[index % TAPE_ALPHABET.len()],
                    STATES[*next],
                    TAPE_ALPHABET[*write],
                    if *right { "R" } else { "L" },
                );
            }
        }

        builder.build().unwrap()
    }
}

fn bounded() -> RunConfig {
    RunConfig::new().step_limit(STEP_LIMIT)
}

proptest! {
    #[test]
    fn runs_are_deterministic(definition in arbitrary_definition(), input in "[01]{0,8}") {
        let tape = Tape::from_input(&definition, &input).unwrap();
        let mut machine = TuringMachine::with_config(&definition, tape, bounded()).unwrap();

        let first = machine.run().unwrap();
        let first_tape = machine.tape().to_string();

        machine.reset();
        let second = machine.run().unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first_tape, machine.tape().to_string());
    }

    #[test]
    fn tape_stays_within_tape_alphabet(definition in arbitrary_definition(), input in "[01]{0,8}") {
        let tape = Tape::from_input(&definition, &input).unwrap();
        let mut machine = TuringMachine::with_config(&definition, tape, bounded()).unwrap();

        let mut closed = true;
        let mut check = |_record: &StepRecord, tape: &Tape<'_>| {
            closed &= tape.cells().all(|cell| definition.tape_alphabet().contains(cell));
        };
        machine.run_with(&mut check).unwrap();

        prop_assert!(closed);
    }

    #[test]
    fn halting_step_leaves_tape_untouched(definition in arbitrary_definition(), input in "[01]{0,8}") {
        let tape = Tape::from_input(&definition, &input).unwrap();
        let mut machine = TuringMachine::with_config(&definition, tape, bounded()).unwrap();

        loop {
            let cells: Vec<_> = machine.tape().cells().cloned().collect();
            let position = machine.tape().position();

            if let Step::Halt(outcome) = machine.step().unwrap() {
                let after: Vec<_> = machine.tape().cells().cloned().collect();
                prop_assert_eq!(cells, after);
                prop_assert_eq!(position, machine.tape().position());
                if let Some(record) = outcome.final_step {
                    prop_assert!(record.write.is_none());
                    prop_assert!(record.direction.is_none());
                }
                break;
            }
        }
    }

    #[test]
    fn left_then_right_returns_to_same_cell(input in "[01]{0,8}", moves in 0usize..32) {
        let definition = MachineDefinition::builder()
            .states(["s", "qa", "qr"])
            .input_alphabet(["0", "1"])
            .tape_alphabet(["0", "1", "B"])
            .start("s")
            .accept("qa")
            .reject("qr")
            .transitions(Vec::new())
            .build()
            .unwrap();
        let mut tape = Tape::from_input(&definition, &input).unwrap();

        let symbol = tape.read().clone();
        let position = tape.position();

        for _ in 0..moves {
            tape.move_left();
        }
        for _ in 0..moves {
            tape.move_right();
        }

        prop_assert_eq!(tape.read(), &symbol);
        prop_assert_eq!(tape.position(), position);
        prop_assert_eq!(tape.to_string(), input);
    }
}
