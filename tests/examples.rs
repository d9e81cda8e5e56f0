//! End-to-end runs: definition text through validation and execution.

use tmi::{
    parse, Classification, HaltReason, MachineDefinition, ProgramManager, RunConfig, Step, Tape,
    TuringMachine, TuringMachineError,
};

const FLIP: &str = "\
NAME: Flip
STATE: q0 q1 qa qr
SIGMA: 0 1
GAMMA: 0 1 B
START: q0
ACCEPT: qa
REJECT: qr
DELTA:
q0 0 q1 1 R
END
";

const FLIP_THEN_ACCEPT: &str = "\
NAME: Flip then accept
STATE: q0 q1 qa qr
SIGMA: 0 1
GAMMA: 0 1 B
START: q0
ACCEPT: qa
REJECT: qr
DELTA:
q0 0 q1 1 R
q1 B qa B R
END
";

fn run(definition: &MachineDefinition, input: &str, config: RunConfig) -> (Classification, usize) {
    let tape = Tape::from_input(definition, input).unwrap();
    let mut machine = TuringMachine::with_config(definition, tape, config).unwrap();
    let outcome = machine.run().unwrap();
    (outcome.classification, outcome.step_count)
}

#[test]
fn missing_transition_rejects() {
    let definition = parse(FLIP).unwrap();
    let tape = Tape::from_input(&definition, "0").unwrap();
    let mut machine = TuringMachine::new(&definition, tape).unwrap();

    let outcome = machine.run().unwrap();
    assert_eq!(outcome.classification, Classification::Rejected);
    assert_eq!(outcome.step_count, 1);
    assert_eq!(
        outcome.reason,
        HaltReason::NoTransition {
            state: "q1".into(),
            symbol: "B".into()
        }
    );
    assert_eq!(machine.tape().to_string(), "1");
}

#[test]
fn transition_into_accept_state_counts_as_a_step() {
    let definition = parse(FLIP_THEN_ACCEPT).unwrap();
    assert_eq!(
        run(&definition, "0", RunConfig::new()),
        (Classification::Accepted, 2)
    );
}

#[test]
fn foreign_tape_symbol_fails_before_running() {
    let definition = parse(FLIP).unwrap();
    let result = Tape::from_input(&definition, "02");
    assert!(matches!(
        result,
        Err(TuringMachineError::SymbolNotInAlphabet(_))
    ));
}

#[test]
fn zero_step_limit_aborts_immediately() {
    for text in [FLIP, FLIP_THEN_ACCEPT] {
        let definition = parse(text).unwrap();
        assert_eq!(
            run(&definition, "0", RunConfig::new().step_limit(0)),
            (Classification::Aborted, 0)
        );
    }
}

#[test]
fn step_limit_precedes_accept() {
    let definition = parse(FLIP_THEN_ACCEPT).unwrap();
    assert_eq!(
        run(&definition, "0", RunConfig::new().step_limit(1)),
        (Classification::Aborted, 1)
    );
    assert_eq!(
        run(&definition, "0", RunConfig::new().step_limit(2)),
        (Classification::Accepted, 2)
    );
}

#[test]
fn halt_state_aborts_on_entry() {
    let definition = parse(FLIP_THEN_ACCEPT).unwrap();
    let tape = Tape::from_input(&definition, "0").unwrap();
    let mut machine =
        TuringMachine::with_config(&definition, tape, RunConfig::new().halt_state("q1")).unwrap();

    assert!(matches!(machine.step().unwrap(), Step::Continue(_)));
    match machine.step().unwrap() {
        Step::Halt(outcome) => {
            assert_eq!(outcome.classification, Classification::Aborted);
            assert_eq!(outcome.reason, HaltReason::HaltState { state: "q1".into() });
        }
        other => panic!("expected halt, got {:?}", other),
    }
}

#[test]
fn structural_errors_are_reported() {
    let cases = [
        (FLIP.replace("START: q0", "START: q9"), "unknown state"),
        (FLIP.replace("q0 0 q1 1 R", "q0 0 q1 7 R"), "foreign write"),
        (FLIP.replace("q0 0 q1 1 R", "q0 0 q1 1 X"), "bad direction"),
        (FLIP.replace("q0 0 q1 1 R", "q0 0 q1"), "incomplete shorthand"),
        (
            FLIP.replace("q0 0 q1 1 R", "q0 0 q1 1 R\nq0 0 qa 0 L"),
            "duplicate key",
        ),
    ];

    for (text, label) in cases {
        assert!(parse(&text).is_err(), "{label} should be rejected");
    }
}

#[test]
fn sample_machines_run_on_their_sample_inputs() {
    for index in 0..ProgramManager::get_program_count() {
        let program = ProgramManager::get_program_by_index(index).unwrap();
        let (classification, _) = run(&program.definition, program.sample_input, RunConfig::new());
        assert_eq!(classification, Classification::Accepted, "{}", program.name());
    }
}

#[test]
fn sample_machine_files_load_from_disk() {
    let directory = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("machines");
    let results = tmi::ProgramLoader::load_programs(&directory, tmi::ValidationOptions::strict());

    assert_eq!(results.len(), ProgramManager::get_program_count());
    assert!(results.iter().all(|result| result.is_ok()));
}
