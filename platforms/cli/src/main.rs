mod render;

use clap::Parser;
use render::{DebugLevel, Palette, RenderOptions, Renderer};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tmi::{
    parse_with_options, Classification, MachineDefinition, ProgramLoader, ProgramManager,
    RunConfig, Tape, TuringMachine, TuringMachineError, ValidationOptions,
};

const EXIT_ACCEPT: i32 = 0;
const EXIT_REJECT: i32 = 1;
const EXIT_ABORT: i32 = 2;
const EXIT_USAGE: i32 = 9;
const EXIT_FILE: i32 = 10;
const EXIT_DEFINITION: i32 = 12;
const EXIT_TAPE: i32 = 32;
const EXIT_RUNTIME: i32 = 34;

/// Runs a single-tape Turing machine definition against an input tape.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmi -m machines/even-zeros.tm --input 1001
  echo abba | tmi -m machines/palindrome.tm -d 2
  tmi --sample palindrome -d 1 -w 0.2")]
struct Cli {
    /// The machine definition file (.tm) to run
    #[clap(short, long, required_unless_present_any = ["sample", "list"])]
    machine: Option<PathBuf>,

    /// A file holding the input tape
    #[clap(short, long, conflicts_with = "input")]
    tape: Option<PathBuf>,

    /// The input tape as text; read from stdin when neither this nor --tape is given
    #[clap(long)]
    input: Option<String>,

    /// Rendering detail: 0 banner only, 1 tape per step, 2 boxed steps
    #[clap(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    debug: u8,

    /// Seconds to pause between frames
    #[clap(short = 'w', long, default_value = "0", value_parser = parse_delay)]
    time: Duration,

    /// Abort after this many steps
    #[clap(short = 'l', long)]
    halt_after: Option<usize>,

    /// Abort when the machine enters this state
    #[clap(short = 's', long)]
    halt_at: Option<String>,

    /// Wait for Enter after each frame
    #[clap(short = 'i', long)]
    step: bool,

    /// Reject definitions with non-ASCII tokens
    #[clap(short, long)]
    ascii: bool,

    /// Use the palette for dark terminals
    #[clap(short = 'n', long)]
    dark: bool,

    /// Print the outcome as JSON instead of rendering the run
    #[clap(long)]
    json: bool,

    /// Run a bundled sample machine by name
    #[clap(long, conflicts_with = "machine")]
    sample: Option<String>,

    /// List the bundled sample machines
    #[clap(long)]
    list: bool,

    /// Enable debug logging on stderr
    #[clap(short, long)]
    verbose: bool,
}

/// An error that ends the process with a specific exit code.
#[derive(Debug)]
struct Failure {
    code: i32,
    message: String,
}

impl Failure {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<TuringMachineError> for Failure {
    fn from(error: TuringMachineError) -> Self {
        let code = match &error {
            TuringMachineError::FileError(_) => EXIT_FILE,
            TuringMachineError::SymbolNotInAlphabet(_) => EXIT_TAPE,
            TuringMachineError::InvalidWriteSymbol(_) => EXIT_RUNTIME,
            TuringMachineError::UnknownProgram(_) => EXIT_USAGE,
            _ => EXIT_DEFINITION,
        };
        Failure::new(code, error.to_string())
    }
}

impl From<io::Error> for Failure {
    fn from(error: io::Error) -> Self {
        Failure::new(EXIT_FILE, format!("I/O error: {}", error))
    }
}

fn parse_delay(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", value, e))?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("'{}' is not a valid number of seconds", value))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_ACCEPT };
            let _ = e.print();
            process::exit(code);
        }
    };

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(failure) => {
            eprintln!("Error: {}", failure.message);
            process::exit(failure.code);
        }
    }
}

fn run(cli: &Cli) -> Result<i32, Failure> {
    if cli.list {
        list_samples()?;
        return Ok(EXIT_ACCEPT);
    }

    let options = ValidationOptions { strict: cli.ascii };
    let (definition, sample_input) = load_definition(cli, options)?;
    log::debug!(
        "Loaded '{}' with {} transitions",
        definition.name(),
        definition.transition_count()
    );

    let input = read_input(cli, sample_input)?;
    let tape = Tape::from_input(&definition, &input)?;

    let mut config = RunConfig::new();
    if let Some(limit) = cli.halt_after {
        config = config.step_limit(limit);
    }
    if let Some(state) = &cli.halt_at {
        config = config.halt_state(state.as_str());
    }

    let mut machine = TuringMachine::with_config(&definition, tape, config)
        .map_err(|e| Failure::new(EXIT_USAGE, e.to_string()))?;

    let outcome = if cli.json {
        let outcome = machine.run()?;
        let report = serde_json::json!({
            "machine": definition.name(),
            "input": input,
            "outcome": outcome,
            "tape": machine.tape().to_string(),
            "head": machine.tape().position(),
        });
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| Failure::new(EXIT_RUNTIME, e.to_string()))?;
        println!("{}", text);
        outcome
    } else {
        let palette = if cli.dark {
            Palette::dark()
        } else {
            Palette::light()
        };
        let options = RenderOptions {
            level: DebugLevel::from(cli.debug),
            palette,
            delay: cli.time,
            step_mode: cli.step,
        };

        let stdout = io::stdout();
        let mut renderer = Renderer::new(stdout.lock(), &definition, options);
        renderer.initial(machine.state(), machine.tape());
        let outcome = machine.run_with(&mut renderer)?;
        renderer.finish()?;
        outcome
    };

    Ok(match outcome.classification {
        Classification::Accepted => EXIT_ACCEPT,
        Classification::Rejected => EXIT_REJECT,
        Classification::Aborted => EXIT_ABORT,
    })
}

fn list_samples() -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for index in 0..ProgramManager::get_program_count() {
        if let Ok(program) = ProgramManager::get_program_by_index(index) {
            writeln!(
                out,
                "{:>2}  {:<20} sample input: {}",
                index,
                program.name(),
                program.sample_input
            )?;
        }
    }

    Ok(())
}

/// Loads the definition named on the command line, with the sample input of a bundled
/// machine when one was chosen.
fn load_definition(
    cli: &Cli,
    options: ValidationOptions,
) -> Result<(MachineDefinition, Option<&'static str>), Failure> {
    if let Some(name) = &cli.sample {
        let program = ProgramManager::get_program_by_name(name)?;
        let definition = parse_with_options(program.text, options)?;
        return Ok((definition, Some(program.sample_input)));
    }

    match &cli.machine {
        Some(path) => Ok((ProgramLoader::load_program(Path::new(path), options)?, None)),
        None => Err(Failure::new(EXIT_USAGE, "No machine definition given")),
    }
}

/// Reads the input tape from --tape, --input, the sample, or stdin, in that order.
fn read_input(cli: &Cli, sample_input: Option<&str>) -> Result<String, Failure> {
    if let Some(path) = &cli.tape {
        return Ok(ProgramLoader::load_tape(path)?);
    }
    if let Some(input) = &cli.input {
        return Ok(input.clone());
    }
    if let Some(input) = sample_input {
        return Ok(input.to_string());
    }

    let mut buffer = String::new();
    if atty::is(atty::Stream::Stdin) {
        eprint!("Input: ");
        io::stderr().flush()?;
        io::stdin().read_line(&mut buffer)?;
    } else {
        io::stdin().read_to_string(&mut buffer)?;
    }

    Ok(buffer.lines().collect())
}
