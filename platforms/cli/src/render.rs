//! Terminal rendering of a run: per-step tape frames and the final banner.

use crossterm::{
    cursor::MoveUp,
    queue,
    style::{Color, Stylize},
    terminal::{Clear, ClearType},
};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;
use tmi::{
    Classification, HaltReason, MachineDefinition, Outcome, State, StepObserver, StepRecord,
    Symbol, Tape,
};

/// How much of a run is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    /// Final banner only.
    Quiet,
    /// One compact tape line per step.
    Compact,
    /// A boxed transition table and boxed tape per step.
    Boxed,
}

impl From<u8> for DebugLevel {
    fn from(level: u8) -> Self {
        match level {
            0 => DebugLevel::Quiet,
            1 => DebugLevel::Compact,
            _ => DebugLevel::Boxed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accept: Color,
    pub reject: Color,
    pub abort: Color,
    pub head: Color,
    pub marker: Color,
    pub frame: Color,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            accept: Color::DarkGreen,
            reject: Color::DarkRed,
            abort: Color::DarkYellow,
            head: Color::DarkBlue,
            marker: Color::DarkMagenta,
            frame: Color::DarkGrey,
        }
    }

    pub fn dark() -> Self {
        Self {
            accept: Color::Green,
            reject: Color::Red,
            abort: Color::Yellow,
            head: Color::Cyan,
            marker: Color::Magenta,
            frame: Color::Grey,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub level: DebugLevel,
    pub palette: Palette,
    /// Pause after each frame; frames are redrawn in place when non-zero.
    pub delay: Duration,
    /// Wait for Enter after each frame.
    pub step_mode: bool,
}

/// Draws a run to `out`, frame by frame.
///
/// Observer callbacks cannot fail, so the first I/O error is kept and reported by
/// [`Renderer::finish`].
pub struct Renderer<'d, W: Write> {
    out: W,
    options: RenderOptions,
    tape_only: Vec<&'d Symbol>,
    frame_lines: u16,
    error: Option<io::Error>,
}

impl<'d, W: Write> Renderer<'d, W> {
    pub fn new(out: W, definition: &'d MachineDefinition, options: RenderOptions) -> Self {
        Self {
            out,
            options,
            tape_only: definition.tape_only_symbols().collect(),
            frame_lines: 0,
            error: None,
        }
    }

    /// Draws the tape before the first step.
    pub fn initial(&mut self, state: &State, tape: &Tape<'_>) {
        if self.options.level == DebugLevel::Quiet {
            return;
        }

        let mut frame = String::new();
        match self.options.level {
            DebugLevel::Boxed => {
                let _ = writeln!(frame, "{} {}", "START".bold(), state);
                self.boxed_tape(&mut frame, tape);
            }
            _ => self.compact_tape(&mut frame, tape),
        }
        self.present(&frame);
    }

    /// Returns the first I/O error met while drawing, if any.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.out.flush()
    }

    fn present(&mut self, frame: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.draw(frame) {
            self.error = Some(e);
        }
    }

    fn draw(&mut self, frame: &str) -> io::Result<()> {
        let animate = !self.options.delay.is_zero() && !self.options.step_mode;

        if animate && self.frame_lines > 0 {
            queue!(
                self.out,
                MoveUp(self.frame_lines),
                Clear(ClearType::FromCursorDown)
            )?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;

        self.frame_lines = u16::try_from(frame.matches('\n').count()).unwrap_or(u16::MAX);

        if self.options.step_mode {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
        } else if animate {
            thread::sleep(self.options.delay);
        }

        Ok(())
    }

    fn cell(&self, symbol: &Symbol, under_head: bool) -> String {
        let palette = self.options.palette;
        let text = symbol.to_string();

        if under_head {
            text.with(palette.head).reverse().bold().to_string()
        } else if self.tape_only.contains(&symbol) {
            text.with(palette.marker).bold().to_string()
        } else {
            text
        }
    }

    /// `[0][1][B][···`
    fn compact_tape(&self, frame: &mut String, tape: &Tape<'_>) {
        for (index, symbol) in tape.cells().enumerate() {
            let _ = write!(frame, "[{}]", self.cell(symbol, index == tape.head_index()));
        }
        let _ = writeln!(frame, "[···");
    }

    fn boxed_tape(&self, frame: &mut String, tape: &Tape<'_>) {
        let color = self.options.palette.frame;
        let widths: Vec<usize> = tape
            .cells()
            .map(|symbol| symbol.as_str().chars().count())
            .collect();

        let rule = |left: &str, join: &str, right: &str| {
            let segments: Vec<String> =
                widths.iter().map(|width| "─".repeat(width + 2)).collect();
            format!("{}{}{}", left, segments.join(join), right)
        };

        let _ = writeln!(frame, "{}", rule("┌", "┬", "┐").with(color));
        let _ = write!(frame, "{}", "│".with(color));
        for (index, symbol) in tape.cells().enumerate() {
            let _ = write!(
                frame,
                " {} {}",
                self.cell(symbol, index == tape.head_index()),
                "│".with(color)
            );
        }
        let _ = writeln!(frame, " ···");
        let _ = writeln!(frame, "{}", rule("└", "┴", "┘").with(color));

        let offset: usize = widths[..tape.head_index()].iter().map(|width| width + 3).sum();
        let _ = writeln!(
            frame,
            "{}{}",
            " ".repeat(offset + 2),
            "▲".with(self.options.palette.head)
        );
    }

    fn boxed_step(&self, frame: &mut String, step: &StepRecord) {
        let color = self.options.palette.frame;
        let write = step
            .write
            .as_ref()
            .map(Symbol::to_string)
            .unwrap_or_else(|| "-".into());
        let direction = step
            .direction
            .map(|direction| direction.to_string())
            .unwrap_or_else(|| "-".into());
        let values = [
            step.prior_state.to_string(),
            step.read.to_string(),
            write,
            step.next_state.to_string(),
            direction,
        ];
        let headers = ["STATE", "READ", "WRITE", "GO TO", "MOVE"];
        let widths: Vec<usize> = headers
            .iter()
            .zip(&values)
            .map(|(header, value)| header.len().max(value.chars().count()))
            .collect();

        let rule = |left: &str, join: &str, right: &str| {
            let segments: Vec<String> =
                widths.iter().map(|width| "─".repeat(width + 2)).collect();
            format!("{}{}{}", left, segments.join(join), right)
        };
        let row = |cells: Vec<String>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!(" {:<width$} ", cell, width = width))
                .collect();
            format!("│{}│", padded.join("│"))
        };

        let _ = writeln!(frame, "{}", format!("Step {}", step.step_count).bold());
        let _ = writeln!(frame, "{}", rule("┌", "┬", "┐").with(color));
        let _ = writeln!(
            frame,
            "{}",
            row(headers.iter().map(|header| header.to_string()).collect()).with(color)
        );
        let _ = writeln!(frame, "{}", rule("├", "┼", "┤").with(color));
        let _ = writeln!(frame, "{}", row(values.to_vec()));
        let _ = writeln!(frame, "{}", rule("└", "┴", "┘").with(color));
    }

    fn banner(&self, outcome: &Outcome, tape: &Tape<'_>) -> String {
        let palette = self.options.palette;
        let (word, color) = match outcome.classification {
            Classification::Accepted => ("Accept", palette.accept),
            Classification::Rejected => ("Reject", palette.reject),
            Classification::Aborted => ("Abort", palette.abort),
        };

        let mut text = String::new();
        match self.options.level {
            DebugLevel::Boxed => {
                let spaced: Vec<String> = word.to_uppercase().chars().map(String::from).collect();
                let inner = format!("   {}   ", spaced.join(" "));
                let edge = "═".repeat(inner.chars().count());
                let _ = writeln!(text, "{}", format!("╔{}╗", edge).with(color));
                let _ = writeln!(text, "{}", format!("║{}║", inner).with(color).bold());
                let _ = writeln!(text, "{}", format!("╚{}╝", edge).with(color));
            }
            _ => {
                let _ = writeln!(text, "{}", word.with(color).bold());
            }
        }
        let _ = writeln!(text, "steps: {}  tape: {}", outcome.step_count, tape);
        text
    }
}

/// Explains how a run stopped, for runs that did not end in the accept or reject state.
pub fn describe_reason(reason: &HaltReason) -> Option<String> {
    match reason {
        HaltReason::AcceptState | HaltReason::RejectState => None,
        HaltReason::NoTransition { state, symbol } => Some(format!(
            "No transition for state '{}' reading '{}'",
            state, symbol
        )),
        HaltReason::StepLimit { limit } => Some(format!("Step limit of {} reached", limit)),
        HaltReason::HaltState { state } => Some(format!("Halt state '{}' reached", state)),
    }
}

impl<W: Write> StepObserver for Renderer<'_, W> {
    fn on_step(&mut self, step: &StepRecord, tape: &Tape<'_>) {
        let mut frame = String::new();
        match self.options.level {
            DebugLevel::Quiet => return,
            DebugLevel::Compact => self.compact_tape(&mut frame, tape),
            DebugLevel::Boxed => {
                self.boxed_step(&mut frame, step);
                self.boxed_tape(&mut frame, tape);
            }
        }
        self.present(&frame);
    }

    fn on_halt(&mut self, outcome: &Outcome, tape: &Tape<'_>) {
        // The last frame stays on screen.
        self.frame_lines = 0;

        let mut text = String::new();
        if self.options.level > DebugLevel::Quiet {
            if let Some(reason) = describe_reason(&outcome.reason) {
                let _ = writeln!(text, "{}", reason);
            }
        }
        text.push_str(&self.banner(outcome, tape));

        if self.error.is_none() {
            if let Err(e) = self.out.write_all(text.as_bytes()) {
                self.error = Some(e);
            }
        }
    }
}
