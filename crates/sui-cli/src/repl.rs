//! Interactive Sui shell.
//!
//! [`Repl`] is the line-driven state machine; [`run_interactive`] wires it
//! to a terminal through `rustyline`. The machine has two states:
//!
//! - **Idle** (nothing buffered, `>>> `): `.exit` / `.quit` end the
//!   session, `.reset` starts a fresh environment, blank lines are
//!   ignored, anything else starts a snippet.
//! - **Buffering** (`... `): lines accumulate until a blank line arrives
//!   while the block depth is zero. The snippet is then validated line by
//!   line and, only if every line is valid, run against the session.

use std::io::{self, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sui_compiler::{run_source_with, PipelineError};
use sui_eval::{EvalConfig, Environment, Interpreter, WriterOutput};
use sui_parser::{block_depth, validate_source};
use tracing::debug;

pub const PRIMARY_PROMPT: &str = ">>> ";
pub const CONTINUATION_PROMPT: &str = "... ";
pub const BANNER: &str = "Sui REPL (empty line to execute, .exit / .quit / .reset)";

/// File name used in diagnostics for REPL snippets.
const SNIPPET_NAME: &str = "<repl>";

/// What the driver should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// A REPL session: one environment and the snippet being typed.
pub struct Repl {
    interpreter: Interpreter,
    env: Environment,
    buffer: Vec<String>,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            interpreter: Interpreter::new(config),
            env: Environment::new(),
            buffer: Vec::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn is_buffering(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn prompt(&self) -> &'static str {
        if self.is_buffering() {
            CONTINUATION_PROMPT
        } else {
            PRIMARY_PROMPT
        }
    }

    /// Process one input line. Program output goes to `out`, diagnostics
    /// and runtime errors to `err`.
    pub fn feed(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<Control> {
        let trimmed = line.trim();

        if !self.is_buffering() {
            match trimmed {
                ".exit" | ".quit" => return Ok(Control::Exit),
                ".reset" => {
                    self.env = Environment::new();
                    writeln!(out, "State reset.")?;
                    return Ok(Control::Continue);
                }
                "" => return Ok(Control::Continue),
                _ => {}
            }
        }

        if trimmed.is_empty() && block_depth(&self.buffer) == 0 {
            self.submit(out, err)?;
        } else {
            self.buffer.push(line.to_string());
        }
        Ok(Control::Continue)
    }

    fn submit(&mut self, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<()> {
        let snippet = std::mem::take(&mut self.buffer).join("\n");

        let invalid = validate_source(&snippet);
        if !invalid.is_empty() {
            for (line, error) in &invalid {
                writeln!(err, "Error (line {line}): {error}")?;
            }
            debug!(errors = invalid.len(), "snippet rejected");
            return Ok(());
        }

        let mut output = WriterOutput(&mut *out);
        match run_source_with(
            &self.interpreter,
            &snippet,
            SNIPPET_NAME,
            &mut self.env,
            &mut output,
        ) {
            Ok(()) => {}
            Err(PipelineError::Diagnostics(diagnostics)) => {
                for e in &diagnostics.errors {
                    writeln!(err, "Error (line {}): {}", e.span.line, e.message)?;
                }
            }
            Err(e) => writeln!(err, "Error: {e}")?,
        }
        out.flush()
    }
}

/// Run the shell on the terminal until `.exit`, Ctrl-C or Ctrl-D.
pub fn run_interactive() -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut repl = Repl::new();
    println!("{BANNER}");

    let stdout = io::stdout();
    let stderr = io::stderr();
    loop {
        match editor.readline(repl.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.as_str())?;
                }
                if repl.feed(&line, &mut stdout.lock(), &mut stderr.lock())? == Control::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════════════════════
