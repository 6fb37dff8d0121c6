//! Sui Python backend.
//!
//! Forward: [`emit_python`] renders a [`sui_types::Program`] as a
//! standalone Python 3 script that prints exactly what the interpreter
//! prints.
//!
//! Reverse: [`translate`] accepts a small Python subset (integer
//! variables, arithmetic, comparisons, `if`/`while`, functions, `print`)
//! and lowers it to a Sui program. Everything [`emit_python`] produces is
//! inside that subset, so forward output always translates back.

mod ast;
mod emit;
mod error;
mod lower;
mod parse;

pub use emit::{emit_python, HELPERS, PYTHON_RECURSION_LIMIT};
pub use error::{TranslateError, TranslateResult};

use sui_types::Program;
use tracing::debug;

/// Translate Python source into a Sui program.
pub fn translate(source: &str) -> TranslateResult<Program> {
    let stripped = emit::strip_helpers(source);
    let module = parse::parse_module(&stripped)?;
    let program = lower::lower(&module)?;
    debug!(
        statements = module.len(),
        functions = program.functions.len(),
        instructions = program.instructions.len(),
        "translated python"
    );
    Ok(program)
}
