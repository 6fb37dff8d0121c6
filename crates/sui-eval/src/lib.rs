//! Sui interpreter: reference implementation.
//!
//! Executes a [`sui_types::Program`] instruction by instruction against a
//! long-lived [`Environment`]. The WebAssembly and Python backends are
//! checked against the globals and output this crate produces.

pub mod env;
pub mod error;
pub mod interpreter;

pub use env::{Callable, Environment, Frame};
pub use error::{EvalError, EvalResult};
pub use interpreter::{run, EvalConfig, Interpreter, Output, WriterOutput};
