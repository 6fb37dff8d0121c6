//! Sui WebAssembly runtime.
//!
//! Loads a module produced by `sui-codegen` into an embedded `wasmi`
//! engine, wires `env.print_i64` to an output buffer and exposes the
//! module's entry point, functions and globals.

mod error;
mod runtime;

pub use error::{RuntimeError, RuntimeResult};
pub use runtime::WasmRuntime;
