//! Sui WebAssembly backend: compiles a [`sui_types::Program`] to a `.wasm`
//! binary.
//!
//! # Architecture
//!
//! Code generation is split in two:
//!
//! 1. [`emit_wat`] lowers the program to WebAssembly text. Every Sui value
//!    is an `i64`; globals become mutable exported globals, functions
//!    become exported `f<N>` functions and module-level code becomes the
//!    exported `main`.
//! 2. [`compile`] hands the text to an [`Assembler`] (normally the external
//!    `wat2wasm` tool, see [`Wat2Wasm`]) and validates the binary it returns.
//!
//! Labels and jumps have no structured equivalent in WebAssembly. A body
//! that uses them is cut into segments at each `:` and driven by a
//! `br_table` dispatch loop over an `i32` program counter.
//!
//! See [`types`] for the import/export contract.

pub mod assembler;
pub mod compiler;
pub mod error;
pub mod types;
pub mod wat;

pub use assembler::{Assembler, Wat2Wasm, WAT2WASM_ENV};
#[cfg(feature = "in-process")]
pub use assembler::InProcess;
pub use compiler::{check_module, compile};
pub use error::{AssembleError, CodegenError, CodegenResult};
pub use wat::emit_wat;
