//! Shared types for the Sui toolchain.
//!
//! This crate defines the instruction model, source spans, diagnostics,
//! and other data structures used by every stage and backend.

mod error;
mod span;
pub mod model;

pub use error::{Diagnostics, ErrorCategory, ErrorCode, SuiError, MAX_ERRORS};
pub use model::{
    Function, Instruction, Opcode, Operand, OperandKind, Program, Value,
    MAX_CALL_FRAMES,
};
pub use span::{SourceFile, Span};

/// Result type used by the parsing stages.
pub type Result<T> = std::result::Result<T, SuiError>;
