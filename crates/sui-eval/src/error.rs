//! Runtime error types for the Sui interpreter.

use thiserror::Error;

/// A runtime failure. Every variant raised by an instruction carries the
/// 1-based source line of that instruction.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("line {line}: read of undefined global g{index}")]
    UndefinedGlobal { index: u32, line: u32 },

    #[error("line {line}: slot {slot} is not available in this scope")]
    SlotOutOfScope { slot: String, line: u32 },

    #[error("line {line}: call to undefined function {index}")]
    UndefinedFunction { index: u32, line: u32 },

    #[error("line {line}: function {index} expects {expected} argument(s), got {found}")]
    ArgumentCountMismatch {
        index: u32,
        expected: u32,
        found: usize,
        line: u32,
    },

    #[error("line {line}: division by zero")]
    DivisionByZero { line: u32 },

    #[error("line {line}: division overflow")]
    DivisionOverflow { line: u32 },

    #[error("line {line}: jump to undefined label {label}")]
    UndefinedLabel { label: u32, line: u32 },

    #[error("line {line}: '^' outside a function")]
    ReturnOutsideFunction { line: u32 },

    #[error("line {line}: maximum call depth of {limit} exceeded")]
    CallDepthExceeded { limit: usize, line: u32 },

    #[error("line {line}: step limit of {limit} exhausted")]
    GasExhausted { limit: u64, line: u32 },

    #[error("line {line}: malformed '{opcode}' instruction")]
    MalformedInstruction { opcode: String, line: u32 },

    #[error("output failed: {0}")]
    Output(#[from] std::io::Error),
}

impl EvalError {
    /// Source line of the failing instruction, if the error has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::UndefinedGlobal { line, .. }
            | Self::SlotOutOfScope { line, .. }
            | Self::UndefinedFunction { line, .. }
            | Self::ArgumentCountMismatch { line, .. }
            | Self::DivisionByZero { line }
            | Self::DivisionOverflow { line }
            | Self::UndefinedLabel { line, .. }
            | Self::ReturnOutsideFunction { line }
            | Self::CallDepthExceeded { line, .. }
            | Self::GasExhausted { line, .. }
            | Self::MalformedInstruction { line, .. } => Some(*line),
            Self::Output(_) => None,
        }
    }
}

/// Result alias for interpreter operations.
pub type EvalResult<T> = Result<T, EvalError>;
