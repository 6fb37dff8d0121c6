//! Codegen error types.

use thiserror::Error;

/// Failure of the external text-to-binary assembler.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The assembler executable could not be started.
    #[error("wat2wasm not found (tried '{program}'); install wabt or set SUI_WAT2WASM")]
    ToolUnavailable { program: String },

    /// The assembler ran and rejected the text. `stderr` is its output, verbatim.
    #[error("wat2wasm rejected the module:\n{stderr}")]
    Rejected { stderr: String },

    #[error("assembler I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during WASM code generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A call passes a different number of arguments than the callee declares.
    #[error("line {line}: function {index} expects {expected} argument(s), got {found}")]
    ArityMismatch {
        index: u32,
        expected: u32,
        found: usize,
        line: u32,
    },

    /// A call targets a function the program does not define.
    #[error("line {line}: call to undefined function {index}")]
    UndefinedFunction { index: u32, line: u32 },

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// The assembler produced something that is not a WASM binary.
    #[error("assembler output is not a WebAssembly module (bad magic number)")]
    BadMagic,

    /// The generated WASM module failed validation.
    #[error("WASM validation failed: {0}")]
    ValidationFailed(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
