//! Runtime error types.

use thiserror::Error;

/// Failure to load or execute a module.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The bytes are not a loadable module (bad magic, version or validation).
    #[error("cannot load WebAssembly module: {0}")]
    Load(String),

    /// Execution trapped (division by zero, integer overflow, unreachable, ...).
    #[error("WebAssembly trap: {0}")]
    Trap(String),

    #[error("module has no export named '{0}'")]
    MissingExport(String),

    #[error("export '{name}' takes {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
