//! Reverse-translation error types.

use thiserror::Error;

/// Why a Python source could not be translated to Sui.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Valid Python outside the translatable subset.
    #[error("line {line}: unsupported Python construct: {construct}")]
    Unsupported { construct: String, line: u32 },

    /// Not valid Python in the first place.
    #[error("line {line}: syntax error: {message}")]
    Syntax { message: String, line: u32 },
}

impl TranslateError {
    pub(crate) fn unsupported(construct: impl Into<String>, line: u32) -> Self {
        Self::Unsupported {
            construct: construct.into(),
            line,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Self::Unsupported { line, .. } | Self::Syntax { line, .. } => *line,
        }
    }
}

/// Result alias for reverse translation.
pub type TranslateResult<T> = Result<T, TranslateError>;
