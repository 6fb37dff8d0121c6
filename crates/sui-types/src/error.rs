use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before further errors are only counted.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// A single line is malformed.
    Syntax,
    /// The lines are individually fine but do not form a valid program.
    Structure,
}

/// Numeric error code (E100–E299).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNKNOWN_OPCODE: Self = Self(100);
    pub const WRONG_OPERAND_COUNT: Self = Self(101);
    pub const INVALID_OPERAND: Self = Self(102);
    pub const LITERAL_OUT_OF_RANGE: Self = Self(103);
    pub const MISSING_BLOCK_OPEN: Self = Self(104);

    // ── Structure errors (E200–E299) ──
    pub const UNCLOSED_FUNCTION: Self = Self(200);
    pub const UNMATCHED_BLOCK_CLOSE: Self = Self(201);
    pub const NESTED_FUNCTION: Self = Self(202);
    pub const FUNCTION_INDEX_OUT_OF_ORDER: Self = Self(203);
    pub const UNDEFINED_FUNCTION: Self = Self(204);
    pub const ARGUMENT_OUT_OF_RANGE: Self = Self(205);
    pub const SLOT_OUTSIDE_FUNCTION: Self = Self(206);
    pub const RETURN_OUTSIDE_FUNCTION: Self = Self(207);
    pub const UNDEFINED_LABEL: Self = Self(208);
    pub const DUPLICATE_LABEL: Self = Self(209);
    pub const DUPLICATE_FUNCTION: Self = Self(210);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Structure,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

/// A structured Sui diagnostic.
///
/// Front-ends render these; they must not parse free-form strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiError {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E204).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SuiError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for SuiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for SuiError {}

/// All diagnostics produced while checking one source unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<SuiError>,
    pub total_errors: usize,
}

impl Diagnostics {
    /// Create an empty result (no errors).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: SuiError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append every error of `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        let dropped = other.total_errors - other.errors.len();
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += dropped;
    }

    /// Render one `file:line:col: E### [category] message` line per error.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for e in &self.errors {
            out.push_str(&format!("{}:{e}\n", e.file));
        }
        if self.total_errors > self.errors.len() {
            out.push_str(&format!(
                "... and {} more error(s)\n",
                self.total_errors - self.errors.len()
            ));
        }
        out
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render().trim_end())
    }
}

impl std::error::Error for Diagnostics {}
