//! Sui parser: block tracking, line validation and program building.
//!
//! ```text
//! raw lines → block depth + line validation → Parser → Program
//! ```

pub mod block;
mod parser;
pub mod validate;

pub use block::{block_depth, classify_line, LineClass};
pub use parser::{parse_program, ParseContext, ParseResult, Parser};
pub use validate::{validate_line, validate_source, LineError, ParsedLine};
