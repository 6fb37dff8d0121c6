//! Block-depth tracking.
//!
//! The only block structure in Sui is the function body: a line whose
//! first token is `#` and last token is `{` opens one, a line starting
//! with `}` closes it. The REPL calls [`block_depth`] after every line to
//! decide whether a paste is complete, so it must tolerate garbage.

use sui_lexer::{lex_line, TokenKind};
use sui_types::Opcode;

/// Structural role of one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Blank or comment-only.
    Skip,
    /// `# ... {`
    Opener,
    /// `}` (with or without trailing words).
    Closer,
    /// Any other instruction line.
    Plain,
}

/// Classify a single raw line.
pub fn classify_line(line: &str) -> LineClass {
    let tokens = lex_line(line, 0);
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return LineClass::Skip;
    };
    match first.kind {
        TokenKind::Opcode(Opcode::DefineFunc) if last.kind == TokenKind::BlockOpen => {
            LineClass::Opener
        }
        TokenKind::Opcode(Opcode::BlockClose) => LineClass::Closer,
        _ => LineClass::Plain,
    }
}

/// Net nesting depth of a sequence of raw lines.
///
/// A closer at depth zero is ignored rather than driving the depth negative.
pub fn block_depth<S: AsRef<str>>(lines: &[S]) -> usize {
    lines
        .iter()
        .fold(0usize, |depth, line| match classify_line(line.as_ref()) {
            LineClass::Opener => depth + 1,
            LineClass::Closer => depth.saturating_sub(1),
            LineClass::Skip | LineClass::Plain => depth,
        })
}
