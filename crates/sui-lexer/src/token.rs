//! Token types for the Sui lexer.
//!
//! Sui has no nested syntax: a line is a whitespace-separated list of
//! words, and each word is classified on its own.

use std::fmt;
use sui_types::{Opcode, Operand, Span};

/// Lines (and trailing words) starting with this character are comments.
pub const COMMENT_PREFIX: char = ';';

/// A single token produced by the Sui lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The exact source text.
    pub text: String,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Classification of one word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// An opcode sigil such as `=`, `$` or `}`.
    Opcode(Opcode),
    /// `g<N>`, `v<N>` or `a<N>`.
    Slot(Operand),
    /// A bare (optionally negative) decimal integer.
    Integer(i64),
    /// The trailing `{` of a function opener.
    BlockOpen,
    /// A numeral that does not fit in 64 bits.
    IntegerOutOfRange,
    /// Anything else.
    Invalid,
}

impl TokenKind {
    /// Classify a single word.
    pub fn classify(word: &str) -> TokenKind {
        if let Some(op) = Opcode::from_sigil(word) {
            return TokenKind::Opcode(op);
        }
        if word == "{" {
            return TokenKind::BlockOpen;
        }
        if is_numeral(word) {
            return match word.parse::<i64>() {
                Ok(v) => TokenKind::Integer(v),
                Err(_) => TokenKind::IntegerOutOfRange,
            };
        }
        let mut chars = word.chars();
        let sigil = chars.next();
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return TokenKind::Invalid;
        }
        let Ok(index) = digits.parse::<u32>() else {
            return TokenKind::IntegerOutOfRange;
        };
        match sigil {
            Some('g') => TokenKind::Slot(Operand::Global(index)),
            Some('v') => TokenKind::Slot(Operand::Local(index)),
            Some('a') => TokenKind::Slot(Operand::Arg(index)),
            _ => TokenKind::Invalid,
        }
    }

    /// The operand this token denotes, if it denotes one.
    pub fn operand(&self) -> Option<Operand> {
        match self {
            TokenKind::Slot(op) => Some(*op),
            TokenKind::Integer(v) => Some(Operand::Literal(*v)),
            _ => None,
        }
    }
}

fn is_numeral(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Opcode(op) => write!(f, "opcode '{op}'"),
            TokenKind::Slot(op) => write!(f, "slot '{op}'"),
            TokenKind::Integer(v) => write!(f, "integer '{v}'"),
            TokenKind::BlockOpen => write!(f, "'{{'"),
            TokenKind::IntegerOutOfRange => write!(f, "out-of-range integer"),
            TokenKind::Invalid => write!(f, "invalid token"),
        }
    }
}
