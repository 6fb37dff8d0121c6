//! Line-oriented Sui lexer.
//!
//! Every non-blank, non-comment line becomes one [`LexedLine`]. A word
//! starting with `;` ends the line, so trailing comments are allowed.
//! The lexer never fails: malformed words are returned as
//! [`TokenKind::Invalid`] and reported by the line validator.

use sui_types::{SourceFile, Span};

use crate::token::{Token, TokenKind, COMMENT_PREFIX};

/// Tokens of one significant source line.
#[derive(Debug, Clone, PartialEq)]
pub struct LexedLine {
    /// 1-based line number.
    pub number: u32,
    /// The raw line text, for diagnostics.
    pub text: String,
    /// Never empty.
    pub tokens: Vec<Token>,
}

/// Result of lexing a whole source unit.
#[derive(Debug, Clone, Default)]
pub struct LexResult {
    pub lines: Vec<LexedLine>,
}

/// The Sui lexer.
pub struct Lexer<'src> {
    source_file: &'src SourceFile,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self { source_file }
    }

    /// Lex every significant line of the file.
    pub fn lex(self) -> LexResult {
        let lines = self
            .source_file
            .lines()
            .filter_map(|(number, text)| {
                let tokens = lex_line(text, number);
                (!tokens.is_empty()).then(|| LexedLine {
                    number,
                    text: text.to_string(),
                    tokens,
                })
            })
            .collect();
        LexResult { lines }
    }
}

/// Split one line into tokens, dropping comments.
///
/// Returns an empty vector for blank and comment-only lines.
pub fn lex_line(text: &str, line: u32) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = text;
    let mut offset = 0usize;

    loop {
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            break;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let word = &trimmed[..end];
        let column = text[..offset].chars().count() as u32 + 1;
        let span = Span::new(line, column, column + word.chars().count() as u32);
        tokens.push(Token::new(TokenKind::classify(word), word, span));
        offset += end;
        rest = &trimmed[end..];
    }

    tokens
}
