//! Sui lexer: splits source lines into classified tokens.

pub mod lexer;
pub mod token;

pub use lexer::{lex_line, LexResult, LexedLine, Lexer};
pub use token::{Token, TokenKind, COMMENT_PREFIX};
