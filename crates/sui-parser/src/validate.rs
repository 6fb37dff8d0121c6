//! Per-line syntactic validation.
//!
//! [`check_tokens`] is the single source of truth for what a well-formed
//! line looks like; the program builder uses it too, so a line accepted
//! by [`validate_line`] always parses.

use std::fmt;

use sui_lexer::{lex_line, Token, TokenKind};
use sui_types::{ErrorCode, Instruction, Opcode, Operand, OperandKind, Span};

/// Why a line is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl LineError {
    fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LineError {}

/// A syntactically valid line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Nothing to do (blank or comment).
    Empty,
    /// `# index params {`
    FunctionOpen { index: u32, param_count: u32 },
    /// `}`
    BlockClose,
    Instruction(Instruction),
}

/// Validate a single line of Sui source.
///
/// Blank and comment lines are valid. On failure the error message names
/// the offending token.
pub fn validate_line(line: &str) -> Result<(), LineError> {
    check_tokens(&lex_line(line, 1), 1).map(|_| ())
}

/// Validate every line of `source`, returning `(line_number, message)`
/// pairs for the malformed ones. Line numbers are 1-based.
pub fn validate_source(source: &str) -> Vec<(u32, LineError)> {
    source
        .lines()
        .zip(1u32..)
        .filter_map(|(text, number)| {
            check_tokens(&lex_line(text, number), number)
                .err()
                .map(|e| (number, e))
        })
        .collect()
}

/// Check a tokenized line against its opcode signature.
pub fn check_tokens(tokens: &[Token], line: u32) -> Result<ParsedLine, LineError> {
    let Some((head, operands)) = tokens.split_first() else {
        return Ok(ParsedLine::Empty);
    };
    let TokenKind::Opcode(opcode) = head.kind else {
        return Err(LineError::new(
            ErrorCode::UNKNOWN_OPCODE,
            format!("Unknown opcode '{}'", head.text),
            head.span,
        ));
    };

    let signature = opcode.signature();
    if opcode == Opcode::DefineFunc && operands.last().map(|t| &t.kind) != Some(&TokenKind::BlockOpen)
    {
        return Err(LineError::new(
            ErrorCode::MISSING_BLOCK_OPEN,
            "Function definition must end with '{'",
            head.span,
        ));
    }
    let arity_ok = if opcode.is_variadic() {
        operands.len() >= signature.len()
    } else {
        operands.len() == signature.len()
    };
    if !arity_ok {
        return Err(LineError::new(
            ErrorCode::WRONG_OPERAND_COUNT,
            format!(
                "Opcode '{}' expects {} operand(s), got {}",
                opcode,
                opcode.arity_description(),
                operands.len()
            ),
            head.span,
        ));
    }

    let mut values = Vec::with_capacity(operands.len());
    for (i, token) in operands.iter().enumerate() {
        let kind = signature.get(i).copied().unwrap_or(OperandKind::Value);
        if let Some(op) = check_operand(opcode, kind, token)? {
            values.push(op);
        }
    }

    Ok(match opcode {
        Opcode::DefineFunc => ParsedLine::FunctionOpen {
            index: as_index(values[0]),
            param_count: as_index(values[1]),
        },
        Opcode::BlockClose => ParsedLine::BlockClose,
        _ => ParsedLine::Instruction(Instruction::new(opcode, values, line)),
    })
}

/// Check one operand token. `BlockOpen` positions yield `None`.
fn check_operand(
    opcode: Opcode,
    kind: OperandKind,
    token: &Token,
) -> Result<Option<Operand>, LineError> {
    if token.kind == TokenKind::IntegerOutOfRange {
        return Err(LineError::new(
            ErrorCode::LITERAL_OUT_OF_RANGE,
            format!("Integer '{}' is out of range", token.text),
            token.span,
        ));
    }
    let invalid = |expected: &str| {
        LineError::new(
            ErrorCode::INVALID_OPERAND,
            format!(
                "Invalid operand '{}' for '{}': expected {}",
                token.text, opcode, expected
            ),
            token.span,
        )
    };
    match kind {
        OperandKind::BlockOpen => match token.kind {
            TokenKind::BlockOpen => Ok(None),
            _ => Err(invalid("'{'")),
        },
        OperandKind::Dest => match token.kind {
            TokenKind::Slot(op) => Ok(Some(op)),
            _ => Err(invalid("a slot (g/v/a)")),
        },
        OperandKind::Value => token
            .kind
            .operand()
            .map(Some)
            .ok_or_else(|| invalid("a slot (g/v/a) or an integer")),
        OperandKind::Label | OperandKind::FuncIndex | OperandKind::Count => match token.kind {
            TokenKind::Integer(v) if (0..=u32::MAX as i64).contains(&v) => {
                Ok(Some(Operand::Literal(v)))
            }
            _ => Err(invalid("a non-negative integer")),
        },
    }
}

fn as_index(op: Operand) -> u32 {
    op.literal().map(|v| v as u32).unwrap_or_default()
}
