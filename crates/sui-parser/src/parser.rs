//! Program builder: validated lines to a structurally checked [`Program`].
//!
//! The builder never produces a partial program. Every syntax and
//! structure problem is collected into [`Diagnostics`] (up to
//! [`sui_types::MAX_ERRORS`]) and the program is withheld if any exist.

use std::collections::{BTreeSet, HashMap};

use sui_lexer::{LexedLine, Lexer};
use sui_types::{
    Diagnostics, ErrorCode, Function, Instruction, Opcode, Operand, Program, SourceFile, Span,
    SuiError,
};
use tracing::debug;

use crate::block::{classify_line, LineClass};
use crate::validate::{check_tokens, ParsedLine};

/// What a session already knows when a new unit is parsed.
///
/// Batch compilation uses the default (nothing known). The REPL passes the
/// size of its function table so snippets can call, or redefine, functions
/// from earlier snippets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseContext {
    pub known_functions: u32,
}

/// Result of parsing.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Diagnostics,
}

/// Parse a whole source unit with no prior session state.
pub fn parse_program(source: &str, file_name: &str) -> Result<Program, Diagnostics> {
    let sf = SourceFile::new(file_name, source);
    Parser::new(&sf).parse().into_result()
}

impl ParseResult {
    pub fn into_result(self) -> Result<Program, Diagnostics> {
        match self.program {
            Some(program) if !self.errors.has_errors() => Ok(program),
            _ => Err(self.errors),
        }
    }
}

/// A function whose closing `}` has not been seen yet.
struct OpenFunction {
    index: u32,
    param_count: u32,
    line: u32,
    body: Vec<Instruction>,
    /// The opener itself was malformed; the body is checked but dropped.
    poisoned: bool,
}

/// The Sui program builder.
pub struct Parser<'src> {
    source_file: &'src SourceFile,
    context: ParseContext,
    errors: Diagnostics,
    instructions: Vec<Instruction>,
    functions: Vec<Function>,
    open: Option<OpenFunction>,
}

impl<'src> Parser<'src> {
    /// Create a new parser for a source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self::with_context(source_file, ParseContext::default())
    }

    /// Create a parser that knows about previously defined functions.
    pub fn with_context(source_file: &'src SourceFile, context: ParseContext) -> Self {
        Self {
            source_file,
            context,
            errors: Diagnostics::empty(),
            instructions: Vec::new(),
            functions: Vec::new(),
            open: None,
        }
    }

    /// Parse the whole file.
    pub fn parse(mut self) -> ParseResult {
        let lexed = Lexer::new(self.source_file).lex();
        for line in &lexed.lines {
            self.parse_line(line);
        }

        if let Some(open) = self.open.take() {
            self.error(
                ErrorCode::UNCLOSED_FUNCTION,
                format!("Function {} is never closed with '}}'", open.index),
                Span::line(open.line),
            );
        }

        self.check_module_scope();
        let bodies: Vec<(u32, Vec<Instruction>)> = self
            .functions
            .iter()
            .map(|f| (f.index, f.body.clone()))
            .collect();
        for (index, body) in &bodies {
            self.check_labels(body, &format!("function {index}"));
        }
        let module = self.instructions.clone();
        self.check_labels(&module, "module scope");
        self.check_calls();

        if self.errors.has_errors() {
            return ParseResult {
                program: None,
                errors: self.errors,
            };
        }

        let global_count = self
            .functions
            .iter()
            .flat_map(|f| f.body.iter())
            .chain(self.instructions.iter())
            .flat_map(|i| i.operands.iter())
            .filter_map(|op| match op {
                Operand::Global(n) => Some(n + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        debug!(
            file = %self.source_file.name,
            functions = self.functions.len(),
            instructions = self.instructions.len(),
            global_count,
            "parsed program"
        );

        ParseResult {
            program: Some(Program {
                instructions: self.instructions,
                functions: self.functions,
                global_count,
            }),
            errors: self.errors,
        }
    }

    // ── Lines ─────────────────────────────────────────────────────────────

    fn parse_line(&mut self, line: &LexedLine) {
        match check_tokens(&line.tokens, line.number) {
            Ok(ParsedLine::Empty) => {}
            Ok(ParsedLine::FunctionOpen { index, param_count }) => {
                self.open_function(index, param_count, line.number, false)
            }
            Ok(ParsedLine::BlockClose) => self.close_function(line.number),
            Ok(ParsedLine::Instruction(inst)) => match self.open.as_mut() {
                Some(open) => open.body.push(inst),
                None => self.instructions.push(inst),
            },
            Err(e) => {
                self.push(SuiError::new(
                    &self.source_file.name,
                    e.code,
                    e.message,
                    e.span,
                    line.text.clone(),
                ));
                // Keep block structure in sync with the depth tracker so a
                // bad opener does not also produce a stray-`}` error.
                match classify_line(&line.text) {
                    LineClass::Opener => self.open_function(u32::MAX, 0, line.number, true),
                    LineClass::Closer => self.close_function(line.number),
                    LineClass::Plain | LineClass::Skip => {}
                }
            }
        }
    }

    fn open_function(&mut self, index: u32, param_count: u32, line: u32, poisoned: bool) {
        if self.open.is_some() {
            self.error(
                ErrorCode::NESTED_FUNCTION,
                "Function definitions cannot be nested",
                Span::line(line),
            );
            return;
        }
        if !poisoned {
            self.check_function_index(index, line);
        }
        self.open = Some(OpenFunction {
            index,
            param_count,
            line,
            body: Vec::new(),
            poisoned,
        });
    }

    fn check_function_index(&mut self, index: u32, line: u32) {
        let known = self.context.known_functions;
        let appended = self
            .functions
            .iter()
            .filter(|f| f.index >= known)
            .count() as u32;
        let next = known + appended;
        let already_defined = self.functions.iter().any(|f| f.index == index);
        if already_defined {
            self.error(
                ErrorCode::DUPLICATE_FUNCTION,
                format!("Function {index} is defined more than once"),
                Span::line(line),
            );
        } else if index != next && index >= known {
            self.push(
                SuiError::new(
                    &self.source_file.name,
                    ErrorCode::FUNCTION_INDEX_OUT_OF_ORDER,
                    format!("Function index {index} is out of order, expected {next}"),
                    Span::line(line),
                    self.source_line(line),
                )
                .with_suggestion(format!("number functions densely: '# {next} ...'")),
            );
        }
    }

    fn close_function(&mut self, line: u32) {
        let Some(open) = self.open.take() else {
            self.error(
                ErrorCode::UNMATCHED_BLOCK_CLOSE,
                "'}' without a matching function definition",
                Span::line(line),
            );
            return;
        };
        if open.poisoned {
            return;
        }

        for inst in &open.body {
            for op in &inst.operands {
                if let Operand::Arg(n) = op {
                    if *n >= open.param_count {
                        self.error(
                            ErrorCode::ARGUMENT_OUT_OF_RANGE,
                            format!(
                                "Argument a{n} is out of range: function {} takes {} parameter(s)",
                                open.index, open.param_count
                            ),
                            Span::line(inst.line),
                        );
                    }
                }
            }
        }

        let local_count = open
            .body
            .iter()
            .flat_map(|i| i.operands.iter())
            .filter_map(|op| match op {
                Operand::Local(n) => Some(n + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        self.functions.push(Function {
            index: open.index,
            param_count: open.param_count,
            local_count,
            body: open.body,
            line: open.line,
        });
    }

    // ── Whole-unit checks ─────────────────────────────────────────────────

    fn check_module_scope(&mut self) {
        let mut problems = Vec::new();
        for inst in &self.instructions {
            if inst.opcode == Opcode::Return {
                problems.push((
                    ErrorCode::RETURN_OUTSIDE_FUNCTION,
                    "'^' is only allowed inside a function".to_string(),
                    inst.line,
                ));
            }
            for op in &inst.operands {
                if matches!(op, Operand::Local(_) | Operand::Arg(_)) {
                    problems.push((
                        ErrorCode::SLOT_OUTSIDE_FUNCTION,
                        format!("Slot '{op}' is only available inside a function"),
                        inst.line,
                    ));
                }
            }
        }
        for (code, message, line) in problems {
            self.error(code, message, Span::line(line));
        }
    }

    fn check_labels(&mut self, body: &[Instruction], scope: &str) {
        let mut defined: HashMap<u32, u32> = HashMap::new();
        for inst in body.iter().filter(|i| i.opcode == Opcode::Label) {
            let Some(label) = inst.label() else { continue };
            if let Some(first) = defined.insert(label, inst.line) {
                self.error(
                    ErrorCode::DUPLICATE_LABEL,
                    format!("Label {label} is already defined on line {first} in {scope}"),
                    Span::line(inst.line),
                );
            }
        }
        for inst in body
            .iter()
            .filter(|i| matches!(i.opcode, Opcode::Jump | Opcode::JumpIf))
        {
            let Some(label) = inst.label() else { continue };
            if !defined.contains_key(&label) {
                self.error(
                    ErrorCode::UNDEFINED_LABEL,
                    format!("Jump to undefined label {label} in {scope}"),
                    Span::line(inst.line),
                );
            }
        }
    }

    fn check_calls(&mut self) {
        let defined: BTreeSet<u32> = (0..self.context.known_functions)
            .chain(self.functions.iter().map(|f| f.index))
            .collect();
        let bad: Vec<(u32, u32)> = self
            .functions
            .iter()
            .flat_map(|f| f.body.iter())
            .chain(self.instructions.iter())
            .filter_map(|i| i.call_target().map(|(index, _)| (index, i.line)))
            .filter(|(index, _)| !defined.contains(index))
            .collect();
        for (index, line) in bad {
            self.error(
                ErrorCode::UNDEFINED_FUNCTION,
                format!("Call to undefined function {index}"),
                Span::line(line),
            );
        }
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    fn source_line(&self, line: u32) -> String {
        self.source_file.line(line).unwrap_or("").to_string()
    }

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let err = SuiError::new(
            &self.source_file.name,
            code,
            message,
            span,
            self.source_line(span.line),
        );
        self.push(err);
    }

    fn push(&mut self, err: SuiError) {
        self.errors.push_error(err);
    }
}
