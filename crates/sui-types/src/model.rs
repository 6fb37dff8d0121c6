//! The Sui instruction model shared by every backend.
//!
//! A [`Program`] is the parsed, structurally checked form of one source
//! unit. It is immutable once built: the interpreter, the WebAssembly
//! emitter and the Python emitter all read the same value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every Sui value is a wrapping two's-complement 64-bit integer.
pub type Value = i64;

/// Deepest call stack any backend allows, counting the entry frame
/// (module code, or the function called directly from the host). This is
/// the wasmi engine's default recursion limit.
pub const MAX_CALL_FRAMES: usize = 1024;

// ══════════════════════════════════════════════════════════════════════════════
// Opcodes
// ══════════════════════════════════════════════════════════════════════════════

/// What an operand position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A writable slot: `g`, `v` or `a`.
    Dest,
    /// A slot or an integer literal.
    Value,
    /// A non-negative integer literal naming a jump target.
    Label,
    /// A non-negative integer literal naming a function.
    FuncIndex,
    /// A non-negative integer literal count.
    Count,
    /// The block-open token `{`.
    BlockOpen,
}

/// Sui opcodes. Each has a one-character sigil and a fixed operand signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Eq,
    Not,
    And,
    Or,
    Label,
    Jump,
    JumpIf,
    DefineFunc,
    BlockClose,
    Call,
    Return,
    Output,
}

use OperandKind::{BlockOpen, Count, Dest, FuncIndex, Label as LabelKind, Value as ValueKind};

const BINARY: &[OperandKind] = &[Dest, ValueKind, ValueKind];

impl Opcode {
    /// All opcodes, in sigil-table order.
    pub const ALL: [Opcode; 20] = [
        Opcode::Assign,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Rem,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::Eq,
        Opcode::Not,
        Opcode::And,
        Opcode::Or,
        Opcode::Label,
        Opcode::Jump,
        Opcode::JumpIf,
        Opcode::DefineFunc,
        Opcode::BlockClose,
        Opcode::Call,
        Opcode::Return,
        Opcode::Output,
    ];

    pub fn sigil(self) -> &'static str {
        match self {
            Opcode::Assign => "=",
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            Opcode::Div => "/",
            Opcode::Rem => "%",
            Opcode::Lt => "<",
            Opcode::Gt => ">",
            Opcode::Eq => "~",
            Opcode::Not => "!",
            Opcode::And => "&",
            Opcode::Or => "|",
            Opcode::Label => ":",
            Opcode::Jump => "@",
            Opcode::JumpIf => "?",
            Opcode::DefineFunc => "#",
            Opcode::BlockClose => "}",
            Opcode::Call => "$",
            Opcode::Return => "^",
            Opcode::Output => ".",
        }
    }

    pub fn from_sigil(s: &str) -> Option<Opcode> {
        Opcode::ALL.into_iter().find(|op| op.sigil() == s)
    }

    /// Fixed operand signature. For [`Opcode::Call`] this is the required
    /// prefix; any number of trailing `Value` arguments may follow.
    pub fn signature(self) -> &'static [OperandKind] {
        match self {
            Opcode::Assign => &[Dest, ValueKind],
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or => BINARY,
            Opcode::Not => &[Dest, ValueKind],
            Opcode::Label | Opcode::Jump => &[LabelKind],
            Opcode::JumpIf => &[ValueKind, LabelKind],
            Opcode::DefineFunc => &[FuncIndex, Count, BlockOpen],
            Opcode::BlockClose => &[],
            Opcode::Call => &[Dest, FuncIndex],
            Opcode::Return | Opcode::Output => &[ValueKind],
        }
    }

    pub fn is_variadic(self) -> bool {
        self == Opcode::Call
    }

    /// Human-readable arity, e.g. `3` or `at least 2`.
    pub fn arity_description(self) -> String {
        let n = self.signature().len();
        if self.is_variadic() {
            format!("at least {n}")
        } else {
            n.to_string()
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sigil())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operands & instructions
// ══════════════════════════════════════════════════════════════════════════════

/// A tagged reference to a slot or an immediate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Global(u32),
    Local(u32),
    Arg(u32),
    Literal(Value),
}

impl Operand {
    /// The literal value, if this operand is one.
    pub fn literal(self) -> Option<Value> {
        match self {
            Operand::Literal(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Global(i) => write!(f, "g{i}"),
            Operand::Local(i) => write!(f, "v{i}"),
            Operand::Arg(i) => write!(f, "a{i}"),
            Operand::Literal(v) => write!(f, "{v}"),
        }
    }
}

/// One executable instruction.
///
/// `DefineFunc` and `BlockClose` never appear inside a built [`Program`];
/// they are consumed by the program builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    /// 1-based source line.
    pub line: u32,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>, line: u32) -> Self {
        Self {
            opcode,
            operands,
            line,
        }
    }

    /// Destination slot of value-producing instructions.
    pub fn dest(&self) -> Option<Operand> {
        match self.opcode {
            Opcode::Assign
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::Not
            | Opcode::And
            | Opcode::Or
            | Opcode::Call => self.operands.first().copied(),
            _ => None,
        }
    }

    /// Operand `n`, if present.
    pub fn operand(&self, n: usize) -> Option<Operand> {
        self.operands.get(n).copied()
    }

    /// Whether the operands cover the opcode's fixed signature. Parsed
    /// programs always do; a hand-assembled [`Program`] may not.
    pub fn is_well_formed(&self) -> bool {
        let required = match self.opcode {
            Opcode::DefineFunc | Opcode::BlockClose => 0,
            opcode => opcode.signature().len(),
        };
        self.operands.len() >= required
    }

    /// Label operand of `:`, `@` and `?`.
    pub fn label(&self) -> Option<u32> {
        let op = match self.opcode {
            Opcode::Label | Opcode::Jump => self.operands.first(),
            Opcode::JumpIf => self.operands.get(1),
            _ => None,
        };
        op.and_then(|o| o.literal()).map(|v| v as u32)
    }

    /// For `$`: the callee index and argument operands.
    pub fn call_target(&self) -> Option<(u32, &[Operand])> {
        if self.opcode != Opcode::Call {
            return None;
        }
        let index = self.operands.get(1)?.literal()? as u32;
        Some((index, &self.operands[2..]))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.sigil())?;
        for op in &self.operands {
            write!(f, " {op}")?;
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions & programs
// ══════════════════════════════════════════════════════════════════════════════

/// A user-defined function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Dense index in definition order; also the WASM export suffix.
    pub index: u32,
    pub param_count: u32,
    /// One more than the highest `v` slot used in the body.
    pub local_count: u32,
    pub body: Vec<Instruction>,
    /// Line of the `#` opener.
    pub line: u32,
}

impl Function {
    pub fn has_labels(&self) -> bool {
        has_labels(&self.body)
    }
}

/// A structurally complete Sui source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Module-level instructions, in source order.
    pub instructions: Vec<Instruction>,
    /// Functions indexed by their position.
    pub functions: Vec<Function>,
    /// One more than the highest `g` slot referenced anywhere.
    pub global_count: u32,
}

impl Program {
    pub fn function(&self, index: u32) -> Option<&Function> {
        self.functions.iter().find(|f| f.index == index)
    }

    /// Every instruction of the program: function bodies, then module level.
    pub fn all_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.functions
            .iter()
            .flat_map(|f| f.body.iter())
            .chain(self.instructions.iter())
    }
}

/// Whether an instruction sequence uses labels or jumps.
pub fn has_labels(body: &[Instruction]) -> bool {
    body.iter().any(|i| {
        matches!(
            i.opcode,
            Opcode::Label | Opcode::Jump | Opcode::JumpIf
        )
    })
}

impl fmt::Display for Program {
    /// Renders canonical Sui source: functions first, then module-level code.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.functions {
            writeln!(f, "# {} {} {{", func.index, func.param_count)?;
            for inst in &func.body {
                writeln!(f, "{inst}")?;
            }
            writeln!(f, "}}")?;
        }
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil_roundtrip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_sigil(op.sigil()), Some(op));
        }
        assert_eq!(Opcode::from_sigil("x"), None);
        assert_eq!(Opcode::from_sigil("=="), None);
    }

    #[test]
    fn test_arity_description() {
        assert_eq!(Opcode::Add.arity_description(), "3");
        assert_eq!(Opcode::Call.arity_description(), "at least 2");
        assert_eq!(Opcode::BlockClose.arity_description(), "0");
    }

    #[test]
    fn test_instruction_accessors() {
        let call = Instruction::new(
            Opcode::Call,
            vec![Operand::Global(1), Operand::Literal(0), Operand::Global(0)],
            3,
        );
        assert_eq!(call.dest(), Some(Operand::Global(1)));
        let (idx, args) = call.call_target().unwrap();
        assert_eq!(idx, 0);
        assert_eq!(args, &[Operand::Global(0)]);

        let jump_if = Instruction::new(
            Opcode::JumpIf,
            vec![Operand::Local(0), Operand::Literal(7)],
            4,
        );
        assert_eq!(jump_if.label(), Some(7));
        assert_eq!(jump_if.dest(), None);
        assert_eq!(jump_if.operand(1), Some(Operand::Literal(7)));
        assert_eq!(jump_if.operand(2), None);
    }

    #[test]
    fn test_short_operand_lists_are_not_well_formed() {
        let short = Instruction::new(Opcode::Add, vec![Operand::Global(0), Operand::Literal(1)], 1);
        assert!(!short.is_well_formed());
        let call = Instruction::new(Opcode::Call, vec![Operand::Global(0)], 1);
        assert!(!call.is_well_formed());
        let call = Instruction::new(Opcode::Call, vec![Operand::Global(0), Operand::Literal(0)], 1);
        assert!(call.is_well_formed());
        assert!(Instruction::new(Opcode::BlockClose, vec![], 1).is_well_formed());
        assert!(!Instruction::new(Opcode::Output, vec![], 1).is_well_formed());
    }

    #[test]
    fn test_program_display_is_sui_source() {
        let program = Program {
            instructions: vec![
                Instruction::new(Opcode::Assign, vec![Operand::Global(0), Operand::Literal(10)], 5),
                Instruction::new(
                    Opcode::Call,
                    vec![Operand::Global(1), Operand::Literal(0), Operand::Global(0)],
                    6,
                ),
                Instruction::new(Opcode::Output, vec![Operand::Global(1)], 7),
            ],
            functions: vec![Function {
                index: 0,
                param_count: 1,
                local_count: 1,
                body: vec![
                    Instruction::new(
                        Opcode::Add,
                        vec![Operand::Local(0), Operand::Arg(0), Operand::Literal(1)],
                        2,
                    ),
                    Instruction::new(Opcode::Return, vec![Operand::Local(0)], 3),
                ],
                line: 1,
            }],
            global_count: 2,
        };
        assert_eq!(
            program.to_string(),
            "# 0 1 {\n+ v0 a0 1\n^ v0\n}\n= g0 10\n$ g1 0 g0\n. g1\n"
        );
        assert_eq!(program.all_instructions().count(), 5);
    }

    #[test]
    fn test_negative_literal_display() {
        assert_eq!(Operand::Literal(-5).to_string(), "-5");
    }
}
