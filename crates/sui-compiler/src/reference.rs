//! Machine-generated Sui reference and opcode table.
//!
//! Produces two text artifacts from [`Opcode::ALL`]:
//! 1. **Compact Sui reference** for `sui --reference`
//! 2. **Structured opcode table** (JSON) for tooling and documentation
//!
//! Both follow the opcode table in `sui-types`, so a new opcode or a
//! changed signature shows up without editing this file.

use serde::Serialize;
use sui_types::{Opcode, OperandKind};

/// One-line semantics per opcode.
fn describe(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Assign => "dest = value",
        Opcode::Add => "dest = a + b (wrapping)",
        Opcode::Sub => "dest = a - b (wrapping)",
        Opcode::Mul => "dest = a * b (wrapping)",
        Opcode::Div => "dest = a / b, truncating; error on b = 0 or MIN / -1",
        Opcode::Rem => "dest = a % b, sign of a; error on b = 0",
        Opcode::Lt => "dest = 1 if a < b else 0",
        Opcode::Gt => "dest = 1 if a > b else 0",
        Opcode::Eq => "dest = 1 if a == b else 0",
        Opcode::Not => "dest = 1 if a == 0 else 0",
        Opcode::And => "dest = 1 if a != 0 and b != 0 else 0",
        Opcode::Or => "dest = 1 if a != 0 or b != 0 else 0",
        Opcode::Label => "jump target, unique within its scope",
        Opcode::Jump => "jump to label",
        Opcode::JumpIf => "jump to label if cond != 0",
        Opcode::DefineFunc => "open function <index> taking <count> arguments",
        Opcode::BlockClose => "close the open function",
        Opcode::Call => "dest = result of calling function <index> with args",
        Opcode::Return => "return value from the current function",
        Opcode::Output => "print value on its own line",
    }
}

fn operand_name(kind: OperandKind, position: usize, opcode: Opcode) -> &'static str {
    match kind {
        OperandKind::Dest => "dest",
        OperandKind::Value if opcode == Opcode::JumpIf => "cond",
        OperandKind::Value if opcode.signature().len() == 3 => {
            if position == 1 {
                "a"
            } else {
                "b"
            }
        }
        OperandKind::Value if opcode == Opcode::Not => "a",
        OperandKind::Value => "value",
        OperandKind::Label => "label",
        OperandKind::FuncIndex => "index",
        OperandKind::Count => "count",
        OperandKind::BlockOpen => "{",
    }
}

/// The syntax of one opcode line, e.g. `+ dest a b`.
pub fn syntax(opcode: Opcode) -> String {
    let mut parts = vec![opcode.sigil().to_string()];
    for (position, kind) in opcode.signature().iter().enumerate() {
        let name = operand_name(*kind, position, opcode);
        parts.push(if *kind == OperandKind::BlockOpen {
            name.to_string()
        } else {
            format!("<{name}>")
        });
    }
    if opcode.is_variadic() {
        parts.push("<args...>".to_string());
    }
    parts.join(" ")
}

// ══════════════════════════════════════════════════════════════════════════════
// Reference text
// ══════════════════════════════════════════════════════════════════════════════

/// Generate the compact Sui reference.
pub fn generate_reference() -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(REFERENCE_PREAMBLE);

    out.push_str("OPCODES:\n");
    let width = Opcode::ALL.iter().map(|op| syntax(*op).len()).max().unwrap_or(0);
    for opcode in Opcode::ALL {
        out.push_str(&format!(
            "  {:<width$}  {}\n",
            syntax(opcode),
            describe(opcode)
        ));
    }
    out.push('\n');

    out.push_str(REFERENCE_POSTAMBLE);
    out
}

const REFERENCE_PREAMBLE: &str = r#"SUI: line-oriented, slot-based language. One instruction per line.
Comments: ';' to end of line. Blank lines are ignored.

VALUES: signed 64-bit integers, wrapping on overflow.
SLOTS:
  g<N>   global, shared by all code
  v<N>   local, zeroed on each call (functions only)
  a<N>   argument N of the current function (functions only)
  <int>  literal, e.g. 42 or -7 (anywhere a value is read)

"#;

const REFERENCE_POSTAMBLE: &str = r#"FUNCTIONS:
  # 0 1 {          function 0 takes one argument (a0)
  + v0 a0 1
  ^ v0
  }
  $ g0 0 10        g0 = f0(10)
  Indices are dense from 0 in definition order. Functions cannot nest.
  A function that reaches '}' returns 0. Calls may precede definitions.

RULES:
  - Labels are per scope; jumps only reach labels in the same scope
  - Reading a global that was never written is a runtime error
  - '^' and v/a slots are only valid inside functions
"#;

// ══════════════════════════════════════════════════════════════════════════════
// Opcode table (JSON)
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct OpcodeTable {
    version: &'static str,
    total_opcodes: usize,
    opcodes: Vec<OpcodeEntry>,
}

#[derive(Serialize)]
struct OpcodeEntry {
    sigil: &'static str,
    name: Opcode,
    syntax: String,
    arity: String,
    variadic: bool,
    description: &'static str,
}

/// Generate a structured JSON opcode table for tooling and documentation.
///
/// ```json
/// {
///   "version": "0.1.0",
///   "total_opcodes": 20,
///   "opcodes": [
///     { "sigil": "=", "name": "assign", "syntax": "= <dest> <value>", ... }
///   ]
/// }
/// ```
pub fn generate_opcode_table() -> String {
    let opcodes: Vec<OpcodeEntry> = Opcode::ALL
        .into_iter()
        .map(|opcode| OpcodeEntry {
            sigil: opcode.sigil(),
            name: opcode,
            syntax: syntax(opcode),
            arity: opcode.arity_description(),
            variadic: opcode.is_variadic(),
            description: describe(opcode),
        })
        .collect();
    let table = OpcodeTable {
        version: env!("CARGO_PKG_VERSION"),
        total_opcodes: opcodes.len(),
        opcodes,
    };
    serde_json::to_string_pretty(&table).unwrap_or_default()
}

// ══════════════════════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════════════════════
