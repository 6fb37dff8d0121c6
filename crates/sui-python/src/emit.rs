//! Sui to Python source.

use std::collections::BTreeSet;

use sui_types::model::has_labels;
use sui_types::{Function, Instruction, Opcode, Operand, Program, MAX_CALL_FRAMES};

/// Recursion limit set by every emitted script. CPython's default of 1000
/// sits below [`MAX_CALL_FRAMES`]; the margin covers the module frame and
/// the helper called from the deepest function.
pub const PYTHON_RECURSION_LIMIT: usize = MAX_CALL_FRAMES + 64;

/// Runtime helpers prepended to every emitted script.
///
/// `_wrap` reduces to signed 64-bit; `_div` and `_rem` truncate toward
/// zero and raise where the interpreter reports a runtime error.
pub const HELPERS: &str = r#"def _wrap(x):
    x &= 0xFFFFFFFFFFFFFFFF
    return x - 0x10000000000000000 if x >= 0x8000000000000000 else x


def _div(a, b):
    if b == 0:
        raise ZeroDivisionError("division by zero")
    q = abs(a) // abs(b)
    q = q if (a < 0) == (b < 0) else -q
    if q > 0x7FFFFFFFFFFFFFFF:
        raise OverflowError("division overflow")
    return q


def _rem(a, b):
    if b == 0:
        raise ZeroDivisionError("division by zero")
    r = abs(a) % abs(b)
    return -r if a < 0 else r
"#;

const HELPER_NAMES: [&str; 3] = ["_wrap", "_div", "_rem"];

/// Render `program` as a Python 3 script.
pub fn emit_python(program: &Program) -> String {
    let mut out = PyEmitter::new();
    out.push_line("# Generated by sui2py.");
    out.push_line("");
    out.push_line("import sys");
    out.push_line(format!("sys.setrecursionlimit({PYTHON_RECURSION_LIMIT})"));
    out.push_line("");
    out.push_line("");
    for line in HELPERS.lines() {
        out.push_line(line);
    }

    for function in &program.functions {
        out.push_line("");
        out.push_line("");
        emit_function(&mut out, function);
    }

    if !program.instructions.is_empty() {
        out.push_line("");
        out.push_line("");
        emit_body(&mut out, &program.instructions, false);
    }
    out.finish()
}

fn emit_function(out: &mut PyEmitter, function: &Function) {
    let params: Vec<String> = (0..function.param_count).map(|n| format!("a{n}")).collect();
    out.push_line(format!("def f{}({}):", function.index, params.join(", ")));
    out.indent();

    let written: BTreeSet<u32> = function
        .body
        .iter()
        .filter_map(|inst| match inst.dest() {
            Some(Operand::Global(n)) => Some(n),
            _ => None,
        })
        .collect();
    if !written.is_empty() {
        let names: Vec<String> = written.iter().map(|n| format!("g{n}")).collect();
        out.push_line(format!("global {}", names.join(", ")));
    }
    for n in 0..function.local_count {
        out.push_line(format!("v{n} = 0"));
    }

    emit_body(out, &function.body, true);
    out.push_line("return 0");
    out.dedent();
}

/// Straight-line bodies map one instruction to one statement. Bodies with
/// labels become a `_pc` state machine: one `if _pc == k:` block per
/// segment inside `while True:`, falling through by bumping `_pc`.
fn emit_body(out: &mut PyEmitter, body: &[Instruction], in_function: bool) {
    if !has_labels(body) {
        for inst in body {
            emit_statement(out, inst, in_function, &[]);
        }
        return;
    }

    let mut bounds = vec![0];
    let mut segments: Vec<(u32, usize)> = Vec::new();
    for (pos, inst) in body.iter().enumerate() {
        if inst.opcode == Opcode::Label {
            bounds.push(pos);
            if let Some(label) = inst.label() {
                if !segments.iter().any(|(l, _)| *l == label) {
                    segments.push((label, bounds.len() - 1));
                }
            }
        }
    }
    bounds.push(body.len());
    let count = bounds.len() - 1;

    out.push_line("_pc = 0");
    out.push_line("while True:");
    out.indent();
    for k in 0..count {
        out.push_line(format!("if _pc == {k}:"));
        out.indent();
        for inst in &body[bounds[k]..bounds[k + 1]] {
            emit_statement(out, inst, in_function, &segments);
        }
        if k + 1 < count {
            out.push_line(format!("_pc = {}", k + 1));
        } else {
            out.push_line("break");
        }
        out.dedent();
    }
    out.dedent();
}

fn emit_statement(out: &mut PyEmitter, inst: &Instruction, in_function: bool, segments: &[(u32, usize)]) {
    if !inst.is_well_formed() {
        out.push_line(format!(
            "raise RuntimeError(\"line {}: malformed '{}' instruction\")",
            inst.line, inst.opcode
        ));
        return;
    }
    let ops = &inst.operands;
    let binary = |template: &str| {
        format!(
            "{} = {}",
            ops[0],
            template.replace("{a}", &ops[1].to_string()).replace("{b}", &ops[2].to_string())
        )
    };
    match inst.opcode {
        Opcode::Assign => out.push_line(format!("{} = {}", ops[0], ops[1])),
        Opcode::Add => out.push_line(binary("_wrap({a} + {b})")),
        Opcode::Sub => out.push_line(binary("_wrap({a} - {b})")),
        Opcode::Mul => out.push_line(binary("_wrap({a} * {b})")),
        Opcode::Div => out.push_line(binary("_div({a}, {b})")),
        Opcode::Rem => out.push_line(binary("_rem({a}, {b})")),
        Opcode::Lt => out.push_line(binary("int({a} < {b})")),
        Opcode::Gt => out.push_line(binary("int({a} > {b})")),
        Opcode::Eq => out.push_line(binary("int({a} == {b})")),
        Opcode::And => out.push_line(binary("int({a} != 0 and {b} != 0)")),
        Opcode::Or => out.push_line(binary("int({a} != 0 or {b} != 0)")),
        Opcode::Not => out.push_line(format!("{} = int(not {})", ops[0], ops[1])),
        Opcode::Label => {
            if let Some(label) = inst.label() {
                out.push_line(format!("# label {label}"));
            }
        }
        Opcode::Jump => emit_jump(out, inst, segments),
        Opcode::JumpIf => {
            out.push_line(format!("if {} != 0:", ops[0]));
            out.indent();
            emit_jump(out, inst, segments);
            out.dedent();
        }
        Opcode::Call => {
            if let Some((index, args)) = inst.call_target() {
                let args: Vec<String> = args.iter().map(Operand::to_string).collect();
                out.push_line(format!("{} = f{index}({})", ops[0], args.join(", ")));
            }
        }
        Opcode::Return if in_function => out.push_line(format!("return {}", ops[0])),
        Opcode::Return => {
            out.push_line("raise RuntimeError(\"'^' outside a function\")");
        }
        Opcode::Output => out.push_line(format!("print({})", ops[0])),
        Opcode::DefineFunc | Opcode::BlockClose => {}
    }
}

fn emit_jump(out: &mut PyEmitter, inst: &Instruction, segments: &[(u32, usize)]) {
    let label = inst.label().unwrap_or_default();
    match segments.iter().find(|(l, _)| *l == label) {
        Some((_, segment)) => {
            out.push_line(format!("_pc = {segment}"));
            out.push_line("continue");
        }
        None => out.push_line(format!(
            "raise RuntimeError(\"jump to undefined label {label}\")"
        )),
    }
}

/// Blank out the recursion-limit preamble and the helper definitions,
/// keeping line numbers intact, so the reverse translator never sees them.
pub(crate) fn strip_helpers(source: &str) -> String {
    let mut skipping = false;
    let mut lines = Vec::new();
    for line in source.lines() {
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if is_preamble(line) {
            lines.push("");
            continue;
        }
        if is_helper_def(line) {
            skipping = true;
        } else if skipping && !indented && !line.trim().is_empty() {
            skipping = false;
        }
        lines.push(if skipping { "" } else { line });
    }
    lines.join("\n")
}

fn is_preamble(line: &str) -> bool {
    line == "import sys" || line.starts_with("sys.setrecursionlimit(")
}

fn is_helper_def(line: &str) -> bool {
    line.strip_prefix("def ")
        .map(|rest| {
            HELPER_NAMES
                .iter()
                .any(|name| rest.strip_prefix(name).is_some_and(|r| r.starts_with('(')))
        })
        .unwrap_or(false)
}

// ══════════════════════════════════════════════════════════════════════════════
// Text emitter
// ══════════════════════════════════════════════════════════════════════════════

struct PyEmitter {
    lines: Vec<String>,
    indent: usize,
}

impl PyEmitter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
        }
    }

    fn push_line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if line.is_empty() {
            self.lines.push(String::new());
            return;
        }
        let prefix = "    ".repeat(self.indent);
        self.lines.push(format!("{prefix}{line}"));
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
