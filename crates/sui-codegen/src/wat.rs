//! Program to WebAssembly text.

use std::collections::HashMap;

use sui_types::model::has_labels;
use sui_types::{Function, Instruction, Opcode, Operand, Program};

use crate::error::{CodegenError, CodegenResult};
use crate::types::{
    function_export, global_export, IMPORT_MODULE, MAIN_EXPORT, PRINT_IMPORT,
};

/// Lower `program` to a complete WAT module.
///
/// Fails only on calls whose argument count does not match the callee, or
/// on instructions that cannot appear where they are.
pub fn emit_wat(program: &Program) -> CodegenResult<String> {
    let mut emitter = WatEmitter::new();
    emitter.push_line("(module");
    emitter.indent();

    emitter.push_line(format!(
        "(import \"{IMPORT_MODULE}\" \"{PRINT_IMPORT}\" (func ${PRINT_IMPORT} (param i64)))"
    ));

    for index in 0..program.global_count {
        emitter.push_line(format!("(global $g{index} (mut i64) (i64.const 0))"));
        emitter.push_line(format!(
            "(export \"{}\" (global $g{index}))",
            global_export(index)
        ));
    }

    for function in &program.functions {
        emit_function(&mut emitter, program, function)?;
    }
    emit_main(&mut emitter, program)?;

    emitter.dedent();
    emitter.push_line(")");
    Ok(emitter.finish())
}

fn emit_function(
    emitter: &mut WatEmitter,
    program: &Program,
    function: &Function,
) -> CodegenResult<()> {
    let mut signature = format!(
        "(func $f{} (export \"{}\")",
        function.index,
        function_export(function.index)
    );
    for n in 0..function.param_count {
        signature.push_str(&format!(" (param $a{n} i64)"));
    }
    signature.push_str(" (result i64)");
    emitter.push_line(signature);
    emitter.indent();

    for n in 0..function.local_count {
        emitter.push_line(format!("(local $v{n} i64)"));
    }
    if function.has_labels() {
        emitter.push_line("(local $pc i32)");
    }

    BodyCompiler::new(program, emitter, true).emit_body(&function.body)?;
    // Falling off the end returns 0.
    emitter.push_line("i64.const 0");

    emitter.dedent();
    emitter.push_line(")");
    Ok(())
}

fn emit_main(emitter: &mut WatEmitter, program: &Program) -> CodegenResult<()> {
    emitter.push_line(format!("(func ${MAIN_EXPORT} (export \"{MAIN_EXPORT}\")"));
    emitter.indent();
    if has_labels(&program.instructions) {
        emitter.push_line("(local $pc i32)");
    }
    BodyCompiler::new(program, emitter, false).emit_body(&program.instructions)?;
    emitter.dedent();
    emitter.push_line(")");
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Bodies
// ══════════════════════════════════════════════════════════════════════════════

struct BodyCompiler<'a> {
    program: &'a Program,
    emitter: &'a mut WatEmitter,
    in_function: bool,
    /// Label value to dispatch segment.
    segments: HashMap<u32, usize>,
}

impl<'a> BodyCompiler<'a> {
    fn new(program: &'a Program, emitter: &'a mut WatEmitter, in_function: bool) -> Self {
        Self {
            program,
            emitter,
            in_function,
            segments: HashMap::new(),
        }
    }

    fn emit_body(&mut self, body: &[Instruction]) -> CodegenResult<()> {
        if !has_labels(body) {
            return body.iter().try_for_each(|inst| self.emit_instruction(inst));
        }

        // Segment 0 is everything before the first label; segment k starts
        // at the k-th label.
        let starts: Vec<usize> = body
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.opcode == Opcode::Label)
            .map(|(pos, _)| pos)
            .collect();
        let mut bounds = vec![0];
        bounds.extend(starts.iter().copied());
        bounds.push(body.len());
        for (k, &pos) in starts.iter().enumerate() {
            if let Some(label) = body[pos].label() {
                self.segments.entry(label).or_insert(k + 1);
            }
        }
        let count = starts.len() + 1;

        self.emitter.push_line("loop $dispatch");
        self.emitter.indent();
        for k in (0..count).rev() {
            self.emitter.push_line(format!("block $s{k}"));
            self.emitter.indent();
        }
        let table: Vec<String> = (0..count).map(|k| format!("$s{k}")).collect();
        self.emitter.push_line("local.get $pc");
        self.emitter
            .push_line(format!("br_table {} $s0", table.join(" ")));
        for k in 0..count {
            self.emitter.dedent();
            self.emitter.push_line("end");
            for inst in &body[bounds[k]..bounds[k + 1]] {
                self.emit_instruction(inst)?;
            }
        }
        self.emitter.dedent();
        self.emitter.push_line("end");
        Ok(())
    }

    fn emit_instruction(&mut self, inst: &Instruction) -> CodegenResult<()> {
        if !inst.is_well_formed() {
            return Err(CodegenError::Internal(format!(
                "line {}: malformed '{}' instruction",
                inst.line, inst.opcode
            )));
        }
        let ops = &inst.operands;
        match inst.opcode {
            Opcode::Assign => {
                self.read(ops[1]);
                self.write(ops[0]);
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Rem => {
                self.read(ops[1]);
                self.read(ops[2]);
                self.emitter.push_line(arithmetic(inst.opcode));
                self.write(ops[0]);
            }
            Opcode::Lt | Opcode::Gt | Opcode::Eq => {
                self.read(ops[1]);
                self.read(ops[2]);
                self.emitter.push_line(comparison(inst.opcode));
                self.emitter.push_line("i64.extend_i32_u");
                self.write(ops[0]);
            }
            Opcode::Not => {
                self.read(ops[1]);
                self.emitter.push_line("i64.eqz");
                self.emitter.push_line("i64.extend_i32_u");
                self.write(ops[0]);
            }
            Opcode::And | Opcode::Or => {
                self.truthy(ops[1]);
                self.truthy(ops[2]);
                self.emitter.push_line(if inst.opcode == Opcode::And {
                    "i32.and"
                } else {
                    "i32.or"
                });
                self.emitter.push_line("i64.extend_i32_u");
                self.write(ops[0]);
            }
            Opcode::Label => {
                if let Some(label) = inst.label() {
                    self.emitter.push_line(format!(";; label {label}"));
                }
            }
            Opcode::Jump => {
                self.jump(inst)?;
            }
            Opcode::JumpIf => {
                self.truthy(ops[0]);
                self.emitter.push_line("if");
                self.emitter.indent();
                self.jump(inst)?;
                self.emitter.dedent();
                self.emitter.push_line("end");
            }
            Opcode::Call => self.call(inst)?,
            Opcode::Return => {
                if !self.in_function {
                    return Err(CodegenError::Internal(format!(
                        "line {}: '^' outside a function",
                        inst.line
                    )));
                }
                self.read(ops[0]);
                self.emitter.push_line("return");
            }
            Opcode::Output => {
                self.read(ops[0]);
                self.emitter.push_line(format!("call ${PRINT_IMPORT}"));
            }
            Opcode::DefineFunc | Opcode::BlockClose => {
                return Err(CodegenError::Internal(format!(
                    "line {}: unexpected '{}' in a built program",
                    inst.line, inst.opcode
                )));
            }
        }
        Ok(())
    }

    fn call(&mut self, inst: &Instruction) -> CodegenResult<()> {
        let Some((index, args)) = inst.call_target() else {
            return Err(CodegenError::Internal(format!(
                "line {}: malformed call",
                inst.line
            )));
        };
        let callee = self
            .program
            .function(index)
            .ok_or(CodegenError::UndefinedFunction {
                index,
                line: inst.line,
            })?;
        if callee.param_count as usize != args.len() {
            return Err(CodegenError::ArityMismatch {
                index,
                expected: callee.param_count,
                found: args.len(),
                line: inst.line,
            });
        }
        for arg in args {
            self.read(*arg);
        }
        self.emitter.push_line(format!("call $f{index}"));
        self.write(inst.operands[0]);
        Ok(())
    }

    fn jump(&mut self, inst: &Instruction) -> CodegenResult<()> {
        let label = inst.label().unwrap_or_default();
        let segment = self.segments.get(&label).copied().ok_or_else(|| {
            CodegenError::Internal(format!(
                "line {}: jump to undefined label {label}",
                inst.line
            ))
        })?;
        self.emitter.push_line(format!("i32.const {segment}"));
        self.emitter.push_line("local.set $pc");
        self.emitter.push_line("br $dispatch");
        Ok(())
    }

    // ── Operands ──────────────────────────────────────────────────────────

    fn read(&mut self, op: Operand) {
        let line = match op {
            Operand::Global(n) => format!("global.get $g{n}"),
            Operand::Local(n) => format!("local.get $v{n}"),
            Operand::Arg(n) => format!("local.get $a{n}"),
            Operand::Literal(v) => format!("i64.const {v}"),
        };
        self.emitter.push_line(line);
    }

    /// Push `op != 0` as an `i32`.
    fn truthy(&mut self, op: Operand) {
        self.read(op);
        self.emitter.push_line("i64.const 0");
        self.emitter.push_line("i64.ne");
    }

    fn write(&mut self, op: Operand) {
        let line = match op {
            Operand::Global(n) => format!("global.set $g{n}"),
            Operand::Local(n) => format!("local.set $v{n}"),
            Operand::Arg(n) => format!("local.set $a{n}"),
            // Destinations are always slots in a built program.
            Operand::Literal(_) => "drop".to_string(),
        };
        self.emitter.push_line(line);
    }
}

fn arithmetic(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Add => "i64.add",
        Opcode::Sub => "i64.sub",
        Opcode::Mul => "i64.mul",
        Opcode::Div => "i64.div_s",
        Opcode::Rem => "i64.rem_s",
        other => unreachable!("'{other}' is not arithmetic"),
    }
}

fn comparison(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Lt => "i64.lt_s",
        Opcode::Gt => "i64.gt_s",
        Opcode::Eq => "i64.eq",
        other => unreachable!("'{other}' is not a comparison"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Text emitter
// ══════════════════════════════════════════════════════════════════════════════

struct WatEmitter {
    lines: Vec<String>,
    indent: usize,
}

impl WatEmitter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
        }
    }

    fn push_line(&mut self, line: impl AsRef<str>) {
        let prefix = "  ".repeat(self.indent);
        self.lines.push(format!("{prefix}{}", line.as_ref()));
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

#[cfg(test)]
mod tests {
    use super::*;
    use sui_types::Instruction as I;

    fn program(instructions: Vec<Instruction>, global_count: u32) -> Program {
        Program {
            instructions,
            functions: Vec::new(),
            global_count,
        }
    }

    #[test]
    fn emitter_indents_nested_lines() {
        let mut e = WatEmitter::new();
        e.push_line("(module");
        e.indent();
        e.push_line("(func)");
        e.dedent();
        e.dedent();
        e.push_line(")");
        assert_eq!(e.finish(), "(module\n  (func)\n)\n");
    }

    #[test]
    fn globals_are_declared_and_exported() {
        let p = program(
            vec![I::new(
                Opcode::Assign,
                vec![Operand::Global(1), Operand::Literal(42)],
                1,
            )],
            2,
        );
        let wat = emit_wat(&p).unwrap();
        assert!(wat.contains("(global $g0 (mut i64) (i64.const 0))"));
        assert!(wat.contains("(export \"g1\" (global $g1))"));
        assert!(wat.contains("i64.const 42\n    global.set $g1"));
    }

    #[test]
    fn comparison_widens_to_i64() {
        let p = program(
            vec![I::new(
                Opcode::Lt,
                vec![Operand::Global(0), Operand::Literal(1), Operand::Literal(2)],
                1,
            )],
            1,
        );
        let wat = emit_wat(&p).unwrap();
        assert!(wat.contains("i64.lt_s\n    i64.extend_i32_u"));
    }

    #[test]
    fn labels_lower_to_dispatch_loop() {
        let p = program(
            vec![
                I::new(Opcode::Label, vec![Operand::Literal(7)], 1),
                I::new(Opcode::Jump, vec![Operand::Literal(7)], 2),
            ],
            0,
        );
        let wat = emit_wat(&p).unwrap();
        assert!(wat.contains("(local $pc i32)"));
        assert!(wat.contains("loop $dispatch"));
        assert!(wat.contains("br_table $s0 $s1 $s0"));
        assert!(wat.contains("i32.const 1\n"));
        assert!(wat.contains("br $dispatch"));
    }

    #[test]
    fn return_at_module_level_is_rejected() {
        let p = program(vec![I::new(Opcode::Return, vec![Operand::Literal(0)], 3)], 0);
        assert!(matches!(emit_wat(&p), Err(CodegenError::Internal(_))));
    }

    #[test]
    fn short_operand_list_is_an_internal_error() {
        let p = program(vec![I::new(Opcode::Sub, vec![Operand::Global(0)], 4)], 1);
        match emit_wat(&p) {
            Err(CodegenError::Internal(message)) => {
                assert_eq!(message, "line 4: malformed '-' instruction");
            }
            other => panic!("expected internal error, got {other:?}"),
        }
        let p = program(vec![I::new(Opcode::Call, vec![Operand::Global(0)], 2)], 1);
        assert!(matches!(emit_wat(&p), Err(CodegenError::Internal(_))));
    }
}
