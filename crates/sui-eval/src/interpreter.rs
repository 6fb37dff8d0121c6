//! Instruction-walking interpreter.
//!
//! Functions in a program are registered into the [`Environment`] before
//! any module-level instruction runs, so module code may call a function
//! defined later in the same source. Runtime errors abort the unit; global
//! writes made before the failure stay in the environment.
//!
//! Calls never recurse on the host stack: each `$` pushes an activation
//! onto the environment's frame stack and a single loop runs whichever
//! activation is on top.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use sui_types::{Instruction, Opcode, Operand, Program, Value, MAX_CALL_FRAMES};
use tracing::debug;

use crate::env::{label_table, Activation, Environment, Frame};
use crate::error::{EvalError, EvalResult};

/// Sink for `.` instructions.
pub trait Output {
    fn output(&mut self, value: Value) -> EvalResult<()>;
}

impl Output for Vec<Value> {
    fn output(&mut self, value: Value) -> EvalResult<()> {
        self.push(value);
        Ok(())
    }
}

/// Writes each output value on its own line.
pub struct WriterOutput<W>(pub W);

impl<W: Write> Output for WriterOutput<W> {
    fn output(&mut self, value: Value) -> EvalResult<()> {
        writeln!(self.0, "{value}")?;
        Ok(())
    }
}

/// Resource limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Deepest allowed call stack, counting the entry frame: module code
    /// for [`Interpreter::run`], the callee for [`Interpreter::call`].
    pub max_call_depth: usize,
    /// Instructions executed before the run is aborted.
    pub gas_limit: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: MAX_CALL_FRAMES,
            gas_limit: 10_000_000,
        }
    }
}

/// Run `program` with the default limits.
pub fn run(program: &Program, env: &mut Environment, out: &mut dyn Output) -> EvalResult<()> {
    Interpreter::default().run(program, env, out)
}

/// The Sui interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter {
    config: EvalConfig,
}

impl Interpreter {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Register the program's functions, then execute its module-level
    /// instructions in order.
    pub fn run(
        &self,
        program: &Program,
        env: &mut Environment,
        out: &mut dyn Output,
    ) -> EvalResult<()> {
        for function in &program.functions {
            env.define_function(function.clone());
        }
        debug!(
            functions = program.functions.len(),
            instructions = program.instructions.len(),
            "running program"
        );

        let labels = label_table(&program.instructions);
        let mut exec = Execution::new(env, out, self.config, 1);
        let result = exec.execute(&program.instructions, &labels);
        let steps = exec.steps;
        env.frames.clear();
        debug!(steps, ok = result.is_ok(), "program finished");
        result.map(|_| ())
    }

    /// Call function `index` directly with `args`.
    pub fn call(
        &self,
        env: &mut Environment,
        index: u32,
        args: &[Value],
        out: &mut dyn Output,
    ) -> EvalResult<Value> {
        let mut exec = Execution::new(env, out, self.config, 0);
        let result = exec
            .enter(index, args.to_vec(), None, 0)
            .and_then(|()| exec.execute(&[], &HashMap::new()));
        env.frames.clear();
        result.map(|value| value.unwrap_or(0))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Execution
// ══════════════════════════════════════════════════════════════════════════════

/// What the frame loop does after one instruction.
enum Flow {
    Next,
    Jump(usize),
    Call {
        index: u32,
        args: Vec<Value>,
        result: Operand,
        line: u32,
    },
    Return(Value),
}

struct Execution<'a> {
    env: &'a mut Environment,
    out: &'a mut dyn Output,
    config: EvalConfig,
    /// Frames below the stack that count toward the depth limit.
    entry_frames: usize,
    steps: u64,
}

impl<'a> Execution<'a> {
    fn new(
        env: &'a mut Environment,
        out: &'a mut dyn Output,
        config: EvalConfig,
        entry_frames: usize,
    ) -> Self {
        Self {
            env,
            out,
            config,
            entry_frames,
            steps: 0,
        }
    }

    fn tick(&mut self, line: u32) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.config.gas_limit {
            Err(EvalError::GasExhausted {
                limit: self.config.gas_limit,
                line,
            })
        } else {
            Ok(())
        }
    }

    /// Drive the frame stack. Module code runs while the stack is empty;
    /// otherwise the top activation runs. Returns when module code falls
    /// off its end (`None`) or a host-made call returns (`Some`).
    fn execute(
        &mut self,
        module: &[Instruction],
        module_labels: &HashMap<u32, usize>,
    ) -> EvalResult<Option<Value>> {
        let mut module_pc = 0;
        loop {
            let top = self
                .env
                .frames
                .last()
                .map(|a| (Rc::clone(&a.callable), a.pc));
            let (body, labels, pc) = match &top {
                Some((callable, pc)) => (callable.function.body.as_slice(), &callable.labels, *pc),
                None => (module, module_labels, module_pc),
            };

            let flow = match body.get(pc) {
                Some(inst) => {
                    self.tick(inst.line)?;
                    self.step(inst, labels)?
                }
                // Falling off the end of a function returns 0.
                None if top.is_some() => Flow::Return(0),
                None => return Ok(None),
            };

            let next = match flow {
                Flow::Jump(target) => target,
                _ => pc + 1,
            };
            match self.env.frames.last_mut() {
                Some(activation) => activation.pc = next,
                None => module_pc = next,
            }

            match flow {
                Flow::Call {
                    index,
                    args,
                    result,
                    line,
                } => self.enter(index, args, Some(result), line)?,
                Flow::Return(value) => {
                    if let Some(value) = self.leave(value)? {
                        return Ok(Some(value));
                    }
                }
                Flow::Next | Flow::Jump(_) => {}
            }
        }
    }

    /// Push an activation for function `index`.
    fn enter(
        &mut self,
        index: u32,
        args: Vec<Value>,
        result: Option<Operand>,
        line: u32,
    ) -> EvalResult<()> {
        let callable = self
            .env
            .callable(index)
            .ok_or(EvalError::UndefinedFunction { index, line })?;
        let function = &callable.function;
        if args.len() != function.param_count as usize {
            return Err(EvalError::ArgumentCountMismatch {
                index,
                expected: function.param_count,
                found: args.len(),
                line,
            });
        }
        if self.entry_frames + self.env.frames.len() >= self.config.max_call_depth {
            return Err(EvalError::CallDepthExceeded {
                limit: self.config.max_call_depth,
                line,
            });
        }

        let frame = Frame::new(function.local_count, args);
        self.env.frames.push(Activation {
            callable,
            frame,
            pc: 0,
            result,
            line,
        });
        Ok(())
    }

    /// Pop the top activation and deliver `value` to its caller. Returns
    /// the value when the caller is the host.
    fn leave(&mut self, value: Value) -> EvalResult<Option<Value>> {
        let Some(activation) = self.env.frames.pop() else {
            return Ok(Some(value));
        };
        match activation.result {
            Some(slot) => {
                self.write(slot, value, activation.line)?;
                Ok(None)
            }
            None => Ok(Some(value)),
        }
    }

    /// Execute one instruction against the current frame.
    fn step(&mut self, inst: &Instruction, labels: &HashMap<u32, usize>) -> EvalResult<Flow> {
        let line = inst.line;
        let operand = |n: usize| {
            inst.operand(n).ok_or_else(|| EvalError::MalformedInstruction {
                opcode: inst.opcode.to_string(),
                line,
            })
        };

        match inst.opcode {
            Opcode::Assign => {
                let value = self.read(operand(1)?, line)?;
                self.write(operand(0)?, value, line)?;
            }
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or => {
                let a = self.read(operand(1)?, line)?;
                let b = self.read(operand(2)?, line)?;
                let value = binary(inst.opcode, a, b, line)?;
                self.write(operand(0)?, value, line)?;
            }
            Opcode::Not => {
                let a = self.read(operand(1)?, line)?;
                self.write(operand(0)?, Value::from(a == 0), line)?;
            }
            Opcode::Label | Opcode::DefineFunc | Opcode::BlockClose => {}
            Opcode::Jump => return jump_target(labels, inst).map(Flow::Jump),
            Opcode::JumpIf => {
                if self.read(operand(0)?, line)? != 0 {
                    return jump_target(labels, inst).map(Flow::Jump);
                }
            }
            Opcode::Call => {
                let result = operand(0)?;
                let (index, args) = inst.call_target().ok_or_else(|| {
                    EvalError::MalformedInstruction {
                        opcode: inst.opcode.to_string(),
                        line,
                    }
                })?;
                let args = args
                    .iter()
                    .map(|op| self.read(*op, line))
                    .collect::<EvalResult<Vec<_>>>()?;
                return Ok(Flow::Call {
                    index,
                    args,
                    result,
                    line,
                });
            }
            Opcode::Return => {
                if self.env.frames.is_empty() {
                    return Err(EvalError::ReturnOutsideFunction { line });
                }
                return self.read(operand(0)?, line).map(Flow::Return);
            }
            Opcode::Output => {
                let value = self.read(operand(0)?, line)?;
                self.out.output(value)?;
            }
        }
        Ok(Flow::Next)
    }

    // ── Slots ─────────────────────────────────────────────────────────────

    fn frame(&self) -> Option<&Frame> {
        self.env.frames.last().map(|a| &a.frame)
    }

    fn read(&self, op: Operand, line: u32) -> EvalResult<Value> {
        let out_of_scope = || EvalError::SlotOutOfScope {
            slot: op.to_string(),
            line,
        };
        match op {
            Operand::Literal(v) => Ok(v),
            Operand::Global(index) => self
                .env
                .global(index)
                .ok_or(EvalError::UndefinedGlobal { index, line }),
            Operand::Local(n) => self
                .frame()
                .and_then(|f| f.locals.get(n as usize))
                .copied()
                .ok_or_else(out_of_scope),
            Operand::Arg(n) => self
                .frame()
                .and_then(|f| f.args.get(n as usize))
                .copied()
                .ok_or_else(out_of_scope),
        }
    }

    fn write(&mut self, op: Operand, value: Value, line: u32) -> EvalResult<()> {
        if let Operand::Global(index) = op {
            self.env.set_global(index, value);
            return Ok(());
        }
        let frame = self.env.frames.last_mut().map(|a| &mut a.frame);
        let slot = match (op, frame) {
            (Operand::Local(n), Some(frame)) => frame.locals.get_mut(n as usize),
            (Operand::Arg(n), Some(frame)) => frame.args.get_mut(n as usize),
            _ => None,
        };
        match slot {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EvalError::SlotOutOfScope {
                slot: op.to_string(),
                line,
            }),
        }
    }
}

fn jump_target(labels: &HashMap<u32, usize>, inst: &Instruction) -> EvalResult<usize> {
    let label = inst.label().ok_or_else(|| EvalError::MalformedInstruction {
        opcode: inst.opcode.to_string(),
        line: inst.line,
    })?;
    labels
        .get(&label)
        .copied()
        .ok_or(EvalError::UndefinedLabel {
            label,
            line: inst.line,
        })
}

/// Two-operand arithmetic, comparison and logic. Arithmetic wraps; `%`
/// with `i64::MIN` and `-1` is 0.
fn binary(opcode: Opcode, a: Value, b: Value, line: u32) -> EvalResult<Value> {
    let value = match opcode {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero { line });
            }
            a.checked_div(b).ok_or(EvalError::DivisionOverflow { line })?
        }
        Opcode::Rem => {
            if b == 0 {
                return Err(EvalError::DivisionByZero { line });
            }
            a.wrapping_rem(b)
        }
        Opcode::Lt => Value::from(a < b),
        Opcode::Gt => Value::from(a > b),
        Opcode::Eq => Value::from(a == b),
        Opcode::And => Value::from(a != 0 && b != 0),
        Opcode::Or => Value::from(a != 0 || b != 0),
        other => unreachable!("'{other}' is not a binary opcode"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_semantics() {
        assert_eq!(binary(Opcode::Add, i64::MAX, 1, 1).unwrap(), i64::MIN);
        assert_eq!(binary(Opcode::Div, -7, 2, 1).unwrap(), -3);
        assert_eq!(binary(Opcode::Rem, -7, 2, 1).unwrap(), -1);
        assert_eq!(binary(Opcode::Rem, i64::MIN, -1, 1).unwrap(), 0);
        assert_eq!(binary(Opcode::Lt, 1, 2, 1).unwrap(), 1);
        assert_eq!(binary(Opcode::Eq, 1, 2, 1).unwrap(), 0);
        assert_eq!(binary(Opcode::And, 5, 0, 1).unwrap(), 0);
        assert_eq!(binary(Opcode::Or, 5, 0, 1).unwrap(), 1);
    }

    #[test]
    fn division_failures_carry_the_line() {
        assert!(matches!(
            binary(Opcode::Div, 1, 0, 9),
            Err(EvalError::DivisionByZero { line: 9 })
        ));
        assert!(matches!(
            binary(Opcode::Rem, 1, 0, 9),
            Err(EvalError::DivisionByZero { line: 9 })
        ));
        assert!(matches!(
            binary(Opcode::Div, i64::MIN, -1, 4),
            Err(EvalError::DivisionOverflow { line: 4 })
        ));
    }

    #[test]
    fn short_operand_list_is_an_error() {
        let program = Program {
            instructions: vec![
                Instruction::new(Opcode::Assign, vec![Operand::Global(0), Operand::Literal(1)], 1),
                Instruction::new(Opcode::Add, vec![Operand::Global(1)], 7),
            ],
            functions: Vec::new(),
            global_count: 2,
        };
        let mut env = Environment::new();
        let err = run(&program, &mut env, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            &err,
            EvalError::MalformedInstruction { opcode, line: 7 } if opcode == "+"
        ));
        assert_eq!(err.line(), Some(7));
        assert_eq!(env.global(0), Some(1));
    }

    #[test]
    fn jump_without_label_is_an_error() {
        let program = Program {
            instructions: vec![Instruction::new(Opcode::Jump, Vec::new(), 3)],
            functions: Vec::new(),
            global_count: 0,
        };
        let err = run(&program, &mut Environment::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, EvalError::MalformedInstruction { line: 3, .. }));
    }

    #[test]
    fn writer_output_prints_one_value_per_line() {
        let mut out = WriterOutput(Vec::new());
        out.output(42).unwrap();
        out.output(-1).unwrap();
        assert_eq!(String::from_utf8(out.0).unwrap(), "42\n-1\n");
    }
}
