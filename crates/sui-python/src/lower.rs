//! Python syntax tree to Sui instructions.
//!
//! Slot assignment:
//! - `gN`, `vN` and parameter names keep their numbers, so translating the
//!   output of [`crate::emit_python`] restores the original slots
//! - other module names become globals numbered after the highest `gN`
//! - names assigned inside a function (and not declared `global`) become
//!   locals numbered after the highest `vN`
//! - temporaries are fresh locals in functions and fresh globals at module
//!   level, reused from one statement to the next
//!
//! `//` and `%` floor toward negative infinity, so they lower to the
//! truncating Sui instruction followed by a sign correction. `and`/`or`
//! short-circuit through labels unless both sides are plain 0/1 values.

use std::collections::{HashMap, HashSet};

use sui_types::{Function, Instruction, Opcode, Operand, Program};

use crate::ast::{self, BinOp, BoolOp, CmpOp, Expr, Stmt, StmtKind};
use crate::error::{TranslateError, TranslateResult};

const BUILTINS: [&str; 5] = ["print", "int", "_wrap", "_div", "_rem"];

pub fn lower(stmts: &[Stmt]) -> TranslateResult<Program> {
    let defs = collect_functions(stmts)?;
    let scopes = defs
        .iter()
        .map(FunctionScope::analyse)
        .collect::<TranslateResult<Vec<_>>>()?;
    let module = ModuleNames::new(stmts, &defs, &scopes);

    let mut functions = Vec::with_capacity(defs.len());
    for (def, scope) in defs.iter().zip(&scopes) {
        let mut lowerer = Lowerer::new(&module, Some(scope), def.line);
        lowerer.statements(def.body)?;
        let body = lowerer.body;
        functions.push(Function {
            index: def.index,
            param_count: def.params.len() as u32,
            local_count: slot_count(&body, |op| match op {
                Operand::Local(n) => Some(n),
                _ => None,
            }),
            body,
            line: def.line,
        });
    }

    let mut lowerer = Lowerer::new(&module, None, 1);
    lowerer.statements(stmts)?;
    let instructions = lowerer.body;

    let mut program = Program {
        instructions,
        functions,
        global_count: 0,
    };
    let global_count = program
        .all_instructions()
        .flat_map(|inst| inst.operands.iter())
        .filter_map(|op| match op {
            Operand::Global(n) => Some(n + 1),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    program.global_count = global_count;
    Ok(program)
}

fn slot_count(body: &[Instruction], pick: impl Fn(Operand) -> Option<u32>) -> u32 {
    body.iter()
        .flat_map(|inst| inst.operands.iter().copied())
        .filter_map(pick)
        .map(|n| n + 1)
        .max()
        .unwrap_or(0)
}

/// `prefix` followed by a canonical decimal number.
fn numbered(name: &str, prefix: char) -> Option<u32> {
    let digits = name.strip_prefix(prefix)?;
    let n: u32 = digits.parse().ok()?;
    (n.to_string() == digits).then_some(n)
}

// ══════════════════════════════════════════════════════════════════════════════
// Name analysis
// ══════════════════════════════════════════════════════════════════════════════

struct FunctionDef<'a> {
    index: u32,
    name: &'a str,
    params: &'a [String],
    body: &'a [Stmt],
    line: u32,
}

fn collect_functions(stmts: &[Stmt]) -> TranslateResult<Vec<FunctionDef<'_>>> {
    let mut defs: Vec<FunctionDef<'_>> = Vec::new();
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Def { name, params, body } => {
                if BUILTINS.contains(&name.as_str()) {
                    return Err(TranslateError::unsupported(
                        format!("redefinition of builtin '{name}'"),
                        stmt.line,
                    ));
                }
                if defs.iter().any(|d| d.name == name) {
                    return Err(TranslateError::unsupported(
                        format!("redefinition of function '{name}'"),
                        stmt.line,
                    ));
                }
                reject_defs(body, "nested function definition")?;
                defs.push(FunctionDef {
                    index: defs.len() as u32,
                    name,
                    params,
                    body,
                    line: stmt.line,
                });
            }
            StmtKind::If {
                then, otherwise, ..
            } => {
                reject_defs(then, "function definition inside a block")?;
                reject_defs(otherwise, "function definition inside a block")?;
            }
            StmtKind::While { body, .. } => {
                reject_defs(body, "function definition inside a block")?;
            }
            _ => {}
        }
    }
    Ok(defs)
}

fn reject_defs(stmts: &[Stmt], construct: &str) -> TranslateResult<()> {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Def { .. } => {
                return Err(TranslateError::unsupported(construct, stmt.line));
            }
            StmtKind::If {
                then, otherwise, ..
            } => {
                reject_defs(then, construct)?;
                reject_defs(otherwise, construct)?;
            }
            StmtKind::While { body, .. } => reject_defs(body, construct)?,
            _ => {}
        }
    }
    Ok(())
}

/// Names a function body binds.
struct FunctionScope {
    params: Vec<String>,
    declared_globals: HashSet<String>,
    locals: HashMap<String, u32>,
    /// First local slot free for temporaries.
    temp_base: u32,
}

impl FunctionScope {
    fn analyse(def: &FunctionDef<'_>) -> TranslateResult<Self> {
        let mut declared_globals = HashSet::new();
        collect_declared(def.body, &mut declared_globals);
        if let Some(param) = def.params.iter().find(|p| declared_globals.contains(*p)) {
            return Err(TranslateError::syntax(
                format!("name '{param}' is parameter and global"),
                def.line,
            ));
        }

        let mut assigned = Vec::new();
        collect_assigned(def.body, &mut assigned);
        assigned.retain(|name| {
            !def.params.contains(name) && !declared_globals.contains(name)
        });

        let mut locals = HashMap::new();
        for name in &assigned {
            if let Some(n) = numbered(name, 'v') {
                locals.insert(name.clone(), n);
            }
        }
        let mut next = locals.values().map(|n| n + 1).max().unwrap_or(0);
        for name in &assigned {
            if !locals.contains_key(name) {
                locals.insert(name.clone(), next);
                next += 1;
            }
        }

        Ok(Self {
            params: def.params.to_vec(),
            declared_globals,
            locals,
            temp_base: next,
        })
    }

    fn binds_locally(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name) || self.locals.contains_key(name)
    }
}

fn collect_declared(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Global(names) => out.extend(names.iter().cloned()),
            StmtKind::If {
                then, otherwise, ..
            } => {
                collect_declared(then, out);
                collect_declared(otherwise, out);
            }
            StmtKind::While { body, .. } => collect_declared(body, out),
            _ => {}
        }
    }
}

/// Assignment targets in first-assignment order.
fn collect_assigned(stmts: &[Stmt], out: &mut Vec<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Assign(name, _) | StmtKind::AugAssign(name, _, _) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            StmtKind::If {
                then, otherwise, ..
            } => {
                collect_assigned(then, out);
                collect_assigned(otherwise, out);
            }
            StmtKind::While { body, .. } => collect_assigned(body, out),
            _ => {}
        }
    }
}

/// Names visible to every scope.
struct ModuleNames {
    functions: HashMap<String, (u32, u32)>,
    globals: HashMap<String, u32>,
    /// First global slot free for module-level temporaries.
    temp_base: u32,
}

impl ModuleNames {
    fn new(stmts: &[Stmt], defs: &[FunctionDef<'_>], scopes: &[FunctionScope]) -> Self {
        let functions: HashMap<String, (u32, u32)> = defs
            .iter()
            .map(|d| (d.name.to_string(), (d.index, d.params.len() as u32)))
            .collect();

        let mut order: Vec<String> = Vec::new();
        let mut note = |name: &str| {
            if !functions.contains_key(name)
                && !BUILTINS.contains(&name)
                && !order.iter().any(|n| n == name)
            {
                order.push(name.to_string());
            }
        };
        let mut defs_seen = 0;
        for stmt in stmts {
            if let StmtKind::Def { body, .. } = &stmt.kind {
                if let Some(scope) = scopes.get(defs_seen) {
                    let mut declared: Vec<&String> = scope.declared_globals.iter().collect();
                    declared.sort();
                    declared.into_iter().for_each(|n| note(n.as_str()));
                    ast::for_each_name(body, &mut |name| {
                        if !scope.binds_locally(name) {
                            note(name);
                        }
                    });
                }
                defs_seen += 1;
            } else {
                ast::for_each_name(std::slice::from_ref(stmt), &mut note);
            }
        }

        let mut globals = HashMap::new();
        for name in &order {
            if let Some(n) = numbered(name, 'g') {
                globals.insert(name.clone(), n);
            }
        }
        let mut next = globals.values().map(|n| n + 1).max().unwrap_or(0);
        for name in order {
            globals.entry(name).or_insert_with(|| {
                next += 1;
                next - 1
            });
        }

        Self {
            functions,
            globals,
            temp_base: next,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Instruction selection
// ══════════════════════════════════════════════════════════════════════════════

struct Lowerer<'m> {
    module: &'m ModuleNames,
    scope: Option<&'m FunctionScope>,
    body: Vec<Instruction>,
    line: u32,
    labels: u32,
    /// `(continue target, break target)` of each enclosing loop.
    loops: Vec<(u32, u32)>,
    next_temp: u32,
}

impl<'m> Lowerer<'m> {
    fn new(module: &'m ModuleNames, scope: Option<&'m FunctionScope>, line: u32) -> Self {
        Self {
            module,
            scope,
            body: Vec::new(),
            line,
            labels: 0,
            loops: Vec::new(),
            next_temp: 0,
        }
    }

    fn emit(&mut self, opcode: Opcode, operands: Vec<Operand>) {
        self.body.push(Instruction::new(opcode, operands, self.line));
    }

    fn label(&mut self) -> u32 {
        self.labels += 1;
        self.labels - 1
    }

    fn place_label(&mut self, label: u32) {
        self.emit(Opcode::Label, vec![lit(label)]);
    }

    fn jump(&mut self, label: u32) {
        self.emit(Opcode::Jump, vec![lit(label)]);
    }

    fn jump_if(&mut self, cond: Operand, label: u32) {
        self.emit(Opcode::JumpIf, vec![cond, lit(label)]);
    }

    fn temp(&mut self) -> Operand {
        let n = self.next_temp;
        self.next_temp += 1;
        match self.scope {
            Some(scope) => Operand::Local(scope.temp_base + n),
            None => Operand::Global(self.module.temp_base + n),
        }
    }

    fn resolve(&self, name: &str) -> TranslateResult<Operand> {
        if self.module.functions.contains_key(name) {
            return Err(TranslateError::unsupported(
                format!("function '{name}' used as a value"),
                self.line,
            ));
        }
        if BUILTINS.contains(&name) {
            return Err(TranslateError::unsupported(
                format!("builtin '{name}' used as a value"),
                self.line,
            ));
        }
        if let Some(scope) = self.scope {
            if let Some(i) = scope.params.iter().position(|p| p == name) {
                return Ok(Operand::Arg(i as u32));
            }
            if !scope.declared_globals.contains(name) {
                if let Some(n) = scope.locals.get(name) {
                    return Ok(Operand::Local(*n));
                }
            }
        }
        self.module
            .globals
            .get(name)
            .map(|n| Operand::Global(*n))
            .ok_or_else(|| TranslateError::syntax(format!("unknown name '{name}'"), self.line))
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn statements(&mut self, stmts: &[Stmt]) -> TranslateResult<()> {
        for stmt in stmts {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> TranslateResult<()> {
        self.line = stmt.line;
        self.next_temp = 0;
        match &stmt.kind {
            StmtKind::Assign(name, value) => {
                let dest = self.resolve(name)?;
                self.store(dest, value)?;
            }
            StmtKind::AugAssign(name, op, value) => {
                let dest = self.resolve(name)?;
                let combined = Expr::Binary(
                    *op,
                    Box::new(Expr::Name(name.clone())),
                    Box::new(value.clone()),
                );
                self.store(dest, &combined)?;
            }
            StmtKind::Expr(Expr::Call(name, args)) if name == "print" => {
                if args.len() != 1 {
                    return Err(TranslateError::unsupported(
                        format!("print with {} arguments", args.len()),
                        stmt.line,
                    ));
                }
                let value = self.value(&args[0])?;
                self.emit(Opcode::Output, vec![value]);
            }
            StmtKind::Expr(value) => {
                self.value(value)?;
            }
            StmtKind::Return(value) => {
                if self.scope.is_none() {
                    return Err(TranslateError::syntax("'return' outside function", stmt.line));
                }
                let value = match value {
                    Some(value) => self.value(value)?,
                    None => Operand::Literal(0),
                };
                self.emit(Opcode::Return, vec![value]);
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                let else_label = self.label();
                self.jump_unless(cond, else_label)?;
                self.statements(then)?;
                self.line = stmt.line;
                if otherwise.is_empty() {
                    self.place_label(else_label);
                } else {
                    let end = self.label();
                    self.jump(end);
                    self.place_label(else_label);
                    self.statements(otherwise)?;
                    self.line = stmt.line;
                    self.place_label(end);
                }
            }
            StmtKind::While { cond, body } => {
                let top = self.label();
                let end = self.label();
                self.place_label(top);
                self.jump_unless(cond, end)?;
                self.loops.push((top, end));
                self.statements(body)?;
                self.loops.pop();
                self.line = stmt.line;
                self.jump(top);
                self.place_label(end);
            }
            StmtKind::Break | StmtKind::Continue => {
                let is_break = matches!(stmt.kind, StmtKind::Break);
                let Some(&(top, end)) = self.loops.last() else {
                    let word = if is_break { "break" } else { "continue" };
                    return Err(TranslateError::syntax(
                        format!("'{word}' outside loop"),
                        stmt.line,
                    ));
                };
                self.jump(if is_break { end } else { top });
            }
            StmtKind::Global(_) | StmtKind::Pass | StmtKind::Def { .. } => {}
        }
        Ok(())
    }

    /// Jump to `label` when `cond` is false.
    fn jump_unless(&mut self, cond: &Expr, label: u32) -> TranslateResult<()> {
        match cond {
            Expr::Int(0) => self.jump(label),
            Expr::Int(_) => {}
            Expr::Call(name, args) if name == "int" && args.len() == 1 => {
                return self.jump_unless(&args[0], label);
            }
            Expr::Not(inner) => {
                let value = self.value(inner)?;
                self.jump_if(value, label);
            }
            Expr::Compare(op @ (CmpOp::Le | CmpOp::Ge | CmpOp::Ne), a, b) => {
                let opposite = match op {
                    CmpOp::Le => Opcode::Gt,
                    CmpOp::Ge => Opcode::Lt,
                    _ => Opcode::Eq,
                };
                let operands = self.values(&[&**a, &**b])?;
                let t = self.temp();
                self.emit(opposite, vec![t, operands[0], operands[1]]);
                self.jump_if(t, label);
            }
            _ => {
                let value = self.value(cond)?;
                let t = self.temp();
                self.emit(Opcode::Not, vec![t, value]);
                self.jump_if(t, label);
            }
        }
        Ok(())
    }

    // ── Expressions ──────────────────────────────────────────────────────

    /// Evaluate `e` into an operand, using a temporary when needed.
    fn value(&mut self, e: &Expr) -> TranslateResult<Operand> {
        match e {
            Expr::Int(v) => Ok(Operand::Literal(*v)),
            Expr::Name(name) => self.resolve(name),
            Expr::Call(name, args) if is_passthrough(name) && args.len() == 1 => {
                self.value(&args[0])
            }
            _ => {
                let t = self.temp();
                self.compute(t, e)?;
                Ok(t)
            }
        }
    }

    /// Evaluate several expressions left to right. A named global read
    /// before a later call is copied first, since the call may change it.
    fn values(&mut self, exprs: &[&Expr]) -> TranslateResult<Vec<Operand>> {
        let mut out = Vec::with_capacity(exprs.len());
        for (i, e) in exprs.iter().enumerate() {
            let mut value = self.value(e)?;
            let named_global =
                matches!(value, Operand::Global(n) if n < self.module.temp_base);
            if named_global && exprs[i + 1..].iter().any(|later| !effect_free(later)) {
                let t = self.temp();
                self.emit(Opcode::Assign, vec![t, value]);
                value = t;
            }
            out.push(value);
        }
        Ok(out)
    }

    /// Evaluate `e` into `dest`, which may also be read by `e`.
    fn store(&mut self, dest: Operand, e: &Expr) -> TranslateResult<()> {
        match e {
            Expr::Int(_) | Expr::Name(_) => {
                let value = self.value(e)?;
                self.emit(Opcode::Assign, vec![dest, value]);
            }
            Expr::Call(name, args) if is_passthrough(name) && args.len() == 1 => {
                self.store(dest, &args[0])?;
            }
            _ if writes_early(e) => {
                let t = self.temp();
                self.compute(t, e)?;
                self.emit(Opcode::Assign, vec![dest, t]);
            }
            _ => self.compute(dest, e)?,
        }
        Ok(())
    }

    /// Evaluate `e` into `dest`. Only forms rejected by [`writes_early`]
    /// may receive a `dest` that `e` reads.
    fn compute(&mut self, dest: Operand, e: &Expr) -> TranslateResult<()> {
        match e {
            Expr::Int(_) | Expr::Name(_) => {
                let value = self.value(e)?;
                self.emit(Opcode::Assign, vec![dest, value]);
            }
            Expr::Neg(inner) => {
                let value = self.value(inner)?;
                self.emit(Opcode::Sub, vec![dest, Operand::Literal(0), value]);
            }
            Expr::Not(inner) => {
                let value = self.value(inner)?;
                self.emit(Opcode::Not, vec![dest, value]);
            }
            Expr::Binary(op, a, b) => {
                let operands = self.values(&[&**a, &**b])?;
                let (a, b) = (operands[0], operands[1]);
                match op {
                    BinOp::Add => self.emit(Opcode::Add, vec![dest, a, b]),
                    BinOp::Sub => self.emit(Opcode::Sub, vec![dest, a, b]),
                    BinOp::Mul => self.emit(Opcode::Mul, vec![dest, a, b]),
                    BinOp::FloorDiv => self.floor_div(dest, a, b),
                    BinOp::Mod => self.floor_mod(dest, a, b),
                }
            }
            Expr::Compare(op, a, b) => {
                let operands = self.values(&[&**a, &**b])?;
                let (a, b) = (operands[0], operands[1]);
                let (opcode, negate) = match op {
                    CmpOp::Lt => (Opcode::Lt, false),
                    CmpOp::Gt => (Opcode::Gt, false),
                    CmpOp::Eq => (Opcode::Eq, false),
                    CmpOp::Le => (Opcode::Gt, true),
                    CmpOp::Ge => (Opcode::Lt, true),
                    CmpOp::Ne => (Opcode::Eq, true),
                };
                if negate {
                    let t = self.temp();
                    self.emit(opcode, vec![t, a, b]);
                    self.emit(Opcode::Not, vec![dest, t]);
                } else {
                    self.emit(opcode, vec![dest, a, b]);
                }
            }
            Expr::Bool(op, a, b) if plain_flag(a) && plain_flag(b) => {
                let operands = self.values(&[&**a, &**b])?;
                let opcode = match op {
                    BoolOp::And => Opcode::And,
                    BoolOp::Or => Opcode::Or,
                };
                self.emit(opcode, vec![dest, operands[0], operands[1]]);
            }
            Expr::Bool(op, a, b) => {
                let end = self.label();
                self.compute(dest, a)?;
                match op {
                    BoolOp::And => {
                        let t = self.temp();
                        self.emit(Opcode::Not, vec![t, dest]);
                        self.jump_if(t, end);
                    }
                    BoolOp::Or => self.jump_if(dest, end),
                }
                self.compute(dest, b)?;
                self.place_label(end);
            }
            Expr::Call(name, args) => self.call(dest, name, args)?,
        }
        Ok(())
    }

    fn call(&mut self, dest: Operand, name: &str, args: &[Expr]) -> TranslateResult<()> {
        let line = self.line;
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(TranslateError::unsupported(
                    format!("{name}() with {} arguments", args.len()),
                    line,
                ))
            }
        };
        match name {
            "print" => Err(TranslateError::unsupported("print used as a value", line)),
            "int" | "_wrap" => {
                arity(1)?;
                self.compute(dest, &args[0])
            }
            "_div" | "_rem" => {
                arity(2)?;
                let operands = self.values(&[&args[0], &args[1]])?;
                let opcode = if name == "_div" { Opcode::Div } else { Opcode::Rem };
                self.emit(opcode, vec![dest, operands[0], operands[1]]);
                Ok(())
            }
            _ => {
                let Some(&(index, params)) = self.module.functions.get(name) else {
                    return Err(TranslateError::unsupported(
                        format!("call to unknown function '{name}'"),
                        line,
                    ));
                };
                if args.len() != params as usize {
                    return Err(TranslateError::unsupported(
                        format!(
                            "call to '{name}' with {} arguments (takes {params})",
                            args.len()
                        ),
                        line,
                    ));
                }
                let refs: Vec<&Expr> = args.iter().collect();
                let values = self.values(&refs)?;
                let mut operands = vec![dest, Operand::Literal(i64::from(index))];
                operands.extend(values);
                self.emit(Opcode::Call, operands);
                Ok(())
            }
        }
    }

    /// Truncating quotient, minus one when the remainder is non-zero and
    /// its sign differs from the divisor's.
    fn floor_div(&mut self, dest: Operand, a: Operand, b: Operand) {
        let end = self.label();
        let (r, t, u) = (self.temp(), self.temp(), self.temp());
        self.emit(Opcode::Div, vec![dest, a, b]);
        self.emit(Opcode::Rem, vec![r, a, b]);
        self.sign_check(r, b, t, u, end);
        self.emit(Opcode::Sub, vec![dest, dest, Operand::Literal(1)]);
        self.place_label(end);
    }

    /// Truncating remainder, plus the divisor under the same condition.
    fn floor_mod(&mut self, dest: Operand, a: Operand, b: Operand) {
        let end = self.label();
        let (t, u) = (self.temp(), self.temp());
        self.emit(Opcode::Rem, vec![dest, a, b]);
        self.sign_check(dest, b, t, u, end);
        self.emit(Opcode::Add, vec![dest, dest, b]);
        self.place_label(end);
    }

    /// Jump to `end` unless `r` is non-zero with a sign unlike `b`'s.
    fn sign_check(&mut self, r: Operand, b: Operand, t: Operand, u: Operand, end: u32) {
        let zero = Operand::Literal(0);
        self.emit(Opcode::Eq, vec![t, r, zero]);
        self.jump_if(t, end);
        self.emit(Opcode::Lt, vec![t, r, zero]);
        self.emit(Opcode::Lt, vec![u, b, zero]);
        self.emit(Opcode::Eq, vec![t, t, u]);
        self.jump_if(t, end);
    }
}

fn lit(label: u32) -> Operand {
    Operand::Literal(i64::from(label))
}

fn is_passthrough(name: &str) -> bool {
    name == "int" || name == "_wrap"
}

/// Forms that write their destination before reading all their inputs.
fn writes_early(e: &Expr) -> bool {
    match e {
        Expr::Binary(BinOp::FloorDiv | BinOp::Mod, _, _) => true,
        Expr::Bool(_, a, b) => !(plain_flag(a) && plain_flag(b)),
        Expr::Call(name, args) if is_passthrough(name) && args.len() == 1 => writes_early(&args[0]),
        _ => false,
    }
}

/// Cannot call a function or fail.
fn effect_free(e: &Expr) -> bool {
    match e {
        Expr::Int(_) | Expr::Name(_) => true,
        Expr::Neg(inner) | Expr::Not(inner) => effect_free(inner),
        Expr::Binary(BinOp::FloorDiv | BinOp::Mod, _, _) => false,
        Expr::Binary(_, a, b) | Expr::Compare(_, a, b) | Expr::Bool(_, a, b) => {
            effect_free(a) && effect_free(b)
        }
        Expr::Call(name, args) if is_passthrough(name) && args.len() == 1 => effect_free(&args[0]),
        Expr::Call(..) => false,
    }
}

/// Always 0 or 1 and safe to evaluate eagerly, so `and`/`or` reduce to
/// `&`/`|`.
fn plain_flag(e: &Expr) -> bool {
    let flag = match e {
        Expr::Int(v) => *v == 0 || *v == 1,
        Expr::Compare(..) | Expr::Not(_) => true,
        Expr::Bool(_, a, b) => plain_flag(a) && plain_flag(b),
        Expr::Call(name, args) if name == "int" && args.len() == 1 => plain_flag(&args[0]),
        _ => false,
    };
    flag && effect_free(e)
}
