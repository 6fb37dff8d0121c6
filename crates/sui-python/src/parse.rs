//! Python source to the translatable subset.
//!
//! `rustpython-parser` builds the full Python syntax tree; this module
//! narrows it to [`crate::ast`]. Valid Python outside the subset is
//! reported as [`TranslateError::Unsupported`] naming the node, with the
//! line its source range starts on. Input the parser rejects is a
//! [`TranslateError::Syntax`].

use rustpython_parser::ast::{self as py, Ranged};
use rustpython_parser::{self as parser, Mode};

use crate::ast::{BinOp, BoolOp, CmpOp, Expr, Stmt, StmtKind};
use crate::error::{TranslateError, TranslateResult};

/// Parse `source` and narrow it to subset statements.
pub fn parse_module(source: &str) -> TranslateResult<Vec<Stmt>> {
    let module = parser::parse(source, Mode::Module, "<python>").map_err(|e| {
        TranslateError::syntax(e.error.to_string(), line_at(source, usize::from(e.offset)))
    })?;
    let py::Mod::Module(py::ModModule { body, .. }) = module else {
        return Err(TranslateError::syntax("expected a module", 1));
    };
    Narrower { source }.statements(&body)
}

/// 1-based line containing byte `offset`.
fn line_at(source: &str, offset: usize) -> u32 {
    let end = offset.min(source.len());
    let newlines = source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count();
    newlines as u32 + 1
}

fn unsupported(construct: impl Into<String>, line: u32) -> TranslateError {
    TranslateError::unsupported(construct, line)
}

struct Narrower<'s> {
    source: &'s str,
}

impl Narrower<'_> {
    fn line(&self, node: &impl Ranged) -> u32 {
        line_at(self.source, usize::from(node.range().start()))
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn statements(&self, stmts: &[py::Stmt]) -> TranslateResult<Vec<Stmt>> {
        stmts.iter().map(|stmt| self.statement(stmt)).collect()
    }

    fn statement(&self, stmt: &py::Stmt) -> TranslateResult<Stmt> {
        let line = self.line(stmt);
        let kind = match stmt {
            py::Stmt::FunctionDef(def) => self.function(def, line)?,
            py::Stmt::Assign(assign) => {
                let [target] = assign.targets.as_slice() else {
                    return Err(unsupported("chained assignment", line));
                };
                StmtKind::Assign(self.target(target, line)?, self.expr(&assign.value)?)
            }
            py::Stmt::AugAssign(aug) => StmtKind::AugAssign(
                self.target(&aug.target, line)?,
                operator(&aug.op, line)?,
                self.expr(&aug.value)?,
            ),
            py::Stmt::Expr(stmt) => StmtKind::Expr(self.expr(&stmt.value)?),
            py::Stmt::Return(ret) => {
                StmtKind::Return(ret.value.as_deref().map(|v| self.expr(v)).transpose()?)
            }
            py::Stmt::Global(global) => {
                StmtKind::Global(global.names.iter().map(|n| n.to_string()).collect())
            }
            py::Stmt::If(stmt) => StmtKind::If {
                cond: self.expr(&stmt.test)?,
                then: self.statements(&stmt.body)?,
                otherwise: self.statements(&stmt.orelse)?,
            },
            py::Stmt::While(stmt) => {
                if !stmt.orelse.is_empty() {
                    return Err(unsupported("'while ... else'", line));
                }
                StmtKind::While {
                    cond: self.expr(&stmt.test)?,
                    body: self.statements(&stmt.body)?,
                }
            }
            py::Stmt::Break(_) => StmtKind::Break,
            py::Stmt::Continue(_) => StmtKind::Continue,
            py::Stmt::Pass(_) => StmtKind::Pass,
            other => return Err(unsupported(statement_name(other), line)),
        };
        Ok(Stmt { kind, line })
    }

    fn function(&self, def: &py::StmtFunctionDef, line: u32) -> TranslateResult<StmtKind> {
        if !def.decorator_list.is_empty() {
            return Err(unsupported("decorator", line));
        }
        if def.returns.is_some() {
            return Err(unsupported("return annotation", line));
        }
        let args = &def.args;
        if !args.posonlyargs.is_empty() {
            return Err(unsupported("positional-only parameter", line));
        }
        if args.vararg.is_some() || args.kwarg.is_some() {
            return Err(unsupported("variadic parameter", line));
        }
        if !args.kwonlyargs.is_empty() {
            return Err(unsupported("keyword-only parameter", line));
        }

        let mut params: Vec<String> = Vec::with_capacity(args.args.len());
        for param in &args.args {
            if param.default.is_some() {
                return Err(unsupported("default argument", line));
            }
            if param.def.annotation.is_some() {
                return Err(unsupported("parameter annotation", line));
            }
            let name = param.def.arg.to_string();
            if params.contains(&name) {
                return Err(TranslateError::syntax(
                    format!("duplicate parameter '{name}'"),
                    line,
                ));
            }
            params.push(name);
        }

        Ok(StmtKind::Def {
            name: def.name.to_string(),
            params,
            body: self.statements(&def.body)?,
        })
    }

    fn target(&self, target: &py::Expr, line: u32) -> TranslateResult<String> {
        match target {
            py::Expr::Name(name) => Ok(name.id.to_string()),
            py::Expr::Tuple(_) | py::Expr::List(_) => Err(unsupported("tuple assignment", line)),
            other => Err(unsupported(
                format!("assignment to {}", expression_name(other)),
                line,
            )),
        }
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn expr(&self, expr: &py::Expr) -> TranslateResult<Expr> {
        let line = self.line(expr);
        match expr {
            py::Expr::Constant(c) => constant(&c.value, false, line),
            py::Expr::Name(name) => Ok(Expr::Name(name.id.to_string())),
            py::Expr::UnaryOp(unary) => match unary.op {
                // A negated literal folds so that i64::MIN is expressible.
                py::UnaryOp::USub => match unary.operand.as_ref() {
                    py::Expr::Constant(c) => constant(&c.value, true, line),
                    operand => Ok(Expr::Neg(Box::new(self.expr(operand)?))),
                },
                py::UnaryOp::UAdd => self.expr(&unary.operand),
                py::UnaryOp::Not => Ok(Expr::Not(Box::new(self.expr(&unary.operand)?))),
                py::UnaryOp::Invert => Err(unsupported("bitwise '~'", line)),
            },
            py::Expr::BinOp(binary) => Ok(Expr::Binary(
                operator(&binary.op, line)?,
                Box::new(self.expr(&binary.left)?),
                Box::new(self.expr(&binary.right)?),
            )),
            py::Expr::BoolOp(boolean) => {
                let op = match boolean.op {
                    py::BoolOp::And => BoolOp::And,
                    py::BoolOp::Or => BoolOp::Or,
                };
                let mut values = boolean.values.iter();
                let first = values
                    .next()
                    .ok_or_else(|| TranslateError::syntax("empty boolean operation", line))?;
                let mut left = self.expr(first)?;
                for right in values {
                    left = Expr::Bool(op, Box::new(left), Box::new(self.expr(right)?));
                }
                Ok(left)
            }
            py::Expr::Compare(compare) => {
                let ([op], [right]) = (compare.ops.as_slice(), compare.comparators.as_slice())
                else {
                    return Err(unsupported("chained comparison", line));
                };
                Ok(Expr::Compare(
                    comparison(op, line)?,
                    Box::new(self.expr(&compare.left)?),
                    Box::new(self.expr(right)?),
                ))
            }
            py::Expr::Call(call) => {
                let py::Expr::Name(callee) = call.func.as_ref() else {
                    return Err(unsupported(
                        format!("call of {}", expression_name(&call.func)),
                        line,
                    ));
                };
                if !call.keywords.is_empty() {
                    return Err(unsupported("keyword argument", line));
                }
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.expr(arg))
                    .collect::<TranslateResult<Vec<_>>>()?;
                Ok(Expr::Call(callee.id.to_string(), args))
            }
            other => Err(unsupported(expression_name(other), line)),
        }
    }
}

fn constant(value: &py::Constant, negate: bool, line: u32) -> TranslateResult<Expr> {
    match value {
        py::Constant::Int(magnitude) => {
            let text = if negate {
                format!("-{magnitude}")
            } else {
                magnitude.to_string()
            };
            text.parse::<i64>().map(Expr::Int).map_err(|_| {
                unsupported(
                    format!("integer literal {text} outside the 64-bit range"),
                    line,
                )
            })
        }
        py::Constant::Bool(b) => {
            let v = i64::from(*b);
            Ok(Expr::Int(if negate { -v } else { v }))
        }
        other => Err(unsupported(constant_name(other), line)),
    }
}

fn operator(op: &py::Operator, line: u32) -> TranslateResult<BinOp> {
    match op {
        py::Operator::Add => Ok(BinOp::Add),
        py::Operator::Sub => Ok(BinOp::Sub),
        py::Operator::Mult => Ok(BinOp::Mul),
        py::Operator::FloorDiv => Ok(BinOp::FloorDiv),
        py::Operator::Mod => Ok(BinOp::Mod),
        py::Operator::Div => Err(unsupported("true division '/'", line)),
        py::Operator::Pow => Err(unsupported("exponentiation '**'", line)),
        py::Operator::MatMult => Err(unsupported("matrix multiplication '@'", line)),
        py::Operator::LShift | py::Operator::RShift => Err(unsupported("bit shift", line)),
        py::Operator::BitAnd | py::Operator::BitOr | py::Operator::BitXor => {
            Err(unsupported("bitwise operator", line))
        }
    }
}

fn comparison(op: &py::CmpOp, line: u32) -> TranslateResult<CmpOp> {
    match op {
        py::CmpOp::Lt => Ok(CmpOp::Lt),
        py::CmpOp::Gt => Ok(CmpOp::Gt),
        py::CmpOp::LtE => Ok(CmpOp::Le),
        py::CmpOp::GtE => Ok(CmpOp::Ge),
        py::CmpOp::Eq => Ok(CmpOp::Eq),
        py::CmpOp::NotEq => Ok(CmpOp::Ne),
        py::CmpOp::In | py::CmpOp::NotIn => Err(unsupported("'in' operator", line)),
        py::CmpOp::Is | py::CmpOp::IsNot => Err(unsupported("'is' operator", line)),
    }
}

fn statement_name(stmt: &py::Stmt) -> &'static str {
    match stmt {
        py::Stmt::AsyncFunctionDef(_) | py::Stmt::AsyncFor(_) | py::Stmt::AsyncWith(_) => {
            "async code"
        }
        py::Stmt::ClassDef(_) => "class definition",
        py::Stmt::Delete(_) => "'del' statement",
        py::Stmt::AnnAssign(_) => "annotated assignment",
        py::Stmt::For(_) => "'for' loop",
        py::Stmt::With(_) => "'with' statement",
        py::Stmt::Match(_) => "'match' statement",
        py::Stmt::Raise(_) => "'raise' statement",
        py::Stmt::Try(_) => "'try' statement",
        py::Stmt::Assert(_) => "'assert' statement",
        py::Stmt::Import(_) | py::Stmt::ImportFrom(_) => "import statement",
        py::Stmt::Nonlocal(_) => "nonlocal declaration",
        _ => "statement",
    }
}

fn expression_name(expr: &py::Expr) -> &'static str {
    match expr {
        py::Expr::IfExp(_) => "conditional expression",
        py::Expr::Lambda(_) => "lambda expression",
        py::Expr::ListComp(_)
        | py::Expr::SetComp(_)
        | py::Expr::DictComp(_)
        | py::Expr::GeneratorExp(_) => "comprehension",
        py::Expr::List(_) => "list display",
        py::Expr::Tuple(_) => "tuple",
        py::Expr::Dict(_) => "dict display",
        py::Expr::Set(_) => "set display",
        py::Expr::Subscript(_) => "subscript",
        py::Expr::Attribute(_) => "attribute access",
        py::Expr::Yield(_) | py::Expr::YieldFrom(_) => "generator",
        py::Expr::Await(_) => "async code",
        py::Expr::NamedExpr(_) => "assignment expression",
        py::Expr::JoinedStr(_) | py::Expr::FormattedValue(_) => "f-string",
        py::Expr::Starred(_) => "argument unpacking",
        py::Expr::Slice(_) => "slice",
        py::Expr::Call(_) => "call result",
        py::Expr::Constant(c) => constant_name(&c.value),
        _ => "expression",
    }
}

fn constant_name(value: &py::Constant) -> &'static str {
    match value {
        py::Constant::None => "None",
        py::Constant::Str(_) => "string literal",
        py::Constant::Bytes(_) => "bytes literal",
        py::Constant::Float(_) => "float literal",
        py::Constant::Complex { .. } => "complex literal",
        py::Constant::Tuple(_) => "tuple",
        py::Constant::Ellipsis => "'...'",
        _ => "literal",
    }
}
