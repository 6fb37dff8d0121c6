//! Syntax tree for the translatable Python subset.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Name(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Bool(BoolOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Assign(String, Expr),
    AugAssign(String, BinOp, Expr),
    Expr(Expr),
    Return(Option<Expr>),
    Global(Vec<String>),
    /// `elif` chains nest in `otherwise`.
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Pass,
    Def {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
}

impl Expr {
    /// Visit every name this expression reads or calls.
    pub fn for_each_name(&self, f: &mut dyn FnMut(&str)) {
        match self {
            Expr::Int(_) => {}
            Expr::Name(name) => f(name),
            Expr::Neg(e) | Expr::Not(e) => e.for_each_name(f),
            Expr::Binary(_, l, r) | Expr::Compare(_, l, r) | Expr::Bool(_, l, r) => {
                l.for_each_name(f);
                r.for_each_name(f);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.for_each_name(f)),
        }
    }
}

/// Visit every name mentioned anywhere in `stmts`, including nested bodies.
pub fn for_each_name(stmts: &[Stmt], f: &mut dyn FnMut(&str)) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Assign(name, e) | StmtKind::AugAssign(name, _, e) => {
                f(name);
                e.for_each_name(f);
            }
            StmtKind::Expr(e) => e.for_each_name(f),
            StmtKind::Return(e) => {
                if let Some(e) = e {
                    e.for_each_name(f);
                }
            }
            StmtKind::Global(names) => names.iter().for_each(|n| f(n)),
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                cond.for_each_name(f);
                for_each_name(then, f);
                for_each_name(otherwise, f);
            }
            StmtKind::While { cond, body } => {
                cond.for_each_name(f);
                for_each_name(body, f);
            }
            StmtKind::Def { params, body, .. } => {
                params.iter().for_each(|p| f(p));
                for_each_name(body, f);
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Pass => {}
        }
    }
}
