//! Session state for the Sui interpreter.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use sui_types::{Function, Instruction, Opcode, Operand, Value};

/// A registered function together with its label table.
#[derive(Debug)]
pub struct Callable {
    pub function: Function,
    pub(crate) labels: HashMap<u32, usize>,
}

impl Callable {
    pub fn new(function: Function) -> Self {
        let labels = label_table(&function.body);
        Self { function, labels }
    }

    /// Body position of label `label`.
    pub fn label(&self, label: u32) -> Option<usize> {
        self.labels.get(&label).copied()
    }
}

/// Positions of every `:` in `body`. The first definition wins.
pub fn label_table(body: &[Instruction]) -> HashMap<u32, usize> {
    let mut labels = HashMap::new();
    for (pos, inst) in body.iter().enumerate() {
        if inst.opcode == Opcode::Label {
            if let Some(label) = inst.label() {
                labels.entry(label).or_insert(pos);
            }
        }
    }
    labels
}

/// Long-lived interpreter state.
///
/// A batch run uses one `Environment` per program; the REPL keeps one for
/// the whole session and replaces it on `.reset`. Globals spring into
/// existence on first write. Functions are keyed by index, so a later
/// definition with the same index replaces the earlier one.
///
/// Calls in progress live on an explicit frame stack, so nesting depth is
/// bounded by the interpreter's limit and never by the host stack. The
/// stack is empty whenever no run is in progress.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    globals: BTreeMap<u32, Value>,
    functions: BTreeMap<u32, Rc<Callable>>,
    pub(crate) frames: Vec<Activation>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self, index: u32) -> Option<Value> {
        self.globals.get(&index).copied()
    }

    pub fn set_global(&mut self, index: u32, value: Value) {
        self.globals.insert(index, value);
    }

    /// All globals written so far, ordered by index.
    pub fn globals(&self) -> &BTreeMap<u32, Value> {
        &self.globals
    }

    /// Register (or replace) a function.
    pub fn define_function(&mut self, function: Function) {
        self.functions
            .insert(function.index, Rc::new(Callable::new(function)));
    }

    pub fn function(&self, index: u32) -> Option<&Function> {
        self.functions.get(&index).map(|c| &c.function)
    }

    pub(crate) fn callable(&self, index: u32) -> Option<Rc<Callable>> {
        self.functions.get(&index).cloned()
    }

    /// Number of functions the session knows. Indices are dense, so this is
    /// also the next free index.
    pub fn function_count(&self) -> u32 {
        self.functions.len() as u32
    }

    /// Current call nesting; zero outside any function.
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }
}

/// One call in progress on the frame stack.
#[derive(Debug, Clone)]
pub(crate) struct Activation {
    pub(crate) callable: Rc<Callable>,
    pub(crate) frame: Frame,
    /// Next instruction of the callee body.
    pub(crate) pc: usize,
    /// Caller slot receiving the return value. `None` for a call made
    /// directly by the host.
    pub(crate) result: Option<Operand>,
    /// Line of the `$` that made the call.
    pub(crate) line: u32,
}

/// Activation record of one function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub locals: Vec<Value>,
    pub args: Vec<Value>,
}

impl Frame {
    /// A frame with `local_count` zeroed locals and the given arguments.
    pub fn new(local_count: u32, args: Vec<Value>) -> Self {
        Self {
            locals: vec![0; local_count as usize],
            args,
        }
    }
}
