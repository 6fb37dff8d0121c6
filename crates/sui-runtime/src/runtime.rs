//! Module loading and execution.

use sui_codegen::types::{IMPORT_MODULE, MAIN_EXPORT, PRINT_IMPORT, WASM_MAGIC};
use tracing::debug;
use wasmi::{Caller, Engine, Instance, Linker, Module, Store, Val};
use wasmparser::{ExternalKind, Parser as WasmParser, Payload};

use crate::error::{RuntimeError, RuntimeResult};

/// An instantiated Sui module.
///
/// Values passed to `env.print_i64` accumulate in an output buffer that
/// [`WasmRuntime::run_main`] drains. Globals keep their values between
/// calls, so a module can be run and then inspected.
pub struct WasmRuntime {
    store: Store<Vec<i64>>,
    instance: Instance,
    global_names: Vec<String>,
}

impl WasmRuntime {
    /// Load and instantiate a binary module.
    pub fn load(bytes: &[u8]) -> RuntimeResult<Self> {
        if !bytes.starts_with(&WASM_MAGIC) {
            return Err(RuntimeError::Load("bad magic number".into()));
        }
        let global_names = exported_globals(bytes)?;

        let engine = Engine::default();
        let module =
            Module::new(&engine, bytes).map_err(|e| RuntimeError::Load(e.to_string()))?;
        let mut store = Store::new(&engine, Vec::new());
        let mut linker = <Linker<Vec<i64>>>::new(&engine);
        linker
            .func_wrap(
                IMPORT_MODULE,
                PRINT_IMPORT,
                |mut caller: Caller<'_, Vec<i64>>, value: i64| {
                    caller.data_mut().push(value);
                },
            )
            .map_err(|e| RuntimeError::Load(e.to_string()))?;
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| RuntimeError::Load(e.to_string()))?
            .start(&mut store)
            .map_err(|e| RuntimeError::Trap(e.to_string()))?;

        debug!(
            bytes = bytes.len(),
            globals = global_names.len(),
            "loaded module"
        );
        Ok(Self {
            store,
            instance,
            global_names,
        })
    }

    /// Run the module-level code and return everything it printed.
    pub fn run_main(&mut self) -> RuntimeResult<Vec<i64>> {
        let main = self
            .instance
            .get_typed_func::<(), ()>(&self.store, MAIN_EXPORT)
            .map_err(|_| RuntimeError::MissingExport(MAIN_EXPORT.to_string()))?;
        main.call(&mut self.store, ())
            .map_err(|e| RuntimeError::Trap(e.to_string()))?;
        Ok(self.take_output())
    }

    /// Call an exported function with `i64` arguments.
    pub fn call(&mut self, name: &str, args: &[i64]) -> RuntimeResult<i64> {
        let func = self
            .instance
            .get_func(&self.store, name)
            .ok_or_else(|| RuntimeError::MissingExport(name.to_string()))?;
        let ty = func.ty(&self.store);
        if ty.params().len() != args.len() {
            return Err(RuntimeError::ArgumentCount {
                name: name.to_string(),
                expected: ty.params().len(),
                found: args.len(),
            });
        }
        let inputs: Vec<Val> = args.iter().map(|v| Val::I64(*v)).collect();
        let mut outputs = vec![Val::I64(0); ty.results().len()];
        func.call(&mut self.store, &inputs, &mut outputs)
            .map_err(|e| RuntimeError::Trap(e.to_string()))?;
        match outputs.first() {
            Some(Val::I64(v)) => Ok(*v),
            _ => Ok(0),
        }
    }

    /// Current value of an exported `i64` global.
    pub fn global(&self, name: &str) -> RuntimeResult<i64> {
        let global = self
            .instance
            .get_global(&self.store, name)
            .ok_or_else(|| RuntimeError::MissingExport(name.to_string()))?;
        match global.get(&self.store) {
            Val::I64(v) => Ok(v),
            _ => Err(RuntimeError::MissingExport(name.to_string())),
        }
    }

    /// Every exported global with its current value, in export order.
    pub fn globals(&self) -> RuntimeResult<Vec<(String, i64)>> {
        self.global_names
            .iter()
            .map(|name| Ok((name.clone(), self.global(name)?)))
            .collect()
    }

    /// Drain the values printed so far.
    pub fn take_output(&mut self) -> Vec<i64> {
        std::mem::take(self.store.data_mut())
    }
}

fn exported_globals(bytes: &[u8]) -> RuntimeResult<Vec<String>> {
    let mut names = Vec::new();
    for payload in WasmParser::new(0).parse_all(bytes) {
        let payload = payload.map_err(|e| RuntimeError::Load(e.to_string()))?;
        if let Payload::ExportSection(reader) = payload {
            for export in reader {
                let export = export.map_err(|e| RuntimeError::Load(e.to_string()))?;
                if export.kind == ExternalKind::Global {
                    names.push(export.name.to_string());
                }
            }
        }
    }
    Ok(names)
}
