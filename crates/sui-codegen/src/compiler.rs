//! Compilation pipeline:
//! 1. Lower the program to WAT ([`emit_wat`])
//! 2. Assemble through the injected [`Assembler`]
//! 3. Check the magic number and validate with `wasmparser`

use sui_types::Program;
use tracing::debug;

use crate::assembler::Assembler;
use crate::error::{CodegenError, CodegenResult};
use crate::types::WASM_MAGIC;
use crate::wat::emit_wat;

/// Compile a structurally valid Sui [`Program`] into a `.wasm` binary.
///
/// There is no partial output: any failure along the way is returned as a
/// [`CodegenError`] and no bytes are produced.
pub fn compile(program: &Program, assembler: &dyn Assembler) -> CodegenResult<Vec<u8>> {
    let wat = emit_wat(program)?;
    debug!(bytes = wat.len(), "emitted WAT");

    let wasm = assembler.assemble(&wat)?;
    check_module(&wasm)?;
    debug!(bytes = wasm.len(), "assembled module");
    Ok(wasm)
}

/// Verify that `bytes` is a valid WebAssembly binary module.
pub fn check_module(bytes: &[u8]) -> CodegenResult<()> {
    if !bytes.starts_with(&WASM_MAGIC) {
        return Err(CodegenError::BadMagic);
    }
    wasmparser::validate(bytes).map_err(|e| CodegenError::ValidationFailed(format!("{e}")))?;
    Ok(())
}
