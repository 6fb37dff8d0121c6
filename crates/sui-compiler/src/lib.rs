//! Sui compiler: orchestrates the full pipeline.
//!
//! ```text
//! Sui source → Line Validator → Program Builder → Program ─┬→ Interpreter
//!                                                          ├→ WAT → Assembler → .wasm
//!                                                          └→ Python source
//! ```
//!
//! Every entry point takes the source text and a file name (used in
//! diagnostics). [`compile_to_result`] wraps any backend in a
//! serialisable [`CompileResult`] for tools that want JSON.

pub mod reference;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use sui_codegen::{Assembler, CodegenError};
use sui_eval::{EvalError, Environment, Interpreter, Output};
use sui_parser::{ParseContext, Parser};
use sui_types::{Diagnostics, Program, SourceFile};

// ══════════════════════════════════════════════════════════════════════════════
// Backends & results
// ══════════════════════════════════════════════════════════════════════════════

/// Where a checked program goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Interpret,
    Wasm,
    Python,
}

impl Backend {
    /// File extension of the artifact written to disk, if any.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Backend::Interpret => None,
            Backend::Wasm => Some("wasm"),
            Backend::Python => Some("py"),
        }
    }
}

/// What a successful backend run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Artifact {
    /// Values printed by the interpreter.
    Output(Vec<i64>),
    Wasm(Vec<u8>),
    Python(String),
}

/// Structured outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    pub backend: Backend,
    pub artifact: Option<Artifact>,
    /// Syntax and structure errors. Empty when parsing succeeded.
    pub diagnostics: Diagnostics,
    /// Backend or runtime failure after a clean parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Lowercase hex SHA-256 of the source text.
    pub source_hash: String,
}

/// Why a pipeline stage failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Diagnostics(Diagnostics),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<Diagnostics> for PipelineError {
    fn from(diagnostics: Diagnostics) -> Self {
        PipelineError::Diagnostics(diagnostics)
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

// ══════════════════════════════════════════════════════════════════════════════
// Pipeline
// ══════════════════════════════════════════════════════════════════════════════

/// Validate and structurally check `source` without running anything.
pub fn check(source: &str, file_name: &str) -> Diagnostics {
    match parse(source, file_name) {
        Ok(_) => Diagnostics::empty(),
        Err(PipelineError::Diagnostics(d)) => d,
        Err(_) => Diagnostics::empty(),
    }
}

/// Parse `source` into a [`Program`].
pub fn parse(source: &str, file_name: &str) -> PipelineResult<Program> {
    parse_with(source, file_name, ParseContext::default())
}

fn parse_with(source: &str, file_name: &str, context: ParseContext) -> PipelineResult<Program> {
    let sf = SourceFile::new(file_name, source);
    let program = Parser::with_context(&sf, context).parse().into_result()?;
    debug!(
        file = file_name,
        functions = program.functions.len(),
        instructions = program.instructions.len(),
        globals = program.global_count,
        "parsed"
    );
    Ok(program)
}

/// Parse and run `source` against a session environment.
///
/// Functions already in `env` may be called or redefined.
pub fn run_source(
    source: &str,
    file_name: &str,
    env: &mut Environment,
    out: &mut dyn Output,
) -> PipelineResult<()> {
    run_source_with(&Interpreter::default(), source, file_name, env, out)
}

/// [`run_source`] with an explicitly configured interpreter.
pub fn run_source_with(
    interpreter: &Interpreter,
    source: &str,
    file_name: &str,
    env: &mut Environment,
    out: &mut dyn Output,
) -> PipelineResult<()> {
    let context = ParseContext {
        known_functions: env.function_count(),
    };
    let program = parse_with(source, file_name, context)?;
    interpreter.run(&program, env, out)?;
    Ok(())
}

/// Compile `source` to WebAssembly text.
pub fn compile_wat(source: &str, file_name: &str) -> PipelineResult<String> {
    let program = parse(source, file_name)?;
    Ok(sui_codegen::emit_wat(&program)?)
}

/// Compile `source` to a validated `.wasm` binary.
pub fn compile(source: &str, file_name: &str, assembler: &dyn Assembler) -> PipelineResult<Vec<u8>> {
    let program = parse(source, file_name)?;
    let wasm = sui_codegen::compile(&program, assembler)?;
    info!(file = file_name, bytes = wasm.len(), "compiled to wasm");
    Ok(wasm)
}

/// Translate `source` to a Python 3 script.
pub fn transpile(source: &str, file_name: &str) -> PipelineResult<String> {
    let program = parse(source, file_name)?;
    Ok(sui_python::emit_python(&program))
}

/// Run `source` through `backend` and capture the outcome.
///
/// Never fails: parse problems land in `diagnostics`, later failures in
/// `error`. The assembler is only used by [`Backend::Wasm`].
pub fn compile_to_result(
    source: &str,
    file_name: &str,
    backend: Backend,
    assembler: &dyn Assembler,
) -> CompileResult {
    let outcome = match backend {
        Backend::Interpret => {
            let mut env = Environment::new();
            let mut output = Vec::new();
            run_source(source, file_name, &mut env, &mut output).map(|()| Artifact::Output(output))
        }
        Backend::Wasm => compile(source, file_name, assembler).map(Artifact::Wasm),
        Backend::Python => transpile(source, file_name).map(Artifact::Python),
    };

    let (artifact, diagnostics, error) = match outcome {
        Ok(artifact) => (Some(artifact), Diagnostics::empty(), None),
        Err(PipelineError::Diagnostics(d)) => (None, d, None),
        Err(e) => (None, Diagnostics::empty(), Some(e.to_string())),
    };
    CompileResult {
        success: artifact.is_some(),
        backend,
        artifact,
        diagnostics,
        error,
        source_hash: source_hash(source),
    }
}

/// Lowercase hex SHA-256 of `source`.
pub fn source_hash(source: &str) -> String {
    Sha256::digest(source.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
