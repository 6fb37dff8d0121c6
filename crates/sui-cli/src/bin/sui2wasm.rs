//! Compile a Sui program to a WebAssembly binary.
//!
//! Usage: `sui2wasm <FILE> [-o OUT] [--emit-wat] [--json]`
//!
//! Assembly goes through `wat2wasm` (or `$SUI_WAT2WASM`).

use std::path::PathBuf;
use std::process;

use clap::Parser;
use sui_codegen::Wat2Wasm;
use sui_compiler::{compile, compile_to_result, compile_wat, Artifact, Backend, PipelineError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sui2wasm", version)]
#[command(about = "Compile a Sui program to a WebAssembly binary (.wasm)")]
struct Args {
    /// Sui source file
    file: PathBuf,

    /// Output path (default: the source path with a .wasm or .wat extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the WebAssembly text instead of assembling it
    #[arg(long)]
    emit_wat: bool,

    /// Print a structured JSON result on stdout
    #[arg(long, conflicts_with = "emit_wat")]
    json: bool,
}

fn main() {
    sui_cli::init_logging();

    let args = Args::parse();
    let source = sui_cli::read_source(&args.file).unwrap_or_else(|e| sui_cli::exit_with(e));
    let name = args.file.display().to_string();

    if args.emit_wat {
        let wat = match compile_wat(&source, &name) {
            Ok(wat) => wat,
            Err(PipelineError::Diagnostics(d)) => sui_cli::exit_with_diagnostics(&d),
            Err(e) => sui_cli::exit_with(e),
        };
        let path = sui_cli::output_path(&args.file, args.output, "wat");
        sui_cli::write_artifact(&path, wat).unwrap_or_else(|e| sui_cli::exit_with(e));
        info!("Wrote {}", path.display());
        return;
    }

    let assembler = Wat2Wasm::from_env();
    let path = sui_cli::output_path(&args.file, args.output, "wasm");

    if args.json {
        let result = compile_to_result(&source, &name, Backend::Wasm, &assembler);
        if let Some(Artifact::Wasm(bytes)) = &result.artifact {
            sui_cli::write_artifact(&path, bytes).unwrap_or_else(|e| sui_cli::exit_with(e));
        }
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => sui_cli::exit_with(e),
        }
        if !result.success {
            process::exit(1);
        }
        return;
    }

    let wasm = match compile(&source, &name, &assembler) {
        Ok(wasm) => wasm,
        Err(PipelineError::Diagnostics(d)) => sui_cli::exit_with_diagnostics(&d),
        Err(e) => sui_cli::exit_with(e),
    };
    sui_cli::write_artifact(&path, wasm).unwrap_or_else(|e| sui_cli::exit_with(e));
    info!("Wrote {}", path.display());
}
