//! Run a Sui program with the interpreter.
//!
//! Usage: `sui [FILE] [--json] [--reference] [--opcode-table]`
//!
//! Without a file, starts the interactive shell.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use sui_codegen::Wat2Wasm;
use sui_compiler::reference::{generate_opcode_table, generate_reference};
use sui_compiler::{compile_to_result, run_source, Backend, PipelineError};
use sui_eval::{Environment, WriterOutput};

#[derive(Parser, Debug)]
#[command(name = "sui", version)]
#[command(about = "Run a Sui program, or start the REPL when no file is given")]
struct Args {
    /// Sui source file
    file: Option<PathBuf>,

    /// Print a structured JSON result instead of the program output
    #[arg(long)]
    json: bool,

    /// Print the language reference and exit
    #[arg(long, conflicts_with = "file")]
    reference: bool,

    /// Print the opcode table as JSON and exit
    #[arg(long, conflicts_with = "file")]
    opcode_table: bool,
}

fn main() {
    sui_cli::init_logging();

    let args = Args::parse();

    if args.reference {
        print!("{}", generate_reference());
        return;
    }
    if args.opcode_table {
        println!("{}", generate_opcode_table());
        return;
    }

    let Some(file) = args.file else {
        if let Err(e) = sui_cli::repl::run_interactive() {
            sui_cli::exit_with(e);
        }
        return;
    };

    let source = sui_cli::read_source(&file).unwrap_or_else(|e| sui_cli::exit_with(e));
    let name = file.display().to_string();

    if args.json {
        let result = compile_to_result(&source, &name, Backend::Interpret, &Wat2Wasm::from_env());
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => sui_cli::exit_with(e),
        }
        if !result.success {
            process::exit(1);
        }
        return;
    }

    let mut env = Environment::new();
    let mut out = WriterOutput(io::stdout().lock());
    match run_source(&source, &name, &mut env, &mut out) {
        Ok(()) => {}
        Err(PipelineError::Diagnostics(d)) => sui_cli::exit_with_diagnostics(&d),
        Err(e) => sui_cli::exit_with(e),
    }
}
