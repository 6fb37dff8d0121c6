//! Translate a Sui program to Python 3.
//!
//! Usage: `sui2py <FILE> [-o OUT]`

use std::path::PathBuf;

use clap::Parser;
use sui_compiler::{transpile, PipelineError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sui2py", version)]
#[command(about = "Translate a Sui program to a Python 3 script")]
struct Args {
    /// Sui source file
    file: PathBuf,

    /// Output path (default: the source path with a .py extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    sui_cli::init_logging();

    let args = Args::parse();
    let source = sui_cli::read_source(&args.file).unwrap_or_else(|e| sui_cli::exit_with(e));

    let python = match transpile(&source, &args.file.display().to_string()) {
        Ok(python) => python,
        Err(PipelineError::Diagnostics(d)) => sui_cli::exit_with_diagnostics(&d),
        Err(e) => sui_cli::exit_with(e),
    };

    let path = sui_cli::output_path(&args.file, args.output, "py");
    sui_cli::write_artifact(&path, python).unwrap_or_else(|e| sui_cli::exit_with(e));
    info!("Wrote {}", path.display());
}
