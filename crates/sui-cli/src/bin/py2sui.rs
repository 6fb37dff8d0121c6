//! Translate a supported Python subset to Sui.
//!
//! Usage: `py2sui <FILE.py> [-o OUT]`

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "py2sui", version)]
#[command(about = "Translate a Python script (supported subset) to Sui")]
struct Args {
    /// Python source file
    file: PathBuf,

    /// Output path (default: the source path with a .sui extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    sui_cli::init_logging();

    let args = Args::parse();
    let source = sui_cli::read_source(&args.file).unwrap_or_else(|e| sui_cli::exit_with(e));

    let program = sui_python::translate(&source)
        .unwrap_or_else(|e| sui_cli::exit_with(format!("{}: {e}", args.file.display())));

    let path = sui_cli::output_path(&args.file, args.output, "sui");
    sui_cli::write_artifact(&path, program.to_string()).unwrap_or_else(|e| sui_cli::exit_with(e));
    info!("Wrote {}", path.display());
}
