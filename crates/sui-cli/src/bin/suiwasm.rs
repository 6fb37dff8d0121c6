//! Run a compiled Sui WebAssembly module.
//!
//! Usage: `suiwasm <FILE.wasm> [--globals]`

use std::path::PathBuf;

use clap::Parser;
use sui_runtime::WasmRuntime;

#[derive(Parser, Debug)]
#[command(name = "suiwasm", version)]
#[command(about = "Run the main entry point of a compiled Sui module")]
struct Args {
    /// WebAssembly binary produced by sui2wasm
    file: PathBuf,

    /// After running, print every exported global as `name = value`
    #[arg(long)]
    globals: bool,
}

fn main() {
    sui_cli::init_logging();

    let args = Args::parse();
    let bytes = sui_cli::read_binary(&args.file).unwrap_or_else(|e| sui_cli::exit_with(e));

    let mut runtime = WasmRuntime::load(&bytes).unwrap_or_else(|e| sui_cli::exit_with(e));
    let output = runtime.run_main().unwrap_or_else(|e| sui_cli::exit_with(e));
    for value in output {
        println!("{value}");
    }

    if args.globals {
        let globals = runtime.globals().unwrap_or_else(|e| sui_cli::exit_with(e));
        for (name, value) in globals {
            println!("{name} = {value}");
        }
    }
}
