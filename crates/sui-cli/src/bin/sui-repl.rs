//! Interactive Sui shell.
//!
//! Usage: `sui-repl`

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sui-repl", version)]
#[command(about = "Interactive Sui shell (empty line to execute, .exit / .quit / .reset)")]
struct Args {}

fn main() {
    sui_cli::init_logging();

    let _args = Args::parse();
    if let Err(e) = sui_cli::repl::run_interactive() {
        sui_cli::exit_with(e);
    }
}
