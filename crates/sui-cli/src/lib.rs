//! Sui command-line tools.
//!
//! Shared plumbing for the `sui`, `sui2wasm`, `suiwasm`, `sui2py`,
//! `py2sui` and `sui-repl` binaries: logging setup, source loading,
//! output paths and the error exit used by every tool.

pub mod repl;

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use the `RUST_LOG` environment variable to override the default of
/// `warn`. Logs go to stderr; program output owns stdout.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// File-system failures at the tool boundary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

fn read_error(path: &Path, source: io::Error) -> CliError {
    if source.kind() == io::ErrorKind::NotFound {
        CliError::NotFound(path.to_path_buf())
    } else {
        CliError::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a UTF-8 source file.
pub fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| read_error(path, e))
}

/// Read a binary file.
pub fn read_binary(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| read_error(path, e))
}

/// Write an artifact, replacing any existing file.
pub fn write_artifact(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), CliError> {
    let contents = contents.as_ref();
    fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
    Ok(())
}

/// `-o` when given, otherwise the input path with `extension`.
pub fn output_path(input: &Path, explicit: Option<PathBuf>, extension: &str) -> PathBuf {
    explicit.unwrap_or_else(|| input.with_extension(extension))
}

/// Print `error: <err>` on stderr and exit with status 1.
pub fn exit_with(err: impl Display) -> ! {
    eprintln!("error: {err}");
    process::exit(1)
}

/// Print rendered diagnostics on stderr and exit with status 1.
pub fn exit_with_diagnostics(diagnostics: &sui_types::Diagnostics) -> ! {
    eprint!("{}", diagnostics.render());
    process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            output_path(Path::new("dir/fib.sui"), None, "wasm"),
            PathBuf::from("dir/fib.wasm")
        );
        assert_eq!(
            output_path(Path::new("prog"), None, "py"),
            PathBuf::from("prog.py")
        );
        assert_eq!(
            output_path(Path::new("a.sui"), Some("out/b.bin".into()), "wasm"),
            PathBuf::from("out/b.bin")
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sui");
        let err = read_source(&path).unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
        assert!(err.to_string().ends_with("missing.sui not found"));
        assert!(matches!(read_binary(&path), Err(CliError::NotFound(_))));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sui");
        write_artifact(&path, "= g0 1\n").unwrap();
        assert_eq!(read_source(&path).unwrap(), "= g0 1\n");
    }
}
