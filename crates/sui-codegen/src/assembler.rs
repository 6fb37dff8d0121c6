//! Text-to-binary assembly.
//!
//! The backend never links an assembler in; it goes through the
//! [`Assembler`] trait so the CLI can shell out to `wat2wasm` while tests
//! substitute something in-process.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::AssembleError;

/// Environment variable naming the assembler executable.
pub const WAT2WASM_ENV: &str = "SUI_WAT2WASM";

/// Turns WebAssembly text into a binary module.
pub trait Assembler {
    fn assemble(&self, wat: &str) -> Result<Vec<u8>, AssembleError>;
}

/// Runs the external `wat2wasm` tool on a temporary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wat2Wasm {
    program: PathBuf,
}

impl Wat2Wasm {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `$SUI_WAT2WASM` if set, otherwise `wat2wasm` from `PATH`.
    pub fn from_env() -> Self {
        let program = std::env::var_os(WAT2WASM_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| OsString::from("wat2wasm"));
        Self::new(program)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for Wat2Wasm {
    fn default() -> Self {
        Self::new("wat2wasm")
    }
}

impl Assembler for Wat2Wasm {
    fn assemble(&self, wat: &str) -> Result<Vec<u8>, AssembleError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("module.wat");
        let output = dir.path().join("module.wasm");
        fs::write(&input, wat)?;

        debug!(program = %self.program.display(), "running assembler");
        let result = Command::new(&self.program)
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .output();
        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AssembleError::ToolUnavailable {
                    program: self.program.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if !out.status.success() {
            return Err(AssembleError::Rejected {
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        }
        Ok(fs::read(&output)?)
    }
}

/// Assembles with the `wat` crate, without any external process.
#[cfg(feature = "in-process")]
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcess;

#[cfg(feature = "in-process")]
impl Assembler for InProcess {
    fn assemble(&self, wat: &str) -> Result<Vec<u8>, AssembleError> {
        wat::parse_str(wat).map_err(|e| AssembleError::Rejected {
            stderr: e.to_string(),
        })
    }
}
