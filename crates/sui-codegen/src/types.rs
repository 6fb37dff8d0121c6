//! Names and constants shared by the emitted module and its hosts.
//!
//! The module contract:
//!
//! | Kind   | Name            | Signature                    |
//! |--------|-----------------|------------------------------|
//! | import | `env.print_i64` | `(param i64)`                |
//! | export | `main`          | `()`                         |
//! | export | `f<N>`          | `(param i64 …) (result i64)` |
//! | export | `g<N>`          | `(mut i64)` global           |

/// First four bytes of every binary module.
pub const WASM_MAGIC: [u8; 4] = *b"\0asm";

/// Binary format version emitted by conforming assemblers.
pub const WASM_VERSION: [u8; 4] = [1, 0, 0, 0];

// ── Imports ──────────────────────────────────────────────────────────────────

pub const IMPORT_MODULE: &str = "env";
/// Host function receiving every value written by `.`.
pub const PRINT_IMPORT: &str = "print_i64";

// ── Exports ──────────────────────────────────────────────────────────────────

/// Entry point holding the module-level instructions.
pub const MAIN_EXPORT: &str = "main";

/// Export name of Sui function `index`.
pub fn function_export(index: u32) -> String {
    format!("f{index}")
}

/// Export name of Sui global `index`.
pub fn global_export(index: u32) -> String {
    format!("g{index}")
}
