//! Command-line tests.
//!
//! Each test drives a built binary with `std::process::Command` inside a
//! temporary directory. Tests that need `wat2wasm` skip when it is not
//! installed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sui_codegen::InProcess;

const SUI: &str = env!("CARGO_BIN_EXE_sui");
const SUI2WASM: &str = env!("CARGO_BIN_EXE_sui2wasm");
const SUIWASM: &str = env!("CARGO_BIN_EXE_suiwasm");
const SUI2PY: &str = env!("CARGO_BIN_EXE_sui2py");
const PY2SUI: &str = env!("CARGO_BIN_EXE_py2sui");
const SUI_REPL: &str = env!("CARGO_BIN_EXE_sui-repl");

const FIBONACCI: &str = "\
# 0 1 {
< v0 a0 2
! v1 v0
? v1 1
^ a0
: 1
- v2 a0 1
$ v3 0 v2
- v4 a0 2
$ v5 0 v4
+ v6 v3 v5
^ v6
}
= g0 10
$ g1 0 g0
. g1
";

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn run(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary starts")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

// ══════════════════════════════════════════════════════════════════════════════
// Usage
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn help_prints_usage_and_exits_zero() {
    for bin in [SUI, SUI2WASM, SUIWASM, SUI2PY, PY2SUI, SUI_REPL] {
        let output = run(bin, &["--help"]);
        assert!(output.status.success(), "{bin}");
        assert!(stdout(&output).contains("Usage"), "{bin}: {}", stdout(&output));
    }
}

#[test]
fn version_flag() {
    let output = run(SUI, &["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_source_exits_one_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nonexistent.sui");
    for bin in [SUI, SUI2WASM, SUIWASM, SUI2PY, PY2SUI] {
        let output = run(bin, &[arg(&missing)]);
        assert_eq!(output.status.code(), Some(1), "{bin}");
        assert!(stderr(&output).to_lowercase().contains("not found"), "{bin}");
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ══════════════════════════════════════════════════════════════════════════════
// sui
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn sui_runs_program() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "fib.sui", FIBONACCI);
    let output = run(SUI, &[arg(&file)]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "55\n");
}

#[test]
fn sui_reports_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "bad.sui", "= g0 1\nx g1\n");
    let output = run(SUI, &[arg(&file)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("E100"), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn sui_runtime_error_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "div.sui", ". 1\n/ g0 1 0\n. 2\n");
    let output = run(SUI, &[arg(&file)]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "1\n");
    assert!(stderr(&output).contains("division by zero"));
}

#[test]
fn sui_json_result() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "fib.sui", FIBONACCI);
    let output = run(SUI, &[arg(&file), "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["artifact"]["kind"], "output");
    assert_eq!(json["artifact"]["data"][0], 55);
}

#[test]
fn sui_reference_and_opcode_table() {
    let output = run(SUI, &["--reference"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("OPCODES:"));

    let output = run(SUI, &["--opcode-table"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["total_opcodes"], 20);
}

// ══════════════════════════════════════════════════════════════════════════════
// sui2wasm / suiwasm
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn sui2wasm_default_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "test.sui", "= g0 42\n. g0");
    let output = run(SUI2WASM, &[arg(&file)]);
    if stderr(&output).contains("wat2wasm not found") {
        eprintln!("skipping: wat2wasm not installed");
        assert_eq!(output.status.code(), Some(1));
        assert!(!dir.path().join("test.wasm").exists());
        return;
    }
    assert!(output.status.success(), "{}", stderr(&output));
    let bytes = std::fs::read(dir.path().join("test.wasm")).unwrap();
    assert_eq!(&bytes[0..4], b"\0asm");
}

#[test]
fn sui2wasm_emit_wat() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "fib.sui", FIBONACCI);
    let out = dir.path().join("custom.wat");
    let output = run(SUI2WASM, &[arg(&file), "--emit-wat", "-o", arg(&out)]);
    assert!(output.status.success(), "{}", stderr(&output));
    let wat = std::fs::read_to_string(&out).unwrap();
    assert!(wat.starts_with("(module"));
    assert!(wat.contains("(export \"f0\")"));
}

#[test]
fn sui2wasm_json_reports_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "bad.sui", "= g0\n");
    let output = run(SUI2WASM, &[arg(&file), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["diagnostics"]["errors"][0]["code"], 101);
    assert!(!dir.path().join("bad.wasm").exists());
}

#[test]
fn suiwasm_runs_module() {
    let dir = tempfile::tempdir().unwrap();
    let wasm = sui_compiler::compile(FIBONACCI, "fib.sui", &InProcess).unwrap();
    let path = dir.path().join("fib.wasm");
    std::fs::write(&path, wasm).unwrap();

    let output = run(SUIWASM, &[arg(&path), "--globals"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("55\n"), "{text}");
    assert!(text.contains("g0 = 10"), "{text}");
    assert!(text.contains("g1 = 55"), "{text}");
}

#[test]
fn suiwasm_rejects_non_wasm() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "fake.wasm", "not a module");
    let output = run(SUIWASM, &[arg(&path)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("magic"), "{}", stderr(&output));
}

// ══════════════════════════════════════════════════════════════════════════════
// sui2py / py2sui
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn sui2py_then_py2sui_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "fib.sui", FIBONACCI);

    let output = run(SUI2PY, &[arg(&file)]);
    assert!(output.status.success(), "{}", stderr(&output));
    let py = dir.path().join("fib.py");
    assert!(std::fs::read_to_string(&py).unwrap().contains("def f0(a0):"));

    let back = dir.path().join("back.sui");
    let output = run(PY2SUI, &[arg(&py), "-o", arg(&back)]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(SUI, &[arg(&back)]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "55\n");
}

#[test]
fn py2sui_hand_written_script() {
    let dir = tempfile::tempdir().unwrap();
    let py = write(
        dir.path(),
        "squares.py",
        "def square(n):\n    return n * n\n\nprint(square(7))\n",
    );
    let output = run(PY2SUI, &[arg(&py)]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(SUI, &[arg(&dir.path().join("squares.sui"))]);
    assert_eq!(stdout(&output), "49\n");
}

#[test]
fn py2sui_names_unsupported_construct() {
    let dir = tempfile::tempdir().unwrap();
    let py = write(dir.path(), "loop.py", "for i in range(3):\n    print(i)\n");
    let output = run(PY2SUI, &[arg(&py)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("'for' loop"), "{}", stderr(&output));
    assert!(!dir.path().join("loop.sui").exists());
}
