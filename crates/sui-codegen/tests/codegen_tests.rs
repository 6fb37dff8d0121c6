//! Integration tests for the Sui WASM code generator.
//!
//! Tests validate:
//! - Emitted text assembles to a valid module
//! - Module structure (imports, exported functions and globals)
//! - Label/jump lowering assembles for every body shape
//! - Call arity checking at emission
//! - Assembler failures surface as distinct errors
//! - Deterministic output (same input, same text)
//! - The external `wat2wasm` path, when the tool is installed

use sui_codegen::{
    compile, emit_wat, AssembleError, Assembler, CodegenError, Wat2Wasm,
};
use sui_parser::parse_program;
use sui_types::{Function, Instruction, Opcode, Operand, Program};
use wasmparser::{ExternalKind, Parser as WasmParser, Payload, TypeRef};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Assembles with the `wat` crate.
struct WatCrate;

impl Assembler for WatCrate {
    fn assemble(&self, wat: &str) -> Result<Vec<u8>, AssembleError> {
        wat::parse_str(wat).map_err(|e| AssembleError::Rejected {
            stderr: e.to_string(),
        })
    }
}

/// Always fails the way a missing executable does.
struct Missing;

impl Assembler for Missing {
    fn assemble(&self, _wat: &str) -> Result<Vec<u8>, AssembleError> {
        Err(AssembleError::ToolUnavailable {
            program: "wat2wasm".into(),
        })
    }
}

fn parse(source: &str) -> Program {
    parse_program(source, "test.sui").unwrap_or_else(|d| panic!("parse errors:\n{}", d.render()))
}

fn compile_source(source: &str) -> Vec<u8> {
    compile(&parse(source), &WatCrate).unwrap_or_else(|e| panic!("codegen failed: {e}"))
}

/// Extract exports from WASM bytes.
fn get_exports(wasm: &[u8]) -> Vec<(String, ExternalKind)> {
    let mut exports = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::ExportSection(reader)) = payload {
            for export in reader {
                let exp = export.expect("valid export");
                exports.push((exp.name.to_string(), exp.kind));
            }
        }
    }
    exports
}

/// Extract `(module, name)` of every function import.
fn get_imports(wasm: &[u8]) -> Vec<(String, String)> {
    let mut imports = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::ImportSection(reader)) = payload {
            for import in reader {
                let imp = import.expect("valid import");
                if matches!(imp.ty, TypeRef::Func(_)) {
                    imports.push((imp.module.to_string(), imp.name.to_string()));
                }
            }
        }
    }
    imports
}

fn has_export(wasm: &[u8], name: &str, kind: ExternalKind) -> bool {
    get_exports(wasm)
        .iter()
        .any(|(n, k)| n == name && *k == kind)
}

const INCREMENT: &str = "# 0 1 {\n+ v0 a0 1\n^ v0\n}\n= g0 10\n$ g1 0 g0\n. g1\n";

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
// Module structure
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_minimal_program_is_valid_wasm() {
    let wasm = compile_source("= g0 42\n. g0\n");
    assert_eq!(&wasm[..4], b"\0asm");
    assert!(wasmparser::validate(&wasm).is_ok());
}

#[test]
fn test_empty_program_exports_main_only() {
    let wasm = compile_source("");
    let exports = get_exports(&wasm);
    assert_eq!(exports, vec![("main".to_string(), ExternalKind::Func)]);
}

#[test]
fn test_print_import() {
    let wasm = compile_source(". 1\n");
    assert_eq!(
        get_imports(&wasm),
        vec![("env".to_string(), "print_i64".to_string())]
    );
}

#[test]
fn test_globals_and_functions_are_exported() {
    let wasm = compile_source(INCREMENT);
    assert!(has_export(&wasm, "main", ExternalKind::Func));
    assert!(has_export(&wasm, "f0", ExternalKind::Func));
    assert!(has_export(&wasm, "g0", ExternalKind::Global));
    assert!(has_export(&wasm, "g1", ExternalKind::Global));
    assert!(!has_export(&wasm, "g2", ExternalKind::Global));
}

#[test]
fn test_function_signature_in_text() {
    let wat = emit_wat(&parse("# 0 3 {\n+ v4 a0 a2\n^ v4\n}\n")).unwrap();
    assert!(wat.contains("(func $f0 (export \"f0\") (param $a0 i64) (param $a1 i64) (param $a2 i64) (result i64)"));
    for n in 0..5 {
        assert!(wat.contains(&format!("(local $v{n} i64)")), "missing local v{n}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Instruction lowering
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_every_opcode_assembles() {
    let source = "\
# 0 2 {
+ v0 a0 a1
- v1 a0 a1
* v2 a0 a1
/ v3 a0 a1
% v4 a0 a1
< v5 a0 a1
> v6 a0 a1
~ v7 a0 a1
! v8 a0
& v9 a0 a1
| v10 a0 a1
^ v10
}
$ g0 0 7 2
. g0
";
    let wasm = compile_source(source);
    assert!(wasmparser::validate(&wasm).is_ok());
}

#[test]
fn test_recursive_function_with_labels_assembles() {
    let wasm = compile_source(FIBONACCI);
    assert!(has_export(&wasm, "f0", ExternalKind::Func));
}

#[test]
fn test_module_level_loop_assembles() {
    let wasm = compile_source("= g0 3\n: 0\n. g0\n- g0 g0 1\n> g1 g0 0\n? g1 0\n");
    assert!(wasmparser::validate(&wasm).is_ok());
}

#[test]
fn test_label_shapes_assemble() {
    for source in [
        ": 0\n",
        "@ 0\n: 0\n",
        ": 0\n: 1\n: 2\n@ 2\n",
        "= g0 1\n? g0 5\n. 1\n: 5\n. 2\n",
        "# 0 0 {\n: 0\n^ 1\n}\n$ g0 0\n",
        "# 0 1 {\n? a0 3\n^ 0\n: 3\n}\n$ g0 0 1\n",
    ] {
        let wasm = compile(&parse(source), &WatCrate)
            .unwrap_or_else(|e| panic!("{source:?} failed: {e}"));
        assert!(wasmparser::validate(&wasm).is_ok(), "{source:?}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_call_arity_mismatch() {
    // Built by hand: the parser does not check call arity.
    let program = Program {
        instructions: vec![Instruction::new(
            Opcode::Call,
            vec![Operand::Global(0), Operand::Literal(0)],
            5,
        )],
        functions: vec![Function {
            index: 0,
            param_count: 1,
            local_count: 0,
            body: vec![],
            line: 1,
        }],
        global_count: 1,
    };
    match emit_wat(&program) {
        Err(CodegenError::ArityMismatch {
            index: 0,
            expected: 1,
            found: 0,
            line: 5,
        }) => {}
        other => panic!("expected ArityMismatch, got {other:?}"),
    }
}

#[test]
fn test_parsed_arity_mismatch_is_caught() {
    let program = parse("# 0 1 {\n^ a0\n}\n$ g0 0 1 2\n");
    assert!(matches!(
        compile(&program, &WatCrate),
        Err(CodegenError::ArityMismatch { found: 2, .. })
    ));
}

#[test]
fn test_missing_assembler_is_distinct() {
    let err = compile(&parse("= g0 1\n"), &Missing).unwrap_err();
    assert!(matches!(
        err,
        CodegenError::Assemble(AssembleError::ToolUnavailable { .. })
    ));
}

#[test]
fn test_rejected_text_keeps_diagnostics() {
    struct Rejecting;
    impl Assembler for Rejecting {
        fn assemble(&self, _wat: &str) -> Result<Vec<u8>, AssembleError> {
            Err(AssembleError::Rejected {
                stderr: "module.wat:3:5: error: unexpected token".into(),
            })
        }
    }
    let err = compile(&parse("= g0 1\n"), &Rejecting).unwrap_err();
    assert!(err.to_string().contains("module.wat:3:5: error: unexpected token"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_emission_is_deterministic() {
    let program = parse(FIBONACCI);
    let first = emit_wat(&program).unwrap();
    for i in 0..100 {
        assert_eq!(
            first,
            emit_wat(&program).unwrap(),
            "determinism failure at iteration {i}"
        );
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// External assembler
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_wat2wasm_when_installed() {
    let asm = Wat2Wasm::from_env();
    match compile(&parse(INCREMENT), &asm) {
        Ok(wasm) => assert_eq!(&wasm[..4], b"\0asm"),
        Err(CodegenError::Assemble(AssembleError::ToolUnavailable { .. })) => {
            eprintln!("skipping: wat2wasm not found");
        }
        Err(e) => panic!("wat2wasm failed: {e}"),
    }
}
