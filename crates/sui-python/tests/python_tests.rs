//! Integration tests for the Python backend.
//!
//! Tests validate:
//! - Forward output layout (helpers, functions, state machines)
//! - Forward output run by `python3` prints what the interpreter prints,
//!   when `python3` is installed
//! - Hand-written Python translates to Sui with Python's semantics
//! - Forward output always translates back to an equivalent program
//! - Unsupported constructs are named with their line

use std::io::ErrorKind;
use std::process::Command;

use sui_eval::{run, Environment};
use sui_parser::parse_program;
use sui_python::{emit_python, translate, TranslateError, HELPERS};
use sui_types::{Program, MAX_CALL_FRAMES};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn parse(source: &str) -> Program {
    parse_program(source, "test.sui").unwrap_or_else(|d| panic!("parse errors:\n{}", d.render()))
}

fn exec(program: &Program) -> (Vec<i64>, Environment) {
    let mut env = Environment::new();
    let mut out = Vec::new();
    run(program, &mut env, &mut out).expect("program runs");
    (out, env)
}

/// Translate Python and run the result on the interpreter.
fn exec_python(source: &str) -> Vec<i64> {
    let program = translate(source).unwrap_or_else(|e| panic!("translate failed: {e}"));
    exec(&program).0
}

/// Run a script with `python3`; `None` when it is not installed.
fn run_python3(script: &str) -> Option<Vec<i64>> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("program.py");
    std::fs::write(&path, script).expect("write script");
    let output = match Command::new("python3").arg(&path).output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => panic!("python3 failed to start: {e}"),
    };
    assert!(
        output.status.success(),
        "python3 failed:\n{}\n--- script ---\n{script}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    Some(
        stdout
            .lines()
            .map(|l| l.trim().parse().expect("integer line"))
            .collect(),
    )
}

/// Sui -> Python -> Sui must print the same values and leave every
/// original global with the same value.
fn assert_round_trip(source: &str) -> Vec<i64> {
    let original = parse(source);
    let (expected, env) = exec(&original);

    let python = emit_python(&original);
    let back = translate(&python).unwrap_or_else(|e| panic!("{e}\n--- python ---\n{python}"));
    let (output, back_env) = exec(&back);
    assert_eq!(output, expected, "output differs for:\n{python}");
    for (index, value) in env.globals() {
        assert_eq!(back_env.global(*index), Some(*value), "g{index} differs for:\n{python}");
    }
    expected
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

const COUNTDOWN: &str = "= g0 5\n: 0\n. g0\n- g0 g0 1\n> g1 g0 0\n? g1 0\n";

const ARITHMETIC: &str = "\
= g0 -17
= g1 5
+ g2 g0 g1
- g3 g0 g1
* g4 g0 g1
/ g5 g0 g1
% g6 g0 g1
< g7 g0 g1
> g8 g0 g1
~ g9 g0 g0
! g10 g0
& g11 g0 0
| g12 0 g1
= g13 9223372036854775807
+ g14 g13 1
= g15 -9223372036854775808
% g16 g15 -1
. g2
. g3
. g4
. g5
. g6
. g7
. g8
. g9
. g10
. g11
. g12
. g14
. g16
";

// ══════════════════════════════════════════════════════════════════════════════
// Forward
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_forward_layout() {
    let python = emit_python(&parse(INCREMENT));
    assert!(python.starts_with("# Generated by sui2py.\n"));
    assert!(python.contains(HELPERS.lines().next().unwrap()));
    assert!(python.contains("def f0(a0):\n    v0 = 0\n    v0 = _wrap(a0 + 1)\n    return v0\n    return 0\n"));
    assert!(python.ends_with("g0 = 10\ng1 = f0(g0)\nprint(g1)\n"));
}

#[test]
fn test_forward_labels_become_state_machine() {
    let python = emit_python(&parse(FIBONACCI));
    assert!(python.contains("    _pc = 0\n    while True:\n        if _pc == 0:\n"));
    assert!(python.contains("        if _pc == 1:\n"));
}

#[test]
fn test_forward_is_deterministic() {
    let program = parse(FIBONACCI);
    let first = emit_python(&program);
    for i in 0..50 {
        assert_eq!(first, emit_python(&program), "determinism failure at iteration {i}");
    }
}

#[test]
fn test_forward_runs_under_python3() {
    for source in [INCREMENT, FIBONACCI, COUNTDOWN, ARITHMETIC] {
        let program = parse(source);
        let (expected, _) = exec(&program);
        match run_python3(&emit_python(&program)) {
            Some(output) => assert_eq!(output, expected, "python3 output for:\n{source}"),
            None => {
                eprintln!("skipping: python3 not found");
                return;
            }
        }
    }
}

/// Module code calling a function that recurses `n` levels deep.
fn deep_recursion(n: i64) -> String {
    format!(
        "# 0 1 {{\n~ v0 a0 0\n? v0 0\n- v1 a0 1\n$ v2 0 v1\n+ v3 v2 1\n^ v3\n: 0\n^ 0\n}}\n$ g0 0 {n}\n. g0\n"
    )
}

#[test]
fn test_forward_recursion_reaches_the_shared_limit() {
    // 1000 levels overflow Python's stock recursion limit.
    let deepest = MAX_CALL_FRAMES as i64 - 2;
    for n in [1000, deepest] {
        let program = parse(&deep_recursion(n));
        let (expected, _) = exec(&program);
        assert_eq!(expected, vec![n]);
        match run_python3(&emit_python(&program)) {
            Some(output) => assert_eq!(output, expected, "python3 output at depth {n}"),
            None => {
                eprintln!("skipping: python3 not found");
                return;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Reverse
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reverse_hand_written_program() {
    let source = "\
def square(n):
    return n * n

def sum_squares(limit):
    total = 0
    i = 1
    while i <= limit:
        total += square(i)
        i += 1
    return total

print(sum_squares(4))
";
    assert_eq!(exec_python(source), vec![30]);
}

#[test]
fn test_reverse_floor_semantics() {
    let source = "\
print(-7 // 2)
print(7 // -2)
print(-7 % 2)
print(7 % -2)
print(6 // 3)
print(-6 % 3)
";
    assert_eq!(exec_python(source), vec![-4, -4, 1, -1, 2, 0]);
}

#[test]
fn test_reverse_if_elif_else() {
    let source = "\
def sign(x):
    if x < 0:
        return -1
    elif x == 0:
        return 0
    else:
        return 1

print(sign(-5))
print(sign(0))
print(sign(9))
";
    assert_eq!(exec_python(source), vec![-1, 0, 1]);
}

#[test]
fn test_reverse_break_and_continue() {
    let source = "\
n = 0
total = 0
while True:
    n += 1
    if n % 2 == 0:
        continue
    if n > 9:
        break
    total += n
print(total)
";
    assert_eq!(exec_python(source), vec![25]);
}

#[test]
fn test_reverse_boolean_operators_return_operands() {
    let source = "\
a = 0
b = 7
print(a or b)
print(b and 3)
print(a and b)
print(not a)
print(a < b and b < 10)
print(b >= 7)
print(b != 7)
";
    assert_eq!(exec_python(source), vec![7, 3, 0, 1, 1, 1, 0]);
}

#[test]
fn test_reverse_short_circuit_skips_calls() {
    let source = "\
def loud(x):
    print(x)
    return x

r = loud(0) and loud(1)
r = loud(2) or loud(3)
print(r)
";
    assert_eq!(exec_python(source), vec![0, 2, 2]);
}

#[test]
fn test_reverse_global_declarations() {
    let source = "\
counter = 0

def bump(step):
    global counter
    counter += step
    return counter

bump(2)
bump(3)
print(counter)
";
    assert_eq!(exec_python(source), vec![5]);
}

#[test]
fn test_reverse_functions_keep_local_names_separate() {
    let source = "\
x = 10

def shadow():
    x = 1
    return x

print(shadow())
print(x)
";
    assert_eq!(exec_python(source), vec![1, 10]);
}

#[test]
fn test_reverse_call_sees_globals_in_order() {
    let source = "\
g = 1

def change():
    global g
    g = 100
    return 0

print(g + change())
";
    assert_eq!(exec_python(source), vec![1]);
}

#[test]
fn test_reverse_wraps_like_sui() {
    assert_eq!(
        exec_python("x = 9223372036854775807\nprint(x + 1)\n"),
        vec![i64::MIN]
    );
}

#[test]
fn test_reverse_errors_name_construct_and_line() {
    for (source, construct, line) in [
        ("x = 1\ny = 'text'\n", "string literal", 2),
        ("x = 1\nx = x / 2\n", "true division", 2),
        ("for i in range(3):\n    print(i)\n", "'for' loop", 1),
        ("x = [1, 2]\n", "list display", 1),
        ("x = 1; y = f'{x}'\n", "f-string", 1),
        ("import os\n", "import statement", 1),
        ("x = 1\n\n\nprint(abs(x))\n", "unknown function 'abs'", 4),
        ("def f():\n    def g():\n        return 1\n    return 0\n", "nested function", 2),
    ] {
        match translate(source) {
            Err(TranslateError::Unsupported {
                construct: c,
                line: l,
            }) => {
                assert!(c.contains(construct), "{source:?}: {c}");
                assert_eq!(l, line, "{source:?}");
            }
            other => panic!("{source:?}: expected unsupported, got {other:?}"),
        }
    }
}

#[test]
fn test_reverse_syntax_errors() {
    let err = translate("x = (1 +\n").unwrap_err();
    assert!(matches!(err, TranslateError::Syntax { .. }));
    let err = translate("if x:\nprint(x)\n").unwrap_err();
    assert!(matches!(err, TranslateError::Syntax { line: 2, .. }));
}

// ══════════════════════════════════════════════════════════════════════════════
// Round trip
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_round_trip_increment() {
    assert_eq!(assert_round_trip(INCREMENT), vec![11]);
}

#[test]
fn test_round_trip_fibonacci() {
    assert_eq!(assert_round_trip(FIBONACCI), vec![55]);
}

#[test]
fn test_round_trip_module_loop() {
    assert_eq!(assert_round_trip(COUNTDOWN), vec![5, 4, 3, 2, 1]);
}

#[test]
fn test_round_trip_arithmetic() {
    assert_round_trip(ARITHMETIC);
}

#[test]
fn test_round_trip_function_loop_and_globals() {
    let source = "\
# 0 1 {
= v0 0
: 0
~ v1 a0 0
? v1 1
+ v0 v0 a0
- a0 a0 1
@ 0
: 1
= g5 v0
}
$ g0 0 100
. g0
. g5
";
    assert_eq!(assert_round_trip(source), vec![0, 5050]);
}

#[test]
fn test_round_trip_keeps_slot_numbers() {
    let program = parse("= g3 4\n. g3\n");
    let back = translate(&emit_python(&program)).unwrap();
    assert_eq!(back.to_string(), "= g3 4\n. g3\n");
}
