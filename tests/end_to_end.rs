//! End-to-end scenarios, run against the built `meon` binary
//! so output statements are checked against real stdout rather than
//! internal VM state.

use std::io::Write;
use std::process::{Command, Output};

fn run_script(source: &str) -> Output {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "meon_e2e_{}_{}.meon",
        std::process::id(),
        source.len()
    ));
    {
        let mut f = std::fs::File::create(&path).expect("create temp script");
        f.write_all(source.as_bytes()).expect("write temp script");
    }

    let output = Command::new(env!("CARGO_BIN_EXE_meon"))
        .arg("-r")
        .arg(&path)
        .output()
        .expect("run meon binary");

    std::fs::remove_file(&path).ok();
    output
}

fn stdout_lines(source: &str) -> Vec<String> {
    let output = run_script(source);
    assert!(
        output.status.success(),
        "expected success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|s| s.to_string())
        .collect()
}

#[test]
fn precedence_multiply_before_add() {
    assert_eq!(stdout_lines("output 1 + 2 * 3 ;"), vec!["7"]);
}

#[test]
fn exponent_is_right_associative() {
    assert_eq!(stdout_lines("output 2 ^ 3 ^ 2 ;"), vec!["512"]);
    assert_eq!(stdout_lines("output 2 ^ 3 - 1 ;"), vec!["7"]);
}

#[test]
fn string_concat_with_dot() {
    let lines = stdout_lines(r#"let a = "foo"; let b = "bar"; output a . b ;"#);
    assert_eq!(lines, vec!["foobar"]);
}

#[test]
fn adding_strings_with_plus_is_a_runtime_error() {
    let output = run_script(r#"let a = "foo"; let b = "bar"; output a + b ;"#);
    assert_eq!(output.status.code(), Some(70));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Operands must be numbers"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn closures_capture_and_increment_their_own_state() {
    let source = r#"
func makeCounter()
  let n = 0;
  func step()
    n = n + 1;
    return n;
  endfunc
  return step;
endfunc
let c = makeCounter();
output c(); output c(); output c();
"#;
    assert_eq!(stdout_lines(source), vec!["1", "2", "3"]);
}

#[test]
fn for_loop_iterates_three_times() {
    let source = "for (let i = 0; i < 3; i = i + 1) output i; endfor";
    assert_eq!(stdout_lines(source), vec!["0", "1", "2"]);
}

#[test]
fn block_scoped_local_shadows_and_restores() {
    let source = "let x = 10; block let x = 20; output x; endblock output x;";
    assert_eq!(stdout_lines(source), vec!["20", "10"]);
}

#[test]
fn undefined_global_read_is_a_runtime_error() {
    let output = run_script("output undefined_name;");
    assert_eq!(output.status.code(), Some(70));
}

#[test]
fn syntax_error_exits_with_compile_error_code() {
    let output = run_script("let = ;");
    assert_eq!(output.status.code(), Some(65));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let output = run_script("output 1 / 0;");
    assert_eq!(output.status.code(), Some(70));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("divi") || stderr.contains("zero"), "stderr: {}", stderr);
}

#[test]
fn truthiness_only_false_is_falsy() {
    // null and 0 are both truthy; only `false` is falsy.
    let source = r#"
if (null) then output "null-truthy"; endif
if (0) then output "zero-truthy"; endif
if (false) then output "unreachable"; endif
"#;
    assert_eq!(stdout_lines(source), vec!["null-truthy", "zero-truthy"]);
}
