//! Exercises the `simplec` binary itself: stdin/stdout wiring, `--output`,
//! and the exit-code contract for fatal syntax errors.

use std::io::Write;
use std::process::{Command, Stdio};

fn bin() -> Command { Command::new(env!("CARGO_BIN_EXE_simplec")) }

fn run(src: &str, args: &[&str]) -> std::process::Output {
  let mut child = bin()
    .args(args)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .expect("spawn simplec");
  child.stdin.take().unwrap().write_all(src.as_bytes()).expect("write stdin");
  child.wait_with_output().expect("wait for simplec")
}

#[test]
fn well_formed_program_exits_zero_and_writes_assembly_to_stdout() {
  let out = run("int x;\n", &[]);
  assert!(out.status.success(), "{out:?}");
  let asm = String::from_utf8(out.stdout).unwrap();
  assert!(asm.contains(".comm x, 4"), "{asm}");
}

#[test]
fn fatal_syntax_error_exits_one_and_reports_to_stderr() {
  let out = run("int x\n", &[]);
  assert_eq!(out.status.code(), Some(1), "{out:?}");
  let err = String::from_utf8(out.stderr).unwrap();
  assert!(err.contains("syntax error"), "{err}");
  assert!(out.stdout.is_empty());
}

#[test]
fn semantic_error_exits_zero_with_no_assembly_emitted() {
  let out = run("int f(void) { return undeclared_name; }\n", &[]);
  assert!(out.status.success(), "{out:?}");
  assert!(out.stdout.is_empty());
  let err = String::from_utf8(out.stderr).unwrap();
  assert!(err.contains("undeclared"), "{err}");
}

#[test]
fn output_flag_writes_assembly_to_a_file() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("out.s");
  let out = run("int x;\n", &["--output", path.to_str().unwrap()]);
  assert!(out.status.success(), "{out:?}");
  assert!(out.stdout.is_empty(), "assembly should go to the file, not stdout");
  let written = std::fs::read_to_string(&path).expect("read output file");
  assert!(written.contains(".comm x, 4"), "{written}");
}

#[test]
fn emit_ast_prints_tree_to_stderr_before_generating() {
  let out = run("int x;\n", &["--emit-ast"]);
  assert!(out.status.success(), "{out:?}");
  let err = String::from_utf8(out.stderr).unwrap();
  assert!(err.contains("TranslationUnit"), "{err}");
  let asm = String::from_utf8(out.stdout).unwrap();
  assert!(asm.contains(".comm x, 4"), "{asm}");
}
