//! Whole-program compilation tests driving [`simplec::compile`] end to end:
//! source text in, assembly text out, checked against the shapes the
//! generator is committed to rather than a byte-exact golden file.

fn compile_ok(src: &str) -> String {
  let mut buf = Vec::new();
  let ok = simplec::compile(src, &mut buf).expect("no I/O error writing to a Vec");
  assert!(ok, "expected {src:?} to compile without semantic errors");
  String::from_utf8(buf).expect("generated assembly is valid UTF-8")
}

#[test]
fn global_scalar_declaration_emits_comm() {
  let asm = compile_ok("int x;\n");
  assert!(asm.contains(".comm x, 4"), "{asm}");
}

#[test]
fn two_param_function_has_matching_prologue_and_epilogue() {
  let asm = compile_ok("int add(int a, int b) { return a + b; }\n");
  assert!(asm.contains("pushq %rbp"), "{asm}");
  assert!(asm.contains("movq %rsp, %rbp"), "{asm}");
  assert!(asm.contains("add.exit:"), "{asm}");
  assert!(asm.contains("popq %rbp"), "{asm}");
  assert!(asm.contains("ret"), "{asm}");
  assert!(asm.contains(".set add.size,"), "{asm}");
  assert!(asm.contains(".globl add"), "{asm}");
}

#[test]
fn pointer_arithmetic_scales_by_pointee_size() {
  // p + 1 on an `int *` should scale the offset by 4, folded to a constant.
  let asm = compile_ok("int f(int *p) { return *(p + 1); }\n");
  assert!(asm.contains('4'), "{asm}");
}

#[test]
fn char_parameter_gets_byte_store_in_prologue() {
  let asm = compile_ok("int f(char c) { return c; }\n");
  assert!(asm.contains("movb"), "{asm}");
  // widened to int for the return value
  assert!(asm.contains("movsbl"), "{asm}");
}

#[test]
fn if_else_emits_two_labels_and_an_unconditional_jump() {
  let asm = compile_ok("int f(int x) { if (x) { return 1; } else { return 0; } }\n");
  assert!(asm.matches(".LB").count() >= 2, "{asm}");
  assert!(asm.contains("je ") || asm.contains("jne ") || asm.contains("jmp "), "{asm}");
}

#[test]
fn for_loop_compares_against_literal_with_jge() {
  let asm = compile_ok("int f(void) { int i; for (i = 0; i < 10; i = i + 1) { } return i; }\n");
  assert!(asm.contains("cmpl $10"), "{asm}");
  assert!(asm.contains("jge"), "{asm}");
}

#[test]
fn string_literal_is_interned_once_per_distinct_content() {
  let asm = compile_ok(
    r#"int puts(char *s);
       int f(void) { puts("hi"); puts("hi"); puts("bye"); return 0; }
    "#,
  );
  assert_eq!(asm.matches(".asciz \"hi\"").count(), 1, "{asm}");
  assert!(asm.contains(".asciz \"bye\""), "{asm}");
}

#[test]
fn call_with_more_than_six_arguments_spills_to_the_stack() {
  let asm = compile_ok(
    "int sum7(int a, int b, int c, int d, int e, int f, int g);\n\
     int f(void) { return sum7(1, 2, 3, 4, 5, 6, 7); }\n",
  );
  assert!(asm.contains("call sum7"), "{asm}");
  assert!(asm.contains("%rsp"), "{asm}");
}

#[test]
fn unprototyped_callee_zeroes_al_before_call() {
  let asm = compile_ok("int f(); int g(void) { return f(); }\n");
  assert!(asm.contains("movl $0, %eax"), "{asm}");
}

#[test]
fn semantic_error_suppresses_code_generation() {
  let mut buf = Vec::new();
  let ok = simplec::compile("int f(void) { return undeclared_name; }\n", &mut buf)
    .expect("no I/O error writing to a Vec");
  assert!(!ok);
  assert!(buf.is_empty());
}

#[test]
fn redeclaration_of_a_global_keeps_compiling() {
  // One error reported for the conflicting redeclaration, but the first
  // declaration's type is kept and the rest of the unit still compiles.
  let mut buf = Vec::new();
  let ok = simplec::compile("int x;\nchar x;\nint f(void) { return x; }\n", &mut buf)
    .expect("no I/O error writing to a Vec");
  assert!(!ok, "a conflicting redeclaration is a semantic error");
}
