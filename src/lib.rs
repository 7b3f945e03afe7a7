//! A whole-program compiler for Simple C, a restricted C dialect: reads one
//! translation unit from a string, typechecks and allocates storage for it,
//! and emits SysV AMD64 AT&T-syntax assembly.
//!
//! [`compile`] is the library entry point; `main.rs` is a thin CLI shell
//! around it.

pub mod abi;
pub mod alloc;
pub mod checker;
pub mod codegen;
pub mod diag;
pub mod lexer;
pub mod parser;
pub mod types;

use std::io::Write;

use types::tree::{Arena, TranslationUnit};

/// Parse, check, and (if no error was reported) generate assembly for
/// `source`, writing it to `out`. Returns `false` without emitting any code
/// when a semantic error was reported during parsing/checking (spec.md §7:
/// a nonzero error counter suppresses code generation, but parsing itself
/// never aborts early on semantic errors — only on a fatal syntax error,
/// which terminates the process from within [`diag::Diagnostics`]).
pub fn compile(source: &str, out: &mut impl Write) -> std::io::Result<bool> {
  let arena = Arena::new();
  let mut parser = parser::Parser::new(source, &arena);
  let unit = parser.parse_translation_unit();
  if parser.checker.diag.has_errors() {
    return Ok(false);
  }
  codegen::generate(out, &unit, parser.checker.outermost())?;
  Ok(true)
}

/// Parse and check `source`, discarding the generated assembly; used by
/// `--emit-ast` to pretty-print the tree without duplicating the pipeline.
#[must_use]
pub fn parse<'a>(source: &str, arena: &'a Arena) -> (TranslationUnit<'a>, u32) {
  let mut parser = parser::Parser::new(source, arena);
  let unit = parser.parse_translation_unit();
  let errors = parser.checker.diag.error_count();
  (unit, errors)
}
