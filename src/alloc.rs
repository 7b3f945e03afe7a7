//! The storage allocator: walks one function's Tree to assign stack-frame
//! offsets to its parameters and locals (spec.md §4.4).
//!
//! Runs once per function, after checking and before generation. Globals
//! never pass through here — their offset stays `0` for the lifetime of
//! the compilation, which [`crate::types::symbol::Symbol::is_global`]
//! relies on.

use crate::abi;
use crate::types::symbol::{self, Scope};
use crate::types::tree::{Function, Stmt, StmtKind};
use crate::types::ty::Type;

/// Assign offsets to every parameter and local of `func`, returning the
/// function's total (16-byte-aligned) frame size.
#[must_use]
pub fn allocate_function<'a>(func: &Function<'a>) -> u32 {
  let StmtKind::Block(scope, stmts) = func.body.kind else {
    unreachable!("a function body is always a Block")
  };

  let param_count = match &func.symbol.borrow().ty {
    Type::Function { params: Some(p), .. } => p.len(),
    _ => unreachable!("a function definition always has a known parameter list"),
  };
  assign_stack_passed_params(scope, param_count);

  let min_offset = allocate_block(scope, stmts, 0);
  abi::align_to(u32::try_from(-min_offset).unwrap_or(0), abi::STACK_ALIGNMENT)
}

/// Parameters past the first [`abi::NUM_PARAM_REGS`] arrive on the stack at
/// positive displacements; give them that offset up front so the generic
/// walk below skips them and assigns only the register-passed ones.
fn assign_stack_passed_params(scope: Scope<'_>, param_count: usize) {
  let params = symbol::symbols(scope);
  let word = i32::try_from(abi::SIZEOF_REG).unwrap();
  let slot = i32::try_from(abi::SIZEOF_PARAM).unwrap();
  for (i, sym) in params.iter().take(param_count).enumerate() {
    if i < abi::NUM_PARAM_REGS { continue; }
    let n = i32::try_from(i - abi::NUM_PARAM_REGS).unwrap();
    sym.borrow_mut().set_offset(2 * word + n * slot);
  }
}

/// Assign negative offsets to every symbol in `scope` not already assigned
/// (register-passed parameters and ordinary locals, in declaration order),
/// then recurse into `stmts`. Returns the most-negative offset reached
/// along any path through this block, so sibling blocks can reuse slots.
fn allocate_block<'a>(scope: Scope<'a>, stmts: &[Stmt<'a>], offset: i32) -> i32 {
  let mut off = offset;
  for sym in symbol::symbols(scope).iter() {
    let mut s = sym.borrow_mut();
    if s.offset() != 0 { continue; }
    off -= i32::try_from(s.ty.size()).unwrap();
    s.set_offset(off);
  }
  stmts.iter().map(|s| allocate_stmt(s, off)).fold(off, i32::min)
}

fn allocate_stmt<'a>(stmt: Stmt<'a>, offset: i32) -> i32 {
  match stmt.kind {
    StmtKind::Block(scope, stmts) => allocate_block(scope, stmts, offset),
    StmtKind::If(_, then, els) => {
      let a = allocate_stmt(then, offset);
      let b = els.map_or(offset, |e| allocate_stmt(e, offset));
      a.min(b)
    }
    StmtKind::While(_, body) | StmtKind::For(_, _, _, body) => allocate_stmt(body, offset),
    StmtKind::Simple(_) | StmtKind::Assignment(_, _) | StmtKind::Return(_) => offset,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::Parser;
  use crate::types::tree::Arena;

  fn build<'a>(arena: &'a Arena, src: &str) -> crate::types::tree::TranslationUnit<'a> {
    let mut p = Parser::new(src, arena);
    let unit = p.parse_translation_unit();
    assert_eq!(p.checker.diag.error_count(), 0, "unexpected checker errors");
    unit
  }

  #[test]
  fn two_int_params_get_consecutive_negative_offsets() {
    let arena = Arena::new();
    let unit = build(&arena, "int f(int a, int b) { return a + b; }");
    let size = allocate_function(&unit.functions[0]);
    assert_eq!(size, 16);
  }

  #[test]
  fn sibling_if_branches_share_slots() {
    let arena = Arena::new();
    let unit = build(
      &arena,
      "int f(void) { int x; if (x) { int a; } else { int b; } return 0; }",
    );
    let size = allocate_function(&unit.functions[0]);
    // x (4) then one shared 4-byte slot for a/b, total 8 rounded to 16.
    assert_eq!(size, 16);
  }

  #[test]
  fn stack_passed_seventh_param_gets_positive_offset() {
    let arena = Arena::new();
    let unit = build(
      &arena,
      "int f(int a, int b, int c, int d, int e, int g, int h) { return a; }",
    );
    let StmtKind::Block(scope, _) = &unit.functions[0].body.kind else { unreachable!() };
    let syms = symbol::symbols(*scope);
    assert_eq!(syms[6].borrow().offset(), 16);
    allocate_function(&unit.functions[0]);
  }
}
