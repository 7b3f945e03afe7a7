//! The typed intermediate tree built by [`crate::checker`] and consumed by
//! [`crate::alloc`] and [`crate::codegen`].
//!
//! Every node is bump-allocated out of a single program-lifetime [`Arena`]
//! (see module docs on [`crate::types::symbol`] for why this crate prefers
//! arena-and-reference over `Rc`/`RefCell` cycles): `Expr<'a>` and
//! `Stmt<'a>` are just `&'a` references, so the tree for a whole
//! translation unit is "live" for as long as the arena is, exactly
//! matching the spec's "Types and Symbols live for the entire
//! compilation" / "Tree nodes ... retained until that function's assembly
//! is emitted" lifecycle notes without needing per-function ownership
//! gymnastics.

use std::cell::Cell;

use bumpalo::Bump;
use bumpalo::collections::Vec as BVec;

use crate::codegen::RegId;
use super::symbol::{Scope, SymbolRef};
use super::ty::Type;

/// The shared bump allocator backing every `Expr`/`Stmt`/`Symbol`/`Scope`
/// for one compilation.
pub struct Arena(Bump);

impl Default for Arena {
  fn default() -> Self { Self::new() }
}

impl Arena {
  #[must_use]
  pub fn new() -> Self { Arena(Bump::new()) }

  #[must_use]
  pub fn alloc<T>(&self, val: T) -> &T { self.0.alloc(val) }

  #[must_use]
  pub fn alloc_slice<T: Clone>(&self, items: &[T]) -> &[T] {
    self.0.alloc_slice_clone(items)
  }

  #[must_use]
  pub fn alloc_bytes(&self, bytes: &[u8]) -> &[u8] {
    self.0.alloc_slice_copy(bytes)
  }

  #[must_use]
  pub fn bvec<T>(&self) -> BVec<'_, T> { BVec::new_in(&self.0) }
}

/// A reference to a bump-allocated expression node.
pub type Expr<'a> = &'a ExprNode<'a>;

/// Every expression variant from spec.md §3, plus `Paren` (needed solely to
/// clear lvalue-ness of a parenthesized expression per §4.3).
#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
  Number(i64),
  String(&'a [u8]),
  Identifier(SymbolRef<'a>),
  Call { callee: SymbolRef<'a>, args: &'a [Expr<'a>] },
  Not(Expr<'a>),
  Negate(Expr<'a>),
  Address(Expr<'a>),
  Dereference(Expr<'a>),
  Cast(Expr<'a>),
  Paren(Expr<'a>),
  Add(Expr<'a>, Expr<'a>),
  Subtract(Expr<'a>, Expr<'a>),
  Multiply(Expr<'a>, Expr<'a>),
  Divide(Expr<'a>, Expr<'a>),
  Remainder(Expr<'a>, Expr<'a>),
  LessThan(Expr<'a>, Expr<'a>),
  GreaterThan(Expr<'a>, Expr<'a>),
  LessOrEqual(Expr<'a>, Expr<'a>),
  GreaterOrEqual(Expr<'a>, Expr<'a>),
  Equal(Expr<'a>, Expr<'a>),
  NotEqual(Expr<'a>, Expr<'a>),
  LogicalAnd(Expr<'a>, Expr<'a>),
  LogicalOr(Expr<'a>, Expr<'a>),
}

/// Shared fields for every expression variant: its computed type and the
/// two code-generation fields (current register, spill offset).
#[derive(Debug)]
pub struct ExprNode<'a> {
  pub kind: ExprKind<'a>,
  pub ty: Type,
  pub reg: Cell<Option<RegId>>,
  /// Stack displacement once spilled; `0` means "not spilled".
  pub spill: Cell<i32>,
}

impl<'a> ExprNode<'a> {
  /// True iff this expression denotes a memory location assignable to.
  /// An `Identifier` of scalar type, or a `Dereference`; false for
  /// everything else, in particular `Paren` (parenthesization clears
  /// lvalue-ness) and any computed temporary.
  #[must_use]
  pub fn is_lvalue(&self) -> bool {
    match &self.kind {
      ExprKind::Identifier(_) => matches!(self.ty, Type::Scalar { .. }),
      ExprKind::Dereference(_) => true,
      _ => false,
    }
  }
}

/// A reference to a bump-allocated statement node.
pub type Stmt<'a> = &'a StmtNode<'a>;

#[derive(Debug, Clone, Copy)]
pub enum StmtKind<'a> {
  Simple(Expr<'a>),
  Assignment(Expr<'a>, Expr<'a>),
  Return(Expr<'a>),
  While(Expr<'a>, Stmt<'a>),
  For(Stmt<'a>, Expr<'a>, Stmt<'a>, Stmt<'a>),
  If(Expr<'a>, Stmt<'a>, Option<Stmt<'a>>),
  Block(Scope<'a>, &'a [Stmt<'a>]),
}

#[derive(Debug)]
pub struct StmtNode<'a> {
  pub kind: StmtKind<'a>,
}

/// A whole function definition: `Function(symbol, body)` per spec.md §3.
/// Function *declarations* and global variables leave no Tree node; they
/// only populate the outermost scope.
#[derive(Debug)]
pub struct Function<'a> {
  pub symbol: SymbolRef<'a>,
  pub body: Stmt<'a>,
}

/// The result of parsing+checking a whole translation unit: one `Function`
/// per definition, in source order (the order the generator must emit
/// them in, per spec.md §5).
#[derive(Debug, Default)]
pub struct TranslationUnit<'a> {
  pub functions: Vec<Function<'a>>,
}
