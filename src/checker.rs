//! Scope operations and per-operator semantic rules. The checker is driven
//! by the parser one construct at a time, and for every construct it hands
//! back a fully typed tree node — including on error, so the parser and
//! any downstream pass never have to special-case "this subtree failed to
//! check" (spec.md §4.3: "Every rule constructs the corresponding Tree
//! node even on error").

use std::cell::Cell;
use std::collections::HashSet;

use crate::diag::Diagnostics;
use crate::types::symbol::{self, Scope, SymbolRef};
use crate::types::tree::{Arena, Expr, ExprKind, ExprNode, Stmt, StmtKind, StmtNode};
use crate::types::ty::{Specifier, Type};

/// Scope operations plus the operator typing rules. Owns the two
/// process-wide scope pointers (`outermost`/`toplevel`) and the
/// diagnostic sink; everything else (label counter, register file,
/// string pool) belongs to [`crate::codegen`], which runs in a later pass.
pub struct Checker<'a> {
  arena: &'a Arena,
  outermost: Scope<'a>,
  toplevel: Scope<'a>,
  defined: HashSet<String>,
  current_return: Option<Type>,
  pub diag: Diagnostics,
}

impl<'a> Checker<'a> {
  #[must_use]
  pub fn new(arena: &'a Arena) -> Self {
    let outermost = symbol::new_scope(arena, None);
    Checker {
      arena,
      outermost,
      toplevel: outermost,
      defined: HashSet::new(),
      current_return: None,
      diag: Diagnostics::new(),
    }
  }

  #[must_use]
  pub fn outermost(&self) -> Scope<'a> { self.outermost }

  #[must_use]
  pub fn toplevel(&self) -> Scope<'a> { self.toplevel }

  // ---- scope management (spec.md §4.2) ----------------------------------

  pub fn open_scope(&mut self) -> Scope<'a> {
    let s = symbol::new_scope(self.arena, Some(self.toplevel));
    self.toplevel = s;
    s
  }

  /// Detach the current scope, return it, and restore `toplevel` to its
  /// enclosing scope. Panics if called on the outermost scope.
  pub fn close_scope(&mut self) -> Scope<'a> {
    let cur = self.toplevel;
    self.toplevel = symbol::enclosing(cur).expect("cannot close the outermost scope");
    cur
  }

  pub fn enter_function(&mut self, ret: Type) { self.current_return = Some(ret); }
  pub fn leave_function(&mut self) { self.current_return = None; }

  fn expr(&self, kind: ExprKind<'a>, ty: Type) -> Expr<'a> {
    self.arena.alloc(ExprNode { kind, ty, reg: Cell::new(None), spill: Cell::new(0) })
  }

  fn error_expr(&self) -> Expr<'a> { self.expr(ExprKind::Number(0), Type::Error) }

  fn stmt(&self, kind: StmtKind<'a>) -> Stmt<'a> { self.arena.alloc(StmtNode { kind }) }

  // ---- declarations -------------------------------------------------------

  /// Declare or redeclare a function at file scope. `has_body` is true for
  /// a definition. Reports `conflicting types`, `redeclaration`, or
  /// `redefinition` as appropriate; always returns a usable symbol.
  pub fn declare_function(&mut self, name: &str, ty: Type, has_body: bool) -> SymbolRef<'a> {
    if let Some(existing) = symbol::find(self.outermost, name) {
      let conflict = {
        let e = existing.borrow();
        !e.ty.is_error() && e.ty != ty
      };
      if conflict {
        self.diag.report("conflicting types for '%s'", Some(name));
      } else if has_body && self.defined.contains(name) {
        self.diag.report("redefinition of '%s'", Some(name));
      } else if !has_body && !conflict {
        self.diag.report("redeclaration of '%s'", Some(name));
      }
      if has_body { self.defined.insert(name.to_string()); }
      existing
    } else {
      let sym = self.arena.alloc(std::cell::RefCell::new(crate::types::symbol::Symbol::new(name, ty)));
      symbol::insert(self.outermost, sym);
      if has_body { self.defined.insert(name.to_string()); }
      sym
    }
  }

  fn check_void(&mut self, name: &str, ty: Type) -> Type {
    if matches!(ty, Type::Scalar { spec: Specifier::Void, indirection: 0 }) {
      self.diag.report("'%s' has type void", Some(name));
      Type::Error
    } else {
      ty
    }
  }

  /// Declare a global scalar/array variable.
  pub fn declare_global(&mut self, name: &str, ty: Type) -> SymbolRef<'a> {
    let ty = self.check_void(name, ty);
    if let Some(existing) = symbol::find(self.outermost, name) {
      let e = existing.borrow();
      let conflict = !e.ty.is_error() && e.ty != ty;
      drop(e);
      if conflict {
        self.diag.report("conflicting types for '%s'", Some(name));
      } else {
        self.diag.report("redeclaration of '%s'", Some(name));
      }
      existing
    } else {
      let sym = self.arena.alloc(std::cell::RefCell::new(crate::types::symbol::Symbol::new(name, ty)));
      symbol::insert(self.outermost, sym);
      sym
    }
  }

  /// Declare a local variable or parameter in the current (innermost)
  /// scope. A same-scope collision is a `redefinition`.
  pub fn declare_local(&mut self, name: &str, ty: Type) -> SymbolRef<'a> {
    let ty = self.check_void(name, ty);
    if let Some(existing) = symbol::find(self.toplevel, name) {
      self.diag.report("redefinition of '%s'", Some(name));
      return existing;
    }
    let sym = self.arena.alloc(std::cell::RefCell::new(crate::types::symbol::Symbol::new(name, ty)));
    symbol::insert(self.toplevel, sym);
    sym
  }

  // ---- primary expressions -------------------------------------------------

  #[must_use]
  pub fn check_number(&self, value: i64) -> Expr<'a> {
    let ty = if i32::try_from(value).is_ok() { Type::int() } else { Type::long() };
    self.expr(ExprKind::Number(value), ty)
  }

  #[must_use]
  pub fn check_string(&self, bytes: &[u8]) -> Expr<'a> {
    let data = self.arena.alloc_bytes(bytes);
    let len = u32::try_from(bytes.len() + 1).expect("string literal too large");
    self.expr(ExprKind::String(data), Type::Array { spec: Specifier::Char, indirection: 0, len })
  }

  pub fn check_identifier(&mut self, name: &str) -> Expr<'a> {
    match symbol::lookup(self.toplevel, name) {
      Some(sym) => {
        let ty = sym.borrow().ty.clone();
        self.expr(ExprKind::Identifier(sym), ty)
      }
      None => {
        self.diag.report("'%s' undeclared", Some(name));
        let sym = self.arena.alloc(std::cell::RefCell::new(crate::types::symbol::Symbol::new(name, Type::Error)));
        symbol::insert(self.toplevel, sym);
        self.expr(ExprKind::Identifier(sym), Type::Error)
      }
    }
  }

  // ---- promotion / extension / conversion (spec.md §4.3) -------------------

  fn make_cast(&self, e: Expr<'a>, target: Type) -> Expr<'a> {
    if let ExprKind::Number(v) = e.kind {
      return self.expr(ExprKind::Number(v), target);
    }
    self.expr(ExprKind::Cast(e), target)
  }

  fn make_address(&self, e: Expr<'a>) -> Expr<'a> {
    let ty = e.ty.promote();
    self.expr(ExprKind::Address(e), ty)
  }

  /// `char -> int` (via Cast) and `array -> pointer` (via Address).
  fn promote_expr(&self, e: Expr<'a>) -> Expr<'a> {
    match e.ty {
      Type::Scalar { spec: Specifier::Char, indirection: 0 } => self.make_cast(e, Type::int()),
      Type::Array { .. } => self.make_address(e),
      _ => e,
    }
  }

  /// Bring two numeric operands to a common canonical size: if either is
  /// `long`, cast the other up.
  fn cross_extend(&self, a: Expr<'a>, b: Expr<'a>) -> (Expr<'a>, Expr<'a>) {
    let a = self.promote_expr(a);
    let b = self.promote_expr(b);
    let is_long = |t: &Type| matches!(t, Type::Scalar { spec: Specifier::Long, indirection: 0 });
    if is_long(&a.ty) && !is_long(&b.ty) && b.ty.is_numeric() {
      (a, self.make_cast(b, Type::long()))
    } else if is_long(&b.ty) && !is_long(&a.ty) && a.ty.is_numeric() {
      (self.make_cast(a, Type::long()), b)
    } else {
      (a, b)
    }
  }

  fn binary_result_ty(a: &Type, b: &Type) -> Type {
    if matches!(a, Type::Scalar { spec: Specifier::Long, .. }) || matches!(b, Type::Scalar { spec: Specifier::Long, .. }) {
      Type::long()
    } else {
      Type::int()
    }
  }

  /// Multiply a (to-be-extended-to-long) numeric operand by `elem_size`,
  /// folding into the literal when `num` is a compile-time constant.
  fn scale(&self, num: Expr<'a>, elem_size: u32) -> Expr<'a> {
    let num = if matches!(num.ty, Type::Scalar { spec: Specifier::Long, indirection: 0 }) {
      num
    } else {
      self.make_cast(num, Type::long())
    };
    if let ExprKind::Number(v) = num.kind {
      return self.expr(ExprKind::Number(v * i64::from(elem_size)), Type::long());
    }
    let lit = self.expr(ExprKind::Number(i64::from(elem_size)), Type::long());
    self.expr(ExprKind::Multiply(num, lit), Type::long())
  }

  /// Promotion plus a possibly-narrowing cast to `target`, "as if by
  /// assignment".
  fn convert(&self, r: Expr<'a>, target: &Type) -> Expr<'a> {
    let r = if r.ty.is_array() && target.is_pointer() { self.make_address(r) } else { r };
    if r.ty.is_numeric() && target.is_numeric() && &r.ty != target {
      self.make_cast(r, target.clone())
    } else {
      r
    }
  }

  // ---- unary operators ------------------------------------------------------

  pub fn check_not(&mut self, e: Expr<'a>) -> Expr<'a> {
    if e.ty.is_error() { return self.error_expr(); }
    let p = self.promote_expr(e);
    if !p.ty.is_predicate() {
      self.diag.report("invalid operand to unary %s", Some("!"));
      return self.error_expr();
    }
    self.expr(ExprKind::Not(p), Type::int())
  }

  pub fn check_negate(&mut self, e: Expr<'a>) -> Expr<'a> {
    if e.ty.is_error() { return self.error_expr(); }
    let p = self.promote_expr(e);
    if !p.ty.is_numeric() {
      self.diag.report("invalid operand to unary %s", Some("-"));
      return self.error_expr();
    }
    let ty = p.ty.clone();
    self.expr(ExprKind::Negate(p), ty)
  }

  pub fn check_address(&mut self, e: Expr<'a>) -> Expr<'a> {
    if e.ty.is_error() { return self.error_expr(); }
    if !e.is_lvalue() {
      self.diag.report("lvalue required in expression", None);
      return self.error_expr();
    }
    let ty = e.ty.pointer_to_self();
    self.expr(ExprKind::Address(e), ty)
  }

  pub fn check_dereference(&mut self, e: Expr<'a>) -> Expr<'a> {
    if e.ty.is_error() { return self.error_expr(); }
    let p = self.promote_expr(e);
    if !p.ty.is_pointer() || p.ty.is_void_pointer() {
      self.diag.report("invalid operand to unary %s", Some("*"));
      return self.error_expr();
    }
    let ty = p.ty.deref();
    self.expr(ExprKind::Dereference(p), ty)
  }

  /// `sizeof e` operates on the *unpromoted* type and folds to a literal.
  pub fn check_sizeof(&mut self, e: Expr<'a>) -> Expr<'a> {
    if e.ty.is_error() { return self.error_expr(); }
    if !e.ty.is_predicate() {
      self.diag.report("invalid operand to unary %s", Some("sizeof"));
      return self.error_expr();
    }
    self.expr(ExprKind::Number(i64::from(e.ty.size())), Type::long())
  }

  /// `e1[e2]`, built as `Dereference(Add(e1, scale(e2, size_of(T))))`.
  pub fn check_index(&mut self, e1: Expr<'a>, e2: Expr<'a>) -> Expr<'a> {
    if e1.ty.is_error() || e2.ty.is_error() { return self.error_expr(); }
    let p1 = self.promote_expr(e1);
    let p2 = self.promote_expr(e2);
    if !p1.ty.is_pointer() || p1.ty.is_void_pointer() || !p2.ty.is_numeric() {
      self.diag.report("invalid operands to binary %s", Some("[]"));
      return self.error_expr();
    }
    let elem_size = p1.ty.deref().size();
    let scaled = self.scale(p2, elem_size);
    let add_ty = p1.ty.clone();
    let add = self.expr(ExprKind::Add(p1, scaled), add_ty);
    let deref_ty = add.ty.deref();
    self.expr(ExprKind::Dereference(add), deref_ty)
  }

  // ---- binary arithmetic / comparison ----------------------------------------

  pub fn check_add(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    if a.ty.is_error() || b.ty.is_error() { return self.error_expr(); }
    let pa = self.promote_expr(a);
    let pb = self.promote_expr(b);
    if pa.ty.is_pointer() && !pa.ty.is_void_pointer() && pb.ty.is_numeric() {
      let elem = pa.ty.deref().size();
      let scaled = self.scale(pb, elem);
      let ty = pa.ty.clone();
      return self.expr(ExprKind::Add(pa, scaled), ty);
    }
    if pb.ty.is_pointer() && !pb.ty.is_void_pointer() && pa.ty.is_numeric() {
      let elem = pb.ty.deref().size();
      let scaled = self.scale(pa, elem);
      let ty = pb.ty.clone();
      return self.expr(ExprKind::Add(scaled, pb), ty);
    }
    if pa.ty.is_numeric() && pb.ty.is_numeric() {
      let (ca, cb) = self.cross_extend(pa, pb);
      let ty = Self::binary_result_ty(&ca.ty, &cb.ty);
      return self.expr(ExprKind::Add(ca, cb), ty);
    }
    self.diag.report("invalid operands to binary %s", Some("+"));
    self.error_expr()
  }

  pub fn check_subtract(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    if a.ty.is_error() || b.ty.is_error() { return self.error_expr(); }
    let pa = self.promote_expr(a);
    let pb = self.promote_expr(b);
    if pa.ty.is_pointer() && !pa.ty.is_void_pointer() && pb.ty.is_pointer() && !pb.ty.is_void_pointer()
      && pa.ty.promote() == pb.ty.promote()
    {
      let elem = pa.ty.deref().size();
      let diff = self.expr(ExprKind::Subtract(pa, pb), Type::long());
      let lit = self.expr(ExprKind::Number(i64::from(elem)), Type::long());
      return self.expr(ExprKind::Divide(diff, lit), Type::long());
    }
    if pa.ty.is_pointer() && !pa.ty.is_void_pointer() && pb.ty.is_numeric() {
      let elem = pa.ty.deref().size();
      let scaled = self.scale(pb, elem);
      let ty = pa.ty.clone();
      return self.expr(ExprKind::Subtract(pa, scaled), ty);
    }
    if pa.ty.is_numeric() && pb.ty.is_numeric() {
      let (ca, cb) = self.cross_extend(pa, pb);
      let ty = Self::binary_result_ty(&ca.ty, &cb.ty);
      return self.expr(ExprKind::Subtract(ca, cb), ty);
    }
    self.diag.report("invalid operands to binary %s", Some("-"));
    self.error_expr()
  }

  fn check_muldivrem(
    &mut self,
    a: Expr<'a>,
    b: Expr<'a>,
    op: &str,
    build: impl FnOnce(Expr<'a>, Expr<'a>) -> ExprKind<'a>,
  ) -> Expr<'a> {
    if a.ty.is_error() || b.ty.is_error() { return self.error_expr(); }
    let pa = self.promote_expr(a);
    let pb = self.promote_expr(b);
    if !pa.ty.is_numeric() || !pb.ty.is_numeric() {
      self.diag.report("invalid operands to binary %s", Some(op));
      return self.error_expr();
    }
    let (ca, cb) = self.cross_extend(pa, pb);
    let ty = Self::binary_result_ty(&ca.ty, &cb.ty);
    self.expr(build(ca, cb), ty)
  }

  pub fn check_multiply(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_muldivrem(a, b, "*", ExprKind::Multiply)
  }
  pub fn check_divide(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_muldivrem(a, b, "/", ExprKind::Divide)
  }
  pub fn check_remainder(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_muldivrem(a, b, "%", ExprKind::Remainder)
  }

  fn check_relational(
    &mut self,
    a: Expr<'a>,
    b: Expr<'a>,
    op: &str,
    build: impl FnOnce(Expr<'a>, Expr<'a>) -> ExprKind<'a>,
  ) -> Expr<'a> {
    if a.ty.is_error() || b.ty.is_error() { return self.error_expr(); }
    let pa = self.promote_expr(a);
    let pb = self.promote_expr(b);
    if pa.ty.is_numeric() && pb.ty.is_numeric() {
      let (ca, cb) = self.cross_extend(pa, pb);
      return self.expr(build(ca, cb), Type::int());
    }
    if pa.ty.is_pointer() && pb.ty.is_pointer() && pa.ty.promote() == pb.ty.promote() {
      return self.expr(build(pa, pb), Type::int());
    }
    self.diag.report("invalid operands to binary %s", Some(op));
    self.error_expr()
  }

  pub fn check_less_than(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_relational(a, b, "<", ExprKind::LessThan)
  }
  pub fn check_greater_than(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_relational(a, b, ">", ExprKind::GreaterThan)
  }
  pub fn check_less_or_equal(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_relational(a, b, "<=", ExprKind::LessOrEqual)
  }
  pub fn check_greater_or_equal(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_relational(a, b, ">=", ExprKind::GreaterOrEqual)
  }

  fn check_eq_rule(
    &mut self,
    a: Expr<'a>,
    b: Expr<'a>,
    op: &str,
    build: impl FnOnce(Expr<'a>, Expr<'a>) -> ExprKind<'a>,
  ) -> Expr<'a> {
    if a.ty.is_error() || b.ty.is_error() { return self.error_expr(); }
    let pa = self.promote_expr(a);
    let pb = self.promote_expr(b);
    if !pa.ty.is_compatible_with(&pb.ty) {
      self.diag.report("invalid operands to binary %s", Some(op));
      return self.error_expr();
    }
    if pa.ty.is_numeric() {
      let (ca, cb) = self.cross_extend(pa, pb);
      return self.expr(build(ca, cb), Type::int());
    }
    self.expr(build(pa, pb), Type::int())
  }

  pub fn check_equal(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_eq_rule(a, b, "==", ExprKind::Equal)
  }
  pub fn check_not_equal(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_eq_rule(a, b, "!=", ExprKind::NotEqual)
  }

  fn check_logical(
    &mut self,
    a: Expr<'a>,
    b: Expr<'a>,
    op: &str,
    build: impl FnOnce(Expr<'a>, Expr<'a>) -> ExprKind<'a>,
  ) -> Expr<'a> {
    if a.ty.is_error() || b.ty.is_error() { return self.error_expr(); }
    let pa = self.promote_expr(a);
    let pb = self.promote_expr(b);
    if !pa.ty.is_predicate() || !pb.ty.is_predicate() {
      self.diag.report("invalid operands to binary %s", Some(op));
      return self.error_expr();
    }
    self.expr(build(pa, pb), Type::int())
  }

  pub fn check_logical_and(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_logical(a, b, "&&", ExprKind::LogicalAnd)
  }
  pub fn check_logical_or(&mut self, a: Expr<'a>, b: Expr<'a>) -> Expr<'a> {
    self.check_logical(a, b, "||", ExprKind::LogicalOr)
  }

  // ---- parenthesization, assignment, calls ------------------------------------

  #[must_use]
  pub fn check_paren(&self, e: Expr<'a>) -> Expr<'a> {
    let ty = e.ty.clone();
    self.expr(ExprKind::Paren(e), ty)
  }

  /// Build the `left = right` pair used both by a bare assignment
  /// statement and by the `for`-loop init/increment clauses.
  pub fn check_assign(&mut self, left: Expr<'a>, right: Expr<'a>) -> (Expr<'a>, Expr<'a>) {
    if left.ty.is_error() || right.ty.is_error() { return (left, right); }
    if !left.is_lvalue() {
      self.diag.report("lvalue required in expression", None);
      return (left, right);
    }
    let converted = self.convert(right, &left.ty);
    if !left.ty.is_compatible_with(&converted.ty) {
      self.diag.report("invalid operands to binary %s", Some("="));
    }
    (left, converted)
  }

  pub fn check_call(&mut self, callee: Expr<'a>, args: Vec<Expr<'a>>) -> Expr<'a> {
    let ExprKind::Identifier(sym) = callee.kind else {
      unreachable!("call target must be parsed as an identifier");
    };
    if callee.ty.is_error() { return self.error_expr(); }
    let fn_ty = sym.borrow().ty.clone();
    let Type::Function { spec, indirection, params } = fn_ty else {
      self.diag.report("called object is not a function", None);
      return self.error_expr();
    };
    let ret_ty = Type::Scalar { spec, indirection };
    let promoted: Vec<_> = args.into_iter().map(|a| self.promote_expr(a)).collect();
    match params {
      None => {
        if promoted.iter().any(|a| !a.ty.is_predicate()) {
          self.diag.report("invalid arguments to called function", None);
          return self.error_expr();
        }
      }
      Some(param_tys) => {
        if promoted.len() != param_tys.len() {
          self.diag.report("invalid arguments to called function", None);
          return self.error_expr();
        }
        for (arg, pty) in promoted.iter().zip(param_tys.iter()) {
          let converted = self.convert(arg, pty);
          if !converted.ty.is_compatible_with(pty) {
            self.diag.report("invalid arguments to called function", None);
            return self.error_expr();
          }
        }
      }
    }
    let args = self.arena.alloc_slice(&promoted);
    self.expr(ExprKind::Call { callee: sym, args }, ret_ty)
  }

  // ---- statements ---------------------------------------------------------

  #[must_use]
  pub fn check_simple(&self, e: Expr<'a>) -> Stmt<'a> { self.stmt(StmtKind::Simple(e)) }

  #[must_use]
  pub fn check_assignment_stmt(&self, left: Expr<'a>, right: Expr<'a>) -> Stmt<'a> {
    self.stmt(StmtKind::Assignment(left, right))
  }

  pub fn check_return(&mut self, e: Expr<'a>) -> Stmt<'a> {
    if !e.ty.is_error() {
      let ret = self.current_return.clone().expect("return outside function");
      let converted = self.convert(self.promote_expr(e), &ret);
      if !converted.ty.is_compatible_with(&ret) {
        self.diag.report("invalid return type", None);
      }
      return self.stmt(StmtKind::Return(converted));
    }
    self.stmt(StmtKind::Return(e))
  }

  fn check_test(&mut self, cond: Expr<'a>) -> Expr<'a> {
    if cond.ty.is_error() { return cond; }
    let p = self.promote_expr(cond);
    if !p.ty.is_predicate() {
      self.diag.report("invalid type for test expression", None);
    }
    p
  }

  pub fn check_while(&mut self, cond: Expr<'a>, body: Stmt<'a>) -> Stmt<'a> {
    let cond = self.check_test(cond);
    self.stmt(StmtKind::While(cond, body))
  }

  pub fn check_for(&mut self, init: Stmt<'a>, cond: Expr<'a>, incr: Stmt<'a>, body: Stmt<'a>) -> Stmt<'a> {
    let cond = self.check_test(cond);
    self.stmt(StmtKind::For(init, cond, incr, body))
  }

  pub fn check_if(&mut self, cond: Expr<'a>, then: Stmt<'a>, els: Option<Stmt<'a>>) -> Stmt<'a> {
    let cond = self.check_test(cond);
    self.stmt(StmtKind::If(cond, then, els))
  }

  #[must_use]
  pub fn check_block(&self, scope: Scope<'a>, stmts: Vec<Stmt<'a>>) -> Stmt<'a> {
    let stmts = self.arena.alloc_slice(&stmts);
    self.stmt(StmtKind::Block(scope, stmts))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn undeclared_identifier_reports_once_and_yields_error_type() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    let e = c.check_identifier("x");
    assert!(e.ty.is_error());
    assert_eq!(c.diag.error_count(), 1);
    // second lookup must not report again (inserted with Error type).
    let e2 = c.check_identifier("x");
    assert!(e2.ty.is_error());
    assert_eq!(c.diag.error_count(), 1);
  }

  #[test]
  fn error_propagates_through_binary_without_new_report() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    let bad = c.check_identifier("missing");
    assert_eq!(c.diag.error_count(), 1);
    let ok = c.check_number(1);
    let sum = c.check_add(bad, ok);
    assert!(sum.ty.is_error());
    assert_eq!(c.diag.error_count(), 1);
  }

  #[test]
  fn pointer_plus_literal_scales_and_folds() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    c.declare_global("p", Type::pointer_to(Specifier::Int, 0));
    let p = c.check_identifier("p");
    let two = c.check_number(2);
    let sum = c.check_add(p, two);
    match sum.kind {
      ExprKind::Add(_, scaled) => match scaled.kind {
        ExprKind::Number(v) => assert_eq!(v, 8),
        _ => panic!("expected folded literal"),
      },
      _ => panic!("expected Add node"),
    }
  }

  #[test]
  fn identical_pointer_subtraction_divides_by_element_size() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    c.declare_global("p", Type::pointer_to(Specifier::Int, 0));
    c.declare_global("q", Type::pointer_to(Specifier::Int, 0));
    let p = c.check_identifier("p");
    let q = c.check_identifier("q");
    let diff = c.check_subtract(p, q);
    assert_eq!(diff.ty, Type::long());
    assert!(matches!(diff.kind, ExprKind::Divide(_, _)));
  }

  #[test]
  fn char_assigned_to_long_inserts_truncating_cast() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    c.declare_global("c", Type::char_ty());
    c.declare_global("l", Type::long());
    let cc = c.check_identifier("c");
    let l = c.check_identifier("l");
    let (_, right) = c.check_assign(cc, l);
    assert_eq!(c.diag.error_count(), 0);
    assert_eq!(right.ty, Type::char_ty());
  }

  #[test]
  fn pointer_assigned_from_long_is_an_error() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    c.declare_global("p", Type::pointer_to(Specifier::Int, 0));
    c.declare_global("l", Type::long());
    let p = c.check_identifier("p");
    let l = c.check_identifier("l");
    c.check_assign(p, l);
    assert_eq!(c.diag.error_count(), 1);
  }

  #[test]
  fn void_variable_is_reported() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    c.declare_global("x", Type::void());
    assert_eq!(c.diag.error_count(), 1);
  }

  #[test]
  fn void_pointer_variable_is_not_reported() {
    let arena = Arena::new();
    let mut c = Checker::new(&arena);
    c.declare_global("x", Type::pointer_to(Specifier::Void, 0));
    assert_eq!(c.diag.error_count(), 0);
  }

  #[test]
  fn narrow_and_wide_literals_get_correct_types() {
    let arena = Arena::new();
    let c = Checker::new(&arena);
    assert_eq!(c.check_number(42).ty, Type::int());
    assert_eq!(c.check_number(4_294_967_296).ty, Type::long());
  }
}
