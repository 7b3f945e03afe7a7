//! Named bindings and the lexically nested scope chain.
//!
//! Both `Symbol` and `Scope` live in the program-lifetime [`super::tree::Arena`]
//! (see that module's docs): a `SymbolRef<'a>` is a bare `&'a RefCell<Symbol>`
//! and a `Scope<'a>` a bare `&'a RefCell<ScopeInner<'a>>`. Both are `Copy`,
//! so sharing one binding between a scope's symbol list and every
//! `Identifier`/`Call` tree node that names it is just a reference copy,
//! and the allocator can still mutate a symbol's offset in place through
//! the `RefCell` after the tree referencing it has already been built.

use std::cell::{Ref, RefCell};

use super::ty::Type;

/// A named binding: its declared type and (once assigned) its stack-frame
/// displacement. `0` means "unassigned" for a local/parameter, or "global"
/// for a symbol that never gets a frame offset at all.
#[derive(Debug)]
pub struct Symbol {
  pub name: String,
  pub ty: Type,
  offset: i32,
}

impl Symbol {
  #[must_use]
  pub fn new(name: impl Into<String>, ty: Type) -> Self {
    Self { name: name.into(), ty, offset: 0 }
  }

  #[must_use]
  pub fn offset(&self) -> i32 { self.offset }

  pub fn set_offset(&mut self, off: i32) { self.offset = off; }

  #[must_use]
  pub fn is_global(&self) -> bool { self.offset == 0 }
}

/// An arena-allocated, interior-mutable handle to a [`Symbol`]. `Copy`
/// because it is a bare reference.
pub type SymbolRef<'a> = &'a RefCell<Symbol>;

#[derive(Debug)]
struct ScopeInner<'a> {
  symbols: Vec<SymbolRef<'a>>,
  parent: Option<Scope<'a>>,
}

/// An arena-allocated, interior-mutable handle to a scope's data. `Copy`
/// for the same reason as [`SymbolRef`].
pub type Scope<'a> = &'a RefCell<ScopeInner<'a>>;

/// Allocate a fresh, empty scope in `arena`, linked to `parent`.
#[must_use]
pub fn new_scope<'a>(arena: &'a super::tree::Arena, parent: Option<Scope<'a>>) -> Scope<'a> {
  arena.alloc(RefCell::new(ScopeInner { symbols: Vec::new(), parent }))
}

/// Insert `sym` into `scope`.
pub fn insert<'a>(scope: Scope<'a>, sym: SymbolRef<'a>) {
  scope.borrow_mut().symbols.push(sym);
}

/// Look up `name` in `scope` only (not its ancestors).
#[must_use]
pub fn find<'a>(scope: Scope<'a>, name: &str) -> Option<SymbolRef<'a>> {
  scope.borrow().symbols.iter().find(|s| s.borrow().name == name).copied()
}

/// Look up `name`, walking up the enclosing chain.
#[must_use]
pub fn lookup<'a>(scope: Scope<'a>, name: &str) -> Option<SymbolRef<'a>> {
  if let Some(s) = find(scope, name) { return Some(s); }
  enclosing(scope).and_then(|p| lookup(p, name))
}

/// Discard a binding by name (used to keep the original binding on a
/// reported redeclaration).
pub fn remove(scope: Scope<'_>, name: &str) {
  scope.borrow_mut().symbols.retain(|s| s.borrow().name != name);
}

#[must_use]
pub fn enclosing<'a>(scope: Scope<'a>) -> Option<Scope<'a>> {
  scope.borrow().parent
}

/// Read-only access to `scope`'s own symbol list (not its ancestors').
#[must_use]
pub fn symbols<'a, 'b>(scope: Scope<'a>) -> Ref<'b, [SymbolRef<'a>]> where 'a: 'b {
  Ref::map(scope.borrow(), |inner| inner.symbols.as_slice())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::tree::Arena;
  use std::cell::RefCell as StdRefCell;

  #[test]
  fn find_is_local_only_lookup_walks_chain() {
    let arena = Arena::new();
    let outer = new_scope(&arena, None);
    insert(outer, arena.alloc(StdRefCell::new(Symbol::new("g", Type::int()))));
    let inner = new_scope(&arena, Some(outer));
    assert!(find(inner, "g").is_none());
    assert!(lookup(inner, "g").is_some());
  }

  #[test]
  fn remove_discards_only_named_binding() {
    let arena = Arena::new();
    let s = new_scope(&arena, None);
    insert(s, arena.alloc(StdRefCell::new(Symbol::new("a", Type::int()))));
    insert(s, arena.alloc(StdRefCell::new(Symbol::new("b", Type::int()))));
    remove(s, "a");
    assert!(find(s, "a").is_none());
    assert!(find(s, "b").is_some());
  }

  #[test]
  fn global_symbol_offset_is_zero() {
    let arena = Arena::new();
    let sym = arena.alloc(StdRefCell::new(Symbol::new("g", Type::int())));
    assert!(sym.borrow().is_global());
    sym.borrow_mut().set_offset(-4);
    assert!(!sym.borrow().is_global());
  }
}
