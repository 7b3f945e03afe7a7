//! The value-type system: scalars, arrays, functions, and the propagating
//! `Error` type.

use crate::abi;

/// One of the four scalar base kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
  Int,
  Char,
  Long,
  Void,
}

/// A tagged value type, compared structurally (spec: "Types are values
/// compared structurally"). `Function` equality is special-cased below.
#[derive(Debug, Clone)]
pub enum Type {
  /// Propagates silently through every operation; see [`Type::is_error`].
  Error,
  /// A scalar of the given specifier and pointer depth.
  Scalar { spec: Specifier, indirection: u32 },
  /// A one-dimensional array of `len` elements of `spec`/`indirection`.
  Array { spec: Specifier, indirection: u32, len: u32 },
  /// A function returning `spec`/`indirection`. `params` is `None` when
  /// declared `f()` (unknown parameter list, accepts any predicate args).
  Function { spec: Specifier, indirection: u32, params: Option<Vec<Type>> },
}

impl PartialEq for Type {
  fn eq(&self, other: &Self) -> bool {
    use Type::{Array, Error, Function, Scalar};
    match (self, other) {
      (Error, Error) => true,
      (Scalar { spec: s1, indirection: i1 }, Scalar { spec: s2, indirection: i2 }) =>
        s1 == s2 && i1 == i2,
      (Array { spec: s1, indirection: i1, len: l1 }, Array { spec: s2, indirection: i2, len: l2 }) =>
        s1 == s2 && i1 == i2 && l1 == l2,
      (
        Function { spec: s1, indirection: i1, params: p1 },
        Function { spec: s2, indirection: i2, params: p2 },
      ) => s1 == s2 && i1 == i2 && match (p1, p2) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b,
      },
      _ => false,
    }
  }
}
impl Eq for Type {}

impl Type {
  #[must_use] pub fn int() -> Self { Type::Scalar { spec: Specifier::Int, indirection: 0 } }
  #[must_use] pub fn long() -> Self { Type::Scalar { spec: Specifier::Long, indirection: 0 } }
  #[must_use] pub fn char_ty() -> Self { Type::Scalar { spec: Specifier::Char, indirection: 0 } }
  #[must_use] pub fn void() -> Self { Type::Scalar { spec: Specifier::Void, indirection: 0 } }

  #[must_use]
  pub fn pointer_to(spec: Specifier, indirection: u32) -> Self {
    Type::Scalar { spec, indirection: indirection + 1 }
  }

  #[must_use]
  pub fn is_error(&self) -> bool { matches!(self, Type::Error) }

  /// Scalar with indirection>0, or any array.
  #[must_use]
  pub fn is_pointer(&self) -> bool {
    matches!(self, Type::Scalar { indirection, .. } if *indirection > 0)
      || matches!(self, Type::Array { .. })
  }

  /// True for a `void*`/`void**`/… pointer specifically.
  #[must_use]
  pub fn is_void_pointer(&self) -> bool {
    matches!(self, Type::Scalar { spec: Specifier::Void, indirection } if *indirection > 0)
  }

  /// Scalar, indirection 0, specifier != Void.
  #[must_use]
  pub fn is_numeric(&self) -> bool {
    matches!(self, Type::Scalar { spec, indirection: 0 } if *spec != Specifier::Void)
  }

  /// Numeric or pointer: usable as a boolean test or arithmetic operand.
  #[must_use]
  pub fn is_predicate(&self) -> bool { self.is_numeric() || self.is_pointer() }

  #[must_use]
  pub fn is_function(&self) -> bool { matches!(self, Type::Function { .. }) }

  #[must_use]
  pub fn is_array(&self) -> bool { matches!(self, Type::Array { .. }) }

  /// `char -> int`; `array of T -> pointer to T`; identity otherwise.
  #[must_use]
  pub fn promote(&self) -> Type {
    match self {
      Type::Scalar { spec: Specifier::Char, indirection: 0 } => Type::int(),
      Type::Array { spec, indirection, .. } =>
        Type::Scalar { spec: *spec, indirection: indirection + 1 },
      other => other.clone(),
    }
  }

  /// `&e`: a pointer one layer deeper than `e`'s own (unpromoted) type.
  /// Used by `&` on an lvalue, as opposed to [`Type::promote`]'s
  /// array-decay use of the same wrapping.
  #[must_use]
  pub fn pointer_to_self(&self) -> Type {
    match self {
      Type::Scalar { spec, indirection } => Type::Scalar { spec: *spec, indirection: indirection + 1 },
      Type::Array { spec, indirection, .. } => Type::Scalar { spec: *spec, indirection: indirection + 1 },
      other => other.clone(),
    }
  }

  /// Strip one layer of pointer indirection. Asserts on a non-pointer scalar.
  #[must_use]
  pub fn deref(&self) -> Type {
    match self {
      Type::Scalar { spec, indirection } if *indirection > 0 =>
        Type::Scalar { spec: *spec, indirection: indirection - 1 },
      _ => unreachable!("deref of non-pointer type {self:?}"),
    }
  }

  /// Size in bytes. Panics for `Function`/`Error`, the "illegal" cases.
  #[must_use]
  pub fn size(&self) -> u32 {
    match self {
      Type::Scalar { indirection, .. } if *indirection > 0 => abi::SIZEOF_PTR,
      Type::Scalar { spec, indirection: 0 } => match spec {
        Specifier::Char => abi::SIZEOF_CHAR,
        Specifier::Int => abi::SIZEOF_INT,
        Specifier::Long => abi::SIZEOF_LONG,
        Specifier::Void => unreachable!("sizeof void"),
      },
      Type::Scalar { .. } => unreachable!(),
      Type::Array { spec, indirection, len } => {
        let elem = Type::Scalar { spec: *spec, indirection: *indirection };
        elem.size() * len
      }
      Type::Function { .. } | Type::Error => unreachable!("size of {self:?}"),
    }
  }

  /// Both numeric; or both pointers with the same promoted pointee, or
  /// either side being `void*`.
  #[must_use]
  pub fn is_compatible_with(&self, other: &Type) -> bool {
    if self.is_numeric() && other.is_numeric() { return true; }
    if self.is_pointer() && other.is_pointer() {
      return self.promote() == other.promote() || self.is_void_pointer() || other.is_void_pointer();
    }
    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn promote_is_idempotent() {
    let c = Type::char_ty();
    assert_eq!(c.promote().promote(), c.promote());
  }

  #[test]
  fn deref_of_pointer_roundtrips() {
    let p = Type::pointer_to(Specifier::Int, 0);
    assert_eq!(p.deref(), Type::int());
  }

  #[test]
  fn function_types_absent_params_are_compatible() {
    let unknown = Type::Function { spec: Specifier::Int, indirection: 0, params: None };
    let known = Type::Function { spec: Specifier::Int, indirection: 0, params: Some(vec![Type::int()]) };
    assert_eq!(unknown, known);
  }

  #[test]
  fn function_types_distinct_params_are_unequal() {
    let a = Type::Function { spec: Specifier::Int, indirection: 0, params: Some(vec![Type::int()]) };
    let b = Type::Function { spec: Specifier::Int, indirection: 0, params: Some(vec![Type::long()]) };
    assert_ne!(a, b);
  }

  #[test]
  fn void_pointer_compatible_with_any_pointer() {
    let vp = Type::pointer_to(Specifier::Void, 0);
    let ip = Type::pointer_to(Specifier::Int, 0);
    assert!(vp.is_compatible_with(&ip));
  }

  #[test]
  fn void_scalar_is_not_numeric_but_void_pointer_is_predicate() {
    assert!(!Type::void().is_numeric());
    assert!(Type::pointer_to(Specifier::Void, 0).is_predicate());
  }

  #[test]
  fn array_size_multiplies_element_size() {
    let a = Type::Array { spec: Specifier::Int, indirection: 0, len: 10 };
    assert_eq!(a.size(), 40);
  }
}
