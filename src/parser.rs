//! Recursive-descent parser. Holds one token of lookahead and drives the
//! [`Checker`] construct-by-construct, handing it already-built child
//! nodes and receiving back the decorated (typed, coerced) parent node.

use crate::checker::Checker;
use crate::lexer::{unescape, Lexer, TokKind, Token};
use crate::types::tree::{Arena, Expr, Function, Stmt, TranslationUnit};
use crate::types::ty::{Specifier, Type};

pub struct Parser<'a, 'src> {
  lex: Lexer<'src>,
  cur: Token,
  pub checker: Checker<'a>,
}

impl<'a, 'src> Parser<'a, 'src> {
  #[must_use]
  pub fn new(src: &'src str, arena: &'a Arena) -> Self {
    let mut lex = Lexer::new(src);
    let cur = lex.next_token();
    Parser { lex, cur, checker: Checker::new(arena) }
  }

  fn bump(&mut self) -> Token {
    let next = self.lex.next_token();
    log::trace!("consumed token {:?}", self.cur.kind);
    std::mem::replace(&mut self.cur, next)
  }

  fn at(&self, kind: TokKind) -> bool { self.cur.kind == kind }

  /// Advance past the expected token or raise a fatal syntax error.
  fn expect(&mut self, kind: TokKind) -> Token {
    if self.at(kind) { self.bump() } else { self.checker.diag.syntax_error(&self.cur) }
  }

  fn expect_ident(&mut self) -> String {
    if self.at(TokKind::Ident) { self.bump().text } else { self.checker.diag.syntax_error(&self.cur) }
  }

  fn parse_specifier(&mut self) -> Specifier {
    let spec = match self.cur.kind {
      TokKind::Int => Specifier::Int,
      TokKind::Char => Specifier::Char,
      TokKind::Long => Specifier::Long,
      TokKind::Void => Specifier::Void,
      _ => self.checker.diag.syntax_error(&self.cur),
    };
    self.bump();
    spec
  }

  fn parse_pointers(&mut self) -> u32 {
    let mut n = 0;
    while self.at(TokKind::Other('*')) { self.bump(); n += 1; }
    n
  }

  // ---- top level ------------------------------------------------------------

  /// Parse an entire translation unit, driving the checker for every
  /// global declaration and function definition.
  pub fn parse_translation_unit(&mut self) -> TranslationUnit<'a> {
    let mut unit = TranslationUnit::default();
    while !self.cur.is_done() {
      if let Some(f) = self.parse_global_or_function() {
        unit.functions.push(f);
      }
    }
    unit
  }

  fn parse_global_or_function(&mut self) -> Option<Function<'a>> {
    let spec = self.parse_specifier();
    let indirection = self.parse_pointers();
    let name = self.expect_ident();

    if self.at(TokKind::Other('(')) {
      return self.parse_function(&name, spec, indirection);
    }

    // Scalar or array global, possibly followed by more comma-separated
    // declarators sharing `spec`.
    self.declare_one_global(&name, spec, indirection);
    while self.at(TokKind::Other(',')) {
      self.bump();
      let indirection = self.parse_pointers();
      let name = self.expect_ident();
      self.declare_one_global(&name, spec, indirection);
    }
    self.expect(TokKind::Other(';'));
    None
  }

  fn declare_one_global(&mut self, name: &str, spec: Specifier, indirection: u32) {
    if self.at(TokKind::Other('[')) {
      self.bump();
      let len_tok = self.expect(TokKind::Number);
      let len: u32 = len_tok.text.parse().unwrap_or(0);
      self.expect(TokKind::Other(']'));
      self.checker.declare_global(name, Type::Array { spec, indirection, len });
    } else {
      self.checker.declare_global(name, Type::Scalar { spec, indirection });
    }
  }

  fn parse_function(&mut self, name: &str, spec: Specifier, indirection: u32) -> Option<Function<'a>> {
    self.expect(TokKind::Other('('));
    if self.at(TokKind::Other(')')) {
      // `f()`: an unknown parameter list. Only valid as a bare declaration.
      self.bump();
      let ty = Type::Function { spec, indirection, params: None };
      self.checker.declare_function(name, ty, false);
      self.expect(TokKind::Other(';'));
      return None;
    }

    let (param_types, params) = self.parse_parameters();
    self.expect(TokKind::Other(')'));
    let ty = Type::Function { spec, indirection, params: param_types };

    if self.at(TokKind::Other(';')) {
      self.bump();
      self.checker.declare_function(name, ty, false);
      return None;
    }

    let symbol = self.checker.declare_function(name, ty, true);
    let scope = self.checker.open_scope();
    self.checker.enter_function(Type::Scalar { spec, indirection });
    for (pname, pty) in params {
      self.checker.declare_local(&pname, pty);
    }
    self.expect(TokKind::Other('{'));
    let body = self.finish_block(scope);
    self.checker.leave_function();
    Some(Function { symbol, body })
  }

  fn parse_parameters(&mut self) -> (Option<Vec<Type>>, Vec<(String, Type)>) {
    if self.at(TokKind::Void) {
      self.bump();
      if self.at(TokKind::Other(')')) {
        return (Some(Vec::new()), Vec::new());
      }
      let indirection = self.parse_pointers();
      let name = self.expect_ident();
      let mut names = vec![(name, Type::Scalar { spec: Specifier::Void, indirection })];
      while self.at(TokKind::Other(',')) {
        self.bump();
        names.push(self.parse_parameter());
      }
      let types = names.iter().map(|(_, t)| t.clone()).collect();
      return (Some(types), names);
    }
    let mut names = vec![self.parse_parameter()];
    while self.at(TokKind::Other(',')) {
      self.bump();
      names.push(self.parse_parameter());
    }
    let types = names.iter().map(|(_, t)| t.clone()).collect();
    (Some(types), names)
  }

  fn parse_parameter(&mut self) -> (String, Type) {
    let spec = self.parse_specifier();
    let indirection = self.parse_pointers();
    let name = self.expect_ident();
    (name, Type::Scalar { spec, indirection })
  }

  // ---- statements -------------------------------------------------------------

  fn parse_block(&mut self) -> Stmt<'a> {
    self.expect(TokKind::Other('{'));
    let scope = self.checker.open_scope();
    self.finish_block(scope)
  }

  /// Parse `declarations statements '}'` into an already-opened `scope`.
  /// Shared by nested `{…}` blocks and a function's own body, which reuses
  /// its parameter scope directly rather than nesting a second one.
  fn finish_block(&mut self, scope: crate::types::symbol::Scope<'a>) -> Stmt<'a> {
    log::debug!("entering block scope");
    self.parse_local_declarations();
    let mut stmts = Vec::new();
    while !self.at(TokKind::Other('}')) {
      stmts.push(self.parse_statement());
    }
    self.expect(TokKind::Other('}'));
    self.checker.close_scope();
    log::debug!("leaving block scope");
    self.checker.check_block(scope, stmts)
  }

  fn parse_local_declarations(&mut self) {
    loop {
      match self.cur.kind {
        TokKind::Int | TokKind::Char | TokKind::Long | TokKind::Void => {}
        _ => break,
      }
      let spec = self.parse_specifier();
      loop {
        let indirection = self.parse_pointers();
        let name = self.expect_ident();
        if self.at(TokKind::Other('[')) {
          self.bump();
          let len_tok = self.expect(TokKind::Number);
          let len: u32 = len_tok.text.parse().unwrap_or(0);
          self.expect(TokKind::Other(']'));
          self.checker.declare_local(&name, Type::Array { spec, indirection, len });
        } else {
          self.checker.declare_local(&name, Type::Scalar { spec, indirection });
        }
        if self.at(TokKind::Other(',')) { self.bump(); continue; }
        break;
      }
      self.expect(TokKind::Other(';'));
    }
  }

  fn parse_statement(&mut self) -> Stmt<'a> {
    match self.cur.kind {
      TokKind::Other('{') => self.parse_block(),
      TokKind::Return => {
        self.bump();
        let e = self.parse_expression();
        self.expect(TokKind::Other(';'));
        self.checker.check_return(e)
      }
      TokKind::While => {
        self.bump();
        self.expect(TokKind::Other('('));
        let cond = self.parse_expression();
        self.expect(TokKind::Other(')'));
        let body = self.parse_statement();
        self.checker.check_while(cond, body)
      }
      TokKind::For => {
        self.bump();
        self.expect(TokKind::Other('('));
        let init = self.parse_assignment_stmt();
        self.expect(TokKind::Other(';'));
        let cond = self.parse_expression();
        self.expect(TokKind::Other(';'));
        let incr = self.parse_assignment_stmt();
        self.expect(TokKind::Other(')'));
        let body = self.parse_statement();
        self.checker.check_for(init, cond, incr, body)
      }
      TokKind::If => {
        self.bump();
        self.expect(TokKind::Other('('));
        let cond = self.parse_expression();
        self.expect(TokKind::Other(')'));
        let then = self.parse_statement();
        let els = if self.at(TokKind::Else) {
          self.bump();
          Some(self.parse_statement())
        } else {
          None
        };
        self.checker.check_if(cond, then, els)
      }
      _ => {
        let stmt = self.parse_assignment_stmt();
        self.expect(TokKind::Other(';'));
        stmt
      }
    }
  }

  fn parse_assignment_stmt(&mut self) -> Stmt<'a> {
    let left = self.parse_expression();
    if self.at(TokKind::Other('=')) {
      self.bump();
      let right = self.parse_expression();
      let (l, r) = self.checker.check_assign(left, right);
      self.checker.check_assignment_stmt(l, r)
    } else {
      self.checker.check_simple(left)
    }
  }

  // ---- expressions, lowest to highest precedence -----------------------------

  fn parse_expression(&mut self) -> Expr<'a> { self.parse_logical_or() }

  fn parse_logical_or(&mut self) -> Expr<'a> {
    let mut left = self.parse_logical_and();
    while self.at(TokKind::Or) {
      self.bump();
      let right = self.parse_logical_and();
      left = self.checker.check_logical_or(left, right);
    }
    left
  }

  fn parse_logical_and(&mut self) -> Expr<'a> {
    let mut left = self.parse_equality();
    while self.at(TokKind::And) {
      self.bump();
      let right = self.parse_equality();
      left = self.checker.check_logical_and(left, right);
    }
    left
  }

  fn parse_equality(&mut self) -> Expr<'a> {
    let mut left = self.parse_relational();
    loop {
      left = match self.cur.kind {
        TokKind::Eql => { self.bump(); let r = self.parse_relational(); self.checker.check_equal(left, r) }
        TokKind::Neq => { self.bump(); let r = self.parse_relational(); self.checker.check_not_equal(left, r) }
        _ => break,
      };
    }
    left
  }

  fn parse_relational(&mut self) -> Expr<'a> {
    let mut left = self.parse_additive();
    loop {
      left = match self.cur.kind {
        TokKind::Other('<') => { self.bump(); let r = self.parse_additive(); self.checker.check_less_than(left, r) }
        TokKind::Other('>') => { self.bump(); let r = self.parse_additive(); self.checker.check_greater_than(left, r) }
        TokKind::Leq => { self.bump(); let r = self.parse_additive(); self.checker.check_less_or_equal(left, r) }
        TokKind::Geq => { self.bump(); let r = self.parse_additive(); self.checker.check_greater_or_equal(left, r) }
        _ => break,
      };
    }
    left
  }

  fn parse_additive(&mut self) -> Expr<'a> {
    let mut left = self.parse_multiplicative();
    loop {
      left = match self.cur.kind {
        TokKind::Other('+') => { self.bump(); let r = self.parse_multiplicative(); self.checker.check_add(left, r) }
        TokKind::Other('-') => { self.bump(); let r = self.parse_multiplicative(); self.checker.check_subtract(left, r) }
        _ => break,
      };
    }
    left
  }

  fn parse_multiplicative(&mut self) -> Expr<'a> {
    let mut left = self.parse_unary();
    loop {
      left = match self.cur.kind {
        TokKind::Other('*') => { self.bump(); let r = self.parse_unary(); self.checker.check_multiply(left, r) }
        TokKind::Other('/') => { self.bump(); let r = self.parse_unary(); self.checker.check_divide(left, r) }
        TokKind::Other('%') => { self.bump(); let r = self.parse_unary(); self.checker.check_remainder(left, r) }
        _ => break,
      };
    }
    left
  }

  fn parse_unary(&mut self) -> Expr<'a> {
    match self.cur.kind {
      TokKind::Other('!') => { self.bump(); let e = self.parse_unary(); self.checker.check_not(e) }
      TokKind::Other('-') => { self.bump(); let e = self.parse_unary(); self.checker.check_negate(e) }
      TokKind::Other('*') => { self.bump(); let e = self.parse_unary(); self.checker.check_dereference(e) }
      TokKind::Other('&') => { self.bump(); let e = self.parse_unary(); self.checker.check_address(e) }
      TokKind::Sizeof => { self.bump(); let e = self.parse_unary(); self.checker.check_sizeof(e) }
      _ => self.parse_postfix(),
    }
  }

  fn parse_postfix(&mut self) -> Expr<'a> {
    let mut e = self.parse_primary();
    while self.at(TokKind::Other('[')) {
      self.bump();
      let idx = self.parse_expression();
      self.expect(TokKind::Other(']'));
      e = self.checker.check_index(e, idx);
    }
    e
  }

  fn parse_primary(&mut self) -> Expr<'a> {
    match self.cur.kind {
      TokKind::Other('(') => {
        self.bump();
        let e = self.parse_expression();
        self.expect(TokKind::Other(')'));
        self.checker.check_paren(e)
      }
      TokKind::Ident => {
        let name = self.bump().text;
        if self.at(TokKind::Other('(')) {
          self.bump();
          let mut args = Vec::new();
          if !self.at(TokKind::Other(')')) {
            args.push(self.parse_expression());
            while self.at(TokKind::Other(',')) {
              self.bump();
              args.push(self.parse_expression());
            }
          }
          self.expect(TokKind::Other(')'));
          let callee = self.checker.check_identifier(&name);
          self.checker.check_call(callee, args)
        } else {
          self.checker.check_identifier(&name)
        }
      }
      TokKind::Number => {
        let text = self.bump().text;
        let value: i64 = text.parse().unwrap_or(0);
        self.checker.check_number(value)
      }
      TokKind::StringLit => {
        let text = self.bump().text;
        let bytes = unescape(&text);
        self.checker.check_string(&bytes)
      }
      TokKind::CharLit => {
        let text = self.bump().text;
        let bytes = unescape(&text);
        let value = i64::from(*bytes.first().unwrap_or(&0));
        self.checker.check_number(value)
      }
      _ => self.checker.diag.syntax_error(&self.cur),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_and_checks_pointer_scaling_example() {
    let arena = Arena::new();
    let mut p = Parser::new("int *p; int i; void f(void) { i = *(p + 2); }", &arena);
    let unit = p.parse_translation_unit();
    assert_eq!(p.checker.diag.error_count(), 0);
    assert_eq!(unit.functions.len(), 1);
  }

  #[test]
  fn f_paren_void_has_empty_params_f_empty_parens_is_unknown() {
    let arena = Arena::new();
    let mut p = Parser::new("int f(); int g(void);", &arena);
    p.parse_translation_unit();
    assert_eq!(p.checker.diag.error_count(), 0);
  }

  #[test]
  fn reports_undeclared_and_continues() {
    let arena = Arena::new();
    let mut p = Parser::new("int main(void) { return missing; }", &arena);
    let unit = p.parse_translation_unit();
    assert_eq!(p.checker.diag.error_count(), 1);
    assert_eq!(unit.functions.len(), 1);
  }

  #[test]
  fn for_loop_and_blocks_parse() {
    let arena = Arena::new();
    let mut p = Parser::new(
      "int main(void) { int i; for (i = 0; i < 10; i = i + 1) { } return 0; }",
      &arena,
    );
    p.parse_translation_unit();
    assert_eq!(p.checker.diag.error_count(), 0);
  }
}
