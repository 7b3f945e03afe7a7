//! The single-pass code generator (spec.md §4.5): walks one function's Tree
//! emitting SysV AMD64 AT&T-syntax assembly, maintaining a register file
//! with spill-to-stack, a process-wide label counter, and a string-literal
//! pool interned by byte content.
//!
//! The register file and the Tree reference each other only through
//! non-owning indices: a node's `reg` [`std::cell::Cell`] names a slot in
//! [`Generator`]'s fixed array, and the array's slot names the node back
//! via a plain `&'a` reference — no cycle of ownership, just of reference.

use std::io::{self, Write};

use crate::abi;
use crate::types::symbol::{self, Scope, SymbolRef};
use crate::types::tree::{Expr, ExprKind, Function, Stmt, StmtKind, TranslationUnit};
use crate::types::ty::Type;

/// An index into the fixed 9-register scratch pool. Copy because the Tree
/// stores it by value in a `Cell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegId(u8);

/// Scratch-register pool, oldest (least recently (re)used) first; `getreg`
/// spills index 0 when every slot is taken.
const SCRATCH: [&str; 9] = ["r11", "r10", "r9", "r8", "rcx", "rdx", "rsi", "rdi", "rax"];
const VIEW8: [&str; 9] = ["r11b", "r10b", "r9b", "r8b", "cl", "dl", "sil", "dil", "al"];
const VIEW32: [&str; 9] = ["r11d", "r10d", "r9d", "r8d", "ecx", "edx", "esi", "edi", "eax"];

/// Integer/pointer argument-passing registers, in SysV order.
const PARAM_NAMES: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

fn reg_by_name(name: &str) -> RegId {
  RegId(u8::try_from(SCRATCH.iter().position(|&r| r == name).expect("not a scratch register")).unwrap())
}

fn param_reg(i: usize) -> RegId { reg_by_name(PARAM_NAMES[i]) }

fn view(id: RegId, size: u32) -> &'static str {
  let i = id.0 as usize;
  match size {
    1 => VIEW8[i],
    4 => VIEW32[i],
    8 => SCRATCH[i],
    _ => unreachable!("bad operand size {size}"),
  }
}

fn suffix(size: u32) -> char {
  match size {
    1 => 'b',
    4 => 'l',
    8 => 'q',
    _ => unreachable!("bad operand size {size}"),
  }
}

/// All generator-local mutable state: the register file, label counter,
/// string pool, and the current function's name / spill cursor.
pub struct Generator<'a> {
  regs: [Option<Expr<'a>>; 9],
  label_counter: u32,
  strings: Vec<Vec<u8>>,
  cur_fn: String,
  spill_cursor: i32,
}

impl<'a> Default for Generator<'a> {
  fn default() -> Self { Self::new() }
}

impl<'a> Generator<'a> {
  #[must_use]
  pub fn new() -> Self {
    Generator { regs: [None; 9], label_counter: 0, strings: Vec::new(), cur_fn: String::new(), spill_cursor: 0 }
  }

  fn new_label(&mut self) -> String {
    self.label_counter += 1;
    format!(".LB{}", self.label_counter)
  }

  fn intern(&mut self, bytes: &[u8]) -> String {
    if let Some(i) = self.strings.iter().position(|s| s == bytes) {
      return format!(".LC{i}");
    }
    self.strings.push(bytes.to_vec());
    format!(".LC{}", self.strings.len() - 1)
  }

  // ---- register file: assign / load / getreg --------------------------------

  fn assign(&mut self, e: Expr<'a>, reg: RegId) {
    if let Some(old) = self.regs[reg.0 as usize] { old.reg.set(None); }
    if let Some(old_reg) = e.reg.get() { self.regs[old_reg.0 as usize] = None; }
    self.regs[reg.0 as usize] = Some(e);
    e.reg.set(Some(reg));
  }

  fn free(&mut self, e: Expr<'a>) {
    if let Some(reg) = e.reg.get() {
      self.regs[reg.0 as usize] = None;
      e.reg.set(None);
    }
  }

  fn spill_reg(&mut self, w: &mut impl Write, reg: RegId) -> io::Result<()> {
    let Some(e) = self.regs[reg.0 as usize] else { return Ok(()) };
    self.spill_cursor -= i32::try_from(abi::SIZEOF_REG).unwrap();
    let off = self.spill_cursor;
    writeln!(w, "  mov{} %{}, {}(%rbp)", suffix(e.ty.size()), view(reg, e.ty.size()), off)?;
    e.spill.set(off);
    e.reg.set(None);
    self.regs[reg.0 as usize] = None;
    Ok(())
  }

  fn getreg(&mut self, w: &mut impl Write) -> io::Result<RegId> {
    if let Some(i) = self.regs.iter().position(Option::is_none) {
      return Ok(RegId(u8::try_from(i).unwrap()));
    }
    let victim = RegId(0);
    self.spill_reg(w, victim)?;
    Ok(victim)
  }

  fn load(&mut self, w: &mut impl Write, e: Expr<'a>, reg: RegId) -> io::Result<()> {
    if e.reg.get() == Some(reg) { return Ok(()); }
    self.spill_reg(w, reg)?;
    let src = self.operand(e);
    writeln!(w, "  mov{} {}, %{}", suffix(e.ty.size()), src, view(reg, e.ty.size()))?;
    self.assign(e, reg);
    Ok(())
  }

  fn load_any(&mut self, w: &mut impl Write, e: Expr<'a>) -> io::Result<RegId> {
    if let Some(reg) = e.reg.get() { return Ok(reg); }
    let reg = self.getreg(w)?;
    self.load(w, e, reg)?;
    Ok(reg)
  }

  fn spill_all(&mut self, w: &mut impl Write) -> io::Result<()> {
    for i in 0..9 { self.spill_reg(w, RegId(u8::try_from(i).unwrap()))?; }
    Ok(())
  }

  /// Text an operand prints as: its register, else its spill slot, else
  /// (for identifiers/literals/strings) its source-level form.
  fn operand(&mut self, e: Expr<'a>) -> String {
    if let Some(reg) = e.reg.get() { return format!("%{}", view(reg, e.ty.size())); }
    if e.spill.get() != 0 { return format!("{}(%rbp)", e.spill.get()); }
    match e.kind {
      ExprKind::Number(v) => format!("${v}"),
      ExprKind::Identifier(sym) => {
        let s = sym.borrow();
        if s.is_global() { format!("{}(%rip)", s.name) } else { format!("{}(%rbp)", s.offset()) }
      }
      ExprKind::String(bytes) => { let label = self.intern(bytes); format!("{label}(%rip)") }
      ExprKind::Cast(inner) | ExprKind::Paren(inner) => self.operand(inner),
      _ => unreachable!("operand() on an unmaterialized compound expression"),
    }
  }

  // ---- expression generation --------------------------------------------------

  fn generate_expr(&mut self, w: &mut impl Write, e: Expr<'a>) -> io::Result<()> {
    match e.kind {
      ExprKind::Number(_) | ExprKind::String(_) | ExprKind::Identifier(_) => Ok(()),
      ExprKind::Paren(inner) => { self.generate_expr(w, inner)?; self.passthrough(e, inner); Ok(()) }
      ExprKind::Cast(inner) => self.generate_cast(w, e, inner),
      ExprKind::Not(op) => self.generate_not(w, e, op),
      ExprKind::Negate(op) => self.generate_negate(w, e, op),
      ExprKind::Address(op) => self.generate_address(w, e, op),
      ExprKind::Dereference(op) => self.generate_dereference(w, e, op),
      ExprKind::Add(l, r) => self.generate_arith(w, e, l, r, "add"),
      ExprKind::Subtract(l, r) => self.generate_arith(w, e, l, r, "sub"),
      ExprKind::Multiply(l, r) => self.generate_arith(w, e, l, r, "imul"),
      ExprKind::Divide(l, r) => self.generate_divrem(w, e, l, r, true),
      ExprKind::Remainder(l, r) => self.generate_divrem(w, e, l, r, false),
      ExprKind::LessThan(l, r) => self.generate_relational(w, e, l, r, "setl"),
      ExprKind::GreaterThan(l, r) => self.generate_relational(w, e, l, r, "setg"),
      ExprKind::LessOrEqual(l, r) => self.generate_relational(w, e, l, r, "setle"),
      ExprKind::GreaterOrEqual(l, r) => self.generate_relational(w, e, l, r, "setge"),
      ExprKind::Equal(l, r) => self.generate_relational(w, e, l, r, "sete"),
      ExprKind::NotEqual(l, r) => self.generate_relational(w, e, l, r, "setne"),
      ExprKind::LogicalAnd(l, r) => self.generate_logical(w, e, l, r, false),
      ExprKind::LogicalOr(l, r) => self.generate_logical(w, e, l, r, true),
      ExprKind::Call { callee, args } => self.generate_call(w, e, callee, args),
    }
  }

  fn passthrough(&mut self, e: Expr<'a>, inner: Expr<'a>) {
    if let Some(reg) = inner.reg.get() {
      self.assign(e, reg);
    } else {
      e.spill.set(inner.spill.get());
    }
  }

  fn generate_cast(&mut self, w: &mut impl Write, e: Expr<'a>, inner: Expr<'a>) -> io::Result<()> {
    self.generate_expr(w, inner)?;
    let (from, to) = (inner.ty.size(), e.ty.size());
    if from >= to {
      self.passthrough(e, inner);
      return Ok(());
    }
    let reg = self.load_any(w, inner)?;
    let mnemonic = match (from, to) {
      (1, 4) => "movsbl",
      (1, 8) => "movsbq",
      (4, 8) => "movslq",
      _ => unreachable!("bad widening cast {from}->{to}"),
    };
    writeln!(w, "  {mnemonic} %{}, %{}", view(reg, from), view(reg, to))?;
    self.free(inner);
    self.assign(e, reg);
    Ok(())
  }

  fn generate_not(&mut self, w: &mut impl Write, e: Expr<'a>, op: Expr<'a>) -> io::Result<()> {
    self.generate_expr(w, op)?;
    let reg = self.load_any(w, op)?;
    writeln!(w, "  cmpl $0, %{}", view(reg, 4))?;
    writeln!(w, "  sete %{}", view(reg, 1))?;
    writeln!(w, "  movzbl %{}, %{}", view(reg, 1), view(reg, 4))?;
    self.assign(e, reg);
    Ok(())
  }

  fn generate_negate(&mut self, w: &mut impl Write, e: Expr<'a>, op: Expr<'a>) -> io::Result<()> {
    self.generate_expr(w, op)?;
    let reg = self.load_any(w, op)?;
    writeln!(w, "  neg{} %{}", suffix(e.ty.size()), view(reg, e.ty.size()))?;
    self.assign(e, reg);
    Ok(())
  }

  fn generate_address(&mut self, w: &mut impl Write, e: Expr<'a>, op: Expr<'a>) -> io::Result<()> {
    if let ExprKind::Dereference(p) = op.kind {
      self.generate_expr(w, p)?;
      let reg = self.load_any(w, p)?;
      self.assign(e, reg);
      return Ok(());
    }
    self.generate_expr(w, op)?;
    let mem = self.operand(op);
    let reg = self.getreg(w)?;
    writeln!(w, "  leaq {mem}, %{}", view(reg, 8))?;
    self.assign(e, reg);
    Ok(())
  }

  fn generate_dereference(&mut self, w: &mut impl Write, e: Expr<'a>, op: Expr<'a>) -> io::Result<()> {
    self.generate_expr(w, op)?;
    let reg = self.load_any(w, op)?;
    writeln!(w, "  mov{} (%{}), %{}", suffix(e.ty.size()), view(reg, 8), view(reg, e.ty.size()))?;
    self.assign(e, reg);
    Ok(())
  }

  fn generate_arith(&mut self, w: &mut impl Write, e: Expr<'a>, l: Expr<'a>, r: Expr<'a>, mnemonic: &str) -> io::Result<()> {
    self.generate_expr(w, l)?;
    self.generate_expr(w, r)?;
    let lreg = self.load_any(w, l)?;
    let rop = self.operand(r);
    writeln!(w, "  {mnemonic}{} {rop}, %{}", suffix(e.ty.size()), view(lreg, e.ty.size()))?;
    self.free(r);
    self.assign(e, lreg);
    Ok(())
  }

  fn generate_divrem(&mut self, w: &mut impl Write, e: Expr<'a>, l: Expr<'a>, r: Expr<'a>, is_div: bool) -> io::Result<()> {
    self.generate_expr(w, l)?;
    self.generate_expr(w, r)?;
    let rax = reg_by_name("rax");
    let rdx = reg_by_name("rdx");
    let rcx = reg_by_name("rcx");
    self.load(w, l, rax)?;
    self.spill_reg(w, rdx)?;
    self.load(w, r, rcx)?;
    let size = e.ty.size();
    writeln!(w, "  {}", if size == 4 { "cltd" } else { "cqto" })?;
    writeln!(w, "  idiv{} %{}", suffix(size), view(rcx, size))?;
    self.free(l);
    self.free(r);
    self.assign(e, if is_div { rax } else { rdx });
    Ok(())
  }

  fn generate_relational(&mut self, w: &mut impl Write, e: Expr<'a>, l: Expr<'a>, r: Expr<'a>, setcc: &str) -> io::Result<()> {
    self.generate_expr(w, l)?;
    self.generate_expr(w, r)?;
    let size = l.ty.size().max(r.ty.size());
    let lreg = self.load_any(w, l)?;
    let rop = self.operand(r);
    writeln!(w, "  cmp{} {rop}, %{}", suffix(size), view(lreg, size))?;
    self.free(l);
    self.free(r);
    let reg = self.getreg(w)?;
    writeln!(w, "  {setcc} %{}", view(reg, 1))?;
    writeln!(w, "  movzbl %{}, %{}", view(reg, 1), view(reg, 4))?;
    self.assign(e, reg);
    Ok(())
  }

  fn generate_logical(&mut self, w: &mut impl Write, e: Expr<'a>, l: Expr<'a>, r: Expr<'a>, is_or: bool) -> io::Result<()> {
    let short_circuit = self.new_label();
    let end = self.new_label();
    // `is_or`: short-circuit to `short_circuit` as soon as an operand matches
    // the pool's identity value (true for `||`, false for `&&`).
    self.test(w, l, &short_circuit, is_or)?;
    self.test(w, r, &short_circuit, is_or)?;
    let reg = self.getreg(w)?;
    writeln!(w, "  movl ${}, %{}", u8::from(!is_or), view(reg, 4))?;
    writeln!(w, "  jmp {end}")?;
    writeln!(w, "{short_circuit}:")?;
    writeln!(w, "  movl ${}, %{}", u8::from(is_or), view(reg, 4))?;
    writeln!(w, "{end}:")?;
    self.assign(e, reg);
    Ok(())
  }

  fn generate_call(&mut self, w: &mut impl Write, e: Expr<'a>, callee: SymbolRef<'a>, args: &'a [Expr<'a>]) -> io::Result<()> {
    for a in args.iter().rev() { self.generate_expr(w, a)?; }
    self.spill_all(w)?;

    let excess = args.len().saturating_sub(abi::NUM_PARAM_REGS);
    let pushed_bytes = u32::try_from(excess).unwrap() * abi::SIZEOF_PARAM;
    let pad = abi::align_to(pushed_bytes, abi::STACK_ALIGNMENT) - pushed_bytes;
    if pad > 0 { writeln!(w, "  subq ${pad}, %rsp")?; }
    for a in args[abi::NUM_PARAM_REGS.min(args.len())..].iter().rev() {
      let op = self.operand(a);
      writeln!(w, "  pushq {op}")?;
    }
    for (i, a) in args.iter().take(abi::NUM_PARAM_REGS).enumerate() {
      self.load(w, a, param_reg(i))?;
    }

    let variadic = matches!(&callee.borrow().ty, Type::Function { params: None, .. });
    if variadic { writeln!(w, "  movl $0, %eax")?; }
    writeln!(w, "  call {}", callee.borrow().name)?;
    let reclaim = pushed_bytes + pad;
    if reclaim > 0 { writeln!(w, "  addq ${reclaim}, %rsp")?; }
    self.assign(e, reg_by_name("rax"));
    Ok(())
  }

  /// Materialize `e` into a conditional jump to `label`, taken when `e`'s
  /// truth value equals `want_true`, without ever storing the boolean in a
  /// register when `e` is itself a relational comparison.
  fn test(&mut self, w: &mut impl Write, e: Expr<'a>, label: &str, want_true: bool) -> io::Result<()> {
    if let ExprKind::Paren(inner) = e.kind { return self.test(w, inner, label, want_true); }
    if let Some((l, r, jcc_true, jcc_false)) = relational_parts(e) {
      self.generate_expr(w, l)?;
      self.generate_expr(w, r)?;
      let size = l.ty.size().max(r.ty.size());
      let lop = self.operand(l);
      let rop = self.operand(r);
      writeln!(w, "  cmp{} {rop}, {lop}", suffix(size))?;
      self.free(l);
      self.free(r);
      writeln!(w, "  {} {label}", if want_true { jcc_true } else { jcc_false })?;
      return Ok(());
    }
    self.generate_expr(w, e)?;
    let op = self.operand(e);
    writeln!(w, "  cmp{} $0, {op}", suffix(e.ty.size()))?;
    self.free(e);
    writeln!(w, "  {} {label}", if want_true { "jne" } else { "je" })?;
    Ok(())
  }

  // ---- statement generation -----------------------------------------------

  fn generate_stmt(&mut self, w: &mut impl Write, stmt: Stmt<'a>) -> io::Result<()> {
    match stmt.kind {
      StmtKind::Simple(e) => { self.generate_expr(w, e)?; self.free(e); }
      StmtKind::Assignment(left, right) => self.generate_assignment(w, left, right)?,
      StmtKind::Return(e) => {
        self.generate_expr(w, e)?;
        self.load(w, e, reg_by_name("rax"))?;
        self.free(e);
        writeln!(w, "  jmp {}.exit", self.cur_fn)?;
      }
      StmtKind::While(cond, body) => {
        let top = self.new_label();
        let exit = self.new_label();
        writeln!(w, "{top}:")?;
        self.test(w, cond, &exit, false)?;
        self.generate_stmt(w, body)?;
        writeln!(w, "  jmp {top}")?;
        writeln!(w, "{exit}:")?;
      }
      StmtKind::For(init, cond, incr, body) => {
        self.generate_stmt(w, init)?;
        let top = self.new_label();
        let exit = self.new_label();
        writeln!(w, "{top}:")?;
        self.test(w, cond, &exit, false)?;
        self.generate_stmt(w, body)?;
        self.generate_stmt(w, incr)?;
        writeln!(w, "  jmp {top}")?;
        writeln!(w, "{exit}:")?;
      }
      StmtKind::If(cond, then, els) => {
        let else_label = self.new_label();
        let end = self.new_label();
        self.test(w, cond, &else_label, false)?;
        self.generate_stmt(w, then)?;
        writeln!(w, "  jmp {end}")?;
        writeln!(w, "{else_label}:")?;
        if let Some(e) = els { self.generate_stmt(w, e)?; }
        writeln!(w, "{end}:")?;
      }
      StmtKind::Block(_, stmts) => {
        for (i, s) in stmts.iter().enumerate() {
          self.generate_stmt(w, s)?;
          debug_assert!(self.regs.iter().all(Option::is_none), "register file leaked after statement {i}");
        }
      }
    }
    Ok(())
  }

  fn generate_assignment(&mut self, w: &mut impl Write, left: Expr<'a>, right: Expr<'a>) -> io::Result<()> {
    if let ExprKind::Dereference(p) = left.kind {
      self.generate_expr(w, p)?;
      self.generate_expr(w, right)?;
      let preg = self.load_any(w, p)?;
      let rreg = self.load_any(w, right)?;
      writeln!(w, "  mov{} %{}, (%{})", suffix(right.ty.size()), view(rreg, right.ty.size()), view(preg, 8))?;
      self.free(p);
      self.free(right);
      return Ok(());
    }
    self.generate_expr(w, right)?;
    let rreg = self.load_any(w, right)?;
    let suf = suffix(left.ty.size());
    let lop = self.operand(left);
    writeln!(w, "  mov{suf} %{}, {lop}", view(rreg, left.ty.size()))?;
    self.free(right);
    Ok(())
  }

  // ---- function & program emission -----------------------------------------

  /// Emit one function definition: prologue, body, epilogue, and the
  /// deferred `.set <name>.size` (its value isn't known until every spill
  /// during generation has happened).
  pub fn generate_function(&mut self, w: &mut impl Write, func: &Function<'a>, frame_size: u32) -> io::Result<()> {
    let name = func.symbol.borrow().name.clone();
    writeln!(w, "{name}:")?;
    writeln!(w, "  pushq %rbp")?;
    writeln!(w, "  movq %rsp, %rbp")?;
    writeln!(w, "  movl ${name}.size, %eax")?;
    writeln!(w, "  subq %rax, %rsp")?;

    self.cur_fn = name.clone();
    self.spill_cursor = -i32::try_from(frame_size).unwrap();

    let StmtKind::Block(scope, _) = func.body.kind else { unreachable!("a function body is always a Block") };
    let param_count = match &func.symbol.borrow().ty {
      Type::Function { params: Some(p), .. } => p.len(),
      _ => unreachable!("a function definition always has a known parameter list"),
    };
    self.spill_incoming_params(w, scope, param_count)?;

    self.generate_stmt(w, func.body)?;

    writeln!(w, "{name}.exit:")?;
    writeln!(w, "  movq %rbp, %rsp")?;
    writeln!(w, "  popq %rbp")?;
    writeln!(w, "  ret")?;

    let total = abi::align_to(
      u32::try_from(i32::try_from(frame_size).unwrap().max(-self.spill_cursor)).unwrap(),
      abi::STACK_ALIGNMENT,
    );
    writeln!(w, "  .set {name}.size, {total}")?;
    writeln!(w, "  .globl {name}")?;
    Ok(())
  }

  fn spill_incoming_params(&mut self, w: &mut impl Write, scope: Scope<'a>, param_count: usize) -> io::Result<()> {
    let params = symbol::symbols(scope);
    for (i, sym) in params.iter().take(param_count).enumerate() {
      if i >= abi::NUM_PARAM_REGS { continue; }
      let s = sym.borrow();
      let size = s.ty.size();
      let preg = param_reg(i);
      writeln!(w, "  mov{} %{}, {}(%rbp)", suffix(size), view(preg, size), s.offset())?;
    }
    Ok(())
  }

  /// After every function is emitted: one `.comm` per global, then the
  /// interned string-literal pool in `.data`.
  pub fn emit_globals_and_strings(&mut self, w: &mut impl Write, outermost: Scope<'a>) -> io::Result<()> {
    for sym in symbol::symbols(outermost).iter() {
      let s = sym.borrow();
      if s.ty.is_function() { continue; }
      writeln!(w, "  .comm {}, {}", s.name, s.ty.size())?;
    }
    if self.strings.is_empty() { return Ok(()); }
    writeln!(w, "  .data")?;
    for (i, bytes) in self.strings.iter().enumerate() {
      writeln!(w, ".LC{i}:")?;
      writeln!(w, "  .asciz \"{}\"", escape_asciz(bytes))?;
    }
    Ok(())
  }
}

fn relational_parts<'a>(e: Expr<'a>) -> Option<(Expr<'a>, Expr<'a>, &'static str, &'static str)> {
  match e.kind {
    ExprKind::LessThan(l, r) => Some((l, r, "jl", "jge")),
    ExprKind::GreaterThan(l, r) => Some((l, r, "jg", "jle")),
    ExprKind::LessOrEqual(l, r) => Some((l, r, "jle", "jg")),
    ExprKind::GreaterOrEqual(l, r) => Some((l, r, "jge", "jl")),
    ExprKind::Equal(l, r) => Some((l, r, "je", "jne")),
    ExprKind::NotEqual(l, r) => Some((l, r, "jne", "je")),
    _ => None,
  }
}

fn escape_asciz(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len());
  for &b in bytes {
    match b {
      b'"' => out.push_str("\\\""),
      b'\\' => out.push_str("\\\\"),
      b'\n' => out.push_str("\\n"),
      b'\t' => out.push_str("\\t"),
      0x20..=0x7e => out.push(b as char),
      _ => out.push_str(&format!("\\{b:03o}")),
    }
  }
  out
}

/// Generate every function in `unit`, then globals and the string pool.
/// Skips generation entirely if the caller already observed a checker
/// error, per spec.md §7.
pub fn generate<'a>(w: &mut impl Write, unit: &TranslationUnit<'a>, outermost: Scope<'a>) -> io::Result<()> {
  let mut gen = Generator::new();
  for func in &unit.functions {
    let frame_size = crate::alloc::allocate_function(func);
    log::debug!("generating {} (frame size {frame_size})", func.symbol.borrow().name);
    gen.generate_function(w, func, frame_size)?;
  }
  gen.emit_globals_and_strings(w, outermost)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::Parser;
  use crate::types::tree::Arena;

  fn compile(src: &str) -> String {
    let arena = Arena::new();
    let mut p = Parser::new(src, &arena);
    let unit = p.parse_translation_unit();
    assert_eq!(p.checker.diag.error_count(), 0, "unexpected checker errors for {src:?}");
    let mut out = Vec::new();
    generate(&mut out, &unit, p.checker.outermost()).unwrap();
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn global_scalar_emits_comm() {
    let asm = compile("int x;");
    assert!(asm.contains(".comm x, 4"));
  }

  #[test]
  fn two_param_function_spills_both_registers() {
    let asm = compile("int f(int a, int b) { return a + b; }");
    assert!(asm.contains("movl %edi, -4(%rbp)"));
    assert!(asm.contains("movl %esi, -8(%rbp)"));
    assert!(asm.contains(".set f.size, 16"));
    assert!(asm.contains(".globl f"));
    assert!(asm.contains("jmp f.exit"));
  }

  #[test]
  fn for_loop_uses_jge_against_literal() {
    let asm = compile("int main(void) { int i; for (i = 0; i < 10; i = i + 1) { } return 0; }");
    assert!(asm.contains("cmpl $10, -4(%rbp)"));
    assert!(asm.contains("jge"));
  }

  #[test]
  fn if_else_emits_two_labels_and_both_calls() {
    let asm = compile("int f(void); int g(void); int h(void) { if (f() == 0) f(); else g(); return 0; }");
    assert!(asm.contains("call f"));
    assert!(asm.contains("call g"));
    assert!(asm.contains("je") || asm.contains("jne"));
  }

  #[test]
  fn string_literal_operand_is_interned_by_content() {
    let arena = Arena::new();
    let mut p = Parser::new("int f(void) { return 0; }", &arena);
    p.parse_translation_unit();
    let mut gen = Generator::new();
    let e1 = p.checker.check_string(b"hi");
    let e2 = p.checker.check_string(b"hi");
    assert_eq!(gen.operand(e1), gen.operand(e2));
  }
}
