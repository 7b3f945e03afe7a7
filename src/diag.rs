//! The diagnostic sink: a formatted-error reporter carrying an error count.
//!
//! Kept deliberately dumb (plain `eprintln!`, no `tracing`/`log` use here —
//! those are reserved for developer-facing instrumentation, see
//! `debug!`/`trace!` calls in [`crate::parser`] and [`crate::codegen`])
//! because its output is a user-facing contract (spec §7 exact message
//! text), not a log stream.

use crate::lexer::Token;

/// Accumulates semantic errors and terminates on the first syntax error.
#[derive(Default)]
pub struct Diagnostics {
  errors: u32,
}

impl Diagnostics {
  #[must_use]
  pub fn new() -> Self { Self::default() }

  /// Number of semantic errors reported so far.
  #[must_use]
  pub fn error_count(&self) -> u32 { self.errors }

  #[must_use]
  pub fn has_errors(&self) -> bool { self.errors > 0 }

  /// Report a non-fatal semantic error. `%s` in `fmt` is substituted by
  /// `arg`, matching the `report(format, arg?)` contract.
  pub fn report(&mut self, fmt: &str, arg: Option<&str>) {
    let msg = match arg {
      Some(a) => fmt.replacen("%s", a, 1),
      None => fmt.to_string(),
    };
    eprintln!("{msg}");
    self.errors += 1;
  }

  /// Terminate the process on a fatal syntax error. Never returns.
  pub fn syntax_error(&self, tok: &Token) -> ! {
    if tok.is_done() {
      eprintln!("syntax error at end of file");
    } else {
      eprintln!("syntax error at '{}'", tok.text);
    }
    std::process::exit(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn substitutes_one_placeholder() {
    let mut d = Diagnostics::new();
    d.report("redefinition of '%s'", Some("foo"));
    assert_eq!(d.error_count(), 1);
  }

  #[test]
  fn counts_without_placeholder() {
    let mut d = Diagnostics::new();
    d.report("invalid return type", None);
    d.report("lvalue required in expression", None);
    assert_eq!(d.error_count(), 2);
  }
}
