//! Hand-rolled scanner producing a [`Token`] stream for the [`crate::parser`].
//!
//! Out of the core's concern per the design (the parser only ever sees
//! `(TokKind, text)` pairs and doesn't care how they were produced), but a
//! complete crate has to implement one.

use std::iter::Peekable;
use std::str::Chars;

/// The kind of a scanned token. `Other` carries single-character operators
/// and punctuation verbatim (returned "as their character code" per the
/// token-stream contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
  Done,
  Ident,
  Number,
  StringLit,
  CharLit,
  Int,
  Char,
  Long,
  Void,
  If,
  Else,
  While,
  For,
  Return,
  Sizeof,
  Or,
  And,
  Eql,
  Neq,
  Leq,
  Geq,
  Other(char),
}

/// A single scanned token: its kind, its raw source text (unescaped for
/// string/char literals), and its source position for diagnostics.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokKind,
  pub text: String,
  pub line: u32,
  pub col: u32,
}

impl Token {
  #[must_use]
  pub fn is_done(&self) -> bool { matches!(self.kind, TokKind::Done) }
}

/// Unescape a C string/char literal body (without surrounding quotes) into
/// its raw byte sequence. Recognizes `\n \t \r \0 \\ \' \"`; any other
/// `\x` escape passes `x` through unchanged (an Open Question in the
/// original design, resolved here for definiteness — see DESIGN.md).
#[must_use]
pub fn unescape(s: &str) -> Vec<u8> {
  let mut out = Vec::with_capacity(s.len());
  let mut chars = s.chars().peekable();
  while let Some(c) = chars.next() {
    if c == '\\' {
      match chars.next() {
        Some('n') => out.push(b'\n'),
        Some('t') => out.push(b'\t'),
        Some('r') => out.push(b'\r'),
        Some('0') => out.push(0),
        Some('\\') => out.push(b'\\'),
        Some('\'') => out.push(b'\''),
        Some('"') => out.push(b'"'),
        Some(other) => {
          let mut buf = [0u8; 4];
          out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
        }
        None => {}
      }
    } else {
      let mut buf = [0u8; 4];
      out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
  }
  out
}

/// The scanner. Holds the remaining input and the current line/column.
pub struct Lexer<'a> {
  chars: Peekable<Chars<'a>>,
  line: u32,
  col: u32,
}

fn keyword(s: &str) -> Option<TokKind> {
  Some(match s {
    "int" => TokKind::Int,
    "char" => TokKind::Char,
    "long" => TokKind::Long,
    "void" => TokKind::Void,
    "if" => TokKind::If,
    "else" => TokKind::Else,
    "while" => TokKind::While,
    "for" => TokKind::For,
    "return" => TokKind::Return,
    "sizeof" => TokKind::Sizeof,
    _ => return None,
  })
}

impl<'a> Lexer<'a> {
  #[must_use]
  pub fn new(src: &'a str) -> Self {
    Self { chars: src.chars().peekable(), line: 1, col: 1 }
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.chars.next()?;
    if c == '\n' { self.line += 1; self.col = 1; } else { self.col += 1; }
    Some(c)
  }

  fn peek(&mut self) -> Option<char> { self.chars.peek().copied() }

  fn skip_trivia(&mut self) {
    loop {
      match self.peek() {
        Some(c) if c.is_whitespace() => { self.bump(); }
        Some('/') => {
          let mut clone = self.chars.clone();
          clone.next();
          match clone.next() {
            Some('/') => { while !matches!(self.peek(), None | Some('\n')) { self.bump(); } }
            Some('*') => {
              self.bump(); self.bump();
              loop {
                match self.bump() {
                  None => break,
                  Some('*') if self.peek() == Some('/') => { self.bump(); break }
                  _ => {}
                }
              }
            }
            _ => break,
          }
        }
        _ => break,
      }
    }
  }

  /// Scan and return the next token.
  pub fn next_token(&mut self) -> Token {
    self.skip_trivia();
    let (line, col) = (self.line, self.col);
    let Some(c) = self.peek() else {
      return Token { kind: TokKind::Done, text: String::new(), line, col };
    };
    if c.is_ascii_digit() {
      return self.scan_number(line, col);
    }
    if c == '_' || c.is_alphabetic() {
      return self.scan_ident(line, col);
    }
    if c == '"' {
      return self.scan_string(line, col);
    }
    if c == '\'' {
      return self.scan_char(line, col);
    }
    self.scan_operator(line, col)
  }

  fn scan_number(&mut self, line: u32, col: u32) -> Token {
    let mut text = String::new();
    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
      text.push(self.bump().unwrap());
    }
    Token { kind: TokKind::Number, text, line, col }
  }

  fn scan_ident(&mut self, line: u32, col: u32) -> Token {
    let mut text = String::new();
    while matches!(self.peek(), Some(c) if c == '_' || c.is_alphanumeric()) {
      text.push(self.bump().unwrap());
    }
    let kind = keyword(&text).unwrap_or(TokKind::Ident);
    Token { kind, text, line, col }
  }

  fn scan_string(&mut self, line: u32, col: u32) -> Token {
    self.bump();
    let mut text = String::new();
    loop {
      match self.bump() {
        None | Some('"') => break,
        Some('\\') => {
          text.push('\\');
          if let Some(e) = self.bump() { text.push(e); }
        }
        Some(c) => text.push(c),
      }
    }
    Token { kind: TokKind::StringLit, text, line, col }
  }

  fn scan_char(&mut self, line: u32, col: u32) -> Token {
    self.bump();
    let mut text = String::new();
    loop {
      match self.bump() {
        None | Some('\'') => break,
        Some('\\') => {
          text.push('\\');
          if let Some(e) = self.bump() { text.push(e); }
        }
        Some(c) => text.push(c),
      }
    }
    Token { kind: TokKind::CharLit, text, line, col }
  }

  fn scan_operator(&mut self, line: u32, col: u32) -> Token {
    let c = self.bump().unwrap();
    macro_rules! two {
      ($snd:expr, $kind:expr, $text:expr) => {
        if self.peek() == Some($snd) {
          self.bump();
          return Token { kind: $kind, text: $text.into(), line, col };
        }
      };
    }
    match c {
      '|' => two!('|', TokKind::Or, "||"),
      '&' => two!('&', TokKind::And, "&&"),
      '=' => two!('=', TokKind::Eql, "=="),
      '!' => two!('=', TokKind::Neq, "!="),
      '<' => two!('=', TokKind::Leq, "<="),
      '>' => two!('=', TokKind::Geq, ">="),
      _ => {}
    }
    Token { kind: TokKind::Other(c), text: c.to_string(), line, col }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<TokKind> {
    let mut lx = Lexer::new(src);
    let mut out = Vec::new();
    loop {
      let t = lx.next_token();
      if t.is_done() { break; }
      out.push(t.kind);
    }
    out
  }

  #[test]
  fn scans_keywords_and_operators() {
    let ks = kinds("int x = 1 && 2 != 3;");
    assert_eq!(ks, vec![
      TokKind::Int, TokKind::Ident, TokKind::Other('='), TokKind::Number,
      TokKind::And, TokKind::Number, TokKind::Neq, TokKind::Number, TokKind::Other(';'),
    ]);
  }

  #[test]
  fn skips_comments() {
    let ks = kinds("int /* c */ x; // trailing\n");
    assert_eq!(ks, vec![TokKind::Int, TokKind::Ident, TokKind::Other(';')]);
  }

  #[test]
  fn unescapes_known_sequences() {
    assert_eq!(unescape(r"a\nb\0"), b"a\nb\0".to_vec());
  }
}
