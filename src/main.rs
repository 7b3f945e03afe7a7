//! Thin CLI shell around [`simplec::compile`]: reads Simple C from stdin (or
//! the contract spec.md §6 describes) and writes assembly to stdout or a
//! file.

use std::fs::File;
use std::io::{self, Read, Write};

use anyhow::Context;
use clap::Parser as ClapParser;

/// Compile a Simple C translation unit to SysV AMD64 assembly.
#[derive(ClapParser, Debug)]
#[command(version, about)]
struct Cli {
  /// Write assembly to FILE instead of stdout.
  #[arg(short, long, value_name = "FILE")]
  output: Option<std::path::PathBuf>,

  /// Pretty-print the checked tree to stderr before generating code.
  #[arg(long)]
  emit_ast: bool,

  /// Enable debug-level logging.
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let level = if cli.verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

  let mut source = String::new();
  io::stdin().read_to_string(&mut source).context("reading source from stdin")?;

  if cli.emit_ast {
    let arena = simplec::types::tree::Arena::new();
    let (unit, errors) = simplec::parse(&source, &arena);
    eprintln!("{unit:#?}");
    if errors > 0 { return Ok(()); }
  }

  let mut buf = Vec::new();
  let ok = simplec::compile(&source, &mut buf).context("generating assembly")?;
  if !ok {
    // Semantic errors were already reported to stderr; spec.md §7 keeps
    // this out of the exit code, so fall through to a clean exit.
    return Ok(());
  }

  match cli.output {
    Some(path) => {
      let mut f = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
      f.write_all(&buf).with_context(|| format!("writing {}", path.display()))?;
    }
    None => io::stdout().write_all(&buf).context("writing assembly to stdout")?,
  }
  Ok(())
}
