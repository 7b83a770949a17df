// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use coolz_frontend::{analyze, lex, parse_program, Diagnostic, TokenKind};
use coolz_render::{canonical_program, to_dot, to_json, to_pretty};

#[derive(Parser)]
#[command(name = "coolzc", about = "Front end for COOL class files")]
struct Cli {
    /// Source files, concatenated into one program in argument order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// What to print on success.
    #[arg(long, value_enum, default_value_t = Emit::Check)]
    emit: Emit,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Diagnostics only.
    Check,
    /// The token stream.
    Tokens,
    /// The AST as a debug tree.
    Ast,
    /// The AST as JSON.
    Json,
    /// The AST as a GraphViz digraph.
    Dot,
    /// An indented human-readable dump.
    Pretty,
    /// Canonical re-printed source.
    Canonical,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline; `Ok(false)` means diagnostics were printed and the
/// later stages were skipped.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    // Separators keep tokens from gluing together at file boundaries.
    let mut combined = String::new();
    for (i, path) in cli.files.iter().enumerate() {
        let src = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if i > 0 {
            combined.push_str("\n\n");
        }
        combined.push_str(&src);
    }

    let (tokens, lex_diags) = lex(&combined);
    if cli.emit == Emit::Tokens {
        for token in &tokens {
            if let TokenKind::Tok(tok) = &token.kind {
                println!("{}:{}: {tok}", token.line, token.column);
            }
        }
    }
    if report(&lex_diags) {
        return Ok(false);
    }

    let (program, parse_diags) = parse_program(&tokens);
    if report(&parse_diags) {
        return Ok(false);
    }
    let program = program.context("parser produced no tree")?;

    let semant_diags = analyze(&program);
    if report(&semant_diags) {
        return Ok(false);
    }

    match cli.emit {
        Emit::Check | Emit::Tokens => {}
        Emit::Ast => println!("{program:#?}"),
        Emit::Json => println!("{}", to_json(&program)?),
        Emit::Dot => print!("{}", to_dot(&program)),
        Emit::Pretty => print!("{}", to_pretty(&program)),
        Emit::Canonical => print!("{}", canonical_program(&program)),
    }

    Ok(true)
}

fn report(diags: &[Diagnostic]) -> bool {
    for d in diags {
        eprintln!("{d}");
    }
    !diags.is_empty()
}
