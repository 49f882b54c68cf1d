// SPDX-License-Identifier: (MIT OR Apache-2.0)

extern crate rulesig;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use rulesig::{EngineConfig, EngineCtx, ParseOutcome};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a ruleset file, one rule per line.
    ruleset_path: PathBuf,
    /// Reject deprecated keywords instead of warning on them.
    #[arg(long)]
    strict: bool,
    /// Log at debug level instead of the default (warn).
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    simple_logger::SimpleLogger::new().with_level(level).init().context("failed to init logger")?;

    let text = fs::read_to_string(&args.ruleset_path)
        .with_context(|| format!("reading {:?}", args.ruleset_path))?;

    let mut engine = EngineCtx::new(EngineConfig { strict: args.strict });

    let mut parsed = 0usize;
    let mut skipped = 0usize;
    let mut dropped = 0usize;
    let mut failed = 0usize;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match engine.parse_rule(line) {
            Ok(ParseOutcome::Parsed(())) => parsed += 1,
            Ok(ParseOutcome::SilentSkip(_)) => skipped += 1,
            Ok(ParseOutcome::DuplicateDropped) => dropped += 1,
            Err(e) => {
                failed += 1;
                eprintln!("{}:{}: {e}", args.ruleset_path.display(), lineno + 1);
            }
        }
    }

    println!(
        "{parsed} parsed, {skipped} silently skipped, {dropped} duplicates dropped, {failed} failed ({} signatures loaded)",
        engine.signatures().len()
    );

    if failed > 0 {
        bail!("{failed} rule(s) failed to parse");
    }

    Ok(())
}
