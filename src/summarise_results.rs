/*
cargo run --release --bin summarise_results -- results/gpt-4-1-nano
cargo run --release --bin summarise_results -- results/gpt-4-1-nano-v2/results.jsonl --output summary.json
*/

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};

use emotion_bench::{results::read_records, RunLayout, Summary};

#[derive(Parser, Debug)]
#[command(version, author, about = "Accuracy summary of one run's results.jsonl")]
struct Cli {
    /// Run directory or results JSONL file
    input: PathBuf,

    /// Also write the summary as pretty JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = if cli.input.is_dir() {
        RunLayout::at(&cli.input).results_path()
    } else {
        cli.input.clone()
    };
    if !path.exists() {
        anyhow::bail!("no results file found at {}", path.display());
    }

    let records = read_records(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let summary = Summary::from_records(&records);

    println!("Results summary for {}:", path.display());
    for line in summary.lines() {
        println!("  {line}");
    }

    if let Some(out) = &cli.output {
        fs::write(out, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("summary written to {}", out.display());
    }
    Ok(())
}
