/*
cargo run --release --bin emotion_eval -- \
    --input EU.jsonl \
    --model gpt-4.1-nano \
    --limit 50

cargo run --release --bin emotion_eval -- --resume
cargo run --release --bin emotion_eval -- --backend completions --user-id "$AGIR_USER" --test-connection
*/

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;

use emotion_bench::{
    config::{clear_proxy_env, RunArgs, RunConfig},
    load_scenarios, logging, QueryClient, RunLayout, Runner,
};

#[derive(Parser, Debug)]
#[command(version, author, about = "Score a text-generation backend on the emotion-attribution scenarios")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = RunConfig::resolve(cli.run, |k| env::var(k).ok())?;

    // ---------------------------- logger setup ----------------------------
    let log_path = logging::init_file_logger(&cfg.log_dir, &cfg.slot_base())?;
    log::info!("Program started: model={} backend={:?}", cfg.model, cfg.flavor);
    // ---------------------------------------------------------------------

    clear_proxy_env();
    let client = QueryClient::new(cfg.build_backend()?, cfg.retry);

    if cfg.test_connection {
        return match client.probe().await {
            Ok(c) => {
                log::info!("API connection test passed");
                println!("connection ok: status {} in {:.2}s", c.status, c.elapsed.as_secs_f64());
                Ok(())
            }
            Err(e) => {
                log::error!("API connection test failed: {e}");
                bail!("connection test failed: {e} (log {})", log_path.display())
            }
        };
    }

    let data = load_scenarios(&cfg.input)?;
    log::info!("Loaded {} records from {}", data.len(), cfg.input.display());

    let layout = RunLayout::prepare(&cfg.results_root, &cfg.slot_base(), cfg.resume)?;
    log::info!("Progress file: {}", layout.progress_path().display());
    log::info!("Results file: {}", layout.results_path().display());

    let bar = ProgressBar::new(data.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )?);

    let runner = Runner::from_config(client, &layout, &cfg).with_progress(bar);
    let report = runner.run(&data).await?;

    let skipped: Vec<&str> = report.skipped().collect();
    if !skipped.is_empty() {
        log::warn!("{} items skipped: {:?}", skipped.len(), skipped);
    }

    log::info!("Results summary for {}:", cfg.model);
    println!("Results summary for {} ({}):", cfg.model, layout.dir.display());
    for line in report.summary.lines() {
        log::info!("{line}");
        println!("  {line}");
    }
    println!(
        "{} new, {} skipped - log {}",
        report.persisted().count(),
        skipped.len(),
        log_path.display()
    );

    Ok(())
}
