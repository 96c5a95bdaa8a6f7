//! basketforge: market basket analysis over retail transactions
//!
//! This is the main entrypoint: it parses arguments, sets up logging and
//! reports on the stages run by [`basketforge::workflow`].

use std::time::Instant;

use anyhow::Result;
use basketforge::{viz, workflow, AppConfig, Args, Command, MineOptions, MineSummary, MiningOutcome};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load_or_default(args.config.as_deref())?;

    match &args.command {
        Command::Clean { input, output } => {
            let start = Instant::now();
            let rows = workflow::clean(&config, input.as_deref(), output.as_deref())?;
            let output = output.as_deref().unwrap_or(&config.paths.cleaned);
            println!(
                "✓ Cleaned data saved to {} ({} rows, {:.2}s)",
                output.display(),
                rows,
                start.elapsed().as_secs_f64()
            );
        }
        Command::Load { input, db } => {
            let start = Instant::now();
            let loaded = workflow::load(&config, input.as_deref(), db.as_deref())?;
            let db = db.as_deref().unwrap_or(&config.database.path);
            println!(
                "✓ Loaded {} transactions into {} ({:.2}s)",
                loaded,
                db.display(),
                start.elapsed().as_secs_f64()
            );
        }
        Command::Mine { options } => {
            let start = Instant::now();
            let summary = workflow::mine(&config, options)?;
            report_mining(&summary, options, start)?;
        }
        Command::Export { db, out_dir, rules } => {
            let rules = rules.clone().or_else(|| workflow::default_rules(&config));
            workflow::export(&config, db.as_deref(), out_dir.as_deref(), rules.as_deref())?;
            let out_dir = out_dir.as_deref().unwrap_or(&config.paths.processed_dir);
            println!("✓ BI data exported to {}", out_dir.display());
        }
        Command::Run { options } => run_full_pipeline(&config, options)?,
    }

    Ok(())
}

fn report_mining(summary: &MineSummary, options: &MineOptions, start: Instant) -> Result<()> {
    match (&summary.outcome, &summary.rules_path) {
        (MiningOutcome::Rules(report), Some(path)) => {
            println!(
                "✓ Generated {} association rules and saved to {} ({:.2}s)",
                report.rules.len(),
                path.display(),
                start.elapsed().as_secs_f64()
            );
            match &options.chart {
                Some(chart) => viz::generate_visualization_report(report, chart)?,
                None => viz::print_rule_statistics(report),
            }
        }
        (MiningOutcome::Empty(reason), _) => println!("No rules written: {reason}"),
        (MiningOutcome::Rules(_), None) => {}
    }
    Ok(())
}

fn run_full_pipeline(config: &AppConfig, options: &MineOptions) -> Result<()> {
    println!("=== Market Basket Pipeline ===\n");
    let start = Instant::now();

    let summary = workflow::run_pipeline(config, options)?;
    println!(
        "✓ Cleaned {} rows and loaded {} transactions",
        summary.cleaned_rows, summary.loaded_rows
    );
    report_mining(&summary.mine, options, start)?;
    println!("✓ BI data exported to {}", summary.bi_dir.display());

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start.elapsed().as_secs_f64());
    if summary.mine.rules_path.is_none() {
        println!("No association rules were exported");
    }
    Ok(())
}
