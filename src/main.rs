//! Vanity address searcher for deployments using Nick's method.
//!
//! Usage:
//!   nick search --initcode 0x6061... --prefix 0x0000 --suffix 0xaaaa
//!   nick build --initcode 0x6061... --sig-s 0x1f2e3d
//!   nick print tx.json

use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nick_vanity::config::{Cli, Command, ConfigError, SearchArgs};
use nick_vanity::report::{load_tx_file, DeploymentInfo, ReportError};
use nick_vanity::tx::TxJson;
use nick_vanity::worker::{Finding, PoolError, WorkerPool};

/// How often the main thread wakes to notice a stop request.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Report(#[from] ReportError),

    #[error("{0}")]
    Pool(#[from] PoolError),

    #[error("failed to encode tx: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Search(args) => search(args),
        Command::Build(args) => build(args),
        Command::Print { file } => print(file),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .init();
}

fn search(args: &SearchArgs) -> Result<(), CliError> {
    let config = args.to_search_config()?;
    let target = config.target();

    println!("Nick's Method Vanity Search");
    println!("===========================");
    println!("Prefix:     0x{}", hex::encode(target.prefix()));
    println!("Suffix:     0x{}", hex::encode(target.suffix()));
    println!("Matching:   {}", target.policy());
    println!("Min score:  {} of {}", config.min_score, target.max_score());
    println!("Difficulty: {}", target.difficulty_description(config.min_score));
    println!("Reseed:     {}", config.reseed);
    println!("Workers:    {}", config.threads);
    println!();

    let pool = WorkerPool::spawn(config)?;
    ctrlc_handler(pool.stop_flag_clone());

    println!("Searching... (Press Ctrl+C to stop)\n");

    while !pool.is_stopped() {
        if let Some(finding) = pool.wait_for_finding(POLL_INTERVAL) {
            print_finding(&finding)?;
        }
    }

    info!("stopped by user");
    println!("\n--- Final Statistics ---");
    println!("Total attempts:  {}", format_number(pool.stats().total_attempts()));
    println!("Findings:        {}", pool.stats().findings());
    println!("Dropped:         {}", pool.stats().dropped_findings());
    println!("Best score:      {}", pool.stats().highscore());
    println!("Time elapsed:    {:.2}s", pool.elapsed().as_secs_f64());
    println!(
        "Average speed:   {}/s",
        format_number(pool.attempts_per_second() as u64)
    );

    pool.join();
    Ok(())
}

fn build(args: &SearchArgs) -> Result<(), CliError> {
    let config = args.to_search_config()?;
    let tx = config.deploy_tx().map_err(ReportError::from)?;
    let info = DeploymentInfo::from_tx(tx)?;
    println!("{}", info);
    Ok(())
}

fn print(file: &Path) -> Result<(), CliError> {
    let info = DeploymentInfo::from_tx(load_tx_file(file)?)?;
    println!("Sender: {}", info.sender);
    println!("Address: {}", info.address);
    Ok(())
}

fn print_finding(finding: &Finding) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&TxJson::from(&finding.tx))?;
    if finding.new_highscore {
        println!("New highscore: {}", finding.score);
    } else {
        println!("Score: {}", finding.score);
    }
    println!("Sender: {}", finding.sender);
    println!("Address: {}", finding.address);
    println!("Worker: {}", finding.worker_id);
    println!("Tx:\n{}\n", json);
    Ok(())
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    if let Err(err) = ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    }) {
        warn!(%err, "failed to install Ctrl-C handler, kill the process to stop");
    }
}
