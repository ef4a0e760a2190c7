//! ytwatch - YouTube upload notifier for Telegram, plus a daily HTML report.
//! Runs once per invocation; schedule it externally.

mod app;
mod chart;
mod commands;
mod config;
mod consts;
mod feeds;
mod market;
mod network;
mod report;
mod resolver;
mod store;
mod telegram;
mod utils;

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ytwatch", version, about = "YouTube feed notifier for Telegram")]
struct Cli {
    /// Directory holding the JSON documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output directory for reports
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Cmd {
    /// Process pending bot commands, then check feeds and notify (default)
    #[default]
    Run,
    /// Write the daily HTML report
    Report,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.reports_dir {
        config.reports_dir = dir;
    }

    let command = cli.command.unwrap_or_default();
    log::info!("ytwatch {:?} (data in {})", command, config.data_dir.display());

    let result = match command {
        Cmd::Run => app::run_bot(&config).await.map(|_| ()),
        Cmd::Report => app::run_report(&config).await.map(|_| ()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
