//! One-shot runs: the bot cycle (commands, then feeds) and the daily report.
//!
//! Each run loads the documents once, threads explicit snapshots through the
//! components and persists whatever changed at the end.

use crate::commands;
use crate::config::{Config, ConfigError};
use crate::feeds::{self, FeedSource};
use crate::network::{FetchError, HttpEngine};
use crate::report;
use crate::resolver::PageFetcher;
use crate::store::{Store, StoreError};
use crate::telegram::{deliver, Messenger, Notifier, UpdateSource};
use chrono::Utc;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("HTTP client: {0}")]
    Client(#[from] FetchError),
    #[error("Telegram client: {0}")]
    Telegram(#[from] reqwest::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub updates: usize,
    pub replies_sent: usize,
    pub notifications_sent: usize,
    pub feeds_failed: usize,
}

/// Commands first, then feeds, against the documents in `store`
pub async fn run_cycle<W, T>(web: &W, telegram: &T, store: &Store) -> Result<CycleSummary, AppError>
where
    W: PageFetcher + FeedSource,
    T: UpdateSource + Notifier,
{
    let registry = store.load_channels();
    let feed_state = store.load_feed_state();
    let bot_state = store.load_bot_state();
    let mut summary = CycleSummary::default();

    let updates = match telegram.fetch_updates(bot_state.last_update_id + 1).await {
        Ok(updates) => updates,
        Err(e) => {
            log::error!("Failed to fetch updates: {e}");
            Vec::new()
        }
    };
    summary.updates = updates.len();

    let outcome = commands::process(web, &updates, &registry, &bot_state).await;
    if outcome.changed {
        store.save_channels(&outcome.registry)?;
        store.save_bot_state(&outcome.bot_state)?;
    }
    summary.replies_sent = deliver(telegram, &outcome.replies).await;

    let check = feeds::check(
        web,
        &outcome.registry,
        &feed_state,
        &outcome.bot_state.subscribers,
    )
    .await;
    summary.feeds_failed = check.failures.len();
    summary.notifications_sent = deliver(telegram, &check.notifications).await;
    if check.changed {
        store.save_feed_state(&check.feed_state)?;
    }

    Ok(summary)
}

pub async fn run_bot(config: &Config) -> Result<CycleSummary, AppError> {
    let token = config.token()?;
    let telegram = Messenger::new(token)?;
    let web = HttpEngine::new()?;
    let store = Store::new(&config.data_dir);

    let summary = run_cycle(&web, &telegram, &store).await?;
    log::info!(
        "Cycle done: {} updates, {} replies, {} notifications, {} feeds failed",
        summary.updates,
        summary.replies_sent,
        summary.notifications_sent,
        summary.feeds_failed
    );
    Ok(summary)
}

pub async fn run_report(config: &Config) -> Result<PathBuf, AppError> {
    let web = HttpEngine::new()?;
    let store = Store::new(&config.data_dir);

    let data = report::gather(
        &web,
        &store.load_channels(),
        &store.load_feed_state(),
        &store.load_portfolio(),
        Utc::now(),
    )
    .await;

    let path = report::write(&config.reports_dir, &data)?;
    log::info!("Wrote report: {}", path.display());
    Ok(path)
}
