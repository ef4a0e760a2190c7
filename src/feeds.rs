//! Feed checker - compares the newest entry of every tracked feed against the
//! last identifier we notified about.

use crate::consts::youtube;
use crate::network::FetchError;
use crate::store::{ChannelRegistry, FeedState};
use crate::telegram::Outgoing;
use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};
use std::collections::BTreeSet;

pub trait FeedSource {
    async fn fetch_feed(&self, url: &str) -> Result<Feed, FetchError>;
}

/// Newest entry of a feed, reduced to what notifications and reports need
#[derive(Debug, Clone, PartialEq)]
pub struct LatestEntry {
    pub video_id: String,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// An entry newer than the stored state, as listed in the report
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub channel: String,
    pub entry: LatestEntry,
}

pub struct FeedCheck {
    pub feed_state: FeedState,
    pub notifications: Vec<Outgoing>,
    pub changed: bool,
    /// Channels skipped this run, by name
    pub failures: Vec<(String, FetchError)>,
}

/// YouTube video id, then the entry id, then the link
fn video_id(entry: &Entry, link: &str) -> Option<String> {
    let id = entry.id.trim();
    if let Some(video) = id.strip_prefix(youtube::VIDEO_ID_PREFIX) {
        if !video.is_empty() {
            return Some(video.to_string());
        }
    }
    if !id.is_empty() {
        return Some(id.to_string());
    }
    (!link.is_empty()).then(|| link.to_string())
}

pub fn latest_entry(feed: &Feed) -> Option<LatestEntry> {
    let entry = feed.entries.first()?;
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let video_id = video_id(entry, &link)?;
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    Some(LatestEntry {
        video_id,
        title,
        link,
        published: entry.published.or(entry.updated),
    })
}

pub fn notification_text(channel: &str, entry: &LatestEntry) -> String {
    let title = if entry.title.is_empty() {
        "No title"
    } else {
        &entry.title
    };
    format!("🔔 New video from {}\n{}\n{}", channel, title, entry.link)
}

async fn poll<S: FeedSource>(source: &S, url: &str) -> Result<LatestEntry, FetchError> {
    let feed = source.fetch_feed(url).await?;
    latest_entry(&feed).ok_or(FetchError::Empty)
}

/// Check every tracked feed. Names are compared against the input snapshot,
/// so names sharing a feed URL each notify. The input state is left
/// untouched; the updated copy comes back in the result.
pub async fn check<S: FeedSource>(
    source: &S,
    registry: &ChannelRegistry,
    feed_state: &FeedState,
    subscribers: &BTreeSet<i64>,
) -> FeedCheck {
    let mut result = FeedCheck {
        feed_state: feed_state.clone(),
        notifications: Vec::new(),
        changed: false,
        failures: Vec::new(),
    };

    for (name, url) in registry {
        let entry = match poll(source, url).await {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping {name} ({url}): {e}");
                result.failures.push((name.clone(), e));
                continue;
            }
        };

        if feed_state.get(url) == Some(&entry.video_id) {
            log::debug!("{name}: no new video");
            continue;
        }

        log::info!("{name}: new video {}", entry.video_id);
        result.feed_state.insert(url.clone(), entry.video_id.clone());
        result.changed = true;

        let text = notification_text(name, &entry);
        result.notifications.extend(
            subscribers
                .iter()
                .map(|&chat_id| Outgoing::new(chat_id, text.clone())),
        );
    }

    result
}

/// Entries newer than the stored state, without recording them
pub async fn collect_new<S: FeedSource>(
    source: &S,
    registry: &ChannelRegistry,
    feed_state: &FeedState,
) -> Vec<NewVideo> {
    let mut videos = Vec::new();
    for (name, url) in registry {
        match poll(source, url).await {
            Ok(entry) if feed_state.get(url) != Some(&entry.video_id) => videos.push(NewVideo {
                channel: name.clone(),
                entry,
            }),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping {name} ({url}): {e}"),
        }
    }
    videos
}
