//! Channel resolution - turns user input (channel id, channel URL, handle,
//! custom URL) into a canonical `UC...` channel id.
//!
//! Input that already carries the id is resolved offline. Anything else is
//! fetched once and run through an ordered list of extraction strategies.

use crate::consts::youtube;
use crate::network::FetchError;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;

lazy_static! {
    static ref CANONICAL: Regex = Regex::new(r"^UC[0-9A-Za-z_-]{20,}$").unwrap();
    static ref CHANNEL_PATH: Regex = Regex::new(r"/channel/(UC[0-9A-Za-z_-]{20,})").unwrap();
    static ref CHANNEL_URL: Regex =
        Regex::new(r"^https?://www\.youtube\.com/channel/(UC[0-9A-Za-z_-]{20,})$").unwrap();
    static ref CHANNEL_ID_FIELD: Regex =
        Regex::new(r#""channelId"\s*:\s*"(UC[0-9A-Za-z_-]{20,})""#).unwrap();
    static ref EXTERNAL_ID_FIELD: Regex =
        Regex::new(r#""externalId"\s*:\s*"(UC[0-9A-Za-z_-]{20,})""#).unwrap();
    static ref HREF_SELECTOR: Selector = Selector::parse("[href]").unwrap();
    static ref OG_URL_SELECTOR: Selector = Selector::parse(r#"meta[property="og:url"]"#).unwrap();
}

/// Canonical YouTube channel id (`UC` + at least 20 URL-safe characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Accepts only strings matching the canonical pattern
    pub fn parse(s: &str) -> Option<Self> {
        CANONICAL.is_match(s).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn feed_url(&self) -> String {
        format!("{}{}", youtube::FEED_URL_PREFIX, self.as_str())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of page bodies for the online strategies
pub trait PageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

type Strategy = fn(&str) -> Option<ChannelId>;

/// Extraction strategies over a fetched page, tried in order
static STRATEGIES: &[(&str, Strategy)] = &[
    ("channelId field", from_channel_id_field),
    ("channel link", from_channel_link),
    ("og:url meta", from_og_url),
    ("externalId field", from_external_id_field),
];

fn capture(re: &Regex, text: &str) -> Option<ChannelId> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| ChannelId(m.as_str().to_string()))
}

pub fn from_channel_id_field(html: &str) -> Option<ChannelId> {
    capture(&CHANNEL_ID_FIELD, html)
}

pub fn from_channel_link(html: &str) -> Option<ChannelId> {
    let document = Html::parse_document(html);
    let found = document
        .select(&HREF_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| capture(&CHANNEL_URL, href));
    found
}

pub fn from_og_url(html: &str) -> Option<ChannelId> {
    let document = Html::parse_document(html);
    let found = document
        .select(&OG_URL_SELECTOR)
        .filter_map(|el| el.value().attr("content"))
        .find_map(|content| capture(&CHANNEL_URL, content));
    found
}

pub fn from_external_id_field(html: &str) -> Option<ChannelId> {
    capture(&EXTERNAL_ID_FIELD, html)
}

/// Run every strategy in order, first hit wins
pub fn extract_from_html(html: &str) -> Option<ChannelId> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let id = strategy(html)?;
        log::debug!("Channel id {id} found via {name}");
        Some(id)
    })
}

/// Resolution that never touches the network: a bare id or a `/channel/<id>` path
pub fn resolve_offline(input: &str) -> Option<ChannelId> {
    ChannelId::parse(input).or_else(|| capture(&CHANNEL_PATH, input))
}

/// URL to fetch for input that could not be resolved offline
pub fn page_url(input: &str) -> String {
    if input.contains("://") {
        input.to_string()
    } else if input.starts_with('@') {
        format!("{}www.youtube.com/{}", youtube::DEFAULT_SCHEME, input)
    } else {
        format!("{}{}", youtube::DEFAULT_SCHEME, input)
    }
}

/// Resolve arbitrary user input to a channel id. Fetch failures are logged
/// and reported as `None`.
pub async fn resolve<F: PageFetcher>(fetcher: &F, input: &str) -> Option<ChannelId> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(id) = resolve_offline(input) {
        return Some(id);
    }

    let url = page_url(input);
    let html = match fetcher.fetch_page(&url).await {
        Ok(html) => html,
        Err(e) => {
            log::warn!("Failed to fetch {url} for channel resolution: {e}");
            return None;
        }
    };

    let found = extract_from_html(&html);
    if found.is_none() {
        log::info!("No channel id found on {url}");
    }
    found
}
