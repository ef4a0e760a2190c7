//! HTTP engine shared by the resolver, the feed checker and the market client.

use crate::consts::{headers, limits};
use crate::feeds::FeedSource;
use crate::market::{self, PriceSource};
use crate::resolver::PageFetcher;
use feed_rs::model::Feed;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Status: {0}")]
    Status(StatusCode),
    #[error("Feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Market: {0}")]
    Market(String),
    #[error("Empty")]
    Empty,
}

pub struct HttpEngine {
    client: Client,
}

impl HttpEngine {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(headers::USER_AGENT)
            .timeout(Duration::from_secs(limits::REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }
        Ok(res.bytes().await?.to_vec())
    }
}

impl PageFetcher for HttpEngine {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("Fetching page {url}");
        let res = self
            .client
            .get(url)
            .header(ACCEPT, headers::ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, headers::ACCEPT_LANG)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }
        Ok(res.text().await?)
    }
}

impl FeedSource for HttpEngine {
    async fn fetch_feed(&self, url: &str) -> Result<Feed, FetchError> {
        log::debug!("Fetching feed {url}");
        let bytes = self.get_bytes(url).await?;
        Ok(feed_rs::parser::parse(&bytes[..])?)
    }
}

impl PriceSource for HttpEngine {
    async fn price_series(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<f64>, FetchError> {
        let url = format!("{}/{}", crate::consts::market::CHART_URL, ticker);
        log::debug!("Fetching {period}/{interval} series for {ticker}");

        let res = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }
        market::parse_closes(&res.text().await?)
    }
}
