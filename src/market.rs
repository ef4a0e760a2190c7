//! Market data - closing price series from the Yahoo Finance chart API.

use crate::consts::market;
use crate::network::FetchError;
use crate::store::Portfolio;
use serde::Deserialize;

pub trait PriceSource {
    /// Time-ordered closing prices for `ticker` over `period`, sampled every `interval`
    async fn price_series(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<f64>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Closing prices from a chart response body, gaps dropped
pub fn parse_closes(body: &str) -> Result<Vec<f64>, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        return Err(FetchError::Market(format!(
            "{} - {}",
            error.code, error.description
        )));
    }

    let quote = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|data| data.indicators.quote.into_iter().next())
        .ok_or(FetchError::Empty)?;

    Ok(quote.close.into_iter().flatten().filter(|v| v.is_finite()).collect())
}

/// Recent series and its latest value; an empty series means the fetch failed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSnapshot {
    pub series: Vec<f64>,
}

impl PriceSnapshot {
    pub fn last(&self) -> Option<f64> {
        self.series.last().copied()
    }
}

pub async fn snapshot<S: PriceSource>(
    source: &S,
    ticker: &str,
    period: &str,
) -> PriceSnapshot {
    match source.price_series(ticker, period, market::INTERVAL).await {
        Ok(series) => {
            log::debug!("{ticker}: {} points", series.len());
            PriceSnapshot { series }
        }
        Err(e) => {
            log::warn!("No prices for {ticker}: {e}");
            PriceSnapshot::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetalQuote {
    pub name: &'static str,
    pub ticker: &'static str,
    pub prices: PriceSnapshot,
}

pub async fn fetch_metals<S: PriceSource>(source: &S) -> Vec<MetalQuote> {
    let mut quotes = Vec::with_capacity(market::METALS.len());
    for &(name, ticker) in market::METALS {
        quotes.push(MetalQuote {
            name,
            ticker,
            prices: snapshot(source, ticker, market::METALS_PERIOD).await,
        });
    }
    quotes
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub ticker: String,
    pub name: String,
    pub qty: f64,
    pub avg: f64,
    pub prices: PriceSnapshot,
}

impl PositionRow {
    /// (last - avg) * qty, when a last price is known
    pub fn profit_loss(&self) -> Option<f64> {
        self.prices.last().map(|last| (last - self.avg) * self.qty)
    }
}

pub async fn portfolio_snapshot<S: PriceSource>(source: &S, portfolio: &Portfolio) -> Vec<PositionRow> {
    let mut rows = Vec::with_capacity(portfolio.len());
    for (ticker, position) in portfolio {
        rows.push(PositionRow {
            ticker: ticker.clone(),
            name: position.name.clone().unwrap_or_else(|| ticker.clone()),
            qty: position.qty,
            avg: position.avg,
            prices: snapshot(source, ticker, market::PORTFOLIO_PERIOD).await,
        });
    }
    rows
}
