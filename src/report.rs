//! Daily report - a single self-contained HTML page with three tabs:
//! new videos, portfolio positions and metals.

use crate::chart::sparkline_data_uri;
use crate::feeds::{self, FeedSource, NewVideo};
use crate::market::{self, MetalQuote, PositionRow, PriceSource};
use crate::store::{ChannelRegistry, FeedState, Portfolio, StoreError};
use crate::utils::{escape_html, format_price, format_qty};
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

const STYLE: &str = "body{font-family:Arial;padding:10px} .tabs{display:flex;gap:8px;margin-bottom:10px}.tab{padding:8px 12px;background:#eee;border-radius:6px;cursor:pointer}.tab.active{background:#2b8aef;color:#fff}.panel{display:none}.panel.active{display:block} table{width:100%;border-collapse:collapse} th,td{border:1px solid #ddd;padding:8px;text-align:left}";

const SCRIPT: &str = "document.querySelectorAll('.tab').forEach(t=>t.addEventListener('click',function(){document.querySelectorAll('.tab').forEach(x=>x.classList.remove('active'));document.querySelectorAll('.panel').forEach(p=>p.classList.remove('active'));this.classList.add('active');document.getElementById(this.getAttribute('data-tab')).classList.add('active');}));";

pub struct ReportData {
    pub generated: DateTime<Utc>,
    pub videos: Vec<NewVideo>,
    pub positions: Vec<PositionRow>,
    pub metals: Vec<MetalQuote>,
}

/// Fetch everything the report shows. Feed state is only read.
pub async fn gather<S: FeedSource + PriceSource>(
    source: &S,
    registry: &ChannelRegistry,
    feed_state: &FeedState,
    portfolio: &Portfolio,
    generated: DateTime<Utc>,
) -> ReportData {
    let videos = feeds::collect_new(source, registry, feed_state).await;
    log::info!("{} channels with new videos", videos.len());
    let metals = market::fetch_metals(source).await;
    let positions = market::portfolio_snapshot(source, portfolio).await;

    ReportData {
        generated,
        videos,
        positions,
        metals,
    }
}

fn trend_img(series: &[f64], alt: &str) -> String {
    sparkline_data_uri(series)
        .map(|uri| format!(r#"<img src="{uri}" alt="{alt}"/>"#))
        .unwrap_or_default()
}

fn videos_panel(html: &mut String, videos: &[NewVideo]) {
    html.push_str(r#"<div id="yt" class="panel active">"#);
    if videos.is_empty() {
        html.push_str("<p>No new videos since last run.</p>");
    } else {
        html.push_str("<h3>New Videos</h3><table><tr><th>Channel</th><th>Title</th><th>Published</th></tr>");
        for v in videos {
            let published = v
                .entry
                .published
                .map(|p| p.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_default();
            let _ = write!(
                html,
                r#"<tr><td>{}</td><td><a href="{}" target="_blank">{}</a></td><td>{}</td></tr>"#,
                escape_html(&v.channel),
                escape_html(&v.entry.link),
                escape_html(&v.entry.title),
                published
            );
        }
        html.push_str("</table>");
    }
    html.push_str("</div>");
}

fn portfolio_panel(html: &mut String, positions: &[PositionRow]) {
    html.push_str(r#"<div id="inv" class="panel"><h3>Portfolio</h3>"#);
    if positions.is_empty() {
        html.push_str("<p>No stocks in portfolio.</p>");
    } else {
        html.push_str("<table><tr><th>Ticker</th><th>Name</th><th>Qty</th><th>Avg</th><th>Last</th><th>P/L</th><th>Trend</th></tr>");
        for row in positions {
            let pl = row
                .profit_loss()
                .map(|pl| format!("{pl:.2}"))
                .unwrap_or_default();
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&row.ticker),
                escape_html(&row.name),
                format_qty(row.qty),
                row.avg,
                format_price(row.prices.last()),
                pl,
                trend_img(&row.prices.series, "trend")
            );
        }
        html.push_str("</table>");
    }
    html.push_str("</div>");
}

fn metals_panel(html: &mut String, metals: &[MetalQuote]) {
    html.push_str(r#"<div id="met" class="panel">"#);
    for m in metals {
        let _ = write!(
            html,
            "<h4>{} ({}) — Last: {}</h4>{}",
            m.name,
            m.ticker,
            format_price(m.prices.last()),
            trend_img(&m.prices.series, m.name)
        );
    }
    html.push_str("</div>");
}

pub fn build_html(data: &ReportData) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!doctype html><html><head><meta charset=\"utf-8\"><title>Daily Report</title>");
    let _ = write!(html, "<style>{STYLE}</style></head><body>");
    let _ = write!(
        html,
        "<h2>Daily Report — {}</h2>",
        data.generated.format("%Y-%m-%d %H:%M UTC")
    );
    html.push_str(r#"<div class="tabs"><div class="tab active" data-tab="yt">YouTube</div><div class="tab" data-tab="inv">Investments</div><div class="tab" data-tab="met">Metals</div></div>"#);

    videos_panel(&mut html, &data.videos);
    portfolio_panel(&mut html, &data.positions);
    metals_panel(&mut html, &data.metals);

    let _ = write!(html, "<script>{SCRIPT}</script></body></html>");
    html
}

pub fn file_name(generated: DateTime<Utc>) -> String {
    format!("report_{}.html", generated.format("%Y%m%d"))
}

/// Write the report under `dir`, creating it if needed
pub fn write(dir: &Path, data: &ReportData) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name(data.generated));
    fs::write(&path, build_html(data)).map_err(|source| StoreError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
