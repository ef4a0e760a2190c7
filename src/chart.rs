//! Sparkline charts: a filled line plot with no axes, ticks or border,
//! rendered as SVG and embedded as a base64 `data:` URI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write;

const WIDTH: f64 = 400.0;
const HEIGHT: f64 = 80.0;
const STROKE: &str = "#1f77b4";

/// Plot coordinates for every value, x spread evenly, y flipped so higher is up
fn points(series: &[f64]) -> Vec<(f64, f64)> {
    let (min, max) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    let step = if series.len() > 1 {
        WIDTH / (series.len() - 1) as f64
    } else {
        0.0
    };

    series
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let y = if span > 0.0 {
                HEIGHT - (v - min) / span * HEIGHT
            } else {
                HEIGHT / 2.0
            };
            (i as f64 * step, y)
        })
        .collect()
}

pub fn sparkline_svg(series: &[f64]) -> Option<String> {
    if series.is_empty() {
        return None;
    }

    let mut line = String::new();
    for (x, y) in points(series) {
        let _ = write!(line, "{x:.1},{y:.1} ");
    }
    let line = line.trim_end();
    let last_x = if series.len() > 1 { WIDTH } else { 0.0 };

    Some(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" preserveAspectRatio="none"><polygon points="0,{h} {line} {last_x},{h}" fill="{c}" fill-opacity="0.1" stroke="none"/><polyline points="{line}" fill="none" stroke="{c}" stroke-width="1"/></svg>"#,
        w = WIDTH,
        h = HEIGHT,
        c = STROKE,
    ))
}

/// `data:` URI for an `<img src=...>`, or `None` for an empty series
pub fn sparkline_data_uri(series: &[f64]) -> Option<String> {
    let svg = sparkline_svg(series)?;
    Some(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}
