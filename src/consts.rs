//! Static configuration: document names, URL templates, request identity.
//! All strings are &'static str to keep call sites allocation-free.

/// Persisted JSON documents, relative to the data directory
pub mod files {
    pub const CHANNELS: &str = "channels.json";
    pub const FEED_STATE: &str = "yt_state.json";
    pub const BOT_STATE: &str = "tg_state.json";
    pub const PORTFOLIO: &str = "portfolio.json";
}

/// Environment variables read at startup
pub mod env {
    pub const TOKEN: &str = "TELEGRAM_TOKEN";
    pub const DATA_DIR: &str = "YTWATCH_DATA_DIR";
    pub const REPORTS_DIR: &str = "YTWATCH_REPORTS_DIR";

    pub const DEFAULT_DATA_DIR: &str = ".";
    pub const DEFAULT_REPORTS_DIR: &str = "reports";
}

/// YouTube endpoints
pub mod youtube {
    pub const FEED_URL_PREFIX: &str = "https://www.youtube.com/feeds/videos.xml?channel_id=";
    /// Atom entry ids look like `yt:video:<video id>`
    pub const VIDEO_ID_PREFIX: &str = "yt:video:";
    pub const DEFAULT_SCHEME: &str = "https://";
}

/// Market data endpoints and lookback windows
pub mod market {
    pub const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

    pub const PORTFOLIO_PERIOD: &str = "7d";
    pub const METALS_PERIOD: &str = "2d";
    pub const INTERVAL: &str = "1h";

    /// Display name and futures ticker, in report order
    pub static METALS: &[(&str, &str)] = &[("Gold", "GC=F"), ("Silver", "SI=F")];
}

/// HTTP headers for page fetches
pub mod headers {
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0 Safari/537.36";
    pub const ACCEPT_HTML: &str =
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
    pub const ACCEPT_LANG: &str = "en-US,en;q=0.9";
}

/// Limits and thresholds
pub mod limits {
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;
    pub const TELEGRAM_TIMEOUT_SECS: u64 = 60;
    pub const MAX_MESSAGE_LEN: usize = 4000;
}
