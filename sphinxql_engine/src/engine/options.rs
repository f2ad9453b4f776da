use crate::executor::HandleCapabilities;
use serde::Deserialize;

pub const FETCH_MODE_ENV: &str = "SPHINXQL_FETCH_MODE";
pub const LOG_EVENTS_ENV: &str = "SPHINXQL_LOG_EVENTS";

/// How a cursor pulls rows from its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Materialize every row when the cursor is built.
    Buffered,
    /// Pull rows one at a time on demand.
    Streaming,
    /// Buffer when the handle already holds rows client-side, stream otherwise.
    #[default]
    Auto,
}

impl FetchMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "buffered" | "store" => Some(FetchMode::Buffered),
            "streaming" | "stream" => Some(FetchMode::Streaming),
            "auto" => Some(FetchMode::Auto),
            _ => None,
        }
    }

    /// Resolves `Auto` against what the handle supports.
    pub fn buffers_eagerly(self, capabilities: HandleCapabilities) -> bool {
        match self {
            FetchMode::Buffered => true,
            FetchMode::Streaming => false,
            FetchMode::Auto => capabilities.client_buffered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CursorOptions {
    pub fetch_mode: FetchMode,
    pub log_events: bool,
}

impl CursorOptions {
    pub fn buffered() -> Self {
        Self {
            fetch_mode: FetchMode::Buffered,
            ..Self::default()
        }
    }

    pub fn streaming() -> Self {
        Self {
            fetch_mode: FetchMode::Streaming,
            ..Self::default()
        }
    }

    pub fn with_log_events(mut self, log_events: bool) -> Self {
        self.log_events = log_events;
        self
    }

    /// Defaults overridden by `SPHINXQL_FETCH_MODE` and
    /// `SPHINXQL_LOG_EVENTS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fetch_mode: read_env(FETCH_MODE_ENV)
                .and_then(|v| FetchMode::parse(&v))
                .unwrap_or(defaults.fetch_mode),
            log_events: read_env(LOG_EVENTS_ENV)
                .and_then(|v| parse_bool_flag(&v))
                .unwrap_or(defaults.log_events),
        }
    }
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            fetch_mode: FetchMode::Auto,
            log_events: true,
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
