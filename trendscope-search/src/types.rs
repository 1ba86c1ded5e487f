use serde::{Deserialize, Serialize};
use thiserror::Error;
use trendscope_common::TrendError;
use trendscope_http::HttpError;

/// One hit as returned by a provider, before any validation.
///
/// Every field is optional because providers omit them freely; the
/// pipeline's normalizer decides what is admissible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    /// Publication time as the provider reported it (RFC 3339, a date, or
    /// a relative phrase); parsed best-effort downstream.
    pub published: Option<String>,
}

/// How far back a query should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    pub days: u32,
}

impl RecencyWindow {
    pub fn days(days: u32) -> Self {
        Self { days: days.max(1) }
    }

    /// Google Custom Search `dateRestrict` value.
    pub fn date_restrict(&self) -> String {
        format!("d{}", self.days)
    }

    /// Brave `freshness` bucket covering at least the window.
    pub fn freshness(&self) -> &'static str {
        match self.days {
            0..=1 => "pd",
            2..=7 => "pw",
            8..=31 => "pm",
            _ => "py",
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
    #[error("invalid search configuration: {0}")]
    Config(String),
}

impl From<SearchError> for TrendError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Config(msg) => TrendError::Config(msg),
            other => TrendError::Provider(other.to_string()),
        }
    }
}
