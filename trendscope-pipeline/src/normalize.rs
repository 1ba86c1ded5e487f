//! Turns provider hits into [`SearchResult`] records or rejects them.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use trendscope_search::RawHit;

use crate::text::source_of;
use crate::types::{SearchQuery, SearchResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("hit has no title")]
    MissingTitle,
    #[error("hit has no link")]
    MissingUrl,
    #[error("link is not an absolute http(s) URL: {0}")]
    NotAbsolute(String),
}

/// Validates one hit. The link is stored byte for byte as the provider sent
/// it; only the copy used for parsing is trimmed.
pub fn normalize(hit: RawHit, origin: &SearchQuery) -> Result<SearchResult, Rejection> {
    let title = hit
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(Rejection::MissingTitle)?
        .to_string();
    let link = hit
        .link
        .filter(|l| !l.trim().is_empty())
        .ok_or(Rejection::MissingUrl)?;

    let parsed =
        url::Url::parse(link.trim()).map_err(|_| Rejection::NotAbsolute(link.clone()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Rejection::NotAbsolute(link));
    }
    let source = source_of(&parsed).ok_or_else(|| Rejection::NotAbsolute(link.clone()))?;

    Ok(SearchResult {
        title,
        snippet: hit.snippet.map(|s| s.trim().to_string()).unwrap_or_default(),
        url: link,
        source,
        published_at: hit.published.as_deref().and_then(parse_published),
        origin_query: origin.text.clone(),
        targeted_source: origin.targeted_source.clone(),
    })
}

/// Best effort: RFC 3339, RFC 2822, a bare date, or a naive timestamp.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: Option<&str>, link: Option<&str>) -> RawHit {
        RawHit {
            title: title.map(str::to_string),
            link: link.map(str::to_string),
            snippet: Some("  a snippet ".into()),
            published: Some("2025-03-10".into()),
        }
    }

    #[test]
    fn keeps_url_exactly() {
        let url = "https://www.Example.com/2025/03/Some-Post?ref=feed#top";
        let result = normalize(hit(Some("Title"), Some(url)), &SearchQuery::general("q")).unwrap();
        assert_eq!(result.url, url);
        assert_eq!(result.source, "example.com");
        assert_eq!(result.snippet, "a snippet");
        assert_eq!(result.origin_query, "q");
        assert!(result.published_at.is_some());
    }

    #[test]
    fn padded_link_is_not_rewritten() {
        let url = " https://openai.com/index/gpt-5-preview/\n";
        let result = normalize(hit(Some("Title"), Some(url)), &SearchQuery::general("q")).unwrap();
        assert_eq!(result.url, url);
        assert_eq!(result.source, "openai.com");
    }

    #[test]
    fn carries_targeted_source() {
        let query = SearchQuery::targeted("OpenAI research", "openai.com");
        let result = normalize(hit(Some("T"), Some("https://openai.com/index/x")), &query).unwrap();
        assert_eq!(result.targeted_source.as_deref(), Some("openai.com"));
    }

    #[test]
    fn rejects_incomplete_hits() {
        let q = SearchQuery::general("q");
        assert_eq!(
            normalize(hit(None, Some("https://a.com/x")), &q),
            Err(Rejection::MissingTitle)
        );
        assert_eq!(
            normalize(hit(Some("  "), Some("https://a.com/x")), &q),
            Err(Rejection::MissingTitle)
        );
        assert_eq!(normalize(hit(Some("T"), None), &q), Err(Rejection::MissingUrl));
        assert!(matches!(
            normalize(hit(Some("T"), Some("/relative/path")), &q),
            Err(Rejection::NotAbsolute(_))
        ));
        assert!(matches!(
            normalize(hit(Some("T"), Some("ftp://a.com/file")), &q),
            Err(Rejection::NotAbsolute(_))
        ));
    }

    #[test]
    fn published_formats() {
        assert!(parse_published("2025-03-10T08:00:00Z").is_some());
        assert!(parse_published("Mon, 10 Mar 2025 08:00:00 +0000").is_some());
        assert!(parse_published("2025-03-10T08:00:00").is_some());
        assert!(parse_published("3 days ago").is_none());
    }
}
