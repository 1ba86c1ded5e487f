//! URL quality classification.
//!
//! Rules run in order and the first match wins:
//!
//! 1. category, tag, topic, section, pagination and search pages, domain
//!    roots, and URLs carrying a deny fragment are `Poor`
//! 2. an authoritative domain with an article indicator is `High`
//! 3. a reputable domain is `Medium`
//! 4. any other URL with an article indicator is `Basic`
//! 5. everything else is `Poor`
use regex::Regex;
use std::sync::LazyLock;
use trendscope_config::SourceCatalog;

use crate::text::domain_matches;
use crate::types::UrlQuality;

static LISTING_PATH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)/(category|categories|tag|tags|topic|topics|section|sections)/[^/]+/?$",
        r"(?i)/(category|categories|tag|tags|topic|topics|section|sections)/?$",
        r"(?i)/page/\d+/?$",
        r"(?i)/(news|blog|articles?|posts?|stories|research)/?$",
        r"(?i)/(search|archive|archives|latest|all)/?$",
        r"(?i)/(ai|artificial-intelligence|machine-learning|technology|tech)/?$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static PAGINATION_QUERY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(^|&)(page|p|paged)=\d+").ok());

static ARTICLE_INDICATORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/\d{4}/\d{2}/",
        r"/\d{4}-\d{2}-\d{2}",
        r"(?i)/[a-z0-9][a-z0-9_-]{19,}/?$",
        r"(?i)/(blog|news|articles?|posts?|research|story|stories)/[^/?#]+",
        r"(?i)\.html?$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

#[derive(Debug, Clone)]
pub struct UrlClassifier {
    authoritative: Vec<String>,
    reputable: Vec<String>,
    deny_fragments: Vec<String>,
}

impl UrlClassifier {
    pub fn new(catalog: &SourceCatalog) -> Self {
        let lower = |v: &[String]| v.iter().map(|s| s.to_ascii_lowercase()).collect();
        Self {
            authoritative: lower(&catalog.authoritative_domains),
            reputable: lower(&catalog.reputable_domains),
            deny_fragments: lower(&catalog.deny_fragments),
        }
    }

    pub fn classify(&self, url: &str) -> UrlQuality {
        let Ok(parsed) = url::Url::parse(url) else {
            return UrlQuality::Poor;
        };
        if self.is_listing(url, &parsed) {
            return UrlQuality::Poor;
        }
        let host = parsed.host_str().unwrap_or_default();
        let article = has_article_indicator(parsed.path());
        if article && self.authoritative.iter().any(|d| domain_matches(host, d)) {
            return UrlQuality::High;
        }
        if self.reputable.iter().any(|d| domain_matches(host, d)) {
            return UrlQuality::Medium;
        }
        if article {
            return UrlQuality::Basic;
        }
        UrlQuality::Poor
    }

    /// Rule 1 alone: the URL is a listing or search page, never an article.
    pub fn is_non_article(&self, url: &str) -> bool {
        match url::Url::parse(url) {
            Ok(parsed) => self.is_listing(url, &parsed),
            Err(_) => true,
        }
    }

    fn is_listing(&self, raw: &str, parsed: &url::Url) -> bool {
        let lowered = raw.to_ascii_lowercase();
        if self.deny_fragments.iter().any(|f| lowered.contains(f.as_str())) {
            return true;
        }
        let path = parsed.path();
        if path.is_empty() || path == "/" {
            return true;
        }
        if LISTING_PATH.iter().any(|re| re.is_match(path)) {
            return true;
        }
        match (parsed.query(), PAGINATION_QUERY.as_ref()) {
            (Some(query), Some(re)) => re.is_match(query),
            _ => false,
        }
    }
}

fn has_article_indicator(path: &str) -> bool {
    ARTICLE_INDICATORS.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> UrlClassifier {
        UrlClassifier::new(&SourceCatalog::default())
    }

    #[test]
    fn search_pages_are_poor() {
        let c = classifier();
        assert_eq!(c.classify("https://example.com/search?q=ai"), UrlQuality::Poor);
        assert!(c.is_non_article("https://example.com/search?q=ai"));
    }

    #[test]
    fn listing_pages_are_poor() {
        let c = classifier();
        for url in [
            "https://techcrunch.com/category/artificial-intelligence/",
            "https://techcrunch.com/tag/openai",
            "https://www.theverge.com/ai",
            "https://openai.com/news/",
            "https://venturebeat.com/page/3/",
            "https://venturebeat.com/ai/?page=2",
            "https://openai.com/",
            "https://openai.com",
        ] {
            assert_eq!(c.classify(url), UrlQuality::Poor, "{url}");
        }
    }

    #[test]
    fn authoritative_articles_are_high() {
        let c = classifier();
        assert_eq!(
            c.classify("https://techcrunch.com/2025/03/10/openai-ships-agents-sdk/"),
            UrlQuality::High
        );
        assert_eq!(
            c.classify("https://openai.com/index/introducing-the-responses-api/"),
            UrlQuality::High
        );
        assert_eq!(
            c.classify("https://huggingface.co/blog/smolvlm"),
            UrlQuality::High
        );
    }

    #[test]
    fn reputable_domains_are_medium() {
        let c = classifier();
        assert_eq!(c.classify("https://www.zdnet.com/article/x/"), UrlQuality::Medium);
        assert_eq!(c.classify("https://the-decoder.com/short/"), UrlQuality::Medium);
    }

    #[test]
    fn unknown_domains_need_an_indicator() {
        let c = classifier();
        assert_eq!(
            c.classify("https://smallblog.dev/2025/03/my-agent-experiments"),
            UrlQuality::Basic
        );
        assert_eq!(c.classify("https://smallblog.dev/about"), UrlQuality::Poor);
    }

    #[test]
    fn deny_fragments_win_over_domains() {
        let c = classifier();
        assert_eq!(
            c.classify("https://openai.com/2025/03/search?query=agents"),
            UrlQuality::Poor
        );
    }
}
