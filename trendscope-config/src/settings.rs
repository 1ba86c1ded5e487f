//! Tunables consumed by the pipeline.
//!
//! Everything here is plain data with serde defaults, so an empty `pipeline:`
//! block yields a working configuration. The values are loaded once and
//! shared read-only.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hard upper bound on refinement passes after the first retrieval.
pub const MAX_EXTRA_ITERATIONS: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Recency window handed to the search provider, in days.
    pub recency_days: u32,
    /// Extra retrieval passes allowed after the first. Clamped to
    /// [`MAX_EXTRA_ITERATIONS`].
    pub max_extra_iterations: u32,
    /// Fixed pause between consecutive calls to the same provider.
    pub provider_delay_ms: u64,
    /// Bound on a single search call.
    pub provider_timeout_secs: u64,
    /// Bound on a single text-generation call.
    pub generation_timeout_secs: u64,
    /// Number of queries requested from the generator for the first pass.
    pub generated_query_count: usize,
    /// Appended to the first pass after the generated queries.
    pub fixed_queries: Vec<String>,
    pub sources: SourceCatalog,
    pub ranking: RankingSettings,
    pub quality: QualityWeights,
    pub refinement: RefinementSettings,
}

impl PipelineSettings {
    pub fn extra_iterations(&self) -> u32 {
        self.max_extra_iterations.min(MAX_EXTRA_ITERATIONS)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            recency_days: 14,
            max_extra_iterations: MAX_EXTRA_ITERATIONS,
            provider_delay_ms: 300,
            provider_timeout_secs: 20,
            generation_timeout_secs: 90,
            generated_query_count: 15,
            fixed_queries: strings(&[
                "new AI development tools past 2 weeks",
                "AI API releases past 2 weeks",
                "open source AI frameworks updates recent",
                "AI model releases past 2 weeks",
                "AI coding tools update recent",
                "machine learning libraries announcements",
                "AI platform announcements past 2 weeks",
            ]),
            sources: SourceCatalog::default(),
            ranking: RankingSettings::default(),
            quality: QualityWeights::default(),
            refinement: RefinementSettings::default(),
        }
    }
}

/// How a curated source publishes, which shapes its targeted queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Code and model hosts (releases, changelogs).
    Repository,
    /// First-party company blogs (announcements, API posts).
    VendorBlog,
    /// Newsrooms, magazines and aggregators.
    #[default]
    Outlet,
}

impl SourceKind {
    pub fn query_suffix(self) -> &'static str {
        match self {
            SourceKind::Repository => "new release update announcement past 2 weeks",
            SourceKind::VendorBlog => "announcement blog post API past 2 weeks",
            SourceKind::Outlet => "recent news past 2 weeks",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratedSource {
    pub domain: String,
    #[serde(default)]
    pub kind: SourceKind,
    /// Natural-language phrasings that surface this source's articles.
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceCatalog {
    /// Official vendor blogs and primary outlets.
    pub authoritative_domains: Vec<String>,
    /// Secondary outlets that are reputable regardless of path shape.
    pub reputable_domains: Vec<String>,
    pub curated_sources: Vec<CuratedSource>,
    /// Terms taken from each curated source per pass.
    pub terms_per_source: usize,
    /// Never admitted into the ranked pool.
    pub excluded_domains: Vec<String>,
    /// URL fragments that mark search pages or known junk paths.
    pub deny_fragments: Vec<String>,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self {
            authoritative_domains: strings(&[
                "openai.com",
                "anthropic.com",
                "blog.google",
                "googleblog.com",
                "deepmind.google",
                "ai.meta.com",
                "microsoft.com",
                "huggingface.co",
                "github.com",
                "aws.amazon.com",
                "nvidia.com",
                "reuters.com",
                "techcrunch.com",
                "venturebeat.com",
                "theverge.com",
                "arstechnica.com",
                "technologyreview.com",
                "news.mit.edu",
                "spectrum.ieee.org",
            ]),
            reputable_domains: strings(&[
                "zdnet.com",
                "infoworld.com",
                "thenextweb.com",
                "kdnuggets.com",
                "the-decoder.com",
                "towardsdatascience.com",
                "theinformation.com",
                "wired.com",
                "ainews.com",
                "papers.nips.cc",
            ]),
            curated_sources: default_curated_sources(),
            terms_per_source: 2,
            excluded_domains: strings(&["reddit.com", "quora.com", "stackoverflow.com"]),
            deny_fragments: strings(&[
                "search?",
                "query=",
                "?q=",
                "/search/",
                "google.com/search",
                "bing.com/search",
                "duckduckgo.com",
                "yahoo.com/search",
                "how-to-finetune-small-language-models-to-think-with",
                "artificial-intelligence-index",
                "applying-for-a-patent-and-getting-it",
                "the-fastest-ai-inference-platform-hardware",
            ]),
        }
    }
}

fn curated(domain: &str, kind: SourceKind, terms: &[&str]) -> CuratedSource {
    CuratedSource {
        domain: domain.to_string(),
        kind,
        terms: strings(terms),
    }
}

fn default_curated_sources() -> Vec<CuratedSource> {
    use SourceKind::*;
    vec![
        curated("ai.googleblog.com", VendorBlog, &["Google AI research", "Google AI blog"]),
        curated("openai.com", VendorBlog, &["OpenAI research", "OpenAI announcements"]),
        curated(
            "anthropic.com",
            VendorBlog,
            &["Anthropic Claude updates", "Anthropic AI research"],
        ),
        curated(
            "research.microsoft.com",
            Outlet,
            &["Microsoft AI research", "Microsoft research blog"],
        ),
        curated("ai.meta.com", Outlet, &["Meta AI research", "Meta AI announcements"]),
        curated("deepmind.google", Outlet, &["Google DeepMind research", "DeepMind announcements"]),
        curated(
            "huggingface.co",
            Repository,
            &["Hugging Face AI models", "Hugging Face open source"],
        ),
        curated("github.com", Repository, &["GitHub AI projects", "GitHub open source AI"]),
        curated("news.mit.edu", Outlet, &["MIT AI news", "MIT artificial intelligence"]),
        curated("the-decoder.com", Outlet, &["AI industry news", "AI research news"]),
        curated(
            "reuters.com",
            Outlet,
            &["Reuters artificial intelligence GPU", "Reuters AI hardware announcement"],
        ),
        curated("theverge.com", Outlet, &["The Verge AI news", "The Verge AI products"]),
        curated(
            "arstechnica.com",
            Outlet,
            &["Ars Technica AI news", "Ars Technica machine learning"],
        ),
        curated("techcrunch.com", Outlet, &["TechCrunch AI news", "AI startup funding"]),
        curated("venturebeat.com", Outlet, &["VentureBeat AI news", "enterprise AI news"]),
        curated(
            "technologyreview.com",
            Outlet,
            &["MIT Technology Review AI", "AI research analysis"],
        ),
        curated("spectrum.ieee.org", Outlet, &["IEEE Spectrum AI", "AI engineering updates"]),
        curated("blog.google", VendorBlog, &["Google AI developments", "Google machine learning"]),
        curated("aws.amazon.com", VendorBlog, &["AWS AI services", "AWS machine learning"]),
        curated("developer.nvidia.com", VendorBlog, &["NVIDIA AI developer", "NVIDIA AI tools"]),
    ]
}

/// A source-credibility bonus applied when the result's domain contains any
/// of `patterns`. Only the highest applicable tier counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredibilityTier {
    pub bonus: f64,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    /// Topic keywords; each one present in title+snippet adds `keyword_bonus`.
    pub keywords: Vec<String>,
    /// Drop results that match no keyword at all.
    pub require_keyword_match: bool,
    pub keyword_bonus: f64,
    /// Applied once when the title contains any of these.
    pub technical_terms: Vec<String>,
    pub technical_term_bonus: f64,
    pub targeted_query_bonus: f64,
    pub curated_domain_bonus: f64,
    pub credibility_tiers: Vec<CredibilityTier>,
    pub frequency_increment: f64,
    pub frequency_cap: f64,
    pub url_quality_bonus: f64,
    pub long_title_chars: usize,
    pub long_title_bonus: f64,
    pub long_snippet_chars: usize,
    pub long_snippet_bonus: f64,
    pub min_title_chars: usize,
    pub min_title_tokens: usize,
    /// Whole-title placeholders such as "AI".
    pub generic_titles: Vec<String>,
    pub signature_words: usize,
    pub per_domain_cap: usize,
    pub curated_domain_cap: usize,
    pub max_pool: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            keywords: strings(&[
                "artificial intelligence",
                "machine learning",
                "deep learning",
                "neural network",
                "ai",
                "llm",
                "gpt",
                "transformer",
                "computer vision",
                "natural language",
                "robotics",
                "automation",
                "algorithm",
                "data science",
                "generative ai",
                "foundation model",
                "large language model",
                "ai model",
                "claude",
                "gemini",
                "chatgpt",
                "anthropic",
                "openai",
                "multimodal",
                "reasoning",
                "reinforcement learning",
                "diffusion model",
                "embedding",
                "fine-tuning",
                "rag",
            ]),
            require_keyword_match: true,
            keyword_bonus: 1.0,
            technical_terms: strings(&[
                "api",
                "sdk",
                "framework",
                "library",
                "model",
                "algorithm",
                "benchmark",
                "dataset",
            ]),
            technical_term_bonus: 1.5,
            targeted_query_bonus: 15.0,
            curated_domain_bonus: 5.0,
            credibility_tiers: vec![
                tier(8.0, &["googleblog", "openai", "anthropic", "microsoft", "meta"]),
                tier(7.0, &["papers.nips", "deepmind"]),
                tier(6.0, &["huggingface", "github"]),
                tier(5.0, &["technologyreview", "spectrum.ieee.org"]),
                tier(3.0, &["techcrunch", "venturebeat", "theinformation"]),
            ],
            frequency_increment: 2.0,
            frequency_cap: 10.0,
            url_quality_bonus: 3.0,
            long_title_chars: 50,
            long_title_bonus: 2.0,
            long_snippet_chars: 100,
            long_snippet_bonus: 2.0,
            min_title_chars: 15,
            min_title_tokens: 3,
            generic_titles: strings(&["ai", "artificial intelligence", "machine learning"]),
            signature_words: 5,
            per_domain_cap: 3,
            curated_domain_cap: 4,
            max_pool: 40,
        }
    }
}

fn tier(bonus: f64, patterns: &[&str]) -> CredibilityTier {
    CredibilityTier {
        bonus,
        patterns: strings(patterns),
    }
}

/// A saturating step: reaching `min` earns `points`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreStep {
    pub min: usize,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    /// Points by number of trend clusters, highest step first.
    pub trend_steps: Vec<ScoreStep>,
    /// Points by total citations across clusters, highest step first.
    pub citation_steps: Vec<ScoreStep>,
    pub narrative_weight: f64,
    pub narrative_min_chars: usize,
    pub technical_weight: f64,
    pub technical_min_chars: usize,
    pub url_quality_weight: f64,
    pub curated_weight: f64,
    pub threshold: f64,
    pub min_trends: usize,
    pub min_citations: usize,
    pub min_narrative_ratio: f64,
    pub min_url_quality_ratio: f64,
    pub min_curated_ratio: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        let step = |min, points| ScoreStep { min, points };
        Self {
            trend_steps: vec![
                step(7, 25.0),
                step(6, 22.0),
                step(5, 20.0),
                step(4, 15.0),
                step(3, 10.0),
                step(2, 5.0),
            ],
            citation_steps: vec![step(15, 25.0), step(10, 20.0), step(6, 15.0), step(3, 10.0)],
            narrative_weight: 20.0,
            narrative_min_chars: 100,
            technical_weight: 10.0,
            technical_min_chars: 50,
            url_quality_weight: 10.0,
            curated_weight: 10.0,
            threshold: 65.0,
            min_trends: 5,
            min_citations: 12,
            min_narrative_ratio: 0.5,
            min_url_quality_ratio: 0.5,
            min_curated_ratio: 0.3,
        }
    }
}

/// Extra queries added per deficiency when another pass is warranted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementSettings {
    pub max_new_queries: usize,
    pub insufficient_trends: Vec<String>,
    pub insufficient_developments: Vec<String>,
    pub weak_narratives: Vec<String>,
    pub poor_url_quality: Vec<String>,
    pub lack_cross_source_validation: Vec<String>,
    /// `site:` queries; the domain after `site:` marks them as targeted.
    pub insufficient_curated_sources: Vec<String>,
}

impl Default for RefinementSettings {
    fn default() -> Self {
        Self {
            max_new_queries: 10,
            insufficient_trends: strings(&[
                "AI agent frameworks launches past 2 weeks",
                "new AI coding tools announcements recent",
                "AI model capabilities breakthroughs past 2 weeks",
                "AI security concerns recent developments",
                "enterprise AI adoption case studies past 2 weeks",
                "AI hardware chips GPU announcements recent",
                "AI regulation policy updates recent",
                "AI robotics automation news recent",
            ]),
            insufficient_developments: strings(&[
                "OpenAI Anthropic Google AI updates past 2 weeks",
                "Hugging Face GitHub AI releases recent",
                "AI startup launches product announcements past 2 weeks",
                "AI API SDK releases recent",
                "developer AI tools new features past 2 weeks",
            ]),
            weak_narratives: strings(&[
                "AI industry analysis trends report",
                "AI technology impact developers",
                "AI transformation software engineering",
            ]),
            poor_url_quality: strings(&[
                "AI model release announcement blog post",
                "AI research paper published this week article",
            ]),
            lack_cross_source_validation: strings(&[
                "AI developments covered widely",
                "trending AI topics this week",
            ]),
            insufficient_curated_sources: strings(&[
                "site:openai.com AI announcements",
                "site:blog.google AI research",
                "site:anthropic.com Claude updates",
                "site:huggingface.co new models",
                "site:github.com AI frameworks",
            ]),
        }
    }
}

/// Where logs go; mirrors `trendscope_common::observability::LogConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub format: trendscope_common::observability::LogFormat,
    pub stderr: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
