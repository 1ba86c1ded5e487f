#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Mutex, OnceLock};
use trendscope_common::observability::{LogConfig, LogFormat};
use trendscope_common::{Result, TrendError};
use trendscope_llm::traits::{LlmClient, LlmResponse};
use trendscope_search::{RawHit, RecencyWindow, SearchError, SearchProvider};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let dir = tempfile::tempdir()
            .map(|d| d.keep())
            .unwrap_or_else(|_| std::env::temp_dir());
        let config = LogConfig {
            app_name: "trendscope-pipeline-tests",
            log_dir: Some(dir),
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "debug",
        };
        trendscope_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Which pipeline step a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Queries,
    Trends,
    Report,
    Other,
}

pub fn prompt_kind(prompt: &str) -> PromptKind {
    if prompt.contains("Return EXACTLY") {
        PromptKind::Queries
    } else if prompt.contains("Identify the major AI trends") {
        PromptKind::Trends
    } else if prompt.contains("Write an AI trends report") {
        PromptKind::Report
    } else {
        PromptKind::Other
    }
}

type Responder = dyn Fn(PromptKind, &str) -> Result<String> + Send + Sync;

pub struct FakeLlm {
    responder: Box<Responder>,
    pub prompts: Mutex<Vec<PromptKind>>,
}

impl FakeLlm {
    pub fn new(
        responder: impl Fn(PromptKind, &str) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self::new(|_, _| Err(TrendError::Provider("generator offline".into())))
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let kind = prompt_kind(prompt);
        self.prompts.lock().unwrap().push(kind);
        let text = (self.responder)(kind, prompt)?;
        Ok(LlmResponse {
            text,
            model: Some("fake".into()),
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

type Searcher = dyn Fn(&str) -> std::result::Result<Vec<RawHit>, SearchError> + Send + Sync;

pub struct FakeSearch {
    searcher: Box<Searcher>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new(
        searcher: impl Fn(&str) -> std::result::Result<Vec<RawHit>, SearchError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            searcher: Box::new(searcher),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn always(hits: Vec<RawHit>) -> Self {
        Self::new(move |_| Ok(hits.clone()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(
        &self,
        query: &str,
        _window: RecencyWindow,
    ) -> std::result::Result<Vec<RawHit>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        (self.searcher)(query)
    }
}

pub fn hit(title: &str, link: &str, snippet: &str) -> RawHit {
    RawHit {
        title: Some(title.to_string()),
        link: Some(link.to_string()),
        snippet: Some(snippet.to_string()),
        published: Some("2025-03-10T08:00:00Z".to_string()),
    }
}
