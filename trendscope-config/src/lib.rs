//! Loader for Trendscope configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they were added, then
//! `TRENDSCOPE__`-prefixed environment variables are applied on top
//! (`TRENDSCOPE__PIPELINE__RECENCY_DAYS=7` sets `pipeline.recency_days`).
//! After merging, every string value is `${VAR}`-expanded, recursively up to
//! a fixed depth, before the strongly typed structs are materialised.
//!
//! A minimal `trendscope.yaml`:
//!
//! ```yaml
//! llm:
//!   provider: gemini
//!   api_key: "${GEMINI_API_KEY}"
//! search:
//!   provider: google
//!   api_key: "${GOOGLE_API_KEY}"
//!   engine_id: "${GOOGLE_CSE_ID}"
//! pipeline:
//!   recency_days: 14
//! output_dir: output
//! ```
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub mod settings;

pub use settings::{
    CredibilityTier, CuratedSource, LogSettings, MAX_EXTRA_ITERATIONS, PipelineSettings,
    QualityWeights, RankingSettings, RefinementSettings, ScoreStep, SourceCatalog, SourceKind,
};
pub use trendscope_common::{LlmConfig, SearchConfig};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TRENDSCOPE";
pub const DEFAULT_CONFIG_FILE: &str = "trendscope.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendscopeConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub pipeline: PipelineSettings,
    /// Directory that receives exported reports.
    pub output_dir: PathBuf,
    pub log: LogSettings,
}

impl Default for TrendscopeConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::None,
            search: SearchConfig::None,
            pipeline: PipelineSettings::default(),
            output_dir: PathBuf::from("output"),
            log: LogSettings::default(),
        }
    }
}

impl TrendscopeConfig {
    /// Render the effective configuration, with credentials masked.
    pub fn to_redacted_yaml(&self) -> Result<String, ConfigError> {
        let mut v = serde_json::to_value(self).map_err(|e| ConfigError::Message(e.to_string()))?;
        mask_secrets(&mut v);
        serde_yaml::to_string(&v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

/// `./trendscope.yaml` when present, else the per-user config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|d| d.join("trendscope").join(DEFAULT_CONFIG_FILE))
        .unwrap_or(local)
}

fn mask_secrets(v: &mut Value) {
    match v {
        Value::Object(obj) => {
            for (k, val) in obj.iter_mut() {
                if matches!(k.as_str(), "api_key" | "token") && val.is_string() {
                    *val = Value::String("<redacted>".into());
                } else {
                    mask_secrets(val);
                }
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(mask_secrets),
        _ => {}
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

enum Source {
    File { path: PathBuf, required: bool },
    Yaml(String),
}

/// Builder hiding the `config` crate wiring.
#[derive(Default)]
pub struct TrendscopeConfigLoader {
    sources: Vec<Source>,
}

impl TrendscopeConfigLoader {
    /// ```
    /// use trendscope_config::TrendscopeConfigLoader;
    ///
    /// let cfg = TrendscopeConfigLoader::new()
    ///     .with_yaml_str("pipeline:\n  recency_days: 7\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.pipeline.recency_days, 7);
    /// assert_eq!(cfg.pipeline.ranking.frequency_cap, 10.0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file that must exist; the format is inferred from its suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Attach a file that is skipped when missing, so a deployment can run
    /// purely from environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.sources.push(Source::Yaml(yaml.to_string()));
        self
    }

    /// Merge all sources, apply the environment overlay, expand `${VAR}`
    /// placeholders and deserialize.
    ///
    /// ```
    /// use trendscope_config::{SearchConfig, TrendscopeConfigLoader};
    ///
    /// unsafe { std::env::set_var("DOC_BRAVE_TOKEN", "from-env"); }
    ///
    /// let cfg = TrendscopeConfigLoader::new()
    ///     .with_yaml_str("search:\n  provider: brave\n  token: \"${DOC_BRAVE_TOKEN}\"\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match cfg.search {
    ///     SearchConfig::Brave { token, .. } => assert_eq!(token, "from-env"),
    ///     other => panic!("expected brave, got {other:?}"),
    /// }
    ///
    /// unsafe { std::env::remove_var("DOC_BRAVE_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<TrendscopeConfig, ConfigError> {
        let mut builder = Config::builder();
        for source in self.sources {
            builder = match source {
                Source::File { path, required } => {
                    builder.add_source(File::from(path).required(required))
                }
                Source::Yaml(yaml) => builder.add_source(File::from_str(&yaml, FileFormat::Yaml)),
            };
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut v: Value = builder.build()?.try_deserialize()?;
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
