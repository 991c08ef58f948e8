//! @ai:module:intent Configuration structs for story evaluation runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, ApiConfig, RunConfig, CorpusConfig, PathConfig, FailurePolicy
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// @ai:intent Main configuration for the evaluation system
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

/// @ai:intent Chat-completion endpoint used by the LLM judge
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Any OpenAI-compatible endpoint (xAI, a local LM Studio server, ...)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_rate_limit")]
    pub requests_per_minute: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

/// @ai:intent What to do with a sample record that cannot be loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole run at the first malformed sample.
    #[default]
    Abort,
    /// Log the sample, leave it out, and shrink the denominator accordingly.
    Skip,
}

/// @ai:intent Run configuration for metric and judge passes
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub dry_run: bool,
}

/// @ai:intent Where the corpus lives and how it is enumerated
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_sample_dir")]
    pub sample_dir: PathBuf,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_samples_per_category")]
    pub samples_per_category: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            requests_per_minute: default_rate_limit(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repetitions: default_repetitions(),
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
            dry_run: false,
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            sample_dir: default_sample_dir(),
            categories: default_categories(),
            samples_per_category: default_samples_per_category(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
        }
    }
}

fn default_model() -> String {
    "grok-3-beta".to_string()
}

fn default_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}

fn default_api_key_env() -> String {
    "XAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_rate_limit() -> u32 {
    60
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    1000
}

fn default_repetitions() -> u32 {
    3
}

fn default_concurrency() -> usize {
    4
}

fn default_sample_dir() -> PathBuf {
    PathBuf::from("samples")
}

fn default_categories() -> Vec<String> {
    ["drone", "earphone", "smartphone"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_samples_per_category() -> u32 {
    10
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
