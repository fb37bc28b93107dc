use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::TopicTextField;
use crate::retry::{Jitter, RetryPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Readwise access token (READWISE_API_TOKEN overrides)
    #[serde(default)]
    pub api_token: Option<String>,
    /// Reader API base URL
    #[serde(default = "default_reader_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Fixed pause between successive delete/update calls
    #[serde(default = "default_mutation_delay")]
    pub mutation_delay_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_reader_base_url(),
            request_timeout_secs: default_timeout(),
            mutation_delay_ms: default_mutation_delay(),
        }
    }
}

impl ReaderConfig {
    pub fn mutation_delay(&self) -> Duration {
        Duration::from_millis(self.mutation_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Enable the AI topic filter
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// AI provider: "openai" or "claude_api"
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    /// Which document field is sent to the classifier
    #[serde(default)]
    pub text_field: TopicTextField,
    /// OpenAI API key (OPENAI_API_KEY overrides)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Claude/Anthropic API key (ANTHROPIC_API_KEY overrides)
    #[serde(default)]
    pub claude_api_key: Option<String>,
    /// Claude model name
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    /// Sampling temperature for classification
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_secs: u64,
    /// USD per million prompt tokens, used for the cost line
    #[serde(default = "default_input_cost")]
    pub input_cost_per_million: f64,
    /// USD per million completion tokens
    #[serde(default = "default_output_cost")]
    pub output_cost_per_million: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            provider: default_ai_provider(),
            text_field: TopicTextField::default(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            claude_api_key: None,
            claude_model: default_claude_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_ai_timeout(),
            input_cost_per_million: default_input_cost(),
            output_cost_per_million: default_output_cost(),
        }
    }
}

/// Where the filter lists come from. A gist takes precedence over a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Local JSON filter file
    #[serde(default = "default_filters_path")]
    pub path: PathBuf,
    /// GitHub gist holding the filter JSON (GIST_ID overrides)
    #[serde(default)]
    pub gist_id: Option<String>,
    /// Token for private gists (GITHUB_TOKEN overrides)
    #[serde(default)]
    pub github_token: Option<String>,
    /// GitHub API base URL
    #[serde(default = "default_github_base_url")]
    pub github_base_url: String,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            path: default_filters_path(),
            gist_id: None,
            github_token: None,
            github_base_url: default_github_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per mutation, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff delay; doubles on each retry
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Cap on a single backoff delay
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Cap on the total time spent waiting between attempts
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_secs: u64,
    /// Randomize each delay in [0, delay]
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_elapsed_secs: default_max_elapsed(),
            jitter: default_true(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_elapsed: Duration::from_secs(self.max_elapsed_secs),
            jitter: if self.jitter { Jitter::Full } else { Jitter::None },
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_reader_base_url() -> String {
    "https://readwise.io/api/v3".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_mutation_delay() -> u64 {
    1200 // ~50 mutations per minute
}

fn default_true() -> bool {
    true
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_claude_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_ai_timeout() -> u64 {
    60
}

fn default_input_cost() -> f64 {
    0.40
}

fn default_output_cost() -> f64 {
    1.60
}

fn default_filters_path() -> PathBuf {
    PathBuf::from("filters.json")
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_max_elapsed() -> u64 {
    60
}

/// Read an environment variable, treating empty values as unset
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from the default path, or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(env_var);
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("READWISE_API_TOKEN") {
            self.reader.api_token = Some(token);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(key);
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.ai.claude_api_key = Some(key);
        }
        if let Some(id) = lookup("GIST_ID") {
            self.filters.gist_id = Some(id);
        }
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.filters.github_token = Some(token);
        }
    }

    /// Get the configuration file path
    /// Always uses ~/.config/feedsweep/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedsweep")
            .join("config.toml")
    }

    /// Reader token, or a configuration error when none is set
    pub fn api_token(&self) -> crate::Result<&str> {
        self.reader
            .api_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                crate::Error::Config(
                    "Readwise API token not found. Set the READWISE_API_TOKEN environment variable."
                        .to_string(),
                )
            })
    }
}
