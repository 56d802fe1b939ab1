//! Configuration management for cookbot
//!
//! Settings live in a TOML file (`cookbot.toml` by default). Secrets never do:
//! the file only names the environment variables that hold them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::CuisineCatalog;
use crate::{CookbotError, Result};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "cookbot.toml";

/// Top-level cookbot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookbotConfig {
    /// Directory holding the session memory JSON files
    #[serde(default = "default_memory_dir")]
    pub memory_dir: PathBuf,

    /// Directory receiving one Markdown file per daily plan
    #[serde(default = "default_plans_dir")]
    pub plans_dir: PathBuf,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub workshop: WorkshopConfig,

    #[serde(default)]
    pub memory: MemoryLimits,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub catalog: CuisineCatalog,
}

/// Model selection and sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent to the backend
    #[serde(default = "default_model")]
    pub name: String,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Default sampling temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Base name of the credential environment variables
    ///
    /// `GROQ_API_KEY`, then `GROQ_API_KEY_2` .. `GROQ_API_KEY_10`.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Retry and pacing policy for the invocation gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Total attempts for a rate-limited call (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on every retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Pause after a successful call before the next caller may proceed
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

/// Generation-validation workshop limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopConfig {
    /// Generate/audit rounds per idea before giving up on it
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Accepted recipes to collect before the workshop phase stops
    #[serde(default = "default_target_options")]
    pub target_options: usize,
}

/// Bounds of the session memory sequences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimits {
    #[serde(default = "default_recent_cuisines")]
    pub recent_cuisines: usize,

    #[serde(default = "default_recent_regions")]
    pub recent_regions: usize,

    #[serde(default = "default_recent_trends")]
    pub recent_trends: usize,

    /// Insights shown to the analyst
    #[serde(default = "default_insight_window")]
    pub insight_window: usize,

    /// Insights kept on disk
    #[serde(default = "default_insight_retention")]
    pub insight_retention: usize,
}

/// Web search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    #[serde(default = "default_max_queries")]
    pub max_queries: usize,

    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_search_cx_env")]
    pub cx_env: String,
}

// Default value providers
fn default_memory_dir() -> PathBuf {
    PathBuf::from("memory")
}

fn default_plans_dir() -> PathBuf {
    PathBuf::from("daily_plans")
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> usize {
    4096
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_cooldown_ms() -> u64 {
    500
}

fn default_max_iterations() -> usize {
    3
}

fn default_target_options() -> usize {
    3
}

fn default_recent_cuisines() -> usize {
    15
}

fn default_recent_regions() -> usize {
    2
}

fn default_recent_trends() -> usize {
    20
}

fn default_insight_window() -> usize {
    15
}

fn default_insight_retention() -> usize {
    100
}

fn default_results_per_query() -> usize {
    3
}

fn default_max_queries() -> usize {
    3
}

fn default_search_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_search_cx_env() -> String {
    "GOOGLE_CX".to_string()
}

impl CookbotConfig {
    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            CookbotError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path`
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| CookbotError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(CookbotError::Config(format!(
                "model.temperature must be within [0, 1], got {}",
                self.model.temperature
            )));
        }
        if self.gateway.max_attempts == 0 {
            return Err(CookbotError::Config(
                "gateway.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.workshop.max_iterations == 0 || self.workshop.target_options == 0 {
            return Err(CookbotError::Config(
                "workshop.max_iterations and workshop.target_options must be at least 1"
                    .to_string(),
            ));
        }
        self.catalog.validate()
    }
}

impl GatewayConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for CookbotConfig {
    fn default() -> Self {
        Self {
            memory_dir: default_memory_dir(),
            plans_dir: default_plans_dir(),
            model: ModelConfig::default(),
            gateway: GatewayConfig::default(),
            workshop: WorkshopConfig::default(),
            memory: MemoryLimits::default(),
            search: SearchConfig::default(),
            catalog: CuisineCatalog::builtin(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            endpoint: default_endpoint(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            target_options: default_target_options(),
        }
    }
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            recent_cuisines: default_recent_cuisines(),
            recent_regions: default_recent_regions(),
            recent_trends: default_recent_trends(),
            insight_window: default_insight_window(),
            insight_retention: default_insight_retention(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_query: default_results_per_query(),
            max_queries: default_max_queries(),
            api_key_env: default_search_key_env(),
            cx_env: default_search_cx_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CookbotConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, CookbotConfig::default());
        assert_eq!(config.gateway.max_attempts, 5);
        assert_eq!(config.workshop.max_iterations, 3);
        assert_eq!(config.memory.recent_regions, 2);
    }

    #[test]
    fn test_write_default_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join(CONFIG_FILE_NAME);

        CookbotConfig::write_default(&path).unwrap();
        let loaded = CookbotConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, CookbotConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
memory_dir = "state"

[workshop]
max_iterations = 5

[[catalog.regions]]
name = "Islands"
cuisines = ["Hawaiian", "Maltese"]
"#,
        )
        .unwrap();

        let config = CookbotConfig::load_or_default(&path).unwrap();
        assert_eq!(config.memory_dir, PathBuf::from("state"));
        assert_eq!(config.workshop.max_iterations, 5);
        assert_eq!(config.workshop.target_options, 3);
        assert_eq!(config.catalog.regions().len(), 1);
        assert_eq!(config.model.name, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "[model]\ntemperature = 1.5\n").unwrap();
        assert!(CookbotConfig::load_or_default(&path).is_err());

        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(
            CookbotConfig::load_or_default(&path),
            Err(CookbotError::Config(_))
        ));
    }
}
