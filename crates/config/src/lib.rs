//! Configuration loading, validation, and management for FormAgent.
//!
//! Loads configuration from `~/.formagent/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.formagent/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the reasoning service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name: "anthropic", "openai", "openrouter", "ollama", ...
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model client timeouts and retry policy
    #[serde(default)]
    pub client: ClientSettings,

    /// Prompt size budget
    #[serde(default)]
    pub prompt: PromptSettings,

    /// Response parsing strictness
    #[serde(default)]
    pub parser: ParserSettings,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("client", &self.client)
            .field("prompt", &self.prompt)
            .field("parser", &self.parser)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt, transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles per retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    /// Overall bound on one invocation, retries and backoff included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_backoff_max_ms() -> u64 {
    30_000
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            deadline_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Largest instruction text the builder will emit, in characters
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

fn default_max_prompt_chars() -> usize {
    200_000
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserSettings {
    /// Fail on out-of-range confidences instead of clamping them
    #[serde(default)]
    pub strict_confidence: bool,
}

impl AppConfig {
    /// Load configuration from the default path (~/.formagent/config.toml).
    ///
    /// Environment variables take precedence:
    /// - `FORMAGENT_API_KEY`, then `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`
    /// - `FORMAGENT_PROVIDER`
    /// - `FORMAGENT_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(None, None)
    }

    /// Load, then apply command-line overrides. These win over both the
    /// file and the environment.
    pub fn load_with_overrides(
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        let env = |name: &str| std::env::var(name).ok();
        config.apply_env(env);
        if let Some(provider) = provider {
            config.provider = provider.to_string();
            config.resolve_key(env);
        }
        if let Some(model) = model {
            config.model = model.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("FORMAGENT_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("FORMAGENT_MODEL") {
            self.model = model;
        }
        self.resolve_key(lookup);
    }

    /// `FORMAGENT_API_KEY`, else the provider's own variable.
    fn resolve_key(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env_key = lookup("FORMAGENT_API_KEY")
            .or_else(|| provider_key_var(&self.provider).and_then(&lookup));
        if env_key.is_some() {
            self.api_key = env_key;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".formagent")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.temperature < 0.0 || self.client.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "client.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_secs must be > 0".into(),
            ));
        }
        if self.client.deadline_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "client.deadline_secs must be > 0 when set".into(),
            ));
        }
        if self.client.max_retries > 10 {
            return Err(ConfigError::ValidationError(
                "client.max_retries must be at most 10".into(),
            ));
        }
        if self.client.backoff_base_ms > self.client.backoff_max_ms {
            return Err(ConfigError::ValidationError(
                "client.backoff_base_ms must not exceed client.backoff_max_ms".into(),
            ));
        }
        if self.prompt.max_prompt_chars == 0 {
            return Err(ConfigError::ValidationError(
                "prompt.max_prompt_chars must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            api_url: None,
            client: ClientSettings::default(),
            prompt: PromptSettings::default(),
            parser: ParserSettings::default(),
        }
    }
}

/// The conventional API key variable of a provider.
fn provider_key_var(provider: &str) -> Option<&'static str> {
    match provider {
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        _ => None,
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for formagent_core::Error {
    fn from(e: ConfigError) -> Self {
        formagent_core::Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.client.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.prompt.max_prompt_chars, config.prompt.max_prompt_chars);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.client.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn backoff_bounds_checked() {
        let mut config = AppConfig::default();
        config.client.backoff_base_ms = 60_000;
        config.client.backoff_max_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn deadline_is_optional_and_positive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\ndeadline_secs = 45").unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.client.deadline(), Some(Duration::from_secs(45)));
        assert_eq!(AppConfig::default().client.deadline(), None);

        let mut config = AppConfig::default();
        config.client.deadline_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "anthropic");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
provider = "ollama"
model = "llama3.1"

[client]
max_retries = 1

[parser]
strict_confidence = true
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.client.max_retries, 1);
        assert_eq!(config.client.timeout_secs, 120);
        assert!(config.parser.strict_confidence);
    }

    #[test]
    fn unparseable_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = [not toml").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-ant-env"),
            ("FORMAGENT_MODEL", "claude-haiku"),
        ]);
        let mut config = AppConfig {
            api_key: Some("sk-from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-env"));
        assert_eq!(config.model, "claude-haiku");
    }

    #[test]
    fn provider_from_env_selects_its_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FORMAGENT_PROVIDER", "openai"),
            ("ANTHROPIC_API_KEY", "sk-ant-env"),
            ("OPENAI_API_KEY", "sk-openai-env"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key.as_deref(), Some("sk-openai-env"));
    }

    #[test]
    fn generic_key_wins_over_provider_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FORMAGENT_API_KEY", "sk-generic"),
            ("ANTHROPIC_API_KEY", "sk-ant-env"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-generic"));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = AppConfig {
            api_key: Some("sk-secret-value".into()),
            ..AppConfig::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("sk-secret-value"));
        assert!(shown.contains("[REDACTED]"));
    }
}
