use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::error::StartupError;

/// Main service configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP listener and CORS settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Inference service settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Retry and backoff settings for inference calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Controls whether failure details reach clients
    #[serde(default)]
    pub mode: RunMode,
}

/// HTTP listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API from a browser
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Deployed frontend URL, appended to the allowed origins
    pub frontend_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            frontend_url: None,
        }
    }
}

impl ServerConfig {
    /// Allowed origins plus the frontend URL, trimmed and without blanks or duplicates
    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        for origin in self
            .allowed_origins
            .iter()
            .chain(self.frontend_url.iter())
            .map(|o| o.trim())
        {
            if !origin.is_empty() && !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }
}

/// Configuration for the chat-completion provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Access token (can also be set via HF_ACCESS_TOKEN)
    pub api_key: Option<String>,
    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-call timeout in seconds; unbounded when unset
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: None,
        }
    }
}

/// Configuration for retry behavior around inference calls
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt in milliseconds (doubles after each failure)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Run mode; any value other than "development" (case-insensitive) means production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Production,
    Development,
}

impl RunMode {
    /// Parse a mode name; anything other than "development" means production
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("development") {
            RunMode::Development
        } else {
            RunMode::Production
        }
    }
}

impl<'de> Deserialize<'de> for RunMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(RunMode::from_name(&name))
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:4173".to_string(),
    ]
}

fn default_model() -> String {
    "meta-llama/Meta-Llama-3-8B-Instruct".to_string()
}

fn default_base_url() -> String {
    "https://router.huggingface.co".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Unprefixed deployment variables: PORT, APP_ENV, and (when not set elsewhere)
    ///    HF_ACCESS_TOKEN and FRONTEND_URL
    /// 2. Environment variables with RECIPE__ prefix
    /// 3. config.toml file in current directory
    /// 4. Default values
    ///
    /// Environment variable format: RECIPE__PROVIDER__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = load_config()?;
        config.apply_env_fallbacks(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fill in settings from the conventional unprefixed variables.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider.api_key.is_none() {
            self.provider.api_key = lookup("HF_ACCESS_TOKEN");
        }
        if self.server.frontend_url.is_none() {
            self.server.frontend_url = lookup("FRONTEND_URL");
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(mode) = lookup("APP_ENV") {
            self.mode = RunMode::from_name(&mode);
        }
    }

    /// The inference access token; blank counts as absent
    pub fn access_token(&self) -> Result<&str, StartupError> {
        self.provider
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(StartupError::MissingAccessToken)
    }
}

/// Load configuration from the optional config file and RECIPE__ variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE__SERVER__PORT
        .add_source(
            Environment::with_prefix("RECIPE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
