use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    pub openrouter: OpenRouterConfig,
    pub dispatch: DispatchConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
}

/// Upstream OpenRouter settings.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key for chat completions. Optional at startup; its absence is
    /// reported per-question, not at boot.
    pub api_key: Option<String>,
    /// Base URL for both the completion and model-listing endpoints
    /// (default: https://openrouter.ai)
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
    /// Referer header value sent with completion requests.
    pub referer: String,
}

/// Fan-out settings.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of models selected per question (default: 15)
    pub max_models: usize,
}

/// Model catalog settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Seconds between background refreshes of the model list (default: 3600)
    pub refresh_interval_secs: u64,
    /// Comma-separated model ids suppressed from the candidate pool.
    pub suppressed_models: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// CORS allowed origins (comma-separated, default: *)
    pub origins: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PORT"))?,
            openrouter: OpenRouterConfig {
                api_key: env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty()),
                base_url: env::var("OPENROUTER_BASE_URL")
                    .unwrap_or_else(|_| "https://openrouter.ai".to_string()),
                request_timeout_secs: env::var("OPENROUTER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("OPENROUTER_TIMEOUT_SECS"))?,
                referer: env::var("OPENROUTER_REFERER")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            dispatch: DispatchConfig {
                max_models: env::var("DISPATCH_MAX_MODELS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("DISPATCH_MAX_MODELS"))?,
            },
            catalog: CatalogConfig {
                refresh_interval_secs: env::var("CATALOG_REFRESH_INTERVAL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("CATALOG_REFRESH_INTERVAL_SECS"))?,
                suppressed_models: env::var("SUPPRESSED_MODELS")
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            logging: LoggingConfig {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            cors: CorsConfig {
                origins: env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid numeric value for {0}")]
    InvalidNumber(&'static str),
}
