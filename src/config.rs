use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub ledger: LedgerConfig,
    pub ai: AIConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for tokens issued by the external identity provider
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// Shared secret for webhook signature verification
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Credits granted when an account is first created
    pub signup_grant: i32,
    /// Flat fee charged per transcription request
    pub transcription_fee: i32,
    /// Flat fee charged per poll creation
    pub poll_fee: i32,
    /// Bounded retries for transient storage failures
    pub storage_retry_attempts: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AIConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub request_timeout_ms: u64,
    pub retry_attempts: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub api_key: String,
    pub api_base: String,
    /// Polling interval while waiting for the provider to finish
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // Build config from config.yml (required) with environment variable overrides
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("CONTENTFORGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
