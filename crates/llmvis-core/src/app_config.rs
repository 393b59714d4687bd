use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Concurrency and retry settings for one external dependency.
///
/// Each stage (translation, query) gets its own instance so a slow backend
/// cannot starve the other one of permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConfig {
    /// Maximum number of in-flight calls to the dependency across a batch.
    pub max_concurrency: usize,
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    /// Sleep before the first retry; doubles on each subsequent retry.
    pub backoff_base_ms: u64,
}

impl StageConfig {
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 25,
            max_attempts: 3,
            backoff_base_ms: 1_000,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub llm_service_url: String,
    pub translation_service_url: String,
    pub client_timeout_secs: u64,
    pub client_user_agent: String,
    pub translation: StageConfig,
    pub query: StageConfig,
    pub analysis_timeout_secs: u64,
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// Wall-clock bound for one complete analysis batch.
    #[must_use]
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("llm_service_url", &self.llm_service_url)
            .field("translation_service_url", &self.translation_service_url)
            .field("client_timeout_secs", &self.client_timeout_secs)
            .field("client_user_agent", &self.client_user_agent)
            .field("translation", &self.translation)
            .field("query", &self.query)
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
