use std::{env::VarError, fmt::Display, str::FromStr};

use crate::app_config::{AppConfig, Environment, StageConfig};
use crate::ConfigError;

/// Loads `.env` (if any) and then reads [`AppConfig`] from the environment.
///
/// # Errors
///
/// Returns `ConfigError` if `DATABASE_URL` is missing or a value does not parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Same as [`load_app_config`] without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if `DATABASE_URL` is missing or a value does not parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Typed reads over an injectable variable lookup.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    fn required(&self, var: &str) -> Result<String, ConfigError> {
        (self.lookup)(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn text(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| default.to_string())
    }

    fn parsed<T>(&self, var: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match (self.lookup)(var) {
            Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    }

    /// `{prefix}_MAX_CONCURRENCY`, `{prefix}_MAX_ATTEMPTS` and
    /// `{prefix}_BACKOFF_BASE_MS`; counts below one are raised to one.
    fn stage(&self, prefix: &str) -> Result<StageConfig, ConfigError> {
        let defaults = StageConfig::default();
        Ok(StageConfig {
            max_concurrency: self
                .parsed(&format!("{prefix}_MAX_CONCURRENCY"), defaults.max_concurrency)?
                .max(1),
            max_attempts: self
                .parsed(&format!("{prefix}_MAX_ATTEMPTS"), defaults.max_attempts)?
                .max(1),
            backoff_base_ms: self
                .parsed(&format!("{prefix}_BACKOFF_BASE_MS"), defaults.backoff_base_ms)?,
        })
    }
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let env = EnvReader { lookup };

    Ok(AppConfig {
        database_url: env.required("DATABASE_URL")?,
        env: parse_environment(&env.text("LLMVIS_ENV", "development"))?,
        bind_addr: env.parsed("LLMVIS_BIND_ADDR", ([0, 0, 0, 0], 8080).into())?,
        log_level: env.text("LLMVIS_LOG_LEVEL", "info"),
        db_max_connections: env.parsed("LLMVIS_DB_MAX_CONNECTIONS", 10)?,
        db_min_connections: env.parsed("LLMVIS_DB_MIN_CONNECTIONS", 1)?,
        db_acquire_timeout_secs: env.parsed("LLMVIS_DB_ACQUIRE_TIMEOUT_SECS", 10)?,
        llm_service_url: env.text("LLMVIS_LLM_SERVICE_URL", "http://llm-service:8081"),
        translation_service_url: env.text(
            "LLMVIS_TRANSLATION_SERVICE_URL",
            "http://translation-service:8082",
        ),
        client_timeout_secs: env.parsed("LLMVIS_CLIENT_TIMEOUT_SECS", 600)?,
        client_user_agent: env.text("LLMVIS_CLIENT_USER_AGENT", "llmvis/0.1 (brand-visibility)"),
        translation: env.stage("LLMVIS_TRANSLATION")?,
        query: env.stage("LLMVIS_QUERY")?,
        analysis_timeout_secs: env.parsed("LLMVIS_ANALYSIS_TIMEOUT_SECS", 900)?,
        rate_limit_per_minute: env.parsed("LLMVIS_RATE_LIMIT_PER_MINUTE", 120_usize)?.max(1),
    })
}

fn parse_environment(raw: &str) -> Result<Environment, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "development" | "dev" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" | "prod" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LLMVIS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
