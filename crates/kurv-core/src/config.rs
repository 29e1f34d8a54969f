use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any `KURV_*` value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if any `KURV_*` value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_i32 = |var: &str, default: &str| -> Result<i32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("KURV_ENV", "development"))?;
    let log_level = or_default("KURV_LOG_LEVEL", "info");

    let provider_base_url = lookup("KURV_PROVIDER_BASE_URL").ok();
    let provider_user_agent = or_default("KURV_USER_AGENT", "kurv/0.1");
    let index_path = lookup("KURV_INDEX_PATH").ok().map(PathBuf::from);
    let rules_path = lookup("KURV_RULES_PATH").ok().map(PathBuf::from);

    let http_timeout_secs = parse_u64("KURV_HTTP_TIMEOUT_SECS", "8")?;
    let max_retries = parse_u32("KURV_MAX_RETRIES", "3")?;
    let backoff_base_ms = parse_u64("KURV_BACKOFF_BASE_MS", "500")?;
    let max_concurrent_searches = parse_usize("KURV_MAX_CONCURRENT_SEARCHES", "5")?;
    let max_targeted_per_query = parse_usize("KURV_MAX_TARGETED_PER_QUERY", "3")?;

    let accept_ceiling = parse_i32("KURV_ACCEPT_CEILING", "100")?;
    let score_gap_override = parse_i32("KURV_SCORE_GAP_OVERRIDE", "60")?;

    let max_stores_per_route = parse_usize("KURV_MAX_STORES_PER_ROUTE", "3")?;
    let top_candidates = parse_usize("KURV_TOP_CANDIDATES", "5")?;
    let max_alternatives = parse_usize("KURV_MAX_ALTERNATIVES", "6")?;
    let min_alternative_availability = parse_f64("KURV_MIN_ALTERNATIVE_AVAILABILITY", "0.5")?;
    let alternative_cost_multiple = parse_f64("KURV_ALTERNATIVE_COST_MULTIPLE", "1.5")?;
    let cache_ttl_secs = parse_u64("KURV_CACHE_TTL_SECS", "300")?;

    Ok(AppConfig {
        env,
        log_level,
        provider_base_url,
        provider_user_agent,
        index_path,
        rules_path,
        http_timeout_secs,
        max_retries,
        backoff_base_ms,
        max_concurrent_searches,
        max_targeted_per_query,
        accept_ceiling,
        score_gap_override,
        max_stores_per_route,
        top_candidates,
        max_alternatives,
        min_alternative_availability,
        alternative_cost_multiple,
        cache_ttl_secs,
    })
}

fn parse_environment(raw: &str) -> Result<Environment, ConfigError> {
    match raw {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KURV_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
