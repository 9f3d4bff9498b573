use std::path::PathBuf;

use reqwest::Url;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_url = |var: &str, raw: &str| -> Result<Url, ConfigError> {
        // A trailing slash keeps `Url::join` from replacing the last segment.
        let normalised = format!("{}/", raw.trim_end_matches('/'));
        Url::parse(&normalised).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = parse_url("BOOKLINE_API_BASE_URL", &require("BOOKLINE_API_BASE_URL")?)?;
    let api_token = lookup("BOOKLINE_API_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());

    let log_level = or_default("BOOKLINE_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("BOOKLINE_REQUEST_TIMEOUT_SECS", "60")?;
    let slow_request_timeout_secs = parse_u64("BOOKLINE_SLOW_REQUEST_TIMEOUT_SECS", "120")?;
    let user_agent = or_default("BOOKLINE_USER_AGENT", "bookline/0.1 (checkout)");

    let currency = or_default("BOOKLINE_CURRENCY", "EUR").to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::InvalidEnvVar {
            var: "BOOKLINE_CURRENCY".to_string(),
            reason: format!("expected a three-letter ISO code, got {currency:?}"),
        });
    }

    let geocoder_url = parse_url(
        "BOOKLINE_GEOCODER_URL",
        &or_default("BOOKLINE_GEOCODER_URL", "https://nominatim.openstreetmap.org/"),
    )?;
    let cache_dir = PathBuf::from(or_default("BOOKLINE_CACHE_DIR", "./.bookline-cache"));

    Ok(AppConfig {
        api_base_url,
        api_token,
        log_level,
        request_timeout_secs,
        slow_request_timeout_secs,
        user_agent,
        currency,
        geocoder_url,
        cache_dir,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
