use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so only malformed values fail. Decoupled from
/// the process environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("REVDOC_ENV", "development"))?;
    let log_level = or_default("REVDOC_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("REVDOC_DATA_DIR", "./data"));
    let raw_table_prefix = or_default("REVDOC_RAW_TABLE_PREFIX", "ReviewDoctor_Raw_");
    let registry_table = or_default("REVDOC_REGISTRY_TABLE", "ReviewDoctor_Registry");
    let report_folder = or_default("REVDOC_REPORT_FOLDER", "WeeklyReports");
    let brand_seeds_path = lookup("REVDOC_BRAND_SEEDS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let dedup_cache_capacity = parse_positive_usize("REVDOC_DEDUP_CACHE_CAPACITY", "5000")?;
    let dedup_cache_ttl_secs = parse_u64("REVDOC_DEDUP_CACHE_TTL_SECS", "600")?;
    let dup_check_lookback_rows = parse_positive_usize("REVDOC_DUP_CHECK_LOOKBACK_ROWS", "2000")?;

    let enrich_batch_size = parse_positive_usize("REVDOC_ENRICH_BATCH_SIZE", "50")?;
    let enrich_max_attempts = parse_u32("REVDOC_ENRICH_MAX_ATTEMPTS", "3")?;
    if enrich_max_attempts == 0 {
        return Err(invalid(
            "REVDOC_ENRICH_MAX_ATTEMPTS",
            "must be greater than zero".to_string(),
        ));
    }
    let enrich_cron = or_default("REVDOC_ENRICH_CRON", "0 */5 * * * *");

    let weekly_report_enabled = parse_flag(
        "REVDOC_WEEKLY_REPORT_ENABLED",
        &or_default("REVDOC_WEEKLY_REPORT_ENABLED", "false"),
    )?;
    let weekly_report_cron = or_default("REVDOC_WEEKLY_REPORT_CRON", "0 9 * * Mon");

    let store_max_retries = parse_u32("REVDOC_STORE_MAX_RETRIES", "3")?;
    let store_retry_backoff_ms = parse_u64("REVDOC_STORE_RETRY_BACKOFF_MS", "500")?;

    Ok(AppConfig {
        env,
        log_level,
        data_dir,
        raw_table_prefix,
        registry_table,
        report_folder,
        brand_seeds_path,
        dedup_cache_capacity,
        dedup_cache_ttl_secs,
        dup_check_lookback_rows,
        enrich_batch_size,
        enrich_max_attempts,
        enrich_cron,
        weekly_report_enabled,
        weekly_report_cron,
        store_max_retries,
        store_retry_backoff_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVDOC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_flag(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
