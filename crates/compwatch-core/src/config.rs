use std::path::Path;

use crate::app_config::{AppConfig, ClassifierKind, FillValue, MissingPolicy};
use crate::records::{parse_timestamp, Field};
use crate::ConfigError;

/// Config file read when neither `--config` nor `COMPWATCH_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Load, apply env overrides to, and validate the configuration file at `path`.
///
/// Overrides come from the process environment; the CLI loads `.env` into it
/// before calling this.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, contains
/// unknown keys, lacks a required key, or holds an invalid value.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_config_from_str(&content, |key| std::env::var(key))
}

/// Parse and validate configuration from YAML text, resolving env overrides
/// through `lookup`.
///
/// Decoupled from the process environment so tests can pass a plain map.
///
/// Recognized overrides: `COMPWATCH_API_TOKEN`, `COMPWATCH_API_BASE_URL`,
/// `COMPWATCH_LOG_LEVEL`, `COMPWATCH_MAX_RETRIES`.
///
/// # Errors
///
/// Returns `ConfigError` on parse failure or any validation failure.
pub fn load_config_from_str<F>(yaml: &str, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let mut config: AppConfig = serde_yaml::from_str(yaml)?;

    if let Ok(token) = lookup("COMPWATCH_API_TOKEN") {
        config.api.auth_token = Some(token);
    }
    if let Ok(url) = lookup("COMPWATCH_API_BASE_URL") {
        config.api.base_url = Some(url);
    }
    if let Ok(level) = lookup("COMPWATCH_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(raw) = lookup("COMPWATCH_MAX_RETRIES") {
        config.api.max_retries = raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: "COMPWATCH_MAX_RETRIES".to_string(),
            reason: e.to_string(),
        })?;
    }

    validate(&config)?;
    Ok(config)
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_url(key: &str, raw: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(raw).map_err(|e| invalid(key, format!("'{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(key, format!("'{raw}' must use http or https")));
    }
    Ok(())
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let api = &config.api;
    let base_url = api
        .base_url
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingKey("api.base_url".to_string()))?;
    validate_url("api.base_url", base_url)?;

    if api.page_size == 0 {
        return Err(invalid("api.page_size", "must be greater than 0"));
    }
    if api.max_pages == 0 {
        return Err(invalid("api.max_pages", "must be greater than 0"));
    }
    if api.request_timeout_secs == 0 {
        return Err(invalid("api.request_timeout_secs", "must be greater than 0"));
    }
    if api.retry_backoff_max_ms < api.retry_backoff_base_ms {
        return Err(invalid(
            "api.retry_backoff_max_ms",
            "must not be smaller than api.retry_backoff_base_ms",
        ));
    }
    if api.auth_header.trim().is_empty() {
        return Err(invalid("api.auth_header", "must be non-empty"));
    }
    if api.records_field.trim().is_empty() {
        return Err(invalid("api.records_field", "must be non-empty"));
    }

    validate_cleaning(config)?;

    let analysis = &config.analysis;
    if analysis.batch_size == 0 {
        return Err(invalid("analysis.batch_size", "must be greater than 0"));
    }
    if analysis.max_input_chars == 0 {
        return Err(invalid("analysis.max_input_chars", "must be greater than 0"));
    }
    if analysis.batch_timeout_secs == Some(0) {
        return Err(invalid("analysis.batch_timeout_secs", "must be greater than 0"));
    }
    if !(0.0..1.0).contains(&analysis.neutral_threshold) {
        return Err(invalid("analysis.neutral_threshold", "must be within [0, 1)"));
    }
    if analysis.classifier == ClassifierKind::Remote {
        let url = analysis
            .remote_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey("analysis.remote_url".to_string()))?;
        validate_url("analysis.remote_url", url)?;
    }

    let file_name = config.report.file_name.trim();
    if file_name.is_empty() || !file_name.ends_with(".xlsx") {
        return Err(invalid("report.file_name", "must be a non-empty .xlsx file name"));
    }
    if config.schedule.cron.trim().is_empty() {
        return Err(invalid("schedule.cron", "must be non-empty"));
    }

    Ok(())
}

fn validate_cleaning(config: &AppConfig) -> Result<(), ConfigError> {
    for field in Field::ALL {
        let key = format!("cleaning.missing.{field}");
        match config.cleaning.policy_for(field) {
            MissingPolicy::FillMean if field != Field::Price => {
                return Err(invalid(&key, "fill-mean only applies to numeric fields (price)"));
            }
            MissingPolicy::Keep
                if matches!(field, Field::Name | Field::Price | Field::CollectedAt) =>
            {
                return Err(invalid(&key, "keep is only allowed for optional fields"));
            }
            MissingPolicy::FillDefault { default } => validate_fill_default(&key, field, &default)?,
            _ => {}
        }
    }

    if let Some(range) = config.cleaning.price_range {
        if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
            return Err(invalid(
                "cleaning.price_range",
                format!("min ({}) must be <= max ({}) and both finite", range.min, range.max),
            ));
        }
    }
    Ok(())
}

fn validate_fill_default(key: &str, field: Field, default: &FillValue) -> Result<(), ConfigError> {
    match (field, default) {
        (Field::Price, FillValue::Number(n)) if !n.is_finite() => {
            Err(invalid(key, "default must be a finite number"))
        }
        (Field::Price, FillValue::Text(s)) if !s.trim().parse::<f64>().is_ok_and(f64::is_finite) => {
            Err(invalid(key, format!("default '{s}' is not a number")))
        }
        (Field::CollectedAt, value) if parse_timestamp(&value.to_string()).is_none() => {
            Err(invalid(key, format!("default '{value}' is not a timestamp")))
        }
        (Field::Name | Field::Category, value) if value.to_string().trim().is_empty() => {
            Err(invalid(key, "default must be non-empty"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
