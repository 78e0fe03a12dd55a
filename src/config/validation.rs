use crate::config::types::{
    CategoryConfig, Config, ImportConfig, OutputConfig, PaginationConfig, RetryConfig,
    SourceConfig, StrategyKind, UserAgentConfig,
};
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_source_config(&config.source)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_retry_config(&config.retry)?;
    validate_pagination_config(&config.pagination)?;
    validate_category_config(&config.categories)?;
    validate_output_config(&config.output)?;
    if let Some(import) = &config.import {
        validate_import_config(import)?;
    }
    Ok(())
}

/// Validates the source API configuration
fn validate_source_config(config: &SourceConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    for (name, path) in [
        ("list-path", &config.list_path),
        ("detail-path", &config.detail_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.per_page == 0 {
        return Err(ConfigError::Validation(
            "per-page must be >= 1, got 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    if config.harvester_name.is_empty() {
        return Err(ConfigError::Validation(
            "harvester-name cannot be empty".to_string(),
        ));
    }

    if !config
        .harvester_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "harvester-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.harvester_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> ConfigResult<()> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.initial_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "initial-backoff-ms ({}) cannot exceed max-backoff-ms ({})",
            config.initial_backoff_ms, config.max_backoff_ms
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates pagination configuration
fn validate_pagination_config(config: &PaginationConfig) -> ConfigResult<()> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.department_batch_size < 1 {
        return Err(ConfigError::Validation(
            "department-batch-size must be >= 1".to_string(),
        ));
    }

    if config.strategy == StrategyKind::Department && config.departments.is_empty() {
        return Err(ConfigError::Validation(
            "department strategy requires at least one [[pagination.department]]".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for department in &config.departments {
        if !seen.insert(department.id) {
            return Err(ConfigError::Validation(format!(
                "department id {} is listed more than once",
                department.id
            )));
        }
    }

    Ok(())
}

/// Validates category rules
fn validate_category_config(config: &CategoryConfig) -> ConfigResult<()> {
    for rule in &config.keyword_rules {
        if rule.keyword.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "keyword rule for category '{}' has an empty keyword",
                rule.category
            )));
        }
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the import endpoint configuration
fn validate_import_config(config: &ImportConfig) -> ConfigResult<()> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid import endpoint: {}", e)))?;

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "import batch-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> ConfigResult<()> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact-email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
