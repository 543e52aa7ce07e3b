use crate::config::{Config, MAX_COMMENTS, MIN_COMMENTS};
use crate::error::{Result, TubesentError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_youtube(config, &mut errors);
        Self::validate_fetch(config, &mut errors);
        Self::validate_model(config, &mut errors);
        Self::validate_aggregate(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TubesentError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }

        if config.storage.stale_analysis_secs == 0 {
            errors.push(ValidationError::new(
                "storage.stale_analysis_secs",
                "Stale analysis timeout must be greater than 0",
            ));
        }
    }

    fn validate_youtube(config: &Config, errors: &mut Vec<ValidationError>) {
        // The key itself is only required by commands that reach the API,
        // so only the variable name is checked here.
        if config.youtube.api_key_env.is_empty() {
            errors.push(ValidationError::new(
                "youtube.api_key_env",
                "API key environment variable name cannot be empty",
            ));
        }

        if !Self::is_http_url(&config.youtube.base_url) {
            errors.push(ValidationError::new(
                "youtube.base_url",
                format!("Base URL must start with http:// or https://, got '{}'", config.youtube.base_url),
            ));
        }

        if config.youtube.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "youtube.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_fetch(config: &Config, errors: &mut Vec<ValidationError>) {
        let max = config.fetch.max_comments;
        if !(MIN_COMMENTS..=MAX_COMMENTS).contains(&max) {
            errors.push(ValidationError::new(
                "fetch.max_comments",
                format!(
                    "Max comments must be between {} and {}, got {}",
                    MIN_COMMENTS, MAX_COMMENTS, max
                ),
            ));
        }
    }

    fn validate_model(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.model.name.is_empty() {
            errors.push(ValidationError::new(
                "model.name",
                "Model name cannot be empty",
            ));
        }

        if !Self::is_http_url(&config.model.endpoint) {
            errors.push(ValidationError::new(
                "model.endpoint",
                format!("Endpoint must start with http:// or https://, got '{}'", config.model.endpoint),
            ));
        }

        if config.model.batch_size == 0 {
            errors.push(ValidationError::new(
                "model.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if !(1..=512).contains(&config.model.max_length) {
            errors.push(ValidationError::new(
                "model.max_length",
                format!(
                    "Max length must be between 1 and 512 tokens, got {}",
                    config.model.max_length
                ),
            ));
        }

        if config.model.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "model.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_aggregate(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.aggregate.sample_size == 0 {
            errors.push(ValidationError::new(
                "aggregate.sample_size",
                "Sample size must be greater than 0",
            ));
        }

        if config.aggregate.top_terms == 0 {
            errors.push(ValidationError::new(
                "aggregate.top_terms",
                "Top terms must be greater than 0",
            ));
        }

        if config.aggregate.bucket_hours == 0 || config.aggregate.bucket_hours > 24 * 7 {
            errors.push(ValidationError::new(
                "aggregate.bucket_hours",
                format!(
                    "Bucket width must be between 1 and 168 hours, got {}",
                    config.aggregate.bucket_hours
                ),
            ));
        }
    }

    fn is_http_url(s: &str) -> bool {
        s.starts_with("http://") || s.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_max_comments_out_of_range() {
        let mut config = Config::default();
        config.fetch.max_comments = 99;
        assert!(ConfigValidator::validate(&config).is_err());

        config.fetch.max_comments = 5001;
        assert!(ConfigValidator::validate(&config).is_err());

        config.fetch.max_comments = 5000;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.model.batch_size = 0;
        config.model.endpoint = "ftp://example".to_string();
        config.aggregate.sample_size = 0;

        match ConfigValidator::validate(&config) {
            Err(TubesentError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.path == "model.batch_size"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_stale_timeout_rejected() {
        let mut config = Config::default();
        config.storage.stale_analysis_secs = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_max_length_cap() {
        let mut config = Config::default();
        config.model.max_length = 1024;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
