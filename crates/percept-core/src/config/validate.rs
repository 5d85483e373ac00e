//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_secs must be > 0".into(),
            ));
        }
        if self.limits.max_image_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_size_mb must be > 0".into(),
            ));
        }
        if self.backends.qwen.alignment == 0 {
            return Err(ConfigError::ValidationError(
                "backends.qwen.alignment must be > 0".into(),
            ));
        }
        if self.backends.qwen.max_new_tokens == 0
            || self.backends.llama.max_new_tokens == 0
            || self.backends.molmo.max_new_tokens == 0
        {
            return Err(ConfigError::ValidationError(
                "backend max_new_tokens must be > 0".into(),
            ));
        }
        if self.backends.gpt4.max_tokens == 0 || self.backends.pixtral.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "backend max_tokens must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.backends.pixtral.temperature) {
            return Err(ConfigError::ValidationError(
                "backends.pixtral.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_alignment() {
        let mut config = Config::default();
        config.backends.qwen.alignment = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alignment"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.request_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_invalid_temperature() {
        let mut config = Config::default();
        config.backends.pixtral.temperature = 3.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }
}
