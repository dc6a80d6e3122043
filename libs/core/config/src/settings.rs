//! Named string settings resolved at call time.
//!
//! Handlers read a few settings (fallback addresses, portal links) on every
//! invocation rather than once at startup.

use crate::ConfigError;
use std::collections::HashMap;

/// Source of named string settings.
pub trait SettingsProvider: Send + Sync {
    /// Look up a setting. Blank values count as absent.
    fn get(&self, name: &str) -> Option<String>;

    /// Look up a setting that must be present.
    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    }
}

/// Reads settings from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings;

impl SettingsProvider for EnvSettings {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Fixed, map-backed settings.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SettingsProvider for StaticSettings {
    fn get(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_settings_reads_at_call_time() {
        let settings = EnvSettings;
        temp_env::with_var("FEED_READ_NOTIFICATION_ADDRESS", Some("ops@example.com"), || {
            assert_eq!(
                settings.get("FEED_READ_NOTIFICATION_ADDRESS").as_deref(),
                Some("ops@example.com")
            );
        });
        temp_env::with_var_unset("FEED_READ_NOTIFICATION_ADDRESS", || {
            assert!(settings.get("FEED_READ_NOTIFICATION_ADDRESS").is_none());
        });
    }

    #[test]
    fn test_required_reports_setting_name() {
        let settings = StaticSettings::new().with("PRESENT", "value").with("BLANK", " ");

        assert_eq!(settings.required("PRESENT").unwrap(), "value");
        assert_eq!(
            settings.required("BLANK").unwrap_err(),
            ConfigError::MissingEnvVar("BLANK".to_string())
        );
        assert!(settings.required("ABSENT").is_err());
    }
}
