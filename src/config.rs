//! Runtime configuration read from the environment (after `.env` is loaded)

use crate::error::OrchestrationError;
use crate::Result;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TERMINATION_MARKER: &str = "TERMINATE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub termination_marker: String,
    /// `None` keeps retrying until the verifier accepts
    pub max_rounds: Option<u32>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            termination_marker: DEFAULT_TERMINATION_MARKER.to_string(),
            max_rounds: None,
        }
    }
}

impl TutorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank values take the default
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let timeout = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("GEMINI_TIMEOUT_SECS", &raw)?),
            None => defaults.timeout,
        };

        let max_rounds = get("TUTOR_MAX_ROUNDS")
            .map(|raw| parse_positive("TUTOR_MAX_ROUNDS", &raw))
            .transpose()?
            .map(|n| n as u32);

        Ok(Self {
            api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            model: get("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: get("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout,
            termination_marker: get("TUTOR_TERMINATION_MARKER")
                .unwrap_or(defaults.termination_marker),
            max_rounds,
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(n) if n > 0 && n <= u32::MAX as u64 => Ok(n),
        _ => Err(OrchestrationError::ConfigurationError(format!(
            "{} must be a positive integer, got `{}`",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<TutorConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TutorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, TutorConfig::default());
        assert_eq!(config.model, "gemini-1.5-pro-latest");
        assert_eq!(config.termination_marker, "TERMINATE");
        assert_eq!(config.max_rounds, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_BASE_URL", "http://localhost:9000/models/"),
            ("GEMINI_TIMEOUT_SECS", "5"),
            ("TUTOR_TERMINATION_MARKER", "DONE"),
            ("TUTOR_MAX_ROUNDS", "3"),
        ])
        .unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "http://localhost:9000/models");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.termination_marker, "DONE");
        assert_eq!(config.max_rounds, Some(3));
    }

    #[test]
    fn test_malformed_numbers_are_errors() {
        for (key, value) in [
            ("TUTOR_MAX_ROUNDS", "0"),
            ("TUTOR_MAX_ROUNDS", "many"),
            ("GEMINI_TIMEOUT_SECS", "-1"),
        ] {
            let err = config_from(&[(key, value)]).unwrap_err();
            assert!(
                matches!(err, OrchestrationError::ConfigurationError(_)),
                "{}={}",
                key,
                value
            );
        }
    }
}
