use std::{env, path::PathBuf, time::Duration};

use crate::stats::CorrelationPolicy;

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

/// Runtime settings, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub weather_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_url: String,
    pub gemini_model: String,
    pub http_timeout: Duration,
    pub correlation: CorrelationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/symptoms.json"),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            gemini_api_key: None,
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            http_timeout: Duration::from_secs(10),
            correlation: CorrelationPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        let correlation = CorrelationPolicy {
            temperature_threshold_c: parse_or(
                get("CORRELATION_TEMPERATURE_C"),
                defaults.correlation.temperature_threshold_c,
            ),
            humidity_threshold_pct: parse_or(
                get("CORRELATION_HUMIDITY_PCT"),
                defaults.correlation.humidity_threshold_pct,
            ),
            ..defaults.correlation
        };

        Self {
            port: parse_or(get("PORT"), defaults.port),
            data_path: get("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            weather_url: get("WEATHER_API_URL").unwrap_or(defaults.weather_url),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_url: get("GEMINI_API_URL").unwrap_or(defaults.gemini_url),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            http_timeout: Duration::from_secs(parse_or(get("HTTP_TIMEOUT_SECS"), 10)),
            correlation,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, fallback: T) -> T {
    value
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/symptoms.json"));
        assert_eq!(config.weather_url, DEFAULT_WEATHER_URL);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.correlation, CorrelationPolicy::default());
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = config_from(&[
            ("PORT", "9001"),
            ("APP_DATA_PATH", "/tmp/logs.json"),
            ("GEMINI_API_KEY", "  "),
            ("HTTP_TIMEOUT_SECS", "soon"),
            ("CORRELATION_TEMPERATURE_C", "27.5"),
        ]);
        assert_eq!(config.port, 9001);
        assert_eq!(config.data_path, PathBuf::from("/tmp/logs.json"));
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.correlation.temperature_threshold_c, 27.5);
        assert_eq!(config.correlation.humidity_threshold_pct, 70.0);
    }
}
