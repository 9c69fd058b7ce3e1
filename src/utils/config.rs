use std::env;
use std::time::Duration;

use url::Url;

use crate::viewport::ScrollThresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_api_url: Url,
    pub request_timeout: Duration,
    pub log_level: String,
    pub environment: String,
    pub scroll_thresholds: ScrollThresholds,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CATALOG_API_URL")
            .ok_or_else(|| anyhow::anyhow!("CATALOG_API_URL is not set"))?;
        let catalog_api_url = Url::parse(raw_url.trim())
            .map_err(|e| anyhow::anyhow!("CATALOG_API_URL is not a valid URL: {}", e))?;

        let config = Config {
            catalog_api_url,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10u64)?),
            log_level: lookup("LOG_LEVEL").unwrap_or("info".to_string()),
            environment: lookup("APP_ENV").unwrap_or("development".to_string()),
            scroll_thresholds: ScrollThresholds {
                near_bottom_px: parse_or(&lookup, "NEAR_BOTTOM_THRESHOLD_PX", 150.0)?,
                back_to_top_px: parse_or(&lookup, "BACK_TO_TOP_THRESHOLD_PX", 300.0)?,
            },
        };

        config.validate()?;
        tracing::info!("Config: successfully loaded for {} environment", config.environment);
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        match self.catalog_api_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "CATALOG_API_URL must use http or https, got '{}'",
                    other
                ))
            }
        }

        if self.is_production() && self.catalog_api_url.scheme() != "https" {
            return Err(anyhow::anyhow!("CATALOG_API_URL must use https in production"));
        }

        if self.request_timeout.is_zero() {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
        }

        if self.scroll_thresholds.near_bottom_px < 0.0 || self.scroll_thresholds.back_to_top_px < 0.0 {
            return Err(anyhow::anyhow!("Scroll thresholds must not be negative"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("CATALOG_API_URL", "http://localhost:3000/api")])).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.scroll_thresholds, ScrollThresholds::default());
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_url_fails() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_production_requires_https() {
        let result = Config::from_lookup(lookup_from(&[
            ("CATALOG_API_URL", "http://pos.example.com"),
            ("APP_ENV", "production"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_threshold_is_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("CATALOG_API_URL", "http://localhost:3000"),
            ("NEAR_BOTTOM_THRESHOLD_PX", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("NEAR_BOTTOM_THRESHOLD_PX"));
    }
}
