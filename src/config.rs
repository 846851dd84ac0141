use std::{env, num::ParseIntError, path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

use crate::marketdata::api_caller;

pub const DEFAULT_DB_PATH: &str = "stocks.db";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Environment keys, usually set in `.env`.
const DB_PATH_KEY: &str = "stocks_db";
const BASE_URL_KEY: &str = "chart_base_url";
const TIMEOUT_KEY: &str = "request_timeout_secs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid chart_base_url '{0}': {1}")]
    InvalidBaseUrl(String, url::ParseError),
    #[error("Invalid request_timeout_secs '{0}': {1}")]
    InvalidTimeout(String, ParseIntError),
}

/// Runtime settings resolved from flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub chart_base_url: Url,
    pub request_timeout: Option<Duration>, // None disables the timeout.
}

impl Config {
    pub fn from_env(db_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve(db_override, |key| env::var(key).ok())
    }

    fn resolve(
        db_override: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let db_path = db_override
            .or_else(|| lookup(DB_PATH_KEY).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let base_url = lookup(BASE_URL_KEY).unwrap_or_else(|| api_caller::DEFAULT_BASE_URL.into());
        let chart_base_url =
            Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl(base_url.clone(), e))?;

        let timeout_secs = match lookup(TIMEOUT_KEY) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidTimeout(raw.clone(), e))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let request_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(Self {
            db_path,
            chart_base_url,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_with(
        db_override: Option<PathBuf>,
        vars: &[(&str, &str)],
    ) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(db_override, |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = resolve_with(None, &[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("stocks.db"));
        assert_eq!(config.chart_base_url.as_str(), "https://query1.finance.yahoo.com/");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn flag_beats_environment_for_db_path() {
        let vars = [("stocks_db", "/tmp/env.db")];
        let config = resolve_with(Some(PathBuf::from("flag.db")), &vars).unwrap();
        assert_eq!(config.db_path, PathBuf::from("flag.db"));

        let config = resolve_with(None, &vars).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/env.db"));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = resolve_with(None, &[("request_timeout_secs", "0")]).unwrap();
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            resolve_with(None, &[("request_timeout_secs", "soon")]),
            Err(ConfigError::InvalidTimeout(_, _))
        ));
        assert!(matches!(
            resolve_with(None, &[("chart_base_url", "not a url")]),
            Err(ConfigError::InvalidBaseUrl(_, _))
        ));
    }
}
