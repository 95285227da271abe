use crate::core::currency::{Currency, CurrencySet, default_currencies};
use crate::core::retry::RetryPolicy;
use crate::providers::exchange_rate::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ExchangeRateProviderConfig {
    fn default() -> Self {
        ExchangeRateProviderConfig {
            base_url: default_base_url(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub exchange_rate: ExchangeRateProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_currencies")]
    pub currencies: Vec<Currency>,
    pub default_from: Option<String>,
    pub default_to: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

fn default_base_currency() -> String {
    "ARS".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: default_base_currency(),
            currencies: default_currencies(),
            default_from: None,
            default_to: None,
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cambio", "cambio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "cambio", "cambio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Validated supported currency set.
    pub fn currency_set(&self) -> Result<CurrencySet> {
        CurrencySet::new(&self.base_currency, self.currencies.clone())
            .context("Invalid currency configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
base_currency: "USD"
currencies:
  - code: "USD"
    name: "US Dollar"
    symbol: "$"
  - code: "EUR"
    name: "Euro"
    symbol: "€"
  - code: "chf"
    name: "Swiss Franc"
    symbol: "Fr"
default_from: "EUR"
default_to: "CHF"
providers:
  exchange_rate:
    base_url: "http://example.com/rates"
    retries: 2
    delay_ms: 100
data_path: "/tmp/cambio"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.currencies.len(), 3);
        assert_eq!(config.currencies[1].symbol, "€");
        assert_eq!(config.default_from.as_deref(), Some("EUR"));
        assert_eq!(config.default_to.as_deref(), Some("CHF"));
        assert_eq!(
            config.providers.exchange_rate.base_url,
            "http://example.com/rates"
        );
        assert_eq!(config.providers.exchange_rate.retry.retries, 2);
        assert_eq!(config.providers.exchange_rate.retry.delay_ms, 100);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/cambio")
        );

        let set = config.currency_set().unwrap();
        assert_eq!(set.base(), "USD");
        assert!(set.contains("CHF"));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.base_currency, "ARS");
        assert_eq!(config.currencies, default_currencies());
        assert_eq!(config.providers.exchange_rate.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.providers.exchange_rate.retry, RetryPolicy::default());
        assert!(config.default_from.is_none());
        assert!(config.data_path.is_none());

        let config: AppConfig =
            serde_yaml::from_str("providers:\n  exchange_rate:\n    base_url: \"http://x\"\n")
                .expect("Failed to deserialize");
        assert_eq!(config.providers.exchange_rate.retry.retries, 0);
        assert_eq!(config.providers.exchange_rate.retry.delay_ms, 500);
    }

    #[test]
    fn test_retries_without_base_url() {
        let config: AppConfig =
            serde_yaml::from_str("providers:\n  exchange_rate:\n    retries: 3\n")
                .expect("Failed to deserialize");
        assert_eq!(config.providers.exchange_rate.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.providers.exchange_rate.retry.retries, 3);
        assert_eq!(config.providers.exchange_rate.retry.delay_ms, 500);
    }

    #[test]
    fn test_invalid_currency_configuration() {
        let yaml_str = r#"
base_currency: "JPY"
currencies:
  - code: "USD"
    name: "US Dollar"
    symbol: "$"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        let err = config.currency_set().unwrap_err();
        assert_eq!(err.to_string(), "Invalid currency configuration");
    }
}
