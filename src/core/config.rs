use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_RATES_URL: &str = "https://api.fxratesapi.com/latest";
pub const DEFAULT_CURRENCIES_URL: &str = "https://api.fxratesapi.com/currencies";

pub const RATES_URL_ENV: &str = "FXCONV_RATES_URL";
pub const CURRENCIES_URL_ENV: &str = "FXCONV_CURRENCIES_URL";
pub const BASE_CURRENCY_ENV: &str = "FXCONV_BASE_CURRENCY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FxRatesProviderConfig {
    pub rates_url: String,
    pub currencies_url: String,
    pub timeout_secs: Option<u64>,
    pub retries: usize,
}

impl Default for FxRatesProviderConfig {
    fn default() -> Self {
        FxRatesProviderConfig {
            rates_url: DEFAULT_RATES_URL.to_string(),
            currencies_url: DEFAULT_CURRENCIES_URL.to_string(),
            timeout_secs: Some(30),
            retries: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub fxrates: FxRatesProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub base_currency: String,
    pub default_from: String,
    pub default_to: String,
    pub default_amount: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            base_currency: "USD".to_string(),
            default_from: "USD".to_string(),
            default_to: "INR".to_string(),
            default_amount: 1.0,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been set up. Environment overrides apply either way.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxconv", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config = Self::from_file(path)?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Reads the config file alone, without environment overrides.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies environment-level endpoint and base currency overrides.
    pub fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(RATES_URL_ENV) {
            debug!(%url, "Rates endpoint overridden from environment");
            self.providers.fxrates.rates_url = url;
        }
        if let Some(url) = non_empty(CURRENCIES_URL_ENV) {
            debug!(%url, "Currencies endpoint overridden from environment");
            self.providers.fxrates.currencies_url = url;
        }
        if let Some(base) = non_empty(BASE_CURRENCY_ENV) {
            self.base_currency = base.trim().to_uppercase();
        }
        self
    }
}
