use crate::core::market::Market;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Sessions expire after this many days without a request.
    #[serde(default = "default_session_days")]
    pub session_days: i64,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_session_days() -> i64 {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            secure_cookies: false,
            session_days: default_session_days(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Disk,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    #[serde(default = "default_markets")]
    pub markets: Vec<Market>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            data_path: None,
            markets: default_markets(),
        }
    }
}

fn market(symbol: &str, name: &str, supply: i64, borrow: i64, liquidity: i64, price: i64) -> Market {
    Market {
        symbol: symbol.to_string(),
        name: name.to_string(),
        supply_apy: Decimal::new(supply, 2),
        borrow_apy: Decimal::new(borrow, 2),
        liquidity: Decimal::new(liquidity, 0),
        price: Decimal::new(price, 2),
    }
}

/// The demo market table shown when no markets are configured.
pub fn default_markets() -> Vec<Market> {
    vec![
        market("ETH", "Ethereum", 320, 450, 420_000_000, 245_000),
        market("USDC", "USD Coin", 580, 710, 850_000_000, 100),
        market("WBTC", "Wrapped BTC", 150, 280, 310_000_000, 4_210_000),
        market("DAI", "Dai Stablecoin", 550, 690, 120_000_000, 100),
        market("AAVE", "Aave", 420, 550, 80_000_000, 9_540),
    ]
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Loads the default config file, falling back to built-in defaults when
    /// it has not been created yet.
    pub fn load_or_default() -> Result<Self> {
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
        let proj_dirs = ProjectDirs::from("org", "dabloan", "dabloan")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "dabloan", "dabloan")
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
}
