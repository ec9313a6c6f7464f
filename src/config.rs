use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::matching::units::{ConversionTable, UnitError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub concurrency: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 5,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity for two products to count as a match, in (0, 1].
    pub similarity_threshold: f64,
    /// Cap on candidates kept per product; unset means unbounded.
    pub max_matches: Option<u32>,
    /// Sparse, directional unit conversion factors.
    pub unit_conversions: HashMap<String, HashMap<String, f64>>,
    /// Retailer branding tokens stripped from listing names, per chain id.
    pub brand_strip_tokens: HashMap<String, Vec<String>>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let mut unit_conversions = HashMap::new();
        unit_conversions.insert("ml".to_string(), HashMap::from([("l".to_string(), 0.001)]));
        unit_conversions.insert("l".to_string(), HashMap::from([("ml".to_string(), 1000.0)]));
        unit_conversions.insert("g".to_string(), HashMap::from([("kg".to_string(), 0.001)]));
        unit_conversions.insert("kg".to_string(), HashMap::from([("g".to_string(), 1000.0)]));

        let brand_strip_tokens = HashMap::from([
            ("rami_levy".to_string(), vec!["רמי לוי".to_string()]),
            ("shufersal".to_string(), vec!["שופרסל".to_string()]),
            ("yochananof".to_string(), vec!["יוחננוף".to_string()]),
            ("tiv_taam".to_string(), vec!["טיב טעם".to_string()]),
            ("victory".to_string(), vec!["ויקטורי".to_string()]),
        ]);

        Self {
            similarity_threshold: 0.8,
            max_matches: None,
            unit_conversions,
            brand_strip_tokens,
        }
    }
}

impl MatchingConfig {
    pub fn conversion_table(&self) -> Result<ConversionTable, UnitError> {
        ConversionTable::from_config(&self.unit_conversions)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(anyhow!(
                "matching.similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            ));
        }
        if let Some(0) = self.max_matches {
            return Err(anyhow!("matching.max_matches must be at least 1 when set"));
        }
        self.conversion_table()
            .context("matching.unit_conversions contains an unsupported unit")?;
        Ok(())
    }
}

/// One retailer chain the collector scrapes each round.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
    pub name: String,
    pub listing_url: String,
    #[serde(default)]
    pub branch_id: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn default_chains() -> Vec<ChainConfig> {
    let chains = [
        (
            "rami_levy",
            "רמי לוי",
            "https://www.rami-levy.co.il/files/price_list.pdf",
        ),
        ("shufersal", "שופרסל", "https://www.shufersal.co.il/online/he/A/"),
        ("yochananof", "יוחננוף", "https://www.yochananof.co.il/"),
        ("tiv_taam", "טיב טעם", "https://www.tivtaam.co.il/"),
        ("victory", "ויקטורי", "https://www.victory.co.il/"),
    ];
    chains
        .into_iter()
        .map(|(chain_id, name, listing_url)| ChainConfig {
            chain_id: chain_id.to_string(),
            name: name.to_string(),
            listing_url: listing_url.to_string(),
            branch_id: String::new(),
            branch_name: None,
            address: None,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/pricewatch.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub collector: CollectorConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
    pub chains: Vec<ChainConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            db: DbConfig::default(),
            collector: CollectorConfig::default(),
            matching: MatchingConfig::default(),
            logging: LoggingConfig::default(),
            chains: default_chains(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            let path = locate_default_config();
            if let Some(path) = path {
                Self::load_from_file(&path)?
            } else {
                AppConfig::default()
            }
        };

        Self::apply_env_overrides(config)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        Ok(config)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.db.url = url;
        }

        if let Some(max_conn) = parse_optional_env("DB_MAX_CONNECTIONS")? {
            config.db.max_connections = max_conn;
        }

        if let Some(interval) = parse_optional_env("COLLECT_INTERVAL_SECS")? {
            config.collector.interval_secs = interval;
        }

        if let Some(timeout) = parse_optional_env("COLLECT_TIMEOUT_SECS")? {
            config.collector.request_timeout_secs = timeout;
        }

        if let Some(retries) = parse_optional_env("COLLECT_MAX_RETRIES")? {
            config.collector.max_retries = retries;
        }

        if let Some(threshold) = parse_optional_env("SIMILARITY_THRESHOLD")? {
            config.matching.similarity_threshold = threshold;
        }

        if let Some(max_matches) = parse_optional_env("MAX_MATCHES")? {
            config.matching.max_matches = Some(max_matches);
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        if config.db.url.trim().is_empty() {
            return Err(anyhow!(
                "database url missing; set DATABASE_URL env var or db.url in config file"
            ));
        }

        config.matching.validate()?;

        Ok(config)
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(
            v.parse::<T>()
                .with_context(|| format!("{key} must be a valid value"))?,
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    for path in candidates {
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matching_config_is_valid() {
        MatchingConfig::default().validate().unwrap();
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let mut config = MatchingConfig::default();
        config.similarity_threshold = 0.0;
        assert!(config.validate().is_err());
        config.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_matches_is_rejected() {
        let mut config = MatchingConfig::default();
        config.max_matches = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_conversion_unit_is_rejected() {
        let mut config = MatchingConfig::default();
        config
            .unit_conversions
            .insert("oz".to_string(), HashMap::from([("g".to_string(), 28.3)]));
        assert!(config.validate().is_err());
    }
}
