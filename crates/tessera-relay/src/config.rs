//! Relay configuration file.
//!
//! Read from `$TESSERA_CONFIG` if set, otherwise `./tessera.toml`. A missing
//! file yields the defaults: a mock connector and the lite encoding.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroizing;

use tessera_codec::EncoderStrategy;
use tessera_types::Address;

/// Complete relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub injector: InjectorConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which connector to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    #[default]
    Mock,
    Cache,
    Aggregator,
}

/// One cache endpoint of an aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub provider_id: String,
}

/// Connector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub kind: ConnectorKind,
    #[serde(default = "default_data_source_id")]
    pub data_source_id: String,
    /// Restrict payloads to one asset. Unset = every asset the source serves.
    #[serde(default)]
    pub asset: Option<String>,
    /// Cache service base URL (cache only).
    #[serde(default)]
    pub url: String,
    /// Provider identifier sent to the cache (cache only).
    #[serde(default)]
    pub provider_id: String,
    /// Per-request deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Successful sources required (aggregator only).
    #[serde(default = "default_min_sources")]
    pub min_sources: usize,
    /// Endpoints queried by the aggregator.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Injector settings.
///
/// The signing key is never serialized back out and `Debug` redacts it.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct InjectorConfig {
    #[serde(default)]
    pub strategy: EncoderStrategy,
    /// Hex private key for signing bare packages. Empty = none.
    #[serde(default, skip_serializing, deserialize_with = "deserialize_key")]
    signing_key: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for InjectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectorConfig")
            .field("strategy", &self.strategy)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn deserialize_key<'de, D>(deserializer: D) -> Result<Option<Zeroizing<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Zeroizing::new(String::deserialize(deserializer)?);
    let key = raw.trim();
    Ok((!key.is_empty()).then(|| Zeroizing::new(key.to_string())))
}

/// Settings used by `inspect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default = "default_max_price_delay")]
    pub max_price_delay_secs: u64,
    #[serde(default)]
    pub authorized_signers: Vec<Address>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_data_source_id() -> String {
    "redstone-stocks".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_min_sources() -> usize {
    1
}

fn default_max_price_delay() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            kind: ConnectorKind::default(),
            data_source_id: default_data_source_id(),
            asset: None,
            url: String::new(),
            provider_id: String::new(),
            timeout_ms: default_timeout_ms(),
            min_sources: default_min_sources(),
            sources: Vec::new(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_price_delay_secs: default_max_price_delay(),
            authorized_signers: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl InjectorConfig {
    /// The configured key text, if any, held in zeroizing storage.
    pub fn signing_key(&self) -> Option<Zeroizing<String>> {
        self.signing_key.clone()
    }

    /// Set the key text. Blank text clears it.
    pub fn with_signing_key(mut self, key: &str) -> Self {
        let key = key.trim();
        self.signing_key = (!key.is_empty()).then(|| Zeroizing::new(key.to_string()));
        self
    }
}

impl RelayConfig {
    /// Load configuration from `path`.
    ///
    /// Falls back to defaults if the file does not exist. Runs before the
    /// subscriber is installed, so it does not log.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> PathBuf {
        // Check env var override first
        if let Ok(path) = std::env::var("TESSERA_CONFIG") {
            return PathBuf::from(path);
        }
        PathBuf::from("tessera.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.connector.kind, ConnectorKind::Mock);
        assert_eq!(config.connector.timeout_ms, 5_000);
        assert_eq!(config.injector.strategy, EncoderStrategy::Lite);
        assert_eq!(config.verify.max_price_delay_secs, 300);
        assert_eq!(config.logging.level, "info");
        assert!(config.injector.signing_key().is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = RelayConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: RelayConfig = toml::from_str(&toml_str).expect("parse");
    }

    #[test]
    fn test_signing_key_redacted() {
        let config: RelayConfig = toml::from_str(
            r#"
            [injector]
            signing_key = " 4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318 "
            "#,
        )
        .expect("parse");

        let key = config.injector.signing_key().expect("key");
        assert_eq!(key.len(), 64);
        assert!(!format!("{config:?}").contains("4c0883a6"));
        assert!(format!("{:?}", config.injector).contains("<redacted>"));
        let written = toml::to_string(&config).expect("serialize");
        assert!(!written.contains("4c0883a6"));
    }

    #[test]
    fn test_blank_signing_key_is_none() {
        let config: RelayConfig =
            toml::from_str("[injector]\nsigning_key = \"  \"\n").expect("parse");
        assert!(config.injector.signing_key().is_none());
        assert!(InjectorConfig::default().with_signing_key("").signing_key().is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("tessera-relay-missing-config.toml");
        let config = RelayConfig::load_from(&path).expect("load");
        assert_eq!(config.connector.kind, ConnectorKind::Mock);
    }

    #[test]
    fn test_parse_aggregator() {
        let config: RelayConfig = toml::from_str(
            r#"
            [connector]
            kind = "aggregator"
            asset = "IBM"
            min_sources = 2
            sources = [
                { url = "https://a.example", provider_id = "p1" },
                { url = "https://b.example", provider_id = "p2" },
            ]

            [injector]
            strategy = "full"

            [verify]
            authorized_signers = ["0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"]
            "#,
        )
        .expect("parse");

        assert_eq!(config.connector.kind, ConnectorKind::Aggregator);
        assert_eq!(config.connector.sources.len(), 2);
        assert_eq!(config.connector.asset.as_deref(), Some("IBM"));
        assert_eq!(config.injector.strategy, EncoderStrategy::Full);
        assert_eq!(config.verify.authorized_signers.len(), 1);
        assert_eq!(config.verify.max_price_delay_secs, 300);
    }
}
