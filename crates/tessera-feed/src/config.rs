//! Construction-time configuration for a [`PriceFeed`](crate::PriceFeed).

use serde::{Deserialize, Serialize};

/// Who may clear stored prices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Anyone may clear.
    Open,
    /// Only the administrator or an authorized operator may clear.
    #[default]
    Restricted,
}

/// Feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum accepted package age in seconds. Must be at least 15.
    #[serde(default = "default_max_price_delay")]
    pub max_price_delay_secs: u64,
    /// Clearing authorization policy.
    #[serde(default)]
    pub clear_policy: ClearPolicy,
}

fn default_max_price_delay() -> u64 {
    300
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_price_delay_secs: default_max_price_delay(),
            clear_policy: ClearPolicy::default(),
        }
    }
}

impl FeedConfig {
    pub fn with_delay(max_price_delay_secs: u64) -> Self {
        Self {
            max_price_delay_secs,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.max_price_delay_secs, 300);
        assert_eq!(config.clear_policy, ClearPolicy::Restricted);
    }

    #[test]
    fn test_partial_toml() {
        let config: FeedConfig = toml::from_str("clear_policy = \"open\"").expect("parse");
        assert_eq!(config.clear_policy, ClearPolicy::Open);
        assert_eq!(config.max_price_delay_secs, 300);
    }
}
