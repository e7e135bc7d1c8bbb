//! # tessera-connector
//!
//! Sources of price packages for the injector.
//!
//! A connector either returns a package already signed by a provider or a
//! bare package for the injector to sign. It never returns a partially
//! populated package: anything short of a complete answer is an error.
//!
//! ## Modules
//!
//! - [`mock`] — fixed prices stamped from an injected clock
//! - [`cache`] — HTTP client for a signed-package cache service
//! - [`aggregator`] — concurrent fan-out with per-symbol median

pub mod aggregator;
pub mod cache;
pub mod mock;

pub use aggregator::AggregatorConnector;
pub use cache::CacheLayerConnector;
pub use mock::MockConnector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tessera_types::{PricePackage, SignedPackage, Symbol};

/// Error types for fetching price packages.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Transport failure or non-success status.
    #[error("http error: {0}")]
    Http(String),

    /// The source did not answer within its deadline.
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured deadline.
        timeout_ms: u64,
    },

    /// The source answered with something that is not a usable package.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The requested asset is not served by the source.
    #[error("asset {asset} not available")]
    MissingAsset {
        /// The requested asset.
        asset: Symbol,
    },

    /// Too few sources answered.
    #[error("insufficient sources: need {required}, have {available}")]
    InsufficientSources {
        /// Minimum number of successful sources.
        required: usize,
        /// Number that succeeded.
        available: usize,
    },

    /// The source returned a package with no entries.
    #[error("empty price package")]
    EmptyPackage,

    /// A price or identity in the response is out of range.
    #[error(transparent)]
    Types(#[from] tessera_types::TypesError),

    /// Signing or signature recovery failed.
    #[error(transparent)]
    Crypto(#[from] tessera_crypto::CryptoError),
}

/// Convenience result type for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// What to fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Identifier of the data source (e.g. `"redstone-stocks"`).
    pub data_source_id: String,
    /// Narrow the package to a single asset.
    pub asset: Option<Symbol>,
}

impl FetchRequest {
    pub fn new(data_source_id: impl Into<String>) -> Self {
        Self {
            data_source_id: data_source_id.into(),
            asset: None,
        }
    }

    pub fn with_asset(mut self, asset: Symbol) -> Self {
        self.asset = Some(asset);
        self
    }
}

/// A package as returned by a connector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchedPackage {
    /// Signed by the provider; the injector only verifies it.
    Signed(SignedPackage),
    /// Bare package; the injector must sign it.
    Unsigned(PricePackage),
}

impl FetchedPackage {
    pub fn package(&self) -> &PricePackage {
        match self {
            Self::Signed(signed) => &signed.package,
            Self::Unsigned(package) => package,
        }
    }

    pub fn into_package(self) -> PricePackage {
        match self {
            Self::Signed(signed) => signed.package,
            Self::Unsigned(package) => package,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }
}

/// A source of price packages.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fetch the latest package for `request`.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPackage>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Apply the asset filter shared by every connector.
///
/// # Errors
///
/// - [`ConnectorError::EmptyPackage`] if `package` has no entries
/// - [`ConnectorError::MissingAsset`] if the requested asset is absent
pub(crate) fn narrow(package: PricePackage, asset: Option<&Symbol>) -> Result<PricePackage> {
    if package.is_empty() {
        return Err(ConnectorError::EmptyPackage);
    }
    match asset {
        None => Ok(package),
        Some(asset) => {
            let narrowed = package.filtered(asset);
            if narrowed.is_empty() {
                return Err(ConnectorError::MissingAsset { asset: *asset });
            }
            Ok(narrowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_types::PriceEntry;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).expect("symbol")
    }

    #[test]
    fn test_narrow() {
        let package = PricePackage::new(
            vec![PriceEntry::new(sym("ETH"), 1), PriceEntry::new(sym("BTC"), 2)],
            10,
        );
        let narrowed = narrow(package.clone(), Some(&sym("BTC"))).expect("narrow");
        assert_eq!(narrowed.entries, vec![PriceEntry::new(sym("BTC"), 2)]);
        assert_eq!(narrowed.timestamp, 10);

        assert!(matches!(
            narrow(package.clone(), Some(&sym("IBM"))),
            Err(ConnectorError::MissingAsset { .. })
        ));
        assert_eq!(narrow(package.clone(), None).expect("all"), package);
    }

    #[test]
    fn test_empty_package_is_error() {
        assert!(matches!(
            narrow(PricePackage::new(Vec::new(), 10), None),
            Err(ConnectorError::EmptyPackage)
        ));
    }
}
