//! Fixed-price connector for tests and local runs.
//!
//! Packages are stamped `clock.now() - offset` so that they are fresh but
//! never ahead of a verifier sharing the same clock.

use std::sync::Arc;

use async_trait::async_trait;

use tessera_crypto::package::sign_into;
use tessera_crypto::secp256k1::SigningKey;
use tessera_types::{Clock, PriceEntry, PricePackage, Symbol, SystemClock, PRICE_SCALE};

use crate::{narrow, Connector, FetchRequest, FetchedPackage, Result};

/// Default age of a mock package, in seconds.
pub const DEFAULT_OFFSET_SECS: u64 = 1;

/// Private key of the well-known mock provider.
pub const MOCK_PROVIDER_KEY: &str =
    "ae2b81c1fe9e3b01f060362f03abd0c80a6447cfe00ff7fc7fcf000000000000";

/// `ETH = 10`, `AVAX = 5`, scaled to fixed point.
pub fn default_prices() -> Vec<PriceEntry> {
    let mut prices = Vec::with_capacity(2);
    for (text, whole) in [("ETH", 10u128), ("AVAX", 5u128)] {
        if let Ok(symbol) = Symbol::new(text) {
            prices.push(PriceEntry::new(symbol, whole * PRICE_SCALE));
        }
    }
    prices
}

/// Serves a fixed set of prices.
pub struct MockConnector {
    prices: Vec<PriceEntry>,
    clock: Arc<dyn Clock>,
    offset_secs: u64,
    key: Option<SigningKey>,
}

impl MockConnector {
    /// Default prices on the wall clock, unsigned.
    pub fn new() -> Self {
        Self {
            prices: default_prices(),
            clock: Arc::new(SystemClock),
            offset_secs: DEFAULT_OFFSET_SECS,
            key: None,
        }
    }

    /// Replace the served prices.
    pub fn with_prices(mut self, prices: impl IntoIterator<Item = PriceEntry>) -> Self {
        self.prices = prices.into_iter().collect();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_offset(mut self, offset_secs: u64) -> Self {
        self.offset_secs = offset_secs;
        self
    }

    /// Sign every package with `key` instead of returning it bare.
    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn prices(&self) -> &[PriceEntry] {
        &self.prices
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPackage> {
        let timestamp = self.clock.now().saturating_sub(self.offset_secs);
        let package = narrow(
            PricePackage::new(self.prices.clone(), timestamp),
            request.asset.as_ref(),
        )?;
        tracing::debug!(
            source = %request.data_source_id,
            entries = package.len(),
            timestamp,
            "mock package"
        );

        match &self.key {
            Some(key) => Ok(FetchedPackage::Signed(sign_into(package, key)?)),
            None => Ok(FetchedPackage::Unsigned(package)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
