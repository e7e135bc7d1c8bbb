//! Receiving side of the lite payload.
//!
//! There is no store here: the target reads prices straight out of its own
//! calldata, trusting exactly one provider identity.

use tessera_codec::lite;
use tessera_types::{Address, PricePackage, Symbol};

use crate::freshness::FreshnessWindow;
use crate::{FeedError, Result};

/// Validates lite payloads signed by a single trusted provider.
#[derive(Clone, Copy, Debug)]
pub struct LitePriceReader {
    trusted_signer: Address,
    window: FreshnessWindow,
}

/// Prices extracted from one lite payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LitePrices<'a> {
    /// Calldata preceding the payload.
    pub prefix: &'a [u8],
    pub package: PricePackage,
    pub signer: Address,
}

impl LitePrices<'_> {
    pub fn price_of(&self, symbol: &Symbol) -> Option<u128> {
        self.package.value_of(symbol)
    }

    pub fn timestamp(&self) -> u64 {
        self.package.timestamp
    }
}

impl LitePriceReader {
    /// # Errors
    ///
    /// [`FeedError::DelayTooShort`] if `max_delay` is below 15 seconds.
    pub fn new(trusted_signer: Address, max_delay: u64) -> Result<Self> {
        Ok(Self {
            trusted_signer,
            window: FreshnessWindow::new(max_delay)?,
        })
    }

    pub fn trusted_signer(&self) -> Address {
        self.trusted_signer
    }

    /// Decode and authenticate the lite payload at the end of `calldata`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::MalformedPayload`] if the suffix does not decode
    /// - [`FeedError::UnauthorizedSigner`] unless signed by the trusted provider
    /// - [`FeedError::FutureTimestamp`] / [`FeedError::StaleTimestamp`]
    pub fn read<'a>(&self, calldata: &'a [u8], reference: u64) -> Result<LitePrices<'a>> {
        let decoded = lite::decode(calldata)?;
        let signer =
            tessera_crypto::package::recover_package_signer(&decoded.package, &decoded.signature)?;
        if signer != self.trusted_signer {
            tracing::warn!(%signer, trusted = %self.trusted_signer, "lite payload from untrusted signer");
            return Err(FeedError::UnauthorizedSigner { recovered: signer });
        }
        self.window.check(decoded.package.timestamp, reference)?;

        Ok(LitePrices {
            prefix: decoded.prefix,
            package: decoded.package,
            signer,
        })
    }
}
