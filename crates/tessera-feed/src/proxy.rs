//! Receiving side of the full payload.
//!
//! The proxy sits in front of a [`Target`]. When the incoming calldata ends
//! with the protocol marker it applies the embedded `setPrices` call to the
//! feed, forwards the original calldata to the target, and (optionally)
//! clears the same symbols again afterwards:
//!
//! ```text
//! calldata || payload
//!     |
//!     +-- feed.set_prices(package, signature)     as proxy
//!     +-- target.execute(calldata)                as original caller
//!     +-- feed.clear_prices(package)              as proxy, AfterCall only
//! ```
//!
//! Calldata without the marker is forwarded untouched.

use tessera_codec::full;
use tessera_types::Address;

use crate::feed::PriceFeed;
use crate::{CallContext, FeedError, Result};

/// What happens to the applied prices once the target returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Clearing {
    /// Remove the package's symbols after the target call.
    #[default]
    AfterCall,
    /// Leave the prices in the store.
    Retain,
}

/// Application logic reached through the proxy.
pub trait Target {
    /// Execute `calldata` with read access to the feed.
    fn execute(&mut self, ctx: &CallContext, feed: &PriceFeed, calldata: &[u8]) -> Result<Vec<u8>>;
}

/// Applies full payloads to a feed around a target call.
#[derive(Clone, Debug)]
pub struct PriceAwareProxy {
    address: Address,
    feed: Address,
    clearing: Clearing,
}

impl PriceAwareProxy {
    /// Create a proxy at `address` bound to the feed at `feed`.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidVerifier`] if `feed` is the zero address.
    pub fn new(address: Address, feed: Address, clearing: Clearing) -> Result<Self> {
        if feed.is_zero() {
            return Err(FeedError::InvalidVerifier);
        }
        Ok(Self {
            address,
            feed,
            clearing,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn feed(&self) -> Address {
        self.feed
    }

    pub fn clearing(&self) -> Clearing {
        self.clearing
    }

    /// Handle one incoming call.
    ///
    /// # Errors
    ///
    /// - [`FeedError::MalformedPayload`] if the marker is present but the
    ///   payload does not decode
    /// - any error from [`PriceFeed::set_prices`], in which case the target
    ///   is not reached
    /// - any error from the target; with [`Clearing::AfterCall`] the prices
    ///   are still cleared before it is returned
    pub fn handle<T: Target>(
        &self,
        ctx: &CallContext,
        feed: &mut PriceFeed,
        target: &mut T,
        calldata: &[u8],
    ) -> Result<Vec<u8>> {
        if !full::has_marker(calldata) {
            return target.execute(ctx, feed, calldata);
        }

        let decoded = full::decode(calldata)?;
        let as_proxy = CallContext::new(self.address, ctx.timestamp);
        feed.set_prices(&as_proxy, &decoded.package, &decoded.signature)?;
        tracing::debug!(
            proxy = %self.address,
            entries = decoded.package.len(),
            "applied appended prices"
        );

        let outcome = target.execute(ctx, feed, decoded.prefix);

        if self.clearing == Clearing::AfterCall {
            feed.clear_prices(&as_proxy, &decoded.package)?;
        }
        outcome
    }
}
