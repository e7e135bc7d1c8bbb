//! # tessera-feed
//!
//! Receiving side of the protocol: authenticates price packages, enforces
//! freshness, and admits them into a per-symbol price store.
//!
//! Every mutating operation takes a [`CallContext`] supplied by the
//! execution environment. Its `timestamp` is the reference clock for
//! freshness; the package's own claims about time are never trusted beyond
//! the configured window.
//!
//! ## Modules
//!
//! - [`verifier`] — signer recovery for packages
//! - [`freshness`] — maximum-delay window checks
//! - [`store`] — per-symbol price store with an overwrite guard
//! - [`feed`] — authorization, freshness and overwrite gate over the store
//! - [`proxy`] — applies full payloads around a target call
//! - [`reader`] — reads lite payloads straight out of the message
//! - [`config`] — construction-time configuration

pub mod config;
pub mod feed;
pub mod freshness;
pub mod proxy;
pub mod reader;
pub mod store;
pub mod verifier;

pub use config::{ClearPolicy, FeedConfig};
pub use feed::PriceFeed;
pub use proxy::{Clearing, PriceAwareProxy, Target};
pub use reader::{LitePriceReader, LitePrices};
pub use verifier::{PriceVerifier, SignerRecovery};

use tessera_types::{Address, Symbol};

/// Caller identity and reference time for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Account invoking the operation.
    pub caller: Address,
    /// Authoritative "now" of the execution environment, in seconds.
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

/// Error types for feed operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Constructed without a verifier, or with a null feed reference.
    #[error("cannot set an empty verifier")]
    InvalidVerifier,

    /// Freshness window below the protocol minimum.
    #[error("maximum price delay must be at least {min}s, got {delay}s")]
    DelayTooShort {
        /// Requested delay in seconds.
        delay: u64,
        /// Protocol minimum in seconds.
        min: u64,
    },

    /// Administrative action by someone other than the administrator.
    #[error("caller {caller} is not authorized")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// Package signed by an identity outside the authorized set.
    #[error("unauthorized price data signer {recovered}")]
    UnauthorizedSigner {
        /// Identity recovered from the signature.
        recovered: Address,
    },

    /// Package is older than the freshness window allows.
    #[error(
        "price data timestamp too old: package {timestamp}, reference {reference}, max delay {max_delay}s"
    )]
    StaleTimestamp {
        /// Package timestamp.
        timestamp: u64,
        /// Reference clock at admission.
        reference: u64,
        /// Configured window in seconds.
        max_delay: u64,
    },

    /// Package claims a time later than the reference clock.
    #[error("price data timestamp {timestamp} is ahead of reference {reference}")]
    FutureTimestamp {
        /// Package timestamp.
        timestamp: u64,
        /// Reference clock at admission.
        reference: u64,
    },

    /// Symbol already holds a present price.
    #[error("cannot overwrite existing price for {symbol}")]
    OverwriteConflict {
        /// The conflicting symbol.
        symbol: Symbol,
    },

    /// No present price for the queried symbol.
    #[error("no pricing data for {symbol}")]
    NoPricingData {
        /// The queried symbol.
        symbol: Symbol,
    },

    /// Appended payload could not be decoded.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] tessera_codec::CodecError),

    /// Signature bytes could not be recovered to any identity.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] tessera_crypto::CryptoError),

    /// The wrapped target call failed.
    #[error("target call failed: {0}")]
    Target(String),
}

/// Convenience result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
