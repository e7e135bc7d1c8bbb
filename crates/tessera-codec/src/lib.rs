//! # tessera-codec
//!
//! Canonical wire encodings for signed price packages.
//!
//! A payload is appended to the end of otherwise ordinary calldata. The
//! receiver decodes from the end of the buffer backwards, recovers the
//! package and signature, and hands the untouched prefix to the target.
//!
//! ## Architecture
//!
//! ```text
//! calldata || payload
//!             |
//!             +-- full: [clear sel|4][set sel|4][set args..][len|2][marker|32]
//!             |
//!             +-- lite: [{symbol|32 value|32}*][timestamp|32][count|1][sig|65]
//! ```
//!
//! ## Modules
//!
//! - [`abi`] — 32-byte word encoding, selectors, return-value decoding
//! - [`full`] — selector-addressed payload with trailing protocol marker
//! - [`lite`] — dense payload for direct in-message reading

use serde::{Deserialize, Serialize};

use tessera_types::{PricePackage, Signature, SignedPackage, TypesError};

pub mod abi;
pub mod full;
pub mod lite;

/// Error types for payload encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Buffer is truncated, misaligned or carries out-of-range fields.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Calldata does not end with the protocol marker.
    #[error("protocol marker not found")]
    MissingMarker,

    /// A selector inside a full payload does not match the expected call.
    #[error("unexpected selector: expected 0x{expected}, found 0x{found}")]
    UnexpectedSelector {
        /// Hex of the expected selector.
        expected: String,
        /// Hex of the selector found in the payload.
        found: String,
    },

    /// Payload does not fit its length or count field.
    #[error("payload too large: {len}, max {max}")]
    PayloadTooLarge {
        /// Actual size (bytes or entries).
        len: usize,
        /// Maximum representable size.
        max: usize,
    },

    /// A domain value could not be built from decoded bytes.
    #[error(transparent)]
    Types(#[from] TypesError),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// A payload split off the end of a calldata buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPayload<'a> {
    /// Calldata preceding the payload, exactly as the caller built it.
    pub prefix: &'a [u8],
    /// Decoded package.
    pub package: PricePackage,
    /// Signature carried alongside the package.
    pub signature: Signature,
}

/// Selects the wire encoding used when appending a payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderStrategy {
    /// Selector-addressed payload applied through a proxy and a price feed.
    Full,
    /// Dense payload read directly from the message by the target.
    #[default]
    Lite,
}

impl EncoderStrategy {
    /// Encode `signed` into a payload suitable for appending to calldata.
    ///
    /// # Errors
    ///
    /// [`CodecError::PayloadTooLarge`] if the package does not fit the
    /// length or count field of the chosen layout.
    pub fn encode(&self, signed: &SignedPackage) -> Result<Vec<u8>> {
        match self {
            Self::Full => full::encode(&signed.package, &signed.signature),
            Self::Lite => lite::encode(&signed.package, &signed.signature),
        }
    }

    /// Split a payload of this layout off the end of `calldata`.
    pub fn decode<'a>(&self, calldata: &'a [u8]) -> Result<DecodedPayload<'a>> {
        match self {
            Self::Full => full::decode(calldata),
            Self::Lite => lite::decode(calldata),
        }
    }

    /// Guess the layout of an augmented calldata buffer.
    ///
    /// Only the full layout is self-identifying; anything without the
    /// marker is assumed to be lite.
    pub fn detect(calldata: &[u8]) -> Self {
        if full::has_marker(calldata) {
            Self::Full
        } else {
            Self::Lite
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Lite => "lite",
        }
    }
}

impl std::fmt::Display for EncoderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
