//! # tessera-types
//!
//! Shared domain types used across the Tessera workspace.
//!
//! ## Modules
//!
//! - [`symbol`] — 32-byte asset identifiers
//! - [`address`] — 20-byte signer and contract identities
//! - [`package`] — price entries, packages and signed packages
//! - [`clock`] — reference clocks for freshness checks

pub mod address;
pub mod clock;
pub mod package;
pub mod symbol;

pub use address::Address;
pub use clock::{Clock, ManualClock, SystemClock};
pub use package::{PriceEntry, PricePackage, Signature, SignedPackage};
pub use symbol::Symbol;

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// Fixed-point scale applied to every price value (8 decimals).
pub const PRICE_SCALE: u128 = 100_000_000;

/// Smallest freshness window a verifier may be configured with, in seconds.
pub const MIN_PRICE_DELAY_SECS: u64 = 15;

/// Length of a recoverable signature (`r || s || v`).
pub const SIGNATURE_LEN: usize = 65;

/// Error types for domain value construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// Symbol text does not fit a 32-byte slot with a trailing zero.
    #[error("symbol too long: {len} bytes, max {max}")]
    SymbolTooLong {
        /// Byte length of the offending text.
        len: usize,
        /// Maximum accepted byte length.
        max: usize,
    },

    /// Address text is not 20 bytes of hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Symbol bytes are not valid hex or UTF-8.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// A decimal price cannot be represented as a fixed-point value.
    #[error("invalid price value: {0}")]
    InvalidValue(String),
}

/// Convenience result type for domain value construction.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Convert a decimal price into its fixed-point representation.
///
/// `value * 10^8` is rounded to the nearest integer.
///
/// # Errors
///
/// [`TypesError::InvalidValue`] if `value` is negative, NaN, infinite or
/// too large for a `u128`.
pub fn to_fixed_point(value: f64) -> Result<u128> {
    if !value.is_finite() || value < 0.0 {
        return Err(TypesError::InvalidValue(value.to_string()));
    }
    let scaled = (value * PRICE_SCALE as f64).round();
    if scaled >= u128::MAX as f64 {
        return Err(TypesError::InvalidValue(value.to_string()));
    }
    Ok(scaled as u128)
}

/// Convert a millisecond timestamp to whole seconds, rounding up.
pub fn millis_to_seconds(millis: u64) -> u64 {
    millis.div_ceil(1000)
}
