//! # tessera-crypto
//!
//! Hashing and recoverable signatures for price packages.
//!
//! The suite is fixed: keccak256 for every digest, secp256k1 ECDSA with
//! public-key recovery for every signature. Identities are 20-byte addresses
//! derived from the recovered public key.
//!
//! ## Modules
//!
//! - [`keccak`] — keccak256, personal-message prefixing, call selectors
//! - [`secp256k1`] — signing keys, signature recovery, address derivation
//! - [`package`] — signing and recovering the signer of a price package

pub mod keccak;
pub mod package;
pub mod secp256k1;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Private key bytes are not a valid secp256k1 scalar.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Signature bytes are malformed (bad `v`, out-of-range `r`/`s`).
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// No public key can be recovered from the signature.
    #[error("signer recovery failed: {0}")]
    Recovery(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
