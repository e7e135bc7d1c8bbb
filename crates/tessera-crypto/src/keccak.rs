//! keccak256 hashing.
//!
//! Packages are never signed as a raw hash. The hash is first wrapped in the
//! personal-message envelope:
//!
//! ```text
//! digest = keccak256("\x19Ethereum Signed Message:\n" || len(msg) || msg)
//! ```
//!
//! which for a 32-byte package hash is the fixed prefix
//! [`HASH_MESSAGE_PREFIX`].

use sha3::{Digest, Keccak256};

use tessera_types::Hash;

/// Envelope prefix for personal messages, followed by the decimal length.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Full envelope prefix for a 32-byte hash.
pub const HASH_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Compute keccak256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Digest of an arbitrary personal message.
pub fn hash_personal_message(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Digest that is actually signed for a 32-byte hash.
pub fn hash_message(hash: &Hash) -> Hash {
    let mut buf = Vec::with_capacity(HASH_MESSAGE_PREFIX.len() + 32);
    buf.extend_from_slice(HASH_MESSAGE_PREFIX);
    buf.extend_from_slice(hash);
    keccak256(&buf)
}

/// First four bytes of the keccak256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}
