//! secp256k1 signing with public-key recovery.
//!
//! Signatures are 65 bytes, `r || s || v`, with `v = 27 + recovery_id`.
//! Signatures produced here are always low-S. Recovery accepts `v` in
//! `{0, 1, 27, 28}`.
//!
//! This module wraps `k256` with Tessera-specific types.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

use tessera_types::{Address, Hash, Signature};

use crate::keccak::{hash_message, keccak256};
use crate::{CryptoError, Result};

/// A secp256k1 signing key (private key).
///
/// The inner key is zeroized on drop. `Debug` prints the address only.
#[derive(Clone)]
pub struct SigningKey {
    inner: k256::ecdsa::SigningKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        Self {
            inner: k256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create a signing key from raw bytes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidKey`] if the bytes are zero or not below the
    /// curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = k256::ecdsa::SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse a hex private key, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self> {
        let raw = text.trim().strip_prefix("0x").unwrap_or(text.trim());
        let bytes = Zeroizing::new(
            hex::decode(raw).map_err(|e| CryptoError::InvalidKey(e.to_string()))?,
        );
        let arr: Zeroizing<[u8; 32]> = Zeroizing::new(
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?,
        );
        Self::from_bytes(&arr)
    }

    /// Get the raw bytes of this signing key.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Identity of this key.
    pub fn address(&self) -> Address {
        address_of(self.inner.verifying_key())
    }

    /// Sign a prepared 32-byte digest as-is.
    pub fn sign_digest(&self, digest: &Hash) -> Result<Signature> {
        let (sig, recovery_id) = self
            .inner
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(Signature::from_bytes(out))
    }

    /// Sign a 32-byte hash under the personal-message envelope.
    pub fn sign_hash(&self, hash: &Hash) -> Result<Signature> {
        self.sign_digest(&hash_message(hash))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("address", &self.address())
            .finish()
    }
}

/// Derive the address of a public key.
///
/// `address = keccak256(uncompressed_point[1..])[12..]`
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address::from_bytes(out)
}

/// Recover the signer of a prepared digest.
///
/// # Errors
///
/// - [`CryptoError::InvalidSignature`] for an unknown `v` or malformed `r`/`s`
/// - [`CryptoError::Recovery`] if no key matches
pub fn recover_digest(digest: &Hash, signature: &Signature) -> Result<Address> {
    let bytes = signature.as_bytes();
    let v = bytes[64];
    let recovery_byte = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        other => {
            return Err(CryptoError::InvalidSignature(format!(
                "unsupported recovery byte {other}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| CryptoError::InvalidSignature(format!("bad recovery id {recovery_byte}")))?;
    let sig = EcdsaSignature::from_slice(&bytes[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|e| CryptoError::Recovery(e.to_string()))?;
    Ok(address_of(&key))
}

/// Recover the signer of a 32-byte hash signed under the personal-message
/// envelope.
pub fn recover_address(hash: &Hash, signature: &Signature) -> Result<Address> {
    recover_digest(&hash_message(hash), signature)
}

/// EIP-55 checksummed text form of an address.
pub fn checksum(address: &Address) -> String {
    address.to_checksum(keccak256)
}
