//! 20-byte identities for signers, administrators and contracts.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{Result, TypesError};

/// A 20-byte account identity, displayed as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address, used as the null reference.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the null reference.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Render the address with an EIP-55 mixed-case checksum.
    ///
    /// `keccak` must be the keccak256 of the lowercase hex digits; it is
    /// injected so this crate stays free of hashing dependencies.
    pub fn to_checksum(&self, keccak: impl Fn(&[u8]) -> [u8; 32]) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| TypesError::InvalidAddress(format!("{s}: {e}")))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidAddress(format!("{s}: expected 20 bytes")))?;
        Ok(Self(arr))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
