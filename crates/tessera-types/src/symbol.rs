//! 32-byte asset identifiers.
//!
//! A symbol is short UTF-8 text written from the first byte of a 32-byte slot
//! and zero-padded on the right. At least one trailing zero byte is always
//! kept, so the longest accepted text is 31 bytes.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{Result, TypesError};

/// Maximum byte length of symbol text.
pub const MAX_SYMBOL_LEN: usize = 31;

/// A fixed-width asset identifier, e.g. `ETH`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Symbol([u8; 32]);

impl Symbol {
    /// Create a symbol from text.
    ///
    /// # Errors
    ///
    /// [`TypesError::SymbolTooLong`] if `text` is longer than 31 bytes.
    pub fn new(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        if bytes.len() > MAX_SYMBOL_LEN {
            return Err(TypesError::SymbolTooLong {
                len: bytes.len(),
                max: MAX_SYMBOL_LEN,
            });
        }
        let mut slot = [0u8; 32];
        slot[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(slot))
    }

    /// Wrap a raw 32-byte slot as received on the wire.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw 32-byte slot.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the text form, if the slot holds zero-padded UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(self.0.len());
        if self.0[end..].iter().any(|b| *b != 0) {
            return None;
        }
        std::str::from_utf8(&self.0[..end]).ok()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) if !text.is_empty() => f.write_str(text),
            _ => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl FromStr for Symbol {
    type Err = TypesError;

    /// Parse either symbol text or a `0x`-prefixed 32-byte hex slot.
    fn from_str(s: &str) -> Result<Self> {
        if let Some(raw) = s.strip_prefix("0x") {
            if raw.len() == 64 {
                let bytes = hex::decode(raw).map_err(|e| TypesError::InvalidSymbol(e.to_string()))?;
                let mut slot = [0u8; 32];
                slot.copy_from_slice(&bytes);
                return Ok(Self(slot));
            }
        }
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_right_padded() {
        let eth = Symbol::new("ETH").expect("valid symbol");
        assert_eq!(&eth.as_bytes()[..3], b"ETH");
        assert!(eth.as_bytes()[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_display_trims_padding() {
        let avax = Symbol::new("AVAX").expect("valid symbol");
        assert_eq!(avax.to_string(), "AVAX");
        assert_eq!(avax.as_text(), Some("AVAX"));
    }

    #[test]
    fn test_too_long_rejected() {
        let long = "X".repeat(32);
        let err = Symbol::new(&long).expect_err("too long");
        assert_eq!(err, TypesError::SymbolTooLong { len: 32, max: 31 });
        assert!(Symbol::new(&"X".repeat(31)).is_ok());
    }

    #[test]
    fn test_parse_hex_slot() {
        let eth = Symbol::new("ETH").expect("valid symbol");
        let hex_form = format!("0x{}", hex::encode(eth.as_bytes()));
        let parsed: Symbol = hex_form.parse().expect("parse hex slot");
        assert_eq!(parsed, eth);
    }

    #[test]
    fn test_non_text_slot_displays_as_hex() {
        let raw = Symbol::from_bytes([0xff; 32]);
        assert!(raw.as_text().is_none());
        assert!(raw.to_string().starts_with("0xffff"));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let eth = Symbol::new("ETH").expect("valid symbol");
        let json = serde_json::to_string(&eth).expect("serialize");
        assert_eq!(json, "\"ETH\"");
        let back: Symbol = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, eth);
    }
}
