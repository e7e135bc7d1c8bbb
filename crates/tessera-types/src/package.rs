//! Price entries, packages and signed packages.
//!
//! A [`PricePackage`] is an ordered list of entries sharing one timestamp in
//! seconds. Entry order is significant: it is the order used for the
//! canonical hash and for both wire encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{Address, Result, Symbol, TypesError, SIGNATURE_LEN};

/// One symbol/value pair. `value` is fixed-point with 8 decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub symbol: Symbol,
    pub value: u128,
    /// Source observation time in seconds. Informational only: it is not
    /// part of the canonical bytes and neither wire layout carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl PriceEntry {
    pub fn new(symbol: Symbol, value: u128) -> Self {
        Self {
            symbol,
            value,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A timestamped, ordered set of price entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePackage {
    /// Entries in package order.
    pub entries: Vec<PriceEntry>,
    /// Package timestamp in seconds since the Unix epoch.
    pub timestamp: u64,
}

impl PricePackage {
    pub fn new(entries: Vec<PriceEntry>, timestamp: u64) -> Self {
        Self { entries, timestamp }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the package holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols in package order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|e| &e.symbol)
    }

    /// Look up the value carried for `symbol`.
    pub fn value_of(&self, symbol: &Symbol) -> Option<u128> {
        self.entries
            .iter()
            .find(|e| e.symbol == *symbol)
            .map(|e| e.value)
    }

    /// Keep only the entry for `symbol`, preserving the timestamp.
    pub fn filtered(&self, symbol: &Symbol) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| e.symbol == *symbol)
                .copied()
                .collect(),
            timestamp: self.timestamp,
        }
    }

    /// Canonical hash input: `{symbol | value}* | timestamp`, 32-byte
    /// big-endian words in package order.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 64 + 32);
        for entry in &self.entries {
            out.extend_from_slice(entry.symbol.as_bytes());
            out.extend_from_slice(&u128_word(entry.value));
        }
        out.extend_from_slice(&u128_word(u128::from(self.timestamp)));
        out
    }
}

/// Left-pad a `u128` into a 32-byte big-endian word.
pub fn u128_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// A 65-byte recoverable signature: `r (32) || s (32) || v (1)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly 65 bytes long.
    ///
    /// # Errors
    ///
    /// [`TypesError::InvalidValue`] on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            TypesError::InvalidValue(format!(
                "signature must be {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// The recovery byte `v`.
    pub fn v(&self) -> u8 {
        self.0[SIGNATURE_LEN - 1]
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| TypesError::InvalidValue(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

/// A package together with its claimed signer and signature.
///
/// The signature must recover to `signer` under the canonical hash of
/// `package`; the check lives in `tessera-crypto`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPackage {
    pub package: PricePackage,
    pub signer: Address,
    pub signature: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).expect("valid symbol")
    }

    fn sample() -> PricePackage {
        PricePackage::new(
            vec![
                PriceEntry::new(sym("ETH"), 1_000_000_000),
                PriceEntry::new(sym("AVAX"), 500_000_000),
            ],
            1_700_000_000,
        )
    }

    #[test]
    fn test_canonical_bytes_layout() {
        let package = sample();
        let bytes = package.canonical_bytes();
        assert_eq!(bytes.len(), 2 * 64 + 32);
        assert_eq!(&bytes[..32], sym("ETH").as_bytes());
        assert_eq!(&bytes[32..64], &u128_word(1_000_000_000));
        assert_eq!(&bytes[64..96], sym("AVAX").as_bytes());
        assert_eq!(&bytes[128..], &u128_word(1_700_000_000));
    }

    #[test]
    fn test_entry_timestamp_not_hashed() {
        let eth = Symbol::new("ETH").expect("symbol");
        let plain = PricePackage::new(vec![PriceEntry::new(eth, 7)], 100);
        let stamped = PricePackage::new(vec![PriceEntry::new(eth, 7).with_timestamp(99)], 100);
        assert_eq!(plain.canonical_bytes(), stamped.canonical_bytes());

        let json = serde_json::to_value(plain.entries[0]).expect("serialize");
        assert!(json.get("timestamp").is_none());
        let back: PriceEntry =
            serde_json::from_value(serde_json::to_value(stamped.entries[0]).expect("serialize"))
                .expect("deserialize");
        assert_eq!(back.timestamp, Some(99));
    }

    #[test]
    fn test_canonical_bytes_preserve_order() {
        let mut swapped = sample();
        swapped.entries.reverse();
        assert_ne!(sample().canonical_bytes(), swapped.canonical_bytes());
    }

    #[test]
    fn test_u128_word_big_endian() {
        let word = u128_word(0x0102);
        assert!(word[..30].iter().all(|b| *b == 0));
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
    }

    #[test]
    fn test_value_lookup_and_filter() {
        let package = sample();
        assert_eq!(package.value_of(&sym("AVAX")), Some(500_000_000));
        assert_eq!(package.value_of(&sym("BTC")), None);

        let only_eth = package.filtered(&sym("ETH"));
        assert_eq!(only_eth.len(), 1);
        assert_eq!(only_eth.timestamp, package.timestamp);
    }

    #[test]
    fn test_signature_parse() {
        let text = format!("0x{}1b", "11".repeat(64));
        let sig: Signature = text.parse().expect("valid signature");
        assert_eq!(sig.v(), 27);
        assert_eq!(sig.to_string(), text);
        assert!("0x1234".parse::<Signature>().is_err());
    }
}
