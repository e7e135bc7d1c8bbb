//! Full payload: a complete `setPrices` call plus a `clearPrices` selector,
//! appended to calldata and located by a trailing marker.
//!
//! ## Wire format
//!
//! ```text
//! [clear_selector 4B][set_selector 4B][set args ..][set_len 2B BE][marker 32B]
//! ```
//!
//! `set_len` counts `set_selector || set args`. The set arguments are the
//! ABI encoding of
//!
//! ```text
//! setPrices((bytes32[] symbols, uint256[] values, uint256 timestamp), bytes signature)
//! ```

use tessera_crypto::keccak::keccak256;
use tessera_types::{PriceEntry, PricePackage, Signature, Symbol, SIGNATURE_LEN};

use crate::abi::{self, AbiReader, AbiWord, WORD};
use crate::{CodecError, DecodedPayload, Result};

/// Function signature of the price-setting call.
pub const SET_PRICES_SIGNATURE: &str = "setPrices((bytes32[],uint256[],uint256),bytes)";

/// Function signature of the price-clearing call.
pub const CLEAR_PRICES_SIGNATURE: &str = "clearPrices((bytes32[],uint256[],uint256))";

/// Preimage of the trailing protocol marker, kept for wire compatibility.
pub const MARKER_PREIMAGE: &str = "Redstone.version.0.0.1";

/// Length of the trailing marker.
pub const MARKER_LEN: usize = 32;

/// Length of the big-endian `set_len` field.
pub const LEN_FIELD: usize = 2;

/// Bytes following the set call: length field plus marker.
const TRAILER: usize = LEN_FIELD + MARKER_LEN;

/// The trailing protocol marker.
pub fn marker() -> [u8; MARKER_LEN] {
    keccak256(MARKER_PREIMAGE.as_bytes())
}

/// Whether `calldata` ends with the protocol marker.
pub fn has_marker(calldata: &[u8]) -> bool {
    calldata.len() >= MARKER_LEN && calldata[calldata.len() - MARKER_LEN..] == marker()
}

pub fn set_prices_selector() -> [u8; 4] {
    abi::selector(SET_PRICES_SIGNATURE)
}

pub fn clear_prices_selector() -> [u8; 4] {
    abi::selector(CLEAR_PRICES_SIGNATURE)
}

/// ABI encoding of the price-data tuple (without an outer offset word).
fn encode_price_tuple(package: &PricePackage) -> Vec<u8> {
    let n = package.entries.len();
    let symbols_offset = 3 * WORD;
    let values_offset = symbols_offset + WORD + n * WORD;

    let mut out = Vec::with_capacity(3 * WORD + 2 * (WORD + n * WORD));
    out.extend_from_slice(&(symbols_offset as u128).to_word());
    out.extend_from_slice(&(values_offset as u128).to_word());
    out.extend_from_slice(&package.timestamp.to_word());

    out.extend_from_slice(&(n as u128).to_word());
    for entry in &package.entries {
        out.extend_from_slice(&entry.symbol.to_word());
    }
    out.extend_from_slice(&(n as u128).to_word());
    for entry in &package.entries {
        out.extend_from_slice(&entry.value.to_word());
    }
    out
}

fn decode_price_tuple(reader: &AbiReader<'_>, base: usize) -> Result<PricePackage> {
    let symbols_offset = reader.usize_at(base)?;
    let values_offset = reader.usize_at(base + WORD)?;
    let timestamp: u64 = reader.word_as(base + 2 * WORD)?;

    let symbols: Vec<Symbol> = reader.array(base + symbols_offset)?;
    let values: Vec<u128> = reader.array(base + values_offset)?;
    if symbols.len() != values.len() {
        return Err(CodecError::Malformed(format!(
            "{} symbols but {} values",
            symbols.len(),
            values.len()
        )));
    }

    let entries = symbols
        .into_iter()
        .zip(values)
        .map(|(symbol, value)| PriceEntry::new(symbol, value))
        .collect();
    Ok(PricePackage::new(entries, timestamp))
}

/// Arguments of `setPrices(priceData, signature)`.
pub fn encode_set_args(package: &PricePackage, signature: &Signature) -> Vec<u8> {
    let tuple = encode_price_tuple(package);
    let signature_offset = 2 * WORD + tuple.len();

    let mut out = Vec::with_capacity(signature_offset + 3 * WORD + WORD);
    out.extend_from_slice(&((2 * WORD) as u128).to_word());
    out.extend_from_slice(&(signature_offset as u128).to_word());
    out.extend_from_slice(&tuple);
    out.extend_from_slice(&abi::encode_bytes(signature.as_bytes()));
    out
}

/// Arguments of `clearPrices(priceData)`.
pub fn encode_clear_args(package: &PricePackage) -> Vec<u8> {
    let mut out = (WORD as u128).to_word().to_vec();
    out.extend_from_slice(&encode_price_tuple(package));
    out
}

/// Reject any encoding other than the one [`encode_set_args`] or
/// [`encode_clear_args`] would produce for the decoded values.
fn ensure_canonical(args: &[u8], canonical: &[u8], what: &str) -> Result<()> {
    if args != canonical {
        return Err(CodecError::Malformed(format!(
            "non-canonical {what} arguments ({} bytes, expected {})",
            args.len(),
            canonical.len()
        )));
    }
    Ok(())
}

/// Decode the arguments of `setPrices(priceData, signature)`.
///
/// Only the canonical encoding is accepted: dirty signature padding,
/// unusual offsets and trailing bytes are all [`CodecError::Malformed`].
pub fn decode_set_args(args: &[u8]) -> Result<(PricePackage, Signature)> {
    let reader = AbiReader::new(args);
    let tuple_offset = reader.usize_at(0)?;
    let signature_offset = reader.usize_at(WORD)?;
    let package = decode_price_tuple(&reader, tuple_offset)?;

    let raw = reader.bytes(signature_offset)?;
    if raw.len() != SIGNATURE_LEN {
        return Err(CodecError::Malformed(format!(
            "signature must be {SIGNATURE_LEN} bytes, got {}",
            raw.len()
        )));
    }
    let signature = Signature::from_slice(raw)?;
    ensure_canonical(args, &encode_set_args(&package, &signature), "setPrices")?;
    Ok((package, signature))
}

/// Decode the arguments of `clearPrices(priceData)`.
pub fn decode_clear_args(args: &[u8]) -> Result<PricePackage> {
    let reader = AbiReader::new(args);
    let tuple_offset = reader.usize_at(0)?;
    let package = decode_price_tuple(&reader, tuple_offset)?;
    ensure_canonical(args, &encode_clear_args(&package), "clearPrices")?;
    Ok(package)
}

/// Encode a full payload.
///
/// # Errors
///
/// [`CodecError::PayloadTooLarge`] if the set call does not fit the 2-byte
/// length field.
pub fn encode(package: &PricePackage, signature: &Signature) -> Result<Vec<u8>> {
    let set_call = abi::encode_call(SET_PRICES_SIGNATURE, &encode_set_args(package, signature));
    let set_len = u16::try_from(set_call.len()).map_err(|_| CodecError::PayloadTooLarge {
        len: set_call.len(),
        max: u16::MAX as usize,
    })?;

    let mut out = Vec::with_capacity(4 + set_call.len() + TRAILER);
    out.extend_from_slice(&clear_prices_selector());
    out.extend_from_slice(&set_call);
    out.extend_from_slice(&set_len.to_be_bytes());
    out.extend_from_slice(&marker());
    Ok(out)
}

fn check_selector(expected: [u8; 4], found: &[u8]) -> Result<()> {
    if found != expected {
        return Err(CodecError::UnexpectedSelector {
            expected: hex::encode(expected),
            found: hex::encode(found),
        });
    }
    Ok(())
}

/// Split a full payload off the end of `calldata`.
///
/// # Errors
///
/// - [`CodecError::MissingMarker`] if the marker is absent
/// - [`CodecError::UnexpectedSelector`] if either selector is wrong
/// - [`CodecError::Malformed`] on any length or ABI inconsistency
pub fn decode(calldata: &[u8]) -> Result<DecodedPayload<'_>> {
    if !has_marker(calldata) {
        return Err(CodecError::MissingMarker);
    }
    let len_at = calldata
        .len()
        .checked_sub(TRAILER)
        .ok_or_else(|| CodecError::Malformed("missing length field".to_string()))?;
    let set_len = usize::from(u16::from_be_bytes([calldata[len_at], calldata[len_at + 1]]));

    let set_start = len_at.checked_sub(set_len).ok_or_else(|| {
        CodecError::Malformed(format!("set call length {set_len} exceeds calldata"))
    })?;
    let clear_start = set_start.checked_sub(4).ok_or_else(|| {
        CodecError::Malformed("missing clear selector".to_string())
    })?;
    if set_len < 4 {
        return Err(CodecError::Malformed(format!("set call of {set_len} bytes")));
    }

    let set_call = &calldata[set_start..len_at];
    check_selector(clear_prices_selector(), &calldata[clear_start..set_start])?;
    check_selector(set_prices_selector(), &set_call[..4])?;

    let (package, signature) = decode_set_args(&set_call[4..])?;
    Ok(DecodedPayload {
        prefix: &calldata[..clear_start],
        package,
        signature,
    })
}
