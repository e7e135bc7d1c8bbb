//! Lite payload: packed entries read straight out of the message.
//!
//! ## Wire format
//!
//! ```text
//! [symbol 32B | value 32B] * count
//! [timestamp 32B BE]
//! [count 1B]
//! [signature 65B]
//! ```
//!
//! The entries plus timestamp are exactly the canonical hash input, so the
//! receiver can hash the bytes in place.

use tessera_types::{PriceEntry, PricePackage, Signature, Symbol, SIGNATURE_LEN};

use crate::abi::{AbiReader, AbiWord, WORD};
use crate::{CodecError, DecodedPayload, Result};

/// Bytes per packed entry.
pub const ENTRY_LEN: usize = 2 * WORD;

/// Maximum number of entries (1-byte count).
pub const MAX_ENTRIES: usize = u8::MAX as usize;

/// Fixed bytes after the entries: timestamp, count, signature.
pub const TRAILER: usize = WORD + 1 + SIGNATURE_LEN;

/// Encode a lite payload.
///
/// # Errors
///
/// [`CodecError::PayloadTooLarge`] for more than 255 entries.
pub fn encode(package: &PricePackage, signature: &Signature) -> Result<Vec<u8>> {
    let count = u8::try_from(package.len()).map_err(|_| CodecError::PayloadTooLarge {
        len: package.len(),
        max: MAX_ENTRIES,
    })?;

    let mut out = package.canonical_bytes();
    out.reserve(1 + SIGNATURE_LEN);
    out.push(count);
    out.extend_from_slice(signature.as_bytes());
    Ok(out)
}

/// Total payload length for `count` entries.
pub fn payload_len(count: usize) -> usize {
    count * ENTRY_LEN + TRAILER
}

/// Split a lite payload off the end of `calldata`.
///
/// # Errors
///
/// [`CodecError::Malformed`] if the buffer is shorter than the count
/// implies or a word overflows its field.
pub fn decode(calldata: &[u8]) -> Result<DecodedPayload<'_>> {
    let total = calldata.len();
    if total < TRAILER {
        return Err(CodecError::Malformed(format!(
            "lite payload needs at least {TRAILER} bytes, got {total}"
        )));
    }

    let signature_at = total - SIGNATURE_LEN;
    let count_at = signature_at - 1;
    let timestamp_at = count_at - WORD;
    let count = usize::from(calldata[count_at]);

    let entries_len = count * ENTRY_LEN;
    let entries_at = timestamp_at.checked_sub(entries_len).ok_or_else(|| {
        CodecError::Malformed(format!(
            "{count} entries need {} bytes, got {total}",
            payload_len(count)
        ))
    })?;

    let body = AbiReader::new(&calldata[entries_at..count_at]);
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let symbol: Symbol = body.word_as(i * ENTRY_LEN)?;
        let value: u128 = body.word_as(i * ENTRY_LEN + WORD)?;
        entries.push(PriceEntry::new(symbol, value));
    }
    let timestamp: u64 = body.word_as(entries_len)?;

    Ok(DecodedPayload {
        prefix: &calldata[..entries_at],
        package: PricePackage::new(entries, timestamp),
        signature: Signature::from_slice(&calldata[signature_at..])?,
    })
}

/// The canonical hash input as it appears inside an augmented buffer.
///
/// Lets a receiver hash in place without rebuilding the package.
pub fn signed_region(calldata: &[u8]) -> Result<&[u8]> {
    let decoded = decode(calldata)?;
    let start = decoded.prefix.len();
    Ok(&calldata[start..calldata.len() - 1 - SIGNATURE_LEN])
}
