//! 32-byte word encoding in the contract ABI layout.
//!
//! Only the shapes the protocol needs are supported: static words
//! (`uint256`, `bool`, `address`, `bytes32`), `bytes32[]`, `uint256[]`,
//! `bytes`, and a tuple of those. Return values of wrapped read-only calls
//! are decoded through [`AbiDecode`].

use tessera_types::package::u128_word;
use tessera_types::{Address, Symbol};

use crate::{CodecError, Result};

pub use tessera_crypto::keccak::selector;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// A value occupying exactly one ABI word.
pub trait AbiWord: Sized {
    fn to_word(&self) -> [u8; WORD];
    fn from_word(word: &[u8; WORD]) -> Result<Self>;
}

impl AbiWord for u128 {
    fn to_word(&self) -> [u8; WORD] {
        u128_word(*self)
    }

    fn from_word(word: &[u8; WORD]) -> Result<Self> {
        if word[..16].iter().any(|b| *b != 0) {
            return Err(CodecError::Malformed(format!(
                "uint256 0x{} exceeds 128 bits",
                hex::encode(word)
            )));
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(low))
    }
}

impl AbiWord for u64 {
    fn to_word(&self) -> [u8; WORD] {
        u128_word(u128::from(*self))
    }

    fn from_word(word: &[u8; WORD]) -> Result<Self> {
        let wide = u128::from_word(word)?;
        u64::try_from(wide)
            .map_err(|_| CodecError::Malformed(format!("uint256 {wide} exceeds 64 bits")))
    }
}

impl AbiWord for bool {
    fn to_word(&self) -> [u8; WORD] {
        u128_word(u128::from(*self))
    }

    fn from_word(word: &[u8; WORD]) -> Result<Self> {
        match u128::from_word(word)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::Malformed(format!("invalid bool word {other}"))),
        }
    }
}

impl AbiWord for Address {
    fn to_word(&self) -> [u8; WORD] {
        let mut word = [0u8; WORD];
        word[12..].copy_from_slice(self.as_bytes());
        word
    }

    fn from_word(word: &[u8; WORD]) -> Result<Self> {
        if word[..12].iter().any(|b| *b != 0) {
            return Err(CodecError::Malformed("dirty address padding".to_string()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::from_bytes(bytes))
    }
}

impl AbiWord for Symbol {
    fn to_word(&self) -> [u8; WORD] {
        *self.as_bytes()
    }

    fn from_word(word: &[u8; WORD]) -> Result<Self> {
        Ok(Symbol::from_bytes(*word))
    }
}

/// Decoding of a call's return data.
///
/// A single value decodes unwrapped; several values decode as a tuple.
pub trait AbiDecode: Sized {
    fn abi_decode(data: &[u8]) -> Result<Self>;
}

impl AbiDecode for () {
    fn abi_decode(_data: &[u8]) -> Result<Self> {
        Ok(())
    }
}

macro_rules! impl_abi_decode_single {
    ($($t:ty),*) => {
        $(
            impl AbiDecode for $t {
                fn abi_decode(data: &[u8]) -> Result<Self> {
                    AbiReader::new(data).word_as(0)
                }
            }
        )*
    };
}

impl_abi_decode_single!(u128, u64, bool, Address, Symbol);

impl<A: AbiWord, B: AbiWord> AbiDecode for (A, B) {
    fn abi_decode(data: &[u8]) -> Result<Self> {
        let reader = AbiReader::new(data);
        Ok((reader.word_as(0)?, reader.word_as(WORD)?))
    }
}

impl<A: AbiWord, B: AbiWord, C: AbiWord> AbiDecode for (A, B, C) {
    fn abi_decode(data: &[u8]) -> Result<Self> {
        let reader = AbiReader::new(data);
        Ok((
            reader.word_as(0)?,
            reader.word_as(WORD)?,
            reader.word_as(2 * WORD)?,
        ))
    }
}

/// Encode a sequence of static words, e.g. call arguments or return data.
pub fn encode_words(words: &[[u8; WORD]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * WORD);
    for word in words {
        out.extend_from_slice(word);
    }
    out
}

/// Build `selector(signature) || args`.
pub fn encode_call(signature: &str, args: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + args.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(args);
    out
}

/// Encode dynamic `bytes`: length word, then data right-padded to a word.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let padded = data.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&(data.len() as u128).to_word());
    out.extend_from_slice(data);
    out.resize(WORD + padded, 0);
    out
}

/// Bounds-checked reader over an ABI-encoded buffer.
#[derive(Clone, Copy, Debug)]
pub struct AbiReader<'a> {
    data: &'a [u8],
}

impl<'a> AbiReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The word starting at `offset`.
    pub fn word(&self, offset: usize) -> Result<&'a [u8; WORD]> {
        let end = offset
            .checked_add(WORD)
            .ok_or_else(|| CodecError::Malformed(format!("offset {offset} overflows")))?;
        self.data
            .get(offset..end)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                CodecError::Malformed(format!(
                    "word at {offset} out of bounds (len {})",
                    self.data.len()
                ))
            })
    }

    pub fn word_as<T: AbiWord>(&self, offset: usize) -> Result<T> {
        T::from_word(self.word(offset)?)
    }

    /// A word used as an offset or length, bounded by the buffer size.
    pub fn usize_at(&self, offset: usize) -> Result<usize> {
        let value: u64 = self.word_as(offset)?;
        let value = usize::try_from(value)
            .map_err(|_| CodecError::Malformed(format!("offset {value} too large")))?;
        if value > self.data.len() {
            return Err(CodecError::Malformed(format!(
                "offset or length {value} exceeds buffer of {}",
                self.data.len()
            )));
        }
        Ok(value)
    }

    /// A dynamic array of static words whose head sits at `offset`.
    pub fn array<T: AbiWord>(&self, offset: usize) -> Result<Vec<T>> {
        let len = self.usize_at(offset)?;
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(self.word_as(offset + WORD + i * WORD)?);
        }
        Ok(out)
    }

    /// Dynamic `bytes` whose length word sits at `offset`.
    pub fn bytes(&self, offset: usize) -> Result<&'a [u8]> {
        let len = self.usize_at(offset)?;
        let start = offset + WORD;
        self.data
            .get(start..start + len)
            .ok_or_else(|| CodecError::Malformed(format!("bytes of length {len} truncated")))
    }
}
