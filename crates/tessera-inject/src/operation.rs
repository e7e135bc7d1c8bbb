//! Typed description of one target operation.

use tessera_codec::abi::{self, AbiDecode};

/// One callable operation of a target.
///
/// Calldata is `selector(SIGNATURE) || encode_args()`.
pub trait Operation: Send + Sync {
    /// Human-readable name, used in logs.
    const NAME: &'static str;
    /// Canonical signature, e.g. `"balanceOf(address)"`.
    const SIGNATURE: &'static str;
    /// Whether the operation only reads state.
    const READ_ONLY: bool;

    /// Decoded return value.
    type Output: AbiDecode;

    fn encode_args(&self) -> Vec<u8>;

    fn calldata(&self) -> Vec<u8> {
        abi::encode_call(Self::SIGNATURE, &self.encode_args())
    }
}
