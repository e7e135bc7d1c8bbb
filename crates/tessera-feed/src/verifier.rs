//! Signer recovery for price packages.

use tessera_types::{Address, PricePackage, Signature};

use crate::Result;

/// Recovers the identity that signed a package.
///
/// The feed depends on this capability rather than on a concrete scheme so
/// that a verifier can be supplied (or omitted) at construction.
pub trait SignerRecovery: Send + Sync {
    fn recover_signer(&self, package: &PricePackage, signature: &Signature) -> Result<Address>;
}

/// secp256k1 recovery over the canonical package hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceVerifier;

impl SignerRecovery for PriceVerifier {
    fn recover_signer(&self, package: &PricePackage, signature: &Signature) -> Result<Address> {
        Ok(tessera_crypto::package::recover_package_signer(package, signature)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_crypto::package::sign_package;
    use tessera_crypto::secp256k1::SigningKey;
    use tessera_types::{PriceEntry, Symbol};

    #[test]
    fn test_recovers_signer() {
        let key = SigningKey::generate();
        let package = PricePackage::new(
            vec![PriceEntry::new(Symbol::new("ETH").expect("symbol"), 1800)],
            1_000,
        );
        let sig = sign_package(&package, &key).expect("sign");
        let recovered = PriceVerifier.recover_signer(&package, &sig).expect("recover");
        assert_eq!(recovered, key.address());
    }

    #[test]
    fn test_garbage_signature_fails_or_differs() {
        let key = SigningKey::generate();
        let package = PricePackage::new(Vec::new(), 1_000);
        let mut raw = [0x42u8; 65];
        raw[64] = 27;
        match PriceVerifier.recover_signer(&package, &Signature::from_bytes(raw)) {
            Ok(addr) => assert_ne!(addr, key.address()),
            Err(err) => assert!(matches!(err, crate::FeedError::InvalidSignature(_))),
        }
    }
}
