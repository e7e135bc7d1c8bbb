//! Signing and recovering price packages.
//!
//! ```text
//! package_hash = keccak256({symbol | value}* | timestamp)
//! digest       = keccak256("\x19Ethereum Signed Message:\n32" || package_hash)
//! signature    = secp256k1_sign_recoverable(digest)
//! ```

use tessera_types::{Address, Hash, PricePackage, Signature, SignedPackage};

use crate::keccak::keccak256;
use crate::secp256k1::{recover_address, SigningKey};
use crate::Result;

/// Canonical hash of a package.
pub fn package_hash(package: &PricePackage) -> Hash {
    keccak256(&package.canonical_bytes())
}

/// Sign a package, returning the signature over its canonical hash.
pub fn sign_package(package: &PricePackage, key: &SigningKey) -> Result<Signature> {
    key.sign_hash(&package_hash(package))
}

/// Sign a package and bundle it with the signer's identity.
pub fn sign_into(package: PricePackage, key: &SigningKey) -> Result<SignedPackage> {
    let signature = sign_package(&package, key)?;
    Ok(SignedPackage {
        package,
        signer: key.address(),
        signature,
    })
}

/// Recover the identity that signed `package`.
pub fn recover_package_signer(package: &PricePackage, signature: &Signature) -> Result<Address> {
    recover_address(&package_hash(package), signature)
}

/// Check a signed package against its declared signer.
///
/// Returns the recovered identity, which may differ from
/// `signed.signer`. Callers decide how to treat a mismatch.
pub fn recover_signed(signed: &SignedPackage) -> Result<Address> {
    recover_package_signer(&signed.package, &signed.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_types::{PriceEntry, Symbol};

    fn sample() -> PricePackage {
        PricePackage::new(
            vec![
                PriceEntry::new(Symbol::new("ETH").expect("symbol"), 180_000_000_000),
                PriceEntry::new(Symbol::new("BTC").expect("symbol"), 3_000_000_000_000),
            ],
            1_700_000_000,
        )
    }

    #[test]
    fn test_sign_and_recover_package() {
        let key = SigningKey::generate();
        let package = sample();
        let sig = sign_package(&package, &key).expect("sign");
        assert_eq!(recover_package_signer(&package, &sig).expect("recover"), key.address());
    }

    #[test]
    fn test_sign_into_sets_signer() {
        let key = SigningKey::generate();
        let signed = sign_into(sample(), &key).expect("sign");
        assert_eq!(signed.signer, key.address());
        assert_eq!(recover_signed(&signed).expect("recover"), key.address());
    }

    #[test]
    fn test_altered_value_changes_identity() {
        let key = SigningKey::generate();
        let package = sample();
        let sig = sign_package(&package, &key).expect("sign");

        let mut tampered = package.clone();
        tampered.entries[0].value += 1;
        if let Ok(addr) = recover_package_signer(&tampered, &sig) {
            assert_ne!(addr, key.address());
        }
    }

    #[test]
    fn test_altered_timestamp_changes_identity() {
        let key = SigningKey::generate();
        let package = sample();
        let sig = sign_package(&package, &key).expect("sign");

        let mut tampered = package;
        tampered.timestamp += 1;
        if let Ok(addr) = recover_package_signer(&tampered, &sig) {
            assert_ne!(addr, key.address());
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = SigningKey::generate();
        let a = sign_package(&sample(), &key).expect("sign");
        let b = sign_package(&sample(), &key).expect("sign");
        assert_eq!(a, b);
    }
}
