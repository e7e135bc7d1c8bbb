//! Test vector generator for the payload formats.
//!
//! Generates `tests/fixtures/test_vectors.json` (committed alongside this
//! crate) pinning the hash input,
//! signing envelope, selectors, marker and both payload layouts. Signing is
//! deterministic (RFC 6979), so every output is reproducible.
//!
//! Usage:
//!   tessera-testvec              # Generate test_vectors.json
//!   tessera-testvec --verify     # Verify test vectors match expected values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tessera_codec::{full, lite};
use tessera_crypto::keccak::{hash_message, keccak256};
use tessera_crypto::package::{package_hash, sign_package};
use tessera_crypto::secp256k1::{checksum, SigningKey};
use tessera_types::{PriceEntry, PricePackage, Symbol, PRICE_SCALE};

const FIXTURE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/test_vectors.json");

/// Private key used for every signed vector.
const VECTOR_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Timestamp of the reference package, in seconds.
const VECTOR_TIMESTAMP: u64 = 1_700_000_000;

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
}

fn reference_package() -> anyhow::Result<PricePackage> {
    Ok(PricePackage::new(
        vec![
            PriceEntry::new(Symbol::new("ETH")?, 10 * PRICE_SCALE),
            PriceEntry::new(Symbol::new("AVAX")?, 5 * PRICE_SCALE),
        ],
        VECTOR_TIMESTAMP,
    ))
}

fn package_inputs() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("entries".to_string(), "ETH=1000000000,AVAX=500000000".to_string()),
        ("timestamp".to_string(), VECTOR_TIMESTAMP.to_string()),
    ])
}

fn generate_constant_vectors() -> BTreeMap<String, TestVector> {
    let mut vectors = BTreeMap::new();

    vectors.insert(
        "full_marker".to_string(),
        TestVector {
            description: format!("keccak256(\"{}\")", full::MARKER_PREIMAGE),
            inputs: BTreeMap::from([("preimage".to_string(), full::MARKER_PREIMAGE.to_string())]),
            outputs: BTreeMap::from([("marker".to_string(), hex::encode(full::marker()))]),
        },
    );

    vectors.insert(
        "selectors".to_string(),
        TestVector {
            description: "4-byte selectors of the full payload calls".to_string(),
            inputs: BTreeMap::from([
                ("set".to_string(), full::SET_PRICES_SIGNATURE.to_string()),
                ("clear".to_string(), full::CLEAR_PRICES_SIGNATURE.to_string()),
            ]),
            outputs: BTreeMap::from([
                ("set".to_string(), hex::encode(full::set_prices_selector())),
                ("clear".to_string(), hex::encode(full::clear_prices_selector())),
            ]),
        },
    );

    vectors.insert(
        "keccak_empty".to_string(),
        TestVector {
            description: "keccak256(\"\")".to_string(),
            inputs: BTreeMap::from([("data".to_string(), String::new())]),
            outputs: BTreeMap::from([("hash".to_string(), hex::encode(keccak256(b"")))]),
        },
    );

    vectors
}

fn generate_package_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    let package = reference_package()?;
    let key = SigningKey::from_hex(VECTOR_KEY)?;
    let hash = package_hash(&package);
    let signature = sign_package(&package, &key)?;

    vectors.insert(
        "package_hash".to_string(),
        TestVector {
            description: "keccak256({symbol|value}* | timestamp)".to_string(),
            inputs: package_inputs(),
            outputs: BTreeMap::from([
                ("canonical_bytes".to_string(), hex::encode(package.canonical_bytes())),
                ("hash".to_string(), hex::encode(hash)),
                ("digest".to_string(), hex::encode(hash_message(&hash))),
            ]),
        },
    );

    let mut signed_inputs = package_inputs();
    signed_inputs.insert("private_key".to_string(), VECTOR_KEY.to_string());

    vectors.insert(
        "package_signature".to_string(),
        TestVector {
            description: "secp256k1 recoverable signature over the personal-message digest"
                .to_string(),
            inputs: signed_inputs.clone(),
            outputs: BTreeMap::from([
                ("signer".to_string(), checksum(&key.address())),
                ("signature".to_string(), hex::encode(signature.as_bytes())),
            ]),
        },
    );

    vectors.insert(
        "lite_payload".to_string(),
        TestVector {
            description: "[{symbol|value}*][timestamp][count 1B][signature 65B]".to_string(),
            inputs: signed_inputs.clone(),
            outputs: BTreeMap::from([(
                "payload".to_string(),
                hex::encode(lite::encode(&package, &signature)?),
            )]),
        },
    );

    vectors.insert(
        "full_payload".to_string(),
        TestVector {
            description: "[clear sel][set sel][set args][len 2B][marker 32B]".to_string(),
            inputs: signed_inputs,
            outputs: BTreeMap::from([(
                "payload".to_string(),
                hex::encode(full::encode(&package, &signature)?),
            )]),
        },
    );

    Ok(vectors)
}

fn generate_all_vectors() -> anyhow::Result<TestVectors> {
    let mut all_vectors = BTreeMap::new();

    all_vectors.extend(generate_constant_vectors());
    all_vectors.extend(generate_package_vectors()?);

    Ok(TestVectors {
        version: "1.0".to_string(),
        generated_by: "tessera-testvec".to_string(),
        vectors: all_vectors,
    })
}

fn verify_vectors(vectors: &TestVectors) -> anyhow::Result<bool> {
    let regenerated = generate_all_vectors()?;
    let mut all_pass = true;

    for (name, expected) in &vectors.vectors {
        if let Some(actual) = regenerated.vectors.get(name) {
            if actual.outputs != expected.outputs {
                eprintln!("FAIL: {name}");
                eprintln!("  expected: {:?}", expected.outputs);
                eprintln!("  actual:   {:?}", actual.outputs);
                all_pass = false;
            } else {
                eprintln!("PASS: {name}");
            }
        } else {
            eprintln!("MISSING: {name}");
            all_pass = false;
        }
    }

    Ok(all_pass)
}

fn write_vectors(vectors: &TestVectors) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(FIXTURE_PATH).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(FIXTURE_PATH, serde_json::to_string_pretty(vectors)?)?;
    eprintln!("Generated {} test vectors to {FIXTURE_PATH}", vectors.vectors.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let vectors = if args.iter().any(|a| a == "--verify") {
        match std::fs::read_to_string(FIXTURE_PATH) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(_) => {
                eprintln!("No existing test vectors found at {FIXTURE_PATH}. Generating...");
                let vectors = generate_all_vectors()?;
                write_vectors(&vectors)?;
                vectors
            }
        }
    } else {
        let vectors = generate_all_vectors()?;
        write_vectors(&vectors)?;
        vectors
    };

    if verify_vectors(&vectors)? {
        eprintln!("All test vectors verified successfully.");
        Ok(())
    } else {
        eprintln!("Test vector verification FAILED.");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let first = generate_all_vectors().expect("generate");
        let second = generate_all_vectors().expect("generate");
        assert_eq!(first.vectors.len(), second.vectors.len());
        assert!(verify_vectors(&first).expect("verify"));
        let json = serde_json::to_string(&second).expect("serialize");
        let parsed: TestVectors = serde_json::from_str(&json).expect("parse");
        assert!(verify_vectors(&parsed).expect("verify"));
    }

    /// Independently computed outputs for the reference package.
    const MARKER: &str = "ee19b8ca69f98893639b517d6f4592d06cd786912bae6b02ec1b1266314afde2";
    const SET_SELECTOR: &str = "15c5c727";
    const CLEAR_SELECTOR: &str = "504df023";
    const PACKAGE_HASH: &str = "75b6fd1233d33700df9338de8b1c573c13de1defca158fc9015125dee6780e7d";
    const DIGEST: &str = "c44c1ba5072cc98b1dde5d6cc0b659ec03345474ba6dca67ace29cb05627a796";
    const SIGNATURE: &str = "ead8b4be440f818fcd3c1c7e1648f5b21403062d8af59b1ba55859ee2b5a6f03\
                             6145325af9c066bb66f87c6a10a313acdefedcd085a0f0c3dd5a978556674a341c";

    fn output<'a>(vectors: &'a TestVectors, vector: &str, field: &str) -> &'a str {
        vectors.vectors[vector].outputs[field].as_str()
    }

    #[test]
    fn test_known_values() {
        let vectors = generate_all_vectors().expect("generate");
        assert_eq!(
            output(&vectors, "keccak_empty", "hash"),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            output(&vectors, "package_signature", "signer"),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
        assert_eq!(output(&vectors, "full_marker", "marker"), MARKER);
        assert_eq!(output(&vectors, "selectors", "set"), SET_SELECTOR);
        assert_eq!(output(&vectors, "selectors", "clear"), CLEAR_SELECTOR);
        assert_eq!(output(&vectors, "package_hash", "hash"), PACKAGE_HASH);
        assert_eq!(output(&vectors, "package_hash", "digest"), DIGEST);
        assert_eq!(output(&vectors, "package_signature", "signature"), SIGNATURE);
    }

    #[test]
    fn test_lite_payload_known_answer() {
        let vectors = generate_all_vectors().expect("generate");
        let canonical = output(&vectors, "package_hash", "canonical_bytes");
        assert_eq!(canonical.len(), 2 * (2 * 64 + 32));
        assert!(canonical.starts_with("4554480000"));
        assert!(canonical.ends_with("000000000000000000000000000000000000000000000000000000006553f100"));

        let expected = format!("{canonical}02{SIGNATURE}");
        assert_eq!(output(&vectors, "lite_payload", "payload"), expected);
    }

    #[test]
    fn test_full_payload_known_answer() {
        let vectors = generate_all_vectors().expect("generate");
        let payload = output(&vectors, "full_payload", "payload");
        let bytes = hex::decode(payload).expect("hex");

        assert_eq!(bytes.len(), 522);
        assert_eq!(hex::encode(&bytes[..4]), CLEAR_SELECTOR);
        assert_eq!(hex::encode(&bytes[4..8]), SET_SELECTOR);
        // set_len = 4 + 0x1e0 bytes of arguments
        assert_eq!(hex::encode(&bytes[522 - 34..522 - 32]), "01e4");
        assert_eq!(hex::encode(&bytes[522 - 32..]), MARKER);
        assert!(payload.contains(&format!("41{SIGNATURE}{}", "00".repeat(31))));
    }

    #[test]
    fn test_committed_fixture_matches() {
        let committed: TestVectors =
            serde_json::from_str(include_str!("../tests/fixtures/test_vectors.json"))
                .expect("parse fixture");
        assert_eq!(committed.vectors.len(), 7);
        assert_eq!(output(&committed, "full_marker", "marker"), MARKER);
        assert_eq!(output(&committed, "package_signature", "signature"), SIGNATURE);
        assert!(verify_vectors(&committed).expect("verify"));
    }
}
