//! Command handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::{json, Value};

use tessera_codec::EncoderStrategy;
use tessera_connector::mock::MOCK_PROVIDER_KEY;
use tessera_connector::{AggregatorConnector, CacheLayerConnector, Connector, MockConnector};
use tessera_crypto::package::recover_package_signer;
use tessera_crypto::secp256k1::{checksum, SigningKey};
use tessera_inject::Injector;
use tessera_types::{Clock, Symbol, SystemClock};

use crate::config::{ConnectorKind, RelayConfig};

/// Build the configured connector.
///
/// A mock connector signs as the well-known mock provider unless the
/// injector has its own key.
pub fn build_connector(config: &RelayConfig) -> anyhow::Result<Arc<dyn Connector>> {
    let settings = &config.connector;
    let timeout = Duration::from_millis(settings.timeout_ms);
    let connector: Arc<dyn Connector> = match settings.kind {
        ConnectorKind::Mock => {
            let mut mock = MockConnector::new();
            if config.injector.signing_key().is_none() {
                mock = mock.with_signing_key(SigningKey::from_hex(MOCK_PROVIDER_KEY)?);
            }
            Arc::new(mock)
        }
        ConnectorKind::Cache => {
            if settings.url.is_empty() {
                bail!("connector.url is required for the cache connector");
            }
            Arc::new(
                CacheLayerConnector::new(&settings.url, &settings.provider_id)
                    .with_timeout(timeout),
            )
        }
        ConnectorKind::Aggregator => {
            if settings.sources.is_empty() {
                bail!("connector.sources is required for the aggregator connector");
            }
            let sources = settings
                .sources
                .iter()
                .map(|source| {
                    Arc::new(
                        CacheLayerConnector::new(&source.url, &source.provider_id)
                            .with_timeout(timeout),
                    ) as Arc<dyn Connector>
                })
                .collect();
            Arc::new(AggregatorConnector::new(sources, settings.min_sources))
        }
    };
    Ok(connector)
}

/// Build the configured injector.
pub fn build_injector(config: &RelayConfig) -> anyhow::Result<Injector> {
    let mut injector = Injector::new(
        build_connector(config)?,
        config.injector.strategy,
        &config.connector.data_source_id,
    );
    if let Some(asset) = &config.connector.asset {
        injector = injector.with_asset(Symbol::new(asset)?);
    }
    if let Some(key) = config.injector.signing_key() {
        injector = injector.with_signing_key(
            SigningKey::from_hex(&key).context("injector.signing_key is not a valid key")?,
        );
    }
    Ok(injector)
}

/// Fetch, sign and encode one payload, returned as `0x`-hex.
pub async fn payload(config: &RelayConfig) -> anyhow::Result<String> {
    let injector = build_injector(config)?;
    let payload = injector.payload().await?;
    Ok(format!("0x{}", hex::encode(payload)))
}

fn decode_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let raw = text.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw).context("calldata is not valid hex")
}

/// Decode augmented calldata and report what it carries.
pub fn inspect(config: &RelayConfig, calldata_hex: &str, clock: &dyn Clock) -> anyhow::Result<Value> {
    let calldata = decode_hex(calldata_hex)?;
    let strategy = EncoderStrategy::detect(&calldata);
    let decoded = strategy
        .decode(&calldata)
        .with_context(|| format!("not a {strategy} payload"))?;
    let signer = recover_package_signer(&decoded.package, &decoded.signature)?;

    let now = clock.now();
    let timestamp = decoded.package.timestamp;
    let entries: Vec<Value> = decoded
        .package
        .entries
        .iter()
        .map(|e| json!({ "symbol": e.symbol.to_string(), "value": e.value.to_string() }))
        .collect();

    Ok(json!({
        "strategy": strategy.as_str(),
        "prefix_len": decoded.prefix.len(),
        "entries": entries,
        "timestamp": timestamp,
        "age_secs": now.checked_sub(timestamp),
        "fresh": timestamp <= now && now - timestamp <= config.verify.max_price_delay_secs,
        "signer": checksum(&signer),
        "authorized": config.verify.authorized_signers.contains(&signer),
    }))
}

/// Identity of a hex private key, in checksummed form.
pub fn address(key_hex: &str) -> anyhow::Result<String> {
    let key = SigningKey::from_hex(key_hex)?;
    Ok(checksum(&key.address()))
}

/// `inspect` against the wall clock.
pub fn inspect_now(config: &RelayConfig, calldata_hex: &str) -> anyhow::Result<Value> {
    inspect(config, calldata_hex, &SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_codec::{full, lite};
    use tessera_crypto::package::sign_package;
    use tessera_types::{ManualClock, PriceEntry, PricePackage};

    fn signed_lite(key: &SigningKey, timestamp: u64) -> String {
        let package = PricePackage::new(
            vec![PriceEntry::new(Symbol::new("IBM").expect("symbol"), 12_300_000_000)],
            timestamp,
        );
        let sig = sign_package(&package, key).expect("sign");
        let mut calldata = vec![0xaa, 0xbb];
        calldata.extend(lite::encode(&package, &sig).expect("encode"));
        format!("0x{}", hex::encode(calldata))
    }

    #[test]
    fn test_address_of_key_one() {
        let key = format!("0x{}01", "00".repeat(31));
        assert_eq!(
            address(&key).expect("address"),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_inspect_lite() {
        let key = SigningKey::generate();
        let mut config = RelayConfig::default();
        config.verify.authorized_signers.push(key.address());

        let report = inspect(&config, &signed_lite(&key, 990), &ManualClock::new(1_000))
            .expect("inspect");
        assert_eq!(report["strategy"], "lite");
        assert_eq!(report["prefix_len"], 2);
        assert_eq!(report["entries"][0]["symbol"], "IBM");
        assert_eq!(report["entries"][0]["value"], "12300000000");
        assert_eq!(report["age_secs"], 10);
        assert_eq!(report["fresh"], true);
        assert_eq!(report["authorized"], true);
        assert_eq!(report["signer"], checksum(&key.address()));
    }

    #[test]
    fn test_inspect_full_unauthorized_and_stale() {
        let key = SigningKey::generate();
        let package = PricePackage::new(
            vec![PriceEntry::new(Symbol::new("ETH").expect("symbol"), 1)],
            100,
        );
        let sig = sign_package(&package, &key).expect("sign");
        let calldata = hex::encode(full::encode(&package, &sig).expect("encode"));

        let report = inspect(&RelayConfig::default(), &calldata, &ManualClock::new(1_000))
            .expect("inspect");
        assert_eq!(report["strategy"], "full");
        assert_eq!(report["prefix_len"], 0);
        assert_eq!(report["fresh"], false);
        assert_eq!(report["authorized"], false);
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect(&RelayConfig::default(), "0x1234", &ManualClock::new(0)).is_err());
        assert!(inspect(&RelayConfig::default(), "zz", &ManualClock::new(0)).is_err());
    }

    #[tokio::test]
    async fn test_mock_payload_signed_by_mock_provider() {
        let config = RelayConfig::default();
        let hex_payload = payload(&config).await.expect("payload");
        let bytes = decode_hex(&hex_payload).expect("hex");
        let decoded = lite::decode(&bytes).expect("lite");
        let provider = SigningKey::from_hex(MOCK_PROVIDER_KEY).expect("key");
        assert_eq!(
            recover_package_signer(&decoded.package, &decoded.signature).expect("recover"),
            provider.address()
        );
        assert_eq!(decoded.package.len(), 2);
    }

    #[test]
    fn test_cache_requires_url() {
        let mut config = RelayConfig::default();
        config.connector.kind = ConnectorKind::Cache;
        assert!(build_connector(&config).is_err());
    }
}
