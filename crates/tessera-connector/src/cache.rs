//! HTTP connector for a signed-package cache service.
//!
//! ```text
//! GET {url}/packages/latest?asset=<asset>&provider=<provider_id>
//!
//! {
//!   "timestamp": 1700000000123,            // milliseconds
//!   "prices": [{ "symbol": "ETH", "value": 1834.21 }],
//!   "signer": "0x...",
//!   "liteSignature": "0x..."               // optional
//! }
//! ```
//!
//! Timestamps are rounded up to whole seconds. A response carrying a
//! signature must recover to the signer it claims.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use tessera_crypto::package::recover_package_signer;
use tessera_types::{
    millis_to_seconds, to_fixed_point, Address, PriceEntry, PricePackage, Signature,
    SignedPackage, Symbol,
};

use crate::{narrow, Connector, ConnectorError, FetchRequest, FetchedPackage, Result};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestPackage {
    timestamp: u64,
    prices: Vec<LatestPrice>,
    signer: Option<Address>,
    lite_signature: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct LatestPrice {
    symbol: Symbol,
    value: f64,
}

/// Fetches the latest package for one provider.
#[derive(Clone, Debug)]
pub struct CacheLayerConnector {
    client: reqwest::Client,
    url: String,
    provider_id: String,
    timeout: Duration,
}

impl CacheLayerConnector {
    pub fn new(url: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            provider_id: provider_id.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn endpoint(&self) -> String {
        format!("{}/packages/latest", self.url)
    }

    fn map_error(&self, err: reqwest::Error) -> ConnectorError {
        if err.is_timeout() {
            ConnectorError::Timeout {
                url: self.endpoint(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if err.is_decode() {
            ConnectorError::InvalidResponse(err.to_string())
        } else {
            ConnectorError::Http(err.to_string())
        }
    }

    async fn get_latest(&self, asset: Option<&Symbol>) -> Result<LatestPackage> {
        let mut query = vec![("provider", self.provider_id.clone())];
        if let Some(asset) = asset {
            query.push(("asset", asset.to_string()));
        }

        let response = self
            .client
            .get(self.endpoint())
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?
            .error_for_status()
            .map_err(|e| self.map_error(e))?;

        response.json().await.map_err(|e| self.map_error(e))
    }
}

/// Turn a response body into a package, checking any claimed signature.
fn into_fetched(latest: LatestPackage, asset: Option<&Symbol>) -> Result<FetchedPackage> {
    let entries = latest
        .prices
        .iter()
        .map(|p| Ok(PriceEntry::new(p.symbol, to_fixed_point(p.value)?)))
        .collect::<Result<Vec<_>>>()?;
    let package = PricePackage::new(entries, millis_to_seconds(latest.timestamp));

    match (latest.lite_signature, latest.signer) {
        (Some(signature), Some(signer)) => {
            // Narrowing would invalidate the signature, so only check presence.
            narrow(package.clone(), asset)?;
            let recovered = recover_package_signer(&package, &signature)?;
            if recovered != signer {
                return Err(ConnectorError::InvalidResponse(format!(
                    "package claims signer {signer} but recovers to {recovered}"
                )));
            }
            Ok(FetchedPackage::Signed(SignedPackage {
                package,
                signer,
                signature,
            }))
        }
        (Some(_), None) => Err(ConnectorError::InvalidResponse(
            "signature without signer".to_string(),
        )),
        (None, _) => Ok(FetchedPackage::Unsigned(narrow(package, asset)?)),
    }
}

#[async_trait]
impl Connector for CacheLayerConnector {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPackage> {
        let latest = self.get_latest(request.asset.as_ref()).await?;
        let fetched = into_fetched(latest, request.asset.as_ref())?;
        tracing::debug!(
            url = %self.url,
            provider = %self.provider_id,
            entries = fetched.package().len(),
            signed = fetched.is_signed(),
            "cache package"
        );
        Ok(fetched)
    }

    fn name(&self) -> &str {
        "cache"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use tessera_crypto::package::sign_package;
    use tessera_crypto::secp256k1::SigningKey;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).expect("symbol")
    }

    /// Serve one canned HTTP response and hand back the request line.
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.expect("read");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            request.lines().next().unwrap_or_default().to_string()
        });
        (url, handle)
    }

    fn signed_body(key: &SigningKey, timestamp_ms: u64) -> String {
        let package = PricePackage::new(
            vec![PriceEntry::new(sym("IBM"), 12_345_000_000)],
            millis_to_seconds(timestamp_ms),
        );
        let sig = sign_package(&package, key).expect("sign");
        json!({
            "timestamp": timestamp_ms,
            "prices": [{ "symbol": "IBM", "value": 123.45 }],
            "signer": key.address().to_string(),
            "liteSignature": sig.to_string(),
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_fetch_signed_package() {
        let key = SigningKey::generate();
        let (url, server) = serve_once("200 OK", signed_body(&key, 1_700_000_000_001)).await;
        let connector = CacheLayerConnector::new(url, "provider-1");

        let request = FetchRequest::new("redstone-stocks").with_asset(sym("IBM"));
        let fetched = connector.fetch(&request).await.expect("fetch");
        let FetchedPackage::Signed(signed) = fetched else {
            panic!("expected a signed package");
        };
        assert_eq!(signed.signer, key.address());
        assert_eq!(signed.package.timestamp, 1_700_000_001);
        assert_eq!(signed.package.value_of(&sym("IBM")), Some(12_345_000_000));

        let request_line = server.await.expect("server");
        assert!(request_line.starts_with("GET /packages/latest?"));
        assert!(request_line.contains("provider=provider-1"));
        assert!(request_line.contains("asset=IBM"));
    }

    #[tokio::test]
    async fn test_signer_mismatch_rejected() {
        let key = SigningKey::generate();
        let mut body: serde_json::Value =
            serde_json::from_str(&signed_body(&key, 1_700_000_000_000)).expect("json");
        body["signer"] = json!(SigningKey::generate().address().to_string());
        let (url, _server) = serve_once("200 OK", body.to_string()).await;

        let err = CacheLayerConnector::new(url, "p")
            .fetch(&FetchRequest::new("s"))
            .await
            .expect_err("mismatch");
        assert!(matches!(err, ConnectorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unsigned_package() {
        let body = json!({
            "timestamp": 2_000,
            "prices": [{ "symbol": "ETH", "value": 10 }, { "symbol": "AVAX", "value": 5 }],
        })
        .to_string();
        let (url, _server) = serve_once("200 OK", body).await;

        let fetched = CacheLayerConnector::new(url, "p")
            .fetch(&FetchRequest::new("s").with_asset(sym("AVAX")))
            .await
            .expect("fetch");
        assert!(!fetched.is_signed());
        assert_eq!(fetched.package().entries, vec![PriceEntry::new(sym("AVAX"), 500_000_000)]);
        assert_eq!(fetched.package().timestamp, 2);
    }

    #[tokio::test]
    async fn test_server_error() {
        let (url, _server) = serve_once("500 Internal Server Error", "{}".to_string()).await;
        let err = CacheLayerConnector::new(url, "p")
            .fetch(&FetchRequest::new("s"))
            .await
            .expect_err("500");
        assert!(matches!(err, ConnectorError::Http(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = CacheLayerConnector::new(url, "p")
            .with_timeout(Duration::from_millis(100))
            .fetch(&FetchRequest::new("s"))
            .await
            .expect_err("timeout");
        assert!(matches!(err, ConnectorError::Timeout { timeout_ms: 100, .. }));
    }

    #[tokio::test]
    async fn test_empty_prices() {
        let body = json!({ "timestamp": 1_000, "prices": [] }).to_string();
        let (url, _server) = serve_once("200 OK", body).await;
        let err = CacheLayerConnector::new(url, "p")
            .fetch(&FetchRequest::new("s"))
            .await
            .expect_err("empty");
        assert!(matches!(err, ConnectorError::EmptyPackage));
    }
}
