//! Local stand-in for a signed-package cache service.
//!
//! Answers every `GET /packages/latest` with the configured prices, stamped
//! from the shared clock and signed by the configured provider.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use tessera_crypto::package::sign_package;
use tessera_crypto::secp256k1::SigningKey;
use tessera_types::{Clock, PriceEntry, PricePackage, PRICE_SCALE};

/// Provider configuration served by the stub.
pub struct CacheStub {
    pub key: SigningKey,
    pub clock: Arc<dyn Clock>,
    pub prices: Vec<PriceEntry>,
}

impl CacheStub {
    /// Bind to an ephemeral port and serve until the runtime shuts down.
    /// Returns the base URL.
    pub async fn spawn(self) -> std::io::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);
        let stub = Arc::new(self);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let stub = Arc::clone(&stub);
                tokio::spawn(async move {
                    if let Err(err) = stub.answer(socket).await {
                        warn!(error = %err, "cache stub connection failed");
                    }
                });
            }
        });
        Ok(url)
    }

    fn body(&self) -> String {
        let millis = self.clock.now() * 1000;
        let package = PricePackage::new(self.prices.clone(), millis.div_ceil(1000));
        let prices: Vec<_> = self
            .prices
            .iter()
            .map(|e| {
                json!({
                    "symbol": e.symbol.to_string(),
                    "value": e.value as f64 / PRICE_SCALE as f64,
                })
            })
            .collect();
        match sign_package(&package, &self.key) {
            Ok(signature) => json!({
                "timestamp": millis,
                "prices": prices,
                "signer": self.key.address().to_string(),
                "liteSignature": signature.to_string(),
            })
            .to_string(),
            Err(err) => {
                warn!(error = %err, "cache stub serving unsigned package");
                json!({ "timestamp": millis, "prices": prices }).to_string()
            }
        }
    }

    async fn answer(&self, mut socket: TcpStream) -> std::io::Result<()> {
        let mut buf = vec![0u8; 4096];
        let read = socket.read(&mut buf).await?;
        if read == 0 {
            debug!("cache stub peer closed before sending a request");
            return Ok(());
        }
        let body = self.body();
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await
    }
}
