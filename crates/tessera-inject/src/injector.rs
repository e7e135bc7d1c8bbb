//! Fetches a package, makes sure it is signed, and appends it to calldata.

use std::fmt;
use std::sync::Arc;

use tessera_codec::EncoderStrategy;
use tessera_connector::{Connector, FetchRequest, FetchedPackage};
use tessera_crypto::package::{recover_signed, sign_into};
use tessera_crypto::secp256k1::SigningKey;
use tessera_types::{SignedPackage, Symbol};

use crate::{InjectError, Result};

/// Payload source for a wrapped [`Contract`](crate::Contract).
pub struct Injector {
    connector: Arc<dyn Connector>,
    strategy: EncoderStrategy,
    request: FetchRequest,
    key: Option<SigningKey>,
}

impl Injector {
    pub fn new(
        connector: Arc<dyn Connector>,
        strategy: EncoderStrategy,
        data_source_id: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            strategy,
            request: FetchRequest::new(data_source_id),
            key: None,
        }
    }

    /// Restrict payloads to a single asset.
    pub fn with_asset(mut self, asset: Symbol) -> Self {
        self.request.asset = Some(asset);
        self
    }

    /// Key used to sign packages the connector returns bare.
    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn strategy(&self) -> EncoderStrategy {
        self.strategy
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Fetch a package and return it signed.
    ///
    /// # Errors
    ///
    /// - [`InjectError::Connector`] if the fetch fails
    /// - [`InjectError::MissingSigningKey`] for a bare package with no key
    /// - [`InjectError::SignerMismatch`] if a provider signature does not
    ///   recover to its declared signer
    pub async fn fetch_signed(&self) -> Result<SignedPackage> {
        match self.connector.fetch(&self.request).await? {
            FetchedPackage::Unsigned(package) => {
                let key = self.key.as_ref().ok_or(InjectError::MissingSigningKey)?;
                Ok(sign_into(package, key)?)
            }
            FetchedPackage::Signed(signed) => {
                let recovered = recover_signed(&signed)?;
                if recovered != signed.signer {
                    return Err(InjectError::SignerMismatch {
                        declared: signed.signer,
                        recovered,
                    });
                }
                Ok(signed)
            }
        }
    }

    /// A fresh payload in the configured encoding.
    pub async fn payload(&self) -> Result<Vec<u8>> {
        let signed = self.fetch_signed().await?;
        let payload = self.strategy.encode(&signed)?;
        tracing::debug!(
            connector = self.connector.name(),
            strategy = %self.strategy,
            signer = %signed.signer,
            entries = signed.package.len(),
            bytes = payload.len(),
            "payload built"
        );
        Ok(payload)
    }

    /// `calldata || payload`.
    pub async fn augment(&self, calldata: &[u8]) -> Result<Vec<u8>> {
        let payload = self.payload().await?;
        let mut out = Vec::with_capacity(calldata.len() + payload.len());
        out.extend_from_slice(calldata);
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("connector", &self.connector.name())
            .field("strategy", &self.strategy)
            .field("request", &self.request)
            .field("signer", &self.key.as_ref().map(SigningKey::address))
            .finish()
    }
}
