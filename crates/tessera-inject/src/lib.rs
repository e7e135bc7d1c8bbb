//! # tessera-inject
//!
//! Sending side of the protocol: wraps a call surface so that every outgoing
//! call carries a freshly fetched, signed price payload.
//!
//! ```text
//! Contract::invoke(op)
//!     |
//!     +-- calldata = selector(op) || args
//!     +-- wrapped?  calldata ||= Injector::payload()
//!     |                 fetch -> sign or verify -> encode
//!     +-- read-only?  Dispatcher::call -> decode output
//!         otherwise   Dispatcher::send -> receipt
//! ```
//!
//! ## Modules
//!
//! - [`dispatcher`] — execution environment collaborator
//! - [`operation`] — typed description of one target operation
//! - [`injector`] — fetches, signs and appends payloads
//! - [`contract`] — call surface handle with wrap/unwrap

pub mod contract;
pub mod dispatcher;
pub mod injector;
pub mod operation;

pub use contract::{Contract, Invocation};
pub use dispatcher::{Dispatcher, Receipt};
pub use injector::Injector;
pub use operation::Operation;

use tessera_types::Address;

/// Error types for injected calls.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// Fetching the package failed.
    #[error("fetch failed: {0}")]
    Connector(#[from] tessera_connector::ConnectorError),

    /// Encoding the payload or decoding return data failed.
    #[error("codec error: {0}")]
    Codec(#[from] tessera_codec::CodecError),

    /// Signing or recovery failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),

    /// The connector returned an unsigned package and no key is configured.
    #[error("package is unsigned and no signing key is configured")]
    MissingSigningKey,

    /// A provider-signed package does not recover to its declared signer.
    #[error("package declares signer {declared} but recovers to {recovered}")]
    SignerMismatch {
        /// Identity carried alongside the package.
        declared: Address,
        /// Identity recovered from the signature.
        recovered: Address,
    },

    /// The execution environment rejected or failed the call.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Convenience result type for injected calls.
pub type Result<T> = std::result::Result<T, InjectError>;
