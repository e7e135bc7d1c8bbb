//! The execution environment a [`Contract`](crate::Contract) talks to.

use async_trait::async_trait;

use tessera_types::{Address, Hash};

use crate::Result;

/// Outcome of a submitted mutating call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Identifier assigned by the environment.
    pub tx_hash: Hash,
    /// Call target.
    pub to: Address,
    /// Return data of the call, if the environment exposes it.
    pub output: Vec<u8>,
}

/// Executes calldata against an address.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Execute read-only and return the raw output. Never changes state.
    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>>;

    /// Submit a state-changing call.
    async fn send(&self, to: Address, data: &[u8]) -> Result<Receipt>;
}
