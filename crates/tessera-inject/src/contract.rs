//! Call surface handle.
//!
//! A [`Contract`] is cheap to clone. Wrapping returns a new handle and
//! leaves the original untouched; the most recent wrap always wins.

use std::fmt;
use std::sync::Arc;

use tessera_codec::abi::AbiDecode;
use tessera_types::Address;

use crate::dispatcher::{Dispatcher, Receipt};
use crate::injector::Injector;
use crate::operation::Operation;
use crate::Result;

/// What an invocation produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation<T> {
    /// Decoded output of a read-only call.
    Returned(T),
    /// Receipt of a submitted mutating call.
    Submitted(Receipt),
}

/// Address plus dispatcher, optionally wrapped with an [`Injector`].
#[derive(Clone)]
pub struct Contract {
    address: Address,
    base: Arc<dyn Dispatcher>,
    injector: Option<Arc<Injector>>,
}

impl Contract {
    pub fn new(address: Address, base: Arc<dyn Dispatcher>) -> Self {
        Self {
            address,
            base,
            injector: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_wrapped(&self) -> bool {
        self.injector.is_some()
    }

    pub fn injector(&self) -> Option<&Injector> {
        self.injector.as_deref()
    }

    /// A handle that appends payloads from `injector`, replacing any
    /// injector this handle already carries.
    pub fn wrap(&self, injector: Injector) -> Self {
        Self {
            address: self.address,
            base: Arc::clone(&self.base),
            injector: Some(Arc::new(injector)),
        }
    }

    /// The bare handle, sending calldata unmodified.
    pub fn unwrap(&self) -> Self {
        Self {
            address: self.address,
            base: Arc::clone(&self.base),
            injector: None,
        }
    }

    /// Calldata for `op`, augmented if this handle is wrapped.
    pub async fn prepare<O: Operation>(&self, op: &O) -> Result<Vec<u8>> {
        let calldata = op.calldata();
        match &self.injector {
            Some(injector) => injector.augment(&calldata).await,
            None => Ok(calldata),
        }
    }

    /// Run `op` the way its kind dictates.
    pub async fn invoke<O: Operation>(&self, op: &O) -> Result<Invocation<O::Output>> {
        if O::READ_ONLY {
            self.call(op).await.map(Invocation::Returned)
        } else {
            self.send(op).await.map(Invocation::Submitted)
        }
    }

    /// Execute `op` read-only and decode its output.
    pub async fn call<O: Operation>(&self, op: &O) -> Result<O::Output> {
        let calldata = self.prepare(op).await?;
        tracing::debug!(
            to = %self.address,
            op = O::NAME,
            wrapped = self.is_wrapped(),
            "call"
        );
        let output = self.base.call(self.address, &calldata).await?;
        Ok(O::Output::abi_decode(&output)?)
    }

    /// Submit `op` and return the receipt unchanged.
    pub async fn send<O: Operation>(&self, op: &O) -> Result<Receipt> {
        let calldata = self.prepare(op).await?;
        tracing::debug!(
            to = %self.address,
            op = O::NAME,
            wrapped = self.is_wrapped(),
            "send"
        );
        self.base.send(self.address, &calldata).await
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("address", &self.address)
            .field("injector", &self.injector)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use tessera_codec::abi::AbiWord;
    use tessera_codec::{lite, EncoderStrategy};
    use tessera_connector::MockConnector;
    use tessera_crypto::secp256k1::SigningKey;
    use tessera_types::{ManualClock, PriceEntry, Symbol, PRICE_SCALE};

    /// Records calldata and answers every call with a fixed word.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl Dispatcher for Recorder {
        async fn call(&self, _to: Address, data: &[u8]) -> Result<Vec<u8>> {
            self.seen.lock().await.push(data.to_vec());
            Ok(42u128.to_word().to_vec())
        }

        async fn send(&self, to: Address, data: &[u8]) -> Result<Receipt> {
            self.seen.lock().await.push(data.to_vec());
            Ok(Receipt {
                tx_hash: [7u8; 32],
                to,
                output: Vec::new(),
            })
        }
    }

    struct Ping;

    impl Operation for Ping {
        const NAME: &'static str = "ping";
        const SIGNATURE: &'static str = "ping()";
        const READ_ONLY: bool = true;
        type Output = u128;

        fn encode_args(&self) -> Vec<u8> {
            Vec::new()
        }
    }

    struct Poke;

    impl Operation for Poke {
        const NAME: &'static str = "poke";
        const SIGNATURE: &'static str = "poke()";
        const READ_ONLY: bool = false;
        type Output = ();

        fn encode_args(&self) -> Vec<u8> {
            Vec::new()
        }
    }

    fn injector(eth: u128) -> Injector {
        let connector = MockConnector::new()
            .with_clock(Arc::new(ManualClock::new(1_000)))
            .with_prices([PriceEntry::new(Symbol::new("ETH").expect("symbol"), eth)]);
        Injector::new(Arc::new(connector), EncoderStrategy::Lite, "mock")
            .with_signing_key(SigningKey::generate())
    }

    #[tokio::test]
    async fn test_bare_handle_sends_plain_calldata() {
        let recorder = Arc::new(Recorder::default());
        let contract = Contract::new(Address::from_bytes([1; 20]), recorder.clone());

        let out = contract.invoke(&Ping).await.expect("invoke");
        assert_eq!(out, Invocation::Returned(42));
        assert_eq!(recorder.seen.lock().await[0], Ping.calldata());
    }

    #[tokio::test]
    async fn test_send_returns_receipt() {
        let recorder = Arc::new(Recorder::default());
        let contract = Contract::new(Address::from_bytes([1; 20]), recorder);
        let Invocation::Submitted(receipt) = contract.invoke(&Poke).await.expect("invoke") else {
            panic!("expected a receipt");
        };
        assert_eq!(receipt.tx_hash, [7u8; 32]);
    }

    #[tokio::test]
    async fn test_last_wrap_wins() {
        let recorder = Arc::new(Recorder::default());
        let bare = Contract::new(Address::from_bytes([1; 20]), recorder.clone());
        let wrapped = bare.wrap(injector(PRICE_SCALE)).wrap(injector(2 * PRICE_SCALE));
        assert!(wrapped.is_wrapped());
        assert!(!bare.is_wrapped());

        wrapped.call(&Ping).await.expect("call");
        let seen = recorder.seen.lock().await[0].clone();
        let decoded = lite::decode(&seen).expect("lite payload");
        assert_eq!(decoded.prefix, Ping.calldata().as_slice());
        assert_eq!(decoded.package.entries[0].value, 2 * PRICE_SCALE);
    }

    #[tokio::test]
    async fn test_unwrap_drops_injector() {
        let recorder = Arc::new(Recorder::default());
        let contract = Contract::new(Address::from_bytes([1; 20]), recorder.clone())
            .wrap(injector(PRICE_SCALE))
            .unwrap();
        assert!(!contract.is_wrapped());
        contract.send(&Poke).await.expect("send");
        assert_eq!(recorder.seen.lock().await[0], Poke.calldata());
    }
}
