//! In-memory execution environment.
//!
//! All contracts share one [`World`] behind a `tokio::sync::Mutex`, so calls
//! are serialized the way a chain orders transactions. A call runs against
//! a snapshot and never commits. A send commits only if it succeeds, which
//! makes every transaction all-or-nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tessera_crypto::keccak::keccak256;
use tessera_feed::{
    CallContext, Clearing, FeedConfig, FeedError, LitePriceReader, PriceAwareProxy, PriceFeed,
    PriceVerifier,
};
use tessera_inject::{Contract, Dispatcher, InjectError, Receipt};
use tessera_types::{Address, Clock, ManualClock, Symbol};

use crate::defi::{DefiClient, LiteDefi, MockDefi};

/// Start of simulated time.
pub const GENESIS: u64 = 1_700_000_000;

pub const ADMIN: Address = Address::from_bytes([0xad; 20]);
pub const FEED: Address = Address::from_bytes([0xfe; 20]);
pub const PROXY: Address = Address::from_bytes([0x9a; 20]);
pub const LITE: Address = Address::from_bytes([0x11; 20]);

/// Every contract's state.
#[derive(Clone, Debug)]
pub struct World {
    pub feed: PriceFeed,
    pub proxy: PriceAwareProxy,
    pub defi: MockDefi,
    pub lite: LiteDefi,
}

impl World {
    fn execute(&mut self, ctx: &CallContext, to: Address, data: &[u8]) -> Result<Vec<u8>, FeedError> {
        match to {
            PROXY => self.proxy.handle(ctx, &mut self.feed, &mut self.defi, data),
            LITE => self.lite.execute(ctx, data),
            other => Err(FeedError::Target(format!("no contract at {other}"))),
        }
    }
}

/// The shared chain.
#[derive(Debug)]
pub struct Ledger {
    world: Mutex<World>,
    clock: Arc<ManualClock>,
    nonce: AtomicU64,
}

impl Ledger {
    /// Deploy the feed, the proxied application and the lite application.
    ///
    /// `signer` is authorized on the feed and trusted by the lite reader.
    /// The proxy is registered as a clearing operator.
    pub fn deploy(signer: Address, clearing: Clearing) -> Result<Arc<Self>, FeedError> {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let ctx = CallContext::new(ADMIN, GENESIS);

        let mut feed = PriceFeed::new(ADMIN, Some(Arc::new(PriceVerifier)), &FeedConfig::default())?;
        feed.authorize_signer(&ctx, signer)?;
        feed.authorize_operator(&ctx, PROXY)?;

        let world = World {
            feed,
            proxy: PriceAwareProxy::new(PROXY, FEED, clearing)?,
            defi: MockDefi::new(),
            lite: LiteDefi::new(LitePriceReader::new(signer, FeedConfig::default().max_price_delay_secs)?),
        };

        Ok(Arc::new(Self {
            world: Mutex::new(world),
            clock,
            nonce: AtomicU64::new(0),
        }))
    }

    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::clone(&self.clock)
    }

    fn context(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.clock.now())
    }

    /// Execute without committing.
    pub async fn call(&self, caller: Address, to: Address, data: &[u8]) -> Result<Vec<u8>, FeedError> {
        let ctx = self.context(caller);
        let mut snapshot = self.world.lock().await.clone();
        snapshot.execute(&ctx, to, data)
    }

    /// Execute and commit on success.
    pub async fn send(
        &self,
        caller: Address,
        to: Address,
        data: &[u8],
    ) -> Result<Receipt, FeedError> {
        let ctx = self.context(caller);
        let mut world = self.world.lock().await;
        let mut next = world.clone();
        let output = next.execute(&ctx, to, data)?;
        *world = next;

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut preimage = nonce.to_be_bytes().to_vec();
        preimage.extend_from_slice(data);
        Ok(Receipt {
            tx_hash: keccak256(&preimage),
            to,
            output,
        })
    }

    /// Stored feed price, as a view call would see it.
    pub async fn price(&self, symbol: &Symbol) -> Result<u128, FeedError> {
        self.world.lock().await.feed.get_price(symbol)
    }

    /// Run an administrative action against committed state.
    pub async fn with_world<R>(&self, f: impl FnOnce(&mut World, &CallContext) -> R) -> R {
        let ctx = self.context(ADMIN);
        let mut world = self.world.lock().await;
        f(&mut world, &ctx)
    }

    /// A dispatcher acting as `caller`.
    pub fn account(self: &Arc<Self>, caller: Address) -> Arc<Account> {
        Arc::new(Account {
            ledger: Arc::clone(self),
            caller,
        })
    }

    /// Typed handle to the proxied application.
    pub fn proxied_defi(self: &Arc<Self>, caller: Address) -> DefiClient {
        DefiClient::new(Contract::new(PROXY, self.account(caller)))
    }

    /// Typed handle to the lite application.
    pub fn lite_defi(self: &Arc<Self>, caller: Address) -> DefiClient {
        DefiClient::new(Contract::new(LITE, self.account(caller)))
    }
}

/// One account's view of the ledger.
#[derive(Debug)]
pub struct Account {
    ledger: Arc<Ledger>,
    caller: Address,
}

#[async_trait]
impl Dispatcher for Account {
    async fn call(&self, to: Address, data: &[u8]) -> tessera_inject::Result<Vec<u8>> {
        self.ledger
            .call(self.caller, to, data)
            .await
            .map_err(|e| InjectError::Dispatch(e.to_string()))
    }

    async fn send(&self, to: Address, data: &[u8]) -> tessera_inject::Result<Receipt> {
        self.ledger
            .send(self.caller, to, data)
            .await
            .map_err(|e| InjectError::Dispatch(e.to_string()))
    }
}
