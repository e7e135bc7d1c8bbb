//! Integration test: wrapping a call surface.
//!
//! 1. The most recent wrap decides which payload is appended
//! 2. Unwrapping restores plain calldata
//! 3. Payloads from an unauthorized provider never reach the application
//! 4. A payload in the wrong encoding is rejected

use std::sync::Arc;

use tessera_codec::EncoderStrategy;
use tessera_connector::MockConnector;
use tessera_crypto::secp256k1::SigningKey;
use tessera_feed::Clearing;
use tessera_inject::{InjectError, Injector};
use tessera_integration_tests::ledger::Ledger;
use tessera_types::{Address, ManualClock, PriceEntry, Symbol, PRICE_SCALE};

const USER: Address = Address::from_bytes([0x42; 20]);

fn eth() -> Symbol {
    Symbol::new("ETH").expect("symbol")
}

fn injector(clock: Arc<ManualClock>, eth_price: u128, key: &SigningKey, strategy: EncoderStrategy) -> Injector {
    let connector = MockConnector::new()
        .with_clock(clock)
        .with_prices([PriceEntry::new(eth(), eth_price * PRICE_SCALE)]);
    Injector::new(Arc::new(connector), strategy, "mock").with_signing_key(key.clone())
}

#[tokio::test]
async fn last_wrap_wins() {
    let key = SigningKey::generate();
    let ledger = Ledger::deploy(key.address(), Clearing::AfterCall).expect("deploy");
    let client = ledger.proxied_defi(USER);
    client.deposit(eth(), 2).await.expect("deposit");

    let first = client.wrap(injector(ledger.clock(), 10, &key, EncoderStrategy::Full));
    let second = first.wrap(injector(ledger.clock(), 20, &key, EncoderStrategy::Full));

    assert_eq!(
        first.current_value_of(USER, eth()).await.expect("first"),
        2 * 10 * PRICE_SCALE
    );
    assert_eq!(
        second.current_value_of(USER, eth()).await.expect("second"),
        2 * 20 * PRICE_SCALE
    );
}

#[tokio::test]
async fn unwrap_restores_plain_calls() {
    let key = SigningKey::generate();
    let ledger = Ledger::deploy(key.address(), Clearing::AfterCall).expect("deploy");
    let wrapped = ledger
        .proxied_defi(USER)
        .wrap(injector(ledger.clock(), 10, &key, EncoderStrategy::Full));
    wrapped.current_value_of(USER, eth()).await.expect("wrapped");

    let bare = wrapped.unwrap();
    assert!(!bare.contract().is_wrapped());
    let err = bare
        .current_value_of(USER, eth())
        .await
        .expect_err("no payload");
    assert!(matches!(err, InjectError::Dispatch(msg) if msg.contains("no pricing data")));
}

#[tokio::test]
async fn unauthorized_provider_rejected() {
    let trusted = SigningKey::generate();
    let rogue = SigningKey::generate();
    let ledger = Ledger::deploy(trusted.address(), Clearing::AfterCall).expect("deploy");

    let full = ledger
        .proxied_defi(USER)
        .wrap(injector(ledger.clock(), 10, &rogue, EncoderStrategy::Full));
    let err = full.current_value_of(USER, eth()).await.expect_err("rogue full");
    assert!(matches!(err, InjectError::Dispatch(msg) if msg.contains("unauthorized price data signer")));

    let lite = ledger
        .lite_defi(USER)
        .wrap(injector(ledger.clock(), 10, &rogue, EncoderStrategy::Lite));
    let err = lite.current_value_of(USER, eth()).await.expect_err("rogue lite");
    assert!(matches!(err, InjectError::Dispatch(msg) if msg.contains("unauthorized price data signer")));
}

#[tokio::test]
async fn wrong_encoding_rejected() {
    let key = SigningKey::generate();
    let ledger = Ledger::deploy(key.address(), Clearing::AfterCall).expect("deploy");

    // A lite payload carries no marker, so the proxy forwards it untouched
    // and the feed has nothing stored.
    let lite_to_proxy = ledger
        .proxied_defi(USER)
        .wrap(injector(ledger.clock(), 10, &key, EncoderStrategy::Lite));
    assert!(lite_to_proxy.current_value_of(USER, eth()).await.is_err());

    let full_to_lite = ledger
        .lite_defi(USER)
        .wrap(injector(ledger.clock(), 10, &key, EncoderStrategy::Full));
    assert!(full_to_lite.current_value_of(USER, eth()).await.is_err());
}

#[tokio::test]
async fn unsigned_package_needs_key() {
    let key = SigningKey::generate();
    let ledger = Ledger::deploy(key.address(), Clearing::AfterCall).expect("deploy");
    let injector = Injector::new(
        Arc::new(MockConnector::new().with_clock(ledger.clock())),
        EncoderStrategy::Lite,
        "mock",
    );
    let err = ledger
        .lite_defi(USER)
        .wrap(injector)
        .current_value_of(USER, eth())
        .await
        .expect_err("no key");
    assert!(matches!(err, InjectError::MissingSigningKey));
}
