//! Integration test harness for Tessera.
//!
//! Provides an in-memory execution environment so tests can drive the
//! sending side (connectors, injector, contract handles) against the
//! receiving side (proxy, feed, lite reader) without a chain:
//!
//! - [`defi`] — a small deposit/valuation application and its typed surface
//! - [`ledger`] — serialized world state plus a [`Dispatcher`] per account
//! - [`cache_stub`] — local HTTP cache service for connector tests
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p tessera-integration-tests
//! ```
//!
//! [`Dispatcher`]: tessera_inject::Dispatcher

pub mod cache_stub;
pub mod defi;
pub mod ledger;
