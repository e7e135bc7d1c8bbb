//! Freshness window for price packages.
//!
//! A package is fresh at reference time `now` when
//!
//! ```text
//! package.timestamp <= now  &&  now - package.timestamp <= max_delay
//! ```
//!
//! The window must be at least [`MIN_PRICE_DELAY_SECS`] wide so that
//! ordinary block-time jitter cannot make every package stale.

use tessera_types::MIN_PRICE_DELAY_SECS;

use crate::{FeedError, Result};

/// Maximum accepted package age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    max_delay: u64,
}

impl FreshnessWindow {
    /// Create a window of `max_delay` seconds.
    ///
    /// # Errors
    ///
    /// [`FeedError::DelayTooShort`] if `max_delay` is below 15 seconds.
    pub fn new(max_delay: u64) -> Result<Self> {
        if max_delay < MIN_PRICE_DELAY_SECS {
            return Err(FeedError::DelayTooShort {
                delay: max_delay,
                min: MIN_PRICE_DELAY_SECS,
            });
        }
        Ok(Self { max_delay })
    }

    /// Age of a package at `reference`, or `None` if it lies in the future.
    pub fn age(timestamp: u64, reference: u64) -> Option<u64> {
        reference.checked_sub(timestamp)
    }

    /// Whether a package stamped `timestamp` is too old at `reference`.
    pub fn is_stale(&self, timestamp: u64, reference: u64) -> bool {
        reference.saturating_sub(timestamp) > self.max_delay
    }

    /// Check a package timestamp against the reference clock.
    ///
    /// # Errors
    ///
    /// - [`FeedError::FutureTimestamp`] if `timestamp > reference`
    /// - [`FeedError::StaleTimestamp`] if the package is older than the window
    pub fn check(&self, timestamp: u64, reference: u64) -> Result<()> {
        if timestamp > reference {
            return Err(FeedError::FutureTimestamp {
                timestamp,
                reference,
            });
        }
        if self.is_stale(timestamp, reference) {
            return Err(FeedError::StaleTimestamp {
                timestamp,
                reference,
                max_delay: self.max_delay,
            });
        }
        Ok(())
    }

    pub fn max_delay(&self) -> u64 {
        self.max_delay
    }
}
