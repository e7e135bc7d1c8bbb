//! Fan-out connector combining several sources.
//!
//! All sources are queried concurrently. Once at least `min_sources` have
//! answered, each symbol takes the median of the values reported for it
//! and the package takes the oldest source timestamp, so the result is
//! never fresher than its stalest input. The combined package is unsigned.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use tessera_types::{PriceEntry, PricePackage, Symbol};

use crate::{narrow, Connector, ConnectorError, FetchRequest, FetchedPackage, Result};

/// Median of a non-empty set of values. Even counts take the lower-biased
/// mean of the two middle values.
pub fn median(values: &mut [u128]) -> Option<u128> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let (lo, hi) = (values[mid - 1], values[mid]);
        Some(lo + (hi - lo) / 2)
    }
}

/// Combine packages into one, symbol order following first appearance.
///
/// # Errors
///
/// [`ConnectorError::EmptyPackage`] if no package carries any entry.
pub fn combine(packages: &[PricePackage]) -> Result<PricePackage> {
    let mut order: Vec<Symbol> = Vec::new();
    let mut values: HashMap<Symbol, Vec<u128>> = HashMap::new();
    for package in packages {
        for entry in &package.entries {
            values
                .entry(entry.symbol)
                .or_insert_with(|| {
                    order.push(entry.symbol);
                    Vec::new()
                })
                .push(entry.value);
        }
    }

    let timestamp = packages
        .iter()
        .map(|p| p.timestamp)
        .min()
        .ok_or(ConnectorError::EmptyPackage)?;

    let entries = order
        .into_iter()
        .filter_map(|symbol| {
            let reported = values.get_mut(&symbol)?;
            median(reported).map(|value| PriceEntry::new(symbol, value))
        })
        .collect();
    Ok(PricePackage::new(entries, timestamp))
}

/// Queries every source and takes per-symbol medians.
pub struct AggregatorConnector {
    sources: Vec<Arc<dyn Connector>>,
    min_sources: usize,
}

impl AggregatorConnector {
    /// `min_sources` is clamped to at least one.
    pub fn new(sources: Vec<Arc<dyn Connector>>, min_sources: usize) -> Self {
        Self {
            sources,
            min_sources: min_sources.max(1),
        }
    }

    pub fn min_sources(&self) -> usize {
        self.min_sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

#[async_trait]
impl Connector for AggregatorConnector {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPackage> {
        let mut tasks = JoinSet::new();
        for source in &self.sources {
            let source = Arc::clone(source);
            let request = request.clone();
            tasks.spawn(async move {
                let outcome = source.fetch(&request).await;
                (source.name().to_string(), outcome)
            });
        }

        let mut packages = Vec::with_capacity(self.sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(fetched))) => packages.push(fetched.into_package()),
                Ok((name, Err(err))) => {
                    tracing::warn!(source = %name, error = %err, "source failed");
                }
                Err(err) => tracing::warn!(error = %err, "source task aborted"),
            }
        }

        if packages.len() < self.min_sources {
            return Err(ConnectorError::InsufficientSources {
                required: self.min_sources,
                available: packages.len(),
            });
        }

        let combined = narrow(combine(&packages)?, request.asset.as_ref())?;
        tracing::debug!(
            sources = packages.len(),
            entries = combined.len(),
            timestamp = combined.timestamp,
            "aggregated package"
        );
        Ok(FetchedPackage::Unsigned(combined))
    }

    fn name(&self) -> &str {
        "aggregator"
    }
}
