//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `registry_mints_total` - Batch mint operations committed
//! - `registry_tokens_minted_total` - Individual tokens issued
//! - `registry_tokens_burned_total` - Tokens burned
//! - `registry_events_total` - Notifications published
//! - `registry_total_supply` - Currently-existing tokens

use prometheus::{IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Batch mint operations committed
    pub mints_total: IntCounter,

    /// Individual tokens issued
    pub tokens_minted_total: IntCounter,

    /// Tokens burned
    pub tokens_burned_total: IntCounter,

    /// Notifications published
    pub events_total: IntCounter,

    /// Currently-existing tokens
    pub total_supply: IntGauge,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let mints_total = IntCounter::with_opts(Opts::new(
            "registry_mints_total",
            "Batch mint operations committed",
        ))?;
        registry.register(Box::new(mints_total.clone()))?;

        let tokens_minted_total = IntCounter::with_opts(Opts::new(
            "registry_tokens_minted_total",
            "Individual tokens issued",
        ))?;
        registry.register(Box::new(tokens_minted_total.clone()))?;

        let tokens_burned_total = IntCounter::with_opts(Opts::new(
            "registry_tokens_burned_total",
            "Tokens burned",
        ))?;
        registry.register(Box::new(tokens_burned_total.clone()))?;

        let events_total = IntCounter::with_opts(Opts::new(
            "registry_events_total",
            "Notifications published",
        ))?;
        registry.register(Box::new(events_total.clone()))?;

        let total_supply = IntGauge::with_opts(Opts::new(
            "registry_total_supply",
            "Currently-existing tokens",
        ))?;
        registry.register(Box::new(total_supply.clone()))?;

        Ok(Self {
            mints_total,
            tokens_minted_total,
            tokens_burned_total,
            events_total,
            total_supply,
            registry,
        })
    }

    /// Record a committed batch mint
    pub fn record_mint(&self, quantity: u32) {
        self.mints_total.inc();
        self.tokens_minted_total.inc_by(u64::from(quantity));
        self.total_supply.add(i64::from(quantity));
    }

    /// Record a burn
    pub fn record_burn(&self) {
        self.tokens_burned_total.inc();
        self.total_supply.dec();
    }

    /// Record published notifications
    pub fn record_events(&self, count: usize) {
        self.events_total.inc_by(count as u64);
    }

    /// Set the supply gauge (used when restoring from a snapshot)
    pub fn set_total_supply(&self, supply: i64) {
        self.total_supply.set(supply);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.mints_total.get(), 0);
        assert_eq!(metrics.total_supply.get(), 0);
    }

    #[test]
    fn test_record_mint_and_burn() {
        let metrics = Metrics::new().unwrap();

        metrics.record_mint(3);
        assert_eq!(metrics.mints_total.get(), 1);
        assert_eq!(metrics.tokens_minted_total.get(), 3);
        assert_eq!(metrics.total_supply.get(), 3);

        metrics.record_burn();
        assert_eq!(metrics.tokens_burned_total.get(), 1);
        assert_eq!(metrics.total_supply.get(), 2);
    }

    #[test]
    fn test_set_total_supply() {
        let metrics = Metrics::new().unwrap();
        metrics.set_total_supply(42);
        assert_eq!(metrics.total_supply.get(), 42);
    }
}
