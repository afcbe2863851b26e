use std::sync::Arc;

use cardlytics_core::{aggregator::StatsAggregator, config::Config};
use cardlytics_docstore::DocStore;

use crate::forwarder::CollectorForwarder;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The document store backing the stats records. `Arc` so the snapshot
    /// loop and the read endpoint share it with the aggregator.
    pub store: Arc<DocStore>,

    /// The aggregation engine; owns all dedup and bucketing logic.
    pub aggregator: Arc<StatsAggregator>,

    /// Optional side channel to a generic analytics collector. Disabled when
    /// no collector URL is configured.
    pub forwarder: CollectorForwarder,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: DocStore, config: Config) -> Self {
        let store = Arc::new(store);
        let aggregator = Arc::new(StatsAggregator::new(store.clone()));
        let forwarder = CollectorForwarder::from_config(&config);
        Self {
            store,
            aggregator,
            forwarder,
            config: Arc::new(config),
        }
    }
}
