pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod event;
pub mod record;
pub mod store;
pub mod viewer;
