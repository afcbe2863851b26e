//! In-process document store backend for card stats.
//!
//! Implements the [`cardlytics_core::store::StatsStore`] contract with
//! per-field atomic mutation semantics and optional JSON snapshot
//! persistence.

mod backend;

pub use backend::DocStore;
