//! Storage contract for card stats documents.
//!
//! Any store offering atomic numeric increment, atomic set-union, conditional
//! create, and a server-assigned timestamp satisfies this contract; the
//! aggregator has no other dependency on the storage technology.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::record::CardStatsRecord;

/// One counter inside a [`crate::record::DailyBucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyField {
    Views,
    Clicks,
    Saves,
    NewContacts,
}

/// Addressable field of a [`CardStatsRecord`], including nested per-date and
/// per-type counters. Typed paths keep nested addressing atomic without
/// string-keyed path parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    TotalViews,
    TotalClicks,
    TotalSaves,
    UniqueViewers,
    ViewerIds,
    /// `clicks_by_type.<normalized type>`
    ClickType(String),
    /// `daily_stats.<date>.<field>`
    Daily(NaiveDate, DailyField),
    /// `daily_clicks_by_type.<date>.<normalized type>`
    DailyClickType(NaiveDate, String),
    LastViewedAt,
    UpdatedAt,
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalViews => write!(f, "total_views"),
            Self::TotalClicks => write!(f, "total_clicks"),
            Self::TotalSaves => write!(f, "total_saves"),
            Self::UniqueViewers => write!(f, "unique_viewers"),
            Self::ViewerIds => write!(f, "viewer_ids"),
            Self::ClickType(t) => write!(f, "clicks_by_type.{t}"),
            Self::Daily(d, field) => {
                let name = match field {
                    DailyField::Views => "views",
                    DailyField::Clicks => "clicks",
                    DailyField::Saves => "saves",
                    DailyField::NewContacts => "new_contacts",
                };
                write!(f, "daily_stats.{d}.{name}")
            }
            Self::DailyClickType(d, t) => write!(f, "daily_clicks_by_type.{d}.{t}"),
            Self::LastViewedAt => write!(f, "last_viewed_at"),
            Self::UpdatedAt => write!(f, "updated_at"),
        }
    }
}

/// Value accepted by [`Mutation::Set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    Timestamp(DateTime<Utc>),
    /// Resolved by the store at apply time; every sentinel in one
    /// [`StatsStore::atomic_update`] batch resolves to the same instant.
    ServerTimestamp,
}

/// One field-level change. A batch of mutations passed to
/// [`StatsStore::atomic_update`] commits as a single unit at the document
/// level; individual increments and unions are conflict-free across
/// concurrent batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Counters are monotonically non-decreasing, hence the unsigned delta.
    Increment { path: FieldPath, delta: u64 },
    /// Idempotent set membership add.
    UnionAdd { path: FieldPath, value: String },
    Set { path: FieldPath, value: StoreValue },
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or backend failure; the event's contribution is lost.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("no document for card {0}")]
    MissingDocument(String),

    /// Mutation kind applied to a path that cannot accept it, e.g. a numeric
    /// increment against the viewer-id set.
    #[error("cannot apply {kind} at {path}")]
    InvalidMutation { kind: &'static str, path: String },

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Store-agnostic document primitives required by the aggregator.
#[async_trait::async_trait]
pub trait StatsStore: Send + Sync + 'static {
    /// Snapshot of the current document, if any. Not linearized against
    /// concurrent writers.
    async fn get(&self, card_id: &str) -> Result<Option<CardStatsRecord>, StoreError>;

    /// Write `default` only when no document exists for `card_id`. Never
    /// overwrites an existing document.
    async fn create_if_absent(
        &self,
        card_id: &str,
        default: CardStatsRecord,
    ) -> Result<(), StoreError>;

    /// Apply `mutations` as one server-side write: all-or-nothing at the
    /// document level. Fails with [`StoreError::MissingDocument`] when the
    /// card has no document.
    async fn atomic_update(
        &self,
        card_id: &str,
        mutations: Vec<Mutation>,
    ) -> Result<(), StoreError>;
}
