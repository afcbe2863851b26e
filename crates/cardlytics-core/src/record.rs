use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters for one calendar date.
///
/// A fixed struct rather than a string-keyed blob so every field can be
/// addressed and incremented atomically by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub views: u64,
    pub clicks: u64,
    pub saves: u64,
    /// Viewers seen for the first time on this date.
    pub new_contacts: u64,
}

/// The per-card engagement document. One record per card id, created lazily
/// on the first qualifying event and never deleted by this subsystem.
///
/// Invariants under single-writer sequential execution:
/// - `unique_viewers == viewer_ids.len() <= total_views`
/// - `sum(clicks_by_type.values()) == total_clicks`
/// - per-kind daily sums equal the matching total
///
/// All counters are non-negative and monotonically non-decreasing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardStatsRecord {
    /// Set once at creation; used to exclude the owner's own interactions.
    pub card_owner_id: String,
    pub total_views: u64,
    pub total_clicks: u64,
    pub total_saves: u64,
    /// Count of distinct viewer identities that have produced a view.
    pub unique_viewers: u64,
    /// Every viewer identity ever seen. Growth-only.
    pub viewer_ids: BTreeSet<String>,
    /// Normalized content-type label → click count.
    pub clicks_by_type: BTreeMap<String, u64>,
    /// UTC calendar date → that day's counters. Keys serialize as YYYY-MM-DD.
    pub daily_stats: BTreeMap<NaiveDate, DailyBucket>,
    /// UTC calendar date → normalized content-type label → click count.
    pub daily_clicks_by_type: BTreeMap<NaiveDate, BTreeMap<String, u64>>,
    /// Store-assigned, updated on every qualifying event.
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CardStatsRecord {
    /// The zeroed document written by the lazy get-or-create path.
    pub fn new(card_owner_id: impl Into<String>) -> Self {
        Self {
            card_owner_id: card_owner_id.into(),
            ..Self::default()
        }
    }
}
