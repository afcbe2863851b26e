//! The stats aggregation engine: turns one qualifying interaction event into
//! one atomic batch of counter mutations against the shared per-card record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::classifier::should_track;
use crate::event::{normalize_content_type, EventKind, TrackEvent};
use crate::record::CardStatsRecord;
use crate::store::{DailyField, FieldPath, Mutation, StatsStore, StoreError, StoreValue};

/// Converts qualifying events into store mutations, owning all dedup and
/// daily-bucketing logic.
///
/// Two documented weak spots are deliberate (not defects):
/// - get-or-create is check-then-create, not atomic. Concurrent first-time
///   events may re-run initialization, which only ever writes zero defaults
///   and never touches an already-incremented document.
/// - the unique-viewer membership read is not linearized against concurrent
///   writers, so a genuinely new concurrent viewer can be undercounted.
///   Overcount is impossible because the set-union write is idempotent.
pub struct StatsAggregator {
    store: Arc<dyn StatsStore>,
    /// Events whose store write failed and was swallowed. Diagnostic only.
    dropped_events: AtomicU64,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self {
            store,
            dropped_events: AtomicU64::new(0),
        }
    }

    /// Number of events lost to swallowed store failures since startup.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Record one interaction. Never fails into the caller: unqualifying
    /// events no-op silently and store failures are logged, counted, and
    /// swallowed. Best-effort analytics, not audit data.
    pub async fn record(&self, event: &TrackEvent) {
        self.record_at(event, Utc::now()).await;
    }

    /// [`record`](Self::record) with a pinned clock, for tests that need to
    /// land events in a specific daily bucket.
    pub async fn record_at(&self, event: &TrackEvent, now: DateTime<Utc>) {
        if !should_track(event.card_owner_id.as_deref(), &event.viewer_id) {
            return;
        }
        // A click with no usable content-type label is malformed, not an error.
        if event.kind == EventKind::Click && normalized_click_type(event).is_none() {
            return;
        }

        if let Err(e) = self.apply(event, now).await {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            warn!(
                card_id = %event.card_id,
                kind = ?event.kind,
                error = %e,
                "stats update dropped"
            );
        }
    }

    async fn apply(&self, event: &TrackEvent, now: DateTime<Utc>) -> Result<(), StoreError> {
        let Some(owner) = event.card_owner_id.as_deref() else {
            return Ok(());
        };

        // Lazy get-or-create. The snapshot read here also feeds the
        // unique-viewer membership test below; both share the same accepted
        // read race.
        let snapshot = match self.store.get(&event.card_id).await? {
            Some(record) => record,
            None => {
                let defaults = CardStatsRecord::new(owner);
                self.store
                    .create_if_absent(&event.card_id, defaults.clone())
                    .await?;
                defaults
            }
        };

        let date = now.date_naive();
        let mut mutations = Vec::with_capacity(8);

        match event.kind {
            EventKind::View => {
                mutations.push(Mutation::Increment {
                    path: FieldPath::TotalViews,
                    delta: 1,
                });
                mutations.push(Mutation::Increment {
                    path: FieldPath::Daily(date, DailyField::Views),
                    delta: 1,
                });

                let is_new_viewer = !snapshot.viewer_ids.contains(event.viewer_id.as_str());
                if is_new_viewer {
                    mutations.push(Mutation::Increment {
                        path: FieldPath::UniqueViewers,
                        delta: 1,
                    });
                    mutations.push(Mutation::UnionAdd {
                        path: FieldPath::ViewerIds,
                        value: event.viewer_id.as_str().to_string(),
                    });
                    mutations.push(Mutation::Increment {
                        path: FieldPath::Daily(date, DailyField::NewContacts),
                        delta: 1,
                    });
                }
            }
            EventKind::Click => {
                // Guarded non-None by record_at.
                let Some(normalized) = normalized_click_type(event) else {
                    return Ok(());
                };
                mutations.push(Mutation::Increment {
                    path: FieldPath::TotalClicks,
                    delta: 1,
                });
                mutations.push(Mutation::Increment {
                    path: FieldPath::ClickType(normalized.clone()),
                    delta: 1,
                });
                mutations.push(Mutation::Increment {
                    path: FieldPath::Daily(date, DailyField::Clicks),
                    delta: 1,
                });
                mutations.push(Mutation::Increment {
                    path: FieldPath::DailyClickType(date, normalized),
                    delta: 1,
                });
            }
            EventKind::Save => {
                mutations.push(Mutation::Increment {
                    path: FieldPath::TotalSaves,
                    delta: 1,
                });
                mutations.push(Mutation::Increment {
                    path: FieldPath::Daily(date, DailyField::Saves),
                    delta: 1,
                });
            }
        }

        mutations.push(Mutation::Set {
            path: FieldPath::LastViewedAt,
            value: StoreValue::ServerTimestamp,
        });
        mutations.push(Mutation::Set {
            path: FieldPath::UpdatedAt,
            value: StoreValue::ServerTimestamp,
        });

        self.store.atomic_update(&event.card_id, mutations).await
    }
}

/// The normalized click counter key, or `None` when the label is absent or
/// normalizes to nothing.
fn normalized_click_type(event: &TrackEvent) -> Option<String> {
    let normalized = normalize_content_type(event.content_type.as_deref()?);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
