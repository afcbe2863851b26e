use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, info};

use cardlytics_core::record::CardStatsRecord;
use cardlytics_core::store::{
    DailyField, FieldPath, Mutation, StatsStore, StoreError, StoreValue,
};

/// Document store holding one [`CardStatsRecord`] per card id.
///
/// Mutation batches commit all-or-nothing at the document level: each batch
/// is applied to a working copy and swapped in only when every mutation
/// succeeded. The async mutex serializes batches, which is a strictly
/// stronger guarantee than the per-field atomicity the contract requires.
pub struct DocStore {
    docs: Mutex<HashMap<String, CardStatsRecord>>,
    snapshot_path: Option<PathBuf>,
}

impl DocStore {
    /// Purely ephemeral store. Used by tests and by deployments that accept
    /// losing counters on restart.
    pub fn in_memory() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Open a store persisted at `path`, loading the existing snapshot when
    /// present. A missing file is a fresh store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let docs = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            docs: Mutex::new(docs),
            snapshot_path: Some(path),
        })
    }

    /// Write the current documents to the snapshot path. No-op for
    /// in-memory stores. Writes to a temp file first so a crash mid-write
    /// never truncates the previous snapshot.
    pub async fn snapshot(&self) -> Result<(), StoreError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        let serialized = {
            let docs = self.docs.lock().await;
            serde_json::to_vec_pretty(&*docs)?
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Background loop: snapshot on a fixed interval. Spawned from `main`;
    /// runs until the process exits. A failed snapshot is logged and the
    /// previous one stays in place.
    pub async fn run_snapshot_loop(self: Arc<Self>, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.snapshot().await {
                Ok(()) => {}
                Err(e) => error!(error = %e, "Snapshot failed — keeping previous snapshot"),
            }
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Number of documents currently held.
    pub async fn len(&self) -> usize {
        self.docs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.lock().await.is_empty()
    }

    fn apply_mutation(
        record: &mut CardStatsRecord,
        mutation: Mutation,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match mutation {
            Mutation::Increment { path, delta } => match path {
                FieldPath::TotalViews => record.total_views += delta,
                FieldPath::TotalClicks => record.total_clicks += delta,
                FieldPath::TotalSaves => record.total_saves += delta,
                FieldPath::UniqueViewers => record.unique_viewers += delta,
                FieldPath::ClickType(t) => {
                    *record.clicks_by_type.entry(t).or_default() += delta;
                }
                FieldPath::Daily(date, field) => {
                    let bucket = record.daily_stats.entry(date).or_default();
                    match field {
                        DailyField::Views => bucket.views += delta,
                        DailyField::Clicks => bucket.clicks += delta,
                        DailyField::Saves => bucket.saves += delta,
                        DailyField::NewContacts => bucket.new_contacts += delta,
                    }
                }
                FieldPath::DailyClickType(date, t) => {
                    *record
                        .daily_clicks_by_type
                        .entry(date)
                        .or_default()
                        .entry(t)
                        .or_default() += delta;
                }
                other => {
                    return Err(StoreError::InvalidMutation {
                        kind: "increment",
                        path: other.to_string(),
                    })
                }
            },
            Mutation::UnionAdd { path, value } => match path {
                FieldPath::ViewerIds => {
                    // Idempotent: re-adding a present id changes nothing.
                    record.viewer_ids.insert(value);
                }
                other => {
                    return Err(StoreError::InvalidMutation {
                        kind: "union_add",
                        path: other.to_string(),
                    })
                }
            },
            Mutation::Set { path, value } => {
                let resolved = match value {
                    StoreValue::Timestamp(ts) => ts,
                    StoreValue::ServerTimestamp => now,
                };
                match path {
                    FieldPath::LastViewedAt => record.last_viewed_at = Some(resolved),
                    FieldPath::UpdatedAt => record.updated_at = Some(resolved),
                    other => {
                        return Err(StoreError::InvalidMutation {
                            kind: "set",
                            path: other.to_string(),
                        })
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatsStore for DocStore {
    async fn get(&self, card_id: &str) -> Result<Option<CardStatsRecord>, StoreError> {
        let docs = self.docs.lock().await;
        Ok(docs.get(card_id).cloned())
    }

    async fn create_if_absent(
        &self,
        card_id: &str,
        default: CardStatsRecord,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().await;
        if !docs.contains_key(card_id) {
            info!(card_id, "Creating card stats document");
            docs.insert(card_id.to_string(), default);
        }
        Ok(())
    }

    async fn atomic_update(
        &self,
        card_id: &str,
        mutations: Vec<Mutation>,
    ) -> Result<(), StoreError> {
        // One server timestamp per batch so every sentinel in the batch
        // resolves to the same instant.
        let now = Utc::now();
        let mut docs = self.docs.lock().await;
        let record = docs
            .get(card_id)
            .ok_or_else(|| StoreError::MissingDocument(card_id.to_string()))?;

        // All-or-nothing: mutate a working copy, commit only on full success.
        let mut working = record.clone();
        for mutation in mutations {
            Self::apply_mutation(&mut working, mutation, now)?;
        }
        docs.insert(card_id.to_string(), working);
        Ok(())
    }
}
