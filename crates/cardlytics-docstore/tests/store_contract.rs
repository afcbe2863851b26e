use std::sync::Arc;

use cardlytics_core::record::CardStatsRecord;
use cardlytics_core::store::{
    DailyField, FieldPath, Mutation, StatsStore, StoreError, StoreValue,
};
use cardlytics_docstore::DocStore;
use chrono::NaiveDate;

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

#[tokio::test]
async fn get_returns_none_for_unknown_card() {
    let store = DocStore::in_memory();
    assert!(store.get("missing").await.expect("get").is_none());
}

#[tokio::test]
async fn create_if_absent_never_overwrites() {
    let store = DocStore::in_memory();
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");
    store
        .atomic_update(
            "c1",
            vec![Mutation::Increment {
                path: FieldPath::TotalViews,
                delta: 3,
            }],
        )
        .await
        .expect("update");

    // A late concurrent initializer re-running with zero defaults must not
    // reset the already-incremented document.
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create again");

    let record = store.get("c1").await.expect("get").expect("record");
    assert_eq!(record.total_views, 3);
}

#[tokio::test]
async fn update_on_missing_document_fails() {
    let store = DocStore::in_memory();
    let err = store
        .atomic_update(
            "ghost",
            vec![Mutation::Increment {
                path: FieldPath::TotalClicks,
                delta: 1,
            }],
        )
        .await
        .expect_err("missing document");
    assert!(matches!(err, StoreError::MissingDocument(_)));
}

#[tokio::test]
async fn increment_creates_missing_nested_fields() {
    let store = DocStore::in_memory();
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");

    let d = date("2026-08-24");
    store
        .atomic_update(
            "c1",
            vec![
                Mutation::Increment {
                    path: FieldPath::ClickType("email".to_string()),
                    delta: 1,
                },
                Mutation::Increment {
                    path: FieldPath::Daily(d, DailyField::Clicks),
                    delta: 1,
                },
                Mutation::Increment {
                    path: FieldPath::DailyClickType(d, "email".to_string()),
                    delta: 1,
                },
            ],
        )
        .await
        .expect("update");

    let record = store.get("c1").await.expect("get").expect("record");
    assert_eq!(record.clicks_by_type.get("email"), Some(&1));
    assert_eq!(record.daily_stats.get(&d).expect("bucket").clicks, 1);
    assert_eq!(
        record
            .daily_clicks_by_type
            .get(&d)
            .and_then(|m| m.get("email")),
        Some(&1)
    );
}

#[tokio::test]
async fn union_add_is_idempotent() {
    let store = DocStore::in_memory();
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");

    for _ in 0..3 {
        store
            .atomic_update(
                "c1",
                vec![Mutation::UnionAdd {
                    path: FieldPath::ViewerIds,
                    value: "web_v1".to_string(),
                }],
            )
            .await
            .expect("update");
    }

    let record = store.get("c1").await.expect("get").expect("record");
    assert_eq!(record.viewer_ids.len(), 1);
}

#[tokio::test]
async fn server_timestamps_in_one_batch_match() {
    let store = DocStore::in_memory();
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");

    store
        .atomic_update(
            "c1",
            vec![
                Mutation::Set {
                    path: FieldPath::LastViewedAt,
                    value: StoreValue::ServerTimestamp,
                },
                Mutation::Set {
                    path: FieldPath::UpdatedAt,
                    value: StoreValue::ServerTimestamp,
                },
            ],
        )
        .await
        .expect("update");

    let record = store.get("c1").await.expect("get").expect("record");
    assert!(record.last_viewed_at.is_some());
    assert_eq!(record.last_viewed_at, record.updated_at);
}

#[tokio::test]
async fn invalid_mutation_leaves_document_untouched() {
    let store = DocStore::in_memory();
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");

    // Batch is all-or-nothing: the valid increment before the invalid
    // mutation must not land.
    let err = store
        .atomic_update(
            "c1",
            vec![
                Mutation::Increment {
                    path: FieldPath::TotalViews,
                    delta: 1,
                },
                Mutation::Increment {
                    path: FieldPath::ViewerIds,
                    delta: 1,
                },
            ],
        )
        .await
        .expect_err("invalid mutation");
    assert!(matches!(err, StoreError::InvalidMutation { .. }));

    let record = store.get("c1").await.expect("get").expect("record");
    assert_eq!(record.total_views, 0);
}

#[tokio::test]
async fn snapshot_round_trips_documents() {
    let path = std::env::temp_dir().join(format!("cardlytics-snap-{}.json", uuid::Uuid::new_v4()));

    let store = DocStore::open(&path).expect("open fresh");
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");
    store
        .atomic_update(
            "c1",
            vec![
                Mutation::Increment {
                    path: FieldPath::TotalViews,
                    delta: 2,
                },
                Mutation::UnionAdd {
                    path: FieldPath::ViewerIds,
                    value: "web_v1".to_string(),
                },
            ],
        )
        .await
        .expect("update");
    store.snapshot().await.expect("snapshot");

    let reopened = DocStore::open(&path).expect("reopen");
    assert_eq!(reopened.len().await, 1);
    let record = reopened.get("c1").await.expect("get").expect("record");
    assert_eq!(record.total_views, 2);
    assert!(record.viewer_ids.contains("web_v1"));

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn trait_object_dispatch() {
    let store: Arc<dyn StatsStore> = Arc::new(DocStore::in_memory());
    store
        .create_if_absent("c1", CardStatsRecord::new("owner1"))
        .await
        .expect("create");
    assert!(store.get("c1").await.expect("get").is_some());
}
