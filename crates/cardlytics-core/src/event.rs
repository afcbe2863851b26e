use serde::{Deserialize, Serialize};

use crate::viewer::ViewerId;

/// What the viewer did on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Click,
    Save,
}

/// The payload the client sends to the `POST /api/track/*` endpoints.
///
/// `content_type` is required for click events and ignored otherwise.
/// `viewer_id` is the locally persisted anonymous identity; when absent the
/// server derives one from the request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackPayload {
    pub card_id: String,
    /// Absent on cards that were never claimed by an owner; such events are
    /// not tracked.
    pub card_owner_id: Option<String>,
    pub card_type: String,
    pub card_owner_name: String,
    pub content_type: Option<String>,
    pub viewer_id: Option<String>,
}

/// A fully resolved interaction event, ready for the aggregator.
#[derive(Debug, Clone)]
pub struct TrackEvent {
    pub kind: EventKind,
    pub card_id: String,
    pub card_owner_id: Option<String>,
    pub viewer_id: ViewerId,
    /// Raw content-type label as supplied by the caller; normalized via
    /// [`normalize_content_type`] before use as a storage key. Click only.
    pub content_type: Option<String>,
    pub card_type: String,
    pub card_owner_name: String,
}

/// Normalize a content-type label for use as a counter key: lower-cased,
/// internal whitespace runs collapsed to a single underscore.
///
/// `"Social Media"` → `"social_media"`.
pub fn normalize_content_type(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
