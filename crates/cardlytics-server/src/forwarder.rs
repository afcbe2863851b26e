use serde_json::json;
use tracing::{debug, warn};

use cardlytics_core::config::Config;
use cardlytics_core::event::{normalize_content_type, EventKind, TrackEvent};

/// Side channel to a generic analytics collector.
///
/// Independent of and non-blocking with respect to the primary store write:
/// every forward is spawned, never awaited by the track path, and a failed
/// delivery is logged and forgotten.
#[derive(Clone)]
pub struct CollectorForwarder {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl CollectorForwarder {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.collector_url.clone(),
        }
    }

    /// Forwarder with the side channel disabled. Used by tests.
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: None,
        }
    }

    /// Fire-and-forget delivery of the collector equivalent of `event`.
    pub fn forward(&self, event: &TrackEvent) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };

        let mut attributes = json!({
            "card_id": event.card_id,
            "viewer_id": event.viewer_id.as_str(),
            "card_owner_id": event.card_owner_id,
            "card_owner_name": event.card_owner_name,
            "card_type": event.card_type,
        });
        if event.kind == EventKind::Click {
            if let Some(content_type) = event.content_type.as_deref() {
                attributes["card_content_type"] =
                    json!(normalize_content_type(content_type));
            }
        }
        let body = json!({
            "event": collector_event_name(event.kind),
            "attributes": attributes,
        });

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    debug!(status = %resp.status(), "Collector rejected event");
                }
                Err(e) => {
                    warn!(error = %e, "Collector forward failed");
                }
            }
        });
    }
}

/// Fixed collector vocabulary.
fn collector_event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::View => "viewed_card",
        EventKind::Click => "card_content_clicked",
        EventKind::Save => "save_contact_to_device",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_is_fixed() {
        assert_eq!(collector_event_name(EventKind::View), "viewed_card");
        assert_eq!(collector_event_name(EventKind::Click), "card_content_clicked");
        assert_eq!(collector_event_name(EventKind::Save), "save_contact_to_device");
    }
}
