use crate::viewer::ViewerId;

/// Decide whether an interaction qualifies for tracking.
///
/// Returns `false` when the card has no owner, when the viewing context has
/// no persistable identity, or when the viewer *is* the owner looking at
/// their own card. Pure; no side effects.
pub fn should_track(card_owner_id: Option<&str>, viewer_id: &ViewerId) -> bool {
    let Some(owner) = card_owner_id else {
        return false;
    };
    if owner.is_empty() || viewer_id.is_empty() {
        return false;
    }
    viewer_id.as_str() != owner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_a_regular_viewer() {
        assert!(should_track(Some("owner1"), &ViewerId::new("web_abc")));
    }

    #[test]
    fn rejects_missing_owner() {
        assert!(!should_track(None, &ViewerId::new("web_abc")));
        assert!(!should_track(Some(""), &ViewerId::new("web_abc")));
    }

    #[test]
    fn rejects_empty_viewer() {
        assert!(!should_track(Some("owner1"), &ViewerId::empty()));
    }

    #[test]
    fn rejects_self_interaction() {
        assert!(!should_track(Some("owner1"), &ViewerId::new("owner1")));
    }
}
