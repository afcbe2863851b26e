use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque anonymous viewer identity.
///
/// The empty identity means "this context cannot be tracked" — callers must
/// treat it as do-not-track rather than as a real viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerId(String);

impl ViewerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the stable anonymous identity for the current viewing context.
///
/// Injected into callers rather than read from ambient global state. No
/// network access; resolution is purely local.
pub trait ViewerIdentityProvider: Send + Sync {
    /// Return the persisted identity, generating and persisting a fresh one
    /// on first use. Returns the empty identity when the context cannot
    /// persist (callers must not track).
    fn resolve(&self) -> ViewerId;

    /// Forget the persisted identity. The next [`resolve`] generates a new one.
    ///
    /// [`resolve`]: ViewerIdentityProvider::resolve
    fn clear(&self);
}

/// File-backed identity provider: one `web_<uuid>` id per backing path,
/// created on first resolve and stable until [`ViewerIdentityProvider::clear`].
#[derive(Debug, Clone)]
pub struct StoredViewerIdentity {
    path: PathBuf,
}

impl StoredViewerIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ViewerIdentityProvider for StoredViewerIdentity {
    fn resolve(&self) -> ViewerId {
        if let Ok(existing) = fs::read_to_string(&self.path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return ViewerId::new(existing);
            }
        }

        let fresh = format!("web_{}", uuid::Uuid::new_v4());
        if let Some(parent) = self.path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return ViewerId::empty();
            }
        }
        // Unpersistable context: hand back the empty id so the caller skips
        // tracking instead of counting a viewer that changes every visit.
        match fs::write(&self.path, &fresh) {
            Ok(()) => ViewerId::new(fresh),
            Err(_) => ViewerId::empty(),
        }
    }

    fn clear(&self) {
        fs::remove_file(&self.path).ok();
    }
}

/// Derive a stable viewer id from IP and User-Agent.
///
/// Formula: sha256(ip + user_agent)[0..8] encoded as 16 hex chars. Used as
/// the server-side fallback when the client did not send its persisted id.
/// Unlike rotating visitor-id schemes there is no salt epoch: repeat visits
/// from the same context must dedupe across days.
///
/// Returns the empty id when both inputs are blank (nothing to identify).
pub fn derive_viewer_id(ip: &str, user_agent: &str) -> ViewerId {
    if ip.is_empty() && user_agent.is_empty() {
        return ViewerId::empty();
    }
    let input = format!("{}{}", ip, user_agent);
    let hash = Sha256::digest(input.as_bytes());
    ViewerId::new(hex::encode(&hash[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_id_path() -> PathBuf {
        std::env::temp_dir().join(format!("cardlytics-viewer-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn stored_identity_is_stable_across_resolves() {
        let provider = StoredViewerIdentity::new(temp_id_path());
        let first = provider.resolve();
        let second = provider.resolve();
        assert!(!first.is_empty());
        assert!(first.as_str().starts_with("web_"));
        assert_eq!(first, second);
        provider.clear();
    }

    #[test]
    fn clear_forces_a_new_identity() {
        let provider = StoredViewerIdentity::new(temp_id_path());
        let first = provider.resolve();
        provider.clear();
        let second = provider.resolve();
        assert_ne!(first, second);
        provider.clear();
    }

    #[test]
    fn derived_id_is_16_hex_chars() {
        let id = derive_viewer_id("1.2.3.4", "Mozilla/5.0 Chrome/120");
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derived_id_is_deterministic() {
        let a = derive_viewer_id("1.2.3.4", "Mozilla/5.0 Chrome/120");
        let b = derive_viewer_id("1.2.3.4", "Mozilla/5.0 Chrome/120");
        assert_eq!(a, b);
    }

    #[test]
    fn derived_id_is_empty_without_inputs() {
        assert!(derive_viewer_id("", "").is_empty());
    }
}
