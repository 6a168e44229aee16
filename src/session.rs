//! Client-scoped session identity
//!
//! One session id is active at a time. It is minted on page load and
//! replaced (never mutated) when the user starts a new conversation.
//! Nothing is persisted across reloads.

use uuid::Uuid;

/// Identity carried on every outbound request
#[derive(Clone, Debug, PartialEq)]
pub struct ClientSession {
    pub id: String,
    /// Milliseconds since epoch, from `js_sys::Date`
    pub created_at: f64,
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            id: format!("web-{}", Uuid::new_v4()),
            created_at: now_ms(),
        }
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

// Unit tests run natively, where js_sys is unavailable.
#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_across_resets() {
        let first = ClientSession::new();
        let second = ClientSession::new();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_id_is_web_scoped() {
        let session = ClientSession::new();
        assert!(session.id.starts_with("web-"));
        assert!(session.id.len() > "web-".len());
    }
}
