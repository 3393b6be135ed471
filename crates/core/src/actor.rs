//! Caller-supplied identity attached to every mutation.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who performed an operation, as reported by the caller.
///
/// The core stores these fields verbatim on ledger rows, history rows and audit
/// records; it never authenticates or validates them. System-initiated work
/// uses [`Actor::system`] and carries no user id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<UserId>,
    /// Display string (typically an email address).
    pub display: String,
    /// Source address of the request, if the transport knows it.
    pub source: Option<String>,
}

impl Actor {
    pub const SYSTEM_DISPLAY: &'static str = "system";

    pub fn user(user_id: UserId, display: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            display: display.into(),
            source: None,
        }
    }

    pub fn system() -> Self {
        Self {
            user_id: None,
            display: Self::SYSTEM_DISPLAY.to_string(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_system(&self) -> bool {
        self.user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_actor_has_no_user() {
        let actor = Actor::system();
        assert!(actor.is_system());
        assert_eq!(actor.display, "system");
    }

    #[test]
    fn user_actor_keeps_source_verbatim() {
        let id = UserId::new();
        let actor = Actor::user(id, "ana@shop.test").with_source("10.0.0.7");
        assert_eq!(actor.user_id, Some(id));
        assert!(!actor.is_system());
        assert_eq!(actor.source.as_deref(), Some("10.0.0.7"));
    }
}
