//! Process-wide notification presentation policy.
//!
//! The policy is installed once during startup with [`init`] and then
//! passed by value to the dispatchers that need it. Nothing is configured
//! implicitly at load time.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

static POLICY: OnceLock<NotificationPolicy> = OnceLock::new();

/// How a notification is presented while the app is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPolicy {
    /// Show a banner/alert.
    pub should_show_alert: bool,
    /// Play the notification sound.
    pub should_play_sound: bool,
    /// Update the app icon badge.
    pub should_set_badge: bool,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            should_show_alert: true,
            should_play_sound: true,
            should_set_badge: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Notification handler is already initialized")]
    AlreadyInitialized,
}

/// Install the process-wide notification policy.
///
/// Must be called exactly once, before any dispatcher is built. A second
/// call leaves the first policy in place and returns
/// [`HandlerError::AlreadyInitialized`].
pub fn init(policy: NotificationPolicy) -> Result<&'static NotificationPolicy, HandlerError> {
    POLICY
        .set(policy)
        .map_err(|_| HandlerError::AlreadyInitialized)?;
    tracing::info!(?policy, "Notification handler initialized");
    POLICY.get().ok_or(HandlerError::AlreadyInitialized)
}

/// The installed policy, if [`init`] has run.
pub fn current() -> Option<&'static NotificationPolicy> {
    POLICY.get()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // The policy is process-global, so init is exercised by a single test.
    #[test]
    fn init_installs_policy_once() {
        let policy = NotificationPolicy {
            should_show_alert: true,
            should_play_sound: false,
            should_set_badge: true,
        };

        let installed = init(policy).expect("first init succeeds");
        assert_eq!(*installed, policy);
        assert_eq!(current(), Some(&policy));

        let second = init(NotificationPolicy::default());
        assert_matches!(second, Err(HandlerError::AlreadyInitialized));
        assert_eq!(current(), Some(&policy));
    }

    #[test]
    fn default_policy_shows_and_sounds_without_badge() {
        let policy = NotificationPolicy::default();
        assert!(policy.should_show_alert);
        assert!(policy.should_play_sound);
        assert!(!policy.should_set_badge);
    }

    #[test]
    fn policy_serializes_camel_case() {
        let json = serde_json::to_value(NotificationPolicy::default()).unwrap();
        assert_eq!(json["shouldShowAlert"], true);
        assert_eq!(json["shouldSetBadge"], false);
    }
}
