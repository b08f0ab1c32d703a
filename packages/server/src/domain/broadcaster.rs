//! Outbound event delivery interface.

use async_trait::async_trait;

use super::{Event, SessionId, UserId};

/// Fire-and-forget fan-out of events to live connections.
///
/// Delivery is best effort: neither method reports slow or dead consumers to
/// the caller.
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    /// Deliver `event` to every connection registered for `session_id`.
    async fn broadcast(&self, session_id: &SessionId, event: Event);

    /// Deliver `event` to every connection `user_id` holds in `session_id`.
    async fn send_to_user(&self, session_id: &SessionId, user_id: &UserId, event: Event);
}
