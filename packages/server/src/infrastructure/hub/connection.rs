//! One live client connection as seen by the hub.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::mpsc::{
    self,
    error::{SendTimeoutError, TrySendError},
};

use crate::domain::{ConnectionId, SessionId, Timestamp, UserId};

/// Serialized wire frame shared by every recipient of one broadcast.
pub type Frame = Arc<str>;

/// Outcome of pushing a frame onto a connection's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The queue stayed full for the whole wait; the frame was discarded.
    Dropped,
    /// The send loop is gone.
    Closed,
}

/// Connection state shared between its lifecycle handler and the hub.
///
/// The lifecycle handler owns the `Arc`; the registry only holds a weak
/// reference, so the transport is never kept alive by the hub.
pub struct Connection {
    pub id: ConnectionId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub connected_at: Timestamp,
    /// Bounded outbound queue drained by the send loop.
    tx: mpsc::Sender<Frame>,
    /// Set on any inbound traffic, cleared by the heartbeat check.
    alive: AtomicBool,
    dropped: AtomicU64,
}

impl Connection {
    /// Create a connection and the receiving end of its outbound queue.
    pub fn new(
        session_id: SessionId,
        user_id: UserId,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let connection = Self {
            id: ConnectionId::generate(),
            session_id,
            user_id,
            connected_at: Timestamp::new(planpoker_shared::time::now_millis()),
            tx,
            alive: AtomicBool::new(true),
            dropped: AtomicU64::new(0),
        };
        (connection, rx)
    }

    /// Push `frame` onto the outbound queue, waiting at most `wait` for space.
    pub async fn deliver(&self, frame: Frame, wait: Duration) -> Delivery {
        let frame = match self.tx.try_send(frame) {
            Ok(()) => return Delivery::Queued,
            Err(TrySendError::Closed(_)) => return Delivery::Closed,
            Err(TrySendError::Full(frame)) => frame,
        };
        match self.tx.send_timeout(frame, wait).await {
            Ok(()) => Delivery::Queued,
            Err(SendTimeoutError::Timeout(_)) => {
                let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::Dropped
            }
            Err(SendTimeoutError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Whether the send loop has released the queue.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Relaxed);
    }

    /// Returns whether anything arrived since the previous check, and resets
    /// the flag.
    pub fn check_alive(&self) -> bool {
        self.alive.swap(false, Ordering::Relaxed)
    }

    /// Frames discarded because the queue was full.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("dropped", &self.drop_count())
            .finish_non_exhaustive()
    }
}
