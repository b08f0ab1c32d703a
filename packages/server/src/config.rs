//! Hub tuning knobs.

use std::time::Duration;

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// Default wait for space in a full outbound queue before the event is dropped.
pub const DEFAULT_DROP_TIMEOUT: Duration = Duration::from_millis(100);
/// Default interval between heartbeat pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Shortest heartbeat period the hub will run with.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10);
/// Default silence after which a connection is considered half-open.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default limit for inbound frames; clients are not expected to send data.
pub const DEFAULT_MAX_INBOUND_MESSAGE_SIZE: usize = 512;

/// Runtime configuration of the broadcast hub and its connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub queue_capacity: usize,
    pub drop_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub max_inbound_message_size: usize,
}

impl HubConfig {
    /// Period between heartbeat pings, never below [`MIN_HEARTBEAT_INTERVAL`].
    pub fn heartbeat_period(&self) -> Duration {
        self.heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL)
    }

    /// Consecutive silent heartbeat ticks tolerated before closing a
    /// connection (at least one).
    pub fn max_missed_heartbeats(&self) -> u32 {
        let missed = self.heartbeat_timeout.as_millis() / self.heartbeat_period().as_millis();
        u32::try_from(missed).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            drop_timeout: DEFAULT_DROP_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            max_inbound_message_size: DEFAULT_MAX_INBOUND_MESSAGE_SIZE,
        }
    }
}
