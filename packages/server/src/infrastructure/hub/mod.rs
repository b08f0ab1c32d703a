//! Broadcast hub: connection registry, fan-out and connection lifecycle.

pub mod broadcast;
pub mod connection;
pub mod lifecycle;
pub mod registry;

pub use broadcast::BroadcastHub;
pub use connection::{Connection, Delivery};
pub use lifecycle::ExitReason;
pub use registry::{ConnectionRegistry, Registration};
