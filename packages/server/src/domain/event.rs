//! Real-time event protocol.
//!
//! A closed set of event kinds with fixed payload shapes. Payloads own their
//! data: an emitted [`Event`] is a snapshot and later changes to the session
//! never reach it.

use serde::Serialize;

use super::{ConnectionId, DisplayName, Ticket, TicketId, Timestamp, User, UserId, Vote, VoteValue};

/// Ticket identity as shown when voting starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRef {
    pub id: TicketId,
    pub title: String,
}

impl From<&Ticket> for TicketRef {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            title: ticket.title.as_str().to_string(),
        }
    }
}

/// Event kind and payload. Serializes as `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// Acknowledgement sent to a freshly opened connection only.
    Connected { connection_id: ConnectionId },
    UserJoined {
        user_id: UserId,
        display_name: DisplayName,
    },
    UserLeft {
        user_id: UserId,
        display_name: DisplayName,
    },
    VotingStarted { ticket: TicketRef },
    VotingEnded { ticket: Ticket, votes: Vec<Vote> },
    VoteCast { user_id: UserId, value: VoteValue },
    /// `ticket` is `None` when advancing past the last ticket.
    TicketChanged { ticket: Option<Ticket> },
    TicketCreated { ticket: Ticket },
    TicketUpdated { ticket: Ticket },
    TicketDeleted { ticket_id: TicketId },
    OwnerTransferred { new_owner_id: UserId },
    SessionEnded {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect: Option<String>,
    },
}

impl SessionEvent {
    pub fn user_joined(user: &User) -> Self {
        Self::UserJoined {
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
        }
    }

    pub fn user_left(user: &User) -> Self {
        Self::UserLeft {
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
        }
    }

    /// Wire name of the kind, as used in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::VotingStarted { .. } => "voting-started",
            Self::VotingEnded { .. } => "voting-ended",
            Self::VoteCast { .. } => "vote-cast",
            Self::TicketChanged { .. } => "ticket-changed",
            Self::TicketCreated { .. } => "ticket-created",
            Self::TicketUpdated { .. } => "ticket-updated",
            Self::TicketDeleted { .. } => "ticket-deleted",
            Self::OwnerTransferred { .. } => "owner-transferred",
            Self::SessionEnded { .. } => "session-ended",
        }
    }
}

/// An immutable, timestamped event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    payload: SessionEvent,
    timestamp: Timestamp,
}

impl Event {
    pub fn new(payload: SessionEvent, timestamp: Timestamp) -> Self {
        Self { payload, timestamp }
    }

    /// Stamp `payload` with the current time.
    pub fn now(payload: SessionEvent) -> Self {
        Self::new(payload, Timestamp::new(planpoker_shared::time::now_millis()))
    }

    pub fn payload(&self) -> &SessionEvent {
        &self.payload
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}
