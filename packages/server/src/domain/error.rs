//! Domain error types.

use thiserror::Error;

use super::{TicketId, UserId};

/// Rejected construction of a value object.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("invalid {kind} id: '{value}'")]
    InvalidId { kind: &'static str, value: String },

    #[error("invalid vote value: '{0}'")]
    InvalidVote(String),

    #[error(
        "display name must be 1-50 characters of letters, numbers, spaces, hyphens and underscores: '{0}'"
    )]
    InvalidDisplayName(String),

    #[error("{field} must be 1-{max} characters")]
    InvalidText { field: &'static str, max: usize },
}

/// A state transition the session does not allow.
///
/// Every variant is a rejected operation: nothing was mutated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionRuleError {
    #[error("only the session owner can {0}")]
    NotOwner(&'static str),

    #[error("ticket {0} not found in this session")]
    TicketNotFound(TicketId),

    #[error("no ticket is selected")]
    NoCurrentTicket,

    #[error("voting is already active")]
    VotingAlreadyActive,

    #[error("voting is not active")]
    VotingNotActive,

    #[error("votes are not accepted before voting starts")]
    VotingNotOpen,

    #[error("user {0} is not a participant of this session")]
    NotParticipant(UserId),

    #[error("user {0} already owns this session")]
    AlreadyOwner(UserId),
}

/// Failure reported by the storage collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}
