//! HTTP API request and response DTOs.
//!
//! Responses use plain strings and numbers; timestamps are RFC 3339 (UTC).

use serde::{Deserialize, Serialize};

use crate::domain::{Session, Ticket, TicketPhase, User, Vote};
use planpoker_shared::time::millis_to_rfc3339;

// ========================================
// Requests
// ========================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub final_estimate: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnerRequest {
    pub new_owner_id: String,
}

// ========================================
// Responses
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub display_name: String,
    pub created_at: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_str().to_string(),
            display_name: user.display_name.as_str().to_string(),
            created_at: millis_to_rfc3339(user.created_at.value()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDto {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub final_estimate: Option<u32>,
    pub position: u32,
    pub created_at: String,
}

impl From<&Ticket> for TicketDto {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.value(),
            title: ticket.title.as_str().to_string(),
            description: ticket.description.clone(),
            final_estimate: ticket.final_estimate,
            position: ticket.position,
            created_at: millis_to_rfc3339(ticket.created_at.value()),
        }
    }
}

/// A vote as shown to clients. `value` is `None` while it must stay hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDto {
    pub user_id: String,
    pub display_name: String,
    pub value: Option<String>,
}

impl VoteDto {
    pub fn revealed(vote: &Vote) -> Self {
        Self {
            user_id: vote.user_id.as_str().to_string(),
            display_name: vote.display_name.as_str().to_string(),
            value: Some(vote.value.as_str().to_string()),
        }
    }

    pub fn hidden(vote: &Vote) -> Self {
        Self {
            value: None,
            ..Self::revealed(vote)
        }
    }
}

/// Phase names as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseDto {
    Idle,
    Selected,
    Voting,
    Reviewing,
}

impl From<TicketPhase> for PhaseDto {
    fn from(phase: TicketPhase) -> Self {
        match phase {
            TicketPhase::Idle => Self::Idle,
            TicketPhase::Selected(_) => Self::Selected,
            TicketPhase::Voting(_) => Self::Voting,
            TicketPhase::Reviewing(_) => Self::Reviewing,
        }
    }
}

/// Full session state: the refresh path for clients that missed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub phase: PhaseDto,
    pub current_ticket_id: Option<u64>,
    pub voting_active: bool,
    pub tickets: Vec<TicketDto>,
    pub participants: Vec<UserDto>,
    /// Votes on the current ticket; values hidden while voting is active.
    pub votes: Vec<VoteDto>,
    /// Live connections, for presence display.
    pub online: usize,
    pub created_at: String,
}

impl SessionView {
    pub fn new(session: &Session, votes: &[Vote], online: usize) -> Self {
        let hide_values = session.is_voting_active();
        Self {
            id: session.id.as_str().to_string(),
            name: session.name.as_str().to_string(),
            owner_id: session.owner_id.as_str().to_string(),
            phase: session.phase.into(),
            current_ticket_id: session.current_ticket_id().map(|id| id.value()),
            voting_active: hide_values,
            tickets: session.tickets.iter().map(TicketDto::from).collect(),
            participants: session.participants.iter().map(UserDto::from).collect(),
            votes: votes
                .iter()
                .map(|vote| {
                    if hide_values {
                        VoteDto::hidden(vote)
                    } else {
                        VoteDto::revealed(vote)
                    }
                })
                .collect(),
            online,
            created_at: millis_to_rfc3339(session.created_at.value()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingResultDto {
    pub ticket: TicketDto,
    pub votes: Vec<VoteDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTicketDto {
    pub ticket: Option<TicketDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipDto {
    /// Whether the call changed membership.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectDto {
    pub redirect: String,
}
