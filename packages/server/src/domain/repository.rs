//! Storage collaborator interface.
//!
//! The coordinator reads and writes sessions, tickets and votes through this
//! trait only. Implementations live in the infrastructure layer (dependency
//! inversion); every call is a plain request/response.

use async_trait::async_trait;

use super::{
    DisplayName, RepositoryError, Session, SessionId, SessionName, Ticket, TicketId, TicketTitle,
    User, UserId, Vote, VoteValue,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Register a new user identity.
    async fn create_user(&self, display_name: DisplayName) -> Result<User, RepositoryError>;

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Create a session; the owner becomes its first participant.
    async fn create_session(
        &self,
        name: SessionName,
        owner_id: &UserId,
    ) -> Result<Session, RepositoryError>;

    /// Load a session with its tickets (by position) and participants.
    async fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>, RepositoryError>;

    /// Persist the name, owner and phase of `session`.
    async fn update_session(&self, session: &Session) -> Result<(), RepositoryError>;

    /// Delete a session together with its tickets and votes.
    async fn delete_session(&self, session_id: &SessionId) -> Result<(), RepositoryError>;

    /// Returns `true` if the user was not a participant before.
    async fn add_participant(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError>;

    /// Returns `true` if the user was a participant.
    async fn remove_participant(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError>;

    /// Append a ticket after the last position.
    async fn create_ticket(
        &self,
        session_id: &SessionId,
        title: TicketTitle,
        description: String,
    ) -> Result<Ticket, RepositoryError>;

    /// Persist title, description and final estimate of `ticket`.
    async fn update_ticket(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Delete a ticket and its votes; later tickets move up one position.
    async fn delete_ticket(&self, ticket_id: TicketId) -> Result<(), RepositoryError>;

    /// Store `value` as the user's vote, replacing any earlier one.
    async fn submit_vote(
        &self,
        ticket_id: TicketId,
        user_id: &UserId,
        value: VoteValue,
    ) -> Result<Vote, RepositoryError>;

    async fn clear_votes_for_ticket(&self, ticket_id: TicketId) -> Result<(), RepositoryError>;

    /// Votes in submission order.
    async fn get_votes_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Vote>, RepositoryError>;
}
