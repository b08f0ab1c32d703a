//! Domain layer: entities, value objects, the event protocol and the
//! interfaces the coordinator depends on.

pub mod broadcaster;
pub mod entity;
pub mod error;
pub mod event;
pub mod repository;
pub mod value_object;

pub use broadcaster::EventBroadcaster;
pub use entity::{Session, Ticket, TicketEdit, TicketPhase, User, Vote};
pub use error::{RepositoryError, SessionRuleError, ValueObjectError};
pub use event::{Event, SessionEvent, TicketRef};
pub use repository::SessionRepository;
pub use value_object::{
    ConnectionId, DisplayName, SessionId, SessionName, TicketId, TicketTitle, Timestamp, UserId,
    VOTING_CARDS, VoteValue,
};
