//! Request handlers.

mod http;
mod websocket;

pub use http::{
    create_session, create_ticket, delete_ticket, end_session, end_voting, get_session,
    health_check, join_session, leave_session, next_ticket, register_user, select_ticket,
    start_review, start_voting, submit_vote, transfer_owner, update_ticket,
};
pub use websocket::websocket_handler;
