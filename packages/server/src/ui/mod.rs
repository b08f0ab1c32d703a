//! HTTP and WebSocket surface.

pub mod error;
pub mod extract;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ApiError;
pub use extract::{Caller, USER_ID_HEADER};
pub use server::{Server, router};
pub use state::AppState;
