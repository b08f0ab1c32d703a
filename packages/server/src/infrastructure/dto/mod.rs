//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: the event frame written to connections
//! - `http`: HTTP API request and response bodies

pub mod http;
pub mod websocket;
