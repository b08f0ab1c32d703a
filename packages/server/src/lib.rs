//! Real-time planning poker server.
//!
//! Keeps every participant of a session in sync: mutations are applied one at a
//! time per session and each applied mutation is fanned out as an event to all
//! open connections of that session.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
