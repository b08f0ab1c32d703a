//! Utilities shared by the planning poker packages.

pub mod logger;
pub mod time;
