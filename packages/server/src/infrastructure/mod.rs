//! Infrastructure 層
//!
//! ドメイン層の trait（`SessionRepository`, `EventBroadcaster`）の具体的な実装と、
//! ワイヤーフォーマット（DTO）を提供します。

pub mod dto;
pub mod hub;
pub mod repository;
