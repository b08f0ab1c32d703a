//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{RepositoryError, SessionId, SessionRuleError, UserId, ValueObjectError};

/// セッション操作の失敗
///
/// `Rejected` と `InvalidInput` は何も変更されていないことを、`Storage` は
/// 永続化に失敗しイベントが送られていないことを表す。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionCommandError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error(transparent)]
    Rejected(#[from] SessionRuleError),

    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
