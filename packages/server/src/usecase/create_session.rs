//! UseCase: セッション作成

use std::sync::Arc;

use crate::domain::{Session, SessionName, SessionRepository, UserId};

use super::SessionCommandError;

/// セッション作成のユースケース
///
/// 作成直後は接続がないのでイベントは送出しない。
pub struct CreateSessionUseCase {
    repository: Arc<dyn SessionRepository>,
}

impl CreateSessionUseCase {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// `owner` を所有者かつ最初の参加者とするセッションを作る
    pub async fn execute(
        &self,
        owner: &UserId,
        name: SessionName,
    ) -> Result<Session, SessionCommandError> {
        if self.repository.get_user(owner).await?.is_none() {
            return Err(SessionCommandError::UserNotFound(owner.clone()));
        }
        let session = self.repository.create_session(name, owner).await?;
        tracing::info!("Session '{}' created by '{}'", session.id, owner);
        Ok(session)
    }
}
