//! UseCase: セッションへの参加

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, User, UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 参加のユースケース
pub struct JoinSessionUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl JoinSessionUseCase {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        broadcaster: Arc<dyn EventBroadcaster>,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            repository,
            broadcaster,
            locks,
        }
    }

    /// `user_id` を参加者に加える
    ///
    /// 既に参加していれば何もしない（イベントも送出しない）。
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 新たに参加した
    /// * `Ok(false)` - 既に参加していた
    pub async fn execute(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<bool, SessionCommandError> {
        let (guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        if session.is_participant(user_id) {
            return Ok(false);
        }
        let user: User = self
            .repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| SessionCommandError::UserNotFound(user_id.clone()))?;
        let joined = self.repository.add_participant(session_id, user_id).await?;
        if !joined {
            return Ok(false);
        }

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(session_id, Event::now(SessionEvent::user_joined(&user)))
            .await;

        tracing::info!("User '{}' joined session '{}'", user_id, session_id);
        Ok(true)
    }
}
