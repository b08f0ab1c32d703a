//! UseCase: セッションからの退出

use std::sync::Arc;

use crate::domain::{Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, UserId};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 退出のユースケース
pub struct LeaveSessionUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl LeaveSessionUseCase {
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

    /// `user_id` を参加者から外す。参加していなければ `Ok(false)`。
    ///
    /// 所有者が退出しても所有権はそのまま残る。
    pub async fn execute(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<bool, SessionCommandError> {
        let (guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let Some(user) = session.participant(user_id).cloned() else {
            return Ok(false);
        };
        if !self.repository.remove_participant(session_id, user_id).await? {
            return Ok(false);
        }

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(session_id, Event::now(SessionEvent::user_left(&user)))
            .await;

        tracing::info!("User '{}' left session '{}'", user_id, session_id);
        Ok(true)
    }
}
