//! UseCase: セッション終了

use std::sync::Arc;

use crate::domain::{Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, UserId};

use super::{SessionCommandError, SessionLocks, lock_session};

pub const SESSION_ENDED_REASON: &str = "Session has been ended by the owner";

/// セッション終了のユースケース
pub struct EndSessionUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl EndSessionUseCase {
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

    /// セッションをチケット・投票ごと削除する（所有者のみ）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<(), SessionCommandError> {
        let (guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        session.ensure_owner(caller, "end the session")?;
        self.repository.delete_session(session_id).await?;

        let turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::SessionEnded {
                    reason: SESSION_ENDED_REASON.to_string(),
                    redirect: None,
                }),
            )
            .await;
        drop(turn);
        self.locks.forget(session_id);

        tracing::info!("Session '{}' ended by '{}'", session_id, caller);
        Ok(())
    }
}
