//! UseCase: 振り返り（サマリー）開始
//!
//! 状態は変更せず、全員をサマリーページへ誘導する session-ended を送出する。

use std::sync::Arc;

use crate::domain::{Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, UserId};

use super::{SessionCommandError, SessionLocks, lock_session};

pub const REVIEW_STARTED_REASON: &str = "Session review started by the owner";

/// サマリーページのパス
pub fn summary_path(session_id: &SessionId) -> String {
    format!("/session/{session_id}/summary")
}

/// 振り返り開始のユースケース
pub struct StartReviewUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl StartReviewUseCase {
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

    /// 所有者のみ。戻り値は誘導先のパス。
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<String, SessionCommandError> {
        let (guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        session.ensure_owner(caller, "start the review")?;
        let redirect = summary_path(session_id);

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::SessionEnded {
                    reason: REVIEW_STARTED_REASON.to_string(),
                    redirect: Some(redirect.clone()),
                }),
            )
            .await;

        tracing::info!("Review started for session '{}'", session_id);
        Ok(redirect)
    }
}
