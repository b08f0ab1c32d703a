//! UseCase: セッションのスナップショット取得
//!
//! イベントを取りこぼしたクライアントが全状態を取り直すための読み取り経路。

use std::sync::Arc;

use crate::domain::{Session, SessionId, SessionRepository, Vote};

use super::{SessionCommandError, SessionLocks, lock_session};

/// ある時点のセッションと、現在のチケットの投票
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub votes: Vec<Vote>,
}

/// スナップショット取得のユースケース
pub struct GetSessionUseCase {
    repository: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl GetSessionUseCase {
    pub fn new(repository: Arc<dyn SessionRepository>, locks: Arc<SessionLocks>) -> Self {
        Self { repository, locks }
    }

    /// セッションと投票を同じ変更権の下で読む（変更の途中を見せない）
    pub async fn execute(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionCommandError> {
        let (_guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let votes = match session.current_ticket_id() {
            Some(ticket_id) => self.repository.get_votes_for_ticket(ticket_id).await?,
            None => Vec::new(),
        };
        Ok(SessionSnapshot { session, votes })
    }
}
