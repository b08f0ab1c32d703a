//! UseCase: チケット削除

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, TicketId, UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// チケット削除のユースケース
pub struct DeleteTicketUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl DeleteTicketUseCase {
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

    /// チケットとその投票を削除する（所有者のみ）
    ///
    /// 現在のチケットを削除した場合、セッションは Idle に戻る。
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
        ticket_id: TicketId,
    ) -> Result<(), SessionCommandError> {
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let phase_before = session.phase;
        session.remove_ticket(caller, ticket_id)?;
        self.repository.delete_ticket(ticket_id).await?;
        if session.phase != phase_before {
            self.repository.update_session(&session).await?;
        }

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::TicketDeleted { ticket_id }),
            )
            .await;

        tracing::info!("Ticket {} deleted from session '{}'", ticket_id, session_id);
        Ok(())
    }
}
