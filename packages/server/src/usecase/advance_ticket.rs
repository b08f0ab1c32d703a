//! UseCase: 次のチケットへ進む

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, Ticket, UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 次チケットへ進むユースケース
pub struct AdvanceTicketUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl AdvanceTicketUseCase {
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

    /// 現在のチケットの次を選択する（所有者のみ）
    ///
    /// 未選択なら先頭、最後のチケットの次は `None`（Idle）。
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<Option<Ticket>, SessionCommandError> {
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let next = session.advance(caller)?;
        self.repository.update_session(&session).await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::TicketChanged {
                    ticket: next.clone(),
                }),
            )
            .await;

        match &next {
            Some(ticket) => tracing::info!(
                "Advanced to ticket {} in session '{}'",
                ticket.id,
                session_id
            ),
            None => tracing::info!("Advanced past the last ticket in session '{}'", session_id),
        }
        Ok(next)
    }
}
