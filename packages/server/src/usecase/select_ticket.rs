//! UseCase: チケット選択

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, Ticket, TicketId, UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// チケット選択のユースケース
pub struct SelectTicketUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl SelectTicketUseCase {
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

    /// `ticket_id` を現在のチケットにする（所有者のみ）
    ///
    /// どのフェーズからでも Selected になる。投票中なら投票は打ち切られる。
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
        ticket_id: TicketId,
    ) -> Result<Ticket, SessionCommandError> {
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let ticket = session.select_ticket(caller, ticket_id)?;
        self.repository.update_session(&session).await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::TicketChanged {
                    ticket: Some(ticket.clone()),
                }),
            )
            .await;

        tracing::info!("Ticket {} selected in session '{}'", ticket.id, session_id);
        Ok(ticket)
    }
}
