//! UseCase: チケット更新

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, Ticket, TicketEdit,
    TicketId, UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// チケット更新のユースケース
pub struct UpdateTicketUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl UpdateTicketUseCase {
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

    /// チケットのタイトル・説明・最終見積もりを更新する（所有者のみ）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
        ticket_id: TicketId,
        edit: TicketEdit,
    ) -> Result<Ticket, SessionCommandError> {
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let ticket = session.edit_ticket(caller, ticket_id, edit)?;
        self.repository.update_ticket(&ticket).await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::TicketUpdated {
                    ticket: ticket.clone(),
                }),
            )
            .await;

        tracing::info!("Ticket {} updated in session '{}'", ticket.id, session_id);
        Ok(ticket)
    }
}
