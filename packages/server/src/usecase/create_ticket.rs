//! UseCase: チケット作成

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, Ticket, TicketTitle,
    UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// チケット作成のユースケース
pub struct CreateTicketUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl CreateTicketUseCase {
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

    /// セッションの末尾にチケットを追加する（所有者のみ）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
        title: TicketTitle,
        description: String,
    ) -> Result<Ticket, SessionCommandError> {
        let (guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        session.ensure_owner(caller, "create tickets")?;
        let ticket = self
            .repository
            .create_ticket(session_id, title, description)
            .await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::TicketCreated {
                    ticket: ticket.clone(),
                }),
            )
            .await;

        tracing::info!("Ticket {} created in session '{}'", ticket.id, session_id);
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::SessionRuleError, usecase::test_support::Fixture};

    fn usecase(fixture: &Fixture) -> CreateTicketUseCase {
        CreateTicketUseCase::new(fixture.repo(), fixture.events(), fixture.locks.clone())
    }

    fn title(value: &str) -> TicketTitle {
        TicketTitle::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_ticket_appends() {
        // テスト項目: 作成したチケットは末尾に追加され、ticket-created が送出される
        // given (前提条件):
        let fixture = Fixture::new().await;

        // when (操作):
        let ticket = usecase(&fixture)
            .execute(
                &fixture.session_id,
                &fixture.owner.id,
                title("Checkout"),
                "Pay with card".to_string(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(ticket.position, 4);
        assert_eq!(fixture.session().await.tickets.last(), Some(&ticket));
        assert_eq!(
            fixture.broadcaster.events(),
            vec![SessionEvent::TicketCreated { ticket }]
        );
    }

    #[tokio::test]
    async fn test_non_owner_cannot_create() {
        // テスト項目: 所有者以外はチケットを作成できない
        // given (前提条件):
        let fixture = Fixture::new().await;

        // when (操作):
        let result = usecase(&fixture)
            .execute(
                &fixture.session_id,
                &fixture.alice.id,
                title("Checkout"),
                String::new(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionCommandError::Rejected(SessionRuleError::NotOwner(
                "create tickets"
            )))
        );
        assert_eq!(fixture.session().await.tickets.len(), 3);
        assert!(fixture.broadcaster.events().is_empty());
    }
}
