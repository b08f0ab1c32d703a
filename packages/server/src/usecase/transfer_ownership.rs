//! UseCase: 所有者の移譲

use std::sync::Arc;

use crate::domain::{Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, UserId};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 所有者移譲のユースケース
pub struct TransferOwnershipUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl TransferOwnershipUseCase {
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

    /// 所有権を参加者 `new_owner` に移す（所有者のみ）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
        new_owner: &UserId,
    ) -> Result<(), SessionCommandError> {
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        session.transfer_ownership(caller, new_owner)?;
        self.repository.update_session(&session).await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::OwnerTransferred {
                    new_owner_id: new_owner.clone(),
                }),
            )
            .await;

        tracing::info!(
            "Ownership of session '{}' transferred from '{}' to '{}'",
            session_id,
            caller,
            new_owner
        );
        Ok(())
    }
}
