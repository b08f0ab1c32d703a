//! UseCase: 投票終了

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, Ticket, UserId, Vote,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 投票終了のユースケース
pub struct EndVotingUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl EndVotingUseCase {
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

    /// 投票を締め切り、集まった投票を公開する（所有者のみ）
    ///
    /// # Returns
    ///
    /// * `Ok((Ticket, Vec<Vote>))` - 対象チケットと投票一覧（投票順）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<(Ticket, Vec<Vote>), SessionCommandError> {
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let ticket = session.end_voting(caller)?;
        self.repository.update_session(&session).await?;
        let votes = self.repository.get_votes_for_ticket(ticket.id).await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::VotingEnded {
                    ticket: ticket.clone(),
                    votes: votes.clone(),
                }),
            )
            .await;

        tracing::info!(
            "Voting ended on ticket {} in session '{}' with {} vote(s)",
            ticket.id,
            session_id,
            votes.len()
        );
        Ok((ticket, votes))
    }
}
