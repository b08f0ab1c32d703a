//! UseCase: 投票
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitVoteUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 投票は Voting と Reviewing（レビュー中の変更）でのみ受け付ける
//! - 投票開始と同時に来た投票が前ラウンドのものとして扱われないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：投票中の投票、レビュー中の変更、再投票（最新の値が残る）
//! - 異常系：投票開始前、参加者以外、存在しないセッション、ストレージ失敗

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, UserId, Vote, VoteValue,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 投票のユースケース
pub struct SubmitVoteUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl SubmitVoteUseCase {
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

    /// 現在のチケットに `voter` の投票を記録する
    pub async fn execute(
        &self,
        session_id: &SessionId,
        voter: &UserId,
        value: VoteValue,
    ) -> Result<Vote, SessionCommandError> {
        let (guard, session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let ticket_id = session.votable_ticket(voter)?;
        let vote = self
            .repository
            .submit_vote(ticket_id, voter, value)
            .await?;

        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::VoteCast {
                    user_id: vote.user_id.clone(),
                    value: vote.value.clone(),
                }),
            )
            .await;

        tracing::info!(
            "User '{}' voted on ticket {} in session '{}'",
            voter,
            ticket_id,
            session_id
        );
        Ok(vote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            RepositoryError, SessionRuleError, TicketId, TicketPhase, entity::fixtures,
            repository::MockSessionRepository,
        },
        usecase::{
            StartVotingUseCase,
            test_support::{Fixture, RecordingBroadcaster},
        },
    };

    fn usecase(fixture: &Fixture) -> SubmitVoteUseCase {
        SubmitVoteUseCase::new(fixture.repo(), fixture.events(), fixture.locks.clone())
    }

    fn vote(value: &str) -> VoteValue {
        VoteValue::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_vote_during_voting() {
        // テスト項目: 投票中の投票が記録され、vote-cast が送出される
        // given (前提条件):
        let fixture = Fixture::new().await;
        let t1 = fixture.tickets[0].id;
        fixture.set_phase(TicketPhase::Voting(t1)).await;

        // when (操作):
        let result = usecase(&fixture)
            .execute(&fixture.session_id, &fixture.alice.id, vote("8"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(result.ticket_id, t1);
        assert_eq!(
            fixture.broadcaster.events(),
            vec![SessionEvent::VoteCast {
                user_id: fixture.alice.id.clone(),
                value: vote("8"),
            }]
        );
    }

    #[tokio::test]
    async fn test_vote_change_during_review() {
        // テスト項目: レビュー中は投票を変更でき、最新の値のみが残る
        // given (前提条件):
        let fixture = Fixture::new().await;
        let t1 = fixture.tickets[0].id;
        fixture.set_phase(TicketPhase::Reviewing(t1)).await;
        let usecase = usecase(&fixture);

        // when (操作):
        usecase
            .execute(&fixture.session_id, &fixture.alice.id, vote("5"))
            .await
            .unwrap();
        usecase
            .execute(&fixture.session_id, &fixture.alice.id, vote("?"))
            .await
            .unwrap();

        // then (期待する結果):
        let votes = fixture.repository.get_votes_for_ticket(t1).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].value, vote("?"));
        assert_eq!(fixture.broadcaster.kinds(), vec!["vote-cast", "vote-cast"]);
    }

    #[tokio::test]
    async fn test_vote_before_voting_starts_is_rejected() {
        // テスト項目: Idle / Selected では投票できない
        // given (前提条件):
        let fixture = Fixture::new().await;
        let usecase = usecase(&fixture);

        // when (操作) / then (期待する結果):
        assert_eq!(
            usecase
                .execute(&fixture.session_id, &fixture.alice.id, vote("1"))
                .await,
            Err(SessionCommandError::Rejected(SessionRuleError::NoCurrentTicket))
        );
        fixture
            .set_phase(TicketPhase::Selected(fixture.tickets[0].id))
            .await;
        assert_eq!(
            usecase
                .execute(&fixture.session_id, &fixture.alice.id, vote("1"))
                .await,
            Err(SessionCommandError::Rejected(SessionRuleError::VotingNotOpen))
        );
        assert!(fixture.broadcaster.events().is_empty());
    }

    #[tokio::test]
    async fn test_vote_on_unknown_session_is_not_found() {
        // テスト項目: 存在しないセッションへの投票は SessionNotFound で、ロックもイベントも残らない
        // given (前提条件):
        let fixture = Fixture::new().await;
        let usecase = usecase(&fixture);
        let missing = SessionId::new("no-such-session".to_string()).unwrap();

        // when (操作):
        let result = usecase
            .execute(&missing, &fixture.alice.id, vote("3"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(SessionCommandError::SessionNotFound(missing)));
        assert_eq!(fixture.locks.len(), 0);
        assert!(fixture.broadcaster.events().is_empty());
    }

    #[tokio::test]
    async fn test_non_participant_cannot_vote() {
        // テスト項目: 参加者以外は投票できない
        // given (前提条件):
        let fixture = Fixture::new().await;
        fixture
            .set_phase(TicketPhase::Voting(fixture.tickets[0].id))
            .await;
        let stranger = UserId::new("stranger".to_string()).unwrap();

        // when (操作):
        let result = usecase(&fixture)
            .execute(&fixture.session_id, &stranger, vote("1"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionCommandError::Rejected(
                SessionRuleError::NotParticipant(stranger)
            ))
        );
    }

    #[tokio::test]
    async fn test_storage_failure_emits_no_event() {
        // テスト項目: 投票の保存に失敗した場合はイベントを送出しない
        // given (前提条件):
        let mut session = fixtures::session();
        session.phase = TicketPhase::Voting(TicketId::new(1));
        let session_id = session.id.clone();
        let alice = UserId::new("alice".to_string()).unwrap();

        let mut repository = MockSessionRepository::new();
        repository
            .expect_get_session()
            .returning(move |_| Ok(Some(session.clone())));
        repository
            .expect_submit_vote()
            .returning(|_, _, _| Err(RepositoryError::Storage("timeout".to_string())));
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let usecase = SubmitVoteUseCase::new(
            Arc::new(repository),
            broadcaster.clone(),
            Arc::new(SessionLocks::new()),
        );

        // when (操作):
        let result = usecase.execute(&session_id, &alice, vote("2")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(SessionCommandError::Storage(_))));
        assert!(broadcaster.events().is_empty());
    }

    #[tokio::test]
    async fn test_votes_racing_with_start_voting_never_leak_into_new_round() {
        // テスト項目: 投票開始と同時の投票は、新ラウンドに残るなら開始イベントの後に送出される
        // given (前提条件):
        let fixture = Fixture::new().await;
        let t1 = fixture.tickets[0].id;
        fixture.set_phase(TicketPhase::Reviewing(t1)).await;
        let submit = Arc::new(usecase(&fixture));
        let start = Arc::new(StartVotingUseCase::new(
            fixture.repo(),
            fixture.events(),
            fixture.locks.clone(),
        ));

        // when (操作):
        let mut handles = Vec::new();
        for voter in [fixture.alice.id.clone(), fixture.bob.id.clone()] {
            let submit = Arc::clone(&submit);
            let session_id = fixture.session_id.clone();
            handles.push(tokio::spawn(async move {
                let _ = submit.execute(&session_id, &voter, vote("13")).await;
            }));
        }
        let start_handle = {
            let start = Arc::clone(&start);
            let session_id = fixture.session_id.clone();
            let owner = fixture.owner.id.clone();
            tokio::spawn(async move { start.execute(&session_id, &owner).await })
        };
        for handle in handles {
            handle.await.unwrap();
        }
        start_handle.await.unwrap().unwrap();

        // then (期待する結果):
        // 新ラウンドに残った投票の数 = voting-started の後に送出された vote-cast の数
        let kinds = fixture.broadcaster.kinds();
        let start_index = kinds.iter().position(|k| *k == "voting-started").unwrap();
        let casts_after_start = kinds[start_index..]
            .iter()
            .filter(|k| **k == "vote-cast")
            .count();
        let stored = fixture.repository.get_votes_for_ticket(t1).await.unwrap();
        assert_eq!(stored.len(), casts_after_start);
    }
}
