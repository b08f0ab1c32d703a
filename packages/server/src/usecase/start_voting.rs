//! UseCase: 投票開始
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StartVotingUseCase::execute() メソッド
//! - Selected / Reviewing → Voting の遷移と投票のクリア
//!
//! ### なぜこのテストが必要か
//! - 投票開始は前ラウンドの投票を消すため、他の操作と交錯すると
//!   「前ラウンドの投票が新ラウンドに残る」不整合が起きうる
//! - 拒否・ストレージ失敗の場合にイベントが送出されないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：選択中チケットの投票開始、レビュー中からの再投票
//! - 異常系：所有者以外、チケット未選択、投票中、ストレージ失敗
//! - 並行性：同時に二つの投票開始が来た場合

use std::sync::Arc;

use crate::domain::{
    Event, EventBroadcaster, SessionEvent, SessionId, SessionRepository, Ticket, UserId,
};

use super::{SessionCommandError, SessionLocks, lock_session};

/// 投票開始のユースケース
pub struct StartVotingUseCase {
    repository: Arc<dyn SessionRepository>,
    broadcaster: Arc<dyn EventBroadcaster>,
    locks: Arc<SessionLocks>,
}

impl StartVotingUseCase {
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

    /// 現在のチケットの投票を開始する（所有者のみ）
    ///
    /// # Returns
    ///
    /// * `Ok(Ticket)` - 投票対象のチケット
    /// * `Err(SessionCommandError)` - 拒否またはストレージ失敗（イベントは送出されない）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<Ticket, SessionCommandError> {
        // 1. セッションを読み込んで遷移を適用
        let (guard, mut session) =
            lock_session(self.repository.as_ref(), &self.locks, session_id).await?;
        let ticket = session.start_voting(caller)?;

        // 2. 前ラウンドの投票を消してから投票中に切り替える
        self.repository.clear_votes_for_ticket(ticket.id).await?;
        self.repository.update_session(&session).await?;

        // 3. ブロードキャスト
        let _turn = guard.into_publish_turn().await;
        self.broadcaster
            .broadcast(
                session_id,
                Event::now(SessionEvent::VotingStarted {
                    ticket: (&ticket).into(),
                }),
            )
            .await;

        tracing::info!(
            "Voting started on ticket {} in session '{}'",
            ticket.id,
            session_id
        );
        Ok(ticket)
    }
}
