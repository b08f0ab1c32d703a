//! UseCase 層
//!
//! 参加者の操作ごとに一つのユースケースを持つ。セッションを変更するものは
//! すべて同じ手順で動く。
//!
//! 1. `SessionLocks` でセッションの変更権を取得
//! 2. セッションを読み込み、ドメインの遷移を適用（拒否なら何も変更しない）
//! 3. ストレージへ永続化（失敗ならイベントは送らない）
//! 4. 変更権を送出の順番に引き換えて、イベントをちょうど一つブロードキャスト

pub mod advance_ticket;
pub mod create_session;
pub mod create_ticket;
pub mod delete_ticket;
pub mod end_session;
pub mod end_voting;
pub mod error;
pub mod get_session;
pub mod join_session;
pub mod leave_session;
pub mod register_user;
pub mod select_ticket;
pub mod session_lock;
pub mod start_review;
pub mod start_voting;
pub mod submit_vote;
pub mod transfer_ownership;
pub mod update_ticket;

#[cfg(test)]
pub(crate) mod test_support;

pub use advance_ticket::AdvanceTicketUseCase;
pub use create_session::CreateSessionUseCase;
pub use create_ticket::CreateTicketUseCase;
pub use delete_ticket::DeleteTicketUseCase;
pub use end_session::EndSessionUseCase;
pub use end_voting::EndVotingUseCase;
pub use error::SessionCommandError;
pub use get_session::{GetSessionUseCase, SessionSnapshot};
pub use join_session::JoinSessionUseCase;
pub use leave_session::LeaveSessionUseCase;
pub use register_user::RegisterUserUseCase;
pub use select_ticket::SelectTicketUseCase;
pub use session_lock::{PublishTurn, SessionGuard, SessionLocks};
pub use start_review::StartReviewUseCase;
pub use start_voting::StartVotingUseCase;
pub use submit_vote::SubmitVoteUseCase;
pub use transfer_ownership::TransferOwnershipUseCase;
pub use update_ticket::UpdateTicketUseCase;

use crate::domain::{Session, SessionId, SessionRepository};

/// セッションの変更権を取得して読み込む
///
/// 存在しなければ変更権を返却して `SessionNotFound`。
async fn lock_session(
    repository: &dyn SessionRepository,
    locks: &SessionLocks,
    session_id: &SessionId,
) -> Result<(SessionGuard, Session), SessionCommandError> {
    let guard = locks.lock(session_id).await;
    match repository.get_session(session_id).await? {
        Some(session) => Ok((guard, session)),
        None => {
            locks.discard(session_id, guard);
            Err(SessionCommandError::SessionNotFound(session_id.clone()))
        }
    }
}
