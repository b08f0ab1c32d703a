//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::{EventBroadcaster, SessionRepository},
    infrastructure::hub::BroadcastHub,
    usecase::{
        AdvanceTicketUseCase, CreateSessionUseCase, CreateTicketUseCase, DeleteTicketUseCase,
        EndSessionUseCase, EndVotingUseCase, GetSessionUseCase, JoinSessionUseCase,
        LeaveSessionUseCase, RegisterUserUseCase, SelectTicketUseCase, SessionLocks,
        StartReviewUseCase, StartVotingUseCase, SubmitVoteUseCase, TransferOwnershipUseCase,
        UpdateTicketUseCase,
    },
};

/// Shared application state
///
/// 起動時に一つ生成し、すべてのハンドラで共有する。
pub struct AppState {
    /// ブロードキャストハブ（接続の登録と配送）
    pub hub: Arc<BroadcastHub>,
    pub register_user: RegisterUserUseCase,
    pub create_session: CreateSessionUseCase,
    pub get_session: GetSessionUseCase,
    pub end_session: EndSessionUseCase,
    pub start_review: StartReviewUseCase,
    pub join_session: JoinSessionUseCase,
    pub leave_session: LeaveSessionUseCase,
    pub create_ticket: CreateTicketUseCase,
    pub update_ticket: UpdateTicketUseCase,
    pub delete_ticket: DeleteTicketUseCase,
    pub select_ticket: SelectTicketUseCase,
    pub start_voting: StartVotingUseCase,
    pub end_voting: EndVotingUseCase,
    pub advance_ticket: AdvanceTicketUseCase,
    pub submit_vote: SubmitVoteUseCase,
    pub transfer_ownership: TransferOwnershipUseCase,
}

impl AppState {
    /// Wire every use case to `repository` and `hub`, sharing one lock table.
    pub fn new(repository: Arc<dyn SessionRepository>, hub: Arc<BroadcastHub>) -> Self {
        let broadcaster: Arc<dyn EventBroadcaster> = hub.clone();
        let locks = Arc::new(SessionLocks::new());
        let (r, b, l) = (&repository, &broadcaster, &locks);

        Self {
            register_user: RegisterUserUseCase::new(r.clone()),
            create_session: CreateSessionUseCase::new(r.clone()),
            get_session: GetSessionUseCase::new(r.clone(), l.clone()),
            end_session: EndSessionUseCase::new(r.clone(), b.clone(), l.clone()),
            start_review: StartReviewUseCase::new(r.clone(), b.clone(), l.clone()),
            join_session: JoinSessionUseCase::new(r.clone(), b.clone(), l.clone()),
            leave_session: LeaveSessionUseCase::new(r.clone(), b.clone(), l.clone()),
            create_ticket: CreateTicketUseCase::new(r.clone(), b.clone(), l.clone()),
            update_ticket: UpdateTicketUseCase::new(r.clone(), b.clone(), l.clone()),
            delete_ticket: DeleteTicketUseCase::new(r.clone(), b.clone(), l.clone()),
            select_ticket: SelectTicketUseCase::new(r.clone(), b.clone(), l.clone()),
            start_voting: StartVotingUseCase::new(r.clone(), b.clone(), l.clone()),
            end_voting: EndVotingUseCase::new(r.clone(), b.clone(), l.clone()),
            advance_ticket: AdvanceTicketUseCase::new(r.clone(), b.clone(), l.clone()),
            submit_vote: SubmitVoteUseCase::new(r.clone(), b.clone(), l.clone()),
            transfer_ownership: TransferOwnershipUseCase::new(r.clone(), b.clone(), l.clone()),
            hub,
        }
    }
}
