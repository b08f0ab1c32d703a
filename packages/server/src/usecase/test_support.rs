//! UseCase テスト用の共通部品

use std::sync::Arc;

use async_trait::async_trait;

use super::SessionLocks;
use crate::{
    domain::{
        DisplayName, Event, EventBroadcaster, Session, SessionEvent, SessionId, SessionName,
        SessionRepository, Ticket, TicketPhase, TicketTitle, User, UserId,
    },
    infrastructure::repository::InMemorySessionRepository,
};

/// 送出されたイベントを記録する EventBroadcaster
#[derive(Default)]
pub struct RecordingBroadcaster {
    broadcasts: parking_lot::Mutex<Vec<(SessionId, Event)>>,
}

impl RecordingBroadcaster {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.broadcasts
            .lock()
            .iter()
            .map(|(_, event)| event.payload().clone())
            .collect()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.broadcasts.lock().iter().map(|(_, e)| e.kind()).collect()
    }
}

#[async_trait]
impl EventBroadcaster for RecordingBroadcaster {
    async fn broadcast(&self, session_id: &SessionId, event: Event) {
        self.broadcasts.lock().push((session_id.clone(), event));
    }

    // ユースケースは個別送信を使わない
    async fn send_to_user(&self, _session_id: &SessionId, _user_id: &UserId, _event: Event) {}
}

/// Owner / Alice / Bob が参加し、チケット T1〜T3 を持つセッション
pub struct Fixture {
    pub repository: Arc<InMemorySessionRepository>,
    pub broadcaster: Arc<RecordingBroadcaster>,
    pub locks: Arc<SessionLocks>,
    pub owner: User,
    pub alice: User,
    pub bob: User,
    pub session_id: SessionId,
    pub tickets: Vec<Ticket>,
}

impl Fixture {
    pub async fn new() -> Self {
        let repository = Arc::new(InMemorySessionRepository::new());
        let user = |name: &str| DisplayName::new(name.to_string()).unwrap();
        let owner = repository.create_user(user("Owner")).await.unwrap();
        let alice = repository.create_user(user("Alice")).await.unwrap();
        let bob = repository.create_user(user("Bob")).await.unwrap();
        let session = repository
            .create_session(SessionName::new("Sprint 42".to_string()).unwrap(), &owner.id)
            .await
            .unwrap();
        repository.add_participant(&session.id, &alice.id).await.unwrap();
        repository.add_participant(&session.id, &bob.id).await.unwrap();
        let mut tickets = Vec::new();
        for title in ["T1", "T2", "T3"] {
            let ticket = repository
                .create_ticket(
                    &session.id,
                    TicketTitle::new(title.to_string()).unwrap(),
                    String::new(),
                )
                .await
                .unwrap();
            tickets.push(ticket);
        }

        Self {
            repository,
            broadcaster: Arc::new(RecordingBroadcaster::default()),
            locks: Arc::new(SessionLocks::new()),
            owner,
            alice,
            bob,
            session_id: session.id,
            tickets,
        }
    }

    pub fn repo(&self) -> Arc<dyn SessionRepository> {
        self.repository.clone()
    }

    pub fn events(&self) -> Arc<dyn EventBroadcaster> {
        self.broadcaster.clone()
    }

    pub async fn session(&self) -> Session {
        self.repository
            .get_session(&self.session_id)
            .await
            .unwrap()
            .unwrap()
    }

    /// フェーズを直接書き換える（イベントは送出しない）
    pub async fn set_phase(&self, phase: TicketPhase) {
        let mut session = self.session().await;
        session.phase = phase;
        self.repository.update_session(&session).await.unwrap();
    }
}
