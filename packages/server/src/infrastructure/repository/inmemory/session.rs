//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! セッション・チケット・投票はリレーショナルストアと同じく別々の表として保持し、
//! `get_session` のたびに `Session` を組み立てます。返した値は呼び出し元の
//! スナップショットであり、ストアとは共有しません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use planpoker_shared::time::{Clock, SystemClock};
use tokio::sync::RwLock;

use crate::domain::{
    DisplayName, RepositoryError, Session, SessionId, SessionName, SessionRepository, Ticket,
    TicketId, TicketPhase, TicketTitle, Timestamp, User, UserId, Vote, VoteValue,
};

/// セッション表の 1 行
struct SessionRow {
    name: SessionName,
    owner_id: UserId,
    phase: TicketPhase,
    /// 参加順
    participants: Vec<UserId>,
    created_at: Timestamp,
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, SessionRow>,
    tickets: HashMap<TicketId, Ticket>,
    /// チケットごとの投票（最新の投票順）
    votes: HashMap<TicketId, Vec<Vote>>,
    last_ticket_id: u64,
}

impl Tables {
    fn session_row(&self, session_id: &SessionId) -> Result<&SessionRow, RepositoryError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("session {session_id}")))
    }

    fn session_row_mut(
        &mut self,
        session_id: &SessionId,
    ) -> Result<&mut SessionRow, RepositoryError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("session {session_id}")))
    }

    fn user(&self, user_id: &UserId) -> Result<&User, RepositoryError> {
        self.users
            .get(user_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {user_id}")))
    }

    fn tickets_of(&self, session_id: &SessionId) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .values()
            .filter(|t| &t.session_id == session_id)
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.position);
        tickets
    }
}

/// インメモリ Session Repository 実装
pub struct InMemorySessionRepository {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 作成日時の採番に `clock` を使う
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_user(&self, display_name: DisplayName) -> Result<User, RepositoryError> {
        let user = User {
            id: UserId::generate(),
            display_name,
            created_at: self.now(),
        };
        let mut tables = self.tables.write().await;
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(user_id).cloned())
    }

    async fn create_session(
        &self,
        name: SessionName,
        owner_id: &UserId,
    ) -> Result<Session, RepositoryError> {
        let id = SessionId::generate();
        let created_at = self.now();
        let mut tables = self.tables.write().await;
        let owner = tables.user(owner_id)?.clone();
        tables.sessions.insert(
            id.clone(),
            SessionRow {
                name: name.clone(),
                owner_id: owner_id.clone(),
                phase: TicketPhase::Idle,
                participants: vec![owner_id.clone()],
                created_at,
            },
        );
        Ok(Session {
            id,
            name,
            owner_id: owner_id.clone(),
            phase: TicketPhase::Idle,
            tickets: Vec::new(),
            participants: vec![owner],
            created_at,
        })
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let tables = self.tables.read().await;
        let Some(row) = tables.sessions.get(session_id) else {
            return Ok(None);
        };
        let participants = row
            .participants
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect();
        Ok(Some(Session {
            id: session_id.clone(),
            name: row.name.clone(),
            owner_id: row.owner_id.clone(),
            phase: row.phase,
            tickets: tables.tickets_of(session_id),
            participants,
            created_at: row.created_at,
        }))
    }

    async fn update_session(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let row = tables.session_row_mut(&session.id)?;
        row.name = session.name.clone();
        row.owner_id = session.owner_id.clone();
        row.phase = session.phase;
        Ok(())
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.sessions.remove(session_id).is_none() {
            return Err(RepositoryError::NotFound(format!("session {session_id}")));
        }
        let ticket_ids: Vec<TicketId> = tables
            .tickets
            .values()
            .filter(|t| &t.session_id == session_id)
            .map(|t| t.id)
            .collect();
        for ticket_id in ticket_ids {
            tables.tickets.remove(&ticket_id);
            tables.votes.remove(&ticket_id);
        }
        Ok(())
    }

    async fn add_participant(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.user(user_id)?;
        let row = tables.session_row_mut(session_id)?;
        if row.participants.contains(user_id) {
            return Ok(false);
        }
        row.participants.push(user_id.clone());
        Ok(true)
    }

    async fn remove_participant(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let row = tables.session_row_mut(session_id)?;
        let before = row.participants.len();
        row.participants.retain(|id| id != user_id);
        Ok(row.participants.len() != before)
    }

    async fn create_ticket(
        &self,
        session_id: &SessionId,
        title: TicketTitle,
        description: String,
    ) -> Result<Ticket, RepositoryError> {
        let created_at = self.now();
        let mut tables = self.tables.write().await;
        tables.session_row(session_id)?;
        let position = tables
            .tickets
            .values()
            .filter(|t| &t.session_id == session_id)
            .map(|t| t.position)
            .max()
            .unwrap_or(0)
            + 1;
        tables.last_ticket_id += 1;
        let ticket = Ticket {
            id: TicketId::new(tables.last_ticket_id),
            session_id: session_id.clone(),
            title,
            description,
            final_estimate: None,
            position,
            created_at,
        };
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("ticket {}", ticket.id)))?;
        stored.title = ticket.title.clone();
        stored.description = ticket.description.clone();
        stored.final_estimate = ticket.final_estimate;
        Ok(())
    }

    async fn delete_ticket(&self, ticket_id: TicketId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .tickets
            .remove(&ticket_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("ticket {ticket_id}")))?;
        tables.votes.remove(&ticket_id);
        for ticket in tables
            .tickets
            .values_mut()
            .filter(|t| t.session_id == removed.session_id && t.position > removed.position)
        {
            ticket.position -= 1;
        }
        Ok(())
    }

    async fn submit_vote(
        &self,
        ticket_id: TicketId,
        user_id: &UserId,
        value: VoteValue,
    ) -> Result<Vote, RepositoryError> {
        let created_at = self.now();
        let mut tables = self.tables.write().await;
        if !tables.tickets.contains_key(&ticket_id) {
            return Err(RepositoryError::NotFound(format!("ticket {ticket_id}")));
        }
        let vote = Vote {
            ticket_id,
            user_id: user_id.clone(),
            display_name: tables.user(user_id)?.display_name.clone(),
            value,
            created_at,
        };
        let votes = tables.votes.entry(ticket_id).or_default();
        votes.retain(|v| &v.user_id != user_id);
        votes.push(vote.clone());
        Ok(vote)
    }

    async fn clear_votes_for_ticket(&self, ticket_id: TicketId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.votes.remove(&ticket_id);
        Ok(())
    }

    async fn get_votes_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Vote>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.votes.get(&ticket_id).cloned().unwrap_or_default())
    }
}
