//! Entities: users, sessions, tickets and votes.
//!
//! `Session` owns the per-ticket state machine. Every transition is a pure
//! method that either mutates the in-memory value or returns a
//! [`SessionRuleError`] without touching it; persisting the result is the
//! caller's job.

use serde::Serialize;

use super::{
    DisplayName, SessionId, SessionName, SessionRuleError, TicketId, TicketTitle, Timestamp,
    UserId, VoteValue,
};

/// A registered participant identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub display_name: DisplayName,
    pub created_at: Timestamp,
}

/// One item awaiting an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub session_id: SessionId,
    pub title: TicketTitle,
    pub description: String,
    pub final_estimate: Option<u32>,
    /// 1-based order within the session.
    pub position: u32,
    pub created_at: Timestamp,
}

/// One user's latest value for one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub value: VoteValue,
    pub created_at: Timestamp,
}

/// Where the session stands with respect to its current ticket.
///
/// Carrying the ticket id inside the voting variants makes "voting implies a
/// current ticket" unrepresentable otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "ticket_id", rename_all = "snake_case")]
pub enum TicketPhase {
    /// No ticket selected.
    #[default]
    Idle,
    /// Ticket selected, voting not started.
    Selected(TicketId),
    /// Votes are being collected.
    Voting(TicketId),
    /// Voting ended; votes are revealed and may still change.
    Reviewing(TicketId),
}

impl TicketPhase {
    pub fn ticket_id(&self) -> Option<TicketId> {
        match *self {
            Self::Idle => None,
            Self::Selected(id) | Self::Voting(id) | Self::Reviewing(id) => Some(id),
        }
    }
}

/// One planning poker room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub name: SessionName,
    pub owner_id: UserId,
    pub phase: TicketPhase,
    /// Ordered by `position`.
    pub tickets: Vec<Ticket>,
    /// Ordered by join time.
    pub participants: Vec<User>,
    pub created_at: Timestamp,
}

impl Session {
    pub fn current_ticket_id(&self) -> Option<TicketId> {
        self.phase.ticket_id()
    }

    pub fn current_ticket(&self) -> Option<&Ticket> {
        self.current_ticket_id().and_then(|id| self.ticket(id))
    }

    pub fn is_voting_active(&self) -> bool {
        matches!(self.phase, TicketPhase::Voting(_))
    }

    pub fn ticket(&self, ticket_id: TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == ticket_id)
    }

    pub fn participant(&self, user_id: &UserId) -> Option<&User> {
        self.participants.iter().find(|u| &u.id == user_id)
    }

    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.participant(user_id).is_some()
    }

    /// Reject `caller` unless they own the session. `action` completes the
    /// sentence "only the session owner can ...".
    pub fn ensure_owner(&self, caller: &UserId, action: &'static str) -> Result<(), SessionRuleError> {
        if &self.owner_id == caller {
            Ok(())
        } else {
            Err(SessionRuleError::NotOwner(action))
        }
    }

    pub fn ensure_participant(&self, user_id: &UserId) -> Result<(), SessionRuleError> {
        if self.is_participant(user_id) {
            Ok(())
        } else {
            Err(SessionRuleError::NotParticipant(user_id.clone()))
        }
    }

    /// Any phase → Selected(ticket).
    pub fn select_ticket(
        &mut self,
        caller: &UserId,
        ticket_id: TicketId,
    ) -> Result<Ticket, SessionRuleError> {
        self.ensure_owner(caller, "select tickets")?;
        let ticket = self
            .ticket(ticket_id)
            .cloned()
            .ok_or(SessionRuleError::TicketNotFound(ticket_id))?;
        self.phase = TicketPhase::Selected(ticket_id);
        Ok(ticket)
    }

    /// Selected/Reviewing → Voting. The caller clears the ticket's votes.
    pub fn start_voting(&mut self, caller: &UserId) -> Result<Ticket, SessionRuleError> {
        self.ensure_owner(caller, "start voting")?;
        let ticket_id = match self.phase {
            TicketPhase::Idle => return Err(SessionRuleError::NoCurrentTicket),
            TicketPhase::Voting(_) => return Err(SessionRuleError::VotingAlreadyActive),
            TicketPhase::Selected(id) | TicketPhase::Reviewing(id) => id,
        };
        let ticket = self
            .ticket(ticket_id)
            .cloned()
            .ok_or(SessionRuleError::NoCurrentTicket)?;
        self.phase = TicketPhase::Voting(ticket_id);
        Ok(ticket)
    }

    /// Voting → Reviewing.
    pub fn end_voting(&mut self, caller: &UserId) -> Result<Ticket, SessionRuleError> {
        self.ensure_owner(caller, "end voting")?;
        let ticket_id = match self.phase {
            TicketPhase::Idle => return Err(SessionRuleError::NoCurrentTicket),
            TicketPhase::Selected(_) | TicketPhase::Reviewing(_) => {
                return Err(SessionRuleError::VotingNotActive);
            }
            TicketPhase::Voting(id) => id,
        };
        let ticket = self
            .ticket(ticket_id)
            .cloned()
            .ok_or(SessionRuleError::NoCurrentTicket)?;
        self.phase = TicketPhase::Reviewing(ticket_id);
        Ok(ticket)
    }

    /// Move to the ticket after the current one, or the first ticket when
    /// idle. Past the last ticket the session becomes idle and `None` is
    /// returned.
    pub fn advance(&mut self, caller: &UserId) -> Result<Option<Ticket>, SessionRuleError> {
        self.ensure_owner(caller, "advance tickets")?;
        let next = match self.current_ticket_id() {
            None => self.tickets.first(),
            Some(current) => self
                .tickets
                .iter()
                .position(|t| t.id == current)
                .and_then(|index| self.tickets.get(index + 1)),
        }
        .cloned();
        self.phase = match &next {
            Some(ticket) => TicketPhase::Selected(ticket.id),
            None => TicketPhase::Idle,
        };
        Ok(next)
    }

    /// The ticket a vote from `voter` would land on. Votes are open while
    /// voting and during review.
    pub fn votable_ticket(&self, voter: &UserId) -> Result<TicketId, SessionRuleError> {
        self.ensure_participant(voter)?;
        match self.phase {
            TicketPhase::Idle => Err(SessionRuleError::NoCurrentTicket),
            TicketPhase::Selected(_) => Err(SessionRuleError::VotingNotOpen),
            TicketPhase::Voting(id) | TicketPhase::Reviewing(id) => Ok(id),
        }
    }

    /// Apply an edit to one ticket and return the edited snapshot.
    pub fn edit_ticket(
        &mut self,
        caller: &UserId,
        ticket_id: TicketId,
        edit: TicketEdit,
    ) -> Result<Ticket, SessionRuleError> {
        self.ensure_owner(caller, "update tickets")?;
        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or(SessionRuleError::TicketNotFound(ticket_id))?;
        if let Some(title) = edit.title {
            ticket.title = title;
        }
        if let Some(description) = edit.description {
            ticket.description = description;
        }
        if let Some(estimate) = edit.final_estimate {
            ticket.final_estimate = Some(estimate);
        }
        Ok(ticket.clone())
    }

    /// Remove a ticket, closing the gap in positions. Removing the current
    /// ticket returns the session to idle.
    pub fn remove_ticket(
        &mut self,
        caller: &UserId,
        ticket_id: TicketId,
    ) -> Result<Ticket, SessionRuleError> {
        self.ensure_owner(caller, "delete tickets")?;
        let index = self
            .tickets
            .iter()
            .position(|t| t.id == ticket_id)
            .ok_or(SessionRuleError::TicketNotFound(ticket_id))?;
        let removed = self.tickets.remove(index);
        for ticket in self.tickets.iter_mut().filter(|t| t.position > removed.position) {
            ticket.position -= 1;
        }
        if self.current_ticket_id() == Some(ticket_id) {
            self.phase = TicketPhase::Idle;
        }
        Ok(removed)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &UserId,
        new_owner: &UserId,
    ) -> Result<(), SessionRuleError> {
        self.ensure_owner(caller, "transfer ownership")?;
        if &self.owner_id == new_owner {
            return Err(SessionRuleError::AlreadyOwner(new_owner.clone()));
        }
        self.ensure_participant(new_owner)?;
        self.owner_id = new_owner.clone();
        Ok(())
    }
}

/// Fields to change on a ticket; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketEdit {
    pub title: Option<TicketTitle>,
    pub description: Option<String>,
    pub final_estimate: Option<u32>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(id: &str) -> User {
        User {
            id: UserId::new(id.to_string()).unwrap(),
            display_name: DisplayName::new(id.to_string()).unwrap(),
            created_at: Timestamp::new(0),
        }
    }

    pub fn ticket(session_id: &SessionId, id: u64, position: u32) -> Ticket {
        Ticket {
            id: TicketId::new(id),
            session_id: session_id.clone(),
            title: TicketTitle::new(format!("T{id}")).unwrap(),
            description: String::new(),
            final_estimate: None,
            position,
            created_at: Timestamp::new(0),
        }
    }

    /// Session "s1" owned by "owner" with participants owner, alice, bob and
    /// tickets T1, T2, T3.
    pub fn session() -> Session {
        let id = SessionId::new("s1".to_string()).unwrap();
        Session {
            tickets: vec![ticket(&id, 1, 1), ticket(&id, 2, 2), ticket(&id, 3, 3)],
            id,
            name: SessionName::new("Sprint 42".to_string()).unwrap(),
            owner_id: UserId::new("owner".to_string()).unwrap(),
            phase: TicketPhase::Idle,
            participants: vec![user("owner"), user("alice"), user("bob")],
            created_at: Timestamp::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::session;
    use super::*;

    fn uid(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_full_ticket_cycle() {
        // テスト項目: Idle → Selected → Voting → Reviewing → Selected(次) の遷移
        // given (前提条件):
        let mut session = session();
        let owner = uid("owner");

        // when (操作) / then (期待する結果):
        let selected = session.select_ticket(&owner, TicketId::new(1)).unwrap();
        assert_eq!(selected.id, TicketId::new(1));
        assert_eq!(session.phase, TicketPhase::Selected(TicketId::new(1)));

        session.start_voting(&owner).unwrap();
        assert!(session.is_voting_active());

        session.end_voting(&owner).unwrap();
        assert_eq!(session.phase, TicketPhase::Reviewing(TicketId::new(1)));

        let next = session.advance(&owner).unwrap();
        assert_eq!(next.map(|t| t.id), Some(TicketId::new(2)));
        assert_eq!(session.phase, TicketPhase::Selected(TicketId::new(2)));
        assert!(!session.is_voting_active());
    }

    #[test]
    fn test_non_owner_is_rejected_without_mutation() {
        // テスト項目: オーナー以外の操作は拒否され、状態は変化しない
        // given (前提条件):
        let mut session = session();
        session.phase = TicketPhase::Selected(TicketId::new(1));
        let before = session.clone();
        let alice = uid("alice");

        // when (操作):
        let results = [
            session.start_voting(&alice).err(),
            session.end_voting(&alice).err(),
            session.advance(&alice).err(),
            session.select_ticket(&alice, TicketId::new(2)).err(),
            session.remove_ticket(&alice, TicketId::new(2)).err(),
            session.transfer_ownership(&alice, &alice).err(),
        ];

        // then (期待する結果):
        for result in results {
            assert!(matches!(result, Some(SessionRuleError::NotOwner(_))));
        }
        assert_eq!(session, before);
    }

    #[test]
    fn test_start_voting_twice_is_rejected() {
        // テスト項目: 投票中に再度開始すると無効な遷移として拒否される
        // given (前提条件):
        let mut session = session();
        let owner = uid("owner");
        session.select_ticket(&owner, TicketId::new(1)).unwrap();
        session.start_voting(&owner).unwrap();

        // when (操作):
        let result = session.start_voting(&owner);

        // then (期待する結果):
        assert_eq!(result, Err(SessionRuleError::VotingAlreadyActive));
    }

    #[test]
    fn test_start_voting_requires_current_ticket() {
        // テスト項目: チケット未選択では投票を開始できない
        // given (前提条件):
        let mut session = session();

        // when (操作):
        let result = session.start_voting(&uid("owner"));

        // then (期待する結果):
        assert_eq!(result, Err(SessionRuleError::NoCurrentTicket));
        assert_eq!(session.phase, TicketPhase::Idle);
    }

    #[test]
    fn test_revote_from_review_reopens_voting() {
        // テスト項目: レビュー中から再投票を開始できる
        // given (前提条件):
        let mut session = session();
        let owner = uid("owner");
        session.phase = TicketPhase::Reviewing(TicketId::new(3));

        // when (操作):
        let ticket = session.start_voting(&owner).unwrap();

        // then (期待する結果):
        assert_eq!(ticket.id, TicketId::new(3));
        assert_eq!(session.phase, TicketPhase::Voting(TicketId::new(3)));
    }

    #[test]
    fn test_end_voting_outside_voting_is_rejected() {
        // テスト項目: 投票中でなければ終了できない
        // given (前提条件):
        let mut session = session();
        session.phase = TicketPhase::Selected(TicketId::new(1));

        // when (操作):
        let result = session.end_voting(&uid("owner"));

        // then (期待する結果):
        assert_eq!(result, Err(SessionRuleError::VotingNotActive));
    }

    #[test]
    fn test_votes_accepted_only_while_voting_or_reviewing() {
        // テスト項目: 投票は Voting / Reviewing のみ受け付ける
        // given (前提条件):
        let mut session = session();
        let alice = uid("alice");

        // when (操作) / then (期待する結果):
        assert_eq!(
            session.votable_ticket(&alice),
            Err(SessionRuleError::NoCurrentTicket)
        );
        session.phase = TicketPhase::Selected(TicketId::new(1));
        assert_eq!(
            session.votable_ticket(&alice),
            Err(SessionRuleError::VotingNotOpen)
        );
        session.phase = TicketPhase::Voting(TicketId::new(1));
        assert_eq!(session.votable_ticket(&alice), Ok(TicketId::new(1)));
        session.phase = TicketPhase::Reviewing(TicketId::new(1));
        assert_eq!(session.votable_ticket(&alice), Ok(TicketId::new(1)));
        assert_eq!(
            session.votable_ticket(&uid("mallory")),
            Err(SessionRuleError::NotParticipant(uid("mallory")))
        );
    }

    #[test]
    fn test_advance_from_idle_and_past_last_ticket() {
        // テスト項目: Idle からは先頭へ、最後のチケットの次は Idle に戻る
        // given (前提条件):
        let mut session = session();
        let owner = uid("owner");

        // when (操作):
        let first = session.advance(&owner).unwrap();
        session.phase = TicketPhase::Reviewing(TicketId::new(3));
        let past_last = session.advance(&owner).unwrap();

        // then (期待する結果):
        assert_eq!(first.map(|t| t.id), Some(TicketId::new(1)));
        assert_eq!(past_last, None);
        assert_eq!(session.phase, TicketPhase::Idle);
    }

    #[test]
    fn test_remove_current_ticket_resets_phase_and_positions() {
        // テスト項目: 現在のチケットを削除すると Idle になり、後続の position が詰められる
        // given (前提条件):
        let mut session = session();
        let owner = uid("owner");
        session.phase = TicketPhase::Voting(TicketId::new(2));

        // when (操作):
        let removed = session.remove_ticket(&owner, TicketId::new(2)).unwrap();

        // then (期待する結果):
        assert_eq!(removed.id, TicketId::new(2));
        assert_eq!(session.phase, TicketPhase::Idle);
        let positions: Vec<(u64, u32)> = session
            .tickets
            .iter()
            .map(|t| (t.id.value(), t.position))
            .collect();
        assert_eq!(positions, vec![(1, 1), (3, 2)]);
    }

    #[test]
    fn test_transfer_ownership_rules() {
        // テスト項目: 参加者にのみオーナー権限を移譲できる
        // given (前提条件):
        let mut session = session();
        let owner = uid("owner");

        // when (操作) / then (期待する結果):
        assert_eq!(
            session.transfer_ownership(&owner, &owner),
            Err(SessionRuleError::AlreadyOwner(owner.clone()))
        );
        assert_eq!(
            session.transfer_ownership(&owner, &uid("mallory")),
            Err(SessionRuleError::NotParticipant(uid("mallory")))
        );
        session.transfer_ownership(&owner, &uid("bob")).unwrap();
        assert_eq!(session.owner_id, uid("bob"));
    }

    #[test]
    fn test_edit_ticket_keeps_unset_fields() {
        // テスト項目: 指定しなかったフィールドは変更されない
        // given (前提条件):
        let mut session = session();
        let edit = TicketEdit {
            final_estimate: Some(8),
            ..TicketEdit::default()
        };

        // when (操作):
        let edited = session
            .edit_ticket(&uid("owner"), TicketId::new(1), edit)
            .unwrap();

        // then (期待する結果):
        assert_eq!(edited.title.as_str(), "T1");
        assert_eq!(edited.final_estimate, Some(8));
        assert_eq!(session.ticket(TicketId::new(1)), Some(&edited));
    }
}
