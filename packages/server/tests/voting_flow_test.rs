//! Scenario tests against the library: use cases wired to a real hub, with
//! connections registered directly in the registry.

use std::{sync::Arc, time::Duration};

use planpoker_server::{
    config::HubConfig,
    domain::{
        DisplayName, SessionId, SessionName, SessionRepository, TicketTitle, UserId, VoteValue,
    },
    infrastructure::{
        hub::{BroadcastHub, Connection, Registration, connection::Frame},
        repository::InMemorySessionRepository,
    },
    ui::AppState,
};
use serde_json::Value;
use tokio::sync::mpsc::Receiver;

struct Scenario {
    state: Arc<AppState>,
    owner: UserId,
    voters: Vec<UserId>,
    session_id: SessionId,
}

impl Scenario {
    /// 所有者と `voters` 人の参加者がいて、チケットが選択済みのセッション
    async fn new(voters: usize, config: HubConfig) -> Self {
        let repository: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
        let hub = Arc::new(BroadcastHub::new(config));
        let state = Arc::new(AppState::new(repository, hub));

        let owner = state
            .register_user
            .execute(DisplayName::new("Owner".to_string()).unwrap())
            .await
            .unwrap()
            .id;
        let session = state
            .create_session
            .execute(&owner, SessionName::new("Planning".to_string()).unwrap())
            .await
            .unwrap();

        let mut ids = Vec::new();
        for i in 0..voters {
            let user = state
                .register_user
                .execute(DisplayName::new(format!("Voter {}", i)).unwrap())
                .await
                .unwrap();
            state
                .join_session
                .execute(&session.id, &user.id)
                .await
                .unwrap();
            ids.push(user.id);
        }

        let ticket = state
            .create_ticket
            .execute(
                &session.id,
                &owner,
                TicketTitle::new("Checkout flow".to_string()).unwrap(),
                String::new(),
            )
            .await
            .unwrap();
        state
            .select_ticket
            .execute(&session.id, &owner, ticket.id)
            .await
            .unwrap();

        Self {
            state,
            owner,
            voters: ids,
            session_id: session.id,
        }
    }

    fn hub(&self) -> &Arc<BroadcastHub> {
        &self.state.hub
    }

    /// Register a connection for `user_id` without a transport
    ///
    /// The registry only holds a weak reference; the caller keeps the
    /// connection alive for as long as it should receive events.
    fn open(
        &self,
        user_id: &UserId,
        capacity: usize,
    ) -> (Arc<Connection>, Registration, Receiver<Frame>) {
        let (connection, rx) = Connection::new(self.session_id.clone(), user_id.clone(), capacity);
        let connection = Arc::new(connection);
        let registration = self.hub().registry().register(&connection);
        (connection, registration, rx)
    }
}

fn kinds(rx: &mut Receiver<Frame>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str::<Value>(&frame).unwrap());
    }
    frames
}

fn fast_drop_config() -> HubConfig {
    HubConfig {
        drop_timeout: Duration::from_millis(10),
        ..HubConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_arrive_in_the_same_order_everywhere() {
    // ===== 【何をテストするか】
    // 複数の参加者が同時に投票しても、全接続が同じ順序でイベントを受け取る
    // =====
    // テスト項目: 同時投票のイベント順序が全接続で一致する
    // given (前提条件):
    let scenario = Arc::new(Scenario::new(8, HubConfig::default()).await);
    let (_owner_conn, _owner_reg, mut owner_rx) = scenario.open(&scenario.owner, 256);
    let (_voter_conn, _voter_reg, mut voter_rx) = scenario.open(&scenario.voters[0], 256);
    scenario
        .state
        .start_voting
        .execute(&scenario.session_id, &scenario.owner)
        .await
        .unwrap();

    // when (操作):
    let mut handles = Vec::new();
    for (i, voter) in scenario.voters.iter().cloned().enumerate() {
        let scenario = scenario.clone();
        handles.push(tokio::spawn(async move {
            let value = VoteValue::new(["1", "2", "3", "5"][i % 4].to_string()).unwrap();
            scenario
                .state
                .submit_vote
                .execute(&scenario.session_id, &voter, value)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // then (期待する結果):
    let owner_frames = kinds(&mut owner_rx);
    let voter_frames = kinds(&mut voter_rx);
    assert_eq!(owner_frames.len(), 1 + 8);
    assert_eq!(owner_frames[0]["type"], "voting-started");
    let order = |frames: &[Value]| -> Vec<Value> {
        frames.iter().map(|f| f["data"]["user_id"].clone()).collect()
    };
    assert_eq!(order(&owner_frames), order(&voter_frames));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_votes_racing_end_voting_are_consistent_with_result() {
    // テスト項目: 投票終了と競合しても、結果に含まれる投票は終了前に送出された vote-cast と一致する
    // given (前提条件):
    let scenario = Arc::new(Scenario::new(6, HubConfig::default()).await);
    let (_conn, _reg, mut rx) = scenario.open(&scenario.owner, 256);
    scenario
        .state
        .start_voting
        .execute(&scenario.session_id, &scenario.owner)
        .await
        .unwrap();

    // when (操作):
    let mut handles = Vec::new();
    for voter in scenario.voters.iter().cloned() {
        let scenario = scenario.clone();
        handles.push(tokio::spawn(async move {
            let value = VoteValue::new("8".to_string()).unwrap();
            scenario
                .state
                .submit_vote
                .execute(&scenario.session_id, &voter, value)
                .await
                .is_ok()
        }));
    }
    let (_, votes) = scenario
        .state
        .end_voting
        .execute(&scenario.session_id, &scenario.owner)
        .await
        .unwrap();
    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            accepted += 1;
        }
    }

    // then (期待する結果):
    // 終了後の投票はレビュー中の変更として受理されるので、結果に含まれるのは
    // voting-ended より前に送出された vote-cast と一致する
    let frames = kinds(&mut rx);
    let ended_at = frames
        .iter()
        .position(|f| f["type"] == "voting-ended")
        .unwrap();
    let is_cast = |f: &&Value| f["type"] == "vote-cast";
    let cast_before_end = frames[..ended_at].iter().filter(is_cast).count();
    assert_eq!(votes.len(), cast_before_end);
    assert_eq!(
        frames[ended_at]["data"]["votes"].as_array().unwrap().len(),
        cast_before_end
    );
    assert_eq!(frames.iter().filter(is_cast).count(), accepted);
    assert_eq!(accepted, 6);
}

#[tokio::test]
async fn test_stalled_connection_does_not_hold_back_others() {
    // ===== 【何をテストするか】
    // 受信しない接続のキューが満杯でも、他の接続への配送は止まらない
    // =====
    // テスト項目: 停止した接続はイベントを取りこぼし、健全な接続は全件受け取る
    // given (前提条件):
    let scenario = Scenario::new(1, fast_drop_config()).await;
    let voter = scenario.voters[0].clone();
    let (stalled, _stalled_reg, _stalled_rx) = scenario.open(&voter, 1);
    let (_healthy_conn, _healthy_reg, mut healthy_rx) = scenario.open(&scenario.owner, 256);

    // when (操作):
    let started = tokio::time::Instant::now();
    for round in 0..5 {
        scenario
            .state
            .start_voting
            .execute(&scenario.session_id, &scenario.owner)
            .await
            .unwrap();
        scenario
            .state
            .end_voting
            .execute(&scenario.session_id, &scenario.owner)
            .await
            .unwrap_or_else(|e| panic!("round {}: {}", round, e));
    }

    // then (期待する結果):
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(kinds(&mut healthy_rx).len(), 10);
    assert_eq!(stalled.drop_count(), 9);
    assert_eq!(scenario.hub().registry().count_for_session(&scenario.session_id), 2);
}

#[tokio::test]
async fn test_closed_connection_is_removed_on_next_broadcast() {
    // テスト項目: 受信側が閉じた接続は次の配送時に登録解除され、二重解除も安全
    // given (前提条件):
    let scenario = Scenario::new(1, HubConfig::default()).await;
    let (_conn, registration, rx) = scenario.open(&scenario.voters[0], 8);
    let (_owner_conn, _owner_reg, _owner_rx) = scenario.open(&scenario.owner, 8);
    drop(rx);

    // when (操作):
    scenario
        .state
        .start_voting
        .execute(&scenario.session_id, &scenario.owner)
        .await
        .unwrap();

    // then (期待する結果):
    let registry = scenario.hub().registry();
    assert_eq!(registry.count_for_session(&scenario.session_id), 1);
    assert!(!registry.unregister(registration.connection_id()));
    drop(registration);
    assert_eq!(registry.total_count(), 1);
}
