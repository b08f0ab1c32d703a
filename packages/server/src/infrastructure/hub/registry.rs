//! 接続レジストリ
//!
//! ## 責務
//!
//! - セッション ID → 接続集合、接続 ID → セッション ID の対応を管理
//! - 同一ユーザーの複数接続（複数タブ）を許容する
//!
//! ## 設計ノート
//!
//! レジストリは `Weak<Connection>` のみを保持します。接続の所有者はライフサイクル
//! ハンドラであり、`Registration` が drop されると登録も解除されます。
//! 読み取り（ブロードキャスト）が大半なので `parking_lot::RwLock` を使い、
//! ロックを保持したまま `.await` することはありません。

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use parking_lot::RwLock;

use super::connection::Connection;
use crate::domain::{ConnectionId, SessionId, UserId};

#[derive(Default)]
struct Inner {
    by_session: HashMap<SessionId, HashMap<ConnectionId, Weak<Connection>>>,
    by_connection: HashMap<ConnectionId, SessionId>,
}

/// 接続レジストリ
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を登録し、スコープを抜けると登録解除するガードを返す
    pub fn register(self: &Arc<Self>, connection: &Arc<Connection>) -> Registration {
        let mut inner = self.inner.write();
        inner
            .by_session
            .entry(connection.session_id.clone())
            .or_default()
            .insert(connection.id.clone(), Arc::downgrade(connection));
        inner
            .by_connection
            .insert(connection.id.clone(), connection.session_id.clone());
        drop(inner);

        tracing::debug!(
            "Connection '{}' registered for session '{}' (user '{}')",
            connection.id,
            connection.session_id,
            connection.user_id
        );

        Registration {
            registry: Arc::clone(self),
            connection_id: connection.id.clone(),
        }
    }

    /// 接続を登録解除する
    ///
    /// 存在しない ID の解除は何もしない。実際に削除した場合のみ `true`。
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let mut inner = self.inner.write();
        let Some(session_id) = inner.by_connection.remove(connection_id) else {
            return false;
        };
        if let Some(connections) = inner.by_session.get_mut(&session_id) {
            connections.remove(connection_id);
            if connections.is_empty() {
                inner.by_session.remove(&session_id);
            }
        }
        drop(inner);

        tracing::debug!(
            "Connection '{}' unregistered from session '{}'",
            connection_id,
            session_id
        );
        true
    }

    /// セッションに登録された生存中の接続のスナップショット
    pub fn connections_for_session(&self, session_id: &SessionId) -> Vec<Arc<Connection>> {
        self.inner
            .read()
            .by_session
            .get(session_id)
            .map(|connections| connections.values().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// セッション内で `user_id` が保持する接続のスナップショット
    pub fn connections_for_user(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Vec<Arc<Connection>> {
        self.connections_for_session(session_id)
            .into_iter()
            .filter(|connection| &connection.user_id == user_id)
            .collect()
    }

    /// プレゼンス表示用の接続数
    pub fn count_for_session(&self, session_id: &SessionId) -> usize {
        self.inner
            .read()
            .by_session
            .get(session_id)
            .map(|connections| {
                connections
                    .values()
                    .filter(|weak| weak.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn total_count(&self) -> usize {
        self.inner.read().by_connection.len()
    }
}

/// 登録ガード
///
/// drop 時に接続を登録解除する。ライフサイクルのどの終了経路でも解除が走る。
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    connection_id: ConnectionId,
}

impl Registration {
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.connection_id);
    }
}
