//! ブロードキャストハブ（EventBroadcaster 実装）
//!
//! ## 責務
//!
//! - イベントを一度だけシリアライズし、対象接続の送信キューに積む
//! - 遅い接続・切断済み接続を他の接続から隔離する
//! - ハブ全体のシャットダウン（全接続のキャンセル）
//!
//! ## 配送ポリシー
//!
//! 各接続へは `try_send` → `drop_timeout` まで待機 → 破棄、の順で配送する。
//! 全接続への配送は並行に行い、すべて積み終わってから呼び出し元へ戻る。
//! 同じ呼び出し元が A → B の順にブロードキャストすれば、各接続のキューにも
//! A → B の順で積まれる。切断済みの接続はここで遅延的に登録解除される。

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use super::{
    connection::{Connection, Delivery, Frame},
    registry::ConnectionRegistry,
};
use crate::{
    config::HubConfig,
    domain::{Event, EventBroadcaster, SessionId, UserId},
    infrastructure::dto::websocket::encode_event,
};

/// ブロードキャストハブ
///
/// 起動時に一つ生成し、`Arc` で UI 層とユースケース層に共有する。
pub struct BroadcastHub {
    registry: Arc<ConnectionRegistry>,
    config: HubConfig,
    shutdown: CancellationToken,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// 各接続のキャンセルトークンの親
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 全接続を閉じる。以降に開かれた接続も即座に閉じられる。
    pub fn shutdown(&self) {
        tracing::info!(
            "Shutting down broadcast hub ({} connections)",
            self.registry.total_count()
        );
        self.shutdown.cancel();
    }

    async fn deliver(&self, connections: Vec<Arc<Connection>>, event: &Event) {
        if connections.is_empty() {
            tracing::debug!("No connections for '{}' event, skipping", event.kind());
            return;
        }

        let frame: Frame = match encode_event(event) {
            Ok(frame) => Arc::from(frame),
            Err(e) => {
                tracing::warn!("Failed to encode '{}' event: {}", event.kind(), e);
                return;
            }
        };

        let wait = self.config.drop_timeout;
        let outcomes = join_all(
            connections
                .iter()
                .map(|connection| connection.deliver(Arc::clone(&frame), wait)),
        )
        .await;

        for (connection, outcome) in connections.iter().zip(outcomes) {
            match outcome {
                Delivery::Queued => {
                    tracing::debug!(
                        "Queued '{}' event for connection '{}'",
                        event.kind(),
                        connection.id
                    );
                }
                Delivery::Dropped => {
                    tracing::warn!(
                        "Dropped '{}' event for slow connection '{}' ({} dropped so far)",
                        event.kind(),
                        connection.id,
                        connection.drop_count()
                    );
                }
                Delivery::Closed => {
                    tracing::warn!(
                        "Connection '{}' is closed, unregistering",
                        connection.id
                    );
                    self.registry.unregister(&connection.id);
                }
            }
        }
    }
}

#[async_trait]
impl EventBroadcaster for BroadcastHub {
    async fn broadcast(&self, session_id: &SessionId, event: Event) {
        let connections = self.registry.connections_for_session(session_id);
        tracing::debug!(
            "Broadcasting '{}' to {} connection(s) in session '{}'",
            event.kind(),
            connections.len(),
            session_id
        );
        self.deliver(connections, &event).await;
    }

    async fn send_to_user(&self, session_id: &SessionId, user_id: &UserId, event: Event) {
        let connections = self.registry.connections_for_user(session_id, user_id);
        self.deliver(connections, &event).await;
    }
}
