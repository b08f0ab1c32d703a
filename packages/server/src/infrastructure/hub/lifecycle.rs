//! 接続ライフサイクル
//!
//! ## 責務
//!
//! - 接続の生成と登録、`connected` 応答の送信
//! - 送信ループ: 送信キューの排出とハートビート（Ping）送信
//! - 受信ループ: 生存確認のみ（アプリケーションメッセージは想定しない）
//! - どちらのループが終了しても、もう一方を止めて登録解除する
//!
//! トランスポートは `Sink<Message>` / `Stream<Item = Result<Message, E>>` として
//! 受け取るので、テストではインメモリのチャネルを使える。

use std::{fmt::Display, sync::Arc, time::Duration};

use axum::{body::Bytes, extract::ws::Message};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    broadcast::BroadcastHub,
    connection::{Connection, Frame},
};
use crate::{
    domain::{Event, SessionEvent, SessionId, UserId},
    infrastructure::dto::websocket::encode_event,
};

/// 接続が終了した理由
///
/// 一方のループが終わった時点の理由。もう一方のループはその時点で中断される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// クライアントが Close を送った、またはストリームが終わった
    ClientClosed,
    ReadError,
    WriteError,
    /// ハートビート期間中に何も受信しなかった
    HeartbeatTimeout,
    /// ハブのシャットダウン
    Shutdown,
}

impl BroadcastHub {
    /// 接続を登録し、終了するまで送受信ループを実行する
    ///
    /// 戻った時点で接続は登録解除済み。この future を途中で drop しても
    /// 両ループは中断され、登録も解除される。
    pub async fn serve<W, R, E>(
        &self,
        session_id: SessionId,
        user_id: UserId,
        sink: W,
        stream: R,
    ) -> ExitReason
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let config = self.config().clone();
        let (connection, queue) = Connection::new(session_id, user_id, config.queue_capacity);
        let connection = Arc::new(connection);

        // 登録前に積むので、応答は必ず最初のフレームになる
        let ack = Event::now(SessionEvent::Connected {
            connection_id: connection.id.clone(),
        });
        match encode_event(&ack) {
            Ok(frame) => {
                connection.deliver(Arc::from(frame), Duration::ZERO).await;
            }
            Err(e) => tracing::warn!("Failed to encode connected event: {}", e),
        }

        let registration = self.registry().register(&connection);
        tracing::info!(
            "Connection '{}' opened: session '{}', user '{}'",
            connection.id,
            connection.session_id,
            connection.user_id
        );

        let mut send_task = AbortOnDrop(tokio::spawn(send_loop(
            sink,
            queue,
            Arc::clone(&connection),
            self.shutdown_token().child_token(),
            config.heartbeat_period(),
            config.max_missed_heartbeats(),
        )));
        let mut recv_task = AbortOnDrop(tokio::spawn(recv_loop(stream, Arc::clone(&connection))));

        let reason = tokio::select! {
            result = &mut send_task.0 => result.unwrap_or(ExitReason::WriteError),
            result = &mut recv_task.0 => result.unwrap_or(ExitReason::ReadError),
        };

        drop(send_task);
        drop(recv_task);
        drop(registration);
        tracing::info!(
            "Connection '{}' closed ({:?}), {} event(s) dropped",
            connection.id,
            reason,
            connection.drop_count()
        );
        reason
    }
}

/// Aborts the loop task when the owning `serve` call ends or is dropped.
struct AbortOnDrop(JoinHandle<ExitReason>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn send_loop<W>(
    mut sink: W,
    mut queue: mpsc::Receiver<Frame>,
    connection: Arc<Connection>,
    cancel: CancellationToken,
    heartbeat_interval: Duration,
    max_missed: u32,
) -> ExitReason
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut heartbeat =
        tokio::time::interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut missed = 0u32;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                // 積まれている分を送り切ってから閉じる
                while let Ok(frame) = queue.try_recv() {
                    if sink.send(Message::Text(frame.to_string().into())).await.is_err() {
                        return ExitReason::WriteError;
                    }
                }
                let _ = sink.send(Message::Close(None)).await;
                return ExitReason::Shutdown;
            }
            frame = queue.recv() => {
                let Some(frame) = frame else {
                    return ExitReason::Shutdown;
                };
                if let Err(e) = sink.send(Message::Text(frame.to_string().into())).await {
                    tracing::warn!("Write to connection '{}' failed: {}", connection.id, e);
                    return ExitReason::WriteError;
                }
            }
            _ = heartbeat.tick() => {
                if connection.check_alive() {
                    missed = 0;
                } else {
                    missed += 1;
                    if missed >= max_missed {
                        tracing::warn!(
                            "Connection '{}' missed {} heartbeat(s), closing",
                            connection.id,
                            missed
                        );
                        let _ = sink.send(Message::Close(None)).await;
                        return ExitReason::HeartbeatTimeout;
                    }
                }
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    tracing::warn!("Ping to connection '{}' failed: {}", connection.id, e);
                    return ExitReason::WriteError;
                }
            }
        }
    }
}

async fn recv_loop<R, E>(mut stream: R, connection: Arc<Connection>) -> ExitReason
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        match stream.next().await {
            None | Some(Ok(Message::Close(_))) => return ExitReason::ClientClosed,
            Some(Err(e)) => {
                tracing::debug!("Read from connection '{}' failed: {}", connection.id, e);
                return ExitReason::ReadError;
            }
            Some(Ok(message)) => {
                connection.mark_alive();
                if let Message::Text(text) = message {
                    tracing::debug!(
                        "Ignoring {} byte(s) of inbound text on connection '{}'",
                        text.len(),
                        connection.id
                    );
                }
            }
        }
    }
}
