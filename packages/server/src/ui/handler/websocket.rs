//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::{
    domain::{SessionId, SessionRuleError, UserId},
    ui::{error::ApiError, state::AppState},
    usecase::SessionCommandError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
}

/// Upgrade to a WebSocket for a participant of the session.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Convert String -> UserId (Domain Model)
    let user_id = match UserId::try_from(query.user_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Rejected WebSocket upgrade: {}", e);
            return Err(ApiError::Unauthorized);
        }
    };

    let snapshot = state.get_session.execute(&session_id).await?;
    if !snapshot.session.is_participant(&user_id) {
        tracing::warn!(
            "Rejected WebSocket upgrade: '{}' is not a participant of session '{}'",
            user_id,
            session_id
        );
        return Err(SessionCommandError::Rejected(SessionRuleError::NotParticipant(user_id)).into());
    }

    let max_message_size = state.hub.config().max_inbound_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, session_id, user_id)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    session_id: SessionId,
    user_id: UserId,
) {
    let (sender, receiver) = socket.split();
    state
        .hub
        .serve(session_id, user_id, sender, receiver)
        .await;
}
