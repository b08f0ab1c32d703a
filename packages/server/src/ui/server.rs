//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, patch, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_session, create_ticket, delete_ticket, end_session, end_voting, get_session,
        health_check, join_session, leave_session, next_ticket, register_user, select_ticket,
        start_review, start_voting, submit_vote, transfer_owner, update_ticket, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the HTTP and WebSocket router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/users", post(register_user))
        .route("/session", post(create_session))
        .route("/session/{session_id}", get(get_session).delete(end_session))
        .route("/session/{session_id}/join", post(join_session))
        .route("/session/{session_id}/leave", post(leave_session))
        .route("/session/{session_id}/tickets", post(create_ticket))
        .route(
            "/session/{session_id}/tickets/{ticket_id}",
            patch(update_ticket).delete(delete_ticket),
        )
        .route(
            "/session/{session_id}/select-ticket/{ticket_id}",
            post(select_ticket),
        )
        .route("/session/{session_id}/start-voting", post(start_voting))
        .route("/session/{session_id}/end-voting", post(end_voting))
        .route("/session/{session_id}/next-ticket", post(next_ticket))
        .route("/session/{session_id}/vote", post(submit_vote))
        .route("/session/{session_id}/transfer-owner", post(transfer_owner))
        .route("/session/{session_id}/review", post(start_review))
        // WebSocket エンドポイント
        .route("/session/{session_id}/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Planning poker server
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::new(repository, hub));
/// Server::new(state).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Bind to `host:port` and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Planning poker server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// Open WebSocket connections are closed through the hub before the HTTP
    /// server drains.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        signal: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let hub = self.state.hub.clone();
        let app = router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                hub.shutdown();
            })
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
