//! Webhook listener.
//!
//! The agent posts `POST /topic/{topic}/` notifications here. The
//! listener hands them to the dispatcher and answers 200 no matter
//! what happened inside, so the agent never re-queues a delivery
//! because of a controller-side problem.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde_json::Value;

use trellis_exchange::EventDispatcher;

async fn handle_topic(
    State(dispatcher): State<Arc<EventDispatcher>>,
    Path(topic): Path<String>,
    body: Bytes,
) -> StatusCode {
    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => dispatcher.dispatch(&topic, payload).await,
        Err(err) => {
            tracing::warn!(topic = %topic, error = %err, "webhook body was not JSON");
        }
    }
    StatusCode::OK
}

pub fn build_router(dispatcher: Arc<EventDispatcher>) -> Router {
    Router::new()
        .route("/topic/{topic}", post(handle_topic))
        .route("/topic/{topic}/", post(handle_topic))
        .with_state(dispatcher)
}

/// Serve webhooks on an already-bound listener until the process ends.
pub async fn serve(
    listener: tokio::net::TcpListener,
    dispatcher: Arc<EventDispatcher>,
) -> anyhow::Result<()> {
    let app = build_router(dispatcher);
    axum::serve(listener, app).await?;
    Ok(())
}
