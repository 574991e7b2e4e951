//! Server-sent-event endpoints for the live read views. Each event carries
//! the fresh full set; dropping the HTTP connection drops the subscription,
//! which releases the watcher.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
};
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};

use crate::handlers::{error_response, ApiError};
use crate::models::Role;
use crate::services::mentorship::MentorshipService;

pub async fn watch_pending_requests(
    State(service): State<Arc<MentorshipService>>,
    Path(mentor_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = service.subscribe_pending_requests(&mentor_id).await;
    let stream =
        subscription.map(|set| Event::default().event("requests").json_data(&set));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn watch_connections(
    State(service): State<Arc<MentorshipService>>,
    Path((role, user_id)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, (StatusCode, Json<ApiError>)> {
    let role: Role = role.parse().map_err(error_response)?;
    let subscription = service.subscribe_connections(role, &user_id).await;
    let stream =
        subscription.map(|set| Event::default().event("connections").json_data(&set));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
