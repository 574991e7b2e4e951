use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::{error_response, ApiError};
use crate::models::{Decision, NewChatRequest, RequestStatus};
use crate::services::mentorship::MentorshipService;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub request_id: Uuid,
}

pub async fn submit_request(
    State(service): State<Arc<MentorshipService>>,
    Json(body): Json<NewChatRequest>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ApiError>)> {
    let request = service.submit_request(body).await.map_err(error_response)?;
    Ok(Json(SubmitResponse {
        request_id: request.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    pub decision: Decision,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub status: RequestStatus,
    pub chat_channel_id: Option<String>,
}

pub async fn resolve_request(
    State(service): State<Arc<MentorshipService>>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<ResolveResponse>, (StatusCode, Json<ApiError>)> {
    let chat_channel_id = service
        .resolve_request(request_id, body.decision)
        .await
        .map_err(error_response)?;

    let status = match body.decision {
        Decision::Accept => RequestStatus::Accepted,
        Decision::Decline => RequestStatus::Declined,
    };
    Ok(Json(ResolveResponse {
        status,
        chat_channel_id,
    }))
}
