pub mod requests;
pub mod subscriptions;

pub use requests::{resolve_request, submit_request};
pub use subscriptions::{watch_connections, watch_pending_requests};

use axum::{http::StatusCode, response::Json};
use serde::Serialize;

use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

/// Maps a protocol error to an HTTP response. Duplicate/not-found carry
/// actionable messages; backend failures are presented as "try again" and
/// never leak raw error text to the client.
pub fn error_response(err: Error) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match &err {
        Error::DuplicateRequest { .. } => (
            StatusCode::CONFLICT,
            "You already have a pending request with this mentor.".to_string(),
        ),
        Error::RequestNotFound(_) => (
            StatusCode::NOT_FOUND,
            "This request no longer exists.".to_string(),
        ),
        Error::AlreadyResolved { .. } => (
            StatusCode::CONFLICT,
            "This request has already been resolved.".to_string(),
        ),
        Error::EmptyMessage => (
            StatusCode::BAD_REQUEST,
            "Please include a message with your request.".to_string(),
        ),
        Error::MessageTooLong(limit) => (
            StatusCode::BAD_REQUEST,
            format!("Your message is too long (maximum {limit} characters)."),
        ),
        Error::MissingParticipant => (
            StatusCode::BAD_REQUEST,
            "Both a student and a mentor must be specified.".to_string(),
        ),
        Error::UnknownRole(role) => (
            StatusCode::BAD_REQUEST,
            format!("Unknown role '{role}'; expected 'student' or 'mentor'."),
        ),
        Error::ChannelProvisioning(_) => {
            tracing::error!("channel provisioning failed: {}", err);
            (
                StatusCode::BAD_GATEWAY,
                "The chat service is temporarily unavailable. Please try again.".to_string(),
            )
        }
        Error::Database(_) => {
            tracing::error!("backend failure: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "The service is temporarily unavailable. Please try again.".to_string(),
            )
        }
        Error::InvalidStatus(_) => {
            tracing::error!("backend failure: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again.".to_string(),
            )
        }
    };

    (status, Json(ApiError { error: message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::models::RequestStatus;

    #[test]
    fn error_mapping_status_codes() {
        let dup = Error::DuplicateRequest {
            student_id: "s1".to_string(),
            mentor_id: "m1".to_string(),
        };
        assert_eq!(error_response(dup).0, StatusCode::CONFLICT);

        let not_found = Error::RequestNotFound(Uuid::new_v4());
        assert_eq!(error_response(not_found).0, StatusCode::NOT_FOUND);

        let resolved = Error::AlreadyResolved {
            id: Uuid::new_v4(),
            status: RequestStatus::Accepted,
        };
        assert_eq!(error_response(resolved).0, StatusCode::CONFLICT);

        assert_eq!(
            error_response(Error::EmptyMessage).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(Error::ChannelProvisioning("down".to_string())).0,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn backend_errors_do_not_leak_details() {
        let err = Error::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());

        // Transient backend trouble is a retryable 503; corrupt store data
        // is a plain 500. Neither exposes internals.
        let (status, body) = error_response(err);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.error.to_lowercase().contains("pool"));

        let (status, _) = error_response(Error::InvalidStatus("archived".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let dup = Error::DuplicateRequest {
            student_id: "s1".to_string(),
            mentor_id: "m1".to_string(),
        };
        assert!(!dup.is_transient());
    }
}
