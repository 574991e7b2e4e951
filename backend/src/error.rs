use thiserror::Error;
use uuid::Uuid;

use crate::models::RequestStatus;

#[derive(Debug, Error)]
pub enum Error {
    #[error("a pending request from student {student_id} to mentor {mentor_id} already exists")]
    DuplicateRequest {
        student_id: String,
        mentor_id: String,
    },

    #[error("chat request {0} not found")]
    RequestNotFound(Uuid),

    #[error("chat request {id} was already resolved to {status}")]
    AlreadyResolved { id: Uuid, status: RequestStatus },

    #[error("request message must not be empty")]
    EmptyMessage,

    #[error("request message exceeds {0} characters")]
    MessageTooLong(usize),

    #[error("student and mentor ids must both be provided")]
    MissingParticipant,

    #[error("channel provisioning failed: {0}")]
    ChannelProvisioning(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("invalid status value in store: {0}")]
    InvalidStatus(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// True for failures the caller may simply retry (backend/network trouble),
    /// as opposed to protocol errors that will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Database(_) | Error::ChannelProvisioning(_))
    }
}
