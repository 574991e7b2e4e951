pub mod connection;
pub mod migrations;
pub mod requests;
pub mod connections;
pub mod memory;

pub use connection::{get_db_pool, DatabaseConfig};
pub use connections::PostgresConnectionStore;
pub use memory::MemoryStore;
pub use requests::PostgresRequestStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{ChatRequest, MentorshipConnection, RequestStatus};

/// Durable store of chat requests. Implementations must enforce the
/// at-most-one-pending invariant per (student, mentor) pair atomically,
/// not with a separate read-then-write round trip.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a new pending request. Fails with [`Error::DuplicateRequest`]
    /// if a pending request for the same pair already exists; nothing is
    /// written in that case.
    async fn insert_pending(&self, request: &ChatRequest) -> Result<(), Error>;

    async fn get(&self, id: Uuid) -> Result<Option<ChatRequest>, Error>;

    /// Pending requests addressed to a mentor, newest first.
    async fn list_pending_for_mentor(&self, mentor_id: &str) -> Result<Vec<ChatRequest>, Error>;

    /// Flip a request out of pending. Returns true iff the request existed,
    /// was still pending, and transitioned; a lost race returns false and
    /// changes nothing.
    async fn mark_resolved(
        &self,
        id: Uuid,
        status: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, Error>;
}

/// Durable store of mentorship connections, unique per (student, mentor) pair.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Insert the connection unless one already exists for the pair, and
    /// return the stored row either way. Retried accepts converge on the
    /// original row.
    async fn insert_if_absent(
        &self,
        connection: &MentorshipConnection,
    ) -> Result<MentorshipConnection, Error>;

    async fn list_active_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<MentorshipConnection>, Error>;

    async fn list_active_for_mentor(
        &self,
        mentor_id: &str,
    ) -> Result<Vec<MentorshipConnection>, Error>;
}
