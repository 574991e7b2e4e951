//! In-memory store backend used by tests and local development.
//!
//! Both store traits are implemented over one shared state so a single
//! `MemoryStore` can be handed to the service as requests and connections
//! store alike. The duplicate-pending check and the insert happen under one
//! lock, which is what makes the at-most-one-pending invariant hold even for
//! concurrent submissions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{ConnectionStore, RequestStore};
use crate::error::Error;
use crate::models::{ChatRequest, ConnectionStatus, MentorshipConnection, RequestStatus};

#[derive(Default)]
struct Inner {
    requests: Vec<ChatRequest>,
    connections: Vec<MentorshipConnection>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert_pending(&self, request: &ChatRequest) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        let duplicate = inner.requests.iter().any(|r| {
            r.student_id == request.student_id
                && r.mentor_id == request.mentor_id
                && r.status == RequestStatus::Pending
        });
        if duplicate {
            return Err(Error::DuplicateRequest {
                student_id: request.student_id.clone(),
                mentor_id: request.mentor_id.clone(),
            });
        }
        inner.requests.push(request.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChatRequest>, Error> {
        let inner = self.inner.lock().await;
        Ok(inner.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_pending_for_mentor(&self, mentor_id: &str) -> Result<Vec<ChatRequest>, Error> {
        let inner = self.inner.lock().await;
        let mut pending: Vec<ChatRequest> = inner
            .requests
            .iter()
            .filter(|r| r.mentor_id == mentor_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn mark_resolved(
        &self,
        id: Uuid,
        status: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let mut inner = self.inner.lock().await;
        match inner
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Pending)
        {
            Some(request) => {
                request.status = status;
                request.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn insert_if_absent(
        &self,
        connection: &MentorshipConnection,
    ) -> Result<MentorshipConnection, Error> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.connections.iter().find(|c| {
            c.student_id == connection.student_id && c.mentor_id == connection.mentor_id
        }) {
            return Ok(existing.clone());
        }
        inner.connections.push(connection.clone());
        Ok(connection.clone())
    }

    async fn list_active_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<MentorshipConnection>, Error> {
        let inner = self.inner.lock().await;
        Ok(inner
            .connections
            .iter()
            .filter(|c| c.student_id == student_id && c.status == ConnectionStatus::Active)
            .cloned()
            .collect())
    }

    async fn list_active_for_mentor(
        &self,
        mentor_id: &str,
    ) -> Result<Vec<MentorshipConnection>, Error> {
        let inner = self.inner.lock().await;
        Ok(inner
            .connections
            .iter()
            .filter(|c| c.mentor_id == mentor_id && c.status == ConnectionStatus::Active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(student: &str, mentor: &str) -> ChatRequest {
        let now = Utc::now();
        ChatRequest {
            id: Uuid::new_v4(),
            student_id: student.to_string(),
            student_name: format!("Student {}", student),
            student_avatar: None,
            mentor_id: mentor.to_string(),
            mentor_name: format!("Mentor {}", mentor),
            message: "Hi, can you help with calculus?".to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_pending_insert_is_rejected() {
        let store = MemoryStore::new();
        store.insert_pending(&request("s1", "m1")).await.unwrap();

        let err = store.insert_pending(&request("s1", "m1")).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateRequest { .. }));

        // A different pair is unaffected
        store.insert_pending(&request("s1", "m2")).await.unwrap();
    }

    #[tokio::test]
    async fn resolved_request_allows_a_new_pending_one() {
        let store = MemoryStore::new();
        let first = request("s1", "m1");
        store.insert_pending(&first).await.unwrap();

        let flipped = store
            .mark_resolved(first.id, RequestStatus::Declined, Utc::now())
            .await
            .unwrap();
        assert!(flipped);

        // Declined request no longer blocks the pair
        store.insert_pending(&request("s1", "m1")).await.unwrap();
    }

    #[tokio::test]
    async fn mark_resolved_is_single_shot() {
        let store = MemoryStore::new();
        let req = request("s1", "m1");
        store.insert_pending(&req).await.unwrap();

        assert!(store
            .mark_resolved(req.id, RequestStatus::Accepted, Utc::now())
            .await
            .unwrap());
        assert!(!store
            .mark_resolved(req.id, RequestStatus::Declined, Utc::now())
            .await
            .unwrap());

        let stored = store.get(req.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn insert_if_absent_returns_existing_row() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let conn = MentorshipConnection {
            id: Uuid::new_v4(),
            student_id: "s1".to_string(),
            mentor_id: "m1".to_string(),
            status: ConnectionStatus::Active,
            chat_channel_id: "mentor-m1-student-s1".to_string(),
            created_at: now,
            updated_at: now,
        };
        let stored = store.insert_if_absent(&conn).await.unwrap();
        assert_eq!(stored.id, conn.id);

        let retry = MentorshipConnection {
            id: Uuid::new_v4(),
            ..conn.clone()
        };
        let stored_again = store.insert_if_absent(&retry).await.unwrap();
        assert_eq!(stored_again.id, conn.id);

        assert_eq!(store.list_active_for_student("s1").await.unwrap().len(), 1);
        assert_eq!(store.list_active_for_mentor("m1").await.unwrap().len(), 1);
    }
}
