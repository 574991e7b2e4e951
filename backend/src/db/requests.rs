use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::db::RequestStore;
use crate::error::Error;
use crate::models::{ChatRequest, RequestStatus};

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PostgresRequestStore {
    pool: PgPool,
}

impl PostgresRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_request(row: &PgRow) -> Result<ChatRequest, Error> {
    let status: String = row.try_get("status")?;
    Ok(ChatRequest {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        student_name: row.try_get("student_name")?,
        student_avatar: row.try_get("student_avatar")?,
        mentor_id: row.try_get("mentor_id")?,
        mentor_name: row.try_get("mentor_name")?,
        message: row.try_get("message")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl RequestStore for PostgresRequestStore {
    async fn insert_pending(&self, request: &ChatRequest) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_requests (
                id,
                student_id,
                student_name,
                student_avatar,
                mentor_id,
                mentor_name,
                message,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id)
        .bind(&request.student_id)
        .bind(&request.student_name)
        .bind(&request.student_avatar)
        .bind(&request.mentor_id)
        .bind(&request.mentor_name)
        .bind(&request.message)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The partial unique index on (student_id, mentor_id) WHERE
            // status = 'pending' is the duplicate-request signal.
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(Error::DuplicateRequest {
                    student_id: request.student_id.clone(),
                    mentor_id: request.mentor_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChatRequest>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, student_name, student_avatar,
                   mentor_id, mentor_name, message, status,
                   created_at, updated_at
            FROM chat_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_request(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_pending_for_mentor(&self, mentor_id: &str) -> Result<Vec<ChatRequest>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, student_name, student_avatar,
                   mentor_id, mentor_name, message, status,
                   created_at, updated_at
            FROM chat_requests
            WHERE mentor_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(mentor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_request).collect()
    }

    async fn mark_resolved(
        &self,
        id: Uuid,
        status: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        // The status guard makes the transition single-shot: of two
        // concurrent resolvers, only one sees a row to update.
        let result = sqlx::query(
            r#"
            UPDATE chat_requests
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
