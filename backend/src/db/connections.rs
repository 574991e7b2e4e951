use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::db::ConnectionStore;
use crate::error::Error;
use crate::models::MentorshipConnection;

#[derive(Clone)]
pub struct PostgresConnectionStore {
    pool: PgPool,
}

impl PostgresConnectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_connection(row: &PgRow) -> Result<MentorshipConnection, Error> {
    let status: String = row.try_get("status")?;
    Ok(MentorshipConnection {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        mentor_id: row.try_get("mentor_id")?,
        status: status.parse()?,
        chat_channel_id: row.try_get("chat_channel_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ConnectionStore for PostgresConnectionStore {
    async fn insert_if_absent(
        &self,
        connection: &MentorshipConnection,
    ) -> Result<MentorshipConnection, Error> {
        sqlx::query(
            r#"
            INSERT INTO mentorship_connections (
                id, student_id, mentor_id, status, chat_channel_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (student_id, mentor_id) DO NOTHING
            "#,
        )
        .bind(connection.id)
        .bind(&connection.student_id)
        .bind(&connection.mentor_id)
        .bind(connection.status.as_str())
        .bind(&connection.chat_channel_id)
        .bind(connection.created_at)
        .bind(connection.updated_at)
        .execute(&self.pool)
        .await?;

        // Either our insert or the pre-existing row for the pair.
        let row = sqlx::query(
            r#"
            SELECT id, student_id, mentor_id, status, chat_channel_id,
                   created_at, updated_at
            FROM mentorship_connections
            WHERE student_id = $1 AND mentor_id = $2
            "#,
        )
        .bind(&connection.student_id)
        .bind(&connection.mentor_id)
        .fetch_one(&self.pool)
        .await?;

        row_to_connection(&row)
    }

    async fn list_active_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<MentorshipConnection>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, mentor_id, status, chat_channel_id,
                   created_at, updated_at
            FROM mentorship_connections
            WHERE student_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_connection).collect()
    }

    async fn list_active_for_mentor(
        &self,
        mentor_id: &str,
    ) -> Result<Vec<MentorshipConnection>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, mentor_id, status, chat_channel_id,
                   created_at, updated_at
            FROM mentorship_connections
            WHERE mentor_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            "#,
        )
        .bind(mentor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_connection).collect()
    }
}
