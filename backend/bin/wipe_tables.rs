use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Arg, Command};
use elevated::db::{get_db_pool, DatabaseConfig};
use sqlx::{PgPool, Row};
use std::fs;
use tracing::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let matches = Command::new("backup-and-wipe-mentorship")
        .about("Backup and wipe the chat_requests and mentorship_connections tables")
        .arg(
            Arg::new("backup-only")
                .long("backup-only")
                .help("Only create backups, don't wipe the tables")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("confirm-wipe")
                .long("confirm-wipe")
                .help("Confirm that you want to wipe both tables (required for wipe)")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let backup_only = matches.get_flag("backup-only");
    let confirm_wipe = matches.get_flag("confirm-wipe");

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    info!("Connected to database");

    // Step 1: Create backups
    info!("🔄 Creating backups of mentorship tables...");
    let backup_file = create_backup(&pool).await?;
    info!("✅ Backup created successfully: {}", backup_file);

    if backup_only {
        info!("Backup-only mode. Tables were not modified.");
        return Ok(());
    }

    // Step 2: Wipe tables (only if confirmed)
    if !confirm_wipe {
        warn!("⚠️  Wipe not confirmed. Use --confirm-wipe to proceed with wiping the tables.");
        info!("Backup created: {}", backup_file);
        return Ok(());
    }

    info!("🔄 Wiping mentorship tables...");
    let (requests, connections) = wipe_tables(&pool).await?;
    info!(
        "✅ Wiped {} chat requests and {} connections",
        requests, connections
    );

    Ok(())
}

async fn create_backup(pool: &PgPool) -> Result<String> {
    let requests = dump_chat_requests(pool).await?;
    let connections = dump_connections(pool).await?;

    let backup = serde_json::json!({
        "backed_up_at": Utc::now().to_rfc3339(),
        "chat_requests": requests,
        "mentorship_connections": connections,
    });

    let filename = format!(
        "mentorship_backup_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    fs::write(&filename, serde_json::to_string_pretty(&backup)?)?;

    Ok(filename)
}

async fn dump_chat_requests(pool: &PgPool) -> Result<Vec<serde_json::Value>> {
    let rows = sqlx::query(
        r#"
        SELECT id, student_id, student_name, student_avatar,
               mentor_id, mentor_name, message, status,
               created_at, updated_at
        FROM chat_requests
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(serde_json::json!({
            "id": row.try_get::<Uuid, _>("id")?.to_string(),
            "student_id": row.try_get::<String, _>("student_id")?,
            "student_name": row.try_get::<String, _>("student_name")?,
            "student_avatar": row.try_get::<Option<String>, _>("student_avatar")?,
            "mentor_id": row.try_get::<String, _>("mentor_id")?,
            "mentor_name": row.try_get::<String, _>("mentor_name")?,
            "message": row.try_get::<String, _>("message")?,
            "status": row.try_get::<String, _>("status")?,
            "created_at": row.try_get::<DateTime<Utc>, _>("created_at")?.to_rfc3339(),
            "updated_at": row.try_get::<DateTime<Utc>, _>("updated_at")?.to_rfc3339(),
        }));
    }
    Ok(records)
}

async fn dump_connections(pool: &PgPool) -> Result<Vec<serde_json::Value>> {
    let rows = sqlx::query(
        r#"
        SELECT id, student_id, mentor_id, status, chat_channel_id,
               created_at, updated_at
        FROM mentorship_connections
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(serde_json::json!({
            "id": row.try_get::<Uuid, _>("id")?.to_string(),
            "student_id": row.try_get::<String, _>("student_id")?,
            "mentor_id": row.try_get::<String, _>("mentor_id")?,
            "status": row.try_get::<String, _>("status")?,
            "chat_channel_id": row.try_get::<String, _>("chat_channel_id")?,
            "created_at": row.try_get::<DateTime<Utc>, _>("created_at")?.to_rfc3339(),
            "updated_at": row.try_get::<DateTime<Utc>, _>("updated_at")?.to_rfc3339(),
        }));
    }
    Ok(records)
}

async fn wipe_tables(pool: &PgPool) -> Result<(u64, u64)> {
    let connections = sqlx::query("DELETE FROM mentorship_connections")
        .execute(pool)
        .await?
        .rows_affected();
    let requests = sqlx::query("DELETE FROM chat_requests")
        .execute(pool)
        .await?
        .rows_affected();

    Ok((requests, connections))
}
