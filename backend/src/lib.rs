pub mod models;
pub mod db;
pub mod error;
pub mod services;
pub mod handlers;
pub mod utils;
pub mod constants;

pub use error::Error;
pub use utils::config::Config;
pub use db::connection::get_db_pool;
pub use services::mentorship::MentorshipService;

// Re-export common types
pub use sqlx::PgPool;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
