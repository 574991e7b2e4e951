use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Lifecycle state of a chat request. A request is created pending and
/// transitions exactly once to accepted or declined, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "declined" => Ok(RequestStatus::Declined),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// A student's proposal to start a mentorship chat with a mentor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub student_avatar: Option<String>,
    pub mentor_id: String,
    pub mentor_name: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission payload for a new chat request. Identity fields come from the
/// external identity provider and are trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatRequest {
    pub student_id: String,
    pub student_name: String,
    pub student_avatar: Option<String>,
    pub mentor_id: String,
    pub mentor_name: String,
    pub message: String,
}

/// Mentor-side verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}
