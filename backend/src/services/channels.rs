//! Chat channel provisioning against the external messaging service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::Error;

/// Derives the channel id for a mentor-student pair. The id is a pure
/// function of the two ids, so repeated or concurrent accepts address the
/// same channel instead of creating duplicates.
pub fn derive_channel_id(mentor_id: &str, student_id: &str) -> String {
    format!("mentor-{mentor_id}-student-{student_id}")
}

/// Create-if-absent channel provisioning. Implementations must be safe to
/// call repeatedly with the same channel id.
#[async_trait]
pub trait ChannelProvisioner: Send + Sync {
    async fn ensure_channel(
        &self,
        channel_id: &str,
        name: &str,
        member_ids: &[String],
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct HttpChannelProvisioner {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpChannelProvisioner {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ChannelProvisioner for HttpChannelProvisioner {
    async fn ensure_channel(
        &self,
        channel_id: &str,
        name: &str,
        member_ids: &[String],
    ) -> Result<(), Error> {
        let url = format!("{}/v1/channels", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "channel_id": channel_id,
            "name": name,
            "members": member_ids,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ChannelProvisioning(format!("request failed: {e}")))?;

        let status = response.status();
        // 409 means the channel already exists, which satisfies the
        // create-if-absent contract.
        if status.is_success() || status == StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(Error::ChannelProvisioning(format!(
                "messaging service returned {status} for channel {channel_id}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_is_deterministic() {
        let first = derive_channel_id("m42", "s7");
        let second = derive_channel_id("m42", "s7");
        assert_eq!(first, second);
        assert_eq!(first, "mentor-m42-student-s7");
    }

    #[test]
    fn channel_id_distinguishes_pairs() {
        assert_ne!(derive_channel_id("m1", "s2"), derive_channel_id("m2", "s1"));
        assert_ne!(derive_channel_id("m1", "s1"), derive_channel_id("m1", "s2"));
    }
}
