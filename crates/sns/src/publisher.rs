//! SNS-backed [`AlertPublisher`].

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use router::{AlertPublisher, AlertTarget, AwsRegion, BoxError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Largest message body SNS accepts, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 256 * 1024;

/// Longest subject SNS accepts, in characters.
pub const MAX_SUBJECT_CHARS: usize = 100;

const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Publishes alerts to SNS, one client per region.
pub struct SnsAlertPublisher {
    base: Option<SdkConfig>,
    clients: Mutex<HashMap<AwsRegion, aws_sdk_sns::Client>>,
}

impl Default for SnsAlertPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnsAlertPublisher {
    /// Creates a publisher that loads the default AWS configuration the first
    /// time each region is used.
    pub fn new() -> Self {
        Self {
            base: None,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a publisher that derives its clients from `base`, overriding
    /// only the region (e.g. to point at a local endpoint).
    pub fn from_sdk_config(base: SdkConfig) -> Self {
        Self {
            base: Some(base),
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client(&self, region: &AwsRegion) -> aws_sdk_sns::Client {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(region) {
            return client.clone();
        }

        let region_name = Region::new(region.as_str().to_owned());
        let client = match &self.base {
            Some(base) => {
                let config = aws_sdk_sns::config::Builder::from(base)
                    .region(region_name)
                    .build();
                aws_sdk_sns::Client::from_conf(config)
            }
            None => {
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(region_name)
                    .load()
                    .await;
                aws_sdk_sns::Client::new(&sdk_config)
            }
        };
        debug!(%region, "Created SNS client");
        clients.insert(region.clone(), client.clone());
        client
    }
}

#[async_trait]
impl AlertPublisher for SnsAlertPublisher {
    async fn publish(
        &self,
        target: &AlertTarget,
        subject: &str,
        message: &str,
    ) -> Result<(), BoxError> {
        let client = self.client(&target.region).await;
        let subject: String = subject.chars().take(MAX_SUBJECT_CHARS).collect();
        if message.len() > MAX_MESSAGE_BYTES {
            warn!(
                topic = %target.topic_arn,
                bytes = message.len(),
                "Alert message truncated to fit SNS limits"
            );
        }
        let message = truncate_message(message, MAX_MESSAGE_BYTES);

        let output = client
            .publish()
            .topic_arn(target.topic_arn.as_str())
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| -> BoxError { Box::new(aws_sdk_sns::Error::from(e)) })?;

        debug!(
            topic = %target.topic_arn,
            message_id = output.message_id().unwrap_or("-"),
            "Published alert to SNS"
        );
        Ok(())
    }
}

/// Shortens `message` to at most `max_bytes` bytes, cutting on a character
/// boundary and ending with a `[truncated]` marker when anything was removed
/// and the marker fits.
pub fn truncate_message(message: &str, max_bytes: usize) -> String {
    if message.len() <= max_bytes {
        return message.to_string();
    }

    let marker = if max_bytes >= TRUNCATION_MARKER.len() {
        TRUNCATION_MARKER
    } else {
        ""
    };
    let mut cut = max_bytes - marker.len();
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{marker}", &message[..cut])
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
