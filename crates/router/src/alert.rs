//! Failure reports and the publishing port.
//!
//! [`Alerter`] turns a failure message into a report that also carries the
//! original envelope and the log stream to look in, then hands it to an
//! [`AlertPublisher`]. The `sns` crate provides the production publisher.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{error, info};

use crate::errors::BoxError;
use crate::{AlertError, AlertTarget, Config, InvocationContext};

/// Subject line of every alert.
pub const ALERT_SUBJECT: &str = "Alert from GitHub Org Manager";

/// Publishes a text alert to a notification topic.
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    /// Publishes `message` with `subject` to `target`.
    async fn publish(
        &self,
        target: &AlertTarget,
        subject: &str,
        message: &str,
    ) -> Result<(), BoxError>;
}

/// Whether [`Alerter::alert`] sent anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    /// No alert target is configured; nothing was sent.
    Disabled,
    /// The alert was accepted by the publisher.
    Published,
}

/// Sends failure reports for one invocation.
pub struct Alerter<'a> {
    config: &'a Config,
    envelope: &'a Value,
    context: &'a InvocationContext,
    publisher: &'a dyn AlertPublisher,
}

impl<'a> Alerter<'a> {
    /// Creates an alerter bound to one invocation's envelope and context.
    pub fn new(
        config: &'a Config,
        envelope: &'a Value,
        context: &'a InvocationContext,
        publisher: &'a dyn AlertPublisher,
    ) -> Self {
        Self {
            config,
            envelope,
            context,
            publisher,
        }
    }

    /// Builds the report text: `message`, the envelope pretty-printed with
    /// four-space indentation, and the log stream name.
    pub fn compose(&self, message: &str) -> String {
        let mut report = String::from(message);
        if !report.is_empty() {
            report.push('\n');
        }
        report.push_str("\n\n");
        report.push_str(&pretty_json(self.envelope));
        report.push_str("\nLog stream is : ");
        report.push_str(
            self.context
                .log_stream_name
                .as_deref()
                .unwrap_or("None"),
        );
        report
    }

    /// Publishes a report built from `message`.
    ///
    /// A silent no-op returning [`AlertStatus::Disabled`] when the
    /// configuration has no alert target.
    ///
    /// # Errors
    ///
    /// [`AlertError::Publish`] if the publisher fails. The error is returned
    /// rather than swallowed so the caller decides how loud to be about it.
    pub async fn alert(&self, message: &str) -> Result<AlertStatus, AlertError> {
        let Some(target) = self.config.alert_target() else {
            return Ok(AlertStatus::Disabled);
        };

        error!(
            invocation_id = %self.context.invocation_id,
            envelope = %self.envelope,
            "Alerting on event"
        );
        let report = self.compose(message);
        self.publisher
            .publish(target, ALERT_SUBJECT, &report)
            .await
            .map_err(|source| AlertError::Publish {
                topic: target.topic_arn.clone(),
                source,
            })?;

        info!(topic = %target.topic_arn, "Alert published");
        Ok(AlertStatus::Published)
    }
}

fn pretty_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
