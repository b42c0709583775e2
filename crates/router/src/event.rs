//! Envelope classification and webhook unwrapping.
//!
//! The host hands every invocation a loosely-typed JSON envelope. [`classify`]
//! decides which AWS service produced it and decodes the fields that make
//! sense for that service into a [`ClassifiedEvent`]. Only SNS notifications
//! carry GitHub webhooks; [`PubSubRecord::webhook_payload`] peels the two
//! layers of serialisation off those.
//!
//! ## Field casing
//!
//! SES records name their source field `eventSource`; SNS records name it
//! `EventSource`. Lookups are case-sensitive and a record is never matched
//! against the other service's spelling.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::RouterError;

/// `source` value of an EventBridge (CloudWatch Events) scheduled event.
pub const SCHEDULED_EVENT_SOURCE: &str = "aws.events";

/// `eventSource` value of an SES receipt record.
pub const EMAIL_EVENT_SOURCE: &str = "aws:ses";

/// `EventSource` value of an SNS notification record.
pub const PUB_SUB_EVENT_SOURCE: &str = "aws:sns";

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// Which service produced an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    /// EventBridge scheduled rule.
    ScheduledEvent,
    /// SES received email.
    EmailEvent,
    /// SNS published message.
    PubSubEvent,
    /// Anything else, including malformed envelopes.
    Unknown,
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ScheduledEvent => "ScheduledEvent",
            Self::EmailEvent => "EmailEvent",
            Self::PubSubEvent => "PubSubEvent",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A classified envelope carrying only the fields valid for its source.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// An EventBridge scheduled event.
    Scheduled(ScheduledEvent),
    /// The first record of an SES delivery.
    EmailRecord(EmailRecord),
    /// The first record of an SNS delivery.
    PubSubRecord(PubSubRecord),
    /// The envelope shape was not recognised.
    Unknown,
}

impl ClassifiedEvent {
    /// The field-less source tag.
    pub fn source(&self) -> EventSource {
        match self {
            Self::Scheduled(_) => EventSource::ScheduledEvent,
            Self::EmailRecord(_) => EventSource::EmailEvent,
            Self::PubSubRecord(_) => EventSource::PubSubEvent,
            Self::Unknown => EventSource::Unknown,
        }
    }
}

/// Fields of an EventBridge scheduled event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScheduledEvent {
    /// Event id assigned by EventBridge.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// Usually `"Scheduled Event"`.
    #[serde(default, deserialize_with = "lenient")]
    pub detail_type: Option<String>,
    /// When the rule fired.
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<DateTime<Utc>>,
    /// ARNs of the rules that fired.
    #[serde(default, deserialize_with = "lenient")]
    pub resources: Vec<String>,
}

/// Fields of an SES receipt record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailRecord {
    /// SES message id.
    pub message_id: Option<String>,
    /// Envelope sender.
    pub source: Option<String>,
    /// Envelope recipients.
    pub destination: Vec<String>,
    /// `Subject` header, when SES parsed it.
    pub subject: Option<String>,
}

/// Fields of an SNS notification record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PubSubRecord {
    /// The subscription that delivered the record.
    pub subscription_arn: Option<String>,
    /// SNS message id.
    pub message_id: Option<String>,
    /// Topic the message was published to.
    pub topic_arn: Option<String>,
    /// Optional subject line.
    pub subject: Option<String>,
    /// The serialised message body.
    pub message: Option<String>,
    /// Publish time.
    pub timestamp: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Wire shapes (lenient)
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct SesRecordWire {
    #[serde(default, deserialize_with = "lenient")]
    ses: SesWire,
}

#[derive(Deserialize, Default)]
struct SesWire {
    #[serde(default, deserialize_with = "lenient")]
    mail: SesMailWire,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SesMailWire {
    #[serde(default, deserialize_with = "lenient")]
    message_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    destination: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    common_headers: SesHeadersWire,
}

#[derive(Deserialize, Default)]
struct SesHeadersWire {
    #[serde(default, deserialize_with = "lenient")]
    subject: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct SnsRecordWire {
    #[serde(default, deserialize_with = "lenient")]
    event_subscription_arn: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    sns: SnsWire,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct SnsWire {
    #[serde(default, deserialize_with = "lenient")]
    message_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    topic_arn: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    subject: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    timestamp: Option<DateTime<Utc>>,
}

/// Decodes `value` as `T`, falling back to `T::default()` when the shape does
/// not match. Classification has already been decided by this point; a
/// malformed detail must not turn a known source into an error.
fn decode_lenient<T: DeserializeOwned + Default>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Field-level counterpart of [`decode_lenient`]: a field of the wrong shape
/// decodes as its default without discarding its siblings.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies an invocation envelope.
///
/// First match wins:
///
/// 1. `source == "aws.events"` → [`ClassifiedEvent::Scheduled`].
/// 2. `Records` is a non-empty array whose first element is an object, and
///    that element has lower-case `eventSource == "aws:ses"` →
///    [`ClassifiedEvent::EmailRecord`], or upper-case
///    `EventSource == "aws:sns"` → [`ClassifiedEvent::PubSubRecord`].
/// 3. Otherwise [`ClassifiedEvent::Unknown`].
///
/// Never fails; anything unexpected falls through to `Unknown`.
pub fn classify(envelope: &Value) -> ClassifiedEvent {
    if envelope.get("source").and_then(Value::as_str) == Some(SCHEDULED_EVENT_SOURCE) {
        return ClassifiedEvent::Scheduled(decode_lenient(envelope));
    }

    let Some(record) = envelope
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .filter(|record| record.is_object())
    else {
        return ClassifiedEvent::Unknown;
    };

    if record.get("eventSource").and_then(Value::as_str) == Some(EMAIL_EVENT_SOURCE) {
        let wire: SesRecordWire = decode_lenient(record);
        let mail = wire.ses.mail;
        return ClassifiedEvent::EmailRecord(EmailRecord {
            message_id: mail.message_id,
            source: mail.source,
            destination: mail.destination,
            subject: mail.common_headers.subject,
        });
    }

    if record.get("EventSource").and_then(Value::as_str) == Some(PUB_SUB_EVENT_SOURCE) {
        let wire: SnsRecordWire = decode_lenient(record);
        return ClassifiedEvent::PubSubRecord(PubSubRecord {
            subscription_arn: wire.event_subscription_arn,
            message_id: wire.sns.message_id,
            topic_arn: wire.sns.topic_arn,
            subject: wire.sns.subject,
            message: record
                .pointer("/Sns/Message")
                .and_then(Value::as_str)
                .map(str::to_string),
            timestamp: wire.sns.timestamp,
        });
    }

    ClassifiedEvent::Unknown
}

// ---------------------------------------------------------------------------
// Webhook unwrapping
// ---------------------------------------------------------------------------

impl PubSubRecord {
    /// Extracts the GitHub webhook from this record.
    ///
    /// `Sns.Message` is JSON produced by the webhook forwarder; its `body` key
    /// holds the webhook either as a JSON-encoded string or inline as an
    /// object.
    ///
    /// # Errors
    ///
    /// [`RouterError::MalformedPayload`] if the message is absent, either
    /// layer is not valid JSON, `body` is missing, or the webhook is not a
    /// JSON object.
    pub fn webhook_payload(&self) -> Result<WebhookPayload, RouterError> {
        let message = self
            .message
            .as_deref()
            .ok_or_else(|| malformed("SNS record has no 'Sns.Message' string"))?;

        let message: Value = serde_json::from_str(message)
            .map_err(|e| malformed(format!("'Sns.Message' is not valid JSON: {e}")))?;

        let body = message
            .get("body")
            .ok_or_else(|| malformed("'Sns.Message' has no 'body' field"))?;

        let webhook = match body {
            Value::String(encoded) => serde_json::from_str(encoded)
                .map_err(|e| malformed(format!("'body' is not valid JSON: {e}")))?,
            Value::Object(_) => body.clone(),
            other => {
                return Err(malformed(format!(
                    "'body' must be a JSON string or object, found {}",
                    json_type_name(other)
                )))
            }
        };

        WebhookPayload::try_from(webhook)
    }
}

fn malformed(reason: impl Into<String>) -> RouterError {
    RouterError::MalformedPayload {
        reason: reason.into(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A decoded GitHub webhook.
///
/// The schema belongs to GitHub and is not validated here; plugins look up the
/// fields they care about. Always holds a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WebhookPayload(Value);

impl WebhookPayload {
    /// Wraps an already-decoded JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Value::Object(fields))
    }

    /// A top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string found by JSON pointer (e.g. `"/member/login"`).
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.0.pointer(pointer)?.as_str()
    }

    /// The webhook's `action` field.
    pub fn action(&self) -> Option<&str> {
        self.str_at("/action")
    }

    /// Decodes the payload into a typed event.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// The underlying JSON object.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl TryFrom<Value> for WebhookPayload {
    type Error = RouterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(malformed(format!(
                "webhook payload must be a JSON object, found {}",
                json_type_name(&value)
            )))
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
