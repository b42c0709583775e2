//! In-memory fakes for the router's ports, shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::BoxError;
use crate::{
    AlertPublisher, AlertTarget, Config, Plugin, PluginActionError, PluginLoadError, PluginName,
    RawConfig, WebhookPayload,
};

/// Shared log of plugin actions, in the order they ran.
pub type ActionLog = Arc<Mutex<Vec<String>>>;

/// A plugin that matches one webhook `action` and records every call to `act`.
pub struct RecordingPlugin {
    pub name: PluginName,
    pub matches_action: &'static str,
    pub fail: bool,
    pub log: ActionLog,
}

impl RecordingPlugin {
    pub fn new(name: &str, matches_action: &'static str, log: &ActionLog) -> Self {
        Self {
            name: PluginName::new(name).unwrap(),
            matches_action,
            fail: false,
            log: Arc::clone(log),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &PluginName {
        &self.name
    }

    fn is_matching(&self, _config: &Config, payload: &WebhookPayload) -> bool {
        payload.action() == Some(self.matches_action)
    }

    async fn act(
        &self,
        _config: &Config,
        _payload: &WebhookPayload,
    ) -> Result<(), PluginActionError> {
        self.log.lock().unwrap().push(self.name.to_string());
        if self.fail {
            return Err(PluginActionError::MissingField {
                field: "/member/login".to_string(),
            });
        }
        Ok(())
    }
}

/// One alert captured by [`RecordingPublisher`].
#[derive(Debug, Clone)]
pub struct PublishedAlert {
    pub target: AlertTarget,
    pub subject: String,
    pub message: String,
}

/// An [`AlertPublisher`] that stores alerts instead of sending them.
#[derive(Default)]
pub struct RecordingPublisher {
    pub alerts: Mutex<Vec<PublishedAlert>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            alerts: Mutex::default(),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<PublishedAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertPublisher for RecordingPublisher {
    async fn publish(
        &self,
        target: &AlertTarget,
        subject: &str,
        message: &str,
    ) -> Result<(), BoxError> {
        self.alerts.lock().unwrap().push(PublishedAlert {
            target: target.clone(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        if self.fail {
            return Err("topic does not exist".into());
        }
        Ok(())
    }
}

/// A plugin factory that always fails, for registry tests.
pub fn failing_factory(_config: &Config) -> Result<Box<dyn Plugin>, PluginLoadError> {
    Err(PluginLoadError::MissingSetting {
        plugin: PluginName::new("needs_token").unwrap(),
        key: "github_token".to_string(),
    })
}

/// Configuration with alerting enabled.
pub fn alerting_config() -> Config {
    Config::from_raw(RawConfig {
        alert_sns_topic_arn: Some("arn:aws:sns:us-west-2:123456789012:alerts".to_string()),
        alert_sns_region: Some("us-west-2".to_string()),
        ..RawConfig::default()
    })
    .unwrap()
}

/// An SNS envelope whose message body is `body` (already encoded).
pub fn sns_envelope_with_body(body: Value) -> Value {
    let message = json!({ "body": body }).to_string();
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "Sns": { "MessageId": "m-1", "Message": message }
        }]
    })
}

/// An SNS envelope carrying a webhook with the given `action`.
pub fn sns_envelope_with_action(action: &str) -> Value {
    sns_envelope_with_body(json!(json!({ "action": action }).to_string()))
}
