use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;
use crate::errors::BoxError;
use crate::test_support::{
    alerting_config, sns_envelope_with_action, sns_envelope_with_body, ActionLog,
    RecordingPlugin, RecordingPublisher,
};
use crate::{PluginActionError, PluginFailure, PluginName};

fn registry_with(log: &ActionLog, failing: bool) -> PluginRegistry {
    let mut plugin = RecordingPlugin::new("recorder", "added", log);
    if failing {
        plugin = plugin.failing();
    }
    PluginRegistry::from_plugins(vec![Box::new(plugin)])
}

fn new_log() -> ActionLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_unknown_envelope_is_a_quiet_success() {
    let log = new_log();
    let registry = registry_with(&log, false);
    let config = alerting_config();
    let publisher = RecordingPublisher::default();
    let ctx = InvocationContext::new(None);

    let outcome = EventHandler::new(&config, &registry, &publisher)
        .handle(&json!({}), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Unrouted(crate::EventSource::Unknown));
    assert!(log.lock().unwrap().is_empty());
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_successful_dispatch_sends_no_alert() {
    let log = new_log();
    let registry = registry_with(&log, false);
    let config = alerting_config();
    let publisher = RecordingPublisher::default();
    let ctx = InvocationContext::new(None);

    EventHandler::new(&config, &registry, &publisher)
        .handle(&sns_envelope_with_action("added"), &ctx)
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["recorder"]);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_alerts_once_then_propagates() {
    let log = new_log();
    let registry = registry_with(&log, false);
    let config = alerting_config();
    let publisher = RecordingPublisher::default();
    let ctx = InvocationContext::new(Some("stream-1".to_string()));

    let err = EventHandler::new(&config, &registry, &publisher)
        .handle(&sns_envelope_with_body(json!("not json at all")), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::MalformedPayload { .. }));
    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let message = &published[0].message;
    assert!(message.starts_with("Uncaught error\nMalformedPayload\nMalformed webhook payload:"));
    assert!(message.contains("'body' is not valid JSON"));
    assert!(message.ends_with("Log stream is : stream-1"));
}

#[tokio::test]
async fn test_plugin_failure_alerts_and_propagates() {
    let log = new_log();
    let registry = registry_with(&log, true);
    let config = alerting_config();
    let publisher = RecordingPublisher::default();
    let ctx = InvocationContext::new(None);

    let err = EventHandler::new(&config, &registry, &publisher)
        .handle(&sns_envelope_with_action("added"), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "PluginActionError");
    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert!(published[0]
        .message
        .contains("- plugin 'recorder' failed: Webhook payload is missing required field"));
}

#[tokio::test]
async fn test_alert_failure_does_not_mask_dispatch_error() {
    let log = new_log();
    let registry = registry_with(&log, false);
    let config = alerting_config();
    let publisher = RecordingPublisher::failing();
    let ctx = InvocationContext::new(None);

    let err = EventHandler::new(&config, &registry, &publisher)
        .handle(&sns_envelope_with_body(json!(42)), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::MalformedPayload { .. }));
    assert_eq!(publisher.published().len(), 1);
}

#[tokio::test]
async fn test_failure_without_alert_target_still_propagates() {
    let log = new_log();
    let registry = registry_with(&log, false);
    let config = Config::default();
    let publisher = RecordingPublisher::default();
    let ctx = InvocationContext::new(None);

    let err = EventHandler::new(&config, &registry, &publisher)
        .handle(&sns_envelope_with_body(json!("{")), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::MalformedPayload { .. }));
    assert!(publisher.published().is_empty());
}

#[test]
fn test_failure_report_lists_causes() {
    let source: BoxError = "connection reset by peer".into();
    let err = RouterError::PluginActions {
        failures: vec![PluginFailure {
            plugin: PluginName::new("grant").unwrap(),
            error: PluginActionError::ExternalService {
                service: "GitHub".to_string(),
                source,
            },
        }],
    };

    let report = failure_report(&err);
    assert_eq!(
        report,
        "Uncaught error\nPluginActionError\n1 plugin action(s) failed\n\
         - plugin 'grant' failed: GitHub request failed\n  \
         caused by: connection reset by peer"
    );
}

#[derive(Debug, thiserror::Error)]
#[error("TLS handshake failed")]
struct HandshakeError(#[source] std::io::Error);

#[test]
fn test_failure_report_follows_nested_causes_to_the_root() {
    let root = std::io::Error::other("certificate expired");
    let err = RouterError::PluginActions {
        failures: vec![PluginFailure {
            plugin: PluginName::new("grant").unwrap(),
            error: PluginActionError::ExternalService {
                service: "GitHub".to_string(),
                source: Box::new(HandshakeError(root)),
            },
        }],
    };

    let report = failure_report(&err);
    assert!(report.ends_with(
        "- plugin 'grant' failed: GitHub request failed\n  \
         caused by: TLS handshake failed\n  \
         caused by: certificate expired"
    ));
}

#[test]
fn test_context_invocation_id_can_be_replaced() {
    let id = uuid::Uuid::new_v4();
    let ctx = InvocationContext::new(None).with_invocation_id(id);
    assert_eq!(ctx.invocation_id, id);
}
