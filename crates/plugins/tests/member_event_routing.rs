//! End-to-end routing of a repository-transfer MemberEvent.
//!
//! Builds the registry from the real catalogue, points the GitHub client at a
//! wiremock server, and drives an SNS envelope through
//! [`router::EventHandler`].

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use router::{
    AlertPublisher, AlertTarget, BoxError, Config, DispatchOutcome, EventHandler,
    InvocationContext, PluginName, PluginRegistry, RawConfig, RouterError,
};

const PERMISSION_PATH: &str = "/repos/org/repo/collaborators/alice/permission";
const COLLABORATOR_PATH: &str = "/repos/org/repo/collaborators/alice";

#[derive(Default)]
struct CapturingPublisher {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl AlertPublisher for CapturingPublisher {
    async fn publish(
        &self,
        _target: &AlertTarget,
        _subject: &str,
        message: &str,
    ) -> Result<(), BoxError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn config(server: &MockServer) -> Config {
    Config::from_raw(RawConfig {
        alert_sns_topic_arn: Some("arn:aws:sns:us-west-2:123456789012:alerts".to_string()),
        alert_sns_region: Some("us-west-2".to_string()),
        github_token: Some("ghp_example".to_string()),
        github_api_url: Some(server.uri()),
        ..RawConfig::default()
    })
    .unwrap()
}

fn envelope(webhook: &Value) -> Value {
    let message = json!({ "body": webhook.to_string() }).to_string();
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "EventSubscriptionArn": "arn:aws:sns:us-west-2:123456789012:github:sub",
            "Sns": { "MessageId": "m-1", "Message": message }
        }]
    })
}

fn member_event() -> Value {
    json!({
        "action": "added",
        "member": { "login": "alice" },
        "sender": { "login": "alice" },
        "repository": { "full_name": "org/repo", "name": "repo", "owner": { "login": "org" } }
    })
}

#[tokio::test]
async fn test_transferred_repo_owner_is_escalated_to_admin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERMISSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "permission": "write" })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(COLLABORATOR_PATH))
        .and(body_json(json!({ "permission": "admin" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PERMISSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "permission": "admin" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server);
    let registry = PluginRegistry::load(plugins::catalogue(), &config);
    let publisher = CapturingPublisher::default();
    let ctx = InvocationContext::new(None);

    let outcome = EventHandler::new(&config, &registry, &publisher)
        .handle(&envelope(&member_event()), &ctx)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Routed {
            matched: vec![PluginName::new(plugins::grant_transferred_repo_admin_permissions::NAME)
                .unwrap()]
        }
    );
    assert!(publisher.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_existing_admin_is_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERMISSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "permission": "admin" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let config = config(&server);
    let registry = PluginRegistry::load(plugins::catalogue(), &config);
    let publisher = CapturingPublisher::default();

    EventHandler::new(&config, &registry, &publisher)
        .handle(&envelope(&member_event()), &InvocationContext::new(None))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unrelated_webhook_makes_no_api_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut webhook = member_event();
    webhook["action"] = json!("removed");

    let config = config(&server);
    let registry = PluginRegistry::load(plugins::catalogue(), &config);
    let publisher = CapturingPublisher::default();

    let outcome = EventHandler::new(&config, &registry, &publisher)
        .handle(&envelope(&webhook), &InvocationContext::new(None))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Routed { matched: vec![] });
}

#[tokio::test]
async fn test_malformed_body_alerts_once_and_fails() {
    let server = MockServer::start().await;
    let config = config(&server);
    let registry = PluginRegistry::load(plugins::catalogue(), &config);
    let publisher = CapturingPublisher::default();

    let bad = json!({
        "Records": [{
            "EventSource": "aws:sns",
            "Sns": { "Message": json!({ "body": "{\"action\": " }).to_string() }
        }]
    });

    let err = EventHandler::new(&config, &registry, &publisher)
        .handle(&bad, &InvocationContext::new(None))
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::MalformedPayload { .. }));
    let messages = publisher.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("MalformedPayload"));
}

#[test]
fn test_catalogue_without_token_loads_nothing() {
    let registry = PluginRegistry::load(plugins::catalogue(), &Config::default());
    assert!(registry.is_empty());
}
