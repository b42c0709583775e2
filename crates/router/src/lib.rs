//! Routing domain for GitHub Org Manager.
//!
//! This crate takes one invocation envelope, works out where it came from,
//! unwraps the GitHub webhook carried inside an SNS notification, and hands
//! the webhook to every registered plugin that wants it. Failures are reported
//! through an alerting port before being surfaced to the host.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed ([`Plugin`], [`AlertPublisher`]); the `github`,
//! `sns` and `plugins` crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PluginName`, `TopicArn`, `Login`, etc.) |
//! | [`config`] | Immutable invocation configuration |
//! | [`event`] | Envelope classification and webhook unwrapping |
//! | [`plugin`] | The plugin contract and the registry that loads plugins |
//! | [`dispatch`] | Routes one envelope to the matching plugins |
//! | [`alert`] | Failure reports and the publishing port |
//! | [`handler`] | The invocation entry point and its error boundary |
//! | [`errors`] | Error types shared across the workspace |

pub mod alert;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod handler;
pub mod identifiers;
pub mod plugin;

#[cfg(test)]
mod test_support;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use alert::{AlertPublisher, AlertStatus, Alerter, ALERT_SUBJECT};
pub use config::{AlertTarget, Config, GitHubToken, RawConfig, DEFAULT_GITHUB_API_URL};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use errors::{
    AlertError, BoxError, ConfigError, PluginActionError, PluginFailure, PluginLoadError, RouterError,
};
pub use event::{
    classify, ClassifiedEvent, EmailRecord, EventSource, PubSubRecord, ScheduledEvent,
    WebhookPayload, EMAIL_EVENT_SOURCE, PUB_SUB_EVENT_SOURCE, SCHEDULED_EVENT_SOURCE,
};
pub use handler::{failure_report, EventHandler, InvocationContext};
pub use identifiers::{AwsRegion, Login, PluginName, RepositoryFullName, TopicArn};
pub use plugin::{Plugin, PluginFactory, PluginRegistration, PluginRegistry};
