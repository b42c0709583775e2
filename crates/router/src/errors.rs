//! Error types for the router domain.
//!
//! [`RouterError`] covers the conditions that fail an invocation and reach the
//! entry point's error boundary. The remaining types describe failures that are
//! contained closer to where they happen: [`PluginLoadError`] is absorbed by
//! the registry, [`PluginActionError`] is collected per plugin by the
//! dispatcher, [`AlertError`] is logged by the entry point, and
//! [`ConfigError`] stops the process before any event is handled.

use thiserror::Error;

use crate::{PluginName, TopicArn};

/// Boxed error used at port boundaries where the concrete infrastructure error
/// type is not known to the domain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Invocation-level errors
// ---------------------------------------------------------------------------

/// Errors that fail an invocation.
///
/// Every variant is alerted on by [`crate::EventHandler`] and then returned to
/// the host so the invocation is recorded as failed. An envelope that cannot
/// be classified is *not* an error; see [`crate::DispatchOutcome::Unrouted`].
#[derive(Debug, Error)]
pub enum RouterError {
    /// The SNS record could not be unwrapped into a webhook payload.
    ///
    /// Produced when `Sns.Message` or its `body` is missing, is not valid
    /// JSON, or does not decode to a JSON object.
    #[error("Malformed webhook payload: {reason}")]
    MalformedPayload {
        /// Which unwrap step failed and why.
        reason: String,
    },

    /// One or more matching plugins failed while acting on the payload.
    ///
    /// Every matching plugin has been attempted by the time this is produced.
    #[error("{count} plugin action(s) failed", count = .failures.len())]
    PluginActions {
        /// The failures, in registry order.
        failures: Vec<PluginFailure>,
    },
}

impl RouterError {
    /// A stable name for the error kind, used in alert text and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedPayload { .. } => "MalformedPayload",
            Self::PluginActions { .. } => "PluginActionError",
        }
    }
}

/// A single plugin's failed action.
#[derive(Debug, Error)]
#[error("plugin '{plugin}' failed: {error}")]
pub struct PluginFailure {
    /// The plugin whose action failed.
    pub plugin: PluginName,
    /// What went wrong.
    #[source]
    pub error: PluginActionError,
}

// ---------------------------------------------------------------------------
// Plugin errors
// ---------------------------------------------------------------------------

/// Errors raised by [`crate::Plugin::act`].
///
/// Expected API error responses are handled inside the plugin (logged, action
/// abandoned) and never become a `PluginActionError`. These variants are for
/// conditions the plugin cannot sensibly absorb.
#[derive(Debug, Error)]
pub enum PluginActionError {
    /// The payload matched the plugin's predicate but lacks a field the action needs.
    #[error("Webhook payload is missing required field '{field}'")]
    MissingField {
        /// JSON pointer of the missing field (e.g. `/repository/owner/login`).
        field: String,
    },

    /// A call to an external service failed in an unexpected way
    /// (transport failure, undecodable response).
    #[error("{service} request failed")]
    ExternalService {
        /// Human-readable name of the service (e.g. `"GitHub"`).
        service: String,
        /// The underlying infrastructure error.
        #[source]
        source: BoxError,
    },
}

/// Errors raised while constructing a plugin from configuration.
///
/// The registry logs these and skips the plugin; other plugins still load.
#[derive(Debug, Error)]
pub enum PluginLoadError {
    /// The plugin needs a configuration key that is absent.
    #[error("Plugin '{plugin}' requires configuration key '{key}'")]
    MissingSetting {
        /// The plugin that could not be constructed.
        plugin: PluginName,
        /// The missing configuration key.
        key: String,
    },

    /// The plugin's collaborators could not be constructed.
    #[error("Plugin '{plugin}' could not be initialised: {message}")]
    Initialisation {
        /// The plugin that could not be constructed.
        plugin: PluginName,
        /// Description of the failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Alerting and configuration
// ---------------------------------------------------------------------------

/// Errors raised by [`crate::Alerter::alert`].
#[derive(Debug, Error)]
pub enum AlertError {
    /// The publish call to the notification topic failed.
    #[error("Failed to publish alert to {topic}")]
    Publish {
        /// The topic the alert was addressed to.
        topic: TopicArn,
        /// The underlying publisher error.
        #[source]
        source: BoxError,
    },
}

/// Errors raised while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A recognised key is present but empty.
    #[error("Configuration key '{key}' must not be empty")]
    EmptyValue {
        /// The offending key.
        key: String,
    },

    /// Alerting was enabled without saying which region the topic lives in.
    #[error("'alert_sns_region' is required when 'alert_sns_topic_arn' is set")]
    MissingAlertRegion,
}
