//! Routes one envelope to the matching plugins.

use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
    classify, ClassifiedEvent, Config, EventSource, PluginFailure, PluginName, PluginRegistry,
    RouterError,
};

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The envelope was not an SNS notification, so no plugin was consulted.
    Unrouted(EventSource),
    /// The webhook was offered to every plugin; `matched` lists the plugins
    /// that acted, in registry order.
    Routed {
        /// Plugins whose predicate held and whose action succeeded.
        matched: Vec<PluginName>,
    },
}

/// Classifies envelopes, unwraps webhooks and invokes matching plugins.
pub struct Dispatcher<'a> {
    config: &'a Config,
    registry: &'a PluginRegistry,
}

impl<'a> Dispatcher<'a> {
    /// Creates a dispatcher over a loaded registry.
    pub fn new(config: &'a Config, registry: &'a PluginRegistry) -> Self {
        Self { config, registry }
    }

    /// Dispatches one envelope.
    ///
    /// Envelopes that are not SNS notifications are logged and produce
    /// [`DispatchOutcome::Unrouted`]. Every plugin whose predicate holds is
    /// acted on in registry order; one plugin's failure does not stop the
    /// others.
    ///
    /// # Errors
    ///
    /// - [`RouterError::MalformedPayload`] if the webhook cannot be unwrapped.
    /// - [`RouterError::PluginActions`] if any matching plugin failed, after
    ///   all of them have run.
    #[instrument(skip_all, fields(source = tracing::field::Empty))]
    pub async fn dispatch(&self, envelope: &Value) -> Result<DispatchOutcome, RouterError> {
        let classified = classify(envelope);
        let source = classified.source();
        tracing::Span::current().record("source", tracing::field::display(source));

        let ClassifiedEvent::PubSubRecord(record) = classified else {
            error!(%source, %envelope, "Unable to determine message type from event");
            return Ok(DispatchOutcome::Unrouted(source));
        };

        let payload = record.webhook_payload()?;
        debug!(
            message_id = record.message_id.as_deref().unwrap_or("-"),
            action = payload.action().unwrap_or("-"),
            "Unwrapped GitHub webhook"
        );

        let mut matched = Vec::new();
        let mut failures = Vec::new();
        for plugin in self.registry.iter() {
            if !plugin.is_matching(self.config, &payload) {
                continue;
            }

            info!(plugin = %plugin.name(), "Plugin matched webhook");
            match plugin.act(self.config, &payload).await {
                Ok(()) => matched.push(plugin.name().clone()),
                Err(error) => {
                    error!(plugin = %plugin.name(), error = %error, "Plugin action failed");
                    failures.push(PluginFailure {
                        plugin: plugin.name().clone(),
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(RouterError::PluginActions { failures });
        }
        Ok(DispatchOutcome::Routed { matched })
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
