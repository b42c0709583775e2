//! The invocation entry point and its error boundary.
//!
//! [`EventHandler::handle`] is what the host calls once per event. It runs the
//! [`Dispatcher`]; if dispatch fails it always attempts an alert before handing
//! the original error back, so the failure is visible both on the alert topic
//! and in the host's record of failed invocations.

use std::error::Error as _;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    AlertPublisher, Alerter, Config, DispatchOutcome, Dispatcher, PluginRegistry,
    RouterError,
};

/// Per-invocation metadata supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Correlates every log line and alert from one invocation.
    pub invocation_id: Uuid,
    /// Where the host writes this invocation's logs, quoted in alerts.
    pub log_stream_name: Option<String>,
    /// When the invocation started.
    pub received_at: DateTime<Utc>,
}

impl InvocationContext {
    /// Creates a context with a fresh random invocation id, stamped now.
    pub fn new(log_stream_name: Option<String>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            log_stream_name,
            received_at: Utc::now(),
        }
    }

    /// Replaces the invocation id, e.g. with the host's request id.
    pub fn with_invocation_id(mut self, invocation_id: Uuid) -> Self {
        self.invocation_id = invocation_id;
        self
    }
}

/// Handles invocations against one configuration and plugin set.
pub struct EventHandler<'a> {
    config: &'a Config,
    registry: &'a PluginRegistry,
    publisher: &'a dyn AlertPublisher,
}

impl<'a> EventHandler<'a> {
    /// Creates a handler. The configuration and registry are loaded once by
    /// the caller and shared by every invocation.
    pub fn new(
        config: &'a Config,
        registry: &'a PluginRegistry,
        publisher: &'a dyn AlertPublisher,
    ) -> Self {
        Self {
            config,
            registry,
            publisher,
        }
    }

    /// Handles one envelope.
    ///
    /// # Errors
    ///
    /// Returns the dispatch error unchanged after attempting exactly one
    /// alert. A failure to publish the alert is logged and does not replace
    /// the dispatch error.
    #[instrument(skip_all, fields(invocation_id = %context.invocation_id))]
    pub async fn handle(
        &self,
        envelope: &Value,
        context: &InvocationContext,
    ) -> Result<DispatchOutcome, RouterError> {
        let dispatcher = Dispatcher::new(self.config, self.registry);
        let err = match dispatcher.dispatch(envelope).await {
            Ok(outcome) => {
                info!(?outcome, "Event handled");
                return Ok(outcome);
            }
            Err(err) => err,
        };

        error!(kind = err.kind(), error = %err, "Event handling failed");
        let alerter = Alerter::new(self.config, envelope, context, self.publisher);
        // A failed alert is logged only; the host must still see the dispatch error.
        if let Err(alert_err) = alerter.alert(&failure_report(&err)).await {
            let cause = alert_err
                .source()
                .map(ToString::to_string)
                .unwrap_or_default();
            error!(error = %alert_err, %cause, "Failed to publish failure alert");
        }
        Err(err)
    }
}

/// Formats an error as alert text: kind, message, then every cause.
///
/// The cause chain is the trace: each plugin failure is listed with its own
/// chain, followed by the chain of `err` itself.
pub fn failure_report(err: &RouterError) -> String {
    let mut report = format!("Uncaught error\n{}\n{}", err.kind(), err);

    if let RouterError::PluginActions { failures } = err {
        for failure in failures {
            let _ = write!(report, "\n- {failure}");
            push_causes(&mut report, failure.error.source());
        }
    }
    push_causes(&mut report, err.source());
    report
}

fn push_causes(report: &mut String, mut cause: Option<&(dyn std::error::Error + 'static)>) {
    while let Some(err) = cause {
        let _ = write!(report, "\n  caused by: {err}");
        cause = err.source();
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
