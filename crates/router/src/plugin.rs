//! The plugin contract and the registry that loads plugins.
//!
//! A plugin is a predicate over a webhook plus an action to take when the
//! predicate holds. Plugins are listed in a static catalogue of
//! [`PluginRegistration`]s; [`PluginRegistry::load`] turns the catalogue and
//! the configuration into the ordered set of plugins for one invocation.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{Config, PluginActionError, PluginLoadError, PluginName, WebhookPayload};

/// A policy that reacts to one category of GitHub webhook.
///
/// Implementations are stateless across invocations and immutable once loaded.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The catalogue name of this plugin.
    fn name(&self) -> &PluginName;

    /// Returns `true` if this plugin should act on `payload`.
    ///
    /// Must not perform I/O.
    fn is_matching(&self, config: &Config, payload: &WebhookPayload) -> bool;

    /// Performs the plugin's side effect.
    ///
    /// Expected error responses from external services should be logged and
    /// absorbed; return an error only for conditions the plugin cannot handle.
    async fn act(&self, config: &Config, payload: &WebhookPayload)
        -> Result<(), PluginActionError>;
}

/// Builds a plugin from configuration.
pub type PluginFactory = fn(&Config) -> Result<Box<dyn Plugin>, PluginLoadError>;

/// One catalogue entry.
#[derive(Clone)]
pub struct PluginRegistration {
    /// The name used in the `plugins` configuration list.
    pub name: &'static str,
    /// Constructs the plugin.
    pub factory: PluginFactory,
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The ordered set of plugins loaded for an invocation.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    /// Loads plugins from `catalogue`.
    ///
    /// Candidates are the names in [`Config::plugin_selection`] in the order
    /// given, or the whole catalogue in catalogue order when no selection is
    /// configured. For each candidate:
    ///
    /// - a name with no catalogue entry is skipped with a warning;
    /// - a plugin disabled through `plugin_settings.<name>.enabled: false` is
    ///   skipped;
    /// - a factory failure is logged and the plugin skipped.
    ///
    /// Never fails. Each name is loaded at most once.
    pub fn load(catalogue: &[PluginRegistration], config: &Config) -> Self {
        let candidates: Vec<&str> = match config.plugin_selection() {
            Some(selection) => selection.iter().map(PluginName::as_str).collect(),
            None => catalogue.iter().map(|r| r.name).collect(),
        };

        let mut plugins: Vec<Box<dyn Plugin>> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if plugins.iter().any(|p| p.name().as_str() == candidate) {
                continue;
            }

            let Some(registration) = catalogue.iter().find(|r| r.name == candidate) else {
                warn!(plugin = candidate, "No plugin with this name is registered; skipping");
                continue;
            };

            let Some(name) = PluginName::new(registration.name) else {
                warn!("Catalogue contains a plugin with an empty name; skipping");
                continue;
            };

            if !config.plugin_enabled(&name) {
                info!(plugin = %name, "Plugin disabled by configuration");
                continue;
            }

            match (registration.factory)(config) {
                Ok(plugin) => plugins.push(plugin),
                Err(error) => {
                    warn!(plugin = %name, error = %error, "Plugin failed to load; skipping");
                }
            }
        }

        info!(
            count = plugins.len(),
            plugins = ?plugins.iter().map(|p| p.name().as_str()).collect::<Vec<_>>(),
            "Plugins loaded"
        );
        Self { plugins }
    }

    /// Builds a registry from already-constructed plugins, keeping their order.
    pub fn from_plugins(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    /// Iterates the plugins in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    /// Names of the loaded plugins, in registry order.
    pub fn names(&self) -> Vec<&PluginName> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugin loaded.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
