//! Invocation configuration.
//!
//! [`RawConfig`] mirrors the keys of the YAML configuration file one-to-one
//! and is what the `cli` crate deserialises. [`Config`] is the validated,
//! immutable form that every component receives by reference. Loading the
//! file itself is I/O and lives in `cli`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AwsRegion, ConfigError, PluginName, TopicArn};

/// GitHub REST API root used when `github_api_url` is not configured.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// The configuration file exactly as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    /// SNS topic for failure alerts. Presence enables alerting.
    #[serde(default)]
    pub alert_sns_topic_arn: Option<String>,

    /// Region of the alert topic. Required when the topic is set.
    #[serde(default)]
    pub alert_sns_region: Option<String>,

    /// Token used by plugins that call the GitHub API.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Override for the GitHub REST API root (GitHub Enterprise, tests).
    #[serde(default)]
    pub github_api_url: Option<String>,

    /// Plugins to load, in order. `None` loads the whole catalogue.
    #[serde(default)]
    pub plugins: Option<Vec<String>>,

    /// Per-plugin settings keyed by plugin name.
    #[serde(default)]
    pub plugin_settings: BTreeMap<String, Map<String, Value>>,

    /// Any other keys, kept for plugins that read their own top-level settings.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Where failure alerts are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTarget {
    /// The SNS topic ARN.
    pub topic_arn: TopicArn,
    /// The region hosting the topic.
    pub region: AwsRegion,
}

/// A GitHub API token. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubToken(String);

impl GitHubToken {
    /// Wraps a token, returning `None` if it is empty.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for GitHubToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GitHubToken(***)")
    }
}

/// Validated configuration for one invocation.
///
/// Constructed once and never mutated. Every plugin and the alerter receive it
/// by reference.
#[derive(Debug, Clone, Default)]
pub struct Config {
    alert_target: Option<AlertTarget>,
    github_token: Option<GitHubToken>,
    github_api_url: Option<String>,
    plugins: Option<Vec<PluginName>>,
    plugin_settings: BTreeMap<String, Map<String, Value>>,
    extra: BTreeMap<String, Value>,
}

impl Config {
    /// Validates a [`RawConfig`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingAlertRegion`] when a topic is configured without a region.
    /// - [`ConfigError::EmptyValue`] when a recognised key is present but empty.
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let alert_target = match (raw.alert_sns_topic_arn, raw.alert_sns_region) {
            (None, _) => None,
            (Some(_), None) => return Err(ConfigError::MissingAlertRegion),
            (Some(topic), Some(region)) => Some(AlertTarget {
                topic_arn: TopicArn::new(topic).ok_or_else(|| empty("alert_sns_topic_arn"))?,
                region: AwsRegion::new(region).ok_or_else(|| empty("alert_sns_region"))?,
            }),
        };

        let github_token = raw
            .github_token
            .map(|t| GitHubToken::new(t).ok_or_else(|| empty("github_token")))
            .transpose()?;

        let github_api_url = raw
            .github_api_url
            .map(|url| {
                let url = url.trim_end_matches('/').to_string();
                if url.is_empty() {
                    Err(empty("github_api_url"))
                } else {
                    Ok(url)
                }
            })
            .transpose()?;

        let plugins = raw
            .plugins
            .map(|names| {
                names
                    .into_iter()
                    .map(|n| PluginName::new(n).ok_or_else(|| empty("plugins")))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Self {
            alert_target,
            github_token,
            github_api_url,
            plugins,
            plugin_settings: raw.plugin_settings,
            extra: raw.extra,
        })
    }

    /// The alert destination, or `None` when alerting is disabled.
    pub fn alert_target(&self) -> Option<&AlertTarget> {
        self.alert_target.as_ref()
    }

    /// The GitHub API token, if configured.
    pub fn github_token(&self) -> Option<&GitHubToken> {
        self.github_token.as_ref()
    }

    /// The GitHub REST API root, without a trailing slash.
    pub fn github_api_url(&self) -> &str {
        self.github_api_url
            .as_deref()
            .unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    /// The explicit plugin selection, if any.
    pub fn plugin_selection(&self) -> Option<&[PluginName]> {
        self.plugins.as_deref()
    }

    /// Settings for one plugin, if any were configured.
    pub fn plugin_settings(&self, plugin: &PluginName) -> Option<&Map<String, Value>> {
        self.plugin_settings.get(plugin.as_str())
    }

    /// Whether a plugin is enabled. Plugins are enabled unless their settings
    /// contain `enabled: false`.
    pub fn plugin_enabled(&self, plugin: &PluginName) -> bool {
        self.plugin_settings(plugin)
            .and_then(|s| s.get("enabled"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// An unrecognised top-level key.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

fn empty(key: &str) -> ConfigError {
    ConfigError::EmptyValue {
        key: key.to_string(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
