use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;
use crate::test_support::{failing_factory, ActionLog, RecordingPlugin};
use crate::RawConfig;

fn alpha(_config: &Config) -> Result<Box<dyn Plugin>, PluginLoadError> {
    let log: ActionLog = Arc::new(Mutex::new(Vec::new()));
    Ok(Box::new(RecordingPlugin::new("alpha", "added", &log)))
}

fn beta(_config: &Config) -> Result<Box<dyn Plugin>, PluginLoadError> {
    let log: ActionLog = Arc::new(Mutex::new(Vec::new()));
    Ok(Box::new(RecordingPlugin::new("beta", "removed", &log)))
}

fn catalogue() -> Vec<PluginRegistration> {
    vec![
        PluginRegistration {
            name: "alpha",
            factory: alpha,
        },
        PluginRegistration {
            name: "needs_token",
            factory: failing_factory,
        },
        PluginRegistration {
            name: "beta",
            factory: beta,
        },
    ]
}

fn config_from(value: serde_json::Value) -> Config {
    let raw: RawConfig = serde_json::from_value(value).unwrap();
    Config::from_raw(raw).unwrap()
}

fn loaded_names(registry: &PluginRegistry) -> Vec<String> {
    registry.names().iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_load_whole_catalogue_skips_failing_factory() {
    let registry = PluginRegistry::load(&catalogue(), &Config::default());
    assert_eq!(loaded_names(&registry), vec!["alpha", "beta"]);
}

#[test]
fn test_load_is_deterministic() {
    let config = Config::default();
    let first = loaded_names(&PluginRegistry::load(&catalogue(), &config));
    let second = loaded_names(&PluginRegistry::load(&catalogue(), &config));
    assert_eq!(first, second);
}

#[test]
fn test_selection_controls_order_and_excludes_unknown_names() {
    let config = config_from(json!({ "plugins": ["beta", "not_a_plugin", "alpha", "beta"] }));
    let registry = PluginRegistry::load(&catalogue(), &config);
    assert_eq!(loaded_names(&registry), vec!["beta", "alpha"]);
}

#[test]
fn test_disabled_plugin_is_not_loaded() {
    let config = config_from(json!({ "plugin_settings": { "alpha": { "enabled": false } } }));
    let registry = PluginRegistry::load(&catalogue(), &config);
    assert_eq!(loaded_names(&registry), vec!["beta"]);
}

#[test]
fn test_empty_catalogue_loads_nothing() {
    let registry = PluginRegistry::load(&[], &Config::default());
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_from_plugins_keeps_order() {
    let log: ActionLog = Arc::new(Mutex::new(Vec::new()));
    let registry = PluginRegistry::from_plugins(vec![
        Box::new(RecordingPlugin::new("second", "x", &log)),
        Box::new(RecordingPlugin::new("first", "x", &log)),
    ]);
    assert_eq!(loaded_names(&registry), vec!["second", "first"]);
}
