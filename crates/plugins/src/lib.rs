//! Built-in GitHub Org Manager plugins.
//!
//! Each plugin lives in its own module and exposes a `load` factory matching
//! [`router::PluginFactory`]. [`catalogue`] lists them in the order they are
//! offered webhooks when the configuration does not select plugins
//! explicitly.
//!
//! ## Adding a plugin
//!
//! 1. Add a module implementing [`router::Plugin`] with a `NAME` constant and
//!    a `load(&Config)` factory.
//! 2. Append a [`PluginRegistration`] to [`CATALOGUE`].

pub mod grant_transferred_repo_admin_permissions;

use router::PluginRegistration;

/// Every built-in plugin, in default dispatch order.
pub static CATALOGUE: &[PluginRegistration] = &[PluginRegistration {
    name: grant_transferred_repo_admin_permissions::NAME,
    factory: grant_transferred_repo_admin_permissions::load,
}];

/// The built-in catalogue.
pub fn catalogue() -> &'static [PluginRegistration] {
    CATALOGUE
}
