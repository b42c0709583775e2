//! Newtype domain identifiers.
//!
//! Every named thing the router passes around is a distinct newtype wrapping a
//! `String`. This prevents accidentally interchanging, for example, a
//! [`TopicArn`] with an [`AwsRegion`] even though both are strings underneath.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies a plugin in the catalogue and in the `plugins` configuration list.
    ///
    /// Names are snake_case and unique within a catalogue
    /// (e.g. `"grant_transferred_repo_admin_permissions"`).
    PluginName
}

string_id! {
    /// The ARN of the SNS topic that receives failure alerts.
    TopicArn
}

string_id! {
    /// An AWS region name (e.g. `"us-west-2"`).
    AwsRegion
}

string_id! {
    /// A GitHub user or organisation login.
    Login
}

string_id! {
    /// Identifies a GitHub repository in `"owner/repo"` format.
    RepositoryFullName
}

impl RepositoryFullName {
    /// Splits the name into its `(owner, repo)` parts.
    ///
    /// Returns `None` when the value does not contain exactly one `/` with
    /// non-empty text on both sides.
    pub fn split(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.0.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner, repo))
    }
}

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;
