//! Repository permission levels.

use serde::{Deserialize, Serialize};

/// A collaborator's permission on a repository, as reported in the
/// `permission` field of the collaborator-permission endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Admin,
    Maintain,
    Write,
    Triage,
    Read,
    /// The user has no access.
    None,
    /// A level this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Permission {
    /// The wire spelling (`"admin"`, `"write"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Maintain => "maintain",
            Self::Write => "write",
            Self::Triage => "triage",
            Self::Read => "read",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
