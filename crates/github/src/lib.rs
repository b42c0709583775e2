//! GitHub Org Manager GitHub infrastructure adapter.
//!
//! Defines the [`CollaboratorPermissions`] port used by plugins that change
//! repository access, and [`GitHubClient`], its implementation over the GitHub
//! REST API using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain policy rules. It knows how
//! to read and write a collaborator's permission; deciding *whether* to do so
//! is up to the plugins.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`CollaboratorPermissions::permission`] | `GET /repos/{owner}/{repo}/collaborators/{user}/permission` |
//! | [`CollaboratorPermissions::set_permission`] | `PUT /repos/{owner}/{repo}/collaborators/{user}` |

pub mod client;
pub mod errors;
pub mod permission;

pub use client::{CollaboratorPermissions, GitHubClient, USER_AGENT};
pub use errors::GitHubError;
pub use permission::Permission;
