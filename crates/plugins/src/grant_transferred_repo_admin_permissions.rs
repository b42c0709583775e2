//! Restores admin rights to users who transfer a repository into the
//! organisation.
//!
//! When a user transfers a personal repository into the organisation, GitHub
//! emits a MemberEvent (`action: "added"`) in which the user adds themselves
//! as a collaborator, and they end up with `write` rather than `admin` on the
//! repository they just moved. This plugin spots that self-add and raises the
//! collaborator to `admin`.
//!
//! The same webhook is produced when an org owner adds themselves as a
//! collaborator to an existing repository, so that owner is raised to `admin`
//! too. GitHub does not let a repo admin demote themselves; a different admin
//! has to do it if that was not wanted.

use std::sync::Arc;

use async_trait::async_trait;
use github::{CollaboratorPermissions, GitHubClient, GitHubError, Permission};
use router::{
    Config, Login, Plugin, PluginActionError, PluginLoadError, PluginName, WebhookPayload,
};
use tracing::{error, info, instrument};

/// Catalogue name of this plugin.
pub const NAME: &str = "grant_transferred_repo_admin_permissions";

/// The plugin. See the module documentation.
pub struct GrantTransferredRepoAdminPermissions {
    name: PluginName,
    github: Arc<dyn CollaboratorPermissions>,
}

impl GrantTransferredRepoAdminPermissions {
    /// Creates the plugin over any [`CollaboratorPermissions`] implementation.
    pub fn new(github: Arc<dyn CollaboratorPermissions>) -> Self {
        Self {
            name: plugin_name(),
            github,
        }
    }
}

fn plugin_name() -> PluginName {
    PluginName::new(NAME).unwrap_or_else(|| unreachable!("NAME is a non-empty literal"))
}

/// Catalogue factory. Requires `github_token`; honours `github_api_url`.
pub fn load(config: &Config) -> Result<Box<dyn Plugin>, PluginLoadError> {
    let token = config
        .github_token()
        .cloned()
        .ok_or_else(|| PluginLoadError::MissingSetting {
            plugin: plugin_name(),
            key: "github_token".to_string(),
        })?;

    let client = GitHubClient::new(token, config.github_api_url()).map_err(|e| {
        PluginLoadError::Initialisation {
            plugin: plugin_name(),
            message: e.to_string(),
        }
    })?;

    Ok(Box::new(GrantTransferredRepoAdminPermissions::new(
        Arc::new(client),
    )))
}

/// The fields of a MemberEvent this plugin needs.
struct MemberAdded<'a> {
    full_name: &'a str,
    owner: &'a str,
    repo: &'a str,
    user: Login,
}

impl<'a> MemberAdded<'a> {
    fn from_payload(payload: &'a WebhookPayload) -> Result<Self, PluginActionError> {
        let field = |pointer: &str| {
            payload
                .str_at(pointer)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| PluginActionError::MissingField {
                    field: pointer.to_string(),
                })
        };

        let user = Login::new(field("/member/login")?).ok_or_else(|| {
            PluginActionError::MissingField {
                field: "/member/login".to_string(),
            }
        })?;

        Ok(Self {
            full_name: field("/repository/full_name")?,
            owner: field("/repository/owner/login")?,
            repo: field("/repository/name")?,
            user,
        })
    }
}

/// Logs an API error response and abandons the action; anything else
/// propagates.
fn absorb_status_error(error: GitHubError) -> Result<(), PluginActionError> {
    match error {
        GitHubError::UnexpectedStatus { .. } => {
            error!(error = %error, "Unexpected GitHub API response; no action taken");
            Ok(())
        }
        other => Err(PluginActionError::ExternalService {
            service: "GitHub".to_string(),
            source: Box::new(other),
        }),
    }
}

#[async_trait]
impl Plugin for GrantTransferredRepoAdminPermissions {
    fn name(&self) -> &PluginName {
        &self.name
    }

    fn is_matching(&self, _config: &Config, payload: &WebhookPayload) -> bool {
        if payload.action() != Some("added") || payload.get("repository").is_none() {
            return false;
        }

        let (Some(member), Some(sender)) = (
            payload.str_at("/member/login"),
            payload.str_at("/sender/login"),
        ) else {
            return false;
        };
        if member != sender {
            return false;
        }

        info!(
            login = member,
            repo = payload.str_at("/repository/full_name").unwrap_or("-"),
            "MemberEvent where the sender added themselves: either a repo newly \
             transferred into the organisation or an org owner adding themselves \
             as a collaborator"
        );
        true
    }

    #[instrument(skip_all, fields(plugin = NAME))]
    async fn act(
        &self,
        _config: &Config,
        payload: &WebhookPayload,
    ) -> Result<(), PluginActionError> {
        let event = MemberAdded::from_payload(payload)?;

        let old_permission = match self
            .github
            .permission(event.owner, event.repo, &event.user)
            .await
        {
            Ok(permission) => permission,
            Err(e) => return absorb_status_error(e),
        };

        if old_permission == Permission::Admin {
            info!(
                user = %event.user,
                repo = event.full_name,
                permission = %old_permission,
                "User already has admin permission in the repo; no action taken"
            );
            return Ok(());
        }

        if let Err(e) = self
            .github
            .set_permission(event.owner, event.repo, &event.user, Permission::Admin)
            .await
        {
            return absorb_status_error(e);
        }

        let new_permission = match self
            .github
            .permission(event.owner, event.repo, &event.user)
            .await
        {
            Ok(permission) => permission,
            Err(e) => return absorb_status_error(e),
        };

        info!(
            user = %event.user,
            repo = event.full_name,
            old = %old_permission,
            new = %new_permission,
            "User permissions in the repo have been changed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "grant_transferred_repo_admin_permissions_tests.rs"]
mod tests;
