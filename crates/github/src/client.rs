//! Collaborator permission port and its REST implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};
use router::{GitHubToken, Login};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GitHubError, Permission};

/// `User-Agent` sent with every request; GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("github-org-manager/", env!("CARGO_PKG_VERSION"));

const API_VERSION: &str = "2022-11-28";

/// Reads and writes repository collaborator permissions.
#[async_trait]
pub trait CollaboratorPermissions: Send + Sync {
    /// The permission `user` currently holds on `owner/repo`.
    async fn permission(
        &self,
        owner: &str,
        repo: &str,
        user: &Login,
    ) -> Result<Permission, GitHubError>;

    /// Adds `user` as a collaborator on `owner/repo` with `permission`, or
    /// updates the permission of an existing collaborator.
    async fn set_permission(
        &self,
        owner: &str,
        repo: &str,
        user: &Login,
        permission: Permission,
    ) -> Result<(), GitHubError>;
}

#[derive(Deserialize)]
struct PermissionResponse {
    permission: Permission,
}

#[derive(Serialize)]
struct SetPermissionRequest {
    permission: Permission,
}

/// [`CollaboratorPermissions`] over the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: GitHubToken,
}

impl GitHubClient {
    /// Creates a client for the API rooted at `base_url`
    /// (e.g. `https://api.github.com`).
    ///
    /// # Errors
    ///
    /// [`GitHubError::Configuration`] if the HTTP client cannot be built.
    pub fn new(token: GitHubToken, base_url: impl Into<String>) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| GitHubError::Configuration {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-2xx response into [`GitHubError::UnexpectedStatus`].
async fn ensure_success(
    method: &'static str,
    path: &str,
    response: Response,
) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GitHubError::UnexpectedStatus {
        method,
        path: path.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CollaboratorPermissions for GitHubClient {
    async fn permission(
        &self,
        owner: &str,
        repo: &str,
        user: &Login,
    ) -> Result<Permission, GitHubError> {
        let path = format!("/repos/{owner}/{repo}/collaborators/{user}/permission");
        let response = self
            .http
            .get(self.url(&path))
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(|source| GitHubError::Transport {
                method: "GET",
                path: path.clone(),
                source,
            })?;
        let response = ensure_success("GET", &path, response).await?;

        let body: PermissionResponse = response
            .json()
            .await
            .map_err(|source| GitHubError::Decode {
                path: path.clone(),
                source,
            })?;
        debug!(%path, permission = %body.permission, "Fetched collaborator permission");
        Ok(body.permission)
    }

    async fn set_permission(
        &self,
        owner: &str,
        repo: &str,
        user: &Login,
        permission: Permission,
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{owner}/{repo}/collaborators/{user}");
        let response = self
            .http
            .put(self.url(&path))
            .bearer_auth(self.token.expose())
            .json(&SetPermissionRequest { permission })
            .send()
            .await
            .map_err(|source| GitHubError::Transport {
                method: "PUT",
                path: path.clone(),
                source,
            })?;
        let response = ensure_success("PUT", &path, response).await?;

        // 201 sends an invitation, 204 updates an existing collaborator.
        debug!(
            %path,
            %permission,
            invited = response.status() == StatusCode::CREATED,
            "Set collaborator permission"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
