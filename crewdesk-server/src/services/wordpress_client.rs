//! WordPress directory client
//!
//! Reads the user directory through the WordPress REST API
//! (`/wp-json/wp/v2/users`) with HTTP Basic auth using an application
//! password. `context=edit` is required for the API to include emails.
//!
//! Fetching never touches the worker store; see `reconcile` for that.

use crewdesk_common::DirectoryMember;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{build_http_client, describe_failure};
use crate::config::DirectorySettings;

const USERS_PER_PAGE: usize = 100;
const MAX_USER_PAGES: u32 = 100;
const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// Directory client errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{0}")]
    Configuration(String),

    #[error("Could not connect to WordPress: {0}")]
    Connectivity(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Unexpected WordPress response: {0}")]
    Parse(String),
}

/// User record as returned by `/wp/v2/users?context=edit`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryUser {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl DirectoryUser {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.to_lowercase() == role.to_lowercase())
    }

    /// `None` when the user has no email (cannot be keyed)
    fn to_member(&self) -> Option<DirectoryMember> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let name = if self.name.trim().is_empty() {
            self.username.clone()
        } else {
            self.name.clone()
        };
        Some(DirectoryMember {
            name,
            email: email.to_string(),
            foreign_id: self.id.to_string(),
        })
    }
}

pub struct DirectoryClient {
    http_client: reqwest::Client,
    settings: DirectorySettings,
}

impl DirectoryClient {
    pub fn new(settings: DirectorySettings, timeout: Duration) -> Result<Self, DirectoryError> {
        let http_client = build_http_client(timeout)
            .map_err(|e| DirectoryError::Configuration(e.to_string()))?;
        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn settings(&self) -> &DirectorySettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.settings.has_credentials()
    }

    /// Users holding the configured role (or its alias)
    ///
    /// Asks the server to filter by role first. Some sites do not honour
    /// the `roles` parameter for custom roles, so an empty answer falls back
    /// to listing every user and filtering here.
    pub async fn fetch_role_users(&self) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let role = self.settings.role.as_str();
        let users = self
            .get_users(&[("roles", role), ("context", "edit")])
            .await?;
        if !users.is_empty() {
            debug!(role = %role, count = users.len(), "Directory role query matched");
            return Ok(users);
        }

        debug!(role = %role, "Role query empty, falling back to full user list");
        let all = self.get_users(&[("context", "edit")]).await?;
        Ok(filter_by_role(all, role, self.settings.role_alias.as_deref()))
    }

    /// Directory members eligible to be workers
    pub async fn fetch_directory_members(&self) -> Result<Vec<DirectoryMember>, DirectoryError> {
        let users = self.fetch_role_users().await?;
        let total = users.len();
        let members: Vec<DirectoryMember> = users.iter().filter_map(DirectoryUser::to_member).collect();

        if members.len() < total {
            warn!(
                skipped = total - members.len(),
                "Directory users without email were skipped"
            );
        }

        if members.is_empty() {
            return Err(DirectoryError::EmptyResult(format!(
                "No employees found with \"{}\" role in WordPress. Please check that users have the correct role assigned.",
                self.settings.role
            )));
        }

        info!(count = members.len(), "Fetched directory members");
        Ok(members)
    }

    /// Authenticated request against `/users/me`
    pub async fn test_connection(&self) -> Result<(), DirectoryError> {
        let (username, password) = self.credentials()?;
        let url = format!("{}/users/me", self.api_base());

        let response = self
            .http_client
            .get(&url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| DirectoryError::Connectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DirectoryError::Connectivity(describe_failure(response).await));
        }
        Ok(())
    }

    /// Every page of `/users` for `query`
    ///
    /// Follows `X-WP-TotalPages`. Without that header, paging stops at the
    /// first page holding fewer than `per_page` users. A partial listing is
    /// an error, never a shorter result.
    async fn get_users(&self, query: &[(&str, &str)]) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let mut users = Vec::new();
        let mut page = 1;

        loop {
            let (batch, total_pages) = self.get_users_page(query, page).await?;
            let batch_len = batch.len();
            users.extend(batch);

            let more = match total_pages {
                Some(total) => page < total,
                None => batch_len >= USERS_PER_PAGE,
            };
            if !more || batch_len == 0 {
                break;
            }
            if page >= MAX_USER_PAGES {
                return Err(DirectoryError::Parse(format!(
                    "user listing exceeds {} pages",
                    MAX_USER_PAGES
                )));
            }
            page += 1;
        }

        Ok(users)
    }

    async fn get_users_page(
        &self,
        query: &[(&str, &str)],
        page: u32,
    ) -> Result<(Vec<DirectoryUser>, Option<u32>), DirectoryError> {
        let (username, password) = self.credentials()?;
        let url = format!("{}/users", self.api_base());

        debug!(url = %url, page, "Querying WordPress users");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("per_page", USERS_PER_PAGE), ("page", page as usize)])
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| DirectoryError::Connectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DirectoryError::Connectivity(describe_failure(response).await));
        }

        let total_pages = response
            .headers()
            .get(TOTAL_PAGES_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());

        let users = response
            .json::<Vec<DirectoryUser>>()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))?;
        Ok((users, total_pages))
    }

    fn credentials(&self) -> Result<(&str, &str), DirectoryError> {
        match (&self.settings.username, &self.settings.app_password) {
            (Some(user), Some(password)) => Ok((user.as_str(), password.as_str())),
            _ => Err(DirectoryError::Configuration(
                "WordPress credentials not configured. Set WORDPRESS_USERNAME and WORDPRESS_APP_PASSWORD in the environment or the [directory] section of the config file.".to_string(),
            )),
        }
    }

    fn api_base(&self) -> String {
        format!("{}/wp-json/wp/v2", self.settings.url.trim_end_matches('/'))
    }
}

/// Keep users holding `role` or `alias`, case-insensitively
fn filter_by_role(users: Vec<DirectoryUser>, role: &str, alias: Option<&str>) -> Vec<DirectoryUser> {
    users
        .into_iter()
        .filter(|u| u.has_role(role) || alias.map_or(false, |a| u.has_role(a)))
        .collect()
}
