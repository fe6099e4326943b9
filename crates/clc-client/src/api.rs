//! Client for the provider's v2 REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use clc_core::config::ApiConfig;
use clc_core::error::{AppError, ErrorKind};
use clc_core::result::AppResult;
use clc_entity::group::GroupNode;

use crate::source::GroupSource;
use crate::wire::{ApiGroup, Datacenter, LoginRequest, LoginResponse};

/// Bearer token and account alias obtained from a login.
#[derive(Debug, Clone)]
struct Session {
    account_alias: String,
    bearer_token: String,
}

/// Provider API client.
///
/// Logs in lazily on the first request and reuses the bearer token
/// afterwards. Safe to share between tasks behind an `Arc`.
#[derive(Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
    session: RwLock<Option<Session>>,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: ApiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        let config = ApiConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Authenticate with the configured credentials and keep the token.
    pub async fn login(&self) -> AppResult<()> {
        let mut slot = self.session.write().await;
        *slot = Some(self.authenticate().await?);
        Ok(())
    }

    async fn authenticate(&self) -> AppResult<Session> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            return Err(AppError::authentication(
                "API credentials missing: set api.username and api.password \
                 (or CLC__API__USERNAME / CLC__API__PASSWORD)",
            ));
        };

        tracing::debug!(username = %username, "Logging in to provider API");

        let res = self
            .client
            .post(self.url("v2/authentication/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(request_error)?;

        let login: LoginResponse = decode(res).await?;
        let account_alias = self
            .config
            .account_alias
            .clone()
            .unwrap_or(login.account_alias);

        tracing::info!(account = %account_alias, "Logged in to provider API");

        Ok(Session {
            account_alias,
            bearer_token: login.bearer_token,
        })
    }

    /// Current session, logging in first if there is none.
    ///
    /// The write lock is held across the login so concurrent callers wait
    /// for a single request instead of each authenticating.
    async fn session(&self) -> AppResult<Session> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut slot = self.session.write().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }
        let session = self.authenticate().await?;
        *slot = Some(session.clone());
        Ok(session)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let session = self.session().await?;
        let path = path.replace("{alias}", &session.account_alias);

        tracing::trace!(path = %path, "GET");

        let res = self
            .client
            .get(self.url(&path))
            .bearer_auth(&session.bearer_token)
            .send()
            .await
            .map_err(request_error)?;

        decode(res).await
    }

    /// Billing summary of a group, as returned by the API.
    pub async fn group_billing(&self, group_id: &str) -> AppResult<serde_json::Value> {
        self.get_json(&format!("v2/groups/{{alias}}/{group_id}/billing"))
            .await
    }
}

#[async_trait]
impl GroupSource for ApiClient {
    fn source_type(&self) -> &str {
        "api"
    }

    async fn fetch_group_hierarchy(&self, location: &str) -> AppResult<GroupNode> {
        if location.trim().is_empty() {
            return Err(AppError::validation("Location must not be empty"));
        }

        let dc: Datacenter = self
            .get_json(&format!("v2/datacenters/{{alias}}/{location}?groupLinks=true"))
            .await?;

        let root_id = dc.root_group_id().ok_or_else(|| {
            AppError::not_found(format!("Datacenter '{}' has no root hardware group", dc.id))
        })?;

        let root: ApiGroup = self
            .get_json(&format!("v2/groups/{{alias}}/{root_id}"))
            .await?;
        let root = GroupNode::from(root);

        tracing::debug!(
            datacenter = %dc.id,
            root = %root.id,
            groups = root.group_count(),
            "Fetched group hierarchy"
        );
        Ok(root)
    }
}

fn request_error(err: reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::ExternalService
    };
    AppError::with_source(kind, format!("API request failed: {err}"), err)
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> AppResult<T> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        let message = format!("API returned {status}: {body}");
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::authentication(message),
            StatusCode::NOT_FOUND => AppError::not_found(message),
            _ => AppError::external(message),
        });
    }

    let bytes = res.bytes().await.map_err(request_error)?;
    Ok(serde_json::from_slice(&bytes)?)
}
