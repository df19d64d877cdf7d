//! # Remote API client
//!
//! [`ApiClient`] implements [`RemoteApi`] over HTTPS with `reqwest`. Every request carries the
//! bearer token from [`Credentials`]; JSON bodies are camelCase.
//!
//! Status mapping: 401/403 → [`RemoteError::Unauthorized`], 404 → [`RemoteError::NotFound`]
//! (or `Ok(None)` for a site lookup by name), 409 → [`RemoteError::Conflict`], anything else
//! non-2xx → [`RemoteError::Status`] carrying the server's message or the canonical reason.

use async_trait::async_trait;
use pagedrop_core::contract::{
    DeleteReceipt, Identity, RemoteApi, Site, SiteStatus, SyncRequest, SyncResponse,
};
use pagedrop_core::RemoteError;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::Credentials;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSiteRequest<'a> {
    project_name: &'a str,
    overwrite: bool,
}

/// Error payloads the API may send: `{"error": "..."}` or `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Initialised API client");
        Self {
            http: Client::new(),
            base_url,
            credentials,
        }
    }

    /// Base URL joined with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RemoteError::Transport(format!("invalid API URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("invalid API URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.credentials.token())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder.send().await.map_err(|e| {
            error!(error = ?e, "Request to remote API failed");
            RemoteError::Transport(e.to_string())
        })?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Remote API responded");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        response.json::<T>().await.map_err(|e| {
            error!(error = ?e, "Failed to decode remote API response");
            RemoteError::Decode(e.to_string())
        })
    }
}

fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = server_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    });
    match status.as_u16() {
        401 | 403 => RemoteError::Unauthorized(message),
        404 => RemoteError::NotFound(message),
        409 => RemoteError::Conflict(message),
        code => RemoteError::Status {
            status: code,
            message,
        },
    }
}

fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.or(parsed.message),
        Err(_) => Some(body.to_string()),
    }
}

#[async_trait]
impl RemoteApi for ApiClient {
    async fn whoami(&self) -> Result<Identity, RemoteError> {
        let url = self.endpoint(&["api", "auth", "me"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Self::decode(response).await
    }

    async fn create_site(&self, project_name: &str, overwrite: bool) -> Result<Site, RemoteError> {
        info!(project = project_name, overwrite, "Creating site");
        let url = self.endpoint(&["api", "sites"])?;
        let body = CreateSiteRequest {
            project_name,
            overwrite,
        };
        let response = self
            .send(self.request(Method::POST, url).json(&body))
            .await?;
        Self::decode(response).await
    }

    async fn get_site_by_name(&self, project_name: &str) -> Result<Option<Site>, RemoteError> {
        let url = self.endpoint(&["api", "sites", "by-name", project_name])?;
        match self.send(self.request(Method::GET, url)).await {
            Ok(response) => Self::decode(response).await.map(Some),
            Err(RemoteError::NotFound(_)) => {
                debug!(project = project_name, "No site with this name");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_sites(&self) -> Result<Vec<Site>, RemoteError> {
        let url = self.endpoint(&["api", "sites"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Self::decode(response).await
    }

    async fn submit_sync(
        &self,
        site_id: Uuid,
        request: &SyncRequest,
    ) -> Result<SyncResponse, RemoteError> {
        info!(
            site_id = %site_id,
            files = request.files.len(),
            dry_run = request.dry_run,
            "Submitting sync request"
        );
        let id = site_id.to_string();
        let url = self.endpoint(&["api", "sites", id.as_str(), "sync"])?;
        let response = self
            .send(self.request(Method::POST, url).json(request))
            .await?;
        Self::decode(response).await
    }

    async fn site_status(&self, site_id: Uuid) -> Result<SiteStatus, RemoteError> {
        let id = site_id.to_string();
        let url = self.endpoint(&["api", "sites", id.as_str(), "status"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Self::decode(response).await
    }

    async fn delete_site(&self, site_id: Uuid) -> Result<DeleteReceipt, RemoteError> {
        info!(site_id = %site_id, "Deleting site");
        let id = site_id.to_string();
        let url = self.endpoint(&["api", "sites", id.as_str()])?;
        let response = self.send(self.request(Method::DELETE, url)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        // 204 No Content carries no receipt.
        if body.trim().is_empty() {
            return Ok(DeleteReceipt { deleted_files: 0 });
        }
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}
