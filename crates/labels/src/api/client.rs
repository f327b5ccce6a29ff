//! Label endpoint client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::models::{ApiErrorBody, Label, LabelPayload, RepoId};
use crate::gate::Gate;
use crate::oplog::OpLog;

const DEFAULT_API_URL: &str = "https://api.github.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum LabelApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("{repo} not found - if this is a private repo make sure you provide a token")]
    RepoNotFound { repo: RepoId },
}

/// Client for a repository hosting service's label endpoints.
///
/// Clones share the same [`Gate`] and [`OpLog`], so a committer fanning out
/// over cloned clients still observes one in-flight counter and one log.
#[derive(Clone)]
pub struct LabelClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    gate: Arc<Gate>,
    log: OpLog,
}

impl LabelClient {
    /// Create a client against the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: Option<String>) -> Result<Self, LabelApiError> {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    /// Create a client against a specific API base URL (enterprise installs,
    /// tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, LabelApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("labelctl/0.3"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        // An empty Authorization header breaks anonymous access to public
        // repos, so a blank token counts as no token at all.
        let token = token.filter(|t| !t.trim().is_empty());

        Ok(Self {
            http,
            base_url: base_url.into(),
            token,
            gate: Arc::new(Gate::new()),
            log: OpLog::new(),
        })
    }

    /// The in-flight request gate shared by every call on this client.
    #[must_use]
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// The operation log shared by every call on this client.
    #[must_use]
    pub fn log(&self) -> &OpLog {
        &self.log
    }

    /// Fetch every label of a repository, page by page.
    ///
    /// Pages are requested strictly in order; page N+1 only goes out once
    /// page N has answered, and the first empty page ends the walk.
    ///
    /// # Errors
    ///
    /// A 404 maps to [`LabelApiError::RepoNotFound`] (typically a private
    /// repository read without a token). Any other error page fails the
    /// whole operation.
    pub async fn list_labels(&self, repo: &RepoId) -> Result<Vec<Label>, LabelApiError> {
        let mut labels = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/labels?page={page}",
                self.base_url, repo.owner, repo.repo
            );
            let response = self.send(Method::GET, &url, None).await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Err(LabelApiError::RepoNotFound { repo: repo.clone() });
            }
            if !status.is_success() {
                return Err(api_error(status, response).await);
            }

            let mut batch: Vec<Label> = response.json().await?;
            if batch.is_empty() {
                break;
            }
            for label in &mut batch {
                label.color.make_ascii_uppercase();
            }
            labels.append(&mut batch);
            page += 1;
        }

        debug!(repo = %repo, count = labels.len(), "Listed labels");
        Ok(labels)
    }

    /// Create a label.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails; the outcome is logged either
    /// way.
    pub async fn create_label(
        &self,
        repo: &RepoId,
        label: &LabelPayload,
    ) -> Result<Label, LabelApiError> {
        let url = format!("{}/repos/{}/{}/labels", self.base_url, repo.owner, repo.repo);
        let result = self.send(Method::POST, &url, Some(label)).await;

        match into_label(result).await {
            Ok(created) => {
                self.log.append(format!("Created label: {}", label.name));
                Ok(created)
            }
            Err(err) => {
                self.log.append(format!(
                    "Creation of label failed for: {} Error: {err}",
                    label.name
                ));
                Err(err)
            }
        }
    }

    /// Update the label currently named `original_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails; the outcome is logged either
    /// way.
    pub async fn update_label(
        &self,
        repo: &RepoId,
        original_name: &str,
        label: &LabelPayload,
    ) -> Result<Label, LabelApiError> {
        let url = format!(
            "{}/repos/{}/{}/labels/{}",
            self.base_url,
            repo.owner,
            repo.repo,
            urlencoding::encode(original_name)
        );
        let result = self.send(Method::PATCH, &url, Some(label)).await;

        match into_label(result).await {
            Ok(updated) => {
                self.log
                    .append(format!("Updated label: {original_name} => {}", label.name));
                Ok(updated)
            }
            Err(err) => {
                self.log.append(format!(
                    "Update of label failed for: {original_name} Error: {err}"
                ));
                Err(err)
            }
        }
    }

    /// Delete a label by its current name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails; the outcome is logged either
    /// way.
    pub async fn delete_label(&self, repo: &RepoId, name: &str) -> Result<(), LabelApiError> {
        let url = format!(
            "{}/repos/{}/{}/labels/{}",
            self.base_url,
            repo.owner,
            repo.repo,
            urlencoding::encode(name)
        );

        let outcome = match self.send(Method::DELETE, &url, None).await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(api_error(status, response).await)
                }
            }
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(()) => self.log.append(format!("Deleted label: {name}")),
            Err(err) => self
                .log
                .append(format!("Deletion of label failed for: {name} Error: {err}")),
        }
        outcome
    }

    /// Dispatch one request, holding the gate for the duration of the
    /// round-trip. The gate is released as soon as the outcome is known,
    /// success or transport failure alike.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&LabelPayload>,
    ) -> Result<Response, LabelApiError> {
        debug!(method = %method, url = %url, "API request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        self.gate.acquire();
        let result = request.send().await;
        self.gate.release();

        Ok(result?)
    }
}

/// Parse a successful response into a label, or an error page into
/// [`LabelApiError::Api`].
async fn into_label(
    result: Result<Response, LabelApiError>,
) -> Result<Label, LabelApiError> {
    let response = result?;
    let status = response.status();
    if !status.is_success() {
        return Err(api_error(status, response).await);
    }
    let mut label: Label = response.json().await?;
    label.color.make_ascii_uppercase();
    Ok(label)
}

async fn api_error(status: StatusCode, response: Response) -> LabelApiError {
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    LabelApiError::Api {
        status: status.as_u16(),
        message,
    }
}
