use super::{RemoteRepository, RepoError, RevisionMarker};
use crate::models::RepoSettings;
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = "linkhub";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";

/// GitHub contents-API client for one repository and branch.
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    settings: RepoSettings,
}

#[derive(Debug, Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ContentMetadata {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentResponse {
    content: ContentMetadata,
}

impl GitHubClient {
    pub fn new(settings: RepoSettings, token: Option<String>) -> Self {
        Self::new_with_client(settings, token, Client::new())
    }

    pub fn new_with_client(settings: RepoSettings, token: Option<String>, client: Client) -> Self {
        Self {
            client,
            token,
            settings,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_url, self.settings.owner, self.settings.name, path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(header::USER_AGENT, USER_AGENT);
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("token {}", token)),
            None => request,
        }
    }

    /// Send a request, mapping 404 to `None` and other failures to errors.
    async fn send(&self, request: RequestBuilder) -> Result<Option<Response>, RepoError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            tracing::error!("Failed to send request to repository: {}", e);
            e
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Repository API error (status {}): {}", status, body);
            return Err(RepoError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Some(response))
    }
}

#[async_trait]
impl RemoteRepository for GitHubClient {
    async fn get_metadata(&self, path: &str) -> Result<Option<RevisionMarker>, RepoError> {
        tracing::debug!("Fetching revision marker for {}", path);

        let request = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.settings.branch.as_str())])
            .header(header::ACCEPT, ACCEPT_JSON);

        let Some(response) = self.send(request).await? else {
            return Ok(None);
        };

        let body = response.text().await?;
        let metadata: ContentMetadata = serde_json::from_str(&body)
            .map_err(|e| RepoError::Decode(format!("contents metadata for {}: {}", path, e)))?;

        Ok(Some(RevisionMarker::new(metadata.sha)))
    }

    async fn get_content(&self, path: &str) -> Result<Option<Vec<u8>>, RepoError> {
        let request = if self.token.is_some() {
            tracing::debug!("Fetching {} through the contents API", path);
            self.client
                .get(self.contents_url(path))
                .query(&[("ref", self.settings.branch.as_str())])
                .header(header::ACCEPT, ACCEPT_RAW)
        } else {
            tracing::debug!("Fetching {} from the public raw host", path);
            self.client.get(self.raw_url(path))
        };

        match self.send(request).await? {
            Some(response) => Ok(Some(response.bytes().await?.to_vec())),
            None => Ok(None),
        }
    }

    async fn put_if_match(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<RevisionMarker, RepoError> {
        if self.token.is_none() {
            return Err(RepoError::MissingCredentials);
        }

        tracing::debug!(
            "Committing {} ({} bytes, marker {:?})",
            path,
            content.len(),
            marker.map(RevisionMarker::as_str)
        );

        let body = PutContentRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            branch: &self.settings.branch,
            sha: marker.map(RevisionMarker::as_str),
        };

        let response = self
            .authorized(self.client.put(self.contents_url(path)))
            .header(header::ACCEPT, ACCEPT_JSON)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send commit to repository: {}", e);
                e
            })?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Revision conflict committing {}: {}", path, body);
            return Err(RepoError::Conflict {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Repository API error (status {}): {}", status, body);
            return Err(RepoError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let committed: PutContentResponse = serde_json::from_str(&body)
            .map_err(|e| RepoError::Decode(format!("commit response for {}: {}", path, e)))?;

        Ok(RevisionMarker::new(committed.content.sha))
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.settings.raw_url,
            self.settings.owner,
            self.settings.name,
            self.settings.branch,
            path
        )
    }

    fn has_credentials(&self) -> bool {
        self.token.is_some()
    }
}
