//! Work-item client.
//!
//! [`WorkItemClient`] is the seam the tracker steps talk through;
//! [`HttpTrackerClient`] implements it against the Azure DevOps style
//! `_apis/wit/workitems` REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::tracker::error::{TrackerError, TrackerResult};
use crate::tracker::patch::{PatchDocument, WorkItem, WorkItemId};

const API_VERSION: &str = "7.0";
const JSON_PATCH: &str = "application/json-patch+json";

/// Operations on work items.
#[async_trait]
pub trait WorkItemClient: Send + Sync {
    /// Base URL of the project, used to build links between items.
    fn base_url(&self) -> &str;

    /// Create a work item of type `kind` (e.g. `Task`, `Bug`).
    async fn create(&self, kind: &str, patch: &PatchDocument) -> TrackerResult<WorkItem>;

    async fn get(&self, id: WorkItemId) -> TrackerResult<WorkItem>;

    async fn update(&self, id: WorkItemId, patch: &PatchDocument) -> TrackerResult<WorkItem>;

    /// Delete a work item (moves it to the recycle bin).
    async fn delete(&self, id: WorkItemId) -> TrackerResult<()>;
}

/// HTTP client for a tracker project.
#[derive(Clone)]
pub struct HttpTrackerClient {
    client: Client,
    base: Url,
    base_str: String,
    token: Option<String>,
}

impl HttpTrackerClient {
    /// `base_url` is the project URL, e.g. `https://dev.azure.com/org/project`.
    /// `token` is a personal access token sent with basic auth.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> TrackerResult<Self> {
        let base_str = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_str).map_err(|e| TrackerError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(TrackerError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            base_str,
            token,
        })
    }

    fn url(&self, tail: &[&str]) -> TrackerResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TrackerError::InvalidUrl(self.base_str.clone()))?
            .pop_if_empty()
            .extend(["_apis", "wit", "workitems"])
            .extend(tail);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.basic_auth("", Some(token)),
            None => request,
        }
    }

    async fn send_patch(&self, request: reqwest::RequestBuilder, patch: &PatchDocument) -> TrackerResult<WorkItem> {
        let body = serde_json::to_vec(patch)?;
        let response = self
            .authorize(request)
            .header(CONTENT_TYPE, JSON_PATCH)
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;
        read_item(response).await
    }
}

impl std::fmt::Debug for HttpTrackerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTrackerClient")
            .field("base", &self.base_str)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

async fn check(response: Response) -> TrackerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TrackerError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_item(response: Response) -> TrackerResult<WorkItem> {
    let body = check(response).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl WorkItemClient for HttpTrackerClient {
    fn base_url(&self) -> &str {
        &self.base_str
    }

    async fn create(&self, kind: &str, patch: &PatchDocument) -> TrackerResult<WorkItem> {
        let segment = format!("${}", kind);
        let url = self.url(&[segment.as_str()])?;
        debug!(%url, ops = patch.len(), "creating work item");
        let item = self.send_patch(self.client.post(url), patch).await?;
        debug!(id = %item.id, "work item created");
        Ok(item)
    }

    async fn get(&self, id: WorkItemId) -> TrackerResult<WorkItem> {
        let url = self.url(&[id.0.to_string().as_str()])?;
        let response = self.authorize(self.client.get(url)).send().await?;
        read_item(response).await
    }

    async fn update(&self, id: WorkItemId, patch: &PatchDocument) -> TrackerResult<WorkItem> {
        let url = self.url(&[id.0.to_string().as_str()])?;
        debug!(%url, ops = patch.len(), "updating work item");
        self.send_patch(self.client.patch(url), patch).await
    }

    async fn delete(&self, id: WorkItemId) -> TrackerResult<()> {
        let url = self.url(&[id.0.to_string().as_str()])?;
        debug!(%url, "deleting work item");
        let response = self.authorize(self.client.delete(url)).send().await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::patch::{PatchOperation, WorkItemDraft};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpTrackerClient {
        HttpTrackerClient::new(
            &format!("{}/org/project", server.uri()),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_sends_patch() {
        let server = MockServer::start().await;
        let draft = WorkItemDraft::new("Fix login");

        Mock::given(method("POST"))
            .and(path("/org/project/_apis/wit/workitems/$Task"))
            .and(query_param("api-version", "7.0"))
            .and(header("content-type", "application/json-patch+json"))
            .and(header("authorization", "Basic OnNlY3JldA=="))
            .and(body_json(json!([
                {"op": "add", "path": "/fields/System.Title", "value": "Fix login"}
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "rev": 1,
                "fields": {"System.Title": "Fix login"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let item = client
            .create("Task", &draft.to_patch(client.base_url()))
            .await
            .unwrap();
        assert_eq!(item.id, WorkItemId(12));
        assert_eq!(item.title(), Some("Fix login"));
    }

    #[tokio::test]
    async fn test_update_and_get() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/org/project/_apis/wit/workitems/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "fields": {"System.State": "Active"},
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/org/project/_apis/wit/workitems/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "fields": {"System.State": "Active"},
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let patch: PatchDocument = [PatchOperation::add("/fields/System.State", json!("Active"))]
            .into_iter()
            .collect();
        client.update(WorkItemId(12), &patch).await.unwrap();

        let item = client.get(WorkItemId(12)).await.unwrap();
        assert_eq!(item.field("System.State"), Some(&json!("Active")));
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/org/project/_apis/wit/workitems/99"))
            .respond_with(ResponseTemplate::new(404).set_body_string("work item 99 does not exist"))
            .mount(&server)
            .await;

        let err = client(&server).delete(WorkItemId(99)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "tracker returned 404: work item 99 does not exist");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = client(&server).get(WorkItemId(1)).await.unwrap_err();
        assert!(matches!(err, TrackerError::Decode(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTrackerClient::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidUrl(_)));
    }
}
