//! REST client for a TFS / Azure DevOps Server collection.

use super::{
    DirectorySource, IdentityRef, JsonPatchOperation, TeamContext, TeamProjectReference,
    TrackingSource, WebApiTeam, WorkItem, WorkItemQueryResult,
};
use crate::error::{TrackerError, TrackerResult};
use crate::models::connection::ConnectionSettings;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const DIRECTORY_PAGE_SIZE: usize = 100;
const REVISION_PAGE_SIZE: usize = 200;
const WORK_ITEM_BATCH_SIZE: usize = 200;
const MAX_PAGES: usize = 500;

/// `{ "count": n, "value": [...] }` envelope used by list endpoints.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// Team members come back bare on older collections and wrapped in
/// `{ "identity": ... }` on newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeamMemberEntry {
    Wrapped { identity: IdentityRef },
    Bare(IdentityRef),
}

impl From<TeamMemberEntry> for IdentityRef {
    fn from(entry: TeamMemberEntry) -> Self {
        match entry {
            TeamMemberEntry::Wrapped { identity } => identity,
            TeamMemberEntry::Bare(identity) => identity,
        }
    }
}

/// Error body returned by the service on failure.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

pub struct TfsClient {
    base: Url,
    api_version: String,
    username: String,
    access_token: String,
    http: reqwest::Client,
}

impl TfsClient {
    pub fn new(settings: &ConnectionSettings) -> TrackerResult<Self> {
        if settings.api_url.is_empty() {
            return Err(TrackerError::Config(
                "apiUrl is not configured (settings.json or TFS_API_URL)".to_string(),
            ));
        }

        let base = Url::parse(&settings.api_url).map_err(|e| {
            TrackerError::Config(format!("Invalid apiUrl `{}`: {e}", settings.api_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(TrackerError::Config(format!(
                "apiUrl `{}` is not an http(s) URL",
                settings.api_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| TrackerError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base,
            api_version: settings.api_version.clone(),
            username: settings.username.clone(),
            access_token: settings.access_token.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> TrackerResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TrackerError::Config(format!("apiUrl `{}` cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(segments.iter().filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .query(&[("api-version", self.api_version.as_str())]);

        if self.username.is_empty() && self.access_token.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.access_token))
        }
    }

    /// Sends the request and decodes the body. A 404 yields `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        what: &str,
        builder: RequestBuilder,
    ) -> TrackerResult<Option<T>> {
        let response = builder.send().await.map_err(|e| {
            log::warn!("{what} request failed: {e}");
            TrackerError::SourceUnavailable(format!("{what} request failed: {e}"))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log::debug!("{what}: not found");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::warn!("{what} failed with status {status}");

            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(TrackerError::SourceUnavailable(format!(
                    "{what} failed ({status}): {}",
                    err.message
                )));
            }
            return Err(TrackerError::SourceUnavailable(format!(
                "{what} failed ({status}): {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| TrackerError::SourceUnavailable(format!("Failed to parse {what} response: {e}")))
    }

    async fn fetch_required<T: DeserializeOwned>(
        &self,
        what: &str,
        builder: RequestBuilder,
    ) -> TrackerResult<T> {
        self.fetch(what, builder).await?.ok_or_else(|| {
            TrackerError::SourceUnavailable(format!("{what} failed ({})", StatusCode::NOT_FOUND))
        })
    }

    /// Walks `$top`/`$skip` pages until the service returns a short page.
    async fn fetch_paged<T: DeserializeOwned>(
        &self,
        what: &str,
        segments: &[&str],
        page_size: usize,
    ) -> TrackerResult<Vec<T>> {
        let mut items = Vec::new();
        let top = page_size.to_string();

        for _ in 0..MAX_PAGES {
            let skip = items.len().to_string();
            let builder = self
                .request(Method::GET, self.endpoint(segments)?)
                .query(&[("$top", top.as_str()), ("$skip", skip.as_str())]);

            let page: ListResponse<T> = self.fetch_required(what, builder).await?;
            let fetched = page.value.len();
            items.extend(page.value);

            if fetched < page_size {
                return Ok(items);
            }
        }

        log::warn!("{what}: stopped after {MAX_PAGES} pages ({} items)", items.len());
        Ok(items)
    }
}

#[async_trait]
impl DirectorySource for TfsClient {
    async fn list_projects(&self) -> TrackerResult<Vec<TeamProjectReference>> {
        self.fetch_paged("Projects", &["_apis", "projects"], DIRECTORY_PAGE_SIZE)
            .await
    }

    async fn list_teams(&self, project_id: &str) -> TrackerResult<Vec<WebApiTeam>> {
        let teams = self
            .fetch_paged(
                "Teams",
                &["_apis", "projects", project_id, "teams"],
                DIRECTORY_PAGE_SIZE,
            )
            .await?;
        Ok(teams)
    }

    async fn list_team_members(
        &self,
        project_id: &str,
        team_id: &str,
    ) -> TrackerResult<Vec<IdentityRef>> {
        let entries: Vec<TeamMemberEntry> = self
            .fetch_paged(
                "Team members",
                &["_apis", "projects", project_id, "teams", team_id, "members"],
                DIRECTORY_PAGE_SIZE,
            )
            .await?;
        Ok(entries.into_iter().map(IdentityRef::from).collect())
    }
}

#[async_trait]
impl TrackingSource for TfsClient {
    async fn get_work_item(&self, id: i64, fields: &[&str]) -> TrackerResult<Option<WorkItem>> {
        let id_segment = id.to_string();
        let url = self.endpoint(&["_apis", "wit", "workitems", id_segment.as_str()])?;
        let builder = self
            .request(Method::GET, url)
            .query(&[("fields", fields.join(","))]);

        self.fetch("Work item", builder).await
    }

    async fn get_work_items(&self, ids: &[i64], fields: &[&str]) -> TrackerResult<Vec<WorkItem>> {
        let mut items = Vec::with_capacity(ids.len());

        for batch in ids.chunks(WORK_ITEM_BATCH_SIZE) {
            let joined_ids = batch
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let url = self.endpoint(&["_apis", "wit", "workitems"])?;
            let builder = self
                .request(Method::GET, url)
                .query(&[
                    ("ids", joined_ids),
                    ("fields", fields.join(",")),
                    ("errorPolicy", "omit".to_string()),
                ]);

            // Items deleted since the ids were read come back as `null`.
            let page: ListResponse<Option<WorkItem>> =
                self.fetch_required("Work items", builder).await?;
            items.extend(page.value.into_iter().flatten());
        }

        Ok(items)
    }

    async fn get_revisions(&self, id: i64) -> TrackerResult<Vec<WorkItem>> {
        let id_segment = id.to_string();
        let revisions = self
            .fetch_paged(
                "Revisions",
                &["_apis", "wit", "workitems", id_segment.as_str(), "revisions"],
                REVISION_PAGE_SIZE,
            )
            .await?;
        Ok(revisions)
    }

    async fn query_by_wiql(
        &self,
        query: &str,
        context: &TeamContext,
    ) -> TrackerResult<WorkItemQueryResult> {
        let url = self.endpoint(&[
            context.project_id.as_str(),
            context.team.as_str(),
            "_apis",
            "wit",
            "wiql",
        ])?;
        let builder = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "query": query }));

        self.fetch_required("WIQL query", builder).await
    }

    async fn update_work_item(
        &self,
        patch: &[JsonPatchOperation],
        id: i64,
    ) -> TrackerResult<Option<WorkItem>> {
        let body = serde_json::to_vec(patch)
            .map_err(|e| TrackerError::InvalidInput(format!("Failed to serialize patch: {e}")))?;
        let id_segment = id.to_string();
        let url = self.endpoint(&["_apis", "wit", "workitems", id_segment.as_str()])?;
        let builder = self
            .request(Method::PATCH, url)
            .header(CONTENT_TYPE, "application/json-patch+json")
            .body(body);

        self.fetch("Work item update", builder).await
    }
}
