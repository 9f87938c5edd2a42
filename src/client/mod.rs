//! Data sources consumed by the directory and work-effort logic.
//!
//! Both traits are implemented over HTTP by [`http::TfsClient`]; the command
//! layer only ever sees them as `&dyn` trait objects so tests can substitute
//! in-memory sources.

pub mod http;

use crate::error::TrackerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use http::TfsClient;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamProjectReference {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebApiTeam {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unique_name: String,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A work item or one of its revisions: the raw field bag keyed by reference name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub rev: Option<i64>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl WorkItem {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Text value of a field. Identity fields arrive either as a plain string
    /// (`"Jane Doe <CORP\\jane>"`) or as an object with a `displayName`.
    pub fn text_field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get("displayName")
                .and_then(Value::as_str)
                .map(str::to_string),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItemReference {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemQueryResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

/// Project/team scope a WIQL query runs in; an empty team means project scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamContext {
    pub project_id: String,
    pub team: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonPatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

impl JsonPatchOperation {
    pub fn field(op: PatchOp, field: &str, value: Value) -> Self {
        Self {
            op,
            path: format!("/fields/{field}"),
            value,
        }
    }
}

/// Projects, teams and team members of the collection.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn list_projects(&self) -> TrackerResult<Vec<TeamProjectReference>>;

    async fn list_teams(&self, project_id: &str) -> TrackerResult<Vec<WebApiTeam>>;

    async fn list_team_members(
        &self,
        project_id: &str,
        team_id: &str,
    ) -> TrackerResult<Vec<IdentityRef>>;
}

/// Work item tracking: reads, revision history, WIQL and patch updates.
#[async_trait]
pub trait TrackingSource: Send + Sync {
    /// `Ok(None)` when the item does not exist.
    async fn get_work_item(&self, id: i64, fields: &[&str]) -> TrackerResult<Option<WorkItem>>;

    async fn get_work_items(&self, ids: &[i64], fields: &[&str]) -> TrackerResult<Vec<WorkItem>>;

    /// All revisions of an item, in whatever order the service returns them.
    async fn get_revisions(&self, id: i64) -> TrackerResult<Vec<WorkItem>>;

    async fn query_by_wiql(
        &self,
        query: &str,
        context: &TeamContext,
    ) -> TrackerResult<WorkItemQueryResult>;

    /// `Ok(None)` when the service accepted the request but returned no item.
    async fn update_work_item(
        &self,
        patch: &[JsonPatchOperation],
        id: i64,
    ) -> TrackerResult<Option<WorkItem>>;
}
