use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberInfo {
    pub id: String,
    pub display_name: String,
    pub unique_name: String,
    pub profile_url: Option<String>,
    pub image_url: Option<String>,
    pub project_ids: Vec<String>,
}

/// Projects and members of one directory load.
///
/// Projects and members reference each other by id only; both sides are
/// resolved through the lookup maps built in [`DirectorySnapshot::new`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    projects: Vec<ProjectInfo>,
    members: Vec<TeamMemberInfo>,
    loaded_at: Option<i64>,
    #[serde(skip)]
    project_index: HashMap<String, usize>,
    #[serde(skip)]
    member_index: HashMap<String, usize>,
}

impl DirectorySnapshot {
    pub fn new(
        projects: Vec<ProjectInfo>,
        members: Vec<TeamMemberInfo>,
        loaded_at: Option<i64>,
    ) -> Self {
        let project_index = projects
            .iter()
            .enumerate()
            .map(|(slot, project)| (project.id.clone(), slot))
            .collect();
        let member_index = members
            .iter()
            .enumerate()
            .map(|(slot, member)| (member.id.clone(), slot))
            .collect();

        Self {
            projects,
            members,
            loaded_at,
            project_index,
            member_index,
        }
    }

    pub fn projects(&self) -> &[ProjectInfo] {
        &self.projects
    }

    pub fn members(&self) -> &[TeamMemberInfo] {
        &self.members
    }

    /// Unix timestamp of the load; `None` for the empty startup snapshot.
    pub fn loaded_at(&self) -> Option<i64> {
        self.loaded_at
    }

    pub fn project(&self, id: &str) -> Option<&ProjectInfo> {
        self.project_index.get(id).map(|&slot| &self.projects[slot])
    }

    pub fn member(&self, id: &str) -> Option<&TeamMemberInfo> {
        self.member_index.get(id).map(|&slot| &self.members[slot])
    }

    pub fn members_of(&self, project_id: &str) -> Vec<&TeamMemberInfo> {
        self.project(project_id)
            .map(|project| {
                project
                    .member_ids
                    .iter()
                    .filter_map(|id| self.member(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn projects_of(&self, member_id: &str) -> Vec<&ProjectInfo> {
        self.member(member_id)
            .map(|member| {
                member
                    .project_ids
                    .iter()
                    .filter_map(|id| self.project(id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryLoadProgress {
    pub current: usize,
    pub total: usize,
    pub current_project: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySummary {
    pub project_count: usize,
    pub member_count: usize,
    pub loaded_at: Option<i64>,
    pub duration_ms: u64,
}

/// Last successfully loaded directory. Replaced wholesale, never edited in place.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    pub snapshot: Arc<DirectorySnapshot>,
}
