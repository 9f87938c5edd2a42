use crate::client::{IdentityRef, TeamProjectReference};
use crate::models::directory::{DirectorySnapshot, ProjectInfo, TeamMemberInfo};
use std::collections::{HashMap, HashSet};

/// Accumulates projects and team members while the directory is fetched.
///
/// Members are deduplicated by id both per project and in the global
/// registry. Member → project references are derived in [`build`] from the
/// final per-project membership, so the two directions always agree.
///
/// [`build`]: DirectoryBuilder::build
#[derive(Debug, Default)]
pub struct DirectoryBuilder {
    projects: Vec<ProjectInfo>,
    project_members: Vec<HashSet<String>>,
    members: Vec<TeamMemberInfo>,
    member_index: HashMap<String, usize>,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project and returns the slot its members are added under.
    pub fn add_project(&mut self, project: &TeamProjectReference) -> usize {
        self.projects.push(ProjectInfo {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            member_ids: Vec::new(),
        });
        self.project_members.push(HashSet::new());
        self.projects.len() - 1
    }

    pub fn add_member(&mut self, project_slot: usize, identity: &IdentityRef) {
        let (Some(project), Some(seen)) = (
            self.projects.get_mut(project_slot),
            self.project_members.get_mut(project_slot),
        ) else {
            return;
        };

        if seen.insert(identity.id.clone()) {
            project.member_ids.push(identity.id.clone());
        }

        if !self.member_index.contains_key(&identity.id) {
            self.member_index
                .insert(identity.id.clone(), self.members.len());
            self.members.push(TeamMemberInfo {
                id: identity.id.clone(),
                display_name: identity.display_name.clone(),
                unique_name: identity.unique_name.clone(),
                profile_url: identity.profile_url.clone(),
                image_url: identity.image_url.clone(),
                project_ids: Vec::new(),
            });
        }
    }

    pub fn build(mut self, loaded_at: Option<i64>) -> DirectorySnapshot {
        for member in &mut self.members {
            member.project_ids = self
                .projects
                .iter()
                .zip(&self.project_members)
                .filter(|(_, seen)| seen.contains(&member.id))
                .map(|(project, _)| project.id.clone())
                .collect();
        }

        DirectorySnapshot::new(self.projects, self.members, loaded_at)
    }
}
