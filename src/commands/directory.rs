use crate::analysis::directory::DirectoryBuilder;
use crate::client::DirectorySource;
use crate::error::TrackerResult;
use crate::models::directory::*;
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "desktop")]
use super::AppState;
#[cfg(feature = "desktop")]
use tauri::Emitter;

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn load_directory(
    state: tauri::State<'_, AppState>,
    app: tauri::AppHandle,
) -> TrackerResult<DirectorySummary> {
    let client = state.client()?;
    load_directory_internal(&*client, &state.directory, |progress| {
        let _ = app.emit("directory_load_progress", progress);
    })
    .await
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub fn get_projects(state: tauri::State<'_, AppState>) -> Vec<ProjectInfo> {
    get_projects_internal(&state.directory)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub fn get_team_members(state: tauri::State<'_, AppState>) -> Vec<TeamMemberInfo> {
    get_team_members_internal(&state.directory)
}

/// Fetch projects, their teams and team members, and swap the result into
/// `cache` once everything has been fetched. On any failure the cache keeps
/// its previous snapshot.
pub async fn load_directory_internal<F>(
    source: &dyn DirectorySource,
    cache: &Arc<Mutex<DirectoryCache>>,
    mut emit_progress: F,
) -> TrackerResult<DirectorySummary>
where
    F: FnMut(DirectoryLoadProgress) + Send,
{
    let start = std::time::Instant::now();
    log::info!("Loading project directory");

    let snapshot = match fetch_directory(source, &mut emit_progress).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            log::warn!("Directory load failed, keeping previous snapshot: {err}");
            return Err(err);
        }
    };

    let summary = DirectorySummary {
        project_count: snapshot.projects().len(),
        member_count: snapshot.members().len(),
        loaded_at: snapshot.loaded_at(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    store_snapshot(cache, snapshot);

    log::info!(
        "Loaded {} projects and {} team members in {} ms",
        summary.project_count,
        summary.member_count,
        summary.duration_ms
    );
    Ok(summary)
}

async fn fetch_directory<F>(
    source: &dyn DirectorySource,
    emit_progress: &mut F,
) -> TrackerResult<DirectorySnapshot>
where
    F: FnMut(DirectoryLoadProgress) + Send,
{
    let projects = source.list_projects().await?;
    let total = projects.len();
    let mut builder = DirectoryBuilder::new();

    for (index, project) in projects.iter().enumerate() {
        emit_progress(DirectoryLoadProgress {
            current: index + 1,
            total,
            current_project: project.name.clone(),
        });

        let slot = builder.add_project(project);
        let teams = source.list_teams(&project.id).await?;
        log::debug!("Project {} has {} teams", project.name, teams.len());

        for team in &teams {
            let members = source.list_team_members(&project.id, &team.id).await?;
            for member in &members {
                builder.add_member(slot, member);
            }
        }
    }

    Ok(builder.build(Some(chrono::Utc::now().timestamp())))
}

fn store_snapshot(cache: &Arc<Mutex<DirectoryCache>>, snapshot: DirectorySnapshot) {
    let mut cache_lock = cache.lock().unwrap_or_else(PoisonError::into_inner);
    cache_lock.snapshot = Arc::new(snapshot);
}

/// The current snapshot. Readers holding it are unaffected by later loads.
pub fn directory_snapshot_internal(cache: &Arc<Mutex<DirectoryCache>>) -> Arc<DirectorySnapshot> {
    let cache_lock = cache.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&cache_lock.snapshot)
}

pub fn get_projects_internal(cache: &Arc<Mutex<DirectoryCache>>) -> Vec<ProjectInfo> {
    directory_snapshot_internal(cache).projects().to_vec()
}

pub fn get_team_members_internal(cache: &Arc<Mutex<DirectoryCache>>) -> Vec<TeamMemberInfo> {
    directory_snapshot_internal(cache).members().to_vec()
}
