use crate::analysis::numeric::effort;
use crate::analysis::tasks::{plan_work_span, task_info};
use crate::analysis::wiql::my_tasks_query;
use crate::analysis::work_days::work_per_days;
use crate::client::{TeamContext, TrackingSource};
use crate::error::{TrackerError, TrackerResult};
use crate::models::task::{TaskInfo, WorkPerDays, TASK_FIELDS};
use serde_json::Value;

#[cfg(feature = "desktop")]
use super::AppState;

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_task_info(
    task_id: i64,
    state: tauri::State<'_, AppState>,
) -> TrackerResult<TaskInfo> {
    let client = state.client()?;
    get_task_info_internal(&*client, task_id).await
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_work_per_days(
    task_id: i64,
    state: tauri::State<'_, AppState>,
) -> TrackerResult<WorkPerDays> {
    let client = state.client()?;
    get_work_per_days_internal(&*client, task_id).await
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn apply_work_span(
    task_id: i64,
    work_span: Value,
    user_display_name: String,
    state: tauri::State<'_, AppState>,
) -> TrackerResult<TaskInfo> {
    let client = state.client()?;
    apply_work_span_internal(&*client, task_id, &work_span, &user_display_name).await
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn list_my_tasks(
    project_id: String,
    current_user_display_name: String,
    state: tauri::State<'_, AppState>,
) -> TrackerResult<Vec<TaskInfo>> {
    let client = state.client()?;
    list_my_tasks_internal(&*client, &project_id, &current_user_display_name).await
}

pub async fn get_task_info_internal(
    tracking: &dyn TrackingSource,
    task_id: i64,
) -> TrackerResult<TaskInfo> {
    ensure_task_id(task_id)?;

    let item = tracking
        .get_work_item(task_id, &TASK_FIELDS)
        .await?
        .ok_or(TrackerError::NotFound(task_id))?;

    Ok(task_info(&item))
}

/// Completed work per local calendar day, derived from the revision history.
pub async fn get_work_per_days_internal(
    tracking: &dyn TrackingSource,
    task_id: i64,
) -> TrackerResult<WorkPerDays> {
    ensure_task_id(task_id)?;

    let revisions = tracking.get_revisions(task_id).await?;
    log::debug!("Task {task_id}: {} revisions", revisions.len());

    work_per_days(&revisions, &chrono::Local).ok_or_else(|| {
        log::warn!("Task {task_id}: completed work logged but no revision has a readable date");
        TrackerError::SourceUnavailable(format!(
            "revision history of work item {task_id} has no readable change dates"
        ))
    })
}

/// Book `work_span` hours on a task and return the task as the service
/// reports it after the update.
pub async fn apply_work_span_internal(
    tracking: &dyn TrackingSource,
    task_id: i64,
    work_span: &Value,
    user_display_name: &str,
) -> TrackerResult<TaskInfo> {
    let span = effort(Some(work_span));
    let task = get_task_info_internal(tracking, task_id).await?;

    let update = plan_work_span(&task, span, user_display_name);
    log::info!(
        "Task {task_id}: logging {span} h (completed {} -> {}, remaining {} -> {})",
        task.completed_work,
        update.completed_work,
        task.remaining_work,
        update.remaining_work
    );

    let updated = tracking
        .update_work_item(&update.to_patch(), task_id)
        .await?
        .ok_or(TrackerError::UpdateFailed(task_id))?;

    Ok(task_info(&updated))
}

/// Tasks of the current iteration assigned to the user, plus the ones they
/// finished in the last two days.
pub async fn list_my_tasks_internal(
    tracking: &dyn TrackingSource,
    project_id: &str,
    current_user_display_name: &str,
) -> TrackerResult<Vec<TaskInfo>> {
    if project_id.trim().is_empty() {
        return Err(TrackerError::InvalidInput("project id is required".to_string()));
    }
    if current_user_display_name.trim().is_empty() {
        return Err(TrackerError::InvalidInput(
            "current user is not selected".to_string(),
        ));
    }

    let context = TeamContext {
        project_id: project_id.to_string(),
        team: String::new(),
    };
    let matched = tracking
        .query_by_wiql(&my_tasks_query(current_user_display_name), &context)
        .await?;

    let ids: Vec<i64> = matched.work_items.iter().map(|item| item.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let items = tracking.get_work_items(&ids, &TASK_FIELDS).await?;
    Ok(items.iter().map(task_info).collect())
}

fn ensure_task_id(task_id: i64) -> TrackerResult<()> {
    if task_id > 0 {
        Ok(())
    } else {
        Err(TrackerError::InvalidInput(format!(
            "task id must be positive, got {task_id}"
        )))
    }
}
