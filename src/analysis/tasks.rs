use crate::analysis::numeric::effort;
use crate::client::{JsonPatchOperation, PatchOp, WorkItem};
use crate::models::task::{
    TaskInfo, ACTIVITY, ASSIGNED_TO, COMPLETED_WORK, ESTIMATED_WORK, HISTORY, REMAINING_WORK,
    STATE, TAGS, TITLE, WORK_ITEM_TYPE,
};
use serde_json::json;

const HISTORY_NOTE_PREFIX: &str = "Work progress by: ";

/// Task view of a work item's field bag. Effort fields that do not parse are 0.
pub fn task_info(item: &WorkItem) -> TaskInfo {
    TaskInfo {
        id: item.id,
        work_item_type: item.text_field(WORK_ITEM_TYPE),
        title: item.text_field(TITLE),
        assigned_to: item.text_field(ASSIGNED_TO),
        activity: item.text_field(ACTIVITY),
        state: item.text_field(STATE),
        tags: item.text_field(TAGS),
        estimated_work: effort(item.field(ESTIMATED_WORK)),
        completed_work: effort(item.field(COMPLETED_WORK)),
        remaining_work: effort(item.field(REMAINING_WORK)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkSpanUpdate {
    pub completed_work: f64,
    pub remaining_work: f64,
    pub history_note: String,
}

/// Book `work_span` hours on a task. Remaining work never drops below zero.
pub fn plan_work_span(task: &TaskInfo, work_span: f64, user_display_name: &str) -> WorkSpanUpdate {
    WorkSpanUpdate {
        completed_work: task.completed_work + work_span,
        remaining_work: (task.remaining_work - work_span).max(0.0),
        history_note: format!("{HISTORY_NOTE_PREFIX}{user_display_name}"),
    }
}

impl WorkSpanUpdate {
    pub fn to_patch(&self) -> Vec<JsonPatchOperation> {
        vec![
            JsonPatchOperation::field(PatchOp::Replace, COMPLETED_WORK, json!(self.completed_work)),
            JsonPatchOperation::field(PatchOp::Replace, REMAINING_WORK, json!(self.remaining_work)),
            JsonPatchOperation::field(PatchOp::Add, HISTORY, json!(self.history_note)),
        ]
    }
}
