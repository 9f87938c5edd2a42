use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const TITLE: &str = "System.Title";
pub const ASSIGNED_TO: &str = "System.AssignedTo";
pub const STATE: &str = "System.State";
pub const TAGS: &str = "System.Tags";
pub const HISTORY: &str = "System.History";
pub const CHANGED_DATE: &str = "System.ChangedDate";
pub const ESTIMATED_WORK: &str = "Microsoft.VSTS.Scheduling.EstimatedWork";
pub const COMPLETED_WORK: &str = "Microsoft.VSTS.Scheduling.CompletedWork";
pub const REMAINING_WORK: &str = "Microsoft.VSTS.Scheduling.RemainingWork";
pub const ACTIVITY: &str = "Microsoft.VSTS.Common.Activity";

/// Fields requested whenever a task view is built.
pub const TASK_FIELDS: [&str; 9] = [
    WORK_ITEM_TYPE,
    TITLE,
    ASSIGNED_TO,
    STATE,
    TAGS,
    ESTIMATED_WORK,
    COMPLETED_WORK,
    REMAINING_WORK,
    ACTIVITY,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: i64,
    pub work_item_type: Option<String>,
    pub title: Option<String>,
    pub assigned_to: Option<String>,
    pub activity: Option<String>,
    pub state: Option<String>,
    pub tags: Option<String>,
    pub estimated_work: f64,
    pub completed_work: f64,
    pub remaining_work: f64,
}

/// Completed-work delta per local calendar day, keyed `YYYY-MM-DD`.
pub type WorkPerDays = BTreeMap<String, f64>;
