use crate::analysis::numeric::effort;
use crate::client::WorkItem;
use crate::models::task::{WorkPerDays, CHANGED_DATE, COMPLETED_WORK};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

const LOCAL_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Split a task's completed work over the days it was logged on.
///
/// Revisions are ordered by revision number (stable, so ties keep source
/// order) and each one contributes the change in completed work since the
/// previous revision to the calendar day, in `tz`, of its changed date. The
/// deltas add up to the completed work of the last revision.
///
/// A revision without a readable changed date hands its delta on to the next
/// dated revision; trailing undated deltas go to the last dated day. Returns
/// `None` when work was logged but no revision has a readable date.
pub fn work_per_days<Tz: TimeZone>(revisions: &[WorkItem], tz: &Tz) -> Option<WorkPerDays> {
    let mut ordered: Vec<&WorkItem> = revisions.iter().collect();
    ordered.sort_by_key(|revision| revision.rev.unwrap_or(0));

    let mut days = WorkPerDays::new();
    let mut previous = 0.0;
    let mut carried = 0.0;
    let mut last_day: Option<String> = None;

    for revision in ordered {
        let current = effort(revision.field(COMPLETED_WORK));
        let delta = current - previous;
        previous = current;

        match changed_day(revision, tz) {
            Some(day) => {
                *days.entry(day.clone()).or_insert(0.0) += delta + carried;
                carried = 0.0;
                last_day = Some(day);
            }
            None => carried += delta,
        }
    }

    if carried != 0.0 {
        let total = last_day.and_then(|day| days.get_mut(&day))?;
        *total += carried;
    }

    Some(days)
}

fn changed_day<Tz: TimeZone>(revision: &WorkItem, tz: &Tz) -> Option<String> {
    let raw = revision.field(CHANGED_DATE)?.as_str()?.trim();
    let day = local_day(raw, tz)?;
    Some(day.format("%Y-%m-%d").to_string())
}

/// Calendar day of a change date in `tz`. Timestamps with an offset are
/// converted, timestamps without one are already local, and a bare date
/// stands for midnight UTC.
fn local_day<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
    if let Ok(changed) = DateTime::parse_from_rfc3339(raw) {
        return Some(changed.with_timezone(tz).date_naive());
    }

    if let Some(local) = LOCAL_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(local.date());
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(tz.from_utc_datetime(&midnight).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::{json, Value};

    fn revision(rev: i64, changed: &str, completed: Value) -> WorkItem {
        let mut fields = serde_json::Map::new();
        fields.insert(CHANGED_DATE.to_string(), json!(changed));
        fields.insert(COMPLETED_WORK.to_string(), completed);
        WorkItem {
            id: 1,
            rev: Some(rev),
            fields,
        }
    }

    #[test]
    fn orders_by_revision_number_not_by_date() {
        let revisions = vec![
            revision(1, "2024-01-01T09:00:00Z", json!("2")),
            revision(3, "2024-01-02T09:00:00Z", json!("5")),
            revision(2, "2024-01-01T16:30:00Z", json!("3")),
        ];

        let days = work_per_days(&revisions, &Utc).expect("dated history");
        assert_eq!(days.len(), 2);
        assert_eq!(days["2024-01-01"], 3.0);
        assert_eq!(days["2024-01-02"], 2.0);
    }

    #[test]
    fn deltas_add_up_to_the_final_completed_work() {
        let revisions = vec![
            revision(4, "2024-03-05T10:00:00Z", json!("7,5")),
            revision(1, "2024-03-01T10:00:00Z", json!(null)),
            revision(2, "2024-03-02T10:00:00Z", json!(1.5)),
            revision(5, "2024-03-06T10:00:00Z", json!("6")),
            revision(3, "2024-03-02T18:00:00Z", json!("4")),
        ];

        let days = work_per_days(&revisions, &Utc).expect("dated history");
        let total: f64 = days.values().sum();
        assert!((total - 6.0).abs() < 1e-9, "total was {total}");
        assert_eq!(days["2024-03-01"], 0.0);
        assert_eq!(days["2024-03-02"], 4.0);
        assert_eq!(days["2024-03-06"], -1.5);
    }

    #[test]
    fn unparseable_work_counts_as_zero() {
        let revisions = vec![
            revision(1, "2024-01-01T09:00:00Z", json!("2")),
            revision(2, "2024-01-02T09:00:00Z", json!("oops")),
            revision(3, "2024-01-03T09:00:00Z", json!("3")),
        ];

        let days = work_per_days(&revisions, &Utc).expect("dated history");
        assert_eq!(days["2024-01-01"], 2.0);
        assert_eq!(days["2024-01-02"], -2.0);
        assert_eq!(days["2024-01-03"], 3.0);
    }

    #[test]
    fn buckets_by_the_local_calendar_day() {
        let revisions = vec![
            revision(1, "2024-01-01T23:30:00Z", json!("1")),
            revision(2, "2024-01-02T00:30:00Z", json!("2")),
        ];

        let utc = work_per_days(&revisions, &Utc).expect("dated history");
        assert_eq!(utc["2024-01-01"], 1.0);
        assert_eq!(utc["2024-01-02"], 1.0);

        let cet = FixedOffset::east_opt(3600).unwrap();
        let local = work_per_days(&revisions, &cet).expect("dated history");
        assert_eq!(local.len(), 1);
        assert_eq!(local["2024-01-02"], 2.0);
    }

    #[test]
    fn undated_revisions_carry_their_delta_forward() {
        let mut undated = revision(2, "", json!("3"));
        undated.fields.remove(CHANGED_DATE);
        let revisions = vec![
            revision(1, "2024-01-01T09:00:00Z", json!("1")),
            undated,
            revision(3, "2024-01-04T09:00:00Z", json!("4")),
            revision(4, "not a date", json!("6")),
        ];

        let days = work_per_days(&revisions, &Utc).expect("dated history");
        assert_eq!(days["2024-01-01"], 1.0);
        assert_eq!(days["2024-01-04"], 5.0);
        let total: f64 = days.values().sum();
        assert_eq!(total, 6.0);
    }

    #[test]
    fn no_revisions_means_no_days() {
        assert_eq!(work_per_days(&[], &Utc), Some(WorkPerDays::new()));
    }

    #[test]
    fn date_only_changes_are_bucketed_by_day() {
        let revisions = vec![
            revision(1, "2024-01-01", json!("2")),
            revision(3, "2024-01-02", json!("5")),
            revision(2, "2024-01-01", json!("3")),
        ];

        let days = work_per_days(&revisions, &Utc).expect("dated history");
        assert_eq!(days.len(), 2);
        assert_eq!(days["2024-01-01"], 3.0);
        assert_eq!(days["2024-01-02"], 2.0);
    }

    #[test]
    fn bare_dates_mean_midnight_utc() {
        let revisions = vec![revision(1, "2024-01-02", json!("1"))];

        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let days = work_per_days(&revisions, &west).expect("dated history");
        assert_eq!(days["2024-01-01"], 1.0);
    }

    #[test]
    fn timestamps_without_offset_are_read_as_local_time() {
        let revisions = vec![
            revision(1, "2024-01-01 09:00:00", json!("4")),
            revision(2, "2024-01-02T23:30:00.123", json!("6")),
            revision(3, "2024-01-03T08:15", json!("6,5")),
        ];

        let cet = FixedOffset::east_opt(3600).unwrap();
        let days = work_per_days(&revisions, &cet).expect("dated history");
        assert_eq!(days["2024-01-01"], 4.0);
        assert_eq!(days["2024-01-02"], 2.0);
        assert_eq!(days["2024-01-03"], 0.5);
        assert_eq!(days.values().sum::<f64>(), 6.5);
    }

    #[test]
    fn logged_work_without_any_readable_date_is_rejected() {
        let revisions = vec![
            revision(1, "yesterday", json!("1")),
            revision(2, "", json!("4")),
        ];
        assert_eq!(work_per_days(&revisions, &Utc), None);

        let untouched = vec![revision(1, "yesterday", json!(null))];
        assert_eq!(work_per_days(&untouched, &Utc), Some(WorkPerDays::new()));
    }
}
