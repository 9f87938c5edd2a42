/// Tasks assigned to `user_display_name` that are in the current iteration
/// (To Do / In Progress) or were finished within the last two days.
pub fn my_tasks_query(user_display_name: &str) -> String {
    let user = escape_literal(user_display_name);
    format!(
        "SELECT [System.Id], [System.WorkItemType], [System.Title], [System.AssignedTo], \
[System.State], [System.Tags], [Microsoft.VSTS.Scheduling.EstimatedWork], \
[Microsoft.VSTS.Scheduling.CompletedWork], [System.IterationPath]
FROM WorkItems
WHERE [System.TeamProject] = @project AND [System.WorkItemType] = 'Task' AND [System.AssignedTo] = '{user}'
    AND (
        ([System.ChangedDate] >= @today - 2 AND [System.ChangedDate] <= @today AND [System.State] = 'Done')
        OR ([System.State] = 'In Progress' AND [System.IterationPath] = @currentIteration)
        OR ([System.State] = 'To Do' AND [System.IterationPath] = @currentIteration)
    )
ORDER BY [State], [Changed Date], [Completed Work] DESC"
    )
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_on_the_assigned_user() {
        let query = my_tasks_query("Alice Smith");
        assert!(query.contains("[System.AssignedTo] = 'Alice Smith'"));
        assert!(query.contains("@currentIteration"));
        assert!(query.ends_with("[Completed Work] DESC"));
    }

    #[test]
    fn quotes_in_names_cannot_break_out_of_the_literal() {
        let query = my_tasks_query("Sean O'Brien");
        assert!(query.contains("[System.AssignedTo] = 'Sean O''Brien'"));
    }
}
