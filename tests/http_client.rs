use serde_json::json;
use tfs_desk_lib::client::{DirectorySource, TeamContext, TfsClient, TrackingSource};
use tfs_desk_lib::commands::tasks::{apply_work_span_internal, get_task_info_internal};
use tfs_desk_lib::error::TrackerError;
use tfs_desk_lib::models::connection::ConnectionSettings;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TfsClient {
    TfsClient::new(&ConnectionSettings {
        api_url: server.uri(),
        username: "CORP\\svc".to_string(),
        access_token: "token".to_string(),
        ..ConnectionSettings::default()
    })
    .expect("client")
}

fn task_body(id: i64, completed: f64, remaining: f64) -> serde_json::Value {
    json!({
        "id": id,
        "rev": 3,
        "fields": {
            "System.WorkItemType": "Task",
            "System.Title": "Implement export",
            "System.State": "In Progress",
            "Microsoft.VSTS.Scheduling.CompletedWork": completed,
            "Microsoft.VSTS.Scheduling.RemainingWork": remaining
        }
    })
}

#[tokio::test]
async fn requests_carry_api_version_and_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/wit/workitems/7"))
        .and(query_param("api-version", "4.1"))
        .and(basic_auth("CORP\\svc", "token"))
        .and(query_param(
            "fields",
            "System.WorkItemType,System.Title,System.AssignedTo,System.State,System.Tags,\
Microsoft.VSTS.Scheduling.EstimatedWork,Microsoft.VSTS.Scheduling.CompletedWork,\
Microsoft.VSTS.Scheduling.RemainingWork,Microsoft.VSTS.Common.Activity",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(7, 2.0, 1.0)))
        .expect(1)
        .mount(&server)
        .await;

    let task = get_task_info_internal(&client_for(&server), 7)
        .await
        .expect("task info");
    assert_eq!(task.title.as_deref(), Some("Implement export"));
    assert_eq!(task.completed_work, 2.0);
}

#[tokio::test]
async fn missing_work_item_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/wit/workitems/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.get_work_item(404, &["System.Title"]).await, Ok(None));

    let err = get_task_info_internal(&client, 404)
        .await
        .expect_err("missing item");
    assert_eq!(err, TrackerError::NotFound(404));
}

#[tokio::test]
async fn paging_stops_after_a_short_page() {
    let server = MockServer::start().await;
    let full_page: Vec<_> = (0..100)
        .map(|i| json!({ "id": format!("p{i}"), "name": format!("Project {i}") }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/_apis/projects"))
        .and(query_param("$top", "100"))
        .and(query_param("$skip", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "count": 100, "value": full_page })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_apis/projects"))
        .and(query_param("$skip", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "value": [{ "id": "p100", "name": "Project 100", "description": "last" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = client_for(&server).list_projects().await.expect("projects");

    assert_eq!(projects.len(), 101);
    assert_eq!(projects[0].id, "p0");
    assert_eq!(projects[100].description.as_deref(), Some("last"));
}

#[tokio::test]
async fn service_error_message_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/projects/p1/teams"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "TF400813: The user is not authorized to access this resource.",
            "typeKey": "UnauthorizedRequestException"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_teams("p1")
        .await
        .expect_err("unauthorized");

    assert_eq!(err.kind(), "SourceUnavailable");
    assert!(err.to_string().contains("TF400813"), "{err}");
    assert!(err.to_string().contains("401"), "{err}");
}

#[tokio::test]
async fn work_span_is_sent_as_json_patch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/wit/workitems/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(42, 2.0, 1.0)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/_apis/wit/workitems/42"))
        .and(header("content-type", "application/json-patch+json"))
        .and(body_json(json!([
            { "op": "replace", "path": "/fields/Microsoft.VSTS.Scheduling.CompletedWork", "value": 3.5 },
            { "op": "replace", "path": "/fields/Microsoft.VSTS.Scheduling.RemainingWork", "value": 0.0 },
            { "op": "add", "path": "/fields/System.History", "value": "Work progress by: Alice" }
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(42, 3.5, 0.0)))
        .expect(1)
        .mount(&server)
        .await;

    let updated = apply_work_span_internal(&client_for(&server), 42, &json!("1,5"), "Alice")
        .await
        .expect("apply work span");

    assert_eq!(updated.completed_work, 3.5);
    assert_eq!(updated.remaining_work, 0.0);
}

#[tokio::test]
async fn rejected_patch_maps_to_update_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/wit/workitems/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(8, 1.0, 1.0)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/_apis/wit/workitems/8"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = apply_work_span_internal(&client_for(&server), 8, &json!(1), "Alice")
        .await
        .expect_err("update must fail");
    assert_eq!(err, TrackerError::UpdateFailed(8));
}

#[tokio::test]
async fn batch_fetch_skips_items_deleted_meanwhile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/wit/workitems"))
        .and(query_param("ids", "9,12"))
        .and(query_param("errorPolicy", "omit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "value": [task_body(9, 1.0, 2.0), null]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = client_for(&server)
        .get_work_items(&[9, 12], &["System.Title"])
        .await
        .expect("work items");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 9);
}

#[tokio::test]
async fn wiql_runs_in_project_scope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/project-1/_apis/wit/wiql"))
        .and(body_json(json!({ "query": "SELECT [System.Id] FROM WorkItems" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queryType": "flat",
            "workItems": [{ "id": 12 }, { "id": 9 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let context = TeamContext {
        project_id: "project-1".to_string(),
        team: String::new(),
    };
    let result = client_for(&server)
        .query_by_wiql("SELECT [System.Id] FROM WorkItems", &context)
        .await
        .expect("wiql");

    let ids: Vec<i64> = result.work_items.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![12, 9]);
}
