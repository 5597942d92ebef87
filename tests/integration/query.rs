use pretty_assertions::assert_eq;
use serde_json::json;
use table_crafter::{
    api::{ApiError, QueryData, QueryRequest, QueryResponse},
    query::{QueryFailure, QueryRunner, EMPTY_QUERY, NO_RESULTS, NO_RESULTS_ADVISORY},
};

use crate::test_utils::{MockApi, Recorder};

fn rows(value: serde_json::Value) -> Option<QueryData> {
    Some(serde_json::from_value(value).unwrap())
}

fn success(sql: Option<&str>, data: serde_json::Value) -> QueryResponse {
    QueryResponse {
        status: Some("Query executed successfully".to_string()),
        query: sql.map(str::to_string),
        data: rows(data),
        ..QueryResponse::default()
    }
}

/// Answers queries with `responses`, in order.
fn scripted(responses: Vec<Result<QueryResponse, ApiError>>) -> (MockApi, Recorder<QueryRequest>) {
    let requests = Recorder::new();
    let recorded = requests.clone();
    let mut responses = responses.into_iter();
    let mut api = MockApi::new();
    api.expect_query().returning(move |request| {
        recorded.push(request);
        responses.next().expect("unexpected query")
    });
    (api, requests)
}

#[tokio::test]
async fn empty_translation_keeps_sql_and_shows_placeholder() {
    let sql = "SELECT * FROM users WHERE name IS NULL";
    let (api, requests) = scripted(vec![Ok(success(Some(sql), json!([])))]);
    let mut runner = QueryRunner::new(api.into_arc());

    let panel = runner.run("users without a name", true).await;
    assert_eq!(panel.translated_sql.as_deref(), Some(sql));
    assert_eq!(panel.placeholder.as_deref(), Some(NO_RESULTS));
    assert_eq!(panel.failure, None);
    assert_eq!(panel.advisory, None);
    assert!(panel.rows.is_empty());

    assert_eq!(
        requests.calls(),
        vec![QueryRequest { query: "users without a name".to_string(), is_natural_language: true }]
    );
}

#[tokio::test]
async fn direct_run_highlights_rows_and_raises_advisory_when_empty() {
    let sql = "SELECT id, name FROM users";
    let (api, requests) = scripted(vec![
        Ok(success(None, json!([]))),
        Ok(success(None, json!([{"id": 1, "name": "Grace"}, {"id": 2, "name": null}]))),
    ]);
    let mut runner = QueryRunner::new(api.into_arc());

    let panel = runner.run_direct(sql).await;
    assert_eq!(panel.advisory.as_deref(), Some(NO_RESULTS_ADVISORY));
    assert_eq!(panel.placeholder.as_deref(), Some(NO_RESULTS));
    assert!(!panel.highlight);

    let panel = runner.run_direct(sql).await.clone();
    assert_eq!(panel.advisory, None);
    assert!(panel.highlight);
    assert_eq!(panel.translated_sql.as_deref(), Some(sql));
    assert_eq!(panel.headers, vec!["id", "name"]);
    assert_eq!(panel.rows, vec![vec!["1", "Grace"], vec!["2", ""]]);

    assert!(runner.clear_highlight(runner.highlight_ticket()));
    assert!(!runner.panel().highlight);
    assert!(requests.calls().iter().all(|request| !request.is_natural_language));
}

#[tokio::test]
async fn highlight_clear_from_an_earlier_run_is_ignored() {
    let sql = "SELECT id FROM users";
    let (api, _) = scripted(vec![Ok(success(None, json!([{"id": 1}]))), Ok(success(None, json!([{"id": 2}])))]);
    let mut runner = QueryRunner::new(api.into_arc());

    runner.run_direct(sql).await;
    let first = runner.highlight_ticket();
    runner.run_direct(sql).await;
    let second = runner.highlight_ticket();
    assert_ne!(first, second);

    assert!(!runner.clear_highlight(first));
    assert!(runner.panel().highlight);
    assert!(runner.clear_highlight(second));
    assert!(!runner.panel().highlight);
    assert!(!runner.clear_highlight(second));
}

#[tokio::test]
async fn reported_errors_carry_their_traceback() {
    let (api, _) = scripted(vec![
        Ok(success(Some("SELECT 1"), json!([{"one": 1}]))),
        Err(ApiError::Reported {
            message: "Unknown column 'nme'".to_string(),
            traceback: Some("Traceback (most recent call last):\n  ...".to_string()),
        }),
    ]);
    let mut runner = QueryRunner::new(api.into_arc());
    runner.run("SELECT 1", false).await;

    let panel = runner.run("SELECT nme FROM users", false).await;
    assert_eq!(
        panel.failure,
        Some(QueryFailure {
            message: "Unknown column 'nme'".to_string(),
            traceback: Some("Traceback (most recent call last):\n  ...".to_string()),
        })
    );
    assert!(panel.rows.is_empty());
    assert_eq!(panel.translated_sql, None);
}

#[tokio::test]
async fn direct_run_failure_keeps_the_sql_for_another_try() {
    let (api, _) = scripted(vec![Err(ApiError::reported("You have an error in your SQL syntax"))]);
    let mut runner = QueryRunner::new(api.into_arc());

    let panel = runner.run_direct("SELEC * FROM users").await;
    assert_eq!(panel.translated_sql.as_deref(), Some("SELEC * FROM users"));
    assert_eq!(panel.advisory.as_deref(), Some(NO_RESULTS_ADVISORY));
    assert_eq!(panel.failure.as_ref().map(|f| f.message.as_str()), Some("You have an error in your SQL syntax"));
}

#[tokio::test]
async fn blank_queries_are_not_sent() {
    let mut api = MockApi::new();
    api.expect_query().never();
    let mut runner = QueryRunner::new(api.into_arc());

    assert_eq!(runner.run("   ", true).await.status.as_deref(), Some(EMPTY_QUERY));
    assert_eq!(runner.run_direct("").await.status.as_deref(), Some(EMPTY_QUERY));
}

#[tokio::test]
async fn transport_failures_are_reported_on_the_status_line() {
    let (api, _) = scripted(vec![Err(ApiError::Transport("connection refused".to_string()))]);
    let mut runner = QueryRunner::new(api.into_arc());

    let panel = runner.run("show users", true).await;
    assert_eq!(panel.status.as_deref(), Some("Failed to execute query: connection refused"));
    assert_eq!(panel.failure.as_ref().map(|f| f.message.as_str()), Some("Request failed: connection refused"));
}

#[tokio::test]
async fn warnings_and_per_table_results_are_shown() {
    let response = QueryResponse {
        warning: Some("Query was corrected".to_string()),
        note: Some("Showing all tables".to_string()),
        original_error: Some("Unknown column 'x'".to_string()),
        ..success(None, json!({"users": [{"id": 1}], "notes": [{"id": 7, "name": "todo"}]}))
    };
    let (api, _) = scripted(vec![Ok(response)]);
    let mut runner = QueryRunner::new(api.into_arc());

    let panel = runner.run("show everything", true).await;
    assert_eq!(
        panel.notices,
        vec!["Warning: Query was corrected", "Showing all tables", "Original error: Unknown column 'x'"]
    );
    assert_eq!(panel.headers, vec!["table", "id", "name"]);
    assert_eq!(panel.rows[0], vec!["users", "1", ""]);
    assert_eq!(panel.rows[1], vec!["notes", "7", "todo"]);
}
