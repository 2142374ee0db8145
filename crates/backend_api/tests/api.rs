use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use backend_api::{create_router, AppState, FileRecordRepository};
use models::Settings;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(dir: &tempfile::TempDir) -> Router {
    let settings = Settings {
        database_path: dir.path().join("database.json"),
        charts_dir: dir.path().join("charts"),
        ..Settings::default()
    };
    let repo = Arc::new(FileRecordRepository::new(&settings.database_path));
    create_router(AppState::new(repo, settings))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_section(app: &Router, owner: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/owners/{}/sections", owner),
        Some(json!({ "name": "Household" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["section"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_healthy() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(&app(&dir), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn summary_without_records_is_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(&app(&dir), "GET", "/api/owners/nobody/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_data");
    assert_eq!(body["owner_id"], "nobody");
}

#[tokio::test]
async fn blank_section_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        &app(&dir),
        "POST",
        "/api/owners/alice/sections",
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Section name required");
}

#[tokio::test]
async fn invalid_entry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let section_id = create_section(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/owners/alice/entries",
        Some(json!({ "section_id": section_id, "title": "Refund", "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid data");
}

#[tokio::test]
async fn saved_entries_flow_into_summary() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let section_id = create_section(&app, "alice").await;

    for (title, amount, kind, category) in [
        ("Salary", json!(1000), "income", "Salary"),
        ("Groceries", json!("150.5"), "expense", "Food"),
        ("Rent", json!(400), "expense", "Housing"),
    ] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/owners/alice/entries",
            Some(json!({
                "section_id": section_id,
                "title": title,
                "amount": amount,
                "type": kind,
                "category": category,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(body["entry"]["title"], title);
    }

    let (status, body) = send(&app, "GET", "/api/owners/alice/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["record_count"], 3);
    assert_eq!(body["months"].as_array().unwrap().len(), 1);
    assert_eq!(body["income"][0].as_f64().unwrap(), 1000.0);
    assert_eq!(body["expense"][0].as_f64().unwrap(), 550.5);
    assert_eq!(body["savings"][0].as_f64().unwrap(), 449.5);
    assert_eq!(body["expense_by_category"]["categories"], json!(["Housing", "Food"]));
    assert!(body["forecast"].is_null());

    let (status, _) = send(&app, "GET", "/api/owners/bob/summary", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn chart_export_writes_into_owner_directory() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let section_id = create_section(&app, "alice@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/owners/alice@example.com/entries",
        Some(json!({ "section_id": section_id, "title": "Lunch", "amount": 12, "category": "Food" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/owners/alice@example.com/charts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["written"].as_array().unwrap().len(), 2);
    assert_eq!(body["skipped"], json!(["expense_forecast.png"]));

    let owner_dir = dir
        .path()
        .join("charts")
        .join(utils::owner_directory_name("alice@example.com"));
    assert!(owner_dir.join("monthly_income_expense.png").is_file());
    assert!(owner_dir.join("category_expense_pie.png").is_file());
}

#[tokio::test]
async fn similar_owners_get_separate_chart_directories() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    for owner in ["a@x.com", "A.x_com"] {
        let section_id = create_section(&app, owner).await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/owners/{}/entries", owner),
            Some(json!({ "section_id": section_id, "title": "Lunch", "amount": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "POST", &format!("/api/owners/{}/charts", owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["output_dir"].as_str().unwrap(),
            dir.path()
                .join("charts")
                .join(utils::owner_directory_name(owner))
                .to_str()
                .unwrap()
        );
    }

    let dirs = std::fs::read_dir(dir.path().join("charts")).unwrap().count();
    assert_eq!(dirs, 2);
}

#[tokio::test]
async fn summary_skips_mistyped_records_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("database.json"),
        r#"{"entries": [
            {"email": "alice", "title": "Rent", "amount": 900, "month": "Jan", "year": 2024},
            {"email": "alice", "title": 5, "amount": 40, "month": 2, "year": 2024},
            17
        ]}"#,
    )
    .unwrap();

    let (status, body) = send(&app(&dir), "GET", "/api/owners/alice/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["months"], json!(["Jan 2024", "Feb 2024"]));
    assert_eq!(body["record_count"], 2);
}
