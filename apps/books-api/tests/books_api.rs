use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use books_api::books::JsonFileStore;
use books_api::state::AppState;

struct TestApp {
    server: TestServer,
    data_path: PathBuf,
    _dir: TempDir,
}

fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data").join("books.json");
    let app = books_api::app(AppState::new(Arc::new(JsonFileStore::new(&data_path))));

    TestApp {
        server: TestServer::new(app).unwrap(),
        data_path,
        _dir: dir,
    }
}

fn setup_with(books: Value) -> TestApp {
    let test_app = setup();
    std::fs::create_dir_all(test_app.data_path.parent().unwrap()).unwrap();
    std::fs::write(
        &test_app.data_path,
        serde_json::to_string_pretty(&books).unwrap(),
    )
    .unwrap();
    test_app
}

fn stored(test_app: &TestApp) -> Value {
    serde_json::from_slice(&std::fs::read(&test_app.data_path).unwrap()).unwrap()
}

fn titles(body: &Value) -> Vec<String> {
    body["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn root_returns_greeting() {
    let test_app = setup();
    let response = test_app.server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Bookstore API");
}

#[tokio::test]
async fn health_reports_version() {
    let test_app = setup();
    let body: Value = test_app.server.get("/health").await.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn list_without_file_is_empty() {
    let test_app = setup();
    let response = test_app.server.get("/books/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"books": [], "total": 0}));
    assert!(!test_app.data_path.exists());
}

#[tokio::test]
async fn list_sorting() {
    let test_app = setup_with(json!([
        {"id": 1, "title": "dune", "author": "Herbert", "genre": "sci-fi", "price": 10},
        {"id": 2, "title": "Anathem", "author": "Stephenson", "genre": "sci-fi", "price": 12},
        {"id": 3, "title": "Catch-22", "author": "Heller", "genre": "satire", "price": 8}
    ]));

    let body: Value = test_app.server.get("/books/").await.json();
    assert_eq!(body["total"], 3);
    assert_eq!(titles(&body), vec!["dune", "Anathem", "Catch-22"]);

    let body: Value = test_app
        .server
        .get("/books/")
        .add_query_param("sorting", "asc")
        .await
        .json();
    assert_eq!(titles(&body), vec!["Anathem", "Catch-22", "dune"]);

    let body: Value = test_app
        .server
        .get("/books")
        .add_query_param("sorting", "desc")
        .await
        .json();
    assert_eq!(titles(&body), vec!["dune", "Catch-22", "Anathem"]);
}

#[tokio::test]
async fn list_rejects_unknown_sorting() {
    let test_app = setup();
    let response = test_app
        .server
        .get("/books/")
        .add_query_param("sorting", "title")
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_error");
    assert!(body["detail"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn create_then_get() {
    let test_app = setup_with(json!([
        {"id": 3, "title": "Catch-22", "author": "Heller", "genre": "satire", "price": 8}
    ]));

    let response = test_app
        .server
        .post("/books/")
        .json(&json!({
            "title": "Пикник на обочине",
            "author": "Стругацкие",
            "genre": "фантастика",
            "price": 420.5,
            "year": 1972
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Book added");
    assert_eq!(body["book"]["id"], 4);
    assert_eq!(body["book"]["year"], 1972);

    let fetched: Value = test_app.server.get("/books/4").await.json();
    assert_eq!(fetched, body["book"]);

    let text = std::fs::read_to_string(&test_app.data_path).unwrap();
    assert!(text.contains("Пикник на обочине"));
}

#[tokio::test]
async fn create_creates_file_lazily() {
    let test_app = setup();
    assert!(!test_app.data_path.exists());

    test_app
        .server
        .post("/books")
        .json(&json!({"title": "T", "author": "A", "genre": "G", "price": 1}))
        .await
        .assert_status(StatusCode::CREATED);

    assert_eq!(stored(&test_app)[0]["id"], 1);
}

#[tokio::test]
async fn create_missing_author_is_rejected() {
    let test_app = setup();
    let response = test_app
        .server
        .post("/books/")
        .json(&json!({"title": "T", "genre": "G", "price": 1}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("author"));
    assert!(!test_app.data_path.exists());
}

#[tokio::test]
async fn create_non_numeric_price_is_rejected() {
    let test_app = setup();
    test_app
        .server
        .post("/books/")
        .json(&json!({"title": "T", "author": "A", "genre": "G", "price": "cheap"}))
        .expect_failure()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_non_object_body_is_rejected() {
    let test_app = setup();
    test_app
        .server
        .post("/books/")
        .json(&json!([{"title": "T"}]))
        .expect_failure()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_missing_and_invalid_id() {
    let test_app = setup();

    let response = test_app.server.get("/books/7").expect_failure().await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");

    test_app
        .server
        .get("/books/seven")
        .expect_failure()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn update_price_only() {
    let test_app = setup_with(json!([
        {"id": 1, "title": "Dune", "author": "Herbert", "genre": "sci-fi", "price": 10}
    ]));

    let response = test_app
        .server
        .put("/books/1")
        .json(&json!({"price": 12.99, "rating": 5}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Book updated");
    assert_eq!(
        body["book"],
        json!({"id": 1, "title": "Dune", "author": "Herbert", "genre": "sci-fi", "price": 12.99})
    );
    assert_eq!(stored(&test_app)[0], body["book"]);
}

#[tokio::test]
async fn update_missing_book() {
    let test_app = setup();
    test_app
        .server
        .put("/books/1")
        .json(&json!({"price": 1}))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_book() {
    let test_app = setup_with(json!([
        {"id": 1, "title": "A"},
        {"id": 2, "title": "B"}
    ]));

    let response = test_app.server.delete("/books/1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Book with id=1 deleted");

    assert_eq!(stored(&test_app), json!([{"id": 2, "title": "B"}]));
}

#[tokio::test]
async fn delete_missing_leaves_file_untouched() {
    let test_app = setup_with(json!([{"id": 1, "title": "A"}]));
    let before = std::fs::read(&test_app.data_path).unwrap();

    test_app
        .server
        .delete("/books/9")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert_eq!(std::fs::read(&test_app.data_path).unwrap(), before);
}

#[tokio::test]
async fn corrupt_file_is_storage_error() {
    let test_app = setup();
    std::fs::create_dir_all(test_app.data_path.parent().unwrap()).unwrap();
    std::fs::write(&test_app.data_path, r#"{"not": "a list"}"#).unwrap();

    let response = test_app.server.get("/books/").expect_failure().await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "storage_error");
    assert!(body["detail"].as_str().unwrap().contains("must be an array"));
}

#[tokio::test]
async fn malformed_json_body_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = books_api::app(AppState::new(Arc::new(JsonFileStore::new(
        dir.path().join("books.json"),
    ))));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/books/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"title\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn duplicate_sorting_param_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = books_api::app(AppState::new(Arc::new(JsonFileStore::new(
        dir.path().join("books.json"),
    ))));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/books/?sorting=asc&sorting=desc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["detail"].as_str().unwrap().contains("sorting"));
}
