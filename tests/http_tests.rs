//! HTTP endpoint integration tests

mod fixtures;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use fixtures::{text, MockProvider, TestDb};
use sales_query::http_server::create_router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_process_returns_pipeline_result() {
    let db = TestDb::seeded().await;
    let provider = MockProvider::new(vec![
        text("SELECT product_name, COUNT(*) AS sold FROM sales_sale GROUP BY product_name ORDER BY product_name"),
        text("ABC sold once and XYZ sold twice."),
    ]);
    let app = create_router(Arc::new(db.pipeline(&provider)));

    let response = app
        .oneshot(post(r#"{"question": "How many of each product did we sell?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "answer": "ABC sold once and XYZ sold twice.",
            "sql_query": "SELECT product_name, COUNT(*) AS sold FROM sales_sale GROUP BY product_name ORDER BY product_name",
            "raw_results": r#"[{"product_name":"ABC","sold":1},{"product_name":"XYZ","sold":2}]"#,
        })
    );
}

#[tokio::test]
async fn test_execution_error_is_still_200() {
    let db = TestDb::seeded().await;
    let provider = MockProvider::new(vec![text("SELEC nonsense")]);
    let app = create_router(Arc::new(db.pipeline(&provider)));

    let response = app.oneshot(post(r#"{"question": "Broken?"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["sql_query"], "SELEC nonsense");
    assert_eq!(body["raw_results"], "");
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .starts_with("I encountered an error: Error executing SQL:"));
}

#[tokio::test]
async fn test_non_string_question_is_rejected() {
    let db = TestDb::empty().await;
    let provider = MockProvider::new(vec![]);
    let app = create_router(Arc::new(db.pipeline(&provider)));

    let response = app.oneshot(post(r#"{"question": 42}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "No question provided" })
    );
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_non_object_body_is_500() {
    let db = TestDb::empty().await;
    let provider = MockProvider::new(vec![]);
    let app = create_router(Arc::new(db.pipeline(&provider)));

    let response = app.oneshot(post(r#"["question"]"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_put_on_process_is_405() {
    let db = TestDb::empty().await;
    let provider = MockProvider::new(vec![]);
    let app = create_router(Arc::new(db.pipeline(&provider)));

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/process/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Only POST requests allowed" })
    );
}
