//! HTTP server for the query page and the JSON query endpoint
//!
//! - `GET /` serves the static query page
//! - `POST /process/` runs the pipeline for `{"question": "..."}`

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::pipeline::QueryPipeline;

const QUERY_PAGE: &str = include_str!("../templates/query.html");

/// Shared handler state; the pipeline holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
}

pub fn create_router(pipeline: Arc<QueryPipeline>) -> Router {
    Router::new()
        .route("/", get(query_page))
        .route(
            "/process/",
            post(process_query).fallback(method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Bind and serve until Ctrl-C.
pub async fn serve(addr: &str, pipeline: Arc<QueryPipeline>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, create_router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn query_page() -> Html<&'static str> {
    Html(QUERY_PAGE)
}

async fn process_query(State(state): State<AppState>, body: Bytes) -> Response {
    let data: Value = match serde_json::from_slice(&body) {
        Ok(data) => data,
        Err(e) => return internal_error(e.to_string()),
    };

    let Some(fields) = data.as_object() else {
        return internal_error("request body must be a JSON object".to_string());
    };

    let question = fields
        .get("question")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if question.is_empty() {
        warn!("Rejected request without a question");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No question provided" })),
        )
            .into_response();
    }

    let pipeline = state.pipeline.clone();
    match tokio::spawn(async move { pipeline.run(&question).await }).await {
        Ok(result) => Json(json!({
            "success": true,
            "answer": result.answer,
            "sql_query": result.sql_query,
            "raw_results": result.raw_results,
        }))
        .into_response(),
        Err(e) => {
            error!("Pipeline task failed: {}", e);
            internal_error(e.to_string())
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Only POST requests allowed" })),
    )
        .into_response()
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::testing::{Scripted, ScriptedProvider};
    use crate::llm::{LlmClient, LlmConfig};
    use crate::pipeline::PipelineConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(replies: Vec<Scripted>) -> (ScriptedProvider, Router) {
        let provider = ScriptedProvider::new(replies);
        let client =
            LlmClient::with_provider(LlmConfig::default(), Arc::new(provider.clone())).unwrap();
        let pipeline = QueryPipeline::new(PipelineConfig::new("unused.sqlite3"), client);
        (provider, create_router(Arc::new(pipeline)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/process/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_page() {
        let (_, app) = app(vec![]);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/process/"));
    }

    #[tokio::test]
    async fn test_missing_question_is_rejected() {
        for body in [r#"{"question": ""}"#, "{}", r#"{"question": null}"#] {
            let (provider, app) = app(vec![]);
            let response = app.oneshot(post_json(body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({ "error": "No question provided" })
            );
            assert!(provider.requests().is_empty());
        }
    }

    #[tokio::test]
    async fn test_get_on_process_is_405() {
        let (_, app) = app(vec![]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
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

    #[tokio::test]
    async fn test_invalid_json_is_500() {
        let (_, app) = app(vec![]);
        let response = app.oneshot(post_json("{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_model_failure_still_answers() {
        let (_, app) = app(vec![Scripted::Fail("no key".to_string())]);
        let response = app
            .oneshot(post_json(r#"{"question": "Total profit?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["answer"]
            .as_str()
            .unwrap()
            .starts_with("I encountered an error: Error generating SQL:"));
        assert_eq!(body["sql_query"], "");
        assert_eq!(body["raw_results"], "");
    }
}
