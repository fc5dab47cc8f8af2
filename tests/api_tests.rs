mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use ddg_gateway::api::access_log::QueryTerm;
use ddg_gateway::api::create_router;
use ddg_gateway::api::models::ErrorBody;
use ddg_gateway::data_models::{IMAGE_OPTIONS, TEXT_OPTIONS};
use ddg_gateway::query_engine::QueryEngine;

use common::{Call, Counters, StubBackend, record};

fn app(stub: StubBackend) -> (Router, Counters) {
    let counters = stub.counters.clone();
    (create_router(Arc::new(QueryEngine::new(stub))), counters)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn results_of(response: Response) -> Vec<Value> {
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    body["results"].as_array().cloned().unwrap()
}

#[tokio::test]
async fn test_get_search_truncates_to_max_results() {
    let (app, counters) = app(StubBackend::yielding(5));

    let response = app
        .oneshot(get("/search?q=duck&max_results=3"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = body_text(response).await;
    let expected = serde_json::json!({
        "results": [record("text", 0), record("text", 1), record("text", 2)]
    });
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), expected);
    assert_eq!(counters.pulled(), 3);
}

#[tokio::test]
async fn test_post_images_defaults_to_ten() {
    let (app, counters) = app(StubBackend::yielding(15));

    let response = app
        .oneshot(post_form("/searchImages", "q=cat"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let results = results_of(response).await;
    assert_eq!(results.len(), 10);
    assert_eq!(results[9]["title"], "images result 9");
    assert_eq!(counters.pulled(), 10);
}

#[tokio::test]
async fn test_every_endpoint_accepts_get_and_post() {
    for (path, label) in [
        ("/search", "text"),
        ("/searchAnswers", "answers"),
        ("/searchImages", "images"),
        ("/searchVideos", "videos"),
    ] {
        let (app, _) = app(StubBackend::yielding(4));
        let response = app
            .clone()
            .oneshot(get(&format!("{path}?q=owl&max_results=2")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        let results = results_of(response).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], format!("{label} result 0"));

        let response = app
            .oneshot(post_form(path, "q=owl&max_results=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "POST {path}");
        assert_eq!(results_of(response).await.len(), 1);
    }
}

#[tokio::test]
async fn test_missing_query_never_reaches_backend() {
    let (app, counters) = app(StubBackend::yielding(5));

    let responses = [
        app.clone().oneshot(get("/search?max_results=3")).await.unwrap(),
        app.clone()
            .oneshot(post_form("/searchVideos", "max_results=3"))
            .await
            .unwrap(),
        app.clone().oneshot(get("/searchAnswers?q=")).await.unwrap(),
    ];

    for response in responses {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<QueryTerm>().is_none());
        let body: ErrorBody = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body.error, "missing_parameter");
    }
    assert_eq!(counters.opened(), 0);
}

#[tokio::test]
async fn test_post_without_form_body_is_missing_query() {
    let (app, counters) = app(StubBackend::yielding(5));

    let request = Request::builder()
        .method("POST")
        .uri("/search?q=ignored")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"q":"duck"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(counters.opened(), 0);
}

#[tokio::test]
async fn test_non_numeric_max_results_is_invalid() {
    let (app, counters) = app(StubBackend::yielding(5));

    let response = app
        .oneshot(get("/search?q=duck&max_results=abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // The term is known even though the request was rejected.
    assert_eq!(
        response.extensions().get::<QueryTerm>(),
        Some(&QueryTerm("duck".to_string()))
    );
    let body: ErrorBody = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body.error, "invalid_parameter");
    assert!(body.message.contains("max_results"));
    assert_eq!(counters.opened(), 0);
}

#[tokio::test]
async fn test_repeated_parameters_use_first_occurrence() {
    let (app, counters) = app(StubBackend::yielding(8));

    let response = app
        .clone()
        .oneshot(get("/search?q=duck&max_results=3&max_results=4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(results_of(response).await.len(), 3);

    let response = app
        .clone()
        .oneshot(get("/search?q=duck&q=goose"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.extensions().get::<QueryTerm>(),
        Some(&QueryTerm("duck".to_string()))
    );
    assert_eq!(results_of(response).await.len(), 8);

    let response = app
        .oneshot(post_form(
            "/searchImages",
            "q=duck&q=goose&max_results=2&max_results=9",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.extensions().get::<QueryTerm>(),
        Some(&QueryTerm("duck".to_string()))
    );
    assert_eq!(results_of(response).await.len(), 2);

    assert_eq!(counters.opened(), 3);
    assert_eq!(
        counters.calls(),
        vec![
            Call::Text("duck".into(), TEXT_OPTIONS),
            Call::Text("duck".into(), TEXT_OPTIONS),
            Call::Images("duck".into(), IMAGE_OPTIONS),
        ]
    );
}

#[tokio::test]
async fn test_backend_failure_returns_no_partial_results() {
    let (app, counters) = app(StubBackend::failing_at(10, 2));

    let response = app
        .oneshot(get("/searchVideos?q=storm&max_results=5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.extensions().get::<QueryTerm>(),
        Some(&QueryTerm("storm".to_string()))
    );
    let body = body_text(response).await;
    let error: ErrorBody = serde_json::from_str(&body).unwrap();
    assert_eq!(error.error, "backend_error");
    assert!(!body.contains("results"));
    // The upstream cause stays in the logs.
    assert!(!body.contains("upstream dropped"));
    assert_eq!(counters.released(), 1);
}

#[tokio::test]
async fn test_zero_max_results_returns_empty_list() {
    let (app, counters) = app(StubBackend::yielding(5));

    let response = app
        .oneshot(get("/searchAnswers?q=duck&max_results=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"results":[]}"#);
    assert_eq!(counters.pulled(), 0);
}

#[tokio::test]
async fn test_repeated_query_is_idempotent() {
    let (app, _) = app(StubBackend::yielding(6));

    let first = body_text(app.clone().oneshot(get("/search?q=heron")).await.unwrap()).await;
    let second = body_text(app.oneshot(get("/search?q=heron")).await.unwrap()).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_non_ascii_query_and_results_are_literal() {
    let (app, _) = app(StubBackend::yielding(1));

    let response = app
        .oneshot(post_form("/search", "q=%E9%B8%AD%E5%AD%90"))
        .await
        .unwrap();

    assert_eq!(
        response.extensions().get::<QueryTerm>(),
        Some(&QueryTerm("鸭子".to_string()))
    );
    let body = body_text(response).await;
    assert!(!body.contains("\\u"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, counters) = app(StubBackend::yielding(1));

    let response = app.oneshot(get("/searchNews?q=x")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(counters.opened(), 0);
}
