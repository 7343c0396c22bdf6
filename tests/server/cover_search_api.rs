use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{GOOGLE_CX, GOOGLE_KEY, spawn_app};

#[tokio::test]
async fn returns_first_image_result() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", GOOGLE_KEY))
        .and(query_param("cx", GOOGLE_CX))
        .and(query_param("q", "Corduroy book cover"))
        .and(query_param("searchType", "image"))
        .and(query_param("fileType", "png"))
        .and(query_param("imgSize", "large"))
        .and(query_param("safe", "active"))
        .and(query_param("num", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "link": "https://images.example.com/corduroy.png",
                "image": {"thumbnailLink": "https://thumbs.example.com/corduroy"}
            }]
        })))
        .expect(1)
        .mount(&app.google)
        .await;

    let response = app
        .client
        .post(app.function_url("cover-search"))
        .header("origin", "http://localhost:8081")
        .json(&json!({"query": "Corduroy book cover", "fileType": "png"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body,
        json!({
            "coverUrl": "https://images.example.com/corduroy.png",
            "thumbnailUrl": "https://thumbs.example.com/corduroy"
        })
    );
}

#[tokio::test]
async fn no_results_is_a_null_cover() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "customsearch#search"})))
        .mount(&app.google)
        .await;

    let response = app
        .client
        .post(app.function_url("cover-search"))
        .json(&json!({"query": "An Unknown Book"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({"coverUrl": null, "thumbnailUrl": null}));
}

#[tokio::test]
async fn upstream_429_is_reported_as_quota_exceeded() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Quota exceeded for quota metric 'Queries'"}
        })))
        .mount(&app.google)
        .await;

    let response = app
        .client
        .post(app.function_url("cover-search"))
        .json(&json!({"query": "Corduroy", "fileType": "jpg"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "QUOTA_EXCEEDED");
    assert_eq!(body["message"], "Quota exceeded for quota metric 'Queries'");
    assert_eq!(body["details"]["error"]["code"], 429);
}

#[tokio::test]
async fn quota_reason_in_a_403_is_reported_as_quota_exceeded() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "Daily Limit Exceeded",
                "errors": [{"reason": "dailyLimitExceeded"}]
            }
        })))
        .mount(&app.google)
        .await;

    let response = app
        .client
        .post(app.function_url("cover-search"))
        .json(&json!({"query": "Corduroy"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "QUOTA_EXCEEDED");
}

#[tokio::test]
async fn other_upstream_failures_are_500() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid Value", "errors": [{"reason": "invalid"}]}
        })))
        .mount(&app.google)
        .await;

    let response = app
        .client
        .post(app.function_url("cover-search"))
        .json(&json!({"query": "Corduroy"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("400")));
}

#[tokio::test]
async fn invalid_requests_are_rejected_without_searching() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.google)
        .await;

    for payload in [
        json!({"query": "   "}),
        json!({"fileType": "png"}),
        json!({"query": "Corduroy", "fileType": "gif"}),
    ] {
        let response = app
            .client
            .post(app.function_url("cover-search"))
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body: Value = response.json().await.expect("Failed to parse response");
        assert!(body["error"].is_string());
    }

    let response = app
        .client
        .post(app.function_url("cover-search"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_methods_get_405() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.function_url("cover-search"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "method not allowed");
}

#[tokio::test]
async fn preflight_allows_post_from_any_origin() {
    let app = spawn_app().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.function_url("cover-search"))
        .header("origin", "http://localhost:8081")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization, content-type")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let methods = headers
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));

    let plain = app
        .client
        .request(reqwest::Method::OPTIONS, app.function_url("process-cover"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(plain.status(), StatusCode::OK);
}

#[tokio::test]
async fn error_responses_carry_cors_and_nosniff_headers() {
    let app = spawn_app().await;

    let rejected = app
        .client
        .post(app.function_url("cover-search"))
        .header("origin", "http://localhost:8081")
        .json(&json!({"query": ""}))
        .send()
        .await
        .expect("Failed to execute request");
    let unsupported = app
        .client
        .put(app.function_url("process-cover"))
        .header("origin", "http://localhost:8081")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unsupported.status(), StatusCode::METHOD_NOT_ALLOWED);
    for response in [&rejected, &unsupported] {
        let headers = response.headers();
        assert_eq!(
            headers
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            headers
                .get("x-content-type-options")
                .and_then(|v| v.to_str().ok()),
            Some("nosniff")
        );
    }
}
