use reqwest::StatusCode;
use serde_json::{Value, json};
use tinydreamers::domain::image_sniff::ImageFormat;
use tinydreamers::infrastructure::client::FunctionsClient;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{SERVICE_KEY, TestApp, png_bytes, spawn_app};

async fn mount_source_png(app: &TestApp, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(40, 60)),
        )
        .mount(&app.images)
        .await;
}

async fn mount_upload(app: &TestApp, object: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/object/book-covers/{object}")))
        .and(header("x-upsert", "true"))
        .and(header("apikey", SERVICE_KEY))
        .and(header("content-type", "image/webp"))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({"Key": format!("book-covers/{object}")})),
        )
        .expect(1)
        .mount(&app.platform)
        .await;
}

#[tokio::test]
async fn converts_uploads_and_records_cover() {
    let app = spawn_app().await;
    mount_source_png(&app, "/covers/wild-things.png").await;
    mount_upload(&app, "covers/b1.webp", 200).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/book_covers"))
        .and(query_param("on_conflict", "book_id"))
        .and(header_exists("prefer"))
        .and(body_partial_json(json!({
            "book_id": "b1",
            "storage_path": "covers/b1.webp",
            "format": "webp",
            "width": 40,
            "height": 60
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.platform)
        .await;

    let client = FunctionsClient::from_base_url(
        &format!("{}/functions/v1", app.address),
        Some("user-jwt".to_string()),
    )
    .expect("Failed to build functions client");

    let source = format!("{}/covers/wild-things.png", app.images.uri());
    let cover = client
        .process_cover("b1", &source)
        .await
        .expect("Cover processing failed");

    assert_eq!(cover.book_id, "b1");
    assert_eq!(cover.storage_path, "covers/b1.webp");
    assert_eq!(cover.format, ImageFormat::Webp);
    assert_eq!((cover.width, cover.height), (40, 60));
    assert!(cover.file_size > 0);
    assert_eq!(cover.original_url, source);
    assert_eq!(
        cover.public_url,
        format!(
            "{}/storage/v1/object/public/book-covers/covers/b1.webp",
            app.platform.uri()
        )
    );
}

#[tokio::test]
async fn missing_bearer_token_is_401() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.images)
        .await;

    let response = app
        .client
        .post(app.function_url("process-cover"))
        .json(&json!({"coverUrl": format!("{}/c.png", app.images.uri()), "bookId": "b1"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let response = app
        .client
        .post(app.function_url("process-cover"))
        .header("authorization", "Basic dXNlcjpwYXNz")
        .json(&json!({"coverUrl": format!("{}/c.png", app.images.uri()), "bookId": "b1"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_fields_are_400() {
    let app = spawn_app().await;

    for payload in [
        json!({"bookId": "b1"}),
        json!({"coverUrl": "https://x/c.png", "bookId": "  "}),
        json!({"coverUrl": "https://x/c.png", "bookId": "../b1"}),
    ] {
        let response = app
            .client
            .post(app.function_url("process-cover"))
            .bearer_auth("user-jwt")
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn non_image_download_is_400() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/covers/not-an-image"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>gone</html>"),
        )
        .mount(&app.images)
        .await;

    let response = app
        .client
        .post(app.function_url("process-cover"))
        .bearer_auth("user-jwt")
        .json(&json!({
            "coverUrl": format!("{}/covers/not-an-image", app.images.uri()),
            "bookId": "b2"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn failed_download_is_500() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/covers/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.images)
        .await;

    let response = app
        .client
        .post(app.function_url("process-cover"))
        .bearer_auth("user-jwt")
        .json(&json!({
            "coverUrl": format!("{}/covers/missing.png", app.images.uri()),
            "bookId": "b3"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("404"))
    );
}

#[tokio::test]
async fn storage_failure_skips_metadata_and_is_500() {
    let app = spawn_app().await;
    mount_source_png(&app, "/covers/b4.png").await;
    mount_upload(&app, "covers/b4.webp", 400).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/book_covers"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.platform)
        .await;

    let response = app
        .client
        .post(app.function_url("process-cover"))
        .bearer_auth("user-jwt")
        .json(&json!({
            "coverUrl": format!("{}/covers/b4.png", app.images.uri()),
            "bookId": "b4"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}
