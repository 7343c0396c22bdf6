use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::json;
use tinydreamers::application::services::CoverPipeline;
use tinydreamers::domain::blank_images::BlankImageCache;
use tinydreamers::domain::clock::{Clock, SystemClock};
use tinydreamers::domain::quota::QuotaState;
use tinydreamers::domain::repositories::CoverSource;
use tinydreamers::infrastructure::cover_search::FunctionCoverSearch;
use tinydreamers::infrastructure::google_books::GoogleBooks;
use tinydreamers::infrastructure::open_library::OpenLibrary;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TITLE: &str = "Where the Wild Things Are";
const AUTHOR: &str = "Maurice Sendak";
const ISBN: &str = "9780060254926";

struct Harness {
    functions: MockServer,
    catalogs: MockServer,
    quota: Arc<QuotaState>,
    pipeline: CoverPipeline,
}

async fn harness() -> Harness {
    let functions = MockServer::start().await;
    let catalogs = MockServer::start().await;
    let http = Client::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let quota = Arc::new(QuotaState::new(Arc::clone(&clock)));
    let free_sources: Vec<Arc<dyn CoverSource>> = vec![
        Arc::new(OpenLibrary::with_urls(
            http.clone(),
            &catalogs.uri(),
            &format!("{}/covers", catalogs.uri()),
        )),
        Arc::new(GoogleBooks::with_url(http.clone(), &catalogs.uri())),
    ];
    let pipeline = CoverPipeline::new(
        Arc::new(FunctionCoverSearch::new(
            http,
            &functions.uri(),
            Some("anon-key".to_string()),
        )),
        free_sources,
        Arc::clone(&quota),
        Arc::new(BlankImageCache::new(clock)),
    );

    Harness {
        functions,
        catalogs,
        quota,
        pipeline,
    }
}

async fn mount_open_library_cover(server: &MockServer, cover_id: i64) {
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"docs": [{"cover_i": cover_id}]})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn quota_hit_skips_paid_search_for_the_cooldown() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/cover-search"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "QUOTA_EXCEEDED"})))
        .expect(1)
        .mount(&h.functions)
        .await;
    mount_open_library_cover(&h.catalogs, 240_726).await;

    for _ in 0..2 {
        let urls = h
            .pipeline
            .get_best_cover_url(Some(ISBN), TITLE, Some(AUTHOR))
            .await;
        assert_eq!(
            urls.cover_url,
            Some(format!("{}/covers/b/id/240726-L.jpg", h.catalogs.uri()))
        );
        assert_eq!(
            urls.thumbnail_url,
            Some(format!("{}/covers/b/id/240726-M.jpg", h.catalogs.uri()))
        );
    }

    assert!(h.quota.is_exceeded());
}

#[tokio::test]
async fn expired_quota_flag_retries_paid_search() {
    let h = harness().await;
    h.quota.mark_exceeded_at(Utc::now() - Duration::hours(25));

    Mock::given(method("POST"))
        .and(path("/cover-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coverUrl": "https://images.example.com/wild-things.jpg",
            "thumbnailUrl": "https://thumbs.example.com/wild-things"
        })))
        .expect(1)
        .mount(&h.functions)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.catalogs)
        .await;

    let urls = h
        .pipeline
        .get_best_cover_url(Some(ISBN), TITLE, Some(AUTHOR))
        .await;

    assert_eq!(
        urls.cover_url.as_deref(),
        Some("https://images.example.com/wild-things.jpg")
    );
    assert!(!h.quota.is_exceeded());
}

#[tokio::test]
async fn hit_on_third_attempt_skips_the_rest() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/cover-search"))
        .and(body_partial_json(json!({
            "query": format!("\"{TITLE}\" {AUTHOR} book cover"),
            "fileType": "jpg"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coverUrl": "https://images.example.com/third.jpg",
            "thumbnailUrl": null
        })))
        .expect(1)
        .mount(&h.functions)
        .await;
    Mock::given(method("POST"))
        .and(path("/cover-search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"coverUrl": null, "thumbnailUrl": null})),
        )
        .expect(2)
        .mount(&h.functions)
        .await;

    let urls = h
        .pipeline
        .get_best_cover_url(Some(ISBN), TITLE, Some(AUTHOR))
        .await;

    assert_eq!(
        urls.cover_url.as_deref(),
        Some("https://images.example.com/third.jpg")
    );
    assert!(urls.thumbnail_url.is_none());
}

#[tokio::test]
async fn google_books_is_used_when_open_library_has_no_cover() {
    let h = harness().await;
    h.quota.mark_exceeded();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.functions)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("title", "Corduroy"))
        .and(query_param("author", "Don Freeman"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": [{}]})))
        .expect(1)
        .mount(&h.catalogs)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", r#"intitle:Corduroy inauthor:"Don Freeman""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "volumeInfo": {
                    "imageLinks": {
                        "smallThumbnail": "http://books.google.com/books/content?id=x&zoom=5&edge=curl",
                        "thumbnail": "http://books.google.com/books/content?id=x&zoom=1&edge=curl"
                    }
                }
            }]
        })))
        .expect(1)
        .mount(&h.catalogs)
        .await;

    let urls = h
        .pipeline
        .get_best_cover_url(None, "Corduroy", Some("Don Freeman"))
        .await;

    assert_eq!(
        urls.cover_url.as_deref(),
        Some("https://books.google.com/books/content?id=x&zoom=2")
    );
    assert_eq!(
        urls.thumbnail_url.as_deref(),
        Some("https://books.google.com/books/content?id=x&zoom=5")
    );
}

#[tokio::test]
async fn exhausted_sources_give_an_empty_result() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/cover-search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(6)
        .mount(&h.functions)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.catalogs)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalItems": 0})))
        .mount(&h.catalogs)
        .await;

    let urls = h
        .pipeline
        .get_best_cover_url(None, "Goodnight Moon", Some("Margaret Wise Brown"))
        .await;

    assert!(urls.cover_url.is_none());
    assert!(urls.thumbnail_url.is_none());
    assert!(!h.quota.is_exceeded());
}
