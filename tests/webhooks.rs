use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use tower::ServiceExt;

use foglio::application::auth::{WebhookAuthenticator, compose_callback_hash};
use foglio::application::content::{ContentStore, StoreError};
use foglio::cache::{CacheConfig, CacheState, PageStore, RevalidateTrigger};
use foglio::domain::article::{ArticleContent, ArticleMetadata};
use foglio::domain::slug::is_valid_slug;
use foglio::infra::http::{self, HttpState, RouterState, WebhookState};

const CALLBACK_SECRET: &str = "callback-secret";
const REVALIDATE_SECRET: &str = "direct-secret";

/// In-memory content store counting backend fetches.
struct StaticStore {
    articles: HashMap<String, ArticleContent>,
    fetches: AtomicUsize,
}

impl StaticStore {
    fn with_article(slug: &str) -> Self {
        let metadata = ArticleMetadata {
            title: "Cached Article".to_string(),
            description: "An article used by the webhook tests".to_string(),
            og_title: None,
            og_description: None,
            og_image: None,
            author: Some("Ada".to_string()),
            published_at: None,
            slug: None,
            keywords: None,
        };
        let content = ArticleContent {
            html: "<p>hello from the store</p>".to_string(),
            metadata,
        };
        Self {
            articles: HashMap::from([(slug.to_string(), content)]),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentStore for StaticStore {
    async fn exists(&self, slug: &str) -> bool {
        is_valid_slug(slug) && self.articles.contains_key(slug)
    }

    async fn fetch(&self, slug: &str) -> Result<ArticleContent, StoreError> {
        if !is_valid_slug(slug) {
            return Err(StoreError::InvalidSlug);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.articles.get(slug).cloned().ok_or(StoreError::NotFound)
    }
}

struct TestApp {
    router: Router,
    pages: Arc<PageStore>,
    store: Arc<StaticStore>,
}

fn build_app(callback_secret: Option<&str>, revalidate_secret: Option<&str>) -> TestApp {
    let store = Arc::new(StaticStore::with_article("my-post"));
    let cache_config = CacheConfig::default();
    let pages = Arc::new(PageStore::new(&cache_config));

    let state = RouterState {
        http: HttpState {
            store: store.clone(),
            cms: None,
            cache: Some(CacheState {
                config: cache_config.clone(),
                pages: pages.clone(),
            }),
        },
        webhooks: WebhookState {
            auth: Arc::new(WebhookAuthenticator::new(
                callback_secret.map(str::to_string),
                revalidate_secret.map(str::to_string),
            )),
            trigger: Arc::new(RevalidateTrigger::new(cache_config, pages.clone())),
        },
    };

    TestApp {
        router: http::build_router(state),
        pages,
        store,
    }
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

// ---------------------------------------------------------------------------
// Hash-authenticated + CORS endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_webhook_accepts_a_valid_hash() {
    let app = build_app(Some(CALLBACK_SECRET), None);
    let hash = compose_callback_hash(CALLBACK_SECRET, "my-post");

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate-with-cors",
            serde_json::json!({"slug": "my-post", "secret": hash}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["revalidated"], true);
    assert!(body["now"].is_number());
}

#[tokio::test]
async fn cors_webhook_rejects_a_wrong_hash() {
    let app = build_app(Some(CALLBACK_SECRET), None);

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate-with-cors",
            serde_json::json!({"slug": "my-post", "secret": "wrong"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn cors_webhook_rejects_traversal_slugs_even_with_a_valid_hash() {
    let app = build_app(Some(CALLBACK_SECRET), None);
    let hash = compose_callback_hash(CALLBACK_SECRET, "../etc");

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate-with-cors",
            serde_json::json!({"slug": "../etc", "secret": hash}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid slug format");
    assert_eq!(body["slug"], "../etc");
}

#[tokio::test]
async fn cors_webhook_requires_both_fields() {
    let app = build_app(Some(CALLBACK_SECRET), None);

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate-with-cors",
            serde_json::json!({"slug": "my-post"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_webhook_fails_closed_without_a_configured_secret() {
    let app = build_app(None, None);
    let hash = compose_callback_hash(CALLBACK_SECRET, "my-post");

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate-with-cors",
            serde_json::json!({"slug": "my-post", "secret": hash}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cors_preflight_answers_with_cors_headers_and_no_body() {
    let app = build_app(Some(CALLBACK_SECRET), None);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/revalidate-with-cors")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    for name in [
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::ACCESS_CONTROL_ALLOW_HEADERS,
    ] {
        assert!(response.headers().contains_key(&name), "missing {name}");
    }
}

#[tokio::test]
async fn cors_status_endpoint_reports_healthy() {
    let app = build_app(Some(CALLBACK_SECRET), None);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/revalidate-with-cors")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "API Endpoint Is Running Smoothly");
}

// ---------------------------------------------------------------------------
// Direct-secret endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_webhook_accepts_the_configured_secret() {
    let app = build_app(None, Some(REVALIDATE_SECRET));

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate",
            serde_json::json!({"slug": "my-post", "secret": REVALIDATE_SECRET}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully revalidated /blogs/my-post");
}

#[tokio::test]
async fn direct_webhook_rejects_a_wrong_secret() {
    let app = build_app(None, Some(REVALIDATE_SECRET));

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate",
            serde_json::json!({"slug": "my-post", "secret": "wrong"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn direct_webhook_is_open_when_no_secret_is_configured() {
    let app = build_app(None, None);

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate",
            serde_json::json!({"slug": "my-post"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn direct_webhook_requires_a_slug() {
    let app = build_app(None, None);

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate",
            serde_json::json!({"secret": "whatever"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing slug parameter");
}

#[tokio::test]
async fn direct_webhook_rejects_invalid_slugs() {
    let app = build_app(None, None);

    let response = app
        .router
        .oneshot(post_json(
            "/api/revalidate",
            serde_json::json!({"slug": "nested/slug"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn direct_webhook_get_describes_usage() {
    let app = build_app(None, None);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/revalidate")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["method"], "POST");
}

// ---------------------------------------------------------------------------
// End-to-end cache behavior
// ---------------------------------------------------------------------------

async fn get_page(router: &Router, uri: &str) -> StatusCode {
    router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
        .status()
}

#[tokio::test]
async fn revalidation_evicts_the_cached_page() {
    let app = build_app(None, Some(REVALIDATE_SECRET));

    // First render populates the cache; the memoizer collapses the head and
    // body passes into one backend fetch.
    assert_eq!(get_page(&app.router, "/blogs/my-post").await, StatusCode::OK);
    assert_eq!(app.store.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(app.pages.len(), 1);

    // Second request is served from the cache without touching the store.
    assert_eq!(get_page(&app.router, "/blogs/my-post").await, StatusCode::OK);
    assert_eq!(app.store.fetches.load(Ordering::SeqCst), 1);

    // Webhook marks the page stale.
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/revalidate",
            serde_json::json!({"slug": "my-post", "secret": REVALIDATE_SECRET}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.pages.is_empty());

    // Next request re-renders from the store.
    assert_eq!(get_page(&app.router, "/blogs/my-post").await, StatusCode::OK);
    assert_eq!(app.store.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_articles_render_not_found_and_stay_uncached() {
    let app = build_app(None, None);

    assert_eq!(
        get_page(&app.router, "/blogs/absent").await,
        StatusCode::NOT_FOUND
    );
    assert!(app.pages.is_empty());
}

#[tokio::test]
async fn traversal_paths_render_not_found() {
    let app = build_app(None, None);

    assert_eq!(
        get_page(&app.router, "/blogs/..%2F..%2Fetc").await,
        StatusCode::NOT_FOUND
    );
}
