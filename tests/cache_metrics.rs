use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{Method, Request, StatusCode},
    middleware,
    routing::get,
};
use metrics_util::debugging::DebuggingRecorder;
use tower::ServiceExt;

use foglio::cache::{CacheConfig, CacheState, PageStore, RevalidateTrigger, page_cache_layer};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let config = CacheConfig {
        page_limit: 1,
        ..Default::default()
    };
    let pages = Arc::new(PageStore::new(&config));
    let cache_state = CacheState {
        config: config.clone(),
        pages: pages.clone(),
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/blogs/{slug}",
            get(move |Path(_slug): Path<String>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        )
        .layer(middleware::from_fn_with_state(cache_state, page_cache_layer));

    // miss, hit, then an eviction via the one-entry capacity.
    for uri in ["/blogs/one", "/blogs/one", "/blogs/two"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    // and a webhook-style revalidation.
    let trigger = RevalidateTrigger::new(config, pages);
    trigger.revalidate("/blogs/two");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "foglio_page_cache_hit_total",
        "foglio_page_cache_miss_total",
        "foglio_page_cache_evict_total",
        "foglio_revalidate_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
