//! Rendered-page cache middleware.
//!
//! Caches successful GET responses to public routes and serves them until a
//! revalidation webhook marks the path stale.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use super::config::CacheConfig;
use super::store::{CachedPage, PageKey, PageStore};

const MAX_CACHED_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Shared cache state for middleware and the revalidation trigger.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub pages: Arc<PageStore>,
}

/// Middleware caching rendered pages.
///
/// Only GET requests are considered, and only `200 OK` responses are stored.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.is_enabled() {
        return next.run(request).await;
    }

    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = PageKey::new(
        request.uri().path().to_string(),
        request.uri().query().unwrap_or("").to_string(),
    );

    if let Some(cached) = cache.pages.get(&key) {
        debug!(outcome = "hit", "serving cached page");
        return build_response(cached);
    }

    debug!(outcome = "miss", "rendering page");
    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => {
            // Body collection failed mid-stream; nothing sane left to send.
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Oversized pages are served but never stored.
    if bytes.len() > MAX_CACHED_BODY_BYTES {
        debug!(
            size = bytes.len(),
            "page exceeds the cache body cap, skipping"
        );
        return Response::from_parts(parts, Body::from(bytes));
    }

    let cached = CachedPage {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };
    cache.pages.set(key, cached);

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedPage) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK));
    for (name, value) in &cached.headers {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
