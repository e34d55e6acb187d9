//! Revalidation webhooks.
//!
//! Two variants share the revalidation trigger but differ in authentication
//! and path construction:
//!
//! * `/api/revalidate` — direct shared secret (optional), revalidates
//!   `/blogs/{slug}`.
//! * `/api/revalidate-with-cors` — keyed callback hash (secret mandatory),
//!   revalidates the literal slug, and answers cross-origin callers: its
//!   upstream trigger chain ends in a browser-adjacent automation hook.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    application::{auth::WebhookAuthenticator, error::ErrorReport},
    cache::RevalidateTrigger,
    domain::slug::{is_valid_cms_slug, is_valid_slug},
};

use super::RouterState;
use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct WebhookState {
    pub auth: Arc<WebhookAuthenticator>,
    pub trigger: Arc<RevalidateTrigger>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RevalidateBody {
    slug: Option<String>,
    secret: Option<String>,
}

pub fn build_router() -> Router<RouterState> {
    Router::new()
        .route(
            "/api/revalidate",
            get(direct_usage).post(direct_revalidate),
        )
        .route(
            "/api/revalidate-with-cors",
            get(cors_status)
                .post(cors_revalidate)
                .options(cors_preflight),
        )
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

// ---------------------------------------------------------------------------
// Direct-secret variant
// ---------------------------------------------------------------------------

async fn direct_revalidate(
    State(state): State<WebhookState>,
    body: Result<Json<RevalidateBody>, JsonRejection>,
) -> Response {
    const SOURCE: &str = "infra::http::webhooks::direct_revalidate";

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return failure(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid JSON body",
                rejection.to_string(),
            );
        }
    };

    let Some(slug) = body.slug else {
        return failure(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Missing slug parameter",
            "request body carried no slug",
        );
    };

    if !state.auth.is_direct_secret_valid(body.secret.as_deref()) {
        return failure(
            SOURCE,
            StatusCode::UNAUTHORIZED,
            "Invalid secret",
            "direct secret mismatch",
        );
    }

    if !is_valid_slug(&slug) {
        return failure(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid slug format",
            format!("slug `{slug}` failed validation"),
        );
    }

    let path = format!("/blogs/{slug}");
    state.trigger.revalidate(&path);

    Json(json!({
        "success": true,
        "message": format!("Successfully revalidated {path}"),
        "revalidated": true,
        "now": epoch_millis(),
    }))
    .into_response()
}

async fn direct_usage() -> Response {
    Json(json!({
        "message": "Revalidation endpoint is working. Use POST with { \"slug\": \"article-slug\", \"secret\": \"your-secret\" }",
        "method": "POST",
        "requiredFields": ["slug"],
        "optionalFields": ["secret"],
    }))
    .into_response()
}

// ---------------------------------------------------------------------------
// Hash-authenticated + CORS variant
// ---------------------------------------------------------------------------

async fn cors_revalidate(
    State(state): State<WebhookState>,
    body: Result<Json<RevalidateBody>, JsonRejection>,
) -> Response {
    const SOURCE: &str = "infra::http::webhooks::cors_revalidate";

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return with_cors(failure(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid JSON body",
                rejection.to_string(),
            ));
        }
    };

    let (Some(slug), Some(secret)) = (body.slug, body.secret) else {
        return with_cors(failure(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Missing required parameter",
            "request body must carry both slug and secret",
        ));
    };

    if !state.auth.is_callback_hash_valid(&slug, &secret) {
        return with_cors(failure(
            SOURCE,
            StatusCode::UNAUTHORIZED,
            "Invalid secret",
            "callback hash mismatch",
        ));
    }

    if !is_valid_cms_slug(&slug) {
        warn!(slug, "hash-authenticated callback carried an invalid slug");
        let mut response = (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Invalid slug format",
                "slug": slug,
            })),
        )
            .into_response();
        ErrorReport::from_message(SOURCE, StatusCode::BAD_REQUEST, "invalid slug format")
            .attach(&mut response);
        return with_cors(response);
    }

    // This variant passes the slug through untouched: its callers supply
    // fully-formed paths.
    state.trigger.revalidate(&slug);

    with_cors(
        Json(json!({
            "success": true,
            "revalidated": true,
            "now": epoch_millis(),
        }))
        .into_response(),
    )
}

async fn cors_status() -> Response {
    with_cors(
        Json(json!({
            "message": "API Endpoint Is Running Smoothly",
        }))
        .into_response(),
    )
}

async fn cors_preflight() -> Response {
    with_cors(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn failure(
    source: &'static str,
    status: StatusCode,
    public_error: &'static str,
    detail: impl Into<String>,
) -> Response {
    let mut response = (
        status,
        Json(json!({
            "success": false,
            "error": public_error,
        })),
    )
        .into_response();
    ErrorReport::from_message(source, status, detail).attach(&mut response);
    response
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

fn epoch_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}
