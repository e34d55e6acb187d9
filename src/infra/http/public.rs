//! Public page surface: home, blog index, and the article page.
//!
//! Every failure on this surface renders the shared not-found page. Viewers
//! never see which failure class occurred.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
};
use tracing::{debug, error};

use crate::{
    application::{
        content::{CmsStore, ContentStore, DEFAULT_ARTICLE_ENDPOINT, DEFAULT_LIST_ENDPOINT},
        memo::FetchCache,
    },
    cache::{CacheState, page_cache_layer},
    presentation::views::{
        ArticleTemplate, ArticleView, BlogCardView, BlogsTemplate, HomeTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::RouterState;
use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn ContentStore>,
    /// Present when the CMS backend is active; powers the blog index listing.
    pub cms: Option<Arc<CmsStore>>,
    pub cache: Option<CacheState>,
}

pub fn build_router(state: RouterState) -> Router<RouterState> {
    let routes = Router::new()
        .route("/", get(home))
        .route("/blogs", get(blogs_index))
        .route("/blogs/{*slug}", get(article_page))
        .fallback(fallback_page);

    // Rendered-page cache sits only in front of the public surface.
    let routes = if let Some(cache_state) = state.http.cache.clone() {
        routes.layer(middleware::from_fn_with_state(
            cache_state,
            page_cache_layer,
        ))
    } else {
        routes
    };

    routes
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn home() -> Response {
    render_template_response(HomeTemplate {}, StatusCode::OK)
}

async fn blogs_index(State(state): State<HttpState>) -> Response {
    let cards = match &state.cms {
        Some(cms) => match cms.list(DEFAULT_LIST_ENDPOINT).await {
            Ok(items) => items
                .iter()
                .filter_map(|item| {
                    let slug = item.slug.as_deref()?;
                    Some(BlogCardView {
                        title: item.title.clone(),
                        description: item.description.clone(),
                        href: format!("/blogs/{slug}"),
                    })
                })
                .collect(),
            Err(err) => {
                error!(error = %err, "blog listing fetch failed, rendering empty index");
                Vec::new()
            }
        },
        None => static_cards(),
    };

    render_template_response(BlogsTemplate { cards }, StatusCode::OK)
}

/// Article page: validate, probe existence, then fetch twice through the
/// request's memoizer — once for the SEO head, once for the body — so both
/// passes share one backend call.
async fn article_page(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let store = state.store.as_ref();

    if !store.exists(&slug).await {
        debug!(slug, "article does not exist");
        return render_not_found_response();
    }

    let fetch_cache = FetchCache::new();

    let head = fetch_cache
        .get_or_fetch(&slug, DEFAULT_ARTICLE_ENDPOINT, || store.fetch(&slug))
        .await;
    let metadata = match head {
        Ok(article) => article.metadata.clone(),
        Err(err) => {
            debug!(slug, error = %err, "article metadata fetch failed");
            return render_not_found_response();
        }
    };

    let body = fetch_cache
        .get_or_fetch(&slug, DEFAULT_ARTICLE_ENDPOINT, || store.fetch(&slug))
        .await;
    let html = match body {
        Ok(article) => article.html.clone(),
        Err(err) => {
            debug!(slug, error = %err, "article body fetch failed");
            return render_not_found_response();
        }
    };

    let view = ArticleView::new(html, &metadata);
    render_template_response(ArticleTemplate { view }, StatusCode::OK)
}

async fn fallback_page() -> Response {
    render_not_found_response()
}

fn static_cards() -> Vec<BlogCardView> {
    vec![
        BlogCardView {
            title: "Sample Article".to_string(),
            description: "This is a sample article to demonstrate the blog system. Click to read more.".to_string(),
            href: "/blogs/sample-article".to_string(),
        },
        BlogCardView {
            title: "Getting Started".to_string(),
            description: "Learn how to create your first blog post with our file-based system.".to_string(),
            href: "/blogs/getting-started".to_string(),
        },
        BlogCardView {
            title: "Advanced Features".to_string(),
            description: "Explore advanced features like caching, revalidation, and SEO optimization.".to_string(),
            href: "/blogs/advanced-features".to_string(),
        },
    ]
}
