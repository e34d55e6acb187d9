mod middleware;
mod public;
mod webhooks;

pub use public::{HttpState, build_router as build_public_router};
pub use webhooks::{WebhookState, build_router as build_webhook_router};

use axum::Router;
use axum::extract::FromRef;

/// Combined state for the public and webhook surfaces.
#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub webhooks: WebhookState,
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for WebhookState {
    fn from_ref(state: &RouterState) -> Self {
        state.webhooks.clone()
    }
}

/// Assemble the full application router.
pub fn build_router(state: RouterState) -> Router {
    build_public_router(state.clone())
        .merge(build_webhook_router())
        .with_state(state)
}
