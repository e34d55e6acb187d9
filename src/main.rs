use std::{process, sync::Arc, time::Duration};

use foglio::{
    application::{
        auth::WebhookAuthenticator,
        content::{CmsStore, ContentStore, FsStore},
    },
    cache::{CacheConfig, CacheState, PageStore, RevalidateTrigger},
    config::{self, ContentSettings},
    infra::{
        error::InfraError,
        http::{self, HttpState, RouterState, WebhookState},
        telemetry,
    },
};
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "fatal error, shutting down");
        return;
    }

    // Telemetry may not be up yet; log through a throwaway stderr subscriber.
    let fallback = Dispatch::new(tracing_fmt().with_max_level(Level::ERROR).finish());
    dispatcher::with_default(&fallback, || {
        error!(error = %error, "fatal error, shutting down");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let (store, cms): (Arc<dyn ContentStore>, Option<Arc<CmsStore>>) = match &settings.content {
        ContentSettings::Filesystem { root } => {
            info!(root = %root.display(), "using filesystem content store");
            let store = FsStore::new(root).map_err(|err| {
                InfraError::configuration(format!(
                    "content root `{}` is not usable: {err}",
                    root.display()
                ))
            })?;
            (Arc::new(store), None)
        }
        ContentSettings::RemoteCms(cms_settings) => {
            info!(script_url = %cms_settings.script_url, "using remote cms content store");
            let store = CmsStore::new(
                cms_settings.script_url.clone(),
                cms_settings.sheet_id.clone(),
                cms_settings.timeout,
            )
            .map_err(|err| {
                InfraError::configuration(format!("failed to build cms client: {err}"))
            })?;
            let store = Arc::new(store);
            (store.clone(), Some(store))
        }
    };

    let cache_config = CacheConfig::from(&settings.cache);
    let pages = Arc::new(PageStore::new(&cache_config));
    let cache = cache_config.is_enabled().then(|| CacheState {
        config: cache_config.clone(),
        pages: pages.clone(),
    });
    let trigger = Arc::new(RevalidateTrigger::new(cache_config, pages));

    let auth = Arc::new(WebhookAuthenticator::new(
        settings.webhook.callback_secret.clone(),
        settings.webhook.revalidate_secret.clone(),
    ));

    let state = RouterState {
        http: HttpState { store, cms, cache },
        webhooks: WebhookState { auth, trigger },
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown handler");
        return;
    }
    info!(grace_seconds = grace.as_secs(), "shutdown signal received");

    // In-flight connections drain within the grace period; anything still
    // alive after that gets cut off with the process.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!("graceful shutdown grace period expired, exiting");
        process::exit(0);
    });
}
