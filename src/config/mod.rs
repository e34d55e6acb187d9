//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;


const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "foglio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CONTENT_ROOT: &str = "/var/blog-content";
const DEFAULT_CMS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_PAGE_LIMIT: usize = 200;
const CMS_SCRIPT_URL_TEMPLATE: &str = "https://script.google.com/macros/s/{deployment}/exec";

/// Command-line arguments for the foglio binary.
#[derive(Debug, Parser)]
#[command(name = "foglio", version, about = "Foglio blog front end")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOGLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content backend (filesystem|cms).
    #[arg(long = "content-backend", value_name = "BACKEND")]
    pub content_backend: Option<String>,

    /// Override the filesystem content root.
    #[arg(long = "content-root", value_name = "PATH")]
    pub content_root: Option<PathBuf>,

    /// Override the CMS script deployment identifier.
    #[arg(long = "cms-deployment-id", value_name = "ID")]
    pub cms_deployment_id: Option<String>,

    /// Override the CMS data-source (sheet) identifier.
    #[arg(long = "cms-sheet-id", value_name = "ID")]
    pub cms_sheet_id: Option<String>,

    /// Override the full CMS script URL (takes precedence over the
    /// deployment identifier).
    #[arg(long = "cms-script-url", value_name = "URL")]
    pub cms_script_url: Option<String>,

    /// Override the outbound CMS call timeout.
    #[arg(long = "cms-timeout-seconds", value_name = "SECONDS")]
    pub cms_timeout_seconds: Option<u64>,

    /// Toggle the rendered-page cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the rendered-page cache capacity.
    #[arg(long = "cache-page-limit", value_name = "COUNT")]
    pub cache_page_limit: Option<usize>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub content: ContentSettings,
    pub webhook: WebhookSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Content backend selection, decided once at composition time.
#[derive(Debug, Clone)]
pub enum ContentSettings {
    Filesystem { root: PathBuf },
    RemoteCms(CmsSettings),
}

#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub script_url: Url,
    pub sheet_id: String,
    pub timeout: Duration,
}

/// Webhook secrets. The callback secret is required for the hash-based
/// endpoint to ever succeed; the revalidate secret is optional and, when
/// absent, disables the direct-secret check entirely.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub callback_secret: Option<String>,
    pub revalidate_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub page_limit: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse CLI arguments and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOGLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    content: RawContentSettings,
    cms: RawCmsSettings,
    webhook: RawWebhookSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    backend: Option<String>,
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    deployment_id: Option<String>,
    sheet_id: Option<String>,
    script_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWebhookSettings {
    callback_secret: Option<String>,
    revalidate_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    page_limit: Option<usize>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.format = Some(if json { "json" } else { "compact" }.to_string());
        }
        if let Some(backend) = overrides.content_backend.as_ref() {
            self.content.backend = Some(backend.clone());
        }
        if let Some(root) = overrides.content_root.as_ref() {
            self.content.root = Some(root.clone());
        }
        if let Some(id) = overrides.cms_deployment_id.as_ref() {
            self.cms.deployment_id = Some(id.clone());
        }
        if let Some(id) = overrides.cms_sheet_id.as_ref() {
            self.cms.sheet_id = Some(id.clone());
        }
        if let Some(url) = overrides.cms_script_url.as_ref() {
            self.cms.script_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.cms_timeout_seconds {
            self.cms.timeout_seconds = Some(seconds);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(limit) = overrides.cache_page_limit {
            self.cache.page_limit = Some(limit);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            content,
            cms,
            webhook,
            cache,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let content = build_content_settings(content, cms)?;
        let webhook = build_webhook_settings(webhook);
        let cache = build_cache_settings(cache);

        Ok(Self {
            server,
            logging,
            content,
            webhook,
            cache,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(raw) => LevelFilter::from_str(&raw).map_err(|_| {
            LoadError::invalid(
                "logging.level",
                format!("`{raw}` is not one of trace|debug|info|warn|error|off"),
            )
        })?,
        None => LevelFilter::INFO,
    };

    let format = match logging.format.as_deref() {
        None | Some("compact") => LogFormat::Compact,
        Some("json") => LogFormat::Json,
        Some(other) => {
            return Err(LoadError::invalid(
                "logging.format",
                format!("`{other}` is not one of compact|json"),
            ));
        }
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_settings(
    content: RawContentSettings,
    cms: RawCmsSettings,
) -> Result<ContentSettings, LoadError> {
    let backend = content
        .backend
        .unwrap_or_else(|| "filesystem".to_string())
        .to_ascii_lowercase();

    match backend.as_str() {
        "filesystem" | "fs" => {
            let root = content
                .root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_ROOT));
            Ok(ContentSettings::Filesystem { root })
        }
        "cms" | "remote" => Ok(ContentSettings::RemoteCms(build_cms_settings(cms)?)),
        other => Err(LoadError::invalid(
            "content.backend",
            format!("`{other}` is not one of filesystem|cms"),
        )),
    }
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let sheet_id = cms
        .sheet_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| LoadError::invalid("cms.sheet_id", "required for the cms backend"))?;

    let raw_url = match (cms.script_url, cms.deployment_id) {
        (Some(url), _) => url,
        (None, Some(deployment)) if !deployment.is_empty() => {
            CMS_SCRIPT_URL_TEMPLATE.replace("{deployment}", &deployment)
        }
        _ => {
            return Err(LoadError::invalid(
                "cms.deployment_id",
                "either cms.deployment_id or cms.script_url is required",
            ));
        }
    };

    let script_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("cms.script_url", err.to_string()))?;

    let timeout_secs = cms.timeout_seconds.unwrap_or(DEFAULT_CMS_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "cms.timeout_seconds",
            "timeout must be greater than zero",
        ));
    }

    Ok(CmsSettings {
        script_url,
        sheet_id,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_webhook_settings(webhook: RawWebhookSettings) -> WebhookSettings {
    WebhookSettings {
        callback_secret: webhook.callback_secret.filter(|s| !s.is_empty()),
        revalidate_secret: webhook.revalidate_secret.filter(|s| !s.is_empty()),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        page_limit: cache.page_limit.unwrap_or(DEFAULT_CACHE_PAGE_LIMIT),
    }
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    format!("{host}:{port}")
        .parse()
        .map_err(|err| format!("`{host}:{port}` is not a socket address: {err}"))
}
