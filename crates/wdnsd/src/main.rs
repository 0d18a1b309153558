// # wdnsd - WDNS webhook daemon
//
// This is a THIN integration layer: all reconciliation logic lives in
// wdns-core, all backend I/O in wdns-backend-http.
//
// The wdnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the backend client and reconciler
// 4. Serving the orchestrator webhook until shutdown
//
// ## Configuration
//
// ### Backend
// - `WDNS_URL`: Base URL of the backend API
// - `WDNS_API_TOKEN`: API token (`X-API-Token`)
// - `WDNS_API_SECRET`: API secret (`X-API-Secret`)
// - `WDNS_VERIFY_TLS`: Verify TLS certificates (default: true)
// - `WDNS_TIMEOUT_SECS`: Per-request timeout (default: 30)
// - `WDNS_MODE`: Set to `dry-run` to log mutations without sending them
//
// ### Domains
// - `WDNS_DOMAIN_FILTER`: Comma-separated domains to manage (default: all)
// - `WDNS_EXCLUDE_DOMAINS`: Comma-separated domains to leave alone
//
// ### Server
// - `WDNS_LISTEN`: Listen address (default: 127.0.0.1:8888)
// - `WDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export WDNS_URL=https://dns.example.com/api/v1/
// export WDNS_API_TOKEN=your_token
// export WDNS_API_SECRET=your_secret
// export WDNS_DOMAIN_FILTER=example.com,example.org
//
// wdnsd
// ```

mod webhook;

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use wdns_backend_http::HttpBackend;
use wdns_core::{
    BackendConfig, DomainFilter, Reconciler, ServerConfig, SystemResolver, ViewClassifier,
    WdnsConfig,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WdnsExitCode> for ExitCode {
    fn from(code: WdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    wdns: WdnsConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut backend = BackendConfig::new(
            env::var("WDNS_URL").context("WDNS_URL is required")?,
            env::var("WDNS_API_TOKEN").context("WDNS_API_TOKEN is required")?,
            env::var("WDNS_API_SECRET").context("WDNS_API_SECRET is required")?,
        )
        .with_verify_tls(parse_bool("WDNS_VERIFY_TLS", true)?)
        .with_dry_run(
            env::var("WDNS_MODE")
                .unwrap_or_default()
                .eq_ignore_ascii_case("dry-run"),
        );

        if let Ok(s) = env::var("WDNS_TIMEOUT_SECS") {
            backend.timeout_secs = s
                .parse()
                .with_context(|| format!("WDNS_TIMEOUT_SECS is not a number: {}", s))?;
        }

        let domain_filter = DomainFilter::new(
            split_list(env::var("WDNS_DOMAIN_FILTER").unwrap_or_default()),
            split_list(env::var("WDNS_EXCLUDE_DOMAINS").unwrap_or_default()),
        );

        let server = ServerConfig {
            listen: env::var("WDNS_LISTEN").unwrap_or_else(|_| ServerConfig::default().listen),
        };

        Ok(Self {
            wdns: WdnsConfig {
                backend,
                domain_filter,
                server,
            },
            log_level: env::var("WDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.wdns.validate()?;

        if self.wdns.backend.url.starts_with("http://") {
            eprintln!(
                "WARNING: WDNS_URL uses HTTP (not HTTPS). \
                 API credentials will be sent in clear text."
            );
        }

        if !(1..=300).contains(&self.wdns.backend.timeout_secs) {
            anyhow::bail!(
                "WDNS_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.wdns.backend.timeout_secs
            );
        }

        parse_level(&self.log_level)?;
        Ok(())
    }
}

fn split_list(value: String) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(var: &str, default: bool) -> Result<bool> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be true or false. Got: {}", var, v),
        },
    }
}

fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "WDNS_LOG_LEVEL '{}' is not valid. \
             Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return WdnsExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WdnsExitCode::ConfigError.into();
    }

    info!("Starting wdnsd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config.wdns).await {
            error!("Daemon error: {:#}", e);
            WdnsExitCode::RuntimeError
        } else {
            WdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: WdnsConfig) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    info!("Backend: {:?}", backend);

    let reconciler = Reconciler::new(
        Arc::new(backend),
        ViewClassifier::new(Arc::new(SystemResolver::new())),
        config.domain_filter.clone(),
    );

    if config.domain_filter.include.is_empty() {
        info!("Managing all domains owned by the backend");
    } else {
        info!("Managing domains: {}", config.domain_filter.include.join(", "));
    }

    let shutdown = CancellationToken::new();
    let app = webhook::router(webhook::AppState {
        reconciler: Arc::new(reconciler),
        shutdown: shutdown.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    info!("Webhook listening on {}", config.server.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match wait_for_shutdown().await {
                Ok(signal) => info!("Received shutdown signal: {}", signal),
                Err(e) => error!("Shutdown signal error: {}", e),
            }
            shutdown.cancel();
        })
        .await
        .context("Webhook server failed")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
