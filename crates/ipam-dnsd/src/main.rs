// # ipam-dnsd - IPAM to DNS webhook daemon
//
// Thin integration layer: reads configuration from the environment,
// wires the PowerDNS provider into the sync engine and serves the
// webhook endpoint until SIGTERM or SIGINT.
//
// ## Configuration
//
// ### Listener
// - `LISTEN_ADDRESS`: Address to listen on (default `:8080`)
// - `SECRET`: Shared secret for the `X-Hook-Signature` HMAC (optional)
// - `PIPELINE_TIMEOUT_SECS`: Deadline for processing one webhook (default 60)
//
// ### PowerDNS
// - `PDNS_API_HOST`: Base URL of the PowerDNS HTTP API
// - `PDNS_API_KEY`: API key
// - `PDNS_SERVER_ID`: Server id in the API path (default `localhost`)
// - `DRY_RUN`: Log changes instead of sending them
//
// ### Records
// - `DOMAIN`: Forward zone; names outside it get no forward record
// - `SKIP_FORWARD_RECORDS`: Any value disables A/AAAA records
// - `SKIP_REVERSE_RECORDS`: Any value disables PTR records
// - `IPV6_ZONE_NIBBLES`: Nibbles forming an IPv6 reverse zone (default 8)
//
// ### Logging
// - `LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// ## Example
//
// ```bash
// export PDNS_API_HOST=http://pdns:8081
// export PDNS_API_KEY=0f1e2d3c4b5a
// export DOMAIN=example.com
// export SECRET=hook-secret
//
// ipam-dnsd
// ```

mod config;
mod server;

use anyhow::{Context, Result};
use config::Config;
use ipam_dns_core::{ProviderRegistry, SyncEngine, SyncEvent};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting ipam-dnsd");
    info!(
        "Domain: {}, forward records: {}, reverse records: {}",
        config.domain,
        if config.skip_forward_record { "off" } else { "on" },
        if config.skip_reverse_record { "off" } else { "on" },
    );
    if config.secret.is_none() {
        warn!("SECRET is not set, webhook signatures cannot be verified");
    }
    if config.dry_run {
        warn!("Dry-run mode: no changes will be sent to PowerDNS");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "powerdns")]
    {
        info!("Registering PowerDNS provider");
        ipam_dns_provider_powerdns::register(&registry);
    }

    let sync_config = config.sync_config();
    let api = registry
        .create_provider(&sync_config.provider)
        .context("Failed to create DNS provider")?;
    info!("Using {} provider", api.provider_name());

    let (engine, events) =
        SyncEngine::new(api, &sync_config).context("Failed to create sync engine")?;
    tokio::spawn(log_sync_events(events));

    let app = server::router(server::AppState {
        engine: Arc::new(engine),
        secret: config.secret.clone(),
        pipeline_timeout: config.pipeline_timeout(),
    });

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to listen on {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Drain engine events into the debug log
async fn log_sync_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::PlanBuilt {
                request_id,
                operations,
            } => debug!(
                "Plan for {}: {} operation(s)",
                request_id.as_deref().unwrap_or("-"),
                operations
            ),
            SyncEvent::OperationApplied { step, operation } => {
                debug!("Step {} applied: {}", step, operation)
            }
            SyncEvent::OperationFailed {
                step,
                operation,
                error,
            } => debug!("Step {} failed: {}: {}", step, operation, error),
            SyncEvent::PlanCompleted {
                request_id,
                applied,
            } => debug!(
                "Plan for {} completed: {} operation(s)",
                request_id.as_deref().unwrap_or("-"),
                applied
            ),
        }
    }
}

/// Resolve once SIGTERM or SIGINT arrives
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to setup signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", received);
}

/// Resolve once CTRL-C arrives
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => error!("Failed to wait for CTRL-C: {}", e),
    }
}
