use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, SdkConfig};
use axum::Router;
use clap::Parser;
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::{fs, net::TcpListener, sync::OnceCell};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use config::{Args, Command, MonitorConfig, ServerConfig};
use models::event::InvocationEvent;
use services::{
    lister_service::{ObjectLister, S3Lister, StaticLister},
    monitor_service::BackupMonitor,
    notifier_service::{LogNotifier, Notifier, SesNotifier},
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config; nothing is listed or sent if this fails ---
    let args = Args::parse();
    let cfg = MonitorConfig::from_env_and_args(&args.monitor).context("invalid configuration")?;
    let dry_run = args.monitor.dry_run;

    tracing::info!("Starting backup-monitor with config: {:?}", cfg);

    match args.command {
        Command::Check {
            test_email,
            event,
            keys_file,
        } => {
            let event = load_event(test_email, event.as_deref()).await?;
            let aws = OnceCell::new();

            let lister: Arc<dyn ObjectLister> = match keys_file {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("reading keys file {}", path.display()))?;
                    Arc::new(StaticLister::from_lines(&text))
                }
                None => Arc::new(S3Lister::from_sdk_config(
                    shared_aws_config(&aws).await,
                    cfg.endpoint_url.as_deref(),
                )),
            };
            let notifier: Arc<dyn Notifier> = if dry_run {
                Arc::new(LogNotifier)
            } else {
                Arc::new(SesNotifier::from_sdk_config(
                    shared_aws_config(&aws).await,
                ))
            };

            let monitor = BackupMonitor::new(cfg, lister, notifier);
            let outcome = monitor.run_now(&event).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Serve { host, port } => {
            let server = ServerConfig::from_env_and_args(host, port)?;
            let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;

            let lister = Arc::new(S3Lister::from_sdk_config(
                &shared,
                cfg.endpoint_url.as_deref(),
            ));
            let notifier: Arc<dyn Notifier> = if dry_run {
                Arc::new(LogNotifier)
            } else {
                Arc::new(SesNotifier::from_sdk_config(&shared))
            };
            let monitor = BackupMonitor::new(cfg, lister, notifier);

            // --- Build router ---
            let app: Router = routes::routes::routes().with_state(monitor);

            // --- Start server ---
            let addr = server.addr();
            let listener = match TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(err)
                    if err.kind() == ErrorKind::PermissionDenied
                        && matches!(server.host.as_str(), "0.0.0.0" | "::") =>
                {
                    let fallback_addr = format!("127.0.0.1:{}", server.port);
                    tracing::warn!(
                        "Permission denied binding to {} ({}). Falling back to {}",
                        addr,
                        err,
                        fallback_addr
                    );
                    TcpListener::bind(&fallback_addr).await?
                }
                Err(err) => return Err(err.into()),
            };

            tracing::info!("Check trigger listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// Load AWS settings on first use so offline dry runs never touch them.
async fn shared_aws_config(cell: &OnceCell<SdkConfig>) -> &SdkConfig {
    cell.get_or_init(|| aws_config::defaults(BehaviorVersion::latest()).load())
        .await
}

/// Build the invocation event from `--event` and `--test-email`.
async fn load_event(test_email: bool, path: Option<&Path>) -> Result<InvocationEvent> {
    if test_email {
        return Ok(InvocationEvent::test_email());
    }
    match path {
        Some(path) => {
            let raw = fs::read(path)
                .await
                .with_context(|| format!("reading event file {}", path.display()))?;
            InvocationEvent::from_slice(&raw)
                .with_context(|| format!("parsing event file {}", path.display()))
        }
        None => Ok(InvocationEvent::default()),
    }
}
