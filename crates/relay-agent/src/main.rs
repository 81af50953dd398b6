//! Relay agent - headless notification relay
//!
//! Polls the snapshot store shared with the platform listener and
//! forwards accepted notification changes to the remote document store
//! selected by the user's sync code.

mod bridge;

use std::env;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use relay_core::config::RemoteConfig;
use relay_core::detector::pipeline;
use relay_core::models::ServiceInfo;
use relay_core::permission::{AppState, NotificationSource, PermissionMonitor};
use relay_core::remote::{fetch_service_info, HttpDocumentClient};
use relay_core::store::Store;
use relay_core::SyncCode;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::bridge::StoreBridge;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Forward Android notification changes to a shared remote document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Optional path to the local store file
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Remote document store base URL
    #[arg(long, value_name = "URL")]
    remote_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay loop (default)
    Run,
    /// Set the sync code selecting the remote document
    SetCode {
        /// The code to store
        code: String,
    },
    /// Print the configured sync code in masked form
    Code,
    /// Fetch and print the service document for the configured code
    Info,
    /// Ask the platform listener to open the notification settings
    RequestPermission,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] relay_core::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("No sync code configured. Run `relay set-code <code>` first.")]
    NoSyncCode,
    #[error("Remote is not configured. Pass --remote-url or set RELAY_REMOTE_URL.")]
    RemoteNotConfigured,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_agent(&db_path, cli.remote_url).await,
        Commands::SetCode { code } => run_set_code(&db_path, &code).await,
        Commands::Code => run_show_code(&db_path).await,
        Commands::Info => run_info(&db_path, cli.remote_url).await,
        Commands::RequestPermission => run_request_permission(&db_path).await,
    }
}

async fn run_agent(db_path: &Path, remote_url: Option<String>) -> Result<(), CliError> {
    let remote = resolve_remote_config(remote_url)?;
    let client = HttpDocumentClient::new(remote)?;
    let store = Store::open(db_path).await?;

    let sync_code = store.load_sync_code().await?;
    match &sync_code {
        Some(code) => info!(code = %code, "forwarding to configured document"),
        None => warn!("no sync code configured; changes will be detected but not forwarded"),
    }

    // Forced check at startup, the same check the app ran on mount.
    let mut monitor = PermissionMonitor::new(StoreBridge::new(store.clone()));
    monitor.handle_app_state(AppState::Active, true).await;
    info!(
        has_permission = monitor.has_permission(),
        "notification access status"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (detector, writer) = pipeline(store, client, sync_code);
    let detector_task = tokio::spawn(detector.run(shutdown_rx.clone()));
    let writer_task = tokio::spawn(writer.run(shutdown_rx));

    // SIGHUP is the headless analog of the app returning to the
    // foreground: re-check notification access on demand.
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = sigterm.recv() => break,
            _ = sighup.recv() => {
                monitor.handle_app_state(AppState::Active, false).await;
                info!(
                    has_permission = monitor.has_permission(),
                    "notification access re-checked"
                );
            }
        }
    }

    info!("shutting down");
    let _ = shutdown_tx.send(true);
    let _ = detector_task.await;
    let _ = writer_task.await;
    Ok(())
}

async fn run_set_code(db_path: &Path, code: &str) -> Result<(), CliError> {
    let code = SyncCode::new(code)?;
    let store = Store::open(db_path).await?;
    store.store_sync_code(&code).await?;
    println!("{}", code.masked());
    Ok(())
}

async fn run_show_code(db_path: &Path) -> Result<(), CliError> {
    let store = Store::open(db_path).await?;
    let code = store.load_sync_code().await?.ok_or(CliError::NoSyncCode)?;
    println!("{}", code.masked());
    Ok(())
}

async fn run_info(db_path: &Path, remote_url: Option<String>) -> Result<(), CliError> {
    let remote = resolve_remote_config(remote_url)?;
    let client = HttpDocumentClient::new(remote)?;
    let store = Store::open(db_path).await?;
    let code = store.load_sync_code().await?.ok_or(CliError::NoSyncCode)?;

    match fetch_service_info(&client, &code).await? {
        Some(info) => {
            for line in render_service_info(&info) {
                println!("{line}");
            }
        }
        None => println!("No service document for code {}", code.masked()),
    }
    Ok(())
}

async fn run_request_permission(db_path: &Path) -> Result<(), CliError> {
    let store = Store::open(db_path).await?;
    StoreBridge::new(store).request_permission().await?;
    println!("Requested notification access");
    Ok(())
}

fn render_service_info(info: &ServiceInfo) -> Vec<String> {
    let number = |value: Option<f64>, unit: &str| {
        value.map_or_else(|| "-".to_string(), |v| format!("{v} {unit}"))
    };

    vec![
        format!("name:           {}", info.name.as_deref().unwrap_or("-")),
        format!("battery:        {}", number(info.battery, "V")),
        format!("distance left:  {}", number(info.distance_left, "km")),
        format!("odometer:       {}", number(info.odo, "km")),
        format!("position:       {}", info.position.as_deref().unwrap_or("-")),
    ]
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("RELAY_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relay")
        .join("relay.db")
}

fn resolve_remote_config(cli_url: Option<String>) -> Result<RemoteConfig, CliError> {
    let url = cli_url
        .or_else(|| env::var("RELAY_REMOTE_URL").ok())
        .ok_or(CliError::RemoteNotConfigured)?;
    let token = env::var("RELAY_AUTH_TOKEN").ok();
    Ok(RemoteConfig::new(url, token)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn explicit_db_path_wins() {
        let path = resolve_db_path(Some(PathBuf::from("/tmp/custom.db")));
        assert_eq!(path, PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn default_db_path_is_under_a_relay_dir() {
        let path = default_db_path();
        assert!(path.ends_with("relay/relay.db"));
    }

    #[test]
    fn missing_remote_url_is_an_error() {
        // No CLI value and (in tests) no env value set for this name.
        std::env::remove_var("RELAY_REMOTE_URL");
        assert!(matches!(
            resolve_remote_config(None),
            Err(CliError::RemoteNotConfigured)
        ));
    }

    #[test]
    fn cli_remote_url_is_validated() {
        assert!(resolve_remote_config(Some("not-a-url".to_string())).is_err());
        assert!(resolve_remote_config(Some("https://api.example.com".to_string())).is_ok());
    }

    #[test]
    fn render_service_info_dashes_missing_fields() {
        let lines = render_service_info(&ServiceInfo::default());
        assert_eq!(lines[0], "name:           -");
        assert!(lines.iter().all(|line| line.ends_with('-')));
    }

    #[test]
    fn render_service_info_formats_units() {
        let info = ServiceInfo {
            name: Some("Pega-S".to_string()),
            battery: Some(57.5),
            distance_left: Some(42.0),
            odo: Some(1204.5),
            position: Some("https://maps.example.com/?q=1,2".to_string()),
        };

        let lines = render_service_info(&info);
        assert_eq!(lines[1], "battery:        57.5 V");
        assert_eq!(lines[2], "distance left:  42 km");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_code_persists_and_masks() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("relay.db");

        run_set_code(&db_path, "ABCDE").await.unwrap();

        let store = Store::open(&db_path).await.unwrap();
        let code = store.load_sync_code().await.unwrap().unwrap();
        assert_eq!(code.as_str(), "ABCDE");
        assert_eq!(code.masked(), "****DE");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn show_code_requires_a_configured_code() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("relay.db");

        assert!(matches!(
            run_show_code(&db_path).await,
            Err(CliError::NoSyncCode)
        ));
    }
}
