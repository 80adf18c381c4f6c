//! remindme binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the SQLite-backed reminder store
//! 3. Wire the service to tokio alarms and logging notification sinks
//! 4. Run the requested subcommand

mod cli;
mod stdio;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use remindme_action::{
    AlarmBridge, Background, BackgroundHandle, LogNotifier, LogTabOpener, ReminderListing,
    ReminderService, Request, Response, ServiceSettings, TokioAlarmBridge,
};
use remindme_core::types::{Category, Timestamp};
use remindme_core::zone::Zone;
use remindme_storage::{Database, ReminderStore};

use cli::{load_config, CliArgs, Command};
use stdio::{parse_line, HostEvent, Inbound};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

fn open_store(data_dir: &Path) -> AppResult<Arc<ReminderStore>> {
    std::fs::create_dir_all(data_dir).map_err(|e| {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        e
    })?;
    let db_path = data_dir.join("remindme.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");
    Ok(Arc::new(ReminderStore::new(Arc::new(db))))
}

fn build_service(
    store: Arc<ReminderStore>,
    alarms: Arc<dyn AlarmBridge>,
    settings: ServiceSettings,
) -> ReminderService {
    ReminderService::new(
        store,
        alarms,
        Arc::new(LogNotifier),
        Arc::new(LogTabOpener),
        settings,
    )
}

/// Read one JSON line at a time from stdin: requests and host events.
/// Every line is answered with one JSON line.
async fn serve(store: Arc<ReminderStore>, settings: ServiceSettings) -> AppResult<()> {
    let (bridge, fired) = TokioAlarmBridge::new();
    let service = Arc::new(build_service(store, Arc::new(bridge), settings));
    let (background, handle) = Background::new(service, fired);
    let background_task = tokio::spawn(background.run());

    let report = handle.startup().await?;
    tracing::info!(
        missed = report.missed,
        rearmed = report.rearmed,
        "Background process ready"
    );

    let result = read_requests(&handle).await;

    handle.shutdown();
    background_task.await?;
    result
}

async fn read_requests(handle: &BackgroundHandle) -> AppResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("stdin closed");
                    return Ok(());
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let response = match parse_line(line) {
                    Ok(Inbound::Request(request)) => handle.send(request).await,
                    Ok(Inbound::Event(HostEvent::NotificationClicked { id })) => {
                        match handle.click(id).await {
                            Ok(()) => Response::success(),
                            Err(e) => Response::from(e),
                        }
                    }
                    Err(e) => Response::from(e),
                };
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
        }
    }
}

async fn list(store: Arc<ReminderStore>, zone: Zone) -> AppResult<()> {
    let book = store.get_all().await?;
    let listing = ReminderListing::from_book(&book, Timestamp::now());

    for category in Category::ALL {
        let section = listing.category(category);
        println!("{} ({})", category, section.len());
        for (label, items) in [("upcoming", &section.upcoming), ("past", &section.past)] {
            for item in items {
                let record = &item.record;
                let mut line = format!(
                    "  [{}] {}  {}",
                    label,
                    zone.format_date_time(record.timestamp),
                    record.subject()
                );
                if !record.url.is_empty() && !record.text.is_empty() {
                    line.push_str(&format!("  \"{}\"", record.text));
                }
                if record.repeat.is_repeating() {
                    line.push_str(&format!("  ({})", record.repeat.label()));
                }
                if record.fired {
                    line.push_str("  fired");
                }
                let short: String = item.hash.as_str().chars().take(12).collect();
                line.push_str(&format!("  {}", short));
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// Apply one request directly. Alarms are armed again by the next `serve`.
async fn send(
    store: Arc<ReminderStore>,
    settings: ServiceSettings,
    input: &str,
) -> AppResult<()> {
    let (bridge, _fired) = TokioAlarmBridge::new();
    let service = build_service(store, Arc::new(bridge), settings);
    let response = match Request::from_json(input) {
        Ok(request) => service.handle(request, Timestamp::now()).await,
        Err(e) => Response::from(e),
    };
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let (config, config_error) = load_config(&config_file);

    // stdout carries responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.resolve_log_level(&config))),
        )
        .init();

    tracing::info!("Starting remindme v{}", env!("CARGO_PKG_VERSION"));
    match config_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
    }

    let settings = ServiceSettings::from_config(&config)?;
    let store = open_store(&args.resolve_data_dir(&config))?;

    match args.command() {
        Command::Serve => serve(store, settings).await,
        Command::List => list(store, settings.zone).await,
        Command::Send { request } => send(store, settings, &request).await,
    }
}
