//! client-setup
//!
//! Loads a client configuration file, prints the options each client would
//! be built with, and optionally watches the file for live changes to the
//! global settings.
//!
//! ```text
//! config file ─▶ OptionsRegistry::load_file ─▶ default OptionsRecord
//!                                                   │
//!                       Container::resolve ◀────────┘
//!                              │
//!                       GenericClient (frozen region, live logging)
//!                              ▲
//! file change ─▶ ConfigWatcher ─▶ GlobalSettings swap
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use client_setup::clients::ServiceClient;
use client_setup::config::{ConfigWatcher, WatchEvent, WatchOptions};
use client_setup::lifecycle::signals::wait_for_shutdown_signal;
use client_setup::observability::{logging, metrics};
use client_setup::options::{OptionsRecord, OptionsRegistry};
use client_setup::registration::Container;
use client_setup::settings::GlobalSettings;

#[derive(Parser)]
#[command(name = "client-setup")]
#[command(about = "Resolve and watch service client configuration", long_about = None)]
struct Cli {
    /// Configuration file (.json or .toml).
    #[arg(short, long)]
    config: PathBuf,

    /// Only read this section of the file.
    #[arg(short, long)]
    section: Option<String>,

    /// Keep running and apply global setting changes from the file.
    #[arg(short, long)]
    watch: bool,

    /// Quiet period before a burst of file writes is reparsed.
    #[arg(long, default_value_t = 250)]
    debounce_ms: u64,

    /// Poll the file at this interval instead of using OS file events.
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Print every reparse outcome to stdout as a JSON line.
    #[arg(long)]
    json: bool,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing(logging::DEFAULT_FILTER);

    tracing::info!("client-setup v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let options = OptionsRegistry::load_file(&cli.config, cli.section.as_deref())?;
    let settings = GlobalSettings::process().clone();
    settings.seed_from(&options);
    let container = Container::new();
    container.set_default_options(options.clone().with_global_settings(settings.clone()));

    print_options("default", &options);
    for name in options.services().keys() {
        print_options(name, &options.for_service(name));
    }

    let client = container.resolve::<dyn ServiceClient>()?;
    tracing::info!(
        service = client.service_name(),
        region = ?client.region().map(|r| r.as_str()),
        log_to = %client.options().log_to(),
        "Client resolved"
    );

    if !cli.watch {
        return Ok(());
    }

    let mut watch_options = WatchOptions::default().with_debounce(Duration::from_millis(cli.debounce_ms));
    if let Some(section) = &cli.section {
        watch_options = watch_options.with_section(section.clone());
    }
    if let Some(poll_ms) = cli.poll_ms {
        watch_options = watch_options.with_poll_interval(Duration::from_millis(poll_ms));
    }

    let watcher = ConfigWatcher::start(&cli.config, &options, settings, watch_options)?;
    let mut events = watcher.subscribe();

    let report = async {
        loop {
            let event = events.recv().await;
            if let (true, Ok(event)) = (cli.json, &event) {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode reload outcome"),
                }
            }
            match event {
                Ok(WatchEvent::Applied { generation, .. }) => {
                    client.log_call("ConfigReload");
                    tracing::info!(
                        generation,
                        log_to = %client.options().log_to(),
                        "Client now logging with new settings"
                    );
                }
                Ok(WatchEvent::Unchanged) => {}
                Ok(WatchEvent::Rejected { error }) => {
                    tracing::warn!(%error, "Change ignored");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed reload notifications");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        _ = report => {}
        _ = wait_for_shutdown_signal() => {}
    }

    watcher.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_options(label: &str, options: &OptionsRecord) {
    println!("[{}]", label);
    println!(
        "  region:      {}",
        options.region().map(|r| r.as_str()).unwrap_or("<from environment>")
    );
    println!(
        "  profile:     {}",
        options.credentials().profile_name().unwrap_or("<ambient>")
    );
    if let Some(url) = options.service_url() {
        println!("  service url: {}", url);
    }
    println!("  log to:      {}", options.log_to());
    println!("  responses:   {:?}", options.parsed_logging().log_responses);
}
