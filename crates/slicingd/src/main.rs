//! slicingd entry point.
//!
//! Loads the configuration, seeds the tenant directory, registers the
//! SlicingOrch with the daemon and runs the event loop until interrupted.

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use slice_dataplane::{InMemoryProgrammer, RecordingPacketIo};
use slicingd::audit::{self, AuditCategory, AuditOutcome, AuditRecord};
use slicingd::audit_log;
use slicingd::config::{SlicingConfig, DEFAULT_CONFIG_PATH};
use slicingd::daemon::{SliceDaemon, SliceDaemonConfig};
use slicingd::directory::TenantDirectory;
use slicingd::slicing::SlicingOrch;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

/// Multi-tenant network slicing daemon
#[derive(Parser, Debug)]
#[command(name = "slicingd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "json")]
    log_format: LogFormat,

    /// Heartbeat interval in milliseconds, overrides the config file
    #[arg(long)]
    heartbeat_interval: Option<u64>,

    /// Events handled per pass, overrides the config file
    #[arg(short = 'b', long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    audit::init_logging(&args.log_level, matches!(args.log_format, LogFormat::Json));

    let mut config = match SlicingConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(interval) = args.heartbeat_interval {
        config.daemon.heartbeat_interval_ms = interval;
    }
    if let Some(batch_size) = args.batch_size {
        config.daemon.batch_size = batch_size;
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    info!("====================================================================");
    info!("Starting slicingd");
    info!("====================================================================");
    info!("Config file: {}", args.config.display());
    info!("Batch size: {}", config.daemon.batch_size);
    info!("Heartbeat interval: {}ms", config.daemon.heartbeat_interval_ms);
    info!("Gateway MAC: {}", config.slicing.gateway_mac);
    info!("Rule priority: {}", config.slicing.priority);
    if let Some(limit) = config.slicing.label_limit {
        info!("Label limit per device: {}", limit);
    }

    let directory = match config.build_directory() {
        Ok(directory) => Arc::new(directory),
        Err(e) => {
            error!("Failed to build tenant directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    for tenant in directory.tenants() {
        info!("Tenant {}: {} network(s)", tenant, directory.networks(&tenant).len());
    }

    warn!("No southbound adapter configured, using the in-memory dataplane");
    let programmer = Arc::new(InMemoryProgrammer::new());
    let packet_io = Arc::new(RecordingPacketIo::new());

    let orch = SlicingOrch::new(
        config.orch_config(),
        directory.clone(),
        directory,
        programmer,
        packet_io,
    );
    if let Err(e) = config.apply_policies(&orch) {
        error!("Failed to apply configured policies: {}", e);
        return ExitCode::FAILURE;
    }

    let mut daemon = SliceDaemon::new(SliceDaemonConfig {
        heartbeat_interval_ms: config.daemon.heartbeat_interval_ms,
    });
    daemon.register_orch(Box::new(orch));

    audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "slicingd", "startup")
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({
            "config": args.config.display().to_string(),
            "tenants": config.tenants.len(),
        })));

    let shutdown = daemon.shutdown_token();
    let shutdown_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received SIGINT, shutting down gracefully...");
                shutdown.cancel();
            }
            Err(err) => {
                error!("Failed to listen for ctrl-c: {}", err);
            }
        }
    });

    warn!("No packet or topology source attached, the event loop idles on its heartbeat until an adapter pushes events");
    info!("Starting event loop...");
    daemon.run().await;
    shutdown_handle.abort();

    for line in daemon.dump() {
        info!("{}", line);
    }
    info!("====================================================================");
    info!("slicingd shutdown complete");
    info!("====================================================================");

    ExitCode::SUCCESS
}
