//! SONiC Orchagent entry point.

use clap::Parser;
use log::{error, info};
use sonic_orchagent::daemon::{OrchDaemon, OrchDaemonConfig};
use sonic_orchagent::route::{RouteOrch, RouteOrchConfig};
use std::process::ExitCode;
use std::sync::Arc;

mod callbacks;

/// SONiC Switch Orchestration Agent
#[derive(Parser, Debug)]
#[command(name = "orchagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Switch MAC address
    #[arg(short = 'm', long)]
    mac_address: Option<String>,

    /// Batch size for consumer table operations
    #[arg(short = 'b', long, default_value = "128")]
    batch_size: usize,

    /// Enable recording mode for debugging
    #[arg(short = 'r', long)]
    record: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Heartbeat interval in milliseconds
    #[arg(long, default_value = "1000")]
    heartbeat_interval: u64,

    /// Redis host for APPL_DB/CONFIG_DB/STATE_DB/COUNTER_DB
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis port
    #[arg(long, default_value = "6379")]
    redis_port: u16,

    /// Start in warm-boot mode
    #[arg(long)]
    warm_boot: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("Starting SONiC orchagent (Rust)");
    info!("Batch size: {}", args.batch_size);
    if let Some(ref mac) = args.mac_address {
        info!("Switch MAC: {}", mac);
    }
    if args.record {
        info!("Recording mode enabled");
    }

    let daemon_config = OrchDaemonConfig {
        heartbeat_interval_ms: args.heartbeat_interval,
        batch_size: args.batch_size,
        warm_boot: args.warm_boot,
        redis_host: args.redis_host.clone(),
        redis_port: args.redis_port,
    };
    let mut daemon = OrchDaemon::new(daemon_config);

    let route_orch = build_route_orch();
    daemon.register_orch(Box::new(route_orch));

    if !daemon.init().await {
        error!("OrchDaemon initialization failed, exiting");
        return ExitCode::FAILURE;
    }

    if args.warm_boot {
        if !daemon.prepare_warm_boot().await {
            error!("Warm boot preparation failed, exiting");
            return ExitCode::FAILURE;
        }
        daemon.on_warm_boot_end().await;
    }

    tokio::select! {
        _ = daemon.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            daemon.stop();
        }
    }

    ExitCode::SUCCESS
}

/// Builds the Bulk route example Orch with the callback glue still under
/// construction (NeighOrch/IntfsOrch/VrfOrch aren't registered with the
/// daemon yet, so next-hop and VRF lookups have no real backing store).
fn build_route_orch() -> RouteOrch {
    let mut orch = RouteOrch::new(RouteOrchConfig::default());
    orch.set_callbacks(Arc::new(callbacks::UnwiredRouteCallbacks));
    orch
}
