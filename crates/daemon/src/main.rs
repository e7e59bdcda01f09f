// SPDX-License-Identifier: MIT

//! `herdctld`: the fleet daemon binary. Loads a fleet config, opens
//! the state directory, optionally connects to Docker, and runs the
//! schedule tick loop until asked to stop (§4.G `start`/`stop`).

use herdctl_core::SystemClock;
use herdctl_daemon::{EnvSdkClient, FleetConfig, FleetSupervisor, FullRuntimeFactory};
use herdctl_engine::JobLifecycleManager;
use herdctl_runtime::RuntimeFactory;
use herdctl_storage::{StateStore, DEFAULT_STATE_DIR};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config_arg: Option<String> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("herdctld {VERSION}");
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                config_arg = args.next();
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: herdctld [--config PATH]");
                std::process::exit(1);
            }
        }
    }

    let _log_guard = setup_logging();

    let config_path = FleetConfig::config_path_from_env(config_arg.as_deref()).ok_or(
        "no fleet config given: pass --config PATH or set HERDCTL_CONFIG",
    )?;
    let fleet_config = FleetConfig::load(&config_path)?;
    info!(agents = fleet_config.agents.len(), path = %config_path.display(), "loaded fleet config");

    let state_dir: PathBuf = std::env::var("HERDCTL_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR));
    let clock = SystemClock;
    let state = Arc::new(StateStore::open(&state_dir, clock)?);
    info!(path = %state.root().display(), "opened state directory");

    let container = match herdctl_container::ContainerManager::connect(state.docker_sessions_dir())
        .await
    {
        Ok(manager) => {
            info!("connected to docker daemon");
            Some(Arc::new(manager))
        }
        Err(err) => {
            info!(error = %err, "no docker daemon connection; docker-enabled agents will fail at execution time");
            None
        }
    };

    let base_factory = RuntimeFactory::new(Arc::new(EnvSdkClient), clock);
    let auth_dir = std::env::var("HERDCTL_AUTH_DIR").ok().map(PathBuf::from);
    let factory: Arc<dyn herdctl_runtime::BaseRuntimeFactory> =
        Arc::new(FullRuntimeFactory::new(base_factory, container, auth_dir));

    let jobs = Arc::new(herdctl_storage::JobStore::new(state.root().join("jobs")));
    let sessions_root = state.root().join("sessions");
    let sessions = Arc::new(herdctl_storage::SessionStore::new(sessions_root, clock));
    let lifecycle = Arc::new(JobLifecycleManager::new(
        jobs,
        sessions,
        factory,
        clock,
        state.root().to_path_buf(),
    ));

    let supervisor = Arc::new(FleetSupervisor::new(
        fleet_config.agents,
        state,
        lifecycle,
        clock,
        None,
    ));
    supervisor.start(std::time::Duration::from_secs(1))?;

    println!("READY");
    info!("herdctld ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }

    info!("shutting down, cancelling in-flight jobs");
    supervisor.stop();
    supervisor.cancel_all();
    tokio::select! {
        _ = supervisor.wait_for_idle() => info!("all jobs drained"),
        _ = tokio::time::sleep(std::time::Duration::from_secs(30)) => {
            error!("shutdown grace period elapsed with jobs still running");
        }
    }

    Ok(())
}

fn print_help() {
    println!("herdctld {VERSION}");
    println!("Fleet daemon for scheduled and triggered agent jobs.");
    println!();
    println!("USAGE:");
    println!("    herdctld --config PATH");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config PATH    Fleet config YAML (or set HERDCTL_CONFIG)");
    println!("    -h, --help           Print help information");
    println!("    -V, --version        Print version information");
}

fn setup_logging() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();
    guard
}
