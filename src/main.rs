//! Pathik - grid exploration agent
//!
//! Runs the exploration controller against the coordination service, with
//! the drive, sensor and link provided by the simulated grid world.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use pathik::client::{CoordinationClient, HttpTransport};
use pathik::clock::SystemClock;
use pathik::hardware::sim::SimHandle;
use pathik::link::HostLink;
use pathik::signal::setup_ctrl_c_handler;
use pathik::{ExplorationController, PathikConfig, Result, Runtime};

const DEFAULT_CONFIG: &str = "pathik.toml";

/// Grid exploration agent
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (default: pathik.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Coordination service URL, overrides the config file
    #[arg(short, long)]
    server: Option<String>,

    /// Give up after this many restarts (default: restart forever)
    #[arg(long)]
    max_restarts: Option<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = match &args.config {
        Some(path) => (PathikConfig::load(path)?, Some(path.clone())),
        None if Path::new(DEFAULT_CONFIG).exists() => (
            PathikConfig::load(Path::new(DEFAULT_CONFIG))?,
            Some(PathBuf::from(DEFAULT_CONFIG)),
        ),
        None => (PathikConfig::default(), None),
    };
    if let Some(server) = args.server {
        config.connection.server_url = server;
    }
    config.validate()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pathik={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Pathik v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("Using default configuration"),
    }
    info!("Coordination service: {}", config.connection.server_url);
    info!(
        "Simulated world: {} obstacle(s), {} cm cells",
        config.simulation.obstacles.len(),
        config.simulation.cell_size_cm
    );

    let running = setup_ctrl_c_handler()?;
    let clock = SystemClock::shared();
    // The world outlives restarts; only the controller's beliefs reset
    let world = SimHandle::new(&config.simulation, config.motion.initial_heading);

    let factory = {
        let config = config.clone();
        let clock = clock.clone();
        let world = world.clone();
        move || -> Result<ExplorationController> {
            let transport = HttpTransport::new(&config.connection.server_url)?;
            debug!("Coordination service at {}", transport.base_url());
            let client = CoordinationClient::new(
                Box::new(transport),
                Box::new(HostLink),
                clock.clone(),
                config.connection.clone(),
            );
            Ok(ExplorationController::new(
                &config,
                client,
                Box::new(world.sensor(&config.motion)),
                Box::new(world.drive(&config.motion, clock.clone())),
                clock.clone(),
            ))
        }
    };

    let mut runtime = Runtime::new(factory, clock, &config.controller, running)
        .with_max_restarts(args.max_restarts);

    match runtime.run() {
        Ok(summary) => {
            info!(
                "Stopped ({:?}) after {} ticks and {} restart(s)",
                summary.reason, summary.ticks, summary.restarts
            );
            info!("Final: {}", summary.progress);
            info!(
                "Simulated robot at {} facing {}, {} collision(s)",
                world.position(),
                world.heading(),
                world.collisions()
            );
            Ok(())
        }
        Err(e) => {
            error!("Agent stopped: {}", e);
            Err(e)
        }
    }
}
