//! Headless engine binary for the dig-site simulation.
//!
//! Loads configuration, builds a session, and lets the autopilot play it
//! to the end while every delivered event is written to the log.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `dig-config.yaml` in the working directory (defaults if absent)
//! 2. Initialize structured logging (`RUST_LOG`, else `logging.level`)
//! 3. Generate the site and spawn the daemons
//! 4. Attach the event log to the bus
//! 5. Run the autopilot until an end condition
//! 6. Log the result

mod error;
mod event_log;
mod pilot;
mod runner;

use std::path::{Path, PathBuf};

use dig_core::{DigSession, SimulationConfig};
use dig_events::EventKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::event_log::EventLog;
use crate::pilot::Autopilot;

const DEFAULT_CONFIG_PATH: &str = "dig-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or the session fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, found) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging.level)?;
    info!("dig-engine starting");
    if found {
        info!(path = %config_path.display(), "configuration loaded");
    } else {
        info!(path = %config_path.display(), "config file not found, using defaults");
    }
    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        max_turns = config.world.max_turns,
        profile = %config.site.profile,
        "world settings"
    );

    // 3. Build the session.
    let mut session = DigSession::new(&config).map_err(EngineError::from)?;
    info!(
        nodes = session.excavation().tree().len(),
        artifacts = session.artifacts().len(),
        daemons = session.sentinel().len(),
        "site generated"
    );

    // 4. Attach the event log.
    let mut events = EventLog::attach(session.bus());

    // 5. Run.
    let result = runner::run(&mut session, &mut Autopilot::new()).map_err(EngineError::from)?;

    // 6. Report.
    events.detach(session.bus());
    runner::log_run_end(&result);
    info!(
        alerts = events.count(EventKind::DaemonAlert),
        depletions = events.count(EventKind::ResourceDepleted),
        "threat summary"
    );
    for (kind, count) in events.counts() {
        info!(?kind, count, "events delivered");
    }
    info!(total_events = events.total(), "dig-engine shutdown complete");

    Ok(())
}

/// Read the configuration at `path`. A missing file yields the defaults;
/// the flag reports whether the file was found.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_logging(level: &str) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| EngineError::LogFilter {
            filter: level.to_owned(),
            message: e.to_string(),
        })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
    Ok(())
}
