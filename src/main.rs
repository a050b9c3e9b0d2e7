//! # Teleop Link
//!
//! Remote drone teleoperation client: keyboard, gamepad, or TrackPoint
//! input fused into a normalized axis stream and sent to the vehicle
//! backend as JSON over a persistent connection.
//!
//! This binary is a minimal terminal front end over the library core. It
//! wires the host adapters to a [`ControlSession`] and runs the single
//! scheduling loop: sample the active input modality each tick, send the
//! framed result, and route host events and operator commands in between.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use teleop_link::config::Config;
use teleop_link::host::gamepad_dev::GamepadMonitor;
use teleop_link::host::term::{TermCommand, TermPointerLock, TerminalHost};
use teleop_link::session::ControlSession;
use teleop_link::transport::link::TcpConnector;

/// Default configuration file location.
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Runs on a current-thread runtime: every piece of shared state is mutated
/// on this one scheduling loop, so a mode change can never be observed
/// half-applied within a tick.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = load_config();

    // File logging keeps the raw-mode terminal readable; stderr otherwise
    let _log_guard = init_tracing(&config);

    info!("Teleop Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Control endpoint: {}", config.link.endpoint);

    // Host adapters feed the session through channels; the session itself
    // only ever runs on this task
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let (host_tx, mut host_rx) = mpsc::unbounded_channel();

    let mut terminal = TerminalHost::init(command_tx)?;
    let (gamepad_monitor, gamepad_source) = GamepadMonitor::spawn(host_tx)?;

    let connector = TcpConnector::new(
        config.link.endpoint.clone(),
        Duration::from_millis(config.link.connect_timeout_ms),
    );
    let mut session = ControlSession::new(
        &config,
        connector,
        Box::new(TermPointerLock),
        Box::new(gamepad_source),
    );

    if let Err(e) = session.connect().await {
        warn!("Initial connect failed, retrying in background: {}", e);
    }

    info!(
        "Sampling at {}Hz; press T to take off, L to land, Q to quit",
        config.sampling.tick_rate_hz
    );

    let mut ticker = interval(config.tick_period());
    let mut tick_count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick().await;
                tick_count += 1;

                if tick_count % config.logging.status_interval_ticks == 0 {
                    let state = session.state();
                    info!(
                        "tick {}: mode={} link={} axes=[{:+.2} {:+.2} {:+.2} {:+.2}]",
                        tick_count, state.mode, state.connection,
                        state.axes.roll, state.axes.pitch,
                        state.axes.yaw, state.axes.throttle,
                    );
                }
            }

            Some(event) = host_rx.recv() => {
                session.handle_event(event);
            }

            Some(command) = command_rx.recv() => {
                if handle_command(&mut session, command).await {
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    // Teardown order matters: release the pointer lock, close the link,
    // then give the terminal back
    session.shutdown().await;
    gamepad_monitor.stop();
    terminal.restore();

    info!("Total ticks: {}", tick_count);
    Ok(())
}

/// Applies one operator command. Returns true when the loop should exit.
async fn handle_command<C>(session: &mut ControlSession<C>, command: TermCommand) -> bool
where
    C: teleop_link::transport::link::LinkConnector,
{
    match command {
        TermCommand::Input(event) => session.handle_event(event),
        TermCommand::RequestMode(mode) => {
            let outcome = session.request_mode(mode).await;
            info!("Mode request {} -> {:?}", mode, outcome);
        }
        TermCommand::ToggleHeadless => {
            session.toggle_headless();
        }
        TermCommand::Takeoff => {
            if let Err(e) = session.request_takeoff().await {
                warn!("Takeoff not sent: {}", e);
            }
        }
        TermCommand::Land => {
            if let Err(e) = session.request_land().await {
                warn!("Land not sent: {}", e);
            }
        }
        TermCommand::Quit => return true,
    }
    false
}

/// Loads the config file named on the command line (or the default path),
/// falling back to built-in defaults when no file is present.
///
/// Runs before the tracing subscriber exists, so failures go to stderr.
fn load_config() -> Config {
    let explicit = std::env::args().nth(1);
    let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            if explicit.is_some() || std::path::Path::new(&path).exists() {
                eprintln!("teleop-link: invalid config {}: {}; using defaults", path, e);
            }
            Config::default()
        }
    }
}

/// Sets up the tracing subscriber; returns the file-writer guard when file
/// logging is configured so buffered lines survive until exit.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if config.logging.dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    } else {
        let appender = tracing_appender::rolling::daily(&config.logging.dir, "teleop-link.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_default_tick_period_matches_rate() {
        let config = Config::default();
        let period = config.tick_period();
        assert_eq!(period, Duration::from_millis(20), "50Hz is a 20ms period");
    }
}
