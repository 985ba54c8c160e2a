//! Watch command implementation: scheduled runs until interrupted.

use super::{print_status, Engine, OutputFormat};
use crate::error::CliError;
use issuesync_engine::RunOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Default interval when neither the flag nor the settings file sets one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Runs syncs on a fixed interval.
///
/// Runs execute on the blocking pool, so a tick that lands while a run is
/// still in flight reaches the engine and is skipped there. Stops on
/// Ctrl-C, or after `max_runs` completed runs.
pub fn run(
    engine: Engine,
    interval: Duration,
    max_runs: Option<u64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(engine);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let result = runtime.block_on(schedule(Arc::clone(&engine), interval, max_runs, format));

    // The engine owns a blocking HTTP client; drop it outside the runtime.
    drop(runtime);
    drop(engine);
    result
}

async fn schedule(
    engine: Arc<Engine>,
    interval: Duration,
    max_runs: Option<u64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut runs: JoinSet<RunOutcome> = JoinSet::new();
    let mut completed = 0u64;

    info!(interval_secs = interval.as_secs(), "watching for changes");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let engine = Arc::clone(&engine);
                runs.spawn_blocking(move || engine.run());
            }
            Some(joined) = runs.join_next() => {
                match joined {
                    Ok(RunOutcome::Completed(_)) => {
                        completed += 1;
                        print_status(&engine, format, false)?;
                        if max_runs.is_some_and(|max| completed >= max) {
                            info!(completed, "reached run limit");
                            break;
                        }
                    }
                    Ok(RunOutcome::Skipped) => {}
                    Err(e) => warn!(error = %e, "sync task failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    if !runs.is_empty() {
        info!("waiting for in-flight run to finish");
        while runs.join_next().await.is_some() {}
    }
    Ok(())
}
