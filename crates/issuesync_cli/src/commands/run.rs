//! Run command implementation.

use super::{print_status, Engine, OutputFormat};
use issuesync_engine::{RunOutcome, SyncState};

/// Runs one sync and prints the resulting status.
///
/// Returns the state the run settled in.
pub fn run(
    engine: &Engine,
    format: OutputFormat,
    show_items: bool,
) -> Result<SyncState, Box<dyn std::error::Error>> {
    let state = match engine.run() {
        RunOutcome::Completed(state) => state,
        // Nothing else shares this engine.
        RunOutcome::Skipped => engine.status().state,
    };

    print_status(engine, format, show_items)?;
    Ok(state)
}
