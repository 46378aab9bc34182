//! `kiln status`: explain whether a task is up to date.

use kiln_changes::{
    ExecutionRecord, FsSnapshotter, HistoryStore, StateContext, TaskUpToDateState,
};

use crate::settings::{load_settings, normalization};
use crate::{GlobalArgs, StatusArgs};

/// Exit code reported when the task is out of date.
pub const OUT_OF_DATE: i32 = 2;

/// Runs the `kiln status` command.
///
/// Compares the current record against the task's history and prints the
/// reasons it is out of date. Returns 0 when up to date and [`OUT_OF_DATE`]
/// otherwise. With `--record` the current record replaces the history.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_settings(global)?;
    let content = std::fs::read_to_string(&args.current)
        .map_err(|e| format!("cannot read {}: {e}", args.current.display()))?;
    let mut current: ExecutionRecord = serde_json::from_str(&content)
        .map_err(|e| format!("invalid execution record {}: {e}", args.current.display()))?;

    let mut history = HistoryStore::load_or_default(&args.state_dir);
    let snapshotter = FsSnapshotter::new();
    let strategy = normalization(&config.normalization);
    let ctx = StateContext::new(&args.task, &snapshotter, &strategy)
        .with_max_messages(config.detection.max_messages);

    let (reasons, must_rebuild, discovered) = {
        let state = TaskUpToDateState::new(&ctx, history.previous(&args.task), &current);
        let reasons = state.out_of_date_reasons();
        let must_rebuild = state.must_rebuild();
        if args.record && !args.discovered.is_empty() {
            state.new_inputs(&args.discovered)?;
        }
        (reasons, must_rebuild, state.discovered_inputs())
    };

    if !global.quiet {
        if reasons.is_empty() {
            println!("Task '{}' is up to date.", args.task);
        } else {
            println!("Task '{}' is out of date:", args.task);
            for reason in &reasons {
                println!("  - {reason}");
            }
            if must_rebuild {
                println!("A full rebuild is required.");
            } else {
                println!("An incremental run is sufficient.");
            }
        }
    }
    tracing::info!(
        task = %args.task,
        reasons = reasons.len(),
        must_rebuild,
        "evaluated task state"
    );

    if args.record {
        if let Some(discovered) = discovered {
            current.discovered_inputs = discovered;
        }
        history.record(args.task.as_str(), current);
        history.save(&args.state_dir)?;
        tracing::info!(
            task = %args.task,
            state_dir = %args.state_dir.display(),
            "recorded task history"
        );
    }

    Ok(if reasons.is_empty() { 0 } else { OUT_OF_DATE })
}
