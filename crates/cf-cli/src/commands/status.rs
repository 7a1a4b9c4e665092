//! Status command: recent stage runs and the last run state

use anyhow::{Context, Result};

use cf_core::run::{PipelineRunState, RunLog};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{load_config, open_store, print_table};

pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config, global);

    if let Some(state) =
        PipelineRunState::load(&store.logs_dir().join("run_state.json")).context("Bad run state")?
    {
        println!(
            "Last run {} ({}): {} completed, {} pending{}",
            state.run_id,
            state.status,
            state.completed_stages.len(),
            state.pending_stages.len(),
            state
                .failed_stage
                .as_ref()
                .map(|f| format!(", failed at {} ({})", f.stage, f.error))
                .unwrap_or_default()
        );
        println!();
    }

    let log = RunLog::new(store.logs_dir().join("stage_runs.jsonl"));
    let runs = log.read_all().context("Failed to read stage-run log")?;
    if runs.is_empty() {
        println!("No stage runs recorded");
        return Ok(());
    }

    let start = runs.len().saturating_sub(args.limit);
    let rows: Vec<Vec<String>> = runs[start..]
        .iter()
        .map(|r| {
            vec![
                r.finished_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                r.run_id.clone(),
                r.stage.to_string(),
                r.partition_key.to_string(),
                r.attempt.to_string(),
                r.outcome.to_string(),
                r.error.clone().unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    print_table(
        &["FINISHED", "RUN", "STAGE", "PARTITION", "ATTEMPT", "OUTCOME", "ERROR"],
        &rows,
    );
    Ok(())
}
