//! Run command: execute the pipeline chain

use anyhow::{Context, Result};
use std::sync::Arc;

use cf_core::partition::StageName;
use cf_engine::orchestrator::{Orchestrator, RunReport};
use cf_engine::stage::StageContext;
use cf_engine::stages::standard_chain;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{load_config, parse_key_arg, print_table, project_root, ExitCode};

pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_config(global)?;
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
    let retry = config.retry;
    let key = parse_key_arg(&args.key)?;

    let ctx = StageContext::from_config(Arc::new(config), &project_root(global), key.clone())
        .context("Failed to build stage context")?;

    let stages = match &args.only {
        Some(name) => {
            let stage: StageName = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut chain = standard_chain();
            chain.retain(|s| s.name() == stage);
            chain
        }
        None => standard_chain(),
    };

    println!(
        "Running {} stage(s) for partition {}",
        stages.len(),
        key
    );
    let orchestrator = Orchestrator::new(stages, retry);
    let report = orchestrator
        .run(&ctx)
        .await
        .context("Pipeline execution failed")?;

    print_summary(&report);

    if !report.succeeded {
        if let Some(stage) = report.halted_at {
            eprintln!(
                "Run {} halted at stage '{}' on partition {}",
                report.run_id, stage, report.partition_key
            );
        }
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    let rows: Vec<Vec<String>> = report
        .stages
        .iter()
        .map(|s| {
            vec![
                s.stage.to_string(),
                if s.succeeded { "succeeded" } else { "failed" }.to_string(),
                s.attempts.to_string(),
                format!("{:.2}s", s.duration_secs),
                s.rows.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
                s.error
                    .clone()
                    .or_else(|| s.detail.clone())
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    print_table(
        &["STAGE", "OUTCOME", "ATTEMPTS", "DURATION", "ROWS", "DETAIL"],
        &rows,
    );
    println!();
    println!(
        "Run {} {} ({} stage(s), partition {})",
        report.run_id,
        if report.succeeded { "completed" } else { "failed" },
        report.stages.len(),
        report.partition_key
    );
}
