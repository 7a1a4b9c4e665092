//! Orchestrator: ordered, retryable execution of the stage chain
//!
//! Runs the fixed chain strictly in declared order with at most one
//! in-flight attempt per stage. Each attempt appends a stage-run line to
//! the run log; the aggregate run state is saved after every transition.
//! Retry applies only to retryable (external-service) failures. A terminal
//! failure halts the chain: later stages must never run against a
//! partition that was never successfully produced, and they get no
//! stage-run record at all.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

use cf_core::config::RetryConfig;
use cf_core::partition::{PartitionKey, StageName};
use cf_core::run::{PipelineRunState, RunLog, RunOutcome, StageRun};

use crate::error::EngineResult;
use crate::stage::{Stage, StageContext};
use crate::stages::standard_chain;

/// Per-stage entry of the run report.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: StageName,
    pub succeeded: bool,
    pub attempts: u32,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured status report for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub partition_key: PartitionKey,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: bool,
    /// Stage at which the chain halted, when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<StageName>,
    pub stages: Vec<StageReport>,
}

/// Sequential stage-chain runner.
pub struct Orchestrator {
    stages: Vec<Box<dyn Stage>>,
    retry: RetryConfig,
    quiet: bool,
}

impl Orchestrator {
    /// Create an orchestrator over an explicit stage list.
    pub fn new(stages: Vec<Box<dyn Stage>>, retry: RetryConfig) -> Self {
        Self {
            stages,
            retry,
            quiet: false,
        }
    }

    /// Create an orchestrator over the standard seven-stage chain.
    pub fn standard(retry: RetryConfig) -> Self {
        Self::new(standard_chain(), retry)
    }

    /// Suppress per-stage stdout lines (used by tests).
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Run the chain to completion or terminal failure.
    pub async fn run(&self, ctx: &StageContext) -> EngineResult<RunReport> {
        let run_log = RunLog::new(ctx.store.logs_dir().join("stage_runs.jsonl"));
        let state_path = ctx.store.logs_dir().join("run_state.json");
        let mut state = PipelineRunState::new(
            ctx.key.clone(),
            self.stages.iter().map(|s| s.name()).collect(),
        );
        state.save(&state_path)?;

        let started_at = Utc::now();
        let mut reports = Vec::new();
        let mut halted_at = None;

        for stage in &self.stages {
            let name = stage.name();
            let stage_start = Instant::now();
            let mut attempt: u32 = 0;

            let report = loop {
                attempt += 1;
                let attempt_started = Utc::now();
                let result = stage.execute(ctx).await;
                let attempt_finished = Utc::now();

                match result {
                    Ok(outcome) => {
                        run_log.append(&StageRun {
                            run_id: state.run_id.clone(),
                            stage: name,
                            partition_key: ctx.key.clone(),
                            attempt,
                            started_at: attempt_started,
                            finished_at: attempt_finished,
                            outcome: RunOutcome::Succeeded,
                            error: None,
                        })?;
                        let duration = stage_start.elapsed();
                        state.mark_completed(name, attempt, duration.as_millis() as u64);
                        state.save(&state_path)?;
                        if !self.quiet {
                            println!(
                                "  \u{2713} {} [{}ms]{}",
                                name,
                                duration.as_millis(),
                                outcome
                                    .detail
                                    .as_deref()
                                    .map(|d| format!(" - {}", d))
                                    .unwrap_or_default()
                            );
                        }
                        break StageReport {
                            stage: name,
                            succeeded: true,
                            attempts: attempt,
                            duration_secs: duration.as_secs_f64(),
                            rows: outcome.rows,
                            detail: outcome.detail,
                            error: None,
                        };
                    }
                    Err(e) if e.is_retryable() && attempt <= self.retry.max_retries => {
                        run_log.append(&StageRun {
                            run_id: state.run_id.clone(),
                            stage: name,
                            partition_key: ctx.key.clone(),
                            attempt,
                            started_at: attempt_started,
                            finished_at: attempt_finished,
                            outcome: RunOutcome::Retried,
                            error: Some(e.to_string()),
                        })?;
                        log::warn!(
                            "stage {} attempt {} failed, retrying in {}ms: {}",
                            name,
                            attempt,
                            self.retry.delay_ms,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(self.retry.delay_ms)).await;
                    }
                    Err(e) => {
                        run_log.append(&StageRun {
                            run_id: state.run_id.clone(),
                            stage: name,
                            partition_key: ctx.key.clone(),
                            attempt,
                            started_at: attempt_started,
                            finished_at: attempt_finished,
                            outcome: RunOutcome::Failed,
                            error: Some(e.to_string()),
                        })?;
                        let duration = stage_start.elapsed();
                        state.mark_failed(name, attempt, &e.to_string());
                        state.save(&state_path)?;
                        if !self.quiet {
                            println!(
                                "  \u{2717} {} [{}ms] - {}",
                                name,
                                duration.as_millis(),
                                e
                            );
                        }
                        break StageReport {
                            stage: name,
                            succeeded: false,
                            attempts: attempt,
                            duration_secs: duration.as_secs_f64(),
                            rows: None,
                            detail: None,
                            error: Some(e.to_string()),
                        };
                    }
                }
            };

            let failed = !report.succeeded;
            reports.push(report);
            if failed {
                halted_at = Some(name);
                log::error!(
                    "halting chain: stage {} failed terminally on partition {}",
                    name,
                    ctx.key
                );
                break;
            }
        }

        state.mark_run_completed();
        state.save(&state_path)?;

        Ok(RunReport {
            run_id: state.run_id,
            partition_key: ctx.key.clone(),
            started_at,
            finished_at: Utc::now(),
            succeeded: halted_at.is_none(),
            halted_at,
            stages: reports,
        })
    }
}
