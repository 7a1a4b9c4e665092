//! Stage-run records and pipeline run state
//!
//! Every orchestrated execution attempt produces one `StageRun` record,
//! appended as a single JSON line to the run log. The aggregate
//! `PipelineRunState` tracks the whole chain for one run and is saved
//! atomically after every transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::partition::{PartitionKey, StageName};

/// Outcome of a single execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Attempt completed the stage
    Succeeded,
    /// Attempt failed and a retry follows
    Retried,
    /// Attempt failed terminally
    Failed,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Succeeded => write!(f, "succeeded"),
            RunOutcome::Retried => write!(f, "retried"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// One record per orchestrated execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRun {
    /// Identifier of the pipeline run this attempt belongs to
    pub run_id: String,

    /// Stage that was executed
    pub stage: StageName,

    /// Target partition key of the run
    pub partition_key: PartitionKey,

    /// 1-based attempt number
    pub attempt: u32,

    /// When the attempt was dispatched
    pub started_at: DateTime<Utc>,

    /// When the attempt finished
    pub finished_at: DateTime<Utc>,

    /// Attempt outcome
    pub outcome: RunOutcome,

    /// Error detail for failed or retried attempts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only JSONL log of stage runs.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Create a run log at the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one stage-run line.
    pub fn append(&self, run: &StageRun) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoreError::IoWithPath {
                path: self.path.display().to_string(),
                source: e,
            })?;
        let line = serde_json::to_string(run)?;
        writeln!(file, "{}", line).map_err(|e| CoreError::IoWithPath {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    /// Read all stage-run lines. An absent log is an empty log.
    pub fn read_all(&self) -> CoreResult<Vec<StageRun>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| CoreError::IoWithPath {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let mut runs = Vec::new();
        for line in content.lines().filter(|l| !l.is_empty()) {
            runs.push(serde_json::from_str(line)?);
        }
        Ok(runs)
    }
}

/// Status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run is currently in progress
    Running,
    /// Every stage succeeded
    Completed,
    /// A stage failed terminally and the chain halted
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A stage that completed successfully within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedStage {
    pub stage: StageName,
    pub completed_at: DateTime<Utc>,
    pub attempts: u32,
    pub duration_ms: u64,
}

/// The stage that failed terminally within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStage {
    pub stage: StageName,
    pub failed_at: DateTime<Utc>,
    pub attempts: u32,
    pub error: String,
}

/// State of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunState {
    /// Unique identifier for this run
    pub run_id: String,

    /// Target partition key
    pub partition_key: PartitionKey,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the state was last updated
    pub last_updated_at: DateTime<Utc>,

    /// Current status of the run
    pub status: RunStatus,

    /// Stages that completed successfully, in order
    pub completed_stages: Vec<CompletedStage>,

    /// The terminally failed stage, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<FailedStage>,

    /// Stages still pending execution
    pub pending_stages: Vec<StageName>,
}

impl PipelineRunState {
    /// Create a new run state with a fresh run id.
    pub fn new(partition_key: PartitionKey, pending_stages: Vec<StageName>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            partition_key,
            started_at: Utc::now(),
            last_updated_at: Utc::now(),
            status: RunStatus::Running,
            completed_stages: Vec::new(),
            failed_stage: None,
            pending_stages,
        }
    }

    /// Mark a stage as completed.
    pub fn mark_completed(&mut self, stage: StageName, attempts: u32, duration_ms: u64) {
        self.pending_stages.retain(|s| *s != stage);
        self.completed_stages.push(CompletedStage {
            stage,
            completed_at: Utc::now(),
            attempts,
            duration_ms,
        });
        self.last_updated_at = Utc::now();
    }

    /// Mark a stage as terminally failed. The run is over: remaining
    /// stages must never run against a partition that was never produced.
    pub fn mark_failed(&mut self, stage: StageName, attempts: u32, error: &str) {
        self.pending_stages.retain(|s| *s != stage);
        self.failed_stage = Some(FailedStage {
            stage,
            failed_at: Utc::now(),
            attempts,
            error: error.to_string(),
        });
        self.status = RunStatus::Failed;
        self.last_updated_at = Utc::now();
    }

    /// Mark the run as completed.
    pub fn mark_run_completed(&mut self) {
        if self.failed_stage.is_none() {
            self.status = RunStatus::Completed;
        }
        self.last_updated_at = Utc::now();
    }

    /// Load run state from a file path.
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let state: PipelineRunState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Save run state to a file path atomically.
    ///
    /// Uses write-to-temp-then-rename to prevent corruption.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&temp_path, json).map_err(|e| CoreError::IoWithPath {
            path: temp_path.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&temp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key() -> PartitionKey {
        PartitionKey::parse("2024-01-01").unwrap()
    }

    fn new_state() -> PipelineRunState {
        PipelineRunState::new(key(), StageName::CHAIN.to_vec())
    }

    #[test]
    fn test_new_state() {
        let state = new_state();
        assert_eq!(state.pending_stages.len(), 7);
        assert_eq!(state.status, RunStatus::Running);
        assert_eq!(state.run_id.len(), 8);
    }

    #[test]
    fn test_mark_completed() {
        let mut state = new_state();
        state.mark_completed(StageName::Fetch, 1, 120);
        assert_eq!(state.pending_stages.len(), 6);
        assert_eq!(state.completed_stages.len(), 1);
        assert_eq!(state.completed_stages[0].attempts, 1);
    }

    #[test]
    fn test_mark_failed_halts_run() {
        let mut state = new_state();
        state.mark_completed(StageName::Fetch, 1, 120);
        state.mark_failed(StageName::Ingest, 3, "warehouse unreachable");
        assert_eq!(state.status, RunStatus::Failed);
        state.mark_run_completed();
        // a failed run stays failed
        assert_eq!(state.status, RunStatus::Failed);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run_state.json");
        let mut state = new_state();
        state.mark_completed(StageName::Fetch, 2, 340);
        state.save(&path).unwrap();

        let loaded = PipelineRunState::load(&path).unwrap().unwrap();
        assert_eq!(loaded.run_id, state.run_id);
        assert_eq!(loaded.completed_stages.len(), 1);
        assert_eq!(loaded.pending_stages.len(), 6);
    }

    #[test]
    fn test_run_log_append_and_read() {
        let dir = tempdir().unwrap();
        let log = RunLog::new(dir.path().join("logs").join("stage_runs.jsonl"));
        let now = Utc::now();
        for (attempt, outcome) in [(1, RunOutcome::Retried), (2, RunOutcome::Succeeded)] {
            log.append(&StageRun {
                run_id: "abc12345".to_string(),
                stage: StageName::Fetch,
                partition_key: key(),
                attempt,
                started_at: now,
                finished_at: now,
                outcome,
                error: (outcome == RunOutcome::Retried).then(|| "timeout".to_string()),
            })
            .unwrap();
        }
        let runs = log.read_all().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].outcome, RunOutcome::Retried);
        assert_eq!(runs[1].attempt, 2);
    }
}
