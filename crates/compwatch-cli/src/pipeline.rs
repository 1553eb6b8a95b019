//! Stage sequencing for one pipeline run.
//!
//! The orchestrator walks `Init -> Collect -> Clean -> Analyze -> Visualize ->
//! Done`. Any stage error, or an empty dataset handed to a following stage,
//! moves the run to `Failed`, which is absorbing. Files written by earlier
//! stages are left in place.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum StageName {
    Collect,
    Clean,
    Analyze,
    Visualize,
}

impl StageName {
    pub(crate) const ALL: [StageName; 4] = [
        StageName::Collect,
        StageName::Clean,
        StageName::Analyze,
        StageName::Visualize,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            StageName::Collect => "collect",
            StageName::Clean => "clean",
            StageName::Analyze => "analyze",
            StageName::Visualize => "visualize",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PipelineState {
    Init,
    Collect,
    Clean,
    Analyze,
    Visualize,
    Done,
    Failed { stage: StageName, error: String },
}

impl From<StageName> for PipelineState {
    fn from(stage: StageName) -> Self {
        match stage {
            StageName::Collect => PipelineState::Collect,
            StageName::Clean => PipelineState::Clean,
            StageName::Analyze => PipelineState::Analyze,
            StageName::Visualize => PipelineState::Visualize,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Init => f.write_str("init"),
            PipelineState::Collect => f.write_str("collect"),
            PipelineState::Clean => f.write_str("clean"),
            PipelineState::Analyze => f.write_str("analyze"),
            PipelineState::Visualize => f.write_str("visualize"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed { stage, .. } => write!(f, "failed ({stage})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageStatus {
    Succeeded,
    Failed,
    /// Not executed; its persisted output was used instead.
    Reused,
    NotRun,
}

impl StageStatus {
    fn as_str(self) -> &'static str {
        match self {
            StageStatus::Succeeded => "succeeded",
            StageStatus::Failed => "failed",
            StageStatus::Reused => "reused",
            StageStatus::NotRun => "not-run",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StageReport {
    pub stage: StageName,
    pub status: StageStatus,
    pub elapsed: Duration,
    pub rows_in: Option<usize>,
    pub rows_out: Option<usize>,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

impl StageReport {
    fn not_run(stage: StageName) -> Self {
        Self {
            stage,
            status: StageStatus::NotRun,
            elapsed: Duration::ZERO,
            rows_in: None,
            rows_out: None,
            output: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PipelineRunResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: PipelineState,
    pub stages: Vec<StageReport>,
}

impl PipelineRunResult {
    pub(crate) fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }
}

fn count(value: Option<usize>) -> String {
    value.map_or_else(|| "-".to_owned(), |n| n.to_string())
}

impl fmt::Display for PipelineRunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {} finished in state {} (started {}, finished {})",
            self.run_id,
            self.state,
            self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        writeln!(
            f,
            "{:<10} {:<10} {:>10} {:>8} {:>8}  output",
            "stage", "status", "elapsed", "in", "out"
        )?;
        for s in &self.stages {
            writeln!(
                f,
                "{:<10} {:<10} {:>9.2}s {:>8} {:>8}  {}",
                s.stage.as_str(),
                s.status.as_str(),
                s.elapsed.as_secs_f64(),
                count(s.rows_in),
                count(s.rows_out),
                s.output
                    .as_ref()
                    .map_or_else(String::new, |p| p.display().to_string()),
            )?;
            if let Some(error) = &s.error {
                writeln!(f, "{:<10} error: {error}", "")?;
            }
        }
        Ok(())
    }
}

/// What a stage left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StageOutput {
    pub rows_in: Option<usize>,
    pub rows_out: usize,
    pub path: PathBuf,
}

/// The four stage implementations the orchestrator drives.
pub(crate) trait Stages {
    /// Executes `stage` from its fixed input file to its fixed output file.
    fn run(&self, stage: StageName) -> impl Future<Output = anyhow::Result<StageOutput>> + Send;

    /// Describes the previously persisted output of `stage` without running
    /// it. Fails if the file is missing or unreadable.
    fn persisted(&self, stage: StageName) -> anyhow::Result<StageOutput>;
}

/// Runs `plan` in order. Stages listed in `reuse` are not executed; their
/// persisted output must exist and hold at least one row.
pub(crate) async fn run_pipeline<S: Stages + Sync>(
    stages: &S,
    plan: &[StageName],
    reuse: &[StageName],
) -> PipelineRunResult {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let mut state = PipelineState::Init;
    let mut reports = Vec::with_capacity(plan.len());
    let mut rows_from_previous: Option<usize> = None;

    tracing::info!(%run_id, stages = plan.len(), "pipeline run started");

    for (idx, &stage) in plan.iter().enumerate() {
        if matches!(state, PipelineState::Failed { .. }) {
            reports.push(StageReport::not_run(stage));
            continue;
        }
        state = PipelineState::from(stage);

        let span = tracing::info_span!("stage", stage = stage.as_str());
        let started = Instant::now();
        let (status, outcome) = if reuse.contains(&stage) {
            let outcome = span.in_scope(|| stages.persisted(stage));
            (StageStatus::Reused, outcome)
        } else {
            span.in_scope(|| tracing::info!("stage started"));
            let outcome = stages.run(stage).instrument(span.clone()).await;
            (StageStatus::Succeeded, outcome)
        };
        let elapsed = started.elapsed();

        let is_last = idx + 1 == plan.len();
        let outcome = outcome.and_then(|out| {
            if out.rows_out == 0 && !is_last {
                anyhow::bail!(
                    "empty dataset at {}, refusing to continue",
                    out.path.display()
                );
            }
            Ok(out)
        });

        match outcome {
            Ok(out) => {
                let rows_in = out.rows_in.or(rows_from_previous);
                span.in_scope(|| {
                    tracing::info!(
                        status = status.as_str(),
                        rows_in,
                        rows_out = out.rows_out,
                        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                        path = %out.path.display(),
                        "stage finished"
                    );
                });
                rows_from_previous = Some(out.rows_out);
                reports.push(StageReport {
                    stage,
                    status,
                    elapsed,
                    rows_in,
                    rows_out: Some(out.rows_out),
                    output: Some(out.path),
                    error: None,
                });
            }
            Err(err) => {
                let error = format!("{err:#}");
                span.in_scope(|| tracing::error!(error = %error, "stage failed"));
                reports.push(StageReport {
                    stage,
                    status: StageStatus::Failed,
                    elapsed,
                    rows_in: rows_from_previous,
                    rows_out: None,
                    output: None,
                    error: Some(error.clone()),
                });
                state = PipelineState::Failed { stage, error };
            }
        }
    }

    if !matches!(state, PipelineState::Failed { .. }) {
        state = PipelineState::Done;
    }

    let result = PipelineRunResult {
        run_id,
        started_at,
        finished_at: Utc::now(),
        state,
        stages: reports,
    };
    if result.succeeded() {
        tracing::info!(%run_id, "pipeline run complete\n{result}");
    } else {
        tracing::error!(%run_id, "pipeline run failed\n{result}");
    }
    result
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
