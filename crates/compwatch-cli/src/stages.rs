//! Production stage wiring over the fixed dataset files.

use anyhow::Context;
use compwatch_cleaner::CleanPaths;
use compwatch_core::{
    read_dataset, AppConfig, CleanRecord, DatasetPaths, EnrichedRecord, RawRecord, Schema,
};

use crate::pipeline::{StageName, StageOutput, Stages};

pub(crate) struct LiveStages<'a> {
    config: &'a AppConfig,
    paths: DatasetPaths,
}

impl<'a> LiveStages<'a> {
    pub(crate) fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            paths: DatasetPaths::from_config(config),
        }
    }
}

impl Stages for LiveStages<'_> {
    async fn run(&self, stage: StageName) -> anyhow::Result<StageOutput> {
        let paths = &self.paths;
        match stage {
            StageName::Collect => {
                let outcome = compwatch_collector::collect(&self.config.api, &paths.raw).await?;
                Ok(StageOutput {
                    rows_in: None,
                    rows_out: outcome.rows,
                    path: outcome.path,
                })
            }
            StageName::Clean => {
                let report = compwatch_cleaner::run_clean(
                    CleanPaths {
                        input: &paths.raw,
                        cleaned: &paths.cleaned,
                        rejects: &paths.rejects,
                    },
                    &self.config.cleaning,
                )?;
                Ok(StageOutput {
                    rows_in: Some(report.input_rows),
                    rows_out: report.output_rows,
                    path: paths.cleaned.clone(),
                })
            }
            StageName::Analyze => {
                let report = compwatch_sentiment::run_analyze(
                    &self.config.analysis,
                    &paths.cleaned,
                    &paths.enriched,
                )
                .await?;
                Ok(StageOutput {
                    rows_in: Some(report.rows),
                    rows_out: report.rows,
                    path: paths.enriched.clone(),
                })
            }
            StageName::Visualize => {
                let outcome =
                    compwatch_report::run_report(&paths.enriched, &paths.report, &self.config.report)?;
                Ok(StageOutput {
                    rows_in: Some(outcome.rows),
                    rows_out: outcome.rows,
                    path: outcome.path,
                })
            }
        }
    }

    fn persisted(&self, stage: StageName) -> anyhow::Result<StageOutput> {
        let paths = &self.paths;
        let (path, rows) = match stage {
            StageName::Collect => (
                &paths.raw,
                read_dataset::<RawRecord>(&paths.raw, Schema::Raw)?.len(),
            ),
            StageName::Clean => (
                &paths.cleaned,
                read_dataset::<CleanRecord>(&paths.cleaned, Schema::Cleaned)?.len(),
            ),
            StageName::Analyze => (
                &paths.enriched,
                read_dataset::<EnrichedRecord>(&paths.enriched, Schema::Enriched)?.len(),
            ),
            StageName::Visualize => anyhow::bail!("the report cannot be reused as stage input"),
        };
        tracing::info!(rows = rows, path = %path.display(), "reusing persisted output");
        Ok(StageOutput {
            rows_in: None,
            rows_out: rows,
            path: path.clone(),
        })
    }
}

/// Loads and validates the configuration, naming the file in any error.
pub(crate) fn load(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    compwatch_core::load_config(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use compwatch_core::load_config_from_str;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::pipeline::{run_pipeline, PipelineState, StageStatus};

    fn config_for(server: &MockServer, dir: &TempDir) -> AppConfig {
        let root = dir.path().display();
        let yaml = format!(
            r"
api:
  base_url: {uri}
  endpoint: /products
  pagination: none
paths:
  raw_dir: {root}/raw
  processed_dir: {root}/processed
  output_dir: {root}/output
  log_dir: {root}/logs
",
            uri = server.uri()
        );
        load_config_from_str(&yaml, |_| Err(std::env::VarError::NotPresent)).unwrap()
    }

    async fn products_api(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn full_run_writes_every_dataset_and_the_report() {
        let server = products_api(json!([
            {"id": 1, "title": "Trail Shoe", "price": 89.5, "description": "Excellent grip, very comfortable", "category": "footwear"},
            {"id": 2, "title": "Rain Jacket", "price": "$120.00", "description": "Leaked after a week, disappointing", "category": "outerwear"},
            {"id": 2, "title": "Rain Jacket", "price": "$120.00", "description": "dup", "category": "outerwear"},
            {"id": 3, "title": "Headlamp", "price": null, "description": "bright", "category": "gear"}
        ]))
        .await;
        let dir = TempDir::new().unwrap();
        let config = config_for(&server, &dir);
        let stages = LiveStages::new(&config);

        let result = run_pipeline(&stages, &StageName::ALL, &[]).await;

        assert_eq!(result.state, PipelineState::Done, "{result}");
        assert_eq!(result.stages[0].rows_out, Some(4));
        // one duplicate removed, one missing price quarantined
        assert_eq!(result.stages[1].rows_out, Some(2));
        assert_eq!(result.stages[3].rows_out, Some(2));
        assert!(stages.paths.raw.exists());
        assert!(stages.paths.rejects.exists());
        assert!(stages.paths.enriched.exists());
        assert!(stages.paths.report.exists());

        let enriched: Vec<EnrichedRecord> =
            read_dataset(&stages.paths.enriched, Schema::Enriched).unwrap();
        assert_eq!(enriched[0].category, "Footwear");
    }

    #[tokio::test]
    async fn empty_collection_stops_before_cleaning() {
        let server = products_api(json!([])).await;
        let dir = TempDir::new().unwrap();
        let config = config_for(&server, &dir);
        let stages = LiveStages::new(&config);

        let result = run_pipeline(&stages, &StageName::ALL, &[]).await;

        assert!(matches!(
            result.state,
            PipelineState::Failed {
                stage: StageName::Collect,
                ..
            }
        ));
        assert!(stages.paths.raw.exists());
        assert!(!stages.paths.cleaned.exists());
        assert_eq!(result.stages[1].status, StageStatus::NotRun);
    }

    #[tokio::test]
    async fn reusing_a_missing_file_fails_that_stage() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let config = config_for(&server, &dir);
        let stages = LiveStages::new(&config);

        let result = run_pipeline(&stages, &StageName::ALL, &[StageName::Collect]).await;

        match &result.state {
            PipelineState::Failed { stage, error } => {
                assert_eq!(*stage, StageName::Collect);
                assert!(error.contains("not found"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn load_reports_the_config_path() {
        let err = load(std::path::Path::new("/nonexistent/compwatch.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/compwatch.yaml"));
    }
}
