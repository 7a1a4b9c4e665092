//! End-to-end pipeline scenario tests
//!
//! Drives the full standard chain in local mode (no warehouse) against an
//! in-memory row source and a temporary partition store.

use std::sync::Arc;

use cf_core::config::Config;
use cf_core::frame::Value;
use cf_core::partition::{PartitionKey, StageName};
use cf_core::registry::FeatureRegistry;
use cf_core::store::PartitionStore;
use cf_engine::orchestrator::Orchestrator;
use cf_engine::stage::StageContext;
use cf_source::{MemoryRowSource, RawRow};
use serde_json::json;

fn customer_rows() -> Vec<RawRow> {
    // No missing values, churn strictly 0/1, every column has a repeated
    // value somewhere (nothing constant, nothing all-unique), and no row
    // duplicates another.
    let rows = [
        (34, 24, 50.25, 0),
        (34, 18, 61.5, 1),
        (45, 18, 50.25, 0),
        (52, 6, 80.0, 1),
        (45, 30, 61.5, 0),
        (29, 24, 80.0, 1),
    ];
    rows.iter()
        .map(|(age, tenure, spend, churn)| {
            let mut row = RawRow::new();
            row.insert("age".to_string(), json!(age));
            row.insert("tenure_months".to_string(), json!(tenure));
            row.insert("monthly_spend".to_string(), json!(spend));
            row.insert("churn".to_string(), json!(churn));
            row
        })
        .collect()
}

fn scenario_ctx(dir: &std::path::Path) -> StageContext {
    let config: Config = serde_yaml::from_str("name: churn_pipeline").unwrap();
    StageContext {
        config: Arc::new(config),
        store: PartitionStore::new(dir),
        key: PartitionKey::parse("2024-01-01").unwrap(),
        source: Some(Arc::new(MemoryRowSource::new(customer_rows()))),
        warehouse: None,
    }
}

#[tokio::test]
async fn test_full_chain_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = scenario_ctx(dir.path());
    let retry = ctx.config.retry;

    let report = Orchestrator::standard(retry).quiet().run(&ctx).await.unwrap();
    assert!(report.succeeded, "run failed: {:?}", report);
    assert_eq!(report.stages.len(), 7);
    assert!(report.stages.iter().all(|s| s.succeeded));

    let store = &ctx.store;

    // validation reported every column OK
    let validation = store.resolve_latest(StageName::Validate).unwrap();
    let validation_frame = store.read(&validation).unwrap();
    let statuses = &validation_frame.column("status").unwrap().values;
    assert_eq!(statuses.len(), 4);
    assert!(statuses.iter().all(|s| *s == Value::Str("OK".into())));

    // preparation dropped no rows: there were no duplicates
    let prepared = store.resolve_latest(StageName::Prepare).unwrap();
    let prepared_frame = store.read(&prepared).unwrap();
    assert_eq!(prepared_frame.n_rows(), 6);

    // transformation added tenure_years = tenure_months / 12 exactly
    let transformed = store.resolve_latest(StageName::Transform).unwrap();
    let transformed_frame = store.read(&transformed).unwrap();
    let tenure_years = transformed_frame.column("tenure_years").unwrap();
    assert_eq!(
        tenure_years.values,
        vec![
            Value::Float(2.0),
            Value::Float(1.5),
            Value::Float(1.5),
            Value::Float(0.5),
            Value::Float(2.5),
            Value::Float(2.0),
        ]
    );

    // feature registration appended exactly one record to the empty ledger
    let registry = FeatureRegistry::new(store.metadata_dir());
    let records = registry.load().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "tenure_years");
    assert_eq!(records[0].source_partition.as_str(), "2024-01-01");

    // the model handoff exists: artifact plus evaluation metric set
    let model = store.resolve_latest(StageName::Train).unwrap();
    assert!(model.path.exists());
    let metrics_path = store
        .partition_dir(StageName::Train, &model.key)
        .join("metrics.json");
    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(metrics_path).unwrap()).unwrap();
    for key in ["accuracy", "precision", "recall", "f1"] {
        let value = metrics[key].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&value), "{} out of range: {}", key, value);
    }
}

#[tokio::test]
async fn test_rerun_same_day_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = scenario_ctx(dir.path());
    let retry = ctx.config.retry;

    Orchestrator::standard(retry).quiet().run(&ctx).await.unwrap();
    let report = Orchestrator::standard(retry).quiet().run(&ctx).await.unwrap();
    assert!(report.succeeded);

    // partitions were overwritten in place, not duplicated
    let keys = ctx.store.list_keys(StageName::Transform);
    assert_eq!(keys.len(), 1);

    // the append-only ledger grew: one record per run
    let registry = FeatureRegistry::new(ctx.store.metadata_dir());
    assert_eq!(registry.load().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chain_halts_when_fetch_has_no_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = scenario_ctx(dir.path());
    ctx.source = None;
    let retry = ctx.config.retry;

    let report = Orchestrator::standard(retry).quiet().run(&ctx).await.unwrap();
    assert!(!report.succeeded);
    assert_eq!(report.halted_at, Some(StageName::Fetch));
    assert_eq!(report.stages.len(), 1);

    // nothing downstream was produced
    assert!(ctx.store.resolve_latest(StageName::Ingest).is_err());
    assert!(ctx.store.resolve_latest(StageName::Train).is_err());
}
