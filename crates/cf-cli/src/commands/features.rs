//! Features command: show the feature registry ledger

use anyhow::{Context, Result};

use cf_core::registry::FeatureRegistry;

use crate::cli::{FeaturesArgs, GlobalArgs, LsOutput};
use crate::commands::common::{load_config, open_store, print_table};

pub async fn execute(args: &FeaturesArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config, global);
    let registry = FeatureRegistry::new(store.metadata_dir());
    let records = registry.load().context("Failed to read feature ledger")?;

    match args.output {
        LsOutput::Table => {
            if records.is_empty() {
                println!("Feature ledger is empty");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    vec![
                        r.name.clone(),
                        r.version.clone(),
                        r.source_partition.to_string(),
                        r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                        r.description.clone(),
                    ]
                })
                .collect();
            print_table(
                &["FEATURE", "VERSION", "SOURCE PARTITION", "CREATED", "DESCRIPTION"],
                &rows,
            );
            println!();
            println!("{} record(s)", records.len());
        }
        LsOutput::Json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
