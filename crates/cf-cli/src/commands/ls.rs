//! Ls command: list stored partitions per stage

use anyhow::Result;
use serde_json::json;

use cf_core::partition::StageName;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::{load_config, open_store, print_table};

pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config, global);

    let stages: Vec<StageName> = match &args.stage {
        Some(name) => {
            let stage: StageName = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            vec![stage]
        }
        None => StageName::partitioned().collect(),
    };

    let mut rows = Vec::new();
    let mut entries = Vec::new();
    for stage in stages {
        for key in store.list_keys(stage) {
            let complete = store.artifact_path(stage, &key).exists();
            rows.push(vec![
                stage.to_string(),
                key.to_string(),
                if complete { "complete" } else { "incomplete" }.to_string(),
            ]);
            entries.push(json!({
                "stage": stage.to_string(),
                "partition": key.to_string(),
                "complete": complete,
                "artifact": store.artifact_path(stage, &key).display().to_string(),
            }));
        }
    }

    match args.output {
        LsOutput::Table => {
            if rows.is_empty() {
                println!("No partitions found under {}", store.base().display());
            } else {
                print_table(&["STAGE", "PARTITION", "STATUS"], &rows);
            }
        }
        LsOutput::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
