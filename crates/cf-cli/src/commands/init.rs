//! Init command: scaffold a project

use anyhow::{Context, Result};

use cf_core::partition::StageName;

use crate::cli::{GlobalArgs, InitArgs};
use crate::commands::common::project_root;

const CONFIG_TEMPLATE: &str = r#"# Churnflow project configuration
name: churn_pipeline

# Base directory for partitions, metadata, logs, and models
data_root: data

# Binary prediction target
target_column: churn

# Raw row source. For a paged HTTP row API:
#   fetch:
#     kind: http
#     dataset: my-org/customer-churn
#     page_size: 100
#     timeout_secs: 30
fetch:
  kind: file
  path: customers.csv

# Optional external warehouse. Uncomment to round-trip the raw batch
# through a durable table. Snowflake credentials come from the
# CHURNFLOW_WH_USER / CHURNFLOW_WH_PASSWORD / CHURNFLOW_WH_ACCOUNT
# environment variables; never put secrets in this file.
# warehouse:
#   type: duckdb
#   path: data/warehouse.duckdb
#   table: customer_churn_raw

retry:
  max_retries: 2
  delay_ms: 1000
"#;

pub async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let root = project_root(global);
    std::fs::create_dir_all(&root).context("Failed to create project directory")?;

    let config_path = root.join("churnflow.yml");
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    std::fs::write(&config_path, CONFIG_TEMPLATE).context("Failed to write churnflow.yml")?;

    let data_root = root.join("data");
    for stage in StageName::partitioned() {
        std::fs::create_dir_all(data_root.join(stage.data_dir()))
            .context("Failed to create data directories")?;
    }
    std::fs::create_dir_all(data_root.join("metadata"))?;
    std::fs::create_dir_all(data_root.join("logs"))?;

    println!("Initialized churnflow project at {}", root.display());
    println!("  churnflow.yml");
    println!("  data/");
    Ok(())
}
