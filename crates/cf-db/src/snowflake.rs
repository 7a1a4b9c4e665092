//! Snowflake warehouse backend stub
//!
//! Placeholder for a future Snowflake connector. Construction already
//! enforces the credential rule: secrets come from the environment at
//! startup, never from literals in code or committed configuration.

use crate::error::{DbError, DbResult};
use crate::traits::Warehouse;
use async_trait::async_trait;
use cf_core::config::WarehouseCredentials;
use cf_core::frame::Frame;

/// Snowflake warehouse backend (stub implementation)
#[derive(Debug)]
pub struct SnowflakeWarehouse {
    #[allow(dead_code)]
    credentials: WarehouseCredentials,
}

impl SnowflakeWarehouse {
    /// Create a new Snowflake backend from environment-resolved credentials.
    pub fn new(credentials: Option<WarehouseCredentials>) -> DbResult<Self> {
        let credentials = credentials.ok_or_else(|| DbError::ConnectionError(
            "Snowflake credentials not found. Set CHURNFLOW_WH_USER, CHURNFLOW_WH_PASSWORD, and CHURNFLOW_WH_ACCOUNT."
                .to_string(),
        ))?;
        Ok(Self { credentials })
    }

    fn not_implemented(feature: &str) -> DbError {
        DbError::NotImplemented {
            backend: "snowflake".to_string(),
            feature: feature.to_string(),
        }
    }
}

#[async_trait]
impl Warehouse for SnowflakeWarehouse {
    async fn upload(&self, _table: &str, _frame: &Frame, _overwrite: bool) -> DbResult<usize> {
        Err(Self::not_implemented("upload"))
    }

    async fn query(&self, _sql: &str) -> DbResult<Frame> {
        Err(Self::not_implemented("query"))
    }

    async fn relation_exists(&self, _table: &str) -> DbResult<bool> {
        Err(Self::not_implemented("relation_exists"))
    }

    fn db_type(&self) -> &'static str {
        "snowflake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_fail_construction() {
        let err = SnowflakeWarehouse::new(None).unwrap_err();
        assert!(matches!(err, DbError::ConnectionError(_)));
    }
}
