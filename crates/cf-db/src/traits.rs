//! Warehouse trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use cf_core::frame::Frame;

/// Warehouse abstraction for Churnflow
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Upload a dataset to a table, returning the number of rows written.
    /// With `overwrite`, an existing table is replaced.
    async fn upload(&self, table: &str, frame: &Frame, overwrite: bool) -> DbResult<usize>;

    /// Execute a query and return the result set as a frame.
    async fn query(&self, sql: &str) -> DbResult<Frame>;

    /// Check whether a table exists.
    async fn relation_exists(&self, table: &str) -> DbResult<bool>;

    /// Warehouse type identifier for logging.
    fn db_type(&self) -> &'static str;
}
