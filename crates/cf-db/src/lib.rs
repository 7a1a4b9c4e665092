//! cf-db - Warehouse abstraction for Churnflow
//!
//! The external analytical store is a narrow contract: upload a dataset to
//! a table, query a dataset back. The core treats the store as an opaque
//! durable table provider.

pub mod duckdb;
pub mod error;
pub mod snowflake;
pub mod traits;

pub use duckdb::DuckDbWarehouse;
pub use error::{DbError, DbResult};
pub use snowflake::SnowflakeWarehouse;
pub use traits::Warehouse;
