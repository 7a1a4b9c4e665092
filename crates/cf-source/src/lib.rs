//! cf-source - Raw data fetch contract for Churnflow
//!
//! The ingestion source is an external collaborator behind a uniform
//! "fetch raw rows" contract: rows come back in page-sized batches until an
//! empty page signals completion. Implementations cover a paged HTTP row
//! API and local CSV files; an in-memory source backs tests.

pub mod error;
pub mod file;
pub mod http;
pub mod memory;
pub mod source;

pub use error::{SourceError, SourceResult};
pub use file::CsvFileSource;
pub use http::HttpRowSource;
pub use memory::MemoryRowSource;
pub use source::{fetch_all, RawRow, RowSource};
