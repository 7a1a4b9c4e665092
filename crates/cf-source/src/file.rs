//! Local CSV file row source
//!
//! Serves a whole file as a single page; any later offset is an empty page,
//! which terminates the paging driver.

use async_trait::async_trait;
use std::path::PathBuf;

use cf_core::frame::Frame;

use crate::error::{SourceError, SourceResult};
use crate::source::{RawRow, RowSource};

/// Row source backed by a local CSV file.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RowSource for CsvFileSource {
    async fn fetch_page(&self, offset: usize, _length: usize) -> SourceResult<Vec<RawRow>> {
        if offset > 0 {
            return Ok(Vec::new());
        }
        let frame = Frame::read_csv(&self.path).map_err(|e| SourceError::File {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let names = frame.column_names();
        let mut rows = Vec::with_capacity(frame.n_rows());
        for i in 0..frame.n_rows() {
            let mut row = RawRow::new();
            for (name, value) in names.iter().zip(frame.row(i)) {
                let json = serde_json::to_value(value).map_err(|e| SourceError::File {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })?;
                row.insert(name.to_string(), json);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fetch_all;
    use cf_core::frame::Value;

    #[tokio::test]
    async fn test_file_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.csv");
        std::fs::write(&path, "age,churn\n30,0\n41,1\n").unwrap();

        let source = CsvFileSource::new(&path);
        let frame = fetch_all(&source, 50).await.unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.column("age").unwrap().values[1], Value::Int(41));
    }

    #[tokio::test]
    async fn test_missing_file_is_source_error() {
        let source = CsvFileSource::new("/nonexistent/file.csv");
        let err = source.fetch_page(0, 10).await.unwrap_err();
        assert!(matches!(err, SourceError::File { .. }));
    }
}
