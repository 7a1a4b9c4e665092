//! Row source trait and the paging driver

use async_trait::async_trait;
use std::collections::BTreeSet;

use cf_core::frame::{Frame, Value};

use crate::error::SourceResult;

/// One raw row as delivered by a source: a JSON object keyed by column name.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Uniform "fetch raw rows" contract.
///
/// Implementations return rows in page-sized batches; an empty page signals
/// completion. Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch one page of rows starting at `offset`.
    async fn fetch_page(&self, offset: usize, length: usize) -> SourceResult<Vec<RawRow>>;

    /// Short description of the source for logging.
    fn describe(&self) -> String;
}

/// Drive a source to completion and assemble the rows into a frame.
///
/// Pages are requested until an empty page comes back. Column order is the
/// sorted union of keys across all rows; rows missing a key get a null.
pub async fn fetch_all(source: &dyn RowSource, page_size: usize) -> SourceResult<Frame> {
    let mut all_rows: Vec<RawRow> = Vec::new();
    let mut offset = 0;
    loop {
        let page = source.fetch_page(offset, page_size).await?;
        if page.is_empty() {
            log::info!("no more rows to fetch from {}", source.describe());
            break;
        }
        offset += page.len();
        all_rows.extend(page);
        log::info!(
            "fetched {} rows so far from {}",
            all_rows.len(),
            source.describe()
        );
    }
    Ok(rows_to_frame(&all_rows))
}

/// Assemble raw rows into a frame.
fn rows_to_frame(rows: &[RawRow]) -> Frame {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(|k| k.as_str()))
        .collect();
    let names: Vec<&str> = columns.into_iter().collect();
    let mut frame = Frame::with_columns(&names);
    for row in rows {
        let values: Vec<Value> = names
            .iter()
            .map(|name| row.get(*name).map(Value::from_json).unwrap_or(Value::Null))
            .collect();
        // arity always matches: values are built from the frame's columns
        let _ = frame.push_row(values);
    }
    frame
}
