//! In-memory row source for tests and fixtures

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::SourceResult;
use crate::source::{RawRow, RowSource};

/// Row source serving a fixed set of rows with real paging semantics.
pub struct MemoryRowSource {
    rows: Vec<RawRow>,
    pages_served: AtomicUsize,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            pages_served: AtomicUsize::new(0),
        }
    }

    /// Number of pages served so far, including the terminating empty page.
    pub fn pages_served(&self) -> usize {
        self.pages_served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    async fn fetch_page(&self, offset: usize, length: usize) -> SourceResult<Vec<RawRow>> {
        self.pages_served.fetch_add(1, Ordering::SeqCst);
        let end = (offset + length).min(self.rows.len());
        if offset >= self.rows.len() {
            return Ok(Vec::new());
        }
        Ok(self.rows[offset..end].to_vec())
    }

    fn describe(&self) -> String {
        format!("memory source ({} rows)", self.rows.len())
    }
}
