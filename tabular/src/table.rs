//! Accumulator table built up by a batch

use serde::{Deserialize, Serialize};
use shared::Row;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Table shared between the batch filling it and the export reading it
pub type SharedTable = Arc<RwLock<ResultTable>>;

/// Column header plus rows in insertion order
///
/// Rows are not checked against the header; a row may be shorter or longer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultTable {
    /// Empty table with the given header
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn shared(self) -> SharedTable {
        Arc::new(RwLock::new(self))
    }
}
