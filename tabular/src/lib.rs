//! Tabular tool template
//!
//! Runs a core function once per comma-separated input token, shows the
//! results in a table as they arrive and exports the table as CSV. Replace
//! [`worker::core_function`] and [`worker::TABLE_COLUMNS`] to build a tool.

pub mod dispatcher;
pub mod error;
pub mod export;
pub mod page;
pub mod table;
pub mod tokens;
pub mod worker;

// Re-export main types
pub use dispatcher::{
    BatchDispatcher, BatchId, BatchObserver, BatchReport, BatchState, EMPTY_ROW_MESSAGE, TokenFailure,
};
pub use error::{TabularError, TabularResult};
pub use page::{TabularPage, TabularSession};
pub use table::{ResultTable, SharedTable};
pub use tokens::{TOKEN_DELIMITER, split_tokens};
pub use worker::{TABLE_COLUMNS, Worker, core_function};
