//! Worker contract and the template's core function
//!
//! Replace [`core_function`] (and [`TABLE_COLUMNS`]) with the tool's real
//! logic. It must not touch the UI; the page calls it once per token on the
//! blocking thread pool.

use shared::Row;

/// Column header of the result table
pub const TABLE_COLUMNS: [&str; 3] = ["Column 1", "Column 2", "Column 3"];

/// Turns one token into one result row
///
/// Called from a blocking thread, so it may do slow synchronous work.
/// Returning an error skips the token and notifies the user.
#[mockall::automock]
pub trait Worker: Send + Sync {
    fn process(&self, token: &str) -> anyhow::Result<Row>;
}

impl<F> Worker for F
where
    F: Fn(&str) -> anyhow::Result<Row> + Send + Sync,
{
    fn process(&self, token: &str) -> anyhow::Result<Row> {
        self(token)
    }
}

/// The template's placeholder computation
pub fn core_function(input: &str) -> anyhow::Result<Row> {
    Ok(vec![
        "I'm functioning!".to_string(),
        input.to_string(),
        "<- that's the input!".to_string(),
    ])
}

/// Declared columns as owned strings
pub fn table_columns() -> Vec<String> {
    TABLE_COLUMNS.iter().map(|column| column.to_string()).collect()
}
