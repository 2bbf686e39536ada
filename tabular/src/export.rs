//! CSV export of the accumulator table

use shared::Download;

use crate::error::{TabularError, TabularResult};
use crate::table::ResultTable;

/// Name the browser saves the export under
pub const EXPORT_FILENAME: &str = "output.csv";

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Serialize `table` as UTF-8 CSV with CR-LF record terminators
///
/// The header row is the table's columns; an empty table exports the header
/// alone. Rows whose length differs from the header are written as they are.
pub fn to_csv(table: &ResultTable) -> TabularResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| TabularError::CsvBufferError { message: e.to_string() })
}

/// Parse CSV produced by [`to_csv`] back into a table
pub fn from_csv(bytes: &[u8]) -> TabularResult<ResultTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<String>>()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResultTable::new(columns).with_rows(rows))
}

/// Package the table as the `output.csv` download
pub fn export_download(table: &ResultTable) -> TabularResult<Download> {
    Ok(Download::new(EXPORT_FILENAME, CSV_CONTENT_TYPE, to_csv(table)?))
}
