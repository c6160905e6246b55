//! Writes the rows of a transaction query as CSV.

use std::io::Write;

use serde::Serialize;

use crate::{Error, format::format_date, query::QueryResult};

const HEADER: [&str; 6] = ["id", "date", "type", "category", "amount", "description"];

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    date: String,
    #[serde(rename = "type")]
    kind: &'a str,
    category: &'a str,
    amount: String,
    description: &'a str,
}

/// Write the rows of `result` to `writer` as CSV with a header line.
///
/// The header is written even when there are no rows.
///
/// Amounts are written with two decimal places and no currency symbol so that
/// spreadsheets read them as numbers. Dates are written the way they are
/// displayed.
///
/// # Errors
/// Returns an [Error::CsvError] if the CSV could not be written.
pub fn write_csv<W: Write>(writer: W, result: &QueryResult) -> Result<(), Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for transaction in &result.rows {
        csv_writer.serialize(CsvRow {
            id: transaction.id,
            date: format_date(transaction.date),
            kind: transaction.kind.as_str(),
            category: &transaction.category,
            amount: format!("{:.2}", transaction.amount),
            description: transaction.description.as_deref().unwrap_or_default(),
        })?;
    }

    csv_writer.flush().map_err(|error| Error::CsvError(error.to_string()))?;

    tracing::debug!("exported {} transactions as CSV", result.rows.len());

    Ok(())
}
