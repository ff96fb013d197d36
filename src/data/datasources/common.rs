use fractic_server_error::ServerError;

use crate::errors::{InvalidCsv, MissingRequiredColumn};

/// Positional column fetch with a descriptive error instead of a panic on a
/// short row; required columns fail loudly instead of silently defaulting
/// to "".
pub(super) fn required_column<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    column: &'static str,
    file: &'static str,
) -> Result<&'a str, ServerError> {
    record
        .get(index)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MissingRequiredColumn::new(column, file))
}

pub(super) fn optional_column<'a>(record: &'a csv::StringRecord, index: usize) -> Option<&'a str> {
    record.get(index).filter(|s| !s.is_empty())
}

pub(super) fn parse_row_error(e: csv::Error) -> ServerError {
    InvalidCsv::with_debug(&e)
}
