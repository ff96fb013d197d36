use fractic_server_error::ServerError;

use crate::domain::entities::InputTables;

/// Raw CSV text for each of the six input tables, already
/// header-normalized by the front door.
pub struct RawCsvInputs<'a> {
    pub accounts_csv: &'a str,
    pub customers_csv: &'a str,
    pub subscriptions_csv: &'a str,
    pub invoices_csv: &'a str,
    pub payments_csv: &'a str,
    pub credit_notes_csv: &'a str,
}

pub(crate) trait RecordsRepository: Send + Sync {
    fn from_strings(&self, inputs: RawCsvInputs<'_>) -> Result<InputTables, ServerError>;
}
