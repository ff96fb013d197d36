use std::str::FromStr;

use fractic_server_error::ServerError;

use crate::data::models::iso_date_model::ISODateModel;
use crate::data::models::money_model::MoneyModel;
use crate::domain::entities::CreditNote;

use super::common::{optional_column, parse_row_error, required_column};

const FILE: &str = "credit_notes.csv";

/// Columns: `credit_note_id, customer_id, invoice_id, credit_date, amount,
/// reason`.
pub(crate) trait CreditNotesCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<CreditNote>, ServerError>;
}

pub(crate) struct CreditNotesCsvDatasourceImpl;

impl CreditNotesCsvDatasource for CreditNotesCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<CreditNote>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                let record = r.map_err(parse_row_error)?;
                Ok(CreditNote {
                    credit_note_id: required_column(&record, 0, "credit_note_id", FILE)?.to_string(),
                    customer_id: required_column(&record, 1, "customer_id", FILE)?.to_string(),
                    invoice_id: optional_column(&record, 2).map(str::to_string),
                    credit_date: ISODateModel::from_str(required_column(
                        &record, 3, "credit_date", FILE,
                    )?)?
                    .into(),
                    amount: MoneyModel::from_str(required_column(&record, 4, "amount", FILE)?)?.into(),
                    reason: optional_column(&record, 5).unwrap_or("").to_string(),
                })
            })
            .collect()
    }
}
