use std::str::FromStr;

use fractic_server_error::ServerError;

use crate::data::models::iso_date_model::ISODateModel;
use crate::data::models::money_model::MoneyModel;
use crate::domain::entities::Payment;

use super::common::{parse_row_error, required_column};

const FILE: &str = "payments.csv";

/// Columns: `payment_id, invoice_id, payment_date, amount`.
pub(crate) trait PaymentsCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<Payment>, ServerError>;
}

pub(crate) struct PaymentsCsvDatasourceImpl;

impl PaymentsCsvDatasource for PaymentsCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<Payment>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                let record = r.map_err(parse_row_error)?;
                Ok(Payment {
                    payment_id: required_column(&record, 0, "payment_id", FILE)?.to_string(),
                    invoice_id: required_column(&record, 1, "invoice_id", FILE)?.to_string(),
                    payment_date: ISODateModel::from_str(required_column(
                        &record, 2, "payment_date", FILE,
                    )?)?
                    .into(),
                    amount: MoneyModel::from_str(required_column(&record, 3, "amount", FILE)?)?.into(),
                })
            })
            .collect()
    }
}
