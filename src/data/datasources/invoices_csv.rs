use std::str::FromStr;

use fractic_server_error::ServerError;

use crate::data::models::iso_date_model::ISODateModel;
use crate::data::models::money_model::MoneyModel;
use crate::domain::entities::{Invoice, InvoiceStatus};
use crate::errors::InvalidCsv;

use super::common::{optional_column, parse_row_error, required_column};

const FILE: &str = "invoices.csv";

/// Columns: `invoice_id, customer_id, subscription_id, invoice_date,
/// period_start, period_end, amount, status`. `status` is already
/// canonicalized to one of `paid|unpaid|partial|void` upstream.
pub(crate) trait InvoicesCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<Invoice>, ServerError>;
}

pub(crate) struct InvoicesCsvDatasourceImpl;

impl InvoicesCsvDatasource for InvoicesCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<Invoice>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                let record = r.map_err(parse_row_error)?;
                Ok(Invoice {
                    invoice_id: required_column(&record, 0, "invoice_id", FILE)?.to_string(),
                    customer_id: required_column(&record, 1, "customer_id", FILE)?.to_string(),
                    subscription_id_hint: optional_column(&record, 2).map(str::to_string),
                    invoice_date: ISODateModel::from_str(required_column(&record, 3, "invoice_date", FILE)?)?
                        .into(),
                    period_start: ISODateModel::from_str(required_column(
                        &record, 4, "period_start", FILE,
                    )?)?
                    .into(),
                    period_end: ISODateModel::from_str(required_column(&record, 5, "period_end", FILE)?)?
                        .into(),
                    amount: MoneyModel::from_str(required_column(&record, 6, "amount", FILE)?)?.into(),
                    status: parse_status(required_column(&record, 7, "status", FILE)?)?,
                })
            })
            .collect()
    }
}

fn parse_status(raw: &str) -> Result<InvoiceStatus, ServerError> {
    match raw {
        "paid" => Ok(InvoiceStatus::Paid),
        "unpaid" => Ok(InvoiceStatus::Unpaid),
        "partial" => Ok(InvoiceStatus::Partial),
        "void" => Ok(InvoiceStatus::Void),
        other => Err(InvalidCsv::with_debug(&other)),
    }
}
