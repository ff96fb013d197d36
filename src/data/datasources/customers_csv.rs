use fractic_server_error::ServerError;

use crate::domain::entities::Customer;

use super::common::{optional_column, parse_row_error, required_column};

const FILE: &str = "customers.csv";

/// Columns: `customer_id, customer_name, email_domain`.
pub(crate) trait CustomersCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<Customer>, ServerError>;
}

pub(crate) struct CustomersCsvDatasourceImpl;

impl CustomersCsvDatasource for CustomersCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<Customer>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                let record = r.map_err(parse_row_error)?;
                Ok(Customer {
                    customer_id: required_column(&record, 0, "customer_id", FILE)?.to_string(),
                    customer_name: required_column(&record, 1, "customer_name", FILE)?.to_string(),
                    email_domain: optional_column(&record, 2).map(str::to_string),
                })
            })
            .collect()
    }
}
