use fractic_server_error::ServerError;

use crate::domain::entities::Account;

use super::common::{optional_column, parse_row_error, required_column};

const FILE: &str = "accounts.csv";

/// Columns: `account_id, account_name, email_domain`.
pub(crate) trait AccountsCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<Account>, ServerError>;
}

pub(crate) struct AccountsCsvDatasourceImpl;

impl AccountsCsvDatasource for AccountsCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<Account>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                let record = r.map_err(parse_row_error)?;
                Ok(Account {
                    account_id: required_column(&record, 0, "account_id", FILE)?.to_string(),
                    account_name: required_column(&record, 1, "account_name", FILE)?.to_string(),
                    email_domain: optional_column(&record, 2).map(str::to_string),
                })
            })
            .collect()
    }
}
