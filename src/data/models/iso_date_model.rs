use std::str::FromStr;

use chrono::NaiveDate;
use fractic_server_error::ServerError;

use crate::errors::InvalidIsoDate;

/// `YYYY-MM-DD` wire format.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ISODateModel(NaiveDate);

impl FromStr for ISODateModel {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| InvalidIsoDate::new(s))?;
        Ok(ISODateModel(d))
    }
}

impl From<ISODateModel> for NaiveDate {
    fn from(value: ISODateModel) -> Self {
        value.0
    }
}
