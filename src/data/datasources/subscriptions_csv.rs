use std::str::FromStr;

use fractic_server_error::ServerError;

use crate::data::models::iso_date_model::ISODateModel;
use crate::data::models::money_model::MoneyModel;
use crate::domain::entities::{RampStep, Subscription};
use crate::errors::InvalidCsv;

use super::common::{optional_column, parse_row_error, required_column};

const FILE: &str = "subscriptions.csv";

/// Columns: `subscription_id, account_id, start_date, end_date, mrr,
/// ramp_schedule`. `ramp_schedule` is a `;`-separated list of
/// `effective_date:mrr` pairs, e.g. `2024-03-01:3500.00;2024-06-01:4000.00`;
/// empty when the subscription has no ramp.
pub(crate) trait SubscriptionsCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<Subscription>, ServerError>;
}

pub(crate) struct SubscriptionsCsvDatasourceImpl;

impl SubscriptionsCsvDatasource for SubscriptionsCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<Subscription>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                let record = r.map_err(parse_row_error)?;
                let mut ramp_schedule = parse_ramp_schedule(optional_column(&record, 5))?;
                ramp_schedule.sort_by_key(|step| step.effective_date);
                Ok(Subscription {
                    subscription_id: required_column(&record, 0, "subscription_id", FILE)?.to_string(),
                    account_id: required_column(&record, 1, "account_id", FILE)?.to_string(),
                    start_date: ISODateModel::from_str(required_column(&record, 2, "start_date", FILE)?)?
                        .into(),
                    end_date: ISODateModel::from_str(required_column(&record, 3, "end_date", FILE)?)?
                        .into(),
                    mrr: MoneyModel::from_str(required_column(&record, 4, "mrr", FILE)?)?.into(),
                    ramp_schedule,
                })
            })
            .collect()
    }
}

fn parse_ramp_schedule(raw: Option<&str>) -> Result<Vec<RampStep>, ServerError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (date, mrr) = entry
                .split_once(':')
                .ok_or_else(|| InvalidCsv::with_debug(&entry))?;
            Ok(RampStep {
                effective_date: ISODateModel::from_str(date)?.into(),
                mrr: MoneyModel::from_str(mrr)?.into(),
            })
        })
        .collect()
}
