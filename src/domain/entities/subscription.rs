use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ids::{AccountId, SubscriptionId};

/// One `{effective_date, mrr}` override in a subscription's ramp schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RampStep {
    pub effective_date: NaiveDate,
    pub mrr: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub subscription_id: SubscriptionId,
    pub account_id: AccountId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub mrr: Decimal,
    /// Ordered ascending by `effective_date`.
    pub ramp_schedule: Vec<RampStep>,
}

impl Subscription {
    /// `mrr` effective at `on`: the latest ramp step with
    /// `effective_date <= on`, falling back to the base `mrr`.
    pub fn mrr_effective_on(&self, on: NaiveDate) -> Decimal {
        self.ramp_schedule
            .iter()
            .filter(|step| step.effective_date <= on)
            .last()
            .map(|step| step.mrr)
            .unwrap_or(self.mrr)
        // `ramp_schedule` is ordered ascending, so the last matching entry is
        // the latest one whose effective_date has passed.
    }

    /// Ramp steps whose effective_date falls strictly inside `(start, end]`,
    /// i.e. the points at which a segment spanning `[start, end]` must split.
    pub fn ramp_splits_within(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        self.ramp_schedule
            .iter()
            .map(|step| step.effective_date)
            .filter(|&d| d > start && d <= end)
            .collect()
    }
}
