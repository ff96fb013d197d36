use std::str::FromStr;

use chrono::NaiveDate;
use fractic_server_error::ServerError;
use iso_currency::Currency;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::data::models::iso_date_model::ISODateModel;
use crate::errors::{InvalidCurrencyCode, InvalidPeriodBounds, MissingSetting, UnknownSettingKey};

const RECOGNIZED_KEYS: &[&str] = &["currency", "period_start", "period_end", "tolerance"];

/// Validated session configuration. `currency` never enters arithmetic — it
/// is a display symbol only.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub currency: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tolerance: Decimal,
}

impl SessionSettings {
    pub const DEFAULT_TOLERANCE: &'static str = "1.00";

    pub fn from_value(settings: &Value) -> Result<Self, ServerError> {
        let object = settings.as_object().cloned().unwrap_or_default();

        for key in object.keys() {
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                return Err(UnknownSettingKey::new(key));
            }
        }

        let currency = object
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or("USD")
            .to_string();
        // Display symbol only — never enters the arithmetic, just validated
        // so a typo surfaces at `validate()` time rather than silently in a
        // report.
        Currency::from_code(&currency).ok_or_else(|| InvalidCurrencyCode::new(&currency))?;

        let period_start = Self::required_date(&object, "period_start")?;
        let period_end = Self::required_date(&object, "period_end")?;
        if period_end < period_start {
            return Err(InvalidPeriodBounds::new(&period_start, &period_end));
        }

        let tolerance = match object.get("tolerance").and_then(Value::as_str) {
            Some(raw) => Decimal::from_str(raw).map_err(|_| {
                crate::errors::InvalidMoneyAmount::new(raw)
            })?,
            None => Decimal::from_str(Self::DEFAULT_TOLERANCE).expect("static literal parses"),
        };

        Ok(Self {
            currency,
            period_start,
            period_end,
            tolerance,
        })
    }

    fn required_date(
        object: &serde_json::Map<String, Value>,
        key: &'static str,
    ) -> Result<NaiveDate, ServerError> {
        let raw = object
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| MissingSetting::new(key))?;
        Ok(ISODateModel::from_str(raw)?.into())
    }
}
