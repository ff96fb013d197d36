use std::str::FromStr;

use fractic_server_error::ServerError;
use rust_decimal::Decimal;

use crate::errors::InvalidMoneyAmount;

/// Fixed-point money amount as it appears in a CSV cell, e.g. `1,234.50` or
/// the parenthesized-negative convention `(200.00)`. Backed by
/// `rust_decimal` rather than `f64`: banker's-rounding and the $0.005
/// allocation tolerance both need exact decimal arithmetic.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MoneyModel(pub Decimal);

impl FromStr for MoneyModel {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().replace(',', "");
        let is_negative = raw.starts_with('(') && raw.ends_with(')');
        let numeric_part = raw.trim_matches(|c| c == '(' || c == ')');
        let amount = Decimal::from_str(numeric_part).map_err(|_| InvalidMoneyAmount::new(s))?;
        Ok(MoneyModel(if is_negative { -amount } else { amount }))
    }
}

impl From<MoneyModel> for Decimal {
    fn from(value: MoneyModel) -> Self {
        value.0
    }
}
