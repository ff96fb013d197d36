use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ids::{InvoiceId, PaymentId};

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub invoice_id: InvoiceId,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
}
