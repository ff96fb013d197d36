use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ids::{CustomerId, InvoiceId, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Partial,
    Void,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub subscription_id_hint: Option<SubscriptionId>,
    pub invoice_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub amount: Decimal,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn is_void(&self) -> bool {
        self.status == InvoiceStatus::Void
    }
}
