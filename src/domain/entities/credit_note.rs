use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ids::{CreditNoteId, CustomerId, InvoiceId};

#[derive(Debug, Clone, PartialEq)]
pub struct CreditNote {
    pub credit_note_id: CreditNoteId,
    pub customer_id: CustomerId,
    pub invoice_id: Option<InvoiceId>,
    pub credit_date: NaiveDate,
    pub amount: Decimal,
    pub reason: String,
}
