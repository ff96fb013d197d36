use rust_decimal::Decimal;

use super::ids::{CreditNoteId, InvoiceId, SegmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationMethod {
    Exact,
    Proportional,
    Standalone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationSource {
    Invoice(InvoiceId),
    CreditNote(CreditNoteId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub source: AllocationSource,
    pub segment_id: SegmentId,
    pub allocated_amount: Decimal,
    pub method: AllocationMethod,
}
