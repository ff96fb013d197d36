use rust_decimal::Decimal;

use super::ids::{RsxId, SegmentId, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarianceStatus {
    // Declared lowest-priority-first: derived `Ord` ranks later variants
    // higher, giving the required account-level tie-break order —
    // MISSING_INVOICE > UNPAID_AR > UNDER_BILLED > OVER_BILLED > UNKNOWN >
    // CLEAN — so `Iterator::max` over statuses picks the right winner.
    Clean,
    Unknown,
    OverBilled,
    UnderBilled,
    UnpaidAr,
    MissingInvoice,
}

impl VarianceStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, VarianceStatus::Clean)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentVariance {
    pub segment_id: SegmentId,
    pub rsx_id: RsxId,
    pub subscription_id: SubscriptionId,
    pub expected: Decimal,
    pub invoiced: Decimal,
    pub credit_notes: Decimal,
    pub effective_invoiced: Decimal,
    pub collected: Decimal,
    pub variance: Decimal,
    pub status: VarianceStatus,
}
