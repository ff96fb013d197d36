use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ids::{RsxId, SegmentId, SubscriptionId};

/// One calendar-month-aligned (or ramp-split) revenue slice of a
/// subscription. Segments within a subscription never overlap and tile the
/// subscription ∩ reporting-period interval exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueSegment {
    pub segment_id: SegmentId,
    pub rsx_id: RsxId,
    pub subscription_id: SubscriptionId,
    /// `YYYY-MM` label of the month this segment belongs to.
    pub period: String,
    pub segment_start: NaiveDate,
    pub segment_end: NaiveDate,
    pub days_active: i64,
    pub total_days: i64,
    pub mrr_effective: Decimal,
    pub expected_amount: Decimal,
    pub is_prorated: bool,
}

impl RevenueSegment {
    /// Inclusive day-range overlap with `[other_start, other_end]`, in days.
    pub fn overlap_days(&self, other_start: NaiveDate, other_end: NaiveDate) -> i64 {
        let start = self.segment_start.max(other_start);
        let end = self.segment_end.min(other_end);
        if start > end {
            0
        } else {
            (end - start).num_days() + 1
        }
    }
}
