//! Read-model shapes for the `dashboard`/`accounts`/`lineage` operations.
//! These are projections over already-computed reconciliation artifacts —
//! no new arithmetic happens here.

use rust_decimal::Decimal;

use super::allocation::{Allocation, AllocationMethod};
use super::ids::RsxId;
use super::variance::{SegmentVariance, VarianceStatus};

/// One row of the per-account ledger (`accounts(filters)`).
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub rsx_id: RsxId,
    pub account_name: String,
    pub customer_name: Option<String>,
    pub primary_variance_type: VarianceStatus,
    pub total_expected: Decimal,
    pub total_variance: Decimal,
    pub segment_count: usize,
}

/// Filters accepted by `accounts(filters)`. `None` means "don't filter on
/// this dimension."
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilters {
    pub status: Option<VarianceStatus>,
    pub search: Option<String>,
}

impl AccountFilters {
    pub fn matches(&self, row: &AccountRow) -> bool {
        if let Some(status) = self.status {
            if row.primary_variance_type != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystack = format!(
                "{} {}",
                row.account_name.to_lowercase(),
                row.customer_name.as_deref().unwrap_or("").to_lowercase()
            );
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// One line of the per-account lineage export (`lineage(rsx_id)`): a segment
/// together with every allocation touching it, so an auditor can trace an
/// expected amount back to the invoices/credit notes that explain the
/// variance.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageEntry {
    pub segment_id: String,
    pub period: String,
    pub expected: Decimal,
    pub effective_invoiced: Decimal,
    pub variance: Decimal,
    pub status: VarianceStatus,
    pub allocations: Vec<LineageAllocation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineageAllocation {
    pub source_kind: &'static str,
    pub source_id: String,
    pub allocated_amount: Decimal,
    pub method: AllocationMethod,
}

impl LineageAllocation {
    pub(crate) fn from_allocation(alloc: &Allocation) -> Self {
        let (source_kind, source_id) = match &alloc.source {
            super::allocation::AllocationSource::Invoice(id) => ("invoice", id.clone()),
            super::allocation::AllocationSource::CreditNote(id) => ("credit_note", id.clone()),
        };
        LineageAllocation {
            source_kind,
            source_id,
            allocated_amount: alloc.allocated_amount,
            method: alloc.method,
        }
    }
}

/// Groups variances by `rsx_id` for both `AccountRow` construction and
/// `lineage`.
pub(crate) fn group_by_rsx<'a>(
    variances: &'a [SegmentVariance],
) -> std::collections::HashMap<&'a RsxId, Vec<&'a SegmentVariance>> {
    let mut by_rsx: std::collections::HashMap<&RsxId, Vec<&SegmentVariance>> =
        std::collections::HashMap::new();
    for v in variances {
        by_rsx.entry(&v.rsx_id).or_default().push(v);
    }
    by_rsx
}
