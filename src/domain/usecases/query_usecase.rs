//! `dashboard`/`accounts`/`lineage`/`exclusions`: read-only projections over
//! the artifacts `analyze` already persisted. None of these touch the
//! pipeline — they only reshape what is already in the session store.

use std::collections::HashMap;

use crate::domain::entities::{
    Account, AccountFilters, AccountRow, Allocation, Customer, Exclusion, IdentitySpine,
    LineageAllocation, LineageEntry, ReasonCode, RevenueSegment, RsxId, ScoreReport,
    SegmentVariance,
};
use crate::domain::logic::reconciliation::primary_variance_type;

use super::super::entities::account_view::group_by_rsx;

/// Full `dashboard()` payload: the score report plus the coverage panel it
/// already carries. Kept as a thin re-export so the session layer has one
/// call to make; the heavy lifting already happened in `scoring::score`.
pub(crate) fn dashboard(score: &ScoreReport) -> ScoreReport {
    score.clone()
}

/// `accounts(filters)`: one row per `rsx_id`, aggregated across its segments.
pub(crate) fn accounts(
    accounts: &[Account],
    customers: &[Customer],
    spine: &IdentitySpine,
    variances: &[SegmentVariance],
    filters: &AccountFilters,
) -> Vec<AccountRow> {
    let accounts_by_id: HashMap<&str, &Account> =
        accounts.iter().map(|a| (a.account_id.as_str(), a)).collect();
    let customers_by_id: HashMap<&str, &Customer> =
        customers.iter().map(|c| (c.customer_id.as_str(), c)).collect();
    let by_rsx = group_by_rsx(variances);

    let mut rows: Vec<AccountRow> = spine
        .all_links()
        .filter_map(|link| {
            let rsx_variances = by_rsx.get(&link.rsx_id)?;
            let account_name = accounts_by_id
                .get(link.account_id.as_str())
                .map(|a| a.account_name.clone())
                .unwrap_or_default();
            let customer_name = link
                .customer_id
                .as_ref()
                .and_then(|id| customers_by_id.get(id.as_str()))
                .map(|c| c.customer_name.clone());
            let (primary_variance_type, total_variance) =
                primary_variance_type(rsx_variances).unwrap_or((
                    crate::domain::entities::VarianceStatus::Clean,
                    rust_decimal::Decimal::ZERO,
                ));
            let total_expected = rsx_variances.iter().map(|v| v.expected).sum();
            Some(AccountRow {
                rsx_id: link.rsx_id.clone(),
                account_name,
                customer_name,
                primary_variance_type,
                total_expected,
                total_variance,
                segment_count: rsx_variances.len(),
            })
        })
        .filter(|row| filters.matches(row))
        .collect();

    rows.sort_by(|a, b| a.rsx_id.cmp(&b.rsx_id));
    rows
}

/// `lineage(rsx_id)`: every segment for the account, each carrying the
/// allocations that fed its variance, so an auditor can trace a number back
/// to the invoices/credit notes behind it.
pub(crate) fn lineage(
    rsx_id: &RsxId,
    segments: &[RevenueSegment],
    variances: &[SegmentVariance],
    allocations: &[Allocation],
) -> Vec<LineageEntry> {
    let variance_by_segment: HashMap<&crate::domain::entities::ids::SegmentId, &SegmentVariance> =
        variances.iter().map(|v| (&v.segment_id, v)).collect();

    let mut entries: Vec<LineageEntry> = segments
        .iter()
        .filter(|s| &s.rsx_id == rsx_id)
        .filter_map(|segment| {
            let variance = variance_by_segment.get(&segment.segment_id)?;
            let allocs: Vec<LineageAllocation> = allocations
                .iter()
                .filter(|a| a.segment_id == segment.segment_id)
                .map(LineageAllocation::from_allocation)
                .collect();
            Some(LineageEntry {
                segment_id: segment.segment_id.0.clone(),
                period: segment.period.clone(),
                expected: segment.expected_amount,
                effective_invoiced: variance.effective_invoiced,
                variance: variance.variance,
                status: variance.status,
                allocations: allocs,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.segment_id.cmp(&b.segment_id));
    entries
}

/// `exclusions(reason_code?)`: the append-only exclusion log, optionally
/// filtered to one reason code.
pub(crate) fn exclusions<'a>(
    log: &'a [Exclusion],
    reason_code: Option<ReasonCode>,
) -> Vec<&'a Exclusion> {
    log.iter()
        .filter(|e| reason_code.map_or(true, |rc| e.reason_code == rc))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{IdentityLink, MatchType, VarianceStatus};
    use crate::domain::entities::ids::SegmentId;
    use rust_decimal_macros::dec;

    fn segment_variance(rsx: usize, status: VarianceStatus, variance: rust_decimal::Decimal) -> SegmentVariance {
        SegmentVariance {
            segment_id: SegmentId(format!("seg-{rsx}")),
            rsx_id: RsxId::from_sequence(rsx),
            subscription_id: "sub1".to_string(),
            expected: dec!(1000),
            invoiced: dec!(1000) + variance,
            credit_notes: rust_decimal::Decimal::ZERO,
            effective_invoiced: dec!(1000) + variance,
            collected: dec!(1000) + variance,
            variance,
            status,
        }
    }

    #[test]
    fn accounts_filters_by_status() {
        let accounts = vec![Account {
            account_id: "a1".to_string(),
            account_name: "Acme".to_string(),
            email_domain: None,
        }];
        let spine = IdentitySpine {
            auto_matched: vec![IdentityLink {
                rsx_id: RsxId::from_sequence(1),
                account_id: "a1".to_string(),
                customer_id: Some("c1".to_string()),
                match_type: MatchType::Exact,
                confidence: 1.0,
                evidence: "x".to_string(),
            }],
            needs_review: vec![],
            unmatched: vec![],
            unmatched_customers: vec![],
        };
        let variances = vec![segment_variance(1, VarianceStatus::UnderBilled, dec!(-50))];
        let filters = AccountFilters {
            status: Some(VarianceStatus::UnderBilled),
            search: None,
        };
        let rows = accounts(&accounts, &[], &spine, &variances, &filters);
        assert_eq!(rows.len(), 1);

        let filters_miss = AccountFilters {
            status: Some(VarianceStatus::OverBilled),
            search: None,
        };
        assert!(accounts(&accounts, &[], &spine, &variances, &filters_miss).is_empty());
    }

    #[test]
    fn exclusions_filters_by_reason_code() {
        let log = vec![
            Exclusion {
                record_type: crate::domain::entities::RecordType::Invoice,
                record_id: "inv1".to_string(),
                reason_code: ReasonCode::AllocationAmbiguous,
                description: "no matching segment.".to_string(),
                excluded_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            },
            Exclusion {
                record_type: crate::domain::entities::RecordType::CreditNote,
                record_id: "cn1".to_string(),
                reason_code: ReasonCode::CreditNoteUnallocated,
                description: "credit note could not be matched".to_string(),
                excluded_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            },
        ];
        assert_eq!(exclusions(&log, Some(ReasonCode::AllocationAmbiguous)).len(), 1);
        assert_eq!(exclusions(&log, None).len(), 2);
    }
}
