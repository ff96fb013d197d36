//! Reconciliation: allocates invoices and credit notes onto segments for a
//! single `rsx_id`, then derives per-segment variance and status. Pure
//! function of its inputs — no I/O, no session state.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::entities::{
    Allocation, AllocationMethod, AllocationSource, CreditNote, Exclusion, Invoice, InvoiceId,
    InvoiceStatus, Payment, ReasonCode, RecordType, RevenueSegment, SegmentId, SegmentVariance,
    VarianceStatus,
};

use super::calendar::{month_end, month_start};
use super::money::proportional_split;

pub(crate) struct ReconciliationOutput {
    pub allocations: Vec<Allocation>,
    pub variances: Vec<SegmentVariance>,
    pub exclusions: Vec<Exclusion>,
}

/// Runs Phases A-C of reconciliation for one account's (`rsx_id`'s) segments.
/// `has_customer_link` gates the UNKNOWN status per the classification table.
pub(crate) fn reconcile(
    segments: &[RevenueSegment],
    invoices: &[Invoice],
    payments: &[Payment],
    credit_notes: &[CreditNote],
    has_customer_link: bool,
    tolerance: Decimal,
    excluded_at: NaiveDateTime,
) -> ReconciliationOutput {
    let mut allocations = Vec::new();
    let mut exclusions = Vec::new();

    // invoice_id -> (segment_id, weight) pairs used for its own allocation,
    // reused verbatim so a linked credit note mirrors the same split.
    let mut invoice_splits: HashMap<&InvoiceId, Vec<(SegmentId, i64)>> = HashMap::new();
    let invoices_by_id: HashMap<&InvoiceId, &Invoice> =
        invoices.iter().map(|inv| (&inv.invoice_id, inv)).collect();

    for inv in invoices {
        if inv.status == InvoiceStatus::Void {
            exclusions.push(Exclusion {
                record_type: RecordType::Invoice,
                record_id: inv.invoice_id.clone(),
                reason_code: ReasonCode::UnsupportedStructure,
                description: "void invoice excluded from allocation".to_string(),
                excluded_at,
            });
            continue;
        }

        let overlapping: Vec<(&RevenueSegment, i64)> = segments
            .iter()
            .map(|s| (s, s.overlap_days(inv.period_start, inv.period_end)))
            .filter(|(_, d)| *d > 0)
            .collect();

        match overlapping.len() {
            0 => {
                exclusions.push(Exclusion {
                    record_type: RecordType::Invoice,
                    record_id: inv.invoice_id.clone(),
                    reason_code: ReasonCode::AllocationAmbiguous,
                    description: "no matching segment.".to_string(),
                    excluded_at,
                });
            }
            1 => {
                let segment = overlapping[0].0;
                allocations.push(Allocation {
                    source: AllocationSource::Invoice(inv.invoice_id.clone()),
                    segment_id: segment.segment_id.clone(),
                    allocated_amount: inv.amount,
                    method: AllocationMethod::Exact,
                });
                invoice_splits
                    .entry(&inv.invoice_id)
                    .or_default()
                    .push((segment.segment_id.clone(), 1));
            }
            _ => {
                let weights: Vec<i64> = overlapping.iter().map(|(_, d)| *d).collect();
                let shares = proportional_split(inv.amount, &weights);
                let mut splits = Vec::with_capacity(overlapping.len());
                for ((segment, _), share) in overlapping.iter().zip(shares.iter()) {
                    allocations.push(Allocation {
                        source: AllocationSource::Invoice(inv.invoice_id.clone()),
                        segment_id: segment.segment_id.clone(),
                        allocated_amount: *share,
                        method: AllocationMethod::Proportional,
                    });
                    splits.push((segment.segment_id.clone(), segment.overlap_days(inv.period_start, inv.period_end)));
                }
                invoice_splits.insert(&inv.invoice_id, splits);
            }
        }
    }

    for cn in credit_notes {
        let linked_splits = cn
            .invoice_id
            .as_ref()
            .and_then(|inv_id| invoice_splits.get(inv_id));

        if let Some(splits) = linked_splits {
            let weights: Vec<i64> = splits.iter().map(|(_, w)| *w).collect();
            let shares = proportional_split(cn.amount, &weights);
            for ((segment_id, _), share) in splits.iter().zip(shares.iter()) {
                allocations.push(Allocation {
                    source: AllocationSource::CreditNote(cn.credit_note_id.clone()),
                    segment_id: segment_id.clone(),
                    allocated_amount: *share,
                    method: AllocationMethod::Exact,
                });
            }
            continue;
        }

        let month_first = month_start(cn.credit_date);
        let month_last = match month_end(cn.credit_date) {
            Ok(d) => d,
            Err(_) => {
                exclusions.push(credit_note_unallocated(cn, excluded_at));
                continue;
            }
        };
        let overlapping: Vec<&RevenueSegment> = segments
            .iter()
            .filter(|s| s.overlap_days(month_first, month_last) > 0)
            .collect();

        match overlapping.len() {
            1 => allocations.push(Allocation {
                source: AllocationSource::CreditNote(cn.credit_note_id.clone()),
                segment_id: overlapping[0].segment_id.clone(),
                allocated_amount: cn.amount,
                method: AllocationMethod::Standalone,
            }),
            _ => exclusions.push(credit_note_unallocated(cn, excluded_at)),
        }
    }

    let payment_totals: HashMap<&InvoiceId, Decimal> =
        payments.iter().fold(HashMap::new(), |mut acc, p| {
            *acc.entry(&p.invoice_id).or_insert(Decimal::ZERO) += p.amount;
            acc
        });

    let variances = segments
        .iter()
        .map(|segment| {
            let invoice_allocs: Vec<&Allocation> = allocations
                .iter()
                .filter(|a| a.segment_id == segment.segment_id && matches!(a.source, AllocationSource::Invoice(_)))
                .collect();
            let credit_allocs: Vec<&Allocation> = allocations
                .iter()
                .filter(|a| a.segment_id == segment.segment_id && matches!(a.source, AllocationSource::CreditNote(_)))
                .collect();

            let invoiced: Decimal = invoice_allocs.iter().map(|a| a.allocated_amount).sum();
            let credit_notes_total: Decimal = credit_allocs.iter().map(|a| a.allocated_amount).sum();
            let effective_invoiced = invoiced - credit_notes_total;

            let collected: Decimal = invoice_allocs
                .iter()
                .filter_map(|a| {
                    let AllocationSource::Invoice(inv_id) = &a.source else {
                        return None;
                    };
                    let inv = invoices_by_id.get(inv_id)?;
                    if inv.amount == Decimal::ZERO {
                        return None;
                    }
                    let paid = *payment_totals.get(inv_id).unwrap_or(&Decimal::ZERO);
                    Some(paid * a.allocated_amount / inv.amount)
                })
                .sum();

            let variance = effective_invoiced - segment.expected_amount;
            let status = classify(
                has_customer_link,
                effective_invoiced,
                segment.expected_amount,
                variance,
                collected,
                tolerance,
            );

            SegmentVariance {
                segment_id: segment.segment_id.clone(),
                rsx_id: segment.rsx_id.clone(),
                subscription_id: segment.subscription_id.clone(),
                expected: segment.expected_amount,
                invoiced,
                credit_notes: credit_notes_total,
                effective_invoiced,
                collected,
                variance,
                status,
            }
        })
        .collect();

    ReconciliationOutput {
        allocations,
        variances,
        exclusions,
    }
}

fn classify(
    has_customer_link: bool,
    effective_invoiced: Decimal,
    expected: Decimal,
    variance: Decimal,
    collected: Decimal,
    tolerance: Decimal,
) -> VarianceStatus {
    if !has_customer_link {
        return VarianceStatus::Unknown;
    }
    if effective_invoiced == Decimal::ZERO && expected > tolerance {
        return VarianceStatus::MissingInvoice;
    }
    if variance.abs() <= tolerance {
        return if collected >= effective_invoiced - tolerance {
            VarianceStatus::Clean
        } else {
            VarianceStatus::UnpaidAr
        };
    }
    if variance < -tolerance {
        return VarianceStatus::UnderBilled;
    }
    VarianceStatus::OverBilled
}

fn credit_note_unallocated(cn: &CreditNote, excluded_at: NaiveDateTime) -> Exclusion {
    Exclusion {
        record_type: RecordType::CreditNote,
        record_id: cn.credit_note_id.clone(),
        reason_code: ReasonCode::CreditNoteUnallocated,
        description: "credit note could not be matched to exactly one segment".to_string(),
        excluded_at,
    }
}

/// Rolls segment-level statuses up to the account's `primary_variance_type`:
/// the non-CLEAN status with the largest aggregate `|variance|`; ties break
/// via `VarianceStatus`'s declaration order.
pub(crate) fn primary_variance_type(variances: &[SegmentVariance]) -> Option<(VarianceStatus, Decimal)> {
    let mut totals: HashMap<VarianceStatus, Decimal> = HashMap::new();
    for v in variances {
        if v.status.is_clean() {
            continue;
        }
        *totals.entry(v.status).or_insert(Decimal::ZERO) += v.variance.abs();
    }
    totals
        .into_iter()
        .max_by(|(status_a, total_a), (status_b, total_b)| {
            total_a.cmp(total_b).then(status_a.cmp(status_b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RsxId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn now() -> NaiveDateTime {
        d("2024-01-01").and_hms_opt(0, 0, 0).unwrap()
    }

    fn segment(id: &str, start: &str, end: &str, expected: Decimal) -> RevenueSegment {
        let days = (d(end) - d(start)).num_days() + 1;
        RevenueSegment {
            segment_id: SegmentId(id.to_string()),
            rsx_id: RsxId::from_sequence(1),
            subscription_id: "sub1".to_string(),
            period: d(start).format("%Y-%m").to_string(),
            segment_start: d(start),
            segment_end: d(end),
            days_active: days,
            total_days: days,
            mrr_effective: expected,
            expected_amount: expected,
            is_prorated: false,
        }
    }

    fn invoice(id: &str, start: &str, end: &str, amount: Decimal, status: InvoiceStatus) -> Invoice {
        Invoice {
            invoice_id: id.to_string(),
            customer_id: "c1".to_string(),
            subscription_id_hint: None,
            invoice_date: d(start),
            period_start: d(start),
            period_end: d(end),
            amount,
            status,
        }
    }

    #[test]
    fn s3_proportional_allocation_matches_overlap_days() {
        let segments = vec![
            segment("seg-jan", "2024-01-01", "2024-01-31", dec!(1000)),
            segment("seg-feb", "2024-02-01", "2024-02-29", dec!(1000)),
            segment("seg-mar", "2024-03-01", "2024-03-31", dec!(1000)),
        ];
        let invoices = vec![invoice(
            "inv1",
            "2024-01-15",
            "2024-03-14",
            dec!(6000),
            InvoiceStatus::Paid,
        )];
        let out = reconcile(&segments, &invoices, &[], &[], true, dec!(1.00), now());
        assert!(out.exclusions.is_empty());
        let by_segment = |id: &str| -> Decimal {
            out.allocations
                .iter()
                .filter(|a| a.segment_id.0 == id)
                .map(|a| a.allocated_amount)
                .sum()
        };
        assert_eq!(by_segment("seg-jan"), dec!(1700.00));
        assert_eq!(by_segment("seg-feb"), dec!(2900.00));
        assert_eq!(by_segment("seg-mar"), dec!(1400.00));
    }

    #[test]
    fn s4_missing_invoice_has_no_allocation() {
        let segments = vec![segment("seg-jan", "2024-01-01", "2024-01-31", dec!(1000))];
        let out = reconcile(&segments, &[], &[], &[], true, dec!(1.00), now());
        assert_eq!(out.variances[0].status, VarianceStatus::MissingInvoice);
    }

    #[test]
    fn s5_standalone_credit_note_under_bills_the_segment() {
        let segments = vec![segment("seg-jan", "2024-01-01", "2024-01-31", dec!(1000))];
        let invoices = vec![invoice("inv1", "2024-01-01", "2024-01-31", dec!(1000), InvoiceStatus::Paid)];
        let payments = vec![Payment {
            payment_id: "pay1".to_string(),
            invoice_id: "inv1".to_string(),
            payment_date: d("2024-01-20"),
            amount: dec!(1000),
        }];
        let credit_notes = vec![CreditNote {
            credit_note_id: "cn1".to_string(),
            customer_id: "c1".to_string(),
            invoice_id: None,
            credit_date: d("2024-01-25"),
            amount: dec!(200),
            reason: "goodwill".to_string(),
        }];
        let out = reconcile(&segments, &invoices, &payments, &credit_notes, true, dec!(1.00), now());
        let v = &out.variances[0];
        assert_eq!(v.effective_invoiced, dec!(800));
        assert_eq!(v.variance, dec!(-200));
        assert_eq!(v.status, VarianceStatus::UnderBilled);
    }

    #[test]
    fn s6_unmatched_account_is_unknown_regardless_of_variance() {
        let segments = vec![segment("seg-jan", "2024-01-01", "2024-01-31", dec!(5000))];
        let out = reconcile(&segments, &[], &[], &[], false, dec!(1.00), now());
        assert_eq!(out.variances[0].status, VarianceStatus::Unknown);
    }

    #[test]
    fn credit_note_exceeding_linked_invoice_is_over_billed() {
        let segments = vec![segment("seg-jan", "2024-01-01", "2024-01-31", dec!(1000))];
        let invoices = vec![invoice("inv1", "2024-01-01", "2024-01-31", dec!(1000), InvoiceStatus::Paid)];
        let credit_notes = vec![CreditNote {
            credit_note_id: "cn1".to_string(),
            customer_id: "c1".to_string(),
            invoice_id: Some("inv1".to_string()),
            credit_date: d("2024-01-25"),
            amount: dec!(1500),
            reason: "dispute".to_string(),
        }];
        let out = reconcile(&segments, &invoices, &[], &credit_notes, true, dec!(1.00), now());
        let v = &out.variances[0];
        assert_eq!(v.effective_invoiced, dec!(-500));
        assert_eq!(v.status, VarianceStatus::OverBilled);
    }

    #[test]
    fn void_invoice_is_excluded_and_its_payment_is_ignored() {
        let segments = vec![segment("seg-jan", "2024-01-01", "2024-01-31", dec!(1000))];
        let invoices = vec![invoice("inv1", "2024-01-01", "2024-01-31", dec!(1000), InvoiceStatus::Void)];
        let payments = vec![Payment {
            payment_id: "pay1".to_string(),
            invoice_id: "inv1".to_string(),
            payment_date: d("2024-01-20"),
            amount: dec!(1000),
        }];
        let out = reconcile(&segments, &invoices, &payments, &[], true, dec!(1.00), now());
        assert_eq!(out.exclusions.len(), 1);
        assert_eq!(out.exclusions[0].reason_code, ReasonCode::UnsupportedStructure);
        assert_eq!(out.variances[0].collected, Decimal::ZERO);
        assert_eq!(out.variances[0].invoiced, Decimal::ZERO);
    }
}
