//! Scoring: coverage panel, the four weighted components, the structural
//! integrity score/band, revenue-at-risk, and quick findings.

use std::collections::{HashMap, HashSet};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::entities::{
    Allocation, AllocationMethod, AllocationSource, ComponentScores, Coverage, IdentitySpine,
    QuickFinding, RevenueAtRiskEntry, RevenueSegment, RsxId, ScoreBand, ScoreReport, SegmentId,
    SegmentVariance, VarianceStatus,
};

use super::reconciliation::primary_variance_type;

const QUICK_FINDINGS_TOP_N: usize = 5;

/// Per-account rollup used for revenue-at-risk and quick findings. `Clean`
/// accounts carry a zero `total_variance` and are excluded from both panels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AccountVarianceSummary {
    pub rsx_id: RsxId,
    pub account_name: String,
    pub primary_status: VarianceStatus,
    pub total_variance: Decimal,
}

pub(crate) fn summarize_account(
    rsx_id: RsxId,
    account_name: String,
    variances: &[SegmentVariance],
) -> AccountVarianceSummary {
    match primary_variance_type(variances) {
        Some((status, total)) => AccountVarianceSummary {
            rsx_id,
            account_name,
            primary_status: status,
            total_variance: total,
        },
        None => AccountVarianceSummary {
            rsx_id,
            account_name,
            primary_status: VarianceStatus::Clean,
            total_variance: Decimal::ZERO,
        },
    }
}

pub(crate) struct ScoringInput<'a> {
    pub total_accounts: usize,
    pub total_subscriptions: usize,
    pub spine: &'a IdentitySpine,
    pub segments: &'a [RevenueSegment],
    pub allocations: &'a [Allocation],
    pub variances: &'a [SegmentVariance],
    pub account_summaries: &'a [AccountVarianceSummary],
}

pub(crate) fn score(input: ScoringInput<'_>) -> ScoreReport {
    let matched_rsx: HashSet<&RsxId> = input.spine.auto_matched.iter().map(|l| &l.rsx_id).collect();

    let matched_subscription_ids: HashSet<&str> = input
        .segments
        .iter()
        .filter(|s| matched_rsx.contains(&s.rsx_id))
        .map(|s| s.subscription_id.as_str())
        .collect();

    let subscription_pct = percentage(matched_subscription_ids.len(), input.total_subscriptions);

    let total_expected: Decimal = input.segments.iter().map(|s| s.expected_amount).sum();
    let matched_expected: Decimal = input
        .segments
        .iter()
        .filter(|s| matched_rsx.contains(&s.rsx_id))
        .map(|s| s.expected_amount)
        .sum();
    let arr_pct = decimal_percentage(matched_expected, total_expected);

    let coverage = Coverage {
        subscription_pct,
        arr_pct,
    };

    let entity_match_rate = percentage(input.spine.auto_matched.len(), input.total_accounts);

    let invoice_method_by_segment: HashMap<&SegmentId, AllocationMethod> =
        input.allocations.iter().filter(|a| matches!(a.source, AllocationSource::Invoice(_))).map(|a| (&a.segment_id, a.method)).collect();

    let matched_invoiced: Decimal = input
        .allocations
        .iter()
        .filter(|a| matches!(a.source, AllocationSource::Invoice(_)))
        .filter(|a| {
            input
                .segments
                .iter()
                .find(|s| s.segment_id == a.segment_id)
                .map(|s| matched_rsx.contains(&s.rsx_id))
                .unwrap_or(false)
        })
        .map(|a| a.allocated_amount)
        .sum();
    let billing_coverage = decimal_percentage(matched_invoiced, total_expected).clamp(0.0, 100.0);

    let clean_count = input.variances.iter().filter(|v| v.status.is_clean()).count();
    let variance_cleanliness = percentage(clean_count, input.variances.len());

    let lineage_count = input
        .segments
        .iter()
        .filter(|s| {
            matches!(
                invoice_method_by_segment.get(&s.segment_id),
                Some(AllocationMethod::Exact) | Some(AllocationMethod::Proportional)
            )
        })
        .count();
    let lineage_completeness = percentage(lineage_count, input.segments.len());

    let components = ComponentScores {
        entity_match_rate,
        billing_coverage,
        variance_cleanliness,
        lineage_completeness,
    };
    let score_value = components.weighted_score();
    let band = ScoreBand::from_score(score_value);

    let revenue_at_risk = revenue_at_risk_panel(input.account_summaries);
    let quick_findings = quick_findings_panel(input.account_summaries);

    ScoreReport {
        coverage,
        components,
        score: score_value,
        band,
        revenue_at_risk,
        quick_findings,
    }
}

fn revenue_at_risk_panel(summaries: &[AccountVarianceSummary]) -> Vec<RevenueAtRiskEntry> {
    let mut totals: HashMap<VarianceStatus, (Decimal, usize)> = HashMap::new();
    for s in summaries {
        if s.primary_status.is_clean() {
            continue;
        }
        let entry = totals.entry(s.primary_status).or_insert((Decimal::ZERO, 0));
        entry.0 += s.total_variance;
        entry.1 += 1;
    }
    let mut entries: Vec<RevenueAtRiskEntry> = totals
        .into_iter()
        .map(|(status, (total, account_count))| RevenueAtRiskEntry {
            status,
            total,
            account_count,
        })
        .collect();
    entries.sort_by(|a, b| b.status.cmp(&a.status));
    entries
}

fn quick_findings_panel(summaries: &[AccountVarianceSummary]) -> Vec<QuickFinding> {
    let mut findings: Vec<QuickFinding> = summaries
        .iter()
        .filter(|s| !s.primary_status.is_clean())
        .map(|s| QuickFinding {
            rsx_id: s.rsx_id.clone(),
            account_name: s.account_name.clone(),
            total_variance: s.total_variance,
            primary_variance_type: s.primary_status,
        })
        .collect();
    findings.sort_by(|a, b| {
        b.total_variance
            .abs()
            .cmp(&a.total_variance.abs())
            .then(a.rsx_id.cmp(&b.rsx_id))
    });
    findings.truncate(QUICK_FINDINGS_TOP_N);
    findings
}

fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

fn decimal_percentage(numerator: Decimal, denominator: Decimal) -> f64 {
    if denominator == Decimal::ZERO {
        0.0
    } else {
        (numerator / denominator * Decimal::from(100)).to_f64().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{IdentityLink, MatchType, SegmentId};
    use rust_decimal_macros::dec;

    fn matched_link(rsx: usize, account_id: &str) -> IdentityLink {
        IdentityLink {
            rsx_id: RsxId::from_sequence(rsx),
            account_id: account_id.to_string(),
            customer_id: Some("c1".to_string()),
            match_type: MatchType::Exact,
            confidence: 1.0,
            evidence: "exact name match".to_string(),
        }
    }

    fn segment(rsx: usize, sub: &str, expected: Decimal) -> RevenueSegment {
        RevenueSegment {
            segment_id: SegmentId(format!("{sub}:2024-01")),
            rsx_id: RsxId::from_sequence(rsx),
            subscription_id: sub.to_string(),
            period: "2024-01".to_string(),
            segment_start: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            segment_end: chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            days_active: 31,
            total_days: 31,
            mrr_effective: expected,
            expected_amount: expected,
            is_prorated: false,
        }
    }

    fn clean_variance(rsx: usize, sub: &str, amount: Decimal) -> SegmentVariance {
        SegmentVariance {
            segment_id: SegmentId(format!("{sub}:2024-01")),
            rsx_id: RsxId::from_sequence(rsx),
            subscription_id: sub.to_string(),
            expected: amount,
            invoiced: amount,
            credit_notes: Decimal::ZERO,
            effective_invoiced: amount,
            collected: amount,
            variance: Decimal::ZERO,
            status: VarianceStatus::Clean,
        }
    }

    #[test]
    fn s1_all_clean_scores_at_least_95() {
        let spine = IdentitySpine {
            auto_matched: vec![matched_link(1, "a1")],
            needs_review: vec![],
            unmatched: vec![],
            unmatched_customers: vec![],
        };
        let segments = vec![segment(1, "sub1", dec!(1000))];
        let allocation = Allocation {
            source: AllocationSource::Invoice("inv1".to_string()),
            segment_id: SegmentId("sub1:2024-01".to_string()),
            allocated_amount: dec!(1000),
            method: AllocationMethod::Exact,
        };
        let variances = vec![clean_variance(1, "sub1", dec!(1000))];
        let summaries = vec![summarize_account(RsxId::from_sequence(1), "Acme".to_string(), &variances)];

        let report = score(ScoringInput {
            total_accounts: 1,
            total_subscriptions: 1,
            spine: &spine,
            segments: &segments,
            allocations: std::slice::from_ref(&allocation),
            variances: &variances,
            account_summaries: &summaries,
        });

        assert!(report.score >= 95, "expected score >= 95, got {}", report.score);
        assert_eq!(report.band, ScoreBand::Green);
        assert!(report.quick_findings.is_empty());
        assert!(report.revenue_at_risk.is_empty());
    }

    #[test]
    fn quick_findings_are_capped_and_sorted_by_magnitude() {
        let variances: Vec<SegmentVariance> = (1..=7)
            .map(|n| SegmentVariance {
                segment_id: SegmentId(format!("sub{n}:2024-01")),
                rsx_id: RsxId::from_sequence(n),
                subscription_id: format!("sub{n}"),
                expected: dec!(1000),
                invoiced: dec!(0),
                credit_notes: Decimal::ZERO,
                effective_invoiced: dec!(0),
                collected: dec!(0),
                variance: Decimal::from(-(n as i64 * 100)),
                status: VarianceStatus::MissingInvoice,
            })
            .collect();
        let summaries: Vec<AccountVarianceSummary> = variances
            .iter()
            .map(|v| summarize_account(v.rsx_id.clone(), format!("account-{}", v.rsx_id), std::slice::from_ref(v)))
            .collect();

        let findings = quick_findings_panel(&summaries);
        assert_eq!(findings.len(), QUICK_FINDINGS_TOP_N);
        assert_eq!(findings[0].account_name, "account-rsx_000007");
    }
}
