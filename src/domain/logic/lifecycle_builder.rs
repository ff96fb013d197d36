//! Lifecycle Builder: expands subscriptions into calendar-aligned monthly
//! revenue segments within the reporting period.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::entities::{Exclusion, ReasonCode, RecordType, RevenueSegment, RsxId, Subscription};

use super::calendar::{inclusive_days, month_bounds, period_label};
use super::money::round_half_even_2dp;

pub(crate) struct LifecycleBuilderOutput {
    pub segments: Vec<RevenueSegment>,
    pub exclusions: Vec<Exclusion>,
}

/// Builds every revenue segment for `subscription` within
/// `[period_start, period_end]`. Negative mrr or `end < start` excludes the
/// whole subscription with `UNSUPPORTED_STRUCTURE`; zero-day intersection is
/// silently skipped (not an error).
pub(crate) fn build_segments_for_subscription(
    subscription: &Subscription,
    rsx_id: &RsxId,
    period_start: NaiveDate,
    period_end: NaiveDate,
    excluded_at: chrono::NaiveDateTime,
) -> Result<Vec<RevenueSegment>, Exclusion> {
    if subscription.mrr < Decimal::ZERO || subscription.ramp_schedule.iter().any(|s| s.mrr < Decimal::ZERO)
    {
        return Err(structure_exclusion(
            subscription,
            "negative mrr is not a supported subscription structure",
            excluded_at,
        ));
    }
    if subscription.end_date < subscription.start_date {
        return Err(structure_exclusion(
            subscription,
            &format!(
                "end date {} precedes start date {}",
                subscription.end_date, subscription.start_date
            ),
            excluded_at,
        ));
    }

    let clamped_start = subscription.start_date.max(period_start);
    let clamped_end = subscription.end_date.min(period_end);
    if clamped_start > clamped_end {
        return Ok(Vec::new());
    }

    let months = month_bounds(clamped_start, clamped_end).map_err(|_| {
        structure_exclusion(subscription, "calendar computation failed", excluded_at)
    })?;

    let mut segments = Vec::new();
    for (month_first, month_last) in months {
        let segment_start = clamped_start.max(month_first);
        let segment_end = clamped_end.min(month_last);
        if segment_start > segment_end {
            continue;
        }
        let total_days = inclusive_days(month_first, month_last);
        let splits = subscription.ramp_splits_within(segment_start, segment_end);
        segments.extend(build_month_segments(
            subscription,
            rsx_id,
            segment_start,
            segment_end,
            total_days,
            &splits,
        ));
    }

    Ok(segments)
}

/// Splits a single month-segment at every ramp-schedule change date that
/// falls inside it, per Open Question (b): the segment is split first, then
/// allocation proceeds against the split — this preserves conservation.
fn build_month_segments(
    subscription: &Subscription,
    rsx_id: &RsxId,
    segment_start: NaiveDate,
    segment_end: NaiveDate,
    total_days: i64,
    splits: &[NaiveDate],
) -> Vec<RevenueSegment> {
    // `splits` are the dates on which the new ramp rate takes effect, i.e.
    // the first day of the next sub-segment. Boundaries are therefore the
    // sub-segment *start* dates; each sub-segment's end is one day before
    // the next boundary (or `segment_end` for the last one).
    let mut starts = vec![segment_start];
    starts.extend(splits.iter().copied());
    starts.sort();
    starts.dedup();

    let period = period_label(segment_start);
    let mut out = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = match starts.get(i + 1) {
            Some(&next_start) => next_start.pred_opt().unwrap_or(next_start),
            None => segment_end,
        };
        if start > end {
            continue;
        }
        let days_active = inclusive_days(start, end);
        let mrr_effective = subscription.mrr_effective_on(start);
        let expected_amount = round_half_even_2dp(mrr_effective * Decimal::from(days_active) / Decimal::from(total_days));
        out.push(RevenueSegment {
            segment_id: crate::domain::entities::SegmentId(format!(
                "{}:{}:{}",
                subscription.subscription_id, period, start
            )),
            rsx_id: rsx_id.clone(),
            subscription_id: subscription.subscription_id.clone(),
            period: period.clone(),
            segment_start: start,
            segment_end: end,
            days_active,
            total_days,
            mrr_effective,
            expected_amount,
            is_prorated: days_active < total_days,
        });
    }
    out
}

fn structure_exclusion(
    subscription: &Subscription,
    description: &str,
    excluded_at: chrono::NaiveDateTime,
) -> Exclusion {
    Exclusion {
        record_type: RecordType::Subscription,
        record_id: subscription.subscription_id.clone(),
        reason_code: ReasonCode::UnsupportedStructure,
        description: description.to_string(),
        excluded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn base_subscription(start: &str, end: &str, mrr: Decimal) -> Subscription {
        Subscription {
            subscription_id: "sub1".to_string(),
            account_id: "a1".to_string(),
            start_date: d(start),
            end_date: d(end),
            mrr,
            ramp_schedule: vec![],
        }
    }

    fn now() -> chrono::NaiveDateTime {
        d("2024-01-01").and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn s1_clean_full_year_produces_twelve_segments() {
        let sub = base_subscription("2024-01-01", "2024-12-31", dec!(1000));
        let rsx = RsxId::from_sequence(1);
        let segments =
            build_segments_for_subscription(&sub, &rsx, d("2024-01-01"), d("2024-12-31"), now()).unwrap();
        assert_eq!(segments.len(), 12);
        for seg in &segments {
            assert_eq!(seg.expected_amount, dec!(1000.00));
            assert!(!seg.is_prorated);
        }
    }

    #[test]
    fn s2_proration_feb_and_nov() {
        let sub = base_subscription("2024-02-10", "2024-11-20", dec!(3000));
        let rsx = RsxId::from_sequence(1);
        let segments =
            build_segments_for_subscription(&sub, &rsx, d("2024-01-01"), d("2024-12-31"), now()).unwrap();
        let feb = segments.iter().find(|s| s.period == "2024-02").unwrap();
        assert_eq!(feb.days_active, 20);
        assert_eq!(feb.total_days, 29);
        assert_eq!(feb.expected_amount, round_half_even_2dp(dec!(3000) * dec!(20) / dec!(29)));

        let nov = segments.iter().find(|s| s.period == "2024-11").unwrap();
        assert_eq!(nov.days_active, 20);
        assert_eq!(nov.total_days, 30);
        assert_eq!(nov.expected_amount, dec!(2000.00));
    }

    #[test]
    fn negative_mrr_is_excluded_not_errored() {
        let sub = base_subscription("2024-01-01", "2024-12-31", dec!(-5));
        let rsx = RsxId::from_sequence(1);
        let result = build_segments_for_subscription(&sub, &rsx, d("2024-01-01"), d("2024-12-31"), now());
        assert!(result.is_err());
    }

    #[test]
    fn zero_day_intersection_is_silently_skipped() {
        let sub = base_subscription("2023-01-01", "2023-12-31", dec!(1000));
        let rsx = RsxId::from_sequence(1);
        let segments =
            build_segments_for_subscription(&sub, &rsx, d("2024-01-01"), d("2024-12-31"), now()).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn ramp_change_splits_the_segment() {
        let mut sub = base_subscription("2024-03-01", "2024-03-31", dec!(1000));
        sub.ramp_schedule = vec![crate::domain::entities::RampStep {
            effective_date: d("2024-03-16"),
            mrr: dec!(2000),
        }];
        let rsx = RsxId::from_sequence(1);
        let segments =
            build_segments_for_subscription(&sub, &rsx, d("2024-01-01"), d("2024-12-31"), now()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].days_active, 15);
        assert_eq!(segments[0].mrr_effective, dec!(1000));
        assert_eq!(segments[1].days_active, 16);
        assert_eq!(segments[1].mrr_effective, dec!(2000));
        let total_days: i64 = segments.iter().map(|s| s.days_active).sum();
        assert_eq!(total_days, 31);
    }
}
