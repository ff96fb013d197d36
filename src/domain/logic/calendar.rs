//! Calendar-month slicing helpers for the Lifecycle Builder.

use chrono::{Datelike, Duration, NaiveDate};
use fractic_server_error::{CriticalError, ServerError};

pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("copying a NaiveDate with overridden day=1 should never fail")
}

pub(crate) fn next_month_start(date: NaiveDate) -> Result<NaiveDate, ServerError> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CriticalError::with_debug(
            "next-month-start calculation unexpectedly resulted in invalid date",
            &format!("year: {year}, month: {month}"),
        )
    })
}

pub(crate) fn month_end(date: NaiveDate) -> Result<NaiveDate, ServerError> {
    Ok(next_month_start(date)? - Duration::days(1))
}

/// `YYYY-MM` label for the month containing `date`.
pub(crate) fn period_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `(month_start, month_end)` pairs covering every calendar month that
/// intersects `[start, end]`, in ascending order.
pub(crate) fn month_bounds(start: NaiveDate, end: NaiveDate) -> Result<Vec<(NaiveDate, NaiveDate)>, ServerError> {
    let mut months = Vec::new();
    let mut cursor = month_start(start);
    while cursor <= end {
        let last_day = month_end(cursor)?;
        months.push((cursor, last_day));
        cursor = next_month_start(cursor)?;
    }
    Ok(months)
}

/// Inclusive day count in `[start, end]`; 0 if the interval is empty.
pub(crate) fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_bounds_spans_partial_months() {
        let months = month_bounds(d("2024-02-10"), d("2024-04-05")).unwrap();
        assert_eq!(
            months,
            vec![
                (d("2024-02-01"), d("2024-02-29")),
                (d("2024-03-01"), d("2024-03-31")),
                (d("2024-04-01"), d("2024-04-30")),
            ]
        );
    }

    #[test]
    fn inclusive_days_single_day() {
        assert_eq!(inclusive_days(d("2024-01-01"), d("2024-01-01")), 1);
    }
}
