//! CSV export for `accounts`, per-account `lineage`, and `exclusions`.
//! PDF rendering of the score report is a separate, external concern —
//! out of scope here. Built on the `csv` crate the ingestion datasources
//! already use, mirrored for writing instead of reading.

use fractic_server_error::ServerError;

use crate::domain::entities::{AccountRow, Exclusion, LineageEntry};
use crate::errors::InvalidCsv;

fn write_rows(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Result<String, ServerError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).map_err(|e| InvalidCsv::with_debug(&e))?;
    for row in rows {
        writer.write_record(&row).map_err(|e| InvalidCsv::with_debug(&e))?;
    }
    let bytes = writer.into_inner().map_err(|e| InvalidCsv::with_debug(&e))?;
    String::from_utf8(bytes).map_err(|e| InvalidCsv::with_debug(&e))
}

pub(crate) fn accounts_csv(rows: &[AccountRow]) -> Result<String, ServerError> {
    write_rows(
        &[
            "rsx_id",
            "account_name",
            "customer_name",
            "primary_variance_type",
            "total_expected",
            "total_variance",
            "segment_count",
        ],
        rows.iter().map(|r| {
            vec![
                r.rsx_id.to_string(),
                r.account_name.clone(),
                r.customer_name.clone().unwrap_or_default(),
                format!("{:?}", r.primary_variance_type),
                r.total_expected.to_string(),
                r.total_variance.to_string(),
                r.segment_count.to_string(),
            ]
        }),
    )
}

pub(crate) fn lineage_csv(entries: &[LineageEntry]) -> Result<String, ServerError> {
    write_rows(
        &[
            "segment_id",
            "period",
            "expected",
            "effective_invoiced",
            "variance",
            "status",
            "source_kind",
            "source_id",
            "allocated_amount",
            "method",
        ],
        entries.iter().flat_map(|entry| {
            if entry.allocations.is_empty() {
                vec![vec![
                    entry.segment_id.clone(),
                    entry.period.clone(),
                    entry.expected.to_string(),
                    entry.effective_invoiced.to_string(),
                    entry.variance.to_string(),
                    format!("{:?}", entry.status),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]]
            } else {
                entry
                    .allocations
                    .iter()
                    .map(|alloc| {
                        vec![
                            entry.segment_id.clone(),
                            entry.period.clone(),
                            entry.expected.to_string(),
                            entry.effective_invoiced.to_string(),
                            entry.variance.to_string(),
                            format!("{:?}", entry.status),
                            alloc.source_kind.to_string(),
                            alloc.source_id.clone(),
                            alloc.allocated_amount.to_string(),
                            format!("{:?}", alloc.method),
                        ]
                    })
                    .collect()
            }
        }),
    )
}

pub(crate) fn exclusions_csv(log: &[&Exclusion]) -> Result<String, ServerError> {
    write_rows(
        &["record_type", "record_id", "reason_code", "description", "excluded_at"],
        log.iter().map(|e| {
            vec![
                format!("{:?}", e.record_type),
                e.record_id.clone(),
                format!("{:?}", e.reason_code),
                e.description.clone(),
                e.excluded_at.to_string(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{RsxId, VarianceStatus};
    use rust_decimal_macros::dec;

    #[test]
    fn accounts_csv_has_header_and_one_row_per_account() {
        let rows = vec![AccountRow {
            rsx_id: RsxId::from_sequence(1),
            account_name: "Acme".to_string(),
            customer_name: Some("Acme Corp".to_string()),
            primary_variance_type: VarianceStatus::UnderBilled,
            total_expected: dec!(1000),
            total_variance: dec!(-50),
            segment_count: 1,
        }];
        let csv_text = accounts_csv(&rows).unwrap();
        let mut lines = csv_text.lines();
        assert!(lines.next().unwrap().starts_with("rsx_id,"));
        assert!(lines.next().unwrap().contains("Acme"));
    }
}
