//! `validate`: parses the six CSV tables, checks cross-row integrity
//! (duplicate primary keys, dangling foreign keys), and previews identity
//! resolution so the session layer can show a summary before the operator
//! commits to `analyze`.
//!
//! Validation errors surface here, not during analysis; this crate resolves
//! that by failing fast on the first violation rather than accumulating a
//! list, matching how the rest of the stack propagates `ServerError` — see
//! DESIGN.md.

use std::collections::HashMap;
use std::sync::Arc;

use fractic_server_error::ServerError;

use crate::domain::entities::{IdentitySummary, InputTables, ValidationReport};
use crate::domain::logic::identity_resolver;
use crate::domain::repositories::records_repository::{RawCsvInputs, RecordsRepository};
use crate::errors::{DuplicatePrimaryKey, InvalidInvoicePeriod, UnknownForeignKey};

pub(crate) struct ValidateUsecase<R: RecordsRepository> {
    repo: Arc<R>,
}

impl<R: RecordsRepository> ValidateUsecase<R> {
    pub(crate) fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub(crate) fn validate(
        &self,
        inputs: RawCsvInputs<'_>,
    ) -> Result<(InputTables, ValidationReport), ServerError> {
        let tables = self.repo.from_strings(inputs)?;
        check_duplicates(&tables.accounts, "Account", |a| a.account_id.as_str())?;
        check_duplicates(&tables.customers, "Customer", |c| c.customer_id.as_str())?;
        check_duplicates(&tables.subscriptions, "Subscription", |s| s.subscription_id.as_str())?;
        check_duplicates(&tables.invoices, "Invoice", |i| i.invoice_id.as_str())?;
        check_duplicates(&tables.payments, "Payment", |p| p.payment_id.as_str())?;
        check_duplicates(&tables.credit_notes, "CreditNote", |c| c.credit_note_id.as_str())?;
        check_foreign_keys(&tables)?;
        check_invoice_periods(&tables)?;

        let spine = identity_resolver::resolve(&tables.accounts, &tables.customers, &[]);
        let identity_summary = IdentitySummary {
            auto_matched: spine.auto_matched.len(),
            needs_review: spine.needs_review.len(),
            unmatched: spine.unmatched.len(),
        };

        Ok((
            tables,
            ValidationReport {
                valid: true,
                errors: Vec::new(),
                warnings: Vec::new(),
                identity_summary,
            },
        ))
    }
}

fn check_duplicates<T>(items: &[T], entity: &str, id_of: impl Fn(&T) -> &str) -> Result<(), ServerError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        let id = id_of(item);
        let row = i + 2;
        if let Some(&first_row) = seen.get(id) {
            return Err(DuplicatePrimaryKey::new(entity, id, first_row, row));
        }
        seen.insert(id, row);
    }
    Ok(())
}

/// Open Question (a): both endpoints are inclusive; a row with
/// `period_end < period_start` is refused at validation rather than silently
/// treated as empty.
fn check_invoice_periods(tables: &InputTables) -> Result<(), ServerError> {
    for inv in &tables.invoices {
        if inv.period_end < inv.period_start {
            return Err(InvalidInvoicePeriod::new(
                inv.invoice_id.as_str(),
                &inv.period_start,
                &inv.period_end,
            ));
        }
    }
    Ok(())
}

fn check_foreign_keys(tables: &InputTables) -> Result<(), ServerError> {
    let account_ids: std::collections::HashSet<&str> =
        tables.accounts.iter().map(|a| a.account_id.as_str()).collect();
    let customer_ids: std::collections::HashSet<&str> =
        tables.customers.iter().map(|c| c.customer_id.as_str()).collect();
    let subscription_ids: std::collections::HashSet<&str> =
        tables.subscriptions.iter().map(|s| s.subscription_id.as_str()).collect();
    let invoice_ids: std::collections::HashSet<&str> =
        tables.invoices.iter().map(|i| i.invoice_id.as_str()).collect();

    for (row, sub) in tables.subscriptions.iter().enumerate() {
        if !account_ids.contains(sub.account_id.as_str()) {
            return Err(UnknownForeignKey::new("Subscription", row + 2, "Account", sub.account_id.as_str()));
        }
    }
    for (row, inv) in tables.invoices.iter().enumerate() {
        if !customer_ids.contains(inv.customer_id.as_str()) {
            return Err(UnknownForeignKey::new("Invoice", row + 2, "Customer", inv.customer_id.as_str()));
        }
        if let Some(hint) = &inv.subscription_id_hint {
            if !subscription_ids.contains(hint.as_str()) {
                return Err(UnknownForeignKey::new("Invoice", row + 2, "Subscription", hint.as_str()));
            }
        }
    }
    for (row, p) in tables.payments.iter().enumerate() {
        if !invoice_ids.contains(p.invoice_id.as_str()) {
            return Err(UnknownForeignKey::new("Payment", row + 2, "Invoice", p.invoice_id.as_str()));
        }
    }
    for (row, cn) in tables.credit_notes.iter().enumerate() {
        if !customer_ids.contains(cn.customer_id.as_str()) {
            return Err(UnknownForeignKey::new("CreditNote", row + 2, "Customer", cn.customer_id.as_str()));
        }
        if let Some(inv_id) = &cn.invoice_id {
            if !invoice_ids.contains(inv_id.as_str()) {
                return Err(UnknownForeignKey::new("CreditNote", row + 2, "Invoice", inv_id.as_str()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repositories::records_repository_impl::RecordsRepositoryImpl;
    use std::sync::Arc;

    fn usecase() -> ValidateUsecase<RecordsRepositoryImpl> {
        ValidateUsecase::new(Arc::new(RecordsRepositoryImpl::new()))
    }

    fn base_inputs<'a>(invoices_csv: &'a str) -> RawCsvInputs<'a> {
        RawCsvInputs {
            accounts_csv: "account_id,account_name,email_domain\na1,Acme,\n",
            customers_csv: "customer_id,customer_name,email_domain\nc1,Acme,\n",
            subscriptions_csv: "subscription_id,account_id,start_date,end_date,mrr,ramp_schedule\n",
            invoices_csv,
            payments_csv: "payment_id,invoice_id,payment_date,amount\n",
            credit_notes_csv: "credit_note_id,customer_id,invoice_id,credit_date,amount,reason\n",
        }
    }

    #[test]
    fn invoice_period_end_before_start_is_rejected() {
        let invoices_csv = "invoice_id,customer_id,subscription_id,invoice_date,period_start,period_end,amount,status\ninv1,c1,,2024-01-01,2024-02-01,2024-01-01,100.00,paid\n";
        let result = usecase().validate(base_inputs(invoices_csv));
        assert!(result.is_err());
    }

    #[test]
    fn well_formed_invoice_period_is_accepted() {
        let invoices_csv = "invoice_id,customer_id,subscription_id,invoice_date,period_start,period_end,amount,status\ninv1,c1,,2024-01-01,2024-01-01,2024-01-31,100.00,paid\n";
        let result = usecase().validate(base_inputs(invoices_csv));
        assert!(result.is_ok());
    }

    #[test]
    fn duplicate_account_id_is_rejected() {
        let inputs = RawCsvInputs {
            accounts_csv: "account_id,account_name,email_domain\na1,Acme,\na1,Acme Two,\n",
            ..base_inputs("invoice_id,customer_id,subscription_id,invoice_date,period_start,period_end,amount,status\n")
        };
        assert!(usecase().validate(inputs).is_err());
    }
}
