//! Public facade: the operations the session layer drives. Everything here
//! is a thin orchestration layer — parsing, matching, proration,
//! allocation, and scoring all happen in `domain::logic`; this module only
//! owns the per-session store and sequences calls into it. One struct the
//! caller constructs once, whose methods are the entire public surface of
//! the crate.

use std::sync::Arc;

use fractic_server_error::ServerError;
use serde_json::Value;

use crate::data::repositories::records_repository_impl::RecordsRepositoryImpl;
use crate::data::store::session_store::{SessionRecord, SessionStore};
use crate::domain::entities::{
    AccountFilters, AccountRow, Decision, Exclusion, IdentitySpine, LineageEntry, MatchId,
    ProcessingStatus, ReasonCode, RsxId, ScoreReport, Session, SessionSettings, SessionStatus,
    UndoOutcome, ValidationReport,
};
use crate::domain::repositories::records_repository::RawCsvInputs;
use crate::domain::usecases::{
    analyze_usecase, export_usecase, identity_usecase, query_usecase, validate_usecase,
};
use crate::errors::SessionNotReady;

/// Owns every session's derived-artifact store. Cheap to clone (an `Arc`
/// underneath); the intended usage is one instance shared across however
/// many sessions the caller runs concurrently — each session's pipeline is
/// still serialized end-to-end.
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<SessionStore>,
    repo: Arc<RecordsRepositoryImpl>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            repo: Arc::new(RecordsRepositoryImpl::new()),
        }
    }

    /// Creates a fresh session in `created` status with the given settings.
    pub async fn create_session(&self, session_id: impl Into<String>, settings: &Value) -> Result<(), ServerError> {
        let settings = SessionSettings::from_value(settings)?;
        let session = Session::new(session_id.into(), settings);
        self.store.insert(SessionRecord::new(session)).await;
        Ok(())
    }

    /// `validate(inputs)`: parses and cross-checks the six CSV tables,
    /// stages them in the session, and previews identity resolution. On
    /// success the session moves to `identity_review`.
    pub async fn validate(&self, session_id: &str, inputs: RawCsvInputs<'_>) -> Result<ValidationReport, ServerError> {
        let usecase = validate_usecase::ValidateUsecase::new(self.repo.clone());
        let (tables, report) = usecase.validate(inputs)?;
        self.store
            .write(session_id, |record| {
                record.tables = Some(tables);
                record.session.status = SessionStatus::IdentityReview;
            })
            .await?;
        Ok(report)
    }

    /// `identity_get()`: the current spine under the session's decision log.
    pub async fn identity_get(&self, session_id: &str) -> Result<IdentitySpine, ServerError> {
        self.store
            .read(session_id, |record| {
                let tables = record
                    .tables
                    .as_ref()
                    .ok_or_else(|| SessionNotReady::new(session_id, &record.session.status.to_string()))?;
                Ok::<_, ServerError>(identity_usecase::get(
                    &tables.accounts,
                    &tables.customers,
                    &record.session.decision_log,
                ))
            })
            .await?
    }

    /// `identity_decide(match_id, decision)`.
    pub async fn identity_decide(
        &self,
        session_id: &str,
        match_id: MatchId,
        decision: Decision,
    ) -> Result<IdentitySpine, ServerError> {
        self.store
            .write(session_id, |record| {
                let tables = record
                    .tables
                    .clone()
                    .ok_or_else(|| SessionNotReady::new(session_id, &record.session.status.to_string()))?;
                identity_usecase::decide(
                    &tables.accounts,
                    &tables.customers,
                    &mut record.session.decision_log,
                    match_id,
                    decision,
                )
            })
            .await?
    }

    /// `identity_undo()`: pops the most recent decision and replays. Never
    /// panics on an empty log — the returned `UndoOutcome` distinguishes
    /// "a decision was undone" from "there was nothing to undo" so the
    /// caller can surface that "no decisions" signal rather than treat both
    /// cases the same way.
    pub async fn identity_undo(&self, session_id: &str) -> Result<UndoOutcome, ServerError> {
        self.store
            .write(session_id, |record| {
                let tables = record
                    .tables
                    .clone()
                    .ok_or_else(|| SessionNotReady::new(session_id, &record.session.status.to_string()))?;
                Ok::<_, ServerError>(identity_usecase::undo(
                    &tables.accounts,
                    &tables.customers,
                    &mut record.session.decision_log,
                ))
            })
            .await?
    }

    /// `identity_reset()`: clears the decision log and truncates the
    /// session back to `identity_review`.
    pub async fn identity_reset(&self, session_id: &str) -> Result<(), ServerError> {
        self.store
            .write(session_id, |record| {
                identity_usecase::reset(&mut record.session.decision_log);
                record.session.status = SessionStatus::IdentityReview;
            })
            .await
    }

    /// `analyze()`: runs the pipeline synchronously to completion and
    /// persists every derived artifact. Modeled as the single logical
    /// worker's one unit of work per session — the caller is expected to
    /// run this inside whatever background-task mechanism its own runtime
    /// provides; this crate does not spawn on its own.
    pub async fn analyze(&self, session_id: &str) -> Result<(), ServerError> {
        let (tables, decision_log, settings, cancel) = self
            .store
            .read(session_id, |record| {
                let tables = record
                    .tables
                    .clone()
                    .ok_or_else(|| SessionNotReady::new(session_id, &record.session.status.to_string()))?;
                Ok::<_, ServerError>((
                    tables,
                    record.session.decision_log.clone(),
                    record.session.settings.clone(),
                    record.cancel.clone(),
                ))
            })
            .await??;

        // The identity-review gate is checked here, before the session is
        // marked `processing`, so a non-empty review queue is a no-state-change
        // refusal (IdentityDeadlock, spec §7) rather than a run that starts
        // and then fails into the `error` terminal state.
        let spine_preview = crate::domain::logic::identity_resolver::resolve(
            &tables.accounts,
            &tables.customers,
            &decision_log,
        );
        if !spine_preview.needs_review.is_empty() {
            return Err(crate::errors::IdentityReviewRequired::new(spine_preview.needs_review.len()));
        }

        self.store
            .write(session_id, |record| {
                record.session.status = SessionStatus::Processing;
                record.session.processing_status = ProcessingStatus::default();
            })
            .await?;

        let mut processing_status = ProcessingStatus::default();
        let result = analyze_usecase::analyze(
            session_id,
            &tables,
            &decision_log,
            &settings,
            &mut processing_status,
            &cancel,
        );

        match result {
            Ok(Some(output)) => {
                self.store
                    .write(session_id, |record| {
                        record.spine = Some(output.spine);
                        record.segments = output.segments;
                        record.allocations = output.allocations;
                        record.variances = output.variances;
                        record.exclusions = output.exclusions;
                        record.score = Some(output.score);
                        record.session.processing_status = processing_status;
                        record.session.status = SessionStatus::Completed;
                    })
                    .await?;
                Ok(())
            }
            Ok(None) => {
                // Cancelled at a stage boundary; leave the session in its
                // pre-run state.
                self.store
                    .write(session_id, |record| {
                        record.session.status = SessionStatus::IdentityReview;
                    })
                    .await?;
                Ok(())
            }
            Err(e) => {
                self.store
                    .write(session_id, |record| {
                        processing_status.error = Some(e.to_string());
                        record.session.processing_status = processing_status.clone();
                        record.session.status = SessionStatus::Error;
                    })
                    .await?;
                Err(e)
            }
        }
    }

    /// Sets the cooperative cancel flag; checked at the next stage boundary.
    pub async fn cancel(&self, session_id: &str) -> Result<(), ServerError> {
        let flag = self.store.cancel_flag(session_id).await?;
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    /// `status()`.
    pub async fn status(&self, session_id: &str) -> Result<(SessionStatus, ProcessingStatus), ServerError> {
        self.store
            .read(session_id, |record| {
                (record.session.status, record.session.processing_status.clone())
            })
            .await
    }

    /// `dashboard()`.
    pub async fn dashboard(&self, session_id: &str) -> Result<ScoreReport, ServerError> {
        self.store
            .read(session_id, |record| with_score(record, |score| query_usecase::dashboard(score)))
            .await?
    }

    /// `accounts(filters)`.
    pub async fn accounts(&self, session_id: &str, filters: AccountFilters) -> Result<Vec<AccountRow>, ServerError> {
        self.store
            .read(session_id, |record| {
                let tables = record
                    .tables
                    .as_ref()
                    .ok_or_else(|| SessionNotReady::new(session_id, &record.session.status.to_string()))?;
                let spine = record
                    .spine
                    .as_ref()
                    .ok_or_else(|| SessionNotReady::new(session_id, &record.session.status.to_string()))?;
                Ok::<_, ServerError>(query_usecase::accounts(
                    &tables.accounts,
                    &tables.customers,
                    spine,
                    &record.variances,
                    &filters,
                ))
            })
            .await?
    }

    /// `lineage(rsx_id)`.
    pub async fn lineage(&self, session_id: &str, rsx_id: &RsxId) -> Result<Vec<LineageEntry>, ServerError> {
        self.store
            .read(session_id, |record| {
                query_usecase::lineage(rsx_id, &record.segments, &record.variances, &record.allocations)
            })
            .await
    }

    /// `exclusions(reason_code?)`.
    pub async fn exclusions(
        &self,
        session_id: &str,
        reason_code: Option<ReasonCode>,
    ) -> Result<Vec<Exclusion>, ServerError> {
        self.store
            .read(session_id, |record| {
                query_usecase::exclusions(&record.exclusions, reason_code)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .await
    }

    /// CSV export of `accounts(filters)`.
    pub async fn export_accounts_csv(&self, session_id: &str, filters: AccountFilters) -> Result<String, ServerError> {
        let rows = self.accounts(session_id, filters).await?;
        export_usecase::accounts_csv(&rows)
    }

    /// CSV export of `lineage(rsx_id)`.
    pub async fn export_lineage_csv(&self, session_id: &str, rsx_id: &RsxId) -> Result<String, ServerError> {
        let entries = self.lineage(session_id, rsx_id).await?;
        export_usecase::lineage_csv(&entries)
    }

    /// CSV export of the exclusion log.
    pub async fn export_exclusions_csv(&self, session_id: &str) -> Result<String, ServerError> {
        let log = self
            .store
            .read(session_id, |record| record.exclusions.clone())
            .await?;
        let refs: Vec<&Exclusion> = log.iter().collect();
        export_usecase::exclusions_csv(&refs)
    }
}

fn with_score<T>(record: &SessionRecord, f: impl FnOnce(&ScoreReport) -> T) -> Result<T, ServerError> {
    let score = record
        .score
        .as_ref()
        .ok_or_else(|| SessionNotReady::new(&record.session.session_id, &record.session.status.to_string()))?;
    Ok(f(score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accounts_csv() -> &'static str {
        "account_id,account_name,email_domain\na1,Acme Inc,acme.com\n"
    }
    fn customers_csv() -> &'static str {
        "customer_id,customer_name,email_domain\nc1,Acme,acme.com\n"
    }
    fn subscriptions_csv() -> &'static str {
        "subscription_id,account_id,start_date,end_date,mrr,ramp_schedule\nsub1,a1,2024-01-01,2024-12-31,1000.00,\n"
    }
    fn invoices_csv() -> &'static str {
        "invoice_id,customer_id,subscription_id,invoice_date,period_start,period_end,amount,status\ninv1,c1,sub1,2024-01-01,2024-01-01,2024-01-31,1000.00,paid\n"
    }
    fn payments_csv() -> &'static str {
        "payment_id,invoice_id,payment_date,amount\npay1,inv1,2024-01-05,1000.00\n"
    }
    fn credit_notes_csv() -> &'static str {
        "credit_note_id,customer_id,invoice_id,credit_date,amount,reason\n"
    }

    #[tokio::test]
    async fn end_to_end_clean_session_completes_and_scores_high() {
        let engine = ReconciliationEngine::new();
        engine
            .create_session(
                "s1",
                &json!({"currency": "USD", "period_start": "2024-01-01", "period_end": "2024-12-31"}),
            )
            .await
            .unwrap();

        let report = engine
            .validate(
                "s1",
                RawCsvInputs {
                    accounts_csv: accounts_csv(),
                    customers_csv: customers_csv(),
                    subscriptions_csv: subscriptions_csv(),
                    invoices_csv: invoices_csv(),
                    payments_csv: payments_csv(),
                    credit_notes_csv: credit_notes_csv(),
                },
            )
            .await
            .unwrap();
        assert!(report.valid);
        assert_eq!(report.identity_summary.auto_matched, 1);

        engine.analyze("s1").await.unwrap();
        let (status, _) = engine.status("s1").await.unwrap();
        assert_eq!(status, SessionStatus::Completed);

        let dashboard = engine.dashboard("s1").await.unwrap();
        assert!(dashboard.score >= 90, "expected a green score, got {}", dashboard.score);

        let rows = engine.accounts("s1", AccountFilters::default()).await.unwrap();
        assert_eq!(rows.len(), 1);

        let csv_text = engine.export_accounts_csv("s1", AccountFilters::default()).await.unwrap();
        assert!(csv_text.contains("Acme"));
    }

    #[tokio::test]
    async fn analyze_without_resolving_review_queue_fails_fast() {
        let engine = ReconciliationEngine::new();
        engine
            .create_session(
                "s2",
                &json!({"period_start": "2024-01-01", "period_end": "2024-12-31"}),
            )
            .await
            .unwrap();
        let fuzzy_accounts = "account_id,account_name,email_domain\na1,Northwind Traders,\n";
        let fuzzy_customers = "customer_id,customer_name,email_domain\nc1,Northwind Trading Co,\n";
        engine
            .validate(
                "s2",
                RawCsvInputs {
                    accounts_csv: fuzzy_accounts,
                    customers_csv: fuzzy_customers,
                    subscriptions_csv: "subscription_id,account_id,start_date,end_date,mrr,ramp_schedule\n",
                    invoices_csv: "invoice_id,customer_id,subscription_id,invoice_date,period_start,period_end,amount,status\n",
                    payments_csv: "payment_id,invoice_id,payment_date,amount\n",
                    credit_notes_csv: credit_notes_csv(),
                },
            )
            .await
            .unwrap();

        let result = engine.analyze("s2").await;
        assert!(result.is_err());
        // IdentityDeadlock is a no-state-change refusal (spec §7): the
        // session stays in `identity_review`, not `error`.
        let (status, processing) = engine.status("s2").await.unwrap();
        assert_eq!(status, SessionStatus::IdentityReview);
        assert!(processing.error.is_none());
    }
}
