//! `analyze`: drives the four-stage pipeline (identity was already resolved
//! and decided before this runs; here we resolve once more to pick up the
//! final decision log, then build lifecycle, reconcile, and score).
//! Cancellation is a cooperative flag checked between stages only.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use fractic_server_error::ServerError;

use crate::domain::entities::{
    Account, Allocation, CreditNote, DecisionLogEntry, Exclusion, IdentitySpine, InputTables,
    Invoice, Payment, ProcessingStatus, ReasonCode, RecordType, RevenueSegment, ScoreReport,
    SegmentVariance, SessionSettings, Subscription,
};
use crate::domain::logic::{identity_resolver, lifecycle_builder, reconciliation, scoring};
use crate::errors::IdentityReviewRequired;

const STEP_IDENTITY: &str = "identity_resolution";
const STEP_LIFECYCLE: &str = "lifecycle_building";
const STEP_RECONCILIATION: &str = "reconciliation";
const STEP_SCORING: &str = "scoring";

pub(crate) struct AnalyzeOutput {
    pub segments: Vec<RevenueSegment>,
    pub allocations: Vec<Allocation>,
    pub variances: Vec<SegmentVariance>,
    pub exclusions: Vec<Exclusion>,
    pub spine: IdentitySpine,
    pub score: ScoreReport,
}

/// Runs the pipeline once. Returns `Ok(None)` if the cooperative cancel flag
/// was observed at a stage boundary — the caller must then leave the session
/// in its pre-run state rather than persisting a partial result.
pub(crate) fn analyze(
    session_id: &str,
    tables: &InputTables,
    decision_log: &[DecisionLogEntry],
    settings: &SessionSettings,
    processing_status: &mut ProcessingStatus,
    cancel: &AtomicBool,
) -> Result<Option<AnalyzeOutput>, ServerError> {
    let _span = tracing::info_span!("analyze", session_id).entered();

    processing_status.start_step(STEP_IDENTITY, Utc::now().naive_utc());
    let spine = identity_resolver::resolve(&tables.accounts, &tables.customers, decision_log);
    if !spine.needs_review.is_empty() {
        let message = format!(
            "{} identity match(es) pending review; analysis refused",
            spine.needs_review.len()
        );
        tracing::warn!(session_id, pending = spine.needs_review.len(), "identity review queue not empty");
        processing_status.fail_step(STEP_IDENTITY, Utc::now().naive_utc(), &message);
        return Err(IdentityReviewRequired::new(spine.needs_review.len()));
    }
    tracing::info!(session_id, auto_matched = spine.auto_matched.len(), unmatched = spine.unmatched.len(), "identity resolution complete");
    processing_status.finish_step(STEP_IDENTITY, Utc::now().naive_utc());
    if cancel.load(Ordering::SeqCst) {
        tracing::info!(session_id, step = STEP_IDENTITY, "analysis cancelled");
        return Ok(None);
    }

    let accounts_by_id: HashMap<&str, &Account> =
        tables.accounts.iter().map(|a| (a.account_id.as_str(), a)).collect();

    processing_status.start_step(STEP_LIFECYCLE, Utc::now().naive_utc());
    let excluded_at = Utc::now().naive_utc();
    let mut segments = Vec::new();
    let mut exclusions = Vec::new();
    for link in spine.all_links() {
        let subs: Vec<&Subscription> = tables
            .subscriptions
            .iter()
            .filter(|s| s.account_id == link.account_id)
            .collect();
        for sub in subs {
            match lifecycle_builder::build_segments_for_subscription(
                sub,
                &link.rsx_id,
                settings.period_start,
                settings.period_end,
                excluded_at,
            ) {
                Ok(segs) => segments.extend(segs),
                Err(excl) => exclusions.push(excl),
            }
        }
    }
    tracing::info!(session_id, segments = segments.len(), exclusions = exclusions.len(), "lifecycle building complete");
    processing_status.finish_step(STEP_LIFECYCLE, Utc::now().naive_utc());
    if cancel.load(Ordering::SeqCst) {
        tracing::info!(session_id, step = STEP_LIFECYCLE, "analysis cancelled");
        return Ok(None);
    }

    processing_status.start_step(STEP_RECONCILIATION, Utc::now().naive_utc());
    let mut allocations = Vec::new();
    let mut variances = Vec::new();
    for link in spine.all_links() {
        let rsx_segments: Vec<RevenueSegment> =
            segments.iter().filter(|s| s.rsx_id == link.rsx_id).cloned().collect();
        if rsx_segments.is_empty() {
            continue;
        }

        let (invoices, payments, credit_notes): (Vec<Invoice>, Vec<Payment>, Vec<CreditNote>) =
            match &link.customer_id {
                Some(customer_id) => {
                    let invoices: Vec<Invoice> = tables
                        .invoices
                        .iter()
                        .filter(|i| &i.customer_id == customer_id)
                        .cloned()
                        .collect();
                    let invoice_ids: HashSet<&str> =
                        invoices.iter().map(|i| i.invoice_id.as_str()).collect();
                    let payments: Vec<Payment> = tables
                        .payments
                        .iter()
                        .filter(|p| invoice_ids.contains(p.invoice_id.as_str()))
                        .cloned()
                        .collect();
                    let credit_notes: Vec<CreditNote> = tables
                        .credit_notes
                        .iter()
                        .filter(|c| &c.customer_id == customer_id)
                        .cloned()
                        .collect();
                    (invoices, payments, credit_notes)
                }
                None => (Vec::new(), Vec::new(), Vec::new()),
            };

        let out = reconciliation::reconcile(
            &rsx_segments,
            &invoices,
            &payments,
            &credit_notes,
            link.is_matched(),
            settings.tolerance,
            excluded_at,
        );
        allocations.extend(out.allocations);
        variances.extend(out.variances);
        exclusions.extend(out.exclusions);
    }

    // Customers the identity resolver never linked to an account (never
    // matched, or the candidate match was rejected) have no `rsx_id` and so
    // are invisible to the `spine.all_links()` loops above. Their invoices
    // and credit notes would otherwise be dropped with no record anywhere —
    // surface them as exclusions directly, per the "never silent" rule.
    let unmatched_customer_ids: HashSet<&str> =
        spine.unmatched_customers.iter().map(|c| c.as_str()).collect();
    for inv in &tables.invoices {
        if unmatched_customer_ids.contains(inv.customer_id.as_str()) {
            exclusions.push(Exclusion {
                record_type: RecordType::Invoice,
                record_id: inv.invoice_id.clone(),
                reason_code: ReasonCode::AllocationAmbiguous,
                description: "customer has no confirmed identity link".to_string(),
                excluded_at,
            });
        }
    }
    for cn in &tables.credit_notes {
        if unmatched_customer_ids.contains(cn.customer_id.as_str()) {
            exclusions.push(Exclusion {
                record_type: RecordType::CreditNote,
                record_id: cn.credit_note_id.clone(),
                reason_code: ReasonCode::CreditNoteUnallocated,
                description: "customer has no confirmed identity link".to_string(),
                excluded_at,
            });
        }
    }
    tracing::info!(session_id, allocations = allocations.len(), variances = variances.len(), "reconciliation complete");
    processing_status.finish_step(STEP_RECONCILIATION, Utc::now().naive_utc());
    if cancel.load(Ordering::SeqCst) {
        tracing::info!(session_id, step = STEP_RECONCILIATION, "analysis cancelled");
        return Ok(None);
    }

    processing_status.start_step(STEP_SCORING, Utc::now().naive_utc());
    let mut account_summaries = Vec::new();
    for link in spine.all_links() {
        let rsx_variances: Vec<SegmentVariance> =
            variances.iter().filter(|v| v.rsx_id == link.rsx_id).cloned().collect();
        if rsx_variances.is_empty() {
            continue;
        }
        let account_name = accounts_by_id
            .get(link.account_id.as_str())
            .map(|a| a.account_name.clone())
            .unwrap_or_default();
        account_summaries.push(scoring::summarize_account(
            link.rsx_id.clone(),
            account_name,
            &rsx_variances,
        ));
    }
    let score = scoring::score(scoring::ScoringInput {
        total_accounts: tables.accounts.len(),
        total_subscriptions: tables.subscriptions.len(),
        spine: &spine,
        segments: &segments,
        allocations: &allocations,
        variances: &variances,
        account_summaries: &account_summaries,
    });
    tracing::info!(session_id, score = score.score, band = ?score.band, "scoring complete");
    processing_status.finish_step(STEP_SCORING, Utc::now().naive_utc());

    Ok(Some(AnalyzeOutput {
        segments,
        allocations,
        variances,
        exclusions,
        spine,
        score,
    }))
}
