use super::ids::{AccountId, CustomerId, MatchId, RsxId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    Exact,
    FuzzyConfirmed,
    EmailSignal,
    Unmatched,
}

/// Confirmed or unmatched crosswalk entry — one per `rsx_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityLink {
    pub rsx_id: RsxId,
    pub account_id: AccountId,
    pub customer_id: Option<CustomerId>,
    pub match_type: MatchType,
    pub confidence: f64,
    pub evidence: String,
}

impl IdentityLink {
    pub fn is_matched(&self) -> bool {
        self.customer_id.is_some()
    }
}

/// A fuzzy-pass pair awaiting operator confirmation (score in [0.75, 0.95)).
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReview {
    pub match_id: MatchId,
    pub account_id: AccountId,
    pub account_name: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Confirmed,
    Rejected,
}

/// One append-only entry in the arbitration log. Replaying `resolve` with the
/// same decision log must reproduce the same spine (idempotent on replay).
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionLogEntry {
    pub match_id: MatchId,
    pub decision: Decision,
}

/// Output of `resolve`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentitySpine {
    pub auto_matched: Vec<IdentityLink>,
    /// FIFO, ordered by descending confidence.
    pub needs_review: Vec<PendingReview>,
    pub unmatched: Vec<IdentityLink>,
    /// Billing-side customers left over after all three passes and after any
    /// `Rejected` decision — never matched to an account, so they have no
    /// `rsx_id` and no `IdentityLink` of their own. Callers must still
    /// account for their invoices/credit notes (as exclusions), since a
    /// customer with no account-side link is otherwise invisible to
    /// `all_links()`.
    pub unmatched_customers: Vec<CustomerId>,
}

impl IdentitySpine {
    pub fn all_links(&self) -> impl Iterator<Item = &IdentityLink> {
        self.auto_matched.iter().chain(self.unmatched.iter())
    }

    pub fn link_for_account(&self, account_id: &AccountId) -> Option<&IdentityLink> {
        self.all_links().find(|l| &l.account_id == account_id)
    }
}

/// Result of `identity_usecase::undo`: distinguishes "a decision was popped"
/// from "the log was already empty" per spec's "must not panic on empty log;
/// returns a 'no decisions' signal" contract. Either way carries the spine
/// resulting from the (possibly unchanged) log.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    Undone(IdentitySpine),
    NoDecisions(IdentitySpine),
}

impl UndoOutcome {
    pub fn spine(&self) -> &IdentitySpine {
        match self {
            UndoOutcome::Undone(s) | UndoOutcome::NoDecisions(s) => s,
        }
    }

    pub fn into_spine(self) -> IdentitySpine {
        match self {
            UndoOutcome::Undone(s) | UndoOutcome::NoDecisions(s) => s,
        }
    }

    pub fn undone(&self) -> bool {
        matches!(self, UndoOutcome::Undone(_))
    }
}
