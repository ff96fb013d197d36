pub mod account;
pub mod account_view;
pub mod allocation;
pub mod credit_note;
pub mod customer;
pub mod exclusion;
pub mod identity;
pub mod ids;
pub mod invoice;
pub mod payment;
pub mod score;
pub mod segment;
pub mod session;
pub mod session_settings;
pub mod subscription;
pub mod validation;
pub mod variance;

pub use account::Account;
pub use account_view::{AccountFilters, AccountRow, LineageAllocation, LineageEntry};
pub use allocation::{Allocation, AllocationMethod, AllocationSource};
pub use credit_note::CreditNote;
pub use customer::Customer;
pub use exclusion::{Exclusion, ReasonCode, RecordType};
pub use identity::{
    Decision, DecisionLogEntry, IdentityLink, IdentitySpine, MatchType, PendingReview, UndoOutcome,
};
pub use ids::{AccountId, CreditNoteId, CustomerId, InvoiceId, MatchId, PaymentId, RsxId, SegmentId, SubscriptionId};
pub use invoice::{Invoice, InvoiceStatus};
pub use payment::Payment;
pub use score::{Coverage, ComponentScores, QuickFinding, RevenueAtRiskEntry, ScoreBand, ScoreReport};
pub use segment::RevenueSegment;
pub use session::{LogLine, ProcessingStatus, Session, SessionStatus, StepStatus, StepTiming};
pub use session_settings::SessionSettings;
pub use subscription::{RampStep, Subscription};
pub use validation::{IdentitySummary, ValidationIssue, ValidationReport};
pub use variance::{SegmentVariance, VarianceStatus};

/// The six validated input tables, freshly ingested and indexed by primary
/// key. One per session; discarded and rebuilt on every run.
#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub accounts: Vec<Account>,
    pub customers: Vec<Customer>,
    pub subscriptions: Vec<Subscription>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub credit_notes: Vec<CreditNote>,
}
