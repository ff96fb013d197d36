use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Subscription,
    Invoice,
    CreditNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    UnsupportedStructure,
    AllocationAmbiguous,
    CreditNoteUnallocated,
}

/// An append-only record of an input the engine refused to allocate. Every
/// record not represented in an allocation or segment must appear here
/// exactly once — the engine is never silent about dropped input.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub record_type: RecordType,
    pub record_id: String,
    pub reason_code: ReasonCode,
    pub description: String,
    pub excluded_at: NaiveDateTime,
}
