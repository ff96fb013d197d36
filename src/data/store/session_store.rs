//! Per-session derived-artifact store. One record per session id; two
//! sessions never share keys.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use fractic_server_error::ServerError;
use tokio::sync::RwLock;

use crate::domain::entities::{
    Allocation, Exclusion, IdentitySpine, InputTables, RevenueSegment, ScoreReport, Session,
    SegmentVariance,
};
use crate::errors::SessionNotFound;

/// Everything kept for one session: its configuration/decision-log record
/// plus whatever derived artifacts the pipeline has produced so far.
pub(crate) struct SessionRecord {
    pub session: Session,
    pub tables: Option<InputTables>,
    pub spine: Option<IdentitySpine>,
    pub segments: Vec<RevenueSegment>,
    pub allocations: Vec<Allocation>,
    pub variances: Vec<SegmentVariance>,
    pub exclusions: Vec<Exclusion>,
    pub score: Option<ScoreReport>,
    pub cancel: Arc<AtomicBool>,
}

impl SessionRecord {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            tables: None,
            spine: None,
            segments: Vec::new(),
            allocations: Vec::new(),
            variances: Vec::new(),
            exclusions: Vec::new(),
            score: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[derive(Default)]
pub(crate) struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert(&self, record: SessionRecord) {
        let mut guard = self.sessions.write().await;
        guard.insert(record.session.session_id.clone(), record);
    }

    pub(crate) async fn read<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&SessionRecord) -> T,
    ) -> Result<T, ServerError> {
        let guard = self.sessions.read().await;
        let record = guard.get(session_id).ok_or_else(|| SessionNotFound::new(session_id))?;
        Ok(f(record))
    }

    pub(crate) async fn write<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionRecord) -> T,
    ) -> Result<T, ServerError> {
        let mut guard = self.sessions.write().await;
        let record = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionNotFound::new(session_id))?;
        Ok(f(record))
    }

    pub(crate) async fn cancel_flag(&self, session_id: &str) -> Result<Arc<AtomicBool>, ServerError> {
        self.read(session_id, |r| r.cancel.clone()).await
    }
}
