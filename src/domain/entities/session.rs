use chrono::NaiveDateTime;

use super::session_settings::SessionSettings;
use crate::domain::entities::identity::DecisionLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Created,
    IdentityReview,
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Created => "created",
            SessionStatus::IdentityReview => "identity_review",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepTiming {
    pub status: StepStatus,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub step: String,
    pub message: String,
}

/// Polled by the status endpoint. `current_step` advances monotonically;
/// readers observe a consistent prefix because the session record is read
/// atomically as a single document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessingStatus {
    pub current_step: Option<String>,
    pub steps: Vec<(String, StepTiming)>,
    pub log: Vec<LogLine>,
    pub error: Option<String>,
}

impl ProcessingStatus {
    pub(crate) fn start_step(&mut self, step: &str, at: NaiveDateTime) {
        self.current_step = Some(step.to_string());
        self.steps.push((
            step.to_string(),
            StepTiming {
                status: StepStatus::Running,
                timestamp: at,
            },
        ));
        self.log.push(LogLine {
            step: step.to_string(),
            message: format!("starting {step}"),
        });
    }

    pub(crate) fn finish_step(&mut self, step: &str, at: NaiveDateTime) {
        self.steps.push((
            step.to_string(),
            StepTiming {
                status: StepStatus::Done,
                timestamp: at,
            },
        ));
        self.log.push(LogLine {
            step: step.to_string(),
            message: format!("finished {step}"),
        });
    }

    pub(crate) fn fail_step(&mut self, step: &str, at: NaiveDateTime, message: &str) {
        self.steps.push((
            step.to_string(),
            StepTiming {
                status: StepStatus::Failed,
                timestamp: at,
            },
        ));
        self.log.push(LogLine {
            step: step.to_string(),
            message: message.to_string(),
        });
        self.error = Some(message.to_string());
    }
}

/// One record per session: the only mutable value a worker holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub status: SessionStatus,
    pub settings: SessionSettings,
    pub decision_log: Vec<DecisionLogEntry>,
    pub processing_status: ProcessingStatus,
}

impl Session {
    pub fn new(session_id: String, settings: SessionSettings) -> Self {
        Self {
            session_id,
            status: SessionStatus::Created,
            settings,
            decision_log: Vec::new(),
            processing_status: ProcessingStatus::default(),
        }
    }
}
