//! Analysis session
//!
//! One session drives a single submit → retrieve → match cycle against the
//! remote task service. The state machine (`Idle → Submitted → Retrieved`)
//! is authoritative: out-of-order actions are rejected here, not merely
//! hidden in the UI.

pub mod analysis;
pub mod state;

use crate::staging::StageError;
use thiserror::Error;

pub use analysis::{AnalysisSession, MatchOutcome, RetrievalOutcome, SubmissionReceipt};
pub use state::{SessionSnapshot, SessionState};

/// Errors of a single session action. None of them end the session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Remote service rejected the task or could not be reached
    #[error("Task submission failed: {0}")]
    Submission(String),

    /// A task is already running; retrieve it or reset first
    #[error("Task {0} is still in flight; retrieve its results or reset the session")]
    TaskInFlight(u64),

    /// Retrieval attempted before any submission
    #[error("No task has been submitted")]
    NoTaskSubmitted,

    /// Task has not finished yet
    #[error("Results not ready: {0}")]
    NotReady(String),

    /// Task finished but its result is unusable
    #[error("Task result is missing or malformed: {0}")]
    MissingResult(String),

    /// Stage selection is incomplete or not in the staging scheme
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Matching attempted before results were retrieved
    #[error("No results available; retrieve the analysis results first")]
    NoResultsAvailable,
}

impl SessionError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Submission(_) => "submission",
            SessionError::TaskInFlight(_) => "task_in_flight",
            SessionError::NoTaskSubmitted => "no_task_submitted",
            SessionError::NotReady(_) => "not_ready",
            SessionError::MissingResult(_) => "missing_result",
            SessionError::Stage(StageError::InvalidStage { .. }) => "invalid_stage",
            SessionError::Stage(StageError::MissingSelection(_)) => "missing_selection",
            SessionError::NoResultsAvailable => "no_results_available",
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
