//! Session state machine

use crate::remote::TaskHandle;
use crate::similarity::ClusterModel;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of one analysis
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Nothing submitted yet, or reset
    #[default]
    Idle,
    /// Task created on the remote service
    Submitted {
        handle: TaskHandle,
        submitted_at: DateTime<Utc>,
    },
    /// Results fetched and validated
    Retrieved {
        handle: TaskHandle,
        submitted_at: DateTime<Utc>,
        model: ClusterModel,
        duration_minutes: f64,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Submitted { .. } => "submitted",
            SessionState::Retrieved { .. } => "retrieved",
        }
    }

    pub fn handle(&self) -> Option<TaskHandle> {
        match self {
            SessionState::Idle => None,
            SessionState::Submitted { handle, .. } | SessionState::Retrieved { handle, .. } => {
                Some(*handle)
            }
        }
    }

    pub fn model(&self) -> Option<&ClusterModel> {
        match self {
            SessionState::Retrieved { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            state: self.name(),
            task_id: self.handle().map(|h| h.id),
            submitted_at: None,
            duration_minutes: None,
            clusters: None,
        };

        match self {
            SessionState::Idle => {}
            SessionState::Submitted { submitted_at, .. } => {
                snapshot.submitted_at = Some(submitted_at.to_rfc3339());
            }
            SessionState::Retrieved {
                submitted_at,
                model,
                duration_minutes,
                ..
            } => {
                snapshot.submitted_at = Some(submitted_at.to_rfc3339());
                snapshot.duration_minutes = Some(*duration_minutes);
                snapshot.clusters = Some(model.len());
            }
        }

        snapshot
    }
}

/// Serializable view of the session for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: &'static str,
    pub task_id: Option<u64>,
    pub submitted_at: Option<String>,
    pub duration_minutes: Option<f64>,
    pub clusters: Option<usize>,
}
