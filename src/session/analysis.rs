//! AnalysisSession — submit, retrieve and match against one remote task

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::remote::models::parse_timestamp;
use crate::remote::{RemoteError, RemoteResult, TaskService, TaskSpec};
use crate::similarity::{euclidean, ChartSpec, ClusterModel, SurvivalCurve};
use crate::staging::{EncodedStage, StageSelection, StagingScheme};
use super::state::{SessionSnapshot, SessionState};
use super::{SessionError, SessionResult};

/// Default bound for a single remote call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Returned by a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub task_id: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Returned by a successful retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalOutcome {
    pub task_id: u64,
    pub clusters: usize,
    /// Wall-clock minutes from submission to the reported finish
    pub duration_minutes: f64,
}

/// Cluster matched to a clinician-entered stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub encoded: EncodedStage,
    pub cluster: usize,
    pub centroid: [f64; 3],
    pub distance: f64,
    pub curve: SurvivalCurve,
}

impl MatchOutcome {
    pub fn chart(&self) -> ChartSpec {
        self.curve.chart()
    }
}

/// Explicit context for the dashboard's three actions.
///
/// Every remote call is bounded by the session timeout. A failed action
/// leaves the state as it was.
pub struct AnalysisSession<S> {
    service: S,
    staging: Arc<StagingScheme>,
    analysis: AnalysisConfig,
    timeout: Duration,
    state: SessionState,
}

impl<S: TaskService> AnalysisSession<S> {
    pub fn new(service: S, staging: Arc<StagingScheme>, analysis: AnalysisConfig) -> Self {
        Self {
            service,
            staging,
            analysis,
            timeout: DEFAULT_TIMEOUT,
            state: SessionState::Idle,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn staging(&self) -> &StagingScheme {
        &self.staging
    }

    /// Scheme handle that can be read without holding the session
    pub fn shared_staging(&self) -> Arc<StagingScheme> {
        Arc::clone(&self.staging)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    /// Authenticate and create the similarity task.
    ///
    /// Rejected while a previous task is still in flight. A fresh submission
    /// after a retrieval discards the previous results.
    pub async fn submit(&mut self) -> SessionResult<SubmissionReceipt> {
        if let SessionState::Submitted { handle, .. } = &self.state {
            return Err(SessionError::TaskInFlight(handle.id));
        }

        self.bounded(self.service.authenticate())
            .await
            .map_err(|e| SessionError::Submission(e.to_string()))?;

        let spec = TaskSpec::similarity(&self.analysis);
        let submitted_at = Utc::now();
        let handle = self
            .bounded(self.service.submit(&spec))
            .await
            .map_err(|e| SessionError::Submission(e.to_string()))?;

        info!(
            task_id = handle.id,
            collaboration = spec.collaboration_id,
            organizations = ?spec.organizations,
            "Similarity task created"
        );

        self.state = SessionState::Submitted {
            handle,
            submitted_at,
        };

        Ok(SubmissionReceipt {
            task_id: handle.id,
            submitted_at,
        })
    }

    /// Check the submitted task and, once complete, load its cluster model.
    ///
    /// Calling again after a successful retrieval returns the same outcome.
    pub async fn retrieve(&mut self) -> SessionResult<RetrievalOutcome> {
        let (handle, submitted_at) = match &self.state {
            SessionState::Idle => return Err(SessionError::NoTaskSubmitted),
            SessionState::Retrieved {
                handle,
                model,
                duration_minutes,
                ..
            } => {
                return Ok(RetrievalOutcome {
                    task_id: handle.id,
                    clusters: model.len(),
                    duration_minutes: *duration_minutes,
                });
            }
            SessionState::Submitted {
                handle,
                submitted_at,
            } => (*handle, *submitted_at),
        };

        let status = self
            .bounded(self.service.status(&handle))
            .await
            .map_err(|e| SessionError::NotReady(format!("status check failed: {}", e)))?;

        if !status.complete {
            debug!(task_id = handle.id, "Task not complete yet");
            return Err(SessionError::NotReady(format!(
                "task {} is still running",
                handle.id
            )));
        }

        let entries = self
            .bounded(self.service.fetch_result(&handle))
            .await
            .map_err(|e| match e {
                RemoteError::Serialization(msg) => SessionError::MissingResult(msg),
                other => SessionError::NotReady(format!("result fetch failed: {}", other)),
            })?;

        if entries.len() != 1 {
            return Err(SessionError::MissingResult(format!(
                "expected exactly one result entry, got {}",
                entries.len()
            )));
        }
        let entry = &entries[0];

        let model = ClusterModel::from_payload(&entry.result)
            .map_err(|e| SessionError::MissingResult(e.to_string()))?;

        let finished_at = entry
            .finished_at_utc()
            .or_else(|| status.finished_at.as_deref().and_then(parse_timestamp))
            .unwrap_or_else(|| {
                warn!(task_id = handle.id, "No finish time reported, using retrieval time");
                Utc::now()
            });
        let duration_minutes = elapsed_minutes(submitted_at, finished_at);

        info!(
            task_id = handle.id,
            clusters = model.len(),
            duration_minutes,
            "Similarity results retrieved"
        );

        let outcome = RetrievalOutcome {
            task_id: handle.id,
            clusters: model.len(),
            duration_minutes,
        };

        self.state = SessionState::Retrieved {
            handle,
            submitted_at,
            model,
            duration_minutes,
        };

        Ok(outcome)
    }

    /// Keep retrieving until the task completes, a non-retryable error
    /// occurs, or `max_wait` runs out.
    pub async fn poll_until_complete(
        &mut self,
        interval: Duration,
        max_wait: Duration,
    ) -> SessionResult<RetrievalOutcome> {
        let deadline = Instant::now() + max_wait;

        loop {
            match self.retrieve().await {
                Err(SessionError::NotReady(reason)) => {
                    if Instant::now() + interval > deadline {
                        return Err(SessionError::NotReady(reason));
                    }
                    debug!(%reason, wait_ms = interval.as_millis() as u64, "Polling again");
                    tokio::time::sleep(interval).await;
                }
                other => return other,
            }
        }
    }

    /// Match a stage to its nearest cluster and build that cluster's
    /// survival curve. The selection is validated before anything else.
    pub fn match_stage(&self, selection: &StageSelection) -> SessionResult<MatchOutcome> {
        let encoded = self.staging.encode(selection)?;

        let model = self.state.model().ok_or(SessionError::NoResultsAvailable)?;

        let query = encoded.as_point();
        let cluster = model.nearest(&query);
        let centroid = model.centroids()[cluster];
        let curve = SurvivalCurve::for_cluster(model, cluster).ok_or_else(|| {
            SessionError::MissingResult(format!("no survival profile for cluster {}", cluster))
        })?;

        debug!(?encoded, cluster, points = curve.len(), "Stage matched");

        Ok(MatchOutcome {
            encoded,
            cluster,
            centroid,
            distance: euclidean(&query, &centroid),
            curve,
        })
    }

    /// Discard the task and any results
    pub fn reset(&mut self) {
        if let Some(handle) = self.state.handle() {
            info!(task_id = handle.id, "Session reset");
        }
        self.state = SessionState::Idle;
    }

    async fn bounded<T>(&self, fut: impl Future<Output = RemoteResult<T>>) -> RemoteResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout),
        }
    }
}

/// Minutes between two instants, rounded to three decimals
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
    (minutes * 1000.0).round() / 1000.0
}
