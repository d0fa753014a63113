//! In-memory stand-in for the remote task service

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tnm_dashboard::remote::{RemoteError, RemoteResult};
use tnm_dashboard::{
    AnalysisConfig, AnalysisSession, ResultEntry, StagingScheme, TaskHandle, TaskService,
    TaskSpec, TaskStatus,
};

#[derive(Default)]
pub struct FakeState {
    /// Number of status calls answered with `complete: false`
    pub pending_polls: usize,
    pub results: Vec<ResultEntry>,
    pub fail_auth: bool,
    pub fail_submit: bool,
    pub fail_status: bool,
    /// Applied to every call
    pub delay: Option<Duration>,
    pub next_id: u64,
    pub auth_calls: usize,
    pub status_calls: usize,
    pub submitted: Vec<TaskSpec>,
}

#[derive(Default)]
pub struct FakeService {
    pub state: Mutex<FakeState>,
}

impl FakeService {
    pub fn completing_with(result: Value) -> Self {
        let service = Self::default();
        service.set_results(vec![entry(result, Some("2030-01-01T00:00:00"))]);
        service
    }

    pub fn set_results(&self, results: Vec<ResultEntry>) {
        self.state.lock().unwrap().results = results;
    }

    pub fn with<F: FnOnce(&mut FakeState)>(self, f: F) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    async fn pause(&self) {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TaskService for FakeService {
    async fn authenticate(&self) -> RemoteResult<()> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.auth_calls += 1;
        if state.fail_auth {
            return Err(RemoteError::AuthFailed("Invalid username/password".to_string()));
        }
        Ok(())
    }

    async fn submit(&self, spec: &TaskSpec) -> RemoteResult<TaskHandle> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_submit {
            return Err(RemoteError::Network("connection refused".to_string()));
        }
        state.next_id += 1;
        state.submitted.push(spec.clone());
        Ok(TaskHandle { id: state.next_id })
    }

    async fn status(&self, _handle: &TaskHandle) -> RemoteResult<TaskStatus> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        if state.fail_status {
            return Err(RemoteError::Network("connection reset".to_string()));
        }
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(TaskStatus { complete: false, finished_at: None });
        }
        Ok(TaskStatus { complete: true, finished_at: None })
    }

    async fn fetch_result(&self, _handle: &TaskHandle) -> RemoteResult<Vec<ResultEntry>> {
        self.pause().await;
        Ok(self.state.lock().unwrap().results.clone())
    }
}

pub fn entry(result: Value, finished_at: Option<&str>) -> ResultEntry {
    ResultEntry {
        id: Some(1),
        result,
        finished_at: finished_at.map(str::to_string),
    }
}

/// t = [T1, T2], n = [N0, N1], m = [M0, M1]
pub fn small_scheme() -> Arc<StagingScheme> {
    Arc::new(
        StagingScheme::from_json_str(
            r#"{"t": {"values": ["T1", "T2"]}, "n": {"values": ["N0", "N1"]}, "m": {"values": ["M0", "M1"]}}"#,
        )
        .unwrap(),
    )
}

/// Two clusters at (0,0,0) and (1,1,1)
pub fn two_cluster_result() -> Value {
    json!({
        "centroids": [[0, 0, 0], [1, 1, 1]],
        "profiles": [[1.0, 0.9, 0.85, 0.8], [0.8, 0.5, 0.4, 0.3]],
    })
}

pub fn session(service: FakeService) -> AnalysisSession<FakeService> {
    AnalysisSession::new(service, small_scheme(), AnalysisConfig::default())
        .with_timeout(Duration::from_secs(5))
}
