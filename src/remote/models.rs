//! Request and response models of the remote task service

use crate::config::AnalysisConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use super::{RemoteError, RemoteResult};

/// Data format tag of task inputs and results
pub const DATA_FORMAT: &str = "json";

/// Everything needed to create a task on the remote platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub image: String,
    pub description: String,
    pub collaboration_id: u64,
    pub organizations: Vec<u64>,
    /// Algorithm input: method selector and parameter bag
    pub input: Value,
}

impl TaskSpec {
    /// Federated TNM similarity clustering task.
    ///
    /// The master method runs on the first organization and fans out to
    /// `org_ids`.
    pub fn similarity(config: &AnalysisConfig) -> Self {
        let input = json!({
            "method": "master",
            "master": true,
            "kwargs": {
                "org_ids": config.organizations,
                "k": config.k,
                "epsilon": config.epsilon,
                "max_iter": config.max_iter,
                "columns": config.columns,
            }
        });

        Self {
            name: config.task_name.clone(),
            image: config.image.clone(),
            description: config.description.clone(),
            collaboration_id: config.collaboration_id,
            organizations: config.organizations.clone(),
            input,
        }
    }

    /// Body of the task creation request
    pub fn request_body(&self) -> Value {
        let organizations: Vec<Value> = self
            .organizations
            .iter()
            .map(|id| json!({ "id": id, "input": self.input }))
            .collect();

        json!({
            "name": self.name,
            "image": self.image,
            "description": self.description,
            "collaboration_id": self.collaboration_id,
            "organizations": organizations,
            "data_format": DATA_FORMAT,
        })
    }
}

/// Opaque reference to a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: u64,
}

/// Completion status of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub complete: bool,
    #[serde(default)]
    pub finished_at: Option<String>,
}

/// One result entry of a finished task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default)]
    pub id: Option<u64>,
    /// Decoded result document
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl ResultEntry {
    /// Finish time as UTC, when present and parseable
    pub fn finished_at_utc(&self) -> Option<DateTime<Utc>> {
        self.finished_at.as_deref().and_then(parse_timestamp)
    }
}

/// Decode a result field.
///
/// The platform stores results either as JSON or as a serialized string,
/// optionally prefixed with the data format (`json.{...}`).
pub fn decode_result(raw: Value) -> RemoteResult<Value> {
    match raw {
        Value::String(text) => {
            let prefix = format!("{}.", DATA_FORMAT);
            let body = text.strip_prefix(&prefix).unwrap_or(&text);
            serde_json::from_str(body).map_err(RemoteError::from)
        }
        other => Ok(other),
    }
}

/// Parse a timestamp reported by the platform.
///
/// Accepts RFC 3339 and naive ISO-8601 (taken as UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
