//! Patient similarity over the cluster model returned by the remote
//! clustering task.
//!
//! - [`ClusterModel`]: validated centroids and their survival profiles
//! - [`nearest_centroid`]: Euclidean nearest-centroid lookup
//! - [`SurvivalCurve`] / [`ChartSpec`]: the matched cluster's profile as a
//!   time series

pub mod matcher;
pub mod survival;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use matcher::{euclidean, nearest_centroid};
pub use survival::{ChartSpec, SurvivalCurve, SurvivalPoint, TIME_STEP};

/// Errors raised when a result payload does not describe a usable model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A required key is absent or null
    #[error("Result payload has no {0:?}")]
    MissingField(&'static str),

    /// A required key is present but empty
    #[error("Result payload has an empty {0:?}")]
    EmptyField(&'static str),

    /// A field has the wrong type or shape
    #[error("Malformed {field:?} in result payload: {reason}")]
    Malformed { field: &'static str, reason: String },

    /// Profiles and centroids are not parallel
    #[error("Result payload has {centroids} centroids but {profiles} profiles")]
    LengthMismatch { centroids: usize, profiles: usize },

    /// A cluster has no survival samples
    #[error("Survival profile {cluster} is empty")]
    EmptyProfile { cluster: usize },

    /// A profile value lies outside [0, 1]
    #[error("Survival probability {value} in profile {cluster} is outside [0, 1]")]
    ProbabilityOutOfRange { cluster: usize, value: f64 },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Cluster centroids in TNM-ordinal space with a survival profile per
/// cluster. Cluster identity is the index into both vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClusterModel")]
pub struct ClusterModel {
    centroids: Vec<[f64; 3]>,
    profiles: Vec<Vec<f64>>,
}

/// Unvalidated wire form, only turned into a model through `ClusterModel::new`
#[derive(Deserialize)]
struct RawClusterModel {
    centroids: Vec<[f64; 3]>,
    profiles: Vec<Vec<f64>>,
}

impl TryFrom<RawClusterModel> for ClusterModel {
    type Error = ModelError;

    fn try_from(raw: RawClusterModel) -> ModelResult<Self> {
        Self::new(raw.centroids, raw.profiles)
    }
}

impl ClusterModel {
    /// Validate and build a model
    pub fn new(centroids: Vec<[f64; 3]>, profiles: Vec<Vec<f64>>) -> ModelResult<Self> {
        if centroids.is_empty() {
            return Err(ModelError::EmptyField("centroids"));
        }
        if profiles.is_empty() {
            return Err(ModelError::EmptyField("profiles"));
        }
        if centroids.len() != profiles.len() {
            return Err(ModelError::LengthMismatch {
                centroids: centroids.len(),
                profiles: profiles.len(),
            });
        }
        if let Some(bad) = centroids.iter().flatten().find(|c| !c.is_finite()) {
            return Err(ModelError::Malformed {
                field: "centroids",
                reason: format!("non-finite coordinate {}", bad),
            });
        }
        for (cluster, profile) in profiles.iter().enumerate() {
            if profile.is_empty() {
                return Err(ModelError::EmptyProfile { cluster });
            }
            if let Some(&value) = profile
                .iter()
                .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
            {
                return Err(ModelError::ProbabilityOutOfRange { cluster, value });
            }
        }

        Ok(Self { centroids, profiles })
    }

    /// Extract the model from a task result object holding `centroids`
    /// and `profiles`.
    pub fn from_payload(payload: &Value) -> ModelResult<Self> {
        let centroids = required(payload, "centroids")?;
        let profiles = required(payload, "profiles")?;

        let raw_centroids: Vec<Vec<f64>> =
            serde_json::from_value(centroids.clone()).map_err(|e| ModelError::Malformed {
                field: "centroids",
                reason: e.to_string(),
            })?;
        let profiles: Vec<Vec<f64>> =
            serde_json::from_value(profiles.clone()).map_err(|e| ModelError::Malformed {
                field: "profiles",
                reason: e.to_string(),
            })?;

        let mut points = Vec::with_capacity(raw_centroids.len());
        for (i, c) in raw_centroids.into_iter().enumerate() {
            let point: [f64; 3] = c.try_into().map_err(|c: Vec<f64>| ModelError::Malformed {
                field: "centroids",
                reason: format!("centroid {} has {} coordinates, expected 3", i, c.len()),
            })?;
            points.push(point);
        }

        Self::new(points, profiles)
    }

    pub fn centroids(&self) -> &[[f64; 3]] {
        &self.centroids
    }

    pub fn profiles(&self) -> &[Vec<f64>] {
        &self.profiles
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Index of the cluster whose centroid is closest to `query`
    pub fn nearest(&self, query: &[f64; 3]) -> usize {
        // never empty once constructed
        nearest_centroid(query, &self.centroids).unwrap_or(0)
    }
}

fn required<'a>(payload: &'a Value, field: &'static str) -> ModelResult<&'a Value> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(ModelError::MissingField(field)),
        Some(Value::Array(items)) if items.is_empty() => Err(ModelError::EmptyField(field)),
        Some(value) => Ok(value),
    }
}
