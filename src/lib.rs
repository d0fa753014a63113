//! TNM patient similarity dashboard
//!
//! A clinician triggers a federated clustering analysis over distributed
//! patient data, retrieves the cluster centroids and survival profiles once
//! the remote task finishes, and views the survival curve of the cluster
//! nearest to a manually entered TNM stage.
//!
//! # Architecture
//!
//! - [`staging`]: TNM common data model, label ↔ ordinal encoding
//! - [`similarity`]: validated cluster model, nearest-centroid matching,
//!   survival curves
//! - [`remote`]: the remote task service interface and its HTTP client
//! - [`session`]: the `Idle → Submitted → Retrieved` state machine tying
//!   the three user actions together
//! - [`http`]: dashboard page and JSON API
//! - [`config`]: YAML configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use tnm_dashboard::similarity::{ClusterModel, SurvivalCurve};
//! use tnm_dashboard::staging::{StageSelection, StagingScheme};
//!
//! let scheme = StagingScheme::from_json_str(
//!     r#"{"t": ["T1", "T2"], "n": ["N0", "N1"], "m": ["M0", "M1"]}"#,
//! ).unwrap();
//! let model = ClusterModel::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
//!     vec![vec![1.0, 0.9], vec![0.8, 0.5]],
//! ).unwrap();
//!
//! let stage = scheme.encode(&StageSelection::new("T2", "N1", "M1")).unwrap();
//! let cluster = model.nearest(&stage.as_point());
//! assert_eq!(cluster, 1);
//!
//! let curve = SurvivalCurve::for_cluster(&model, cluster).unwrap();
//! assert_eq!(curve.points[1].time, 30);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod http;
pub mod remote;
pub mod session;
pub mod similarity;
pub mod staging;

// Re-export main types for convenience
pub use config::{AnalysisConfig, ConfigError, DashboardConfig, HttpConfig, RemoteConfig};

pub use http::{router, AppState, HttpServer};

pub use remote::{
    HttpTaskService, RemoteError, RemoteResult, ResultEntry, TaskHandle, TaskService, TaskSpec,
    TaskStatus,
};

pub use session::{
    AnalysisSession, MatchOutcome, RetrievalOutcome, SessionError, SessionResult,
    SessionSnapshot, SessionState, SubmissionReceipt,
};

pub use similarity::{
    euclidean, nearest_centroid, ChartSpec, ClusterModel, ModelError, SurvivalCurve,
    SurvivalPoint,
};

pub use staging::{
    Axis, EncodedStage, StageError, StageSelection, StagingError, StagingScheme,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
