//! Dashboard configuration
//!
//! Read from a YAML document; every field has a default so the file may be
//! partial or absent. Connection parameters can be overridden from the
//! environment by the binaries.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid YAML for this schema
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub remote: RemoteConfig,
    pub analysis: AnalysisConfig,
    pub http: HttpConfig,
    /// Staging (TNM common data model) document
    pub staging_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            analysis: AnalysisConfig::default(),
            http: HttpConfig::default(),
            staging_path: PathBuf::from("input/cdm.json"),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        info!(path = %path.display(), "Loaded dashboard config");
        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Connection parameters of the remote task service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub server_url: String,
    pub server_port: u16,
    pub server_api: String,
    pub username: String,
    pub password: String,
    /// Upper bound for every remote call, in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost".to_string(),
            server_port: 5000,
            server_api: "/api".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    /// `{server_url}:{server_port}{server_api}` without a trailing slash
    pub fn base_url(&self) -> String {
        let url = self.server_url.trim_end_matches('/');
        let api = self.server_api.trim_end_matches('/');
        if api.is_empty() || api.starts_with('/') {
            format!("{}:{}{}", url, self.server_port, api)
        } else {
            format!("{}:{}/{}", url, self.server_port, api)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parameters of the federated similarity task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub collaboration_id: u64,
    pub organizations: Vec<u64>,
    /// Number of clusters
    pub k: u32,
    /// Convergence tolerance
    pub epsilon: f64,
    pub max_iter: u32,
    pub columns: Vec<String>,
    pub task_name: String,
    pub image: String,
    pub description: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            collaboration_id: 2,
            organizations: vec![7, 8],
            k: 4,
            epsilon: 0.01,
            max_iter: 50,
            columns: vec!["t_num".to_string(), "n_num".to_string(), "m_num".to_string()],
            task_name: "v6-healthai-patient-similarity-py".to_string(),
            image: "aiaragomes/v6-healthai-paient-similarity-py:latest".to_string(),
            description: "run tnm patient similarity".to_string(),
        }
    }
}

/// Dashboard HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8050,
        }
    }
}
