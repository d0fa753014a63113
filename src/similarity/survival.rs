//! Survival profile of a matched cluster as a renderable time series

use super::ClusterModel;
use serde::{Deserialize, Serialize};

/// Time units between consecutive profile samples
pub const TIME_STEP: u32 = 30;

/// One sample of a survival curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalPoint {
    pub time: u32,
    pub probability: f64,
}

/// Survival probability over time for one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    pub cluster: usize,
    pub points: Vec<SurvivalPoint>,
}

impl SurvivalCurve {
    /// Sample `i` of the profile is placed at time `i * TIME_STEP`.
    /// Returns `None` when the cluster index is out of range.
    pub fn for_cluster(model: &ClusterModel, cluster: usize) -> Option<Self> {
        let profile = model.profiles().get(cluster)?;
        let points = profile
            .iter()
            .zip((0u32..).step_by(TIME_STEP as usize))
            .map(|(&probability, time)| SurvivalPoint { time, probability })
            .collect();

        Some(Self { cluster, points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Line chart description for the dashboard
    pub fn chart(&self) -> ChartSpec {
        ChartSpec {
            title: "Survival profile for similar patients".to_string(),
            x_label: "survival days".to_string(),
            y_label: "survival rate".to_string(),
            y_range: [0.0, 1.0],
            cluster: self.cluster,
            points: self.points.clone(),
        }
    }
}

/// Line chart: time on x, survival probability on y with a fixed [0, 1] range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_range: [f64; 2],
    pub cluster: usize,
    pub points: Vec<SurvivalPoint>,
}
