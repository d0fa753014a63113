//! Staging scheme loading and stage encoding

use super::{Axis, StageError, StageResult, StagingError, StagingResult};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Ordered category labels of one axis.
///
/// Lookups go both ways: label to ordinal and ordinal to label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisScale {
    axis: Axis,
    labels: IndexSet<String>,
}

impl AxisScale {
    /// Build a scale from labels in ordinal order
    pub fn new(axis: Axis, labels: Vec<String>) -> StagingResult<Self> {
        if labels.is_empty() {
            return Err(StagingError::EmptyAxis(axis));
        }

        let mut set = IndexSet::with_capacity(labels.len());
        for label in labels {
            if set.contains(&label) {
                return Err(StagingError::DuplicateLabel { axis, label });
            }
            set.insert(label);
        }

        Ok(Self { axis, labels: set })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Ordinal value of a label
    pub fn ordinal(&self, label: &str) -> Option<usize> {
        self.labels.get_index_of(label)
    }

    /// Label at an ordinal position
    pub fn label(&self, ordinal: usize) -> Option<&str> {
        self.labels.get_index(ordinal).map(|s| s.as_str())
    }

    /// Labels in ordinal order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn encode(&self, label: Option<&str>) -> StageResult<usize> {
        let label = match label.map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => return Err(StageError::MissingSelection(self.axis)),
        };

        self.ordinal(label).ok_or_else(|| StageError::InvalidStage {
            axis: self.axis,
            label: label.to_string(),
        })
    }
}

/// A section of the staging document.
///
/// The common data model nests the labels under `values`; a bare list is
/// accepted as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum AxisSection {
    Nested { values: Vec<String> },
    Bare(Vec<String>),
}

impl AxisSection {
    fn into_labels(self) -> Vec<String> {
        match self {
            AxisSection::Nested { values } => values,
            AxisSection::Bare(values) => values,
        }
    }
}

#[derive(Deserialize)]
struct StagingDocument {
    t: AxisSection,
    n: AxisSection,
    m: AxisSection,
}

/// Categorical-to-ordinal mapping for the T, N and M axes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingScheme {
    t: AxisScale,
    n: AxisScale,
    m: AxisScale,
}

impl StagingScheme {
    /// Build a scheme from label lists
    pub fn new(t: Vec<String>, n: Vec<String>, m: Vec<String>) -> StagingResult<Self> {
        Ok(Self {
            t: AxisScale::new(Axis::T, t)?,
            n: AxisScale::new(Axis::N, n)?,
            m: AxisScale::new(Axis::M, m)?,
        })
    }

    /// Load the staging document from disk
    pub fn load(path: impl AsRef<Path>) -> StagingResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StagingError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let scheme = Self::from_json_str(&text)?;
        info!(
            path = %path.display(),
            t = scheme.t.len(),
            n = scheme.n.len(),
            m = scheme.m.len(),
            "Loaded staging scheme"
        );
        Ok(scheme)
    }

    /// Parse the staging document from a JSON string
    pub fn from_json_str(text: &str) -> StagingResult<Self> {
        let doc: StagingDocument = serde_json::from_str(text)?;
        Self::new(doc.t.into_labels(), doc.n.into_labels(), doc.m.into_labels())
    }

    pub fn axis(&self, axis: Axis) -> &AxisScale {
        match axis {
            Axis::T => &self.t,
            Axis::N => &self.n,
            Axis::M => &self.m,
        }
    }

    /// Convert a categorical stage to its ordinal encoding.
    ///
    /// Every axis is validated before the result is produced, so an unknown
    /// label never reaches the matcher.
    pub fn encode(&self, selection: &StageSelection) -> StageResult<EncodedStage> {
        Ok(EncodedStage {
            t: self.t.encode(selection.t.as_deref())?,
            n: self.n.encode(selection.n.as_deref())?,
            m: self.m.encode(selection.m.as_deref())?,
        })
    }

    /// Convert an ordinal encoding back to labels
    pub fn decode(&self, stage: &EncodedStage) -> Option<(String, String, String)> {
        Some((
            self.t.label(stage.t)?.to_string(),
            self.n.label(stage.n)?.to_string(),
            self.m.label(stage.m)?.to_string(),
        ))
    }

    /// Dropdown options, keyed by axis section name
    pub fn options(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for axis in Axis::ALL {
            let labels: Vec<&str> = self.axis(axis).labels().collect();
            map.insert(axis.key().to_string(), serde_json::json!(labels));
        }
        serde_json::Value::Object(map)
    }
}

/// Stage labels as entered by the clinician. Unselected axes are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSelection {
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub m: Option<String>,
}

impl StageSelection {
    pub fn new(t: impl Into<String>, n: impl Into<String>, m: impl Into<String>) -> Self {
        Self {
            t: Some(t.into()),
            n: Some(n.into()),
            m: Some(m.into()),
        }
    }

    /// All three axes carry a non-blank label
    pub fn is_complete(&self) -> bool {
        [&self.t, &self.n, &self.m]
            .iter()
            .all(|v| v.as_deref().map_or(false, |s| !s.trim().is_empty()))
    }
}

/// Ordinal TNM encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedStage {
    pub t: usize,
    pub n: usize,
    pub m: usize,
}

impl EncodedStage {
    /// Query point in the clustering feature space
    pub fn as_point(&self) -> [f64; 3] {
        [self.t as f64, self.n as f64, self.m as f64]
    }
}
