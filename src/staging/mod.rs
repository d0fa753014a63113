//! TNM staging scheme
//!
//! Loads the common data model document that lists, for each clinical axis
//! (T, N, M), the ordered category labels. The ordinal of a label is its
//! position in that list, which is the numeric encoding the remote
//! clustering algorithm works in.

pub mod scheme;

use std::fmt;
use thiserror::Error;

pub use scheme::{AxisScale, EncodedStage, StageSelection, StagingScheme};

/// One of the three TNM axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Tumor size
    T,
    /// Lymph node involvement
    N,
    /// Metastasis
    M,
}

impl Axis {
    /// All axes in encoding order
    pub const ALL: [Axis; 3] = [Axis::T, Axis::N, Axis::M];

    /// Section name in the staging document
    pub fn key(&self) -> &'static str {
        match self {
            Axis::T => "t",
            Axis::N => "n",
            Axis::M => "m",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::T => write!(f, "T"),
            Axis::N => write!(f, "N"),
            Axis::M => write!(f, "M"),
        }
    }
}

/// Errors raised while loading the staging document. Fatal at startup.
#[derive(Error, Debug)]
pub enum StagingError {
    /// Document could not be read
    #[error("Failed to read staging document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON or has the wrong shape
    #[error("Malformed staging document: {0}")]
    Parse(#[from] serde_json::Error),

    /// An axis lists no categories
    #[error("Staging axis {0} has no categories")]
    EmptyAxis(Axis),

    /// A label appears twice on the same axis
    #[error("Staging axis {axis} lists {label:?} more than once")]
    DuplicateLabel { axis: Axis, label: String },
}

pub type StagingResult<T> = Result<T, StagingError>;

/// Errors raised while encoding a clinician-entered stage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// No label selected for an axis
    #[error("No {0} stage selected")]
    MissingSelection(Axis),

    /// Label is not part of the staging scheme
    #[error("Invalid {axis} stage: {label:?} is not in the staging scheme")]
    InvalidStage { axis: Axis, label: String },
}

pub type StageResult<T> = Result<T, StageError>;
