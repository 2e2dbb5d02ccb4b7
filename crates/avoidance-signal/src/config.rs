//! Construction-time configuration of the avoidance signal.

use avoidance_types::AvoidanceError;
use serde::{Deserialize, Serialize};

/// Distance beyond which an obstacle exerts no force on a segment.
pub const DEFAULT_THRESHOLD: f64 = 0.2;
/// Gain η of the repulsive force law.
pub const DEFAULT_GAIN: f64 = 0.02;
/// Singular values of the task-space mobility below this are discarded.
pub const DEFAULT_SINGULARITY_THRESHOLD: f64 = 0.00025;

/// What to do with a segment whose two endpoints coincide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateSegment {
    /// The pair contributes nothing.  Same outcome as evaluating the
    /// projection formula unguarded, where the NaN clearance fails the range
    /// check.
    #[default]
    Skip,
    /// Treat the segment as the single point at its start.
    ClosestToStart,
}

/// Immutable parameters of an [`ObstacleAvoidance`][crate::ObstacleAvoidance].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceConfig {
    /// ρ₀: clearance at or beyond which a pair is ignored.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// η: scales the repulsive force magnitude.
    #[serde(default = "default_gain")]
    pub gain: f64,

    /// Cut-off for the singular values of the task-space mobility matrix.
    #[serde(default = "default_singularity_threshold")]
    pub singularity_threshold: f64,

    /// Handling of zero-length segments.
    #[serde(default)]
    pub degenerate_segment: DegenerateSegment,

    /// Optional floor on the clearance used inside the force law.  The range
    /// check always uses the raw clearance.  `None` reproduces the unguarded
    /// law, which diverges at zero clearance and flips for overlaps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_clearance: Option<f64>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_gain() -> f64 {
    DEFAULT_GAIN
}
fn default_singularity_threshold() -> f64 {
    DEFAULT_SINGULARITY_THRESHOLD
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            gain: DEFAULT_GAIN,
            singularity_threshold: DEFAULT_SINGULARITY_THRESHOLD,
            degenerate_segment: DegenerateSegment::default(),
            min_clearance: None,
        }
    }
}

impl AvoidanceConfig {
    /// Default configuration with a different threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Reject parameter values the force law cannot work with.
    pub fn validate(&self) -> Result<(), AvoidanceError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(AvoidanceError::InvalidConfig(format!(
                "threshold must be positive and finite, got {}",
                self.threshold
            )));
        }
        if !self.gain.is_finite() {
            return Err(AvoidanceError::InvalidConfig(format!(
                "gain must be finite, got {}",
                self.gain
            )));
        }
        if !self.singularity_threshold.is_finite() || self.singularity_threshold < 0.0 {
            return Err(AvoidanceError::InvalidConfig(format!(
                "singularity_threshold must be non-negative and finite, got {}",
                self.singularity_threshold
            )));
        }
        if let Some(floor) = self.min_clearance
            && (!floor.is_finite() || floor <= 0.0)
        {
            return Err(AvoidanceError::InvalidConfig(format!(
                "min_clearance must be positive and finite, got {floor}"
            )));
        }
        Ok(())
    }
}
