use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A spherical obstacle the arm should be pushed away from.
///
/// Obstacles are plain values: they carry no identity and are only meaningful
/// for the duration of the call that receives them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre of the obstacle in world coordinates.
    pub center: Point3<f64>,
    /// Radius of the obstacle (≥ 0). The force law does not read it; callers
    /// taking obstacles from outside check it with [`Obstacle::validate`].
    #[serde(default)]
    pub radius: f64,
}

impl Obstacle {
    /// Create an obstacle from its centre coordinates and radius.
    pub fn new(x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            center: Point3::new(x, y, z),
            radius,
        }
    }

    /// A point obstacle (zero radius).
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 0.0)
    }

    /// Reject non-finite coordinates and negative or NaN radii.
    pub fn validate(&self) -> Result<(), AvoidanceError> {
        if !self.center.iter().all(|c| c.is_finite()) {
            return Err(AvoidanceError::InvalidObstacle(format!(
                "centre {} is not finite",
                self.center
            )));
        }
        if !(self.radius >= 0.0) {
            return Err(AvoidanceError::InvalidObstacle(format!(
                "radius {} is negative or NaN",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Flat `[x, y, z, radius]` layout used by obstacle lists coming from
/// trackers and scenario files.
impl From<[f64; 4]> for Obstacle {
    fn from([x, y, z, radius]: [f64; 4]) -> Self {
        Self::new(x, y, z, radius)
    }
}

impl From<Obstacle> for [f64; 4] {
    fn from(o: Obstacle) -> Self {
        [o.center.x, o.center.y, o.center.z, o.radius]
    }
}

/// A named reference frame on the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frame {
    /// Origin of joint `i` (where segment `i` starts).
    Joint(usize),
    /// Body frame of link `i`, which moves with joint `i`.
    Link(usize),
    /// The end-effector (where the last segment ends).
    EndEffector,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Joint(i) => write!(f, "joint{i}"),
            Frame::Link(i) => write!(f, "link{i}"),
            Frame::EndEffector => write!(f, "EE"),
        }
    }
}

/// Error type shared by the robot model, the avoidance signal and the CLI.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AvoidanceError {
    #[error("Dimension mismatch: expected {expected} joint values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown frame: {0}")]
    UnknownFrame(String),

    #[error("Invalid robot model: {0}")]
    InvalidModel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid obstacle: {0}")]
    InvalidObstacle(String),

    #[error("Numerical failure: {0}")]
    Numerical(String),
}
