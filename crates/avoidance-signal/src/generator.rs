//! [`ObstacleAvoidance`] – the joint-space repulsive signal.
//!
//! For every obstacle (in input order) and every arm segment (in index
//! order) the generator finds the closest point of approach, evaluates the
//! repulsive force law, projects the force into joint space through the
//! task-space inertia at that point and adds it to the result.
//!
//! # Example
//!
//! ```rust
//! use avoidance_kinematics::SerialArm;
//! use avoidance_signal::{AvoidanceConfig, ObstacleAvoidance};
//! use avoidance_types::Obstacle;
//!
//! let arm = SerialArm::planar(&[0.5, 0.4], &[1.0, 0.8]).unwrap();
//! let avoidance = ObstacleAvoidance::new(&arm, AvoidanceConfig::default()).unwrap();
//!
//! // Nothing nearby → no push.
//! let u = avoidance.generate(&[0.0, 0.0], &[]).unwrap();
//! assert!(u.iter().all(|v| *v == 0.0));
//!
//! // An obstacle just above the first link pushes joint 0 away from it.
//! let u = avoidance
//!     .generate(&[0.0, 0.0], &[Obstacle::new(0.25, 0.1, 0.0, 0.0)])
//!     .unwrap();
//! assert!(u[0] < 0.0);
//! ```

use avoidance_kinematics::{RobotModel, check_joint_count, segment_end};
use avoidance_types::{AvoidanceError, Frame, Obstacle};
use nalgebra::{DMatrix, DVector, Point3, Vector3};
use tracing::{debug, instrument, trace, warn};

use crate::config::AvoidanceConfig;
use crate::force::repulsive_force;
use crate::geometry::{ClosestPoint, Segment};
use crate::projection::{project_force, pseudo_inverse};

/// The contribution of one in-range (obstacle, segment) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairContribution {
    /// Index of the obstacle in the input list.
    pub obstacle: usize,
    /// Index of the arm segment.
    pub segment: usize,
    /// Closest point on the segment (world frame).
    pub closest: Point3<f64>,
    /// Clearance between the segment and the obstacle surface.
    pub rho: f64,
    /// Cartesian repulsive force at `closest`.
    pub force: Vector3<f64>,
    /// Joint-space contribution (length N).
    pub joint_force: DVector<f64>,
}

/// Clearance of one (obstacle, segment) pair, whether in range or not.
#[derive(Debug, Clone, PartialEq)]
pub struct PairClearance {
    pub obstacle: usize,
    pub segment: usize,
    /// `None` for a zero-length segment skipped by the configured policy.
    pub closest: Option<ClosestPoint>,
}

/// Potential-field obstacle avoidance signal for a serial manipulator.
///
/// Holds only an immutable configuration and a shared reference to the robot
/// model; every call recomputes everything from `q`.
#[derive(Debug)]
pub struct ObstacleAvoidance<'a, M: RobotModel + ?Sized> {
    model: &'a M,
    config: AvoidanceConfig,
}

impl<'a, M: RobotModel + ?Sized> ObstacleAvoidance<'a, M> {
    /// Create a generator after validating `config`.
    pub fn new(model: &'a M, config: AvoidanceConfig) -> Result<Self, AvoidanceError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    /// Create a generator with [`AvoidanceConfig::default`].
    pub fn with_defaults(model: &'a M) -> Self {
        Self {
            model,
            config: AvoidanceConfig::default(),
        }
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &AvoidanceConfig {
        &self.config
    }

    /// Joint-space repulsive force (length N) at configuration `q`.
    #[instrument(level = "debug", skip_all, fields(obstacles = obstacles.len()))]
    pub fn generate(
        &self,
        q: &[f64],
        obstacles: &[Obstacle],
    ) -> Result<DVector<f64>, AvoidanceError> {
        let mut total = DVector::zeros(self.model.num_joints());
        for pair in self.contributions(q, obstacles)? {
            total += pair.joint_force;
        }
        Ok(total)
    }

    /// Per-pair breakdown of [`generate`][Self::generate]: one entry for every
    /// (obstacle, segment) pair within the threshold, in evaluation order.
    pub fn contributions(
        &self,
        q: &[f64],
        obstacles: &[Obstacle],
    ) -> Result<Vec<PairContribution>, AvoidanceError> {
        check_joint_count(self.model, q)?;
        let mut pairs = Vec::new();
        if obstacles.is_empty() {
            return Ok(pairs);
        }

        let mq_pinv = pseudo_inverse(&self.model.mass_matrix(q)?)?;
        let segments = self.segments(q)?;

        for (oi, obstacle) in obstacles.iter().enumerate() {
            for (si, segment) in segments.iter().enumerate() {
                let Some(closest) = segment.closest_point(obstacle, self.config.degenerate_segment)
                else {
                    trace!(obstacle = oi, segment = si, "zero-length segment skipped");
                    continue;
                };
                let Some(force) =
                    repulsive_force(&obstacle.center, &closest.point, closest.rho, &self.config)
                else {
                    trace!(obstacle = oi, segment = si, rho = closest.rho, "out of range");
                    continue;
                };

                let joint_force = self.project(si, &closest.point, &force, &mq_pinv, q)?;
                if joint_force.iter().any(|v| !v.is_finite()) {
                    warn!(
                        obstacle = oi,
                        segment = si,
                        rho = closest.rho,
                        "non-finite avoidance contribution"
                    );
                }
                debug!(
                    obstacle = oi,
                    segment = si,
                    rho = closest.rho,
                    force = force.norm(),
                    "obstacle in range"
                );

                pairs.push(PairContribution {
                    obstacle: oi,
                    segment: si,
                    closest: closest.point,
                    rho: closest.rho,
                    force,
                    joint_force,
                });
            }
        }
        Ok(pairs)
    }

    /// Closest point and clearance for every (obstacle, segment) pair,
    /// regardless of the threshold.
    pub fn clearances(
        &self,
        q: &[f64],
        obstacles: &[Obstacle],
    ) -> Result<Vec<PairClearance>, AvoidanceError> {
        check_joint_count(self.model, q)?;
        let segments = self.segments(q)?;
        Ok(obstacles
            .iter()
            .enumerate()
            .flat_map(|(oi, obstacle)| {
                segments.iter().enumerate().map(move |(si, segment)| PairClearance {
                    obstacle: oi,
                    segment: si,
                    closest: segment.closest_point(obstacle, self.config.degenerate_segment),
                })
            })
            .collect())
    }

    /// Arm segments at `q`, from joint `i` to joint `i + 1` or the end-effector.
    pub fn segments(&self, q: &[f64]) -> Result<Vec<Segment>, AvoidanceError> {
        let n = self.model.num_joints();
        (0..n)
            .map(|i| {
                Ok(Segment::new(
                    self.model.frame_position(Frame::Joint(i), q)?,
                    self.model.frame_position(segment_end(n, i), q)?,
                ))
            })
            .collect()
    }

    /// Joint-space contribution of `force` acting at world point `closest` on
    /// link `link`.
    fn project(
        &self,
        link: usize,
        closest: &Point3<f64>,
        force: &Vector3<f64>,
        mq_pinv: &DMatrix<f64>,
        q: &[f64],
    ) -> Result<DVector<f64>, AvoidanceError> {
        let t_inv = self.model.link_inverse_transform(link, q)?;
        let offset = (t_inv * closest.to_homogeneous()).xyz();

        let jacobian = self.model.point_jacobian(link, &offset, q)?;
        let n = self.model.num_joints();
        if jacobian.nrows() < 3 || jacobian.ncols() != n {
            return Err(AvoidanceError::InvalidModel(format!(
                "{} Jacobian is {}×{}, expected at least 3×{n}",
                Frame::Link(link),
                jacobian.nrows(),
                jacobian.ncols()
            )));
        }
        let jp = jacobian.rows(0, 3).into_owned();

        project_force(&jp, mq_pinv, force, self.config.singularity_threshold)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
