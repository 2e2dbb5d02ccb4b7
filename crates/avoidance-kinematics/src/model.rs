//! The [`RobotModel`] seam.
//!
//! The avoidance signal never computes kinematics or dynamics itself; it asks
//! a model for them through this trait.  Every query is evaluated at an
//! explicit joint configuration `q`, so implementations are free to cache
//! internally but the signal never relies on cached state.

use avoidance_types::{AvoidanceError, Frame};
use nalgebra::{DMatrix, Matrix4, Point3, Vector3};

/// Kinematic and dynamic queries a serial manipulator must answer.
///
/// Links and joints are indexed `0..num_joints()`.  Link `i` is the body
/// rotated by joint `i`; segment `i` of the arm runs from the origin of joint
/// `i` to the origin of joint `i + 1`, or to [`Frame::EndEffector`] for the
/// last joint.
pub trait RobotModel {
    /// Number of actuated joints (N).
    fn num_joints(&self) -> usize;

    /// Joint-space inertia matrix `Mq(q)` (N×N).
    fn mass_matrix(&self, q: &[f64]) -> Result<DMatrix<f64>, AvoidanceError>;

    /// World position of `frame` at `q`.
    fn frame_position(&self, frame: Frame, q: &[f64]) -> Result<Point3<f64>, AvoidanceError>;

    /// Inverse homogeneous transform (world → link-local) of link `link` at `q`.
    fn link_inverse_transform(&self, link: usize, q: &[f64])
        -> Result<Matrix4<f64>, AvoidanceError>;

    /// Jacobian (6×N) of the point `offset` (expressed in link `link`'s frame).
    ///
    /// Rows `0..3` map joint velocities to the point's linear velocity, rows
    /// `3..6` to the link's angular velocity.
    fn point_jacobian(
        &self,
        link: usize,
        offset: &Vector3<f64>,
        q: &[f64],
    ) -> Result<DMatrix<f64>, AvoidanceError>;
}

/// Return [`AvoidanceError::DimensionMismatch`] unless `q` has one value per
/// joint of `model`.
pub fn check_joint_count<M: RobotModel + ?Sized>(
    model: &M,
    q: &[f64],
) -> Result<(), AvoidanceError> {
    let expected = model.num_joints();
    if q.len() != expected {
        return Err(AvoidanceError::DimensionMismatch {
            expected,
            actual: q.len(),
        });
    }
    Ok(())
}

/// The frame where segment `segment` ends.
pub fn segment_end(num_joints: usize, segment: usize) -> Frame {
    if segment + 1 == num_joints {
        Frame::EndEffector
    } else {
        Frame::Joint(segment + 1)
    }
}
