//! Reference serial-arm model.
//!
//! [`SerialArm`] is a chain of revolute joints with lumped link masses.  It
//! implements [`RobotModel`] so the avoidance signal can be driven without an
//! external dynamics library.
//!
//! # Example
//!
//! ```rust
//! use avoidance_kinematics::{RobotModel, SerialArm};
//! use avoidance_types::Frame;
//!
//! // Two 0.5 m links lying along +X.
//! let arm = SerialArm::planar(&[0.5, 0.5], &[1.0, 1.0]).unwrap();
//! let ee = arm.frame_position(Frame::EndEffector, &[0.0, 0.0]).unwrap();
//! assert!((ee.x - 1.0).abs() < 1e-12);
//! ```

use avoidance_types::{AvoidanceError, Frame};
use nalgebra::{
    DMatrix, Isometry3, Matrix3, Matrix4, Point3, Translation3, Unit, UnitQuaternion, Vector3,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{RobotModel, check_joint_count};

// ────────────────────────────────────────────────────────────────────────────
// Arm description (serde)
// ────────────────────────────────────────────────────────────────────────────

/// Serialisable description of one revolute joint and the link it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    /// Offset of this joint from the previous link frame (metres).
    #[serde(default)]
    pub translation: [f64; 3],
    /// Fixed roll/pitch/yaw of this joint relative to the previous link frame.
    #[serde(default)]
    pub rpy: [f64; 3],
    /// Rotation axis in the joint frame.
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    /// Link mass (kg).
    #[serde(default)]
    pub mass: f64,
    /// Link centre of mass in the link frame.
    #[serde(default)]
    pub center_of_mass: [f64; 3],
    /// Principal moments of inertia about the centre of mass (link frame).
    #[serde(default)]
    pub inertia: [f64; 3],
}

fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

/// Serialisable description of a [`SerialArm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSpec {
    /// End-effector position in the last link frame.
    #[serde(default)]
    pub end_effector: [f64; 3],
    /// Joints from base to tip.
    pub joints: Vec<JointSpec>,
}

// ────────────────────────────────────────────────────────────────────────────
// SerialArm
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RevoluteJoint {
    origin: Isometry3<f64>,
    axis: Unit<Vector3<f64>>,
    mass: f64,
    center_of_mass: Vector3<f64>,
    inertia: Matrix3<f64>,
}

/// A serial chain of revolute joints.
///
/// Link `i`'s frame is joint `i`'s frame after rotating by `q[i]` about the
/// joint axis, so the joint origin and the link origin coincide.
#[derive(Debug, Clone)]
pub struct SerialArm {
    joints: Vec<RevoluteJoint>,
    ee_offset: Isometry3<f64>,
}

impl SerialArm {
    /// Build an arm from its serialisable description.
    pub fn from_spec(spec: &ArmSpec) -> Result<Self, AvoidanceError> {
        if spec.joints.is_empty() {
            return Err(AvoidanceError::InvalidModel(
                "arm has no joints".to_string(),
            ));
        }

        let mut joints = Vec::with_capacity(spec.joints.len());
        for (i, j) in spec.joints.iter().enumerate() {
            let axis = Unit::try_new(Vector3::from(j.axis), 1e-12).ok_or_else(|| {
                AvoidanceError::InvalidModel(format!("joint{i} has a zero-length axis"))
            })?;
            if !(j.mass >= 0.0) {
                return Err(AvoidanceError::InvalidModel(format!(
                    "joint{i} link mass {} is negative",
                    j.mass
                )));
            }
            let [roll, pitch, yaw] = j.rpy;
            joints.push(RevoluteJoint {
                origin: Isometry3::from_parts(
                    Translation3::from(Vector3::from(j.translation)),
                    UnitQuaternion::from_euler_angles(roll, pitch, yaw),
                ),
                axis,
                mass: j.mass,
                center_of_mass: Vector3::from(j.center_of_mass),
                inertia: Matrix3::from_diagonal(&Vector3::from(j.inertia)),
            });
        }

        debug!(joints = joints.len(), "built serial arm");

        Ok(Self {
            joints,
            ee_offset: Isometry3::translation(
                spec.end_effector[0],
                spec.end_effector[1],
                spec.end_effector[2],
            ),
        })
    }

    /// A planar arm: every axis along world Z, links lying along their local
    /// +X, each link a uniform rod with its mass at mid-length.
    pub fn planar(lengths: &[f64], masses: &[f64]) -> Result<Self, AvoidanceError> {
        Self::from_spec(&ArmSpec::planar(lengths, masses)?)
    }

    /// World poses of every link frame at `q`.
    pub fn link_frames(&self, q: &[f64]) -> Result<Vec<Isometry3<f64>>, AvoidanceError> {
        check_joint_count(self, q)?;
        let mut frames = Vec::with_capacity(self.joints.len());
        let mut t = Isometry3::identity();
        for (joint, &angle) in self.joints.iter().zip(q) {
            let rotation = Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&joint.axis, angle),
            );
            t = t * joint.origin * rotation;
            frames.push(t);
        }
        Ok(frames)
    }

    fn link_index(&self, link: usize) -> Result<usize, AvoidanceError> {
        if link < self.joints.len() {
            Ok(link)
        } else {
            Err(AvoidanceError::UnknownFrame(Frame::Link(link).to_string()))
        }
    }

    /// 6×N Jacobian of `offset` on `link`, given precomputed link frames.
    fn jacobian_from_frames(
        &self,
        frames: &[Isometry3<f64>],
        link: usize,
        offset: &Vector3<f64>,
    ) -> DMatrix<f64> {
        let n = self.joints.len();
        let mut jac = DMatrix::zeros(6, n);
        let p = frames[link] * Point3::from(*offset);

        for j in 0..=link {
            let z = frames[j].rotation * self.joints[j].axis.into_inner();
            let o = frames[j].translation.vector;
            let lin = z.cross(&(p.coords - o));
            for r in 0..3 {
                jac[(r, j)] = lin[r];
                jac[(r + 3, j)] = z[r];
            }
        }
        jac
    }
}

impl ArmSpec {
    /// Description of the arm built by [`SerialArm::planar`].
    pub fn planar(lengths: &[f64], masses: &[f64]) -> Result<Self, AvoidanceError> {
        if lengths.len() != masses.len() {
            return Err(AvoidanceError::InvalidModel(format!(
                "{} link lengths but {} link masses",
                lengths.len(),
                masses.len()
            )));
        }

        let links: Vec<(f64, f64)> = lengths.iter().copied().zip(masses.iter().copied()).collect();
        Ok(Self::planar_links(&links))
    }

    /// Planar arm from `(length, mass)` pairs, base to tip.
    pub fn planar_links(links: &[(f64, f64)]) -> Self {
        let joints = links
            .iter()
            .enumerate()
            .map(|(i, &(len, mass))| {
                let rod = mass * len * len / 12.0;
                JointSpec {
                    translation: if i == 0 {
                        [0.0; 3]
                    } else {
                        [links[i - 1].0, 0.0, 0.0]
                    },
                    rpy: [0.0; 3],
                    axis: default_axis(),
                    mass,
                    center_of_mass: [len / 2.0, 0.0, 0.0],
                    inertia: [0.0, rod, rod],
                }
            })
            .collect();

        Self {
            joints,
            end_effector: [links.last().map_or(0.0, |&(len, _)| len), 0.0, 0.0],
        }
    }
}

impl RobotModel for SerialArm {
    fn num_joints(&self) -> usize {
        self.joints.len()
    }

    fn mass_matrix(&self, q: &[f64]) -> Result<DMatrix<f64>, AvoidanceError> {
        let frames = self.link_frames(q)?;
        let n = self.joints.len();
        let mut mq = DMatrix::zeros(n, n);

        for (i, joint) in self.joints.iter().enumerate() {
            let jac = self.jacobian_from_frames(&frames, i, &joint.center_of_mass);
            let jv = jac.rows(0, 3).into_owned();
            let jw = jac.rows(3, 3).into_owned();

            let r = frames[i].rotation.to_rotation_matrix().into_inner();
            let inertia_world = r * joint.inertia * r.transpose();
            let inertia_world = DMatrix::from_column_slice(3, 3, inertia_world.as_slice());

            mq += jv.transpose() * &jv * joint.mass;
            mq += jw.transpose() * inertia_world * &jw;
        }
        Ok(mq)
    }

    fn frame_position(&self, frame: Frame, q: &[f64]) -> Result<Point3<f64>, AvoidanceError> {
        let frames = self.link_frames(q)?;
        let pose = match frame {
            Frame::Joint(i) | Frame::Link(i) => {
                let i = self
                    .link_index(i)
                    .map_err(|_| AvoidanceError::UnknownFrame(frame.to_string()))?;
                frames[i]
            }
            Frame::EndEffector => match frames.last() {
                Some(last) => last * self.ee_offset,
                None => return Err(AvoidanceError::UnknownFrame(frame.to_string())),
            },
        };
        Ok(Point3::from(pose.translation.vector))
    }

    fn link_inverse_transform(
        &self,
        link: usize,
        q: &[f64],
    ) -> Result<Matrix4<f64>, AvoidanceError> {
        let frames = self.link_frames(q)?;
        let link = self.link_index(link)?;
        Ok(frames[link].inverse().to_homogeneous())
    }

    fn point_jacobian(
        &self,
        link: usize,
        offset: &Vector3<f64>,
        q: &[f64],
    ) -> Result<DMatrix<f64>, AvoidanceError> {
        let frames = self.link_frames(q)?;
        let link = self.link_index(link)?;
        Ok(self.jacobian_from_frames(&frames, link, offset))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
