//! `avoidance-kinematics` – robot model seam for the avoidance signal.
//!
//! # Modules
//!
//! - [`model`] – [`RobotModel`][model::RobotModel]: the kinematic and dynamic
//!   queries (inertia matrix, frame positions, inverse link transforms, point
//!   Jacobians) the avoidance signal consumes.
//! - [`arm`] – [`SerialArm`][arm::SerialArm]: a revolute serial chain with
//!   lumped link masses implementing [`RobotModel`][model::RobotModel], built
//!   from a serialisable [`ArmSpec`][arm::ArmSpec].

pub mod arm;
pub mod model;

pub use arm::{ArmSpec, JointSpec, SerialArm};
pub use model::{RobotModel, check_joint_count, segment_end};
