//! `avoidance-signal` – potential-field obstacle avoidance (Khatib, 1987).
//!
//! Produces a joint-space force that biases a serial manipulator away from
//! spherical obstacles while it executes its primary task.  The signal is a
//! pure function of the joint configuration, the obstacle set and the robot
//! model at that configuration.
//!
//! # Modules
//!
//! - [`config`] – [`AvoidanceConfig`][config::AvoidanceConfig]: threshold,
//!   gain, singularity cut-off and the policies for degenerate geometry.
//! - [`geometry`] – [`Segment`][geometry::Segment]: closest point of approach
//!   between an arm segment and an obstacle.
//! - [`force`] – [`repulsive_force`][force::repulsive_force]: the Cartesian
//!   force law.
//! - [`projection`] – task-space inertia projection with singular-value
//!   filtering.
//! - [`generator`] – [`ObstacleAvoidance`][generator::ObstacleAvoidance]:
//!   accumulates every in-range (obstacle, segment) pair into one joint-space
//!   vector.

pub mod config;
pub mod force;
pub mod generator;
pub mod geometry;
pub mod projection;

pub use config::{AvoidanceConfig, DegenerateSegment};
pub use generator::{ObstacleAvoidance, PairClearance, PairContribution};
pub use geometry::{ClosestPoint, Segment};
