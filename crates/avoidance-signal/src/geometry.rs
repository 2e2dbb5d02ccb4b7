//! Closest point of approach between an arm segment and an obstacle.

use avoidance_types::Obstacle;
use nalgebra::Point3;

use crate::config::DegenerateSegment;

/// One straight arm segment, from a joint origin to the next joint origin
/// (or the end-effector).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

/// Where a segment comes closest to an obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    /// Nearest point on the segment.
    pub point: Point3<f64>,
    /// Unclamped position of the perpendicular foot along the segment
    /// (0 at `start`, 1 at `end`).
    pub projection: f64,
    /// Clearance: distance from `point` to the obstacle centre minus the
    /// obstacle radius.  Negative when the obstacle overlaps the segment.
    pub rho: f64,
}

impl Segment {
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self { start, end }
    }

    /// Closest point on the segment to `obstacle`'s centre.
    ///
    /// Returns `None` only for a zero-length segment under
    /// [`DegenerateSegment::Skip`].
    pub fn closest_point(
        &self,
        obstacle: &Obstacle,
        degenerate: DegenerateSegment,
    ) -> Option<ClosestPoint> {
        let v = obstacle.center;
        let line = self.end - self.start;
        let length_sq = line.norm_squared();

        let (point, projection) = if length_sq == 0.0 {
            match degenerate {
                DegenerateSegment::Skip => return None,
                DegenerateSegment::ClosestToStart => (self.start, 0.0),
            }
        } else {
            let t = (v - self.start).dot(&line) / length_sq;
            let point = if t < 0.0 {
                self.start
            } else if t > 1.0 {
                self.end
            } else {
                self.start + line * t
            };
            (point, t)
        };

        Some(ClosestPoint {
            point,
            projection,
            rho: (v - point).norm() - obstacle.radius,
        })
    }
}
