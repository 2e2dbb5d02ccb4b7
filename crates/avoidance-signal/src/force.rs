//! Repulsive potential-field force law (Khatib, 1987).
//!
//! ```text
//! F = η (1/ρ − 1/ρ₀) (1/ρ²) ∂ρ/∂x,   ∂ρ/∂x = (v − x) / ρ
//! ```
//!
//! for clearance ρ < ρ₀, zero otherwise.

use nalgebra::{Point3, Vector3};

use crate::config::AvoidanceConfig;

/// Cartesian repulsive force on the arm point `closest` due to an obstacle
/// centred at `center`, or `None` when the clearance `rho` is not below the
/// threshold (a NaN clearance is never in range).
pub fn repulsive_force(
    center: &Point3<f64>,
    closest: &Point3<f64>,
    rho: f64,
    config: &AvoidanceConfig,
) -> Option<Vector3<f64>> {
    if rho.is_nan() || rho >= config.threshold {
        return None;
    }

    let rho = match config.min_clearance {
        Some(floor) => rho.max(floor),
        None => rho,
    };

    let drho_dx = (center - closest) / rho;
    Some(drho_dx * (config.gain * (1.0 / rho - 1.0 / config.threshold) / (rho * rho)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn force_at(rho: f64, config: &AvoidanceConfig) -> Option<Vector3<f64>> {
        // Point obstacle straight above the closest point.
        let closest = Point3::new(0.5, 0.0, 0.0);
        let center = Point3::new(0.5, rho, 0.0);
        repulsive_force(&center, &closest, rho, config)
    }

    #[test]
    fn closed_form_magnitude() {
        let cfg = AvoidanceConfig::default();
        // 0.02 * (1/0.1 - 1/0.2) / 0.1² = 10
        let f = force_at(0.1, &cfg).unwrap();
        assert!((f.norm() - 10.0).abs() < 1e-12);
        assert!(f.y > 0.0 && f.x == 0.0 && f.z == 0.0);
    }

    #[test]
    fn at_or_beyond_threshold_is_inactive() {
        let cfg = AvoidanceConfig::default();
        assert!(force_at(0.2, &cfg).is_none());
        assert!(force_at(0.5, &cfg).is_none());
        assert!(
            repulsive_force(&Point3::origin(), &Point3::origin(), f64::NAN, &cfg).is_none()
        );
    }

    #[test]
    fn vanishes_continuously_at_threshold() {
        let cfg = AvoidanceConfig::default();
        let mut last = f64::INFINITY;
        for eps in [1e-2, 1e-4, 1e-6, 1e-9] {
            let mag = force_at(cfg.threshold - eps, &cfg).unwrap().norm();
            assert!(mag < last, "magnitude must shrink toward the threshold");
            last = mag;
        }
        assert!(last < 1e-6, "|F| = {last}");
    }

    #[test]
    fn grows_as_clearance_shrinks() {
        let cfg = AvoidanceConfig::default();
        let near = force_at(0.02, &cfg).unwrap().norm();
        let far = force_at(0.15, &cfg).unwrap().norm();
        assert!(near > far);
    }

    #[test]
    fn zero_clearance_is_not_finite_without_floor() {
        let cfg = AvoidanceConfig::default();
        let p = Point3::new(0.3, 0.0, 0.0);
        let f = repulsive_force(&p, &p, 0.0, &cfg).unwrap();
        assert!(f.iter().any(|v| !v.is_finite()));
    }

    #[test]
    fn floor_only_changes_clearances_below_it() {
        let plain = AvoidanceConfig::default();
        let floored = AvoidanceConfig {
            min_clearance: Some(0.01),
            ..plain
        };
        assert_eq!(force_at(0.1, &plain), force_at(0.1, &floored));

        let p = Point3::new(0.3, 0.0, 0.0);
        let f = repulsive_force(&p, &p, 0.0, &floored).unwrap();
        assert!(f.iter().all(|v| v.is_finite()));
    }
}
