//! Task-space inertia projection.
//!
//! A Cartesian force applied at a point on the arm is mapped into joint space
//! through the apparent inertia at that point, so the result is dynamically
//! consistent with the arm's mass distribution:
//!
//! ```text
//! Λ⁻¹ = Jp Mq⁺ Jpᵀ        Λ = filtered (Λ⁻¹)⁺        u = −Jpᵀ Λ F
//! ```

use avoidance_types::AvoidanceError;
use nalgebra::{DMatrix, DVector, Vector3};

/// Relative cut-off used by [`pseudo_inverse`]: singular values at or below
/// `PINV_RCOND * σ_max` are treated as zero.
pub const PINV_RCOND: f64 = 1e-15;

/// Sweep limit for the SVD iteration. A matrix that has not converged by then
/// is reported as a numerical failure.
pub const SVD_MAX_ITERATIONS: usize = 1000;

fn ensure_finite(m: &DMatrix<f64>, what: &str) -> Result<(), AvoidanceError> {
    if m.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AvoidanceError::Numerical(format!("{what} has non-finite entries")))
    }
}

/// Invert the singular spectrum of `m` with `invert` and rebuild `V S' Uᵀ`.
///
/// `invert` receives each singular value and the largest one.
fn svd_reconstruct(
    m: &DMatrix<f64>,
    what: &str,
    invert: impl Fn(f64, f64) -> f64,
) -> Result<DMatrix<f64>, AvoidanceError> {
    ensure_finite(m, what)?;
    let svd = m
        .clone()
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or_else(|| AvoidanceError::Numerical(format!("SVD of {what} did not converge")))?;
    let u = svd
        .u
        .ok_or_else(|| AvoidanceError::Numerical("SVD did not produce U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| AvoidanceError::Numerical("SVD did not produce Vᵀ".to_string()))?;
    let s_max = svd.singular_values.max();
    let s = svd.singular_values.map(|s| invert(s, s_max));
    let inverse = v_t.transpose() * DMatrix::from_diagonal(&s) * u.transpose();
    ensure_finite(&inverse, what)?;
    Ok(inverse)
}

/// Moore–Penrose pseudo-inverse of `m`.
///
/// Fails with [`AvoidanceError::Numerical`] when `m` or its inverse is not
/// finite, e.g. for a subnormal mass matrix whose reciprocal overflows.
pub fn pseudo_inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>, AvoidanceError> {
    if m.is_empty() {
        return Ok(m.transpose());
    }
    svd_reconstruct(m, "pseudo-inverse", |s, s_max| {
        if s > PINV_RCOND * s_max { 1.0 / s } else { 0.0 }
    })
}

/// Inverse of the task-space mobility `mx_inv` with unreliable directions
/// removed: each singular value `s` becomes `0` if `s < singularity_threshold`
/// and `1/s` otherwise.
pub fn filtered_inverse(
    mx_inv: &DMatrix<f64>,
    singularity_threshold: f64,
) -> Result<DMatrix<f64>, AvoidanceError> {
    svd_reconstruct(mx_inv, "task-space inertia", |s, _| {
        if s < singularity_threshold { 0.0 } else { 1.0 / s }
    })
}

/// Joint-space contribution `−Jpᵀ Λ F` of the Cartesian force `force`.
///
/// `jp` is the 3×N positional Jacobian of the point the force acts on and
/// `mq_pinv` the pseudo-inverse of the joint-space inertia matrix.
pub fn project_force(
    jp: &DMatrix<f64>,
    mq_pinv: &DMatrix<f64>,
    force: &Vector3<f64>,
    singularity_threshold: f64,
) -> Result<DVector<f64>, AvoidanceError> {
    let mx_inv = jp * mq_pinv * jp.transpose();
    let mx = filtered_inverse(&mx_inv, singularity_threshold)?;
    let f = DVector::from_column_slice(force.as_slice());
    Ok(-(jp.transpose() * (mx * f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Rotation3};

    fn to_dmatrix(m: &Matrix3<f64>) -> DMatrix<f64> {
        DMatrix::from_column_slice(3, 3, m.as_slice())
    }

    fn rotation() -> Matrix3<f64> {
        Rotation3::from_euler_angles(0.3, -0.8, 1.1).into_inner()
    }

    #[test]
    fn pseudo_inverse_of_invertible_matrix_is_inverse() {
        let m = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 0.5, 0.0, 0.5, 2.0]);
        let pinv = pseudo_inverse(&m).unwrap();
        let identity = &m * &pinv;
        assert!((identity - DMatrix::identity(3, 3)).norm() < 1e-12);
    }

    #[test]
    fn pseudo_inverse_of_singular_matrix_satisfies_penrose() {
        // Rank 1.
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let pinv = pseudo_inverse(&m).unwrap();
        assert!((&m * &pinv * &m - &m).norm() < 1e-12);
        assert!((&pinv * &m * &pinv - &pinv).norm() < 1e-12);
        // (1/25) m for this symmetric rank-1 case.
        assert!((pinv - &m / 25.0).norm() < 1e-12);
    }

    #[test]
    fn pseudo_inverse_rejects_non_finite_input() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 1.0]);
        assert!(matches!(
            pseudo_inverse(&m),
            Err(AvoidanceError::Numerical(_))
        ));
    }

    #[test]
    fn pseudo_inverse_rejects_overflowing_inverse() {
        // 1 / 3.3e-311 overflows to infinity.
        let m = DMatrix::from_element(1, 1, 3.3e-311);
        assert!(matches!(
            pseudo_inverse(&m),
            Err(AvoidanceError::Numerical(_))
        ));
    }

    #[test]
    fn filtered_inverse_rejects_non_finite_input() {
        let mut m = to_dmatrix(&Matrix3::identity());
        m[(1, 2)] = f64::NAN;
        assert!(matches!(
            filtered_inverse(&m, 0.00025),
            Err(AvoidanceError::Numerical(_))
        ));
        m[(1, 2)] = f64::INFINITY;
        assert!(matches!(
            filtered_inverse(&m, 0.00025),
            Err(AvoidanceError::Numerical(_))
        ));
    }

    #[test]
    fn project_force_rejects_non_finite_jacobian() {
        let jp = DMatrix::from_column_slice(3, 1, &[0.0, f64::NAN, 0.0]);
        let mq_pinv = DMatrix::from_element(1, 1, 3.0);
        assert!(matches!(
            project_force(&jp, &mq_pinv, &Vector3::new(0.0, 1.0, 0.0), 0.00025),
            Err(AvoidanceError::Numerical(_))
        ));
    }

    #[test]
    fn filtered_inverse_inverts_well_conditioned_spectrum() {
        let r = rotation();
        let mx_inv = r * Matrix3::from_diagonal(&Vector3::new(2.0, 0.5, 0.01)) * r.transpose();
        let mx = filtered_inverse(&to_dmatrix(&mx_inv), 0.00025).unwrap();
        let expected = r * Matrix3::from_diagonal(&Vector3::new(0.5, 2.0, 100.0)) * r.transpose();
        assert!((mx - to_dmatrix(&expected)).norm() < 1e-9);
    }

    #[test]
    fn filtered_inverse_suppresses_near_singular_direction() {
        let r = rotation();
        let mx_inv = r * Matrix3::from_diagonal(&Vector3::new(2.0, 0.5, 1e-5)) * r.transpose();
        let mx = filtered_inverse(&to_dmatrix(&mx_inv), 0.00025).unwrap();

        let weak = DVector::from_iterator(3, r.column(2).iter().copied());
        let strong = DVector::from_iterator(3, r.column(0).iter().copied());

        assert!((&mx * &weak).norm() < 1e-9, "gain along the singular direction");
        assert!((&mx * &strong - &strong * 0.5).norm() < 1e-9);
    }

    #[test]
    fn projection_matches_hand_computation() {
        // One joint, point 0.5 m out on a rod: Jp = [0, 0.5, 0]ᵀ, Mq = 1/3.
        let jp = DMatrix::from_column_slice(3, 1, &[0.0, 0.5, 0.0]);
        let mq_pinv = pseudo_inverse(&DMatrix::from_element(1, 1, 1.0 / 3.0)).unwrap();
        let u = project_force(&jp, &mq_pinv, &Vector3::new(0.0, 10.0, 0.0), 0.00025).unwrap();
        // Λ along y = 1 / (0.25 * 3) = 4/3, u = −0.5 * 4/3 * 10
        assert_eq!(u.len(), 1);
        assert!((u[0] + 20.0 / 3.0).abs() < 1e-9, "u = {}", u[0]);
    }

    #[test]
    fn force_in_unreachable_direction_has_no_effect() {
        let jp = DMatrix::from_column_slice(3, 1, &[0.0, 0.5, 0.0]);
        let mq_pinv = DMatrix::from_element(1, 1, 3.0);
        let u = project_force(&jp, &mq_pinv, &Vector3::new(0.0, 0.0, 7.0), 0.00025).unwrap();
        assert!(u[0].abs() < 1e-12);
    }
}
