//! Exit estimation inside the observation cube
//!
//! Both operations work in the cube's local frame, with the cube centred on the
//! origin and axis aligned.

use glam::DVec3;
use std::f64::consts::PI;

/// Distance along `direction` at which a ray from `position` leaves the cube
/// through one of its X or Z faces
///
/// Each axis gives two plane-crossing parameters; parameters that are not
/// strictly positive (behind the ray, or undefined for a zero component) count
/// as infinite. The result is the smallest X/Z parameter, or
/// [`f64::INFINITY`] when a Y face is reached first (or at the same time).
///
/// # Example
/// ```
/// use decay_chain_core_rs::geometry::distance_to_exit;
/// use glam::DVec3;
///
/// let d = distance_to_exit(DVec3::ZERO, DVec3::X, 1.5e-4);
/// assert!((d - 1.5e-4).abs() < 1e-18);
///
/// assert_eq!(distance_to_exit(DVec3::ZERO, DVec3::Y, 1.5e-4), f64::INFINITY);
/// ```
pub fn distance_to_exit(position: DVec3, direction: DVec3, half_extent: f64) -> f64 {
    let forward = |t: f64| if t > 0.0 { t } else { f64::INFINITY };
    let crossings = |p: f64, d: f64| (forward((-half_extent - p) / d), forward((half_extent - p) / d));

    let (x_neg, x_pos) = crossings(position.x, direction.x);
    let (y_neg, y_pos) = crossings(position.y, direction.y);
    let (z_neg, z_pos) = crossings(position.z, direction.z);

    let distance = x_neg.min(x_pos).min(z_neg).min(z_pos);
    if y_neg <= distance || y_pos <= distance {
        return f64::INFINITY;
    }
    distance
}

/// Express `momentum` in a frame rotated by the polar angle of `position`
///
/// The angle is `asin(x / ρ)` with ρ the XY distance from the axis, corrected
/// per quadrant: kept for y > 0, mirrored to π − θ for (x > 0, y < 0) and
/// shifted to |θ| + π for (x < 0, y < 0). Points on an axis keep the raw
/// angle. The momentum is then rotated in the XY plane; z is unchanged.
/// A position on the axis itself (ρ = 0) leaves the momentum as is.
pub fn reproject_momentum(position: DVec3, momentum: DVec3) -> DVec3 {
    let rho = position.truncate().length();
    if rho == 0.0 {
        return momentum;
    }

    let raw = (position.x / rho).asin();
    let theta = if position.x > 0.0 && position.y < 0.0 {
        PI - raw
    } else if position.x < 0.0 && position.y < 0.0 {
        raw.abs() + PI
    } else {
        raw
    };

    let (sin, cos) = theta.sin_cos();
    DVec3::new(
        momentum.x * cos - momentum.y * sin,
        momentum.x * sin + momentum.y * cos,
        momentum.z,
    )
}
