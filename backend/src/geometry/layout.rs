//! Shell layout
//!
//! Target cells sit on ten concentric shells around the seed axis. The shell
//! index doubles as the copy number of every cell placed on it, which is how
//! the stepping core maps a target volume back to its radius.
//!
//! Each shell is populated with rings of cells: one ring every 10 µm in z from
//! −100 µm to +100 µm, cells along a ring spaced by an arc length of 10.5 µm.

use crate::core::units::UM;
use crate::geometry::GeometryError;
use crate::models::tally::RunAggregator;
use glam::DVec3;
use log::debug;
use std::f64::consts::TAU;

/// Number of shells
pub const SHELL_COUNT: usize = 10;

/// Arc length between neighbouring cells on a ring (µm)
pub const CELL_PITCH_UM: f64 = 10.5;

/// z positions of the rings (µm): −100, −90, …, 100
const RING_Z_MIN_UM: i32 = -100;
const RING_Z_MAX_UM: i32 = 100;
const RING_Z_STEP_UM: usize = 10;

/// Ten evenly spaced radii from `min_um` to `max_um`
///
/// `radius[i] = min + i·(max − min)/9`; the last radius is pinned to `max_um`
/// so it is exact regardless of rounding.
///
/// # Errors
/// [`GeometryError::InvalidShellBounds`] unless both bounds are finite and
/// `min_um < max_um`.
///
/// # Example
/// ```
/// use decay_chain_core_rs::geometry::compute_shell_radii;
///
/// let radii = compute_shell_radii(155.0, 335.0).unwrap();
/// assert_eq!(radii[0], 155.0);
/// assert_eq!(radii[1], 175.0);
/// assert_eq!(radii[9], 335.0);
/// ```
pub fn compute_shell_radii(min_um: f64, max_um: f64) -> Result<[f64; SHELL_COUNT], GeometryError> {
    if !min_um.is_finite() || !max_um.is_finite() || min_um >= max_um {
        return Err(GeometryError::InvalidShellBounds {
            min: min_um,
            max: max_um,
        });
    }

    let spacing = (max_um - min_um) / (SHELL_COUNT - 1) as f64;
    let mut radii = [0.0; SHELL_COUNT];
    for (i, radius) in radii.iter_mut().enumerate() {
        *radius = min_um + i as f64 * spacing;
    }
    radii[SHELL_COUNT - 1] = max_um;

    for (i, radius) in radii.iter().enumerate() {
        debug!("R[{}] = {} um", i, radius);
    }
    Ok(radii)
}

/// Shell bounds, radii and cell placement
#[derive(Debug, Clone, PartialEq)]
pub struct ShellLayout {
    min_um: f64,
    max_um: f64,
    radii_um: [f64; SHELL_COUNT],
}

impl ShellLayout {
    pub fn new(min_um: f64, max_um: f64) -> Result<Self, GeometryError> {
        let radii_um = compute_shell_radii(min_um, max_um)?;
        Ok(Self {
            min_um,
            max_um,
            radii_um,
        })
    }

    pub fn min_um(&self) -> f64 {
        self.min_um
    }

    pub fn max_um(&self) -> f64 {
        self.max_um
    }

    pub fn radii_um(&self) -> &[f64; SHELL_COUNT] {
        &self.radii_um
    }

    /// Radius of the shell a target volume with `copy_no` was placed on
    pub fn radius_um(&self, copy_no: i32) -> Option<f64> {
        usize::try_from(copy_no)
            .ok()
            .and_then(|i| self.radii_um.get(i))
            .copied()
    }

    /// Move the inner bound; radii are recomputed and the aggregator notified
    ///
    /// On error the layout is left unchanged.
    pub fn set_min<A: RunAggregator + ?Sized>(
        &mut self,
        min_um: f64,
        run: &mut A,
    ) -> Result<(), GeometryError> {
        self.radii_um = compute_shell_radii(min_um, self.max_um)?;
        self.min_um = min_um;
        run.set_r_min(min_um);
        Ok(())
    }

    /// Move the outer bound; radii are recomputed and the aggregator notified
    pub fn set_max<A: RunAggregator + ?Sized>(
        &mut self,
        max_um: f64,
        run: &mut A,
    ) -> Result<(), GeometryError> {
        self.radii_um = compute_shell_radii(self.min_um, max_um)?;
        self.max_um = max_um;
        run.set_r_max(max_um);
        Ok(())
    }

    /// Angular positions of the cells along one ring of `shell`
    fn ring_angles(&self, shell: usize) -> Vec<f64> {
        let Some(&radius) = self.radii_um.get(shell) else {
            return Vec::new();
        };
        if radius <= 0.0 {
            return Vec::new();
        }
        let step = CELL_PITCH_UM / radius;
        let last = TAU - step;
        let mut angles = Vec::new();
        let mut k = 0u32;
        loop {
            let theta = k as f64 * step;
            if theta > last {
                break;
            }
            angles.push(theta);
            k += 1;
        }
        angles
    }

    /// Cell centres of `shell`, in engine length units (mm)
    pub fn cell_centres(&self, shell: usize) -> Vec<DVec3> {
        let Some(&radius) = self.radii_um.get(shell) else {
            return Vec::new();
        };
        let angles = self.ring_angles(shell);
        let mut centres = Vec::new();
        for z in (RING_Z_MIN_UM..=RING_Z_MAX_UM).step_by(RING_Z_STEP_UM) {
            for theta in &angles {
                centres.push(DVec3::new(
                    radius * theta.cos() * UM,
                    radius * theta.sin() * UM,
                    z as f64 * UM,
                ));
            }
        }
        centres
    }

    /// Number of cells placed on `shell`
    pub fn cells_in_shell(&self, shell: usize) -> usize {
        let rings = (RING_Z_MIN_UM..=RING_Z_MAX_UM)
            .step_by(RING_Z_STEP_UM)
            .count();
        rings * self.ring_angles(shell).len()
    }

    /// Report the bounds and the per-shell cell counts to the aggregator
    pub fn announce<A: RunAggregator + ?Sized>(&self, run: &mut A) {
        run.set_r_min(self.min_um);
        run.set_r_max(self.max_um);
        for shell in 0..SHELL_COUNT {
            let count = self.cells_in_shell(shell);
            debug!("shell {} (R = {} um): {} cells", shell, self.radii_um[shell], count);
            run.set_num_cells(shell, count);
        }
    }
}
