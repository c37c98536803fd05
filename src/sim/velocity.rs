//! Flow velocity derived from the committed water flux field.
//!
//! The mean throughflow along each axis (average of what enters on one side
//! and leaves on the other, minus the reverse direction) divided by the
//! cross-section `pipe_length * mean_depth` gives the cell's velocity.
//! Effectively dry cells get zero velocity so the downstream erosion and
//! transport stages stay inert on dry land.

use glam::Vec2;
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::{FluxField, VelocityField, FLUX_BOTTOM, FLUX_LEFT, FLUX_RIGHT, FLUX_TOP};
use crate::grid::{Grid, ORTHO};

/// Depth below which a cell counts as dry for velocity purposes.
const DRY_DEPTH: f32 = 1e-6;

pub fn derive_velocity(
    grid: Grid,
    config: &SimConfig,
    flux: &FluxField,
    water_before: &[f32],
    water_after: &[f32],
    velocity: &mut VelocityField,
) {
    velocity.par_iter_mut().enumerate().for_each(|(i, v)| {
        let depth = 0.5 * (water_before[i] + water_after[i]);
        if depth < DRY_DEPTH {
            *v = Vec2::ZERO;
            return;
        }

        let (x, y) = grid.coords(i);
        let inflow = |dir: usize, channel: usize| -> f32 {
            let (dx, dy) = ORTHO[dir];
            let j = grid.neighbor(x, y, dx, dy);
            if j == i {
                0.0
            } else {
                flux[j][channel]
            }
        };

        // Mean throughflow per axis, positive toward +x / +y.
        let through_x = 0.5
            * ((inflow(FLUX_LEFT, FLUX_RIGHT) + flux[i][FLUX_RIGHT])
                - (inflow(FLUX_RIGHT, FLUX_LEFT) + flux[i][FLUX_LEFT]));
        let through_y = 0.5
            * ((inflow(FLUX_TOP, FLUX_BOTTOM) + flux[i][FLUX_BOTTOM])
                - (inflow(FLUX_BOTTOM, FLUX_TOP) + flux[i][FLUX_TOP]));

        let cross_section = config.pipe_length * depth;
        *v = Vec2::new(through_x, through_y) / cross_section;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{zero_flux, zero_velocity};

    #[test]
    fn test_dry_cell_has_zero_velocity() {
        let grid = Grid::new(4, 4);
        let cfg = SimConfig::quiescent(4, 4);
        let mut flux = zero_flux(grid);
        flux[grid.idx(1, 1)][FLUX_RIGHT] = 5.0;

        let water = vec![0.0; grid.cells()];
        let mut velocity = zero_velocity(grid);
        derive_velocity(grid, &cfg, &flux, &water, &water, &mut velocity);
        assert_eq!(velocity[grid.idx(1, 1)], Vec2::ZERO);
    }

    #[test]
    fn test_uniform_rightward_stream() {
        let grid = Grid::new(5, 3);
        let cfg = SimConfig::quiescent(5, 3);
        let mut flux = zero_flux(grid);
        for i in 0..grid.cells() {
            flux[i][FLUX_RIGHT] = 2.0;
        }

        let water = vec![1.0; grid.cells()];
        let mut velocity = zero_velocity(grid);
        derive_velocity(grid, &cfg, &flux, &water, &water, &mut velocity);

        // Interior cell: inflow 2 from the left, outflow 2 to the right,
        // mean throughflow 2 across a unit cross-section.
        let v = velocity[grid.idx(2, 1)];
        assert!((v.x - 2.0).abs() < 1e-6, "vx {}", v.x);
        assert!(v.y.abs() < 1e-6);
    }

    #[test]
    fn test_boundary_cell_sees_no_phantom_inflow() {
        let grid = Grid::new(4, 4);
        let cfg = SimConfig::quiescent(4, 4);
        let mut flux = zero_flux(grid);
        // The left-edge cell itself has rightward outflow; there is no
        // left neighbor to feed it.
        flux[grid.idx(0, 1)][FLUX_RIGHT] = 2.0;

        let water = vec![1.0; grid.cells()];
        let mut velocity = zero_velocity(grid);
        derive_velocity(grid, &cfg, &flux, &water, &water, &mut velocity);
        assert!((velocity[grid.idx(0, 1)].x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_scales_inverse_with_depth() {
        let grid = Grid::new(4, 4);
        let cfg = SimConfig::quiescent(4, 4);
        let mut flux = zero_flux(grid);
        flux[grid.idx(1, 1)][FLUX_RIGHT] = 2.0;

        let shallow = vec![0.5; grid.cells()];
        let deep = vec![2.0; grid.cells()];
        let mut v_shallow = zero_velocity(grid);
        let mut v_deep = zero_velocity(grid);
        derive_velocity(grid, &cfg, &flux, &shallow, &shallow, &mut v_shallow);
        derive_velocity(grid, &cfg, &flux, &deep, &deep, &mut v_deep);

        let i = grid.idx(1, 1);
        assert!((v_shallow[i].x - 4.0 * v_deep[i].x).abs() < 1e-6);
    }
}
