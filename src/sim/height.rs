//! Height integration: applies flux divergence to the water and regolith
//! layers.
//!
//! Inflow for a cell is the sum of each neighbor's outflow channel pointing
//! back at it; a clamped (missing) neighbor contributes nothing. The volume
//! balance divided by the cell area becomes the height change.

use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::FluxField;
use crate::grid::{ortho_opposite, Grid};

/// Net inflow minus outflow volume rate for one cell.
#[inline]
fn net_volume_rate(grid: Grid, flux: &FluxField, i: usize, x: usize, y: usize) -> f32 {
    let mut net = -flux[i].iter().sum::<f32>();
    for dir in 0..4 {
        let j = grid.ortho_neighbor(x, y, dir);
        if j != i {
            net += flux[j][ortho_opposite(dir)];
        }
    }
    net
}

/// Water height integration, in place on the tick's working water field.
pub fn integrate_water(grid: Grid, config: &SimConfig, flux: &FluxField, water: &mut [f32]) {
    let inv_area = 1.0 / (config.pipe_length * config.pipe_length);

    water.par_iter_mut().enumerate().for_each(|(i, w)| {
        let (x, y) = grid.coords(i);
        let next = *w + config.dt * net_volume_rate(grid, flux, i, x, y) * inv_area;
        if next < 0.0 {
            // Rounding only; the flux stage already bounds outflow volume.
            log::debug!("clamped negative water {next:e} at ({x}, {y})");
        }
        *w = next.max(0.0);
    });
}

/// Regolith height integration from the committed field into the next one.
pub fn integrate_regolith(
    grid: Grid,
    config: &SimConfig,
    flux: &FluxField,
    cur_regolith: &[f32],
    next_regolith: &mut [f32],
) {
    let inv_area = 1.0 / (config.pipe_length * config.pipe_length);

    next_regolith.par_iter_mut().enumerate().for_each(|(i, r)| {
        let (x, y) = grid.coords(i);
        let next = cur_regolith[i] + config.dt * net_volume_rate(grid, flux, i, x, y) * inv_area;
        if next < 0.0 {
            log::debug!("clamped negative regolith {next:e} at ({x}, {y})");
        }
        *r = next.max(0.0);
    });
}
