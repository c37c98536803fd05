//! Virtual-pipe flux update for water and regolith.
//!
//! Each cell owns four outflow pipes (left, right, top, bottom). A pipe's
//! flux carries momentum: the previous tick's flux decays by a friction
//! factor and is accelerated by the hydraulic head difference toward the
//! neighbor. Cells on the boundary have no pipe through the wall; the
//! clamped neighbor lookup returns the cell itself there and the channel
//! stays zero.

use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::{ColumnFields, FluxField};
use crate::grid::Grid;

/// Shared pipe update: momentum decay, head-difference acceleration, and a
/// proportional scale-down so no cell drains more volume than it holds.
fn update_flux<F>(
    grid: Grid,
    config: &SimConfig,
    friction: f32,
    head: F,
    available: &[f32],
    prev: &FluxField,
    next: &mut FluxField,
) where
    F: Fn(usize) -> f32 + Sync,
{
    let accel = config.gravity * config.pipe_area * config.dt / config.pipe_length;
    let cell_area = config.pipe_length * config.pipe_length;

    next.par_iter_mut().enumerate().for_each(|(i, out)| {
        let (x, y) = grid.coords(i);
        let head_i = head(i);

        let mut total = 0.0f32;
        for dir in 0..4 {
            let j = grid.ortho_neighbor(x, y, dir);
            if j == i {
                out[dir] = 0.0;
                continue;
            }
            let f = (prev[i][dir] * friction + accel * (head_i - head(j))).max(0.0);
            out[dir] = f;
            total += f;
        }

        // At most the stored volume may leave in one tick.
        if total > 0.0 {
            let scale = (available[i] * cell_area / (total * config.dt)).min(1.0);
            for f in out.iter_mut() {
                *f *= scale;
            }
        }
    });
}

/// Water flux stage. The head stacks the full column: terrain, regolith,
/// vegetation, and the tick's post-injection water.
pub fn update_water_flux(
    grid: Grid,
    config: &SimConfig,
    columns: &ColumnFields,
    next_water: &[f32],
    prev: &FluxField,
    next: &mut FluxField,
) {
    update_flux(
        grid,
        config,
        config.water_friction,
        |i| columns.terrain[i] + columns.regolith[i] + columns.vegetation[i] + next_water[i],
        next_water,
        prev,
        next,
    );
}

/// Regolith flux stage: loose soil creeps along the solid surface gradient
/// (terrain + regolith), independent of standing water.
pub fn update_regolith_flux(
    grid: Grid,
    config: &SimConfig,
    terrain: &[f32],
    regolith: &[f32],
    prev: &FluxField,
    next: &mut FluxField,
) {
    update_flux(
        grid,
        config,
        config.regolith_friction,
        |i| terrain[i] + regolith[i],
        regolith,
        prev,
        next,
    );
}
