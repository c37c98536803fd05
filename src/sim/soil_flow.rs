//! Talus scheduling: loose soil shed from over-steep slopes.
//!
//! A cell compares its solid surface (terrain + regolith) against all eight
//! neighbors. Where the downhill slope exceeds the angle of repose, a
//! transfer proportional to the excess is scheduled, capped at half the
//! height difference so a single transfer can never invert the slope. The
//! scheduled amounts land in per-tick scratch fields and are applied later
//! by the soil deposit stage, once every cell has finished scheduling.

use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::{SoilCornerFlux, SoilFlux};
use crate::grid::{Grid, DIAG, ORTHO};

pub fn schedule_soil_flow(
    grid: Grid,
    config: &SimConfig,
    terrain: &[f32],
    regolith: &[f32],
    water: &[f32],
    ortho_out: &mut SoilFlux,
    diag_out: &mut SoilCornerFlux,
) {
    let threshold = config.talus_threshold();
    let ortho_dist = config.pipe_length;
    let diag_dist = config.pipe_length * std::f32::consts::SQRT_2;

    ortho_out
        .par_iter_mut()
        .zip(diag_out.par_iter_mut())
        .enumerate()
        .for_each(|(i, (ortho, diag))| {
            *ortho = [0.0; 4];
            *diag = [0.0; 4];

            if config.talus_exclude_submerged && water[i] > config.submerge_threshold {
                return;
            }

            let (x, y) = grid.coords(i);
            let solid_i = terrain[i] + regolith[i];

            let mut total = 0.0f32;
            let mut transfer = |j: Option<usize>, dist: f32| -> f32 {
                let Some(j) = j else {
                    return 0.0;
                };
                let drop = solid_i - (terrain[j] + regolith[j]);
                let slope = drop / dist;
                if slope <= threshold {
                    return 0.0;
                }
                let t = ((slope - threshold) * dist * config.talus_rate * config.dt)
                    .min(0.5 * drop);
                total += t;
                t
            };

            for dir in 0..4 {
                let (dx, dy) = ORTHO[dir];
                ortho[dir] = transfer(grid.checked_neighbor(x, y, dx, dy), ortho_dist);
            }
            for dir in 0..4 {
                let (dx, dy) = DIAG[dir];
                diag[dir] = transfer(grid.checked_neighbor(x, y, dx, dy), diag_dist);
            }

            // Never schedule more soil than the cell holds.
            if total > regolith[i] && total > 0.0 {
                let scale = regolith[i] / total;
                for t in ortho.iter_mut().chain(diag.iter_mut()) {
                    *t *= scale;
                }
            }
        });
}
