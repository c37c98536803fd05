//! Upwind advection of suspended material with the water flow.
//!
//! Mass-conserving semi-Lagrangian transport along the dominant velocity
//! axis, split into two per-cell passes with a barrier between them:
//!
//! 1. every cell computes how much suspended sediment and dead vegetation
//!    leaves it this tick and through which cardinal direction;
//! 2. every cell settles its balance from the scratch field, subtracting
//!    its own outgoing amount and collecting what neighbors sent to it.
//!
//! A cell whose downstream neighbor lies off the grid keeps its load.

use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::{TransferScratch, VelocityField, FLUX_BOTTOM, FLUX_LEFT, FLUX_RIGHT, FLUX_TOP};
use crate::grid::{ortho_opposite, Grid};

/// Pass 1: compute per-cell outgoing amounts and their direction.
pub fn compute_transfers(
    grid: Grid,
    config: &SimConfig,
    velocity: &VelocityField,
    sediment: &[f32],
    dead_vegetation: &[f32],
    scratch: &mut TransferScratch,
) {
    scratch
        .sediment_out
        .par_iter_mut()
        .zip(scratch.dead_vegetation_out.par_iter_mut())
        .zip(scratch.dir.par_iter_mut())
        .enumerate()
        .for_each(|(i, ((sed_out, dead_out), dir))| {
            *sed_out = 0.0;
            *dead_out = 0.0;
            *dir = None;

            let v = velocity[i];
            let (axis_speed, channel) = if v.x.abs() >= v.y.abs() {
                (v.x, if v.x >= 0.0 { FLUX_RIGHT } else { FLUX_LEFT })
            } else {
                (v.y, if v.y >= 0.0 { FLUX_BOTTOM } else { FLUX_TOP })
            };
            if axis_speed == 0.0 {
                return;
            }

            let (x, y) = grid.coords(i);
            if grid.ortho_neighbor(x, y, channel) == i {
                // Downstream lies off the grid; the load stays put.
                return;
            }

            let frac = (axis_speed.abs() * config.dt / config.pipe_length).min(1.0);
            *sed_out = sediment[i] * frac;
            *dead_out = dead_vegetation[i] * frac;
            *dir = Some(channel as u8);
        });
}

/// Pass 2: apply the balances in place on the suspended fields.
pub fn apply_transfers(
    grid: Grid,
    scratch: &TransferScratch,
    sediment: &mut [f32],
    dead_vegetation: &mut [f32],
) {
    sediment
        .par_iter_mut()
        .zip(dead_vegetation.par_iter_mut())
        .enumerate()
        .for_each(|(i, (sed, dead))| {
            let (x, y) = grid.coords(i);
            let mut sed_in = 0.0f32;
            let mut dead_in = 0.0f32;
            for dir in 0..4 {
                let j = grid.ortho_neighbor(x, y, dir);
                if j != i && scratch.dir[j] == Some(ortho_opposite(dir) as u8) {
                    sed_in += scratch.sediment_out[j];
                    dead_in += scratch.dead_vegetation_out[j];
                }
            }
            *sed = *sed - scratch.sediment_out[i] + sed_in;
            *dead = *dead - scratch.dead_vegetation_out[i] + dead_in;
        });
}
