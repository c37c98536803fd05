//! Hydraulic erosion and deposition, plus the vegetation lifecycle.
//!
//! The sediment transport capacity of flowing water follows Mei et al.:
//! `C = Kc * |v| * sin(alpha)`, with the local tilt floored by `min_tilt`
//! so streams keep carrying across flat stretches. Vegetation cover
//! attenuates capacity. Undersaturated water dissolves terrain into
//! suspension (bedrock may cut below zero); oversaturated water deposits
//! back onto the terrain.

use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::VelocityField;
use crate::grid::Grid;

/// Sine of the terrain tilt angle from central height differences.
#[inline]
fn tilt_sine(grid: Grid, config: &SimConfig, terrain: &[f32], i: usize) -> f32 {
    let (x, y) = grid.coords(i);
    let inv_2l = 0.5 / config.pipe_length;
    // Clamped lookups flatten the gradient at the boundary, matching the
    // clamped-edge flux behavior.
    let sx = (terrain[grid.neighbor(x, y, 1, 0)] - terrain[grid.neighbor(x, y, -1, 0)]) * inv_2l;
    let sy = (terrain[grid.neighbor(x, y, 0, 1)] - terrain[grid.neighbor(x, y, 0, -1)]) * inv_2l;
    let g2 = sx * sx + sy * sy;
    (g2 / (1.0 + g2)).sqrt()
}

/// Erosion/deposition stage: writes the next terrain and suspended
/// sediment fields from the committed ones.
pub fn erode_deposit(
    grid: Grid,
    config: &SimConfig,
    terrain: &[f32],
    sediment: &[f32],
    vegetation: &[f32],
    velocity: &VelocityField,
    next_terrain: &mut [f32],
    next_sediment: &mut [f32],
) {
    next_terrain
        .par_iter_mut()
        .zip(next_sediment.par_iter_mut())
        .enumerate()
        .for_each(|(i, (t, s))| {
            let tilt = tilt_sine(grid, config, terrain, i).max(config.min_tilt);
            let mut capacity = config.sediment_capacity * velocity[i].length() * tilt;
            if config.vegetation_enabled {
                capacity /= 1.0 + config.vegetation_attenuation * vegetation[i];
            }

            let s0 = sediment[i];
            if s0 < capacity {
                let eroded = ((capacity - s0) * config.dissolving_rate * config.dt)
                    .min(config.max_erosion_per_step);
                *t = terrain[i] - eroded;
                *s = s0 + eroded;
            } else {
                let deposited = ((s0 - capacity) * config.deposition_rate * config.dt).min(s0);
                *t = terrain[i] + deposited;
                *s = s0 - deposited;
            }
        });
}

/// Vegetation lifecycle: submersion tracking, drowning die-off, and dead
/// matter shed into suspension by flowing water.
///
/// When vegetation is disabled the committed state is carried through
/// unchanged.
pub fn update_vegetation(
    config: &SimConfig,
    water: &[f32],
    velocity: &VelocityField,
    vegetation: &[f32],
    time_submerged: &[f32],
    dead: &[f32],
    suspended_dead: &[f32],
    next_vegetation: &mut [f32],
    next_time_submerged: &mut [f32],
    next_dead: &mut [f32],
    next_suspended_dead: &mut [f32],
) {
    next_vegetation
        .par_iter_mut()
        .zip(next_time_submerged.par_iter_mut())
        .zip(next_dead.par_iter_mut())
        .zip(next_suspended_dead.par_iter_mut())
        .enumerate()
        .for_each(|(i, (((veg, ts), dd), sdv))| {
            if !config.vegetation_enabled {
                *veg = vegetation[i];
                *ts = time_submerged[i];
                *dd = dead[i];
                *sdv = suspended_dead[i];
                return;
            }

            // Submersion clock: accumulates under water, resets when dry.
            *ts = if water[i] > config.submerge_threshold {
                time_submerged[i] + config.dt
            } else {
                0.0
            };

            // Drowning: past the grace period, living cover converts to
            // dead matter at a fixed rate. Cover never exceeds the
            // configured maximum, whatever the seed data claims.
            let mut living = vegetation[i].min(config.max_vegetation);
            let mut dead_now = dead[i];
            if *ts > config.vegetation_drown_time {
                let converted = (config.vegetation_decay_rate * config.dt).min(living);
                living -= converted;
                dead_now += converted;
            }

            // Flowing water strips dead matter into suspension.
            let shed_frac =
                (velocity[i].length() * config.vegetation_pickup_rate * config.dt).min(1.0);
            let shed = dead_now * shed_frac;

            *veg = living;
            *dd = dead_now - shed;
            *sdv = suspended_dead[i] + shed;
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::zero_velocity;
    use glam::Vec2;

    fn cfg() -> SimConfig {
        let mut cfg = SimConfig::quiescent(4, 4);
        cfg.dt = 0.01;
        cfg.sediment_capacity = 1.0;
        cfg.dissolving_rate = 1.0;
        cfg.deposition_rate = 1.0;
        cfg.max_erosion_per_step = 10.0;
        cfg.min_tilt = 0.0;
        cfg
    }

    #[test]
    fn test_still_water_neither_erodes_nor_deposits_clean() {
        let grid = Grid::new(4, 4);
        let cfg = cfg();
        let terrain = vec![1.0; grid.cells()];
        let sediment = vec![0.0; grid.cells()];
        let vegetation = vec![0.0; grid.cells()];
        let velocity = zero_velocity(grid);

        let mut next_t = vec![0.0; grid.cells()];
        let mut next_s = vec![0.0; grid.cells()];
        erode_deposit(grid, &cfg, &terrain, &sediment, &vegetation, &velocity, &mut next_t, &mut next_s);
        assert_eq!(next_t, terrain);
        assert_eq!(next_s, sediment);
    }

    #[test]
    fn test_still_water_drops_its_load() {
        let grid = Grid::new(4, 4);
        let cfg = cfg();
        let terrain = vec![1.0; grid.cells()];
        let sediment = vec![0.5; grid.cells()];
        let vegetation = vec![0.0; grid.cells()];
        let velocity = zero_velocity(grid);

        let mut next_t = vec![0.0; grid.cells()];
        let mut next_s = vec![0.0; grid.cells()];
        erode_deposit(grid, &cfg, &terrain, &sediment, &vegetation, &velocity, &mut next_t, &mut next_s);

        let i = grid.idx(1, 1);
        // Capacity 0 with sediment 0.5: deposit (0.5)*Kd*dt.
        assert!((next_s[i] - 0.495).abs() < 1e-6);
        assert!((next_t[i] - 1.005).abs() < 1e-6);
        // Column total conserved.
        assert!((next_t[i] + next_s[i] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_fast_flow_on_slope_erodes() {
        let grid = Grid::new(4, 4);
        let cfg = cfg();
        // Sloped terrain so sin(alpha) > 0.
        let terrain: Vec<f32> = (0..grid.cells())
            .map(|i| grid.coords(i).0 as f32)
            .collect();
        let sediment = vec![0.0; grid.cells()];
        let vegetation = vec![0.0; grid.cells()];
        let mut velocity = zero_velocity(grid);
        let i = grid.idx(1, 1);
        velocity[i] = Vec2::new(2.0, 0.0);

        let mut next_t = vec![0.0; grid.cells()];
        let mut next_s = vec![0.0; grid.cells()];
        erode_deposit(grid, &cfg, &terrain, &sediment, &vegetation, &velocity, &mut next_t, &mut next_s);

        assert!(next_t[i] < terrain[i]);
        assert!(next_s[i] > 0.0);
        assert!((next_t[i] + next_s[i] - terrain[i]).abs() < 1e-6);
    }

    #[test]
    fn test_erosion_respects_per_step_cap() {
        let grid = Grid::new(4, 4);
        let mut cfg = cfg();
        cfg.max_erosion_per_step = 1e-4;
        cfg.min_tilt = 1.0;
        let terrain = vec![0.0; grid.cells()];
        let sediment = vec![0.0; grid.cells()];
        let vegetation = vec![0.0; grid.cells()];
        let mut velocity = zero_velocity(grid);
        velocity[grid.idx(1, 1)] = Vec2::new(100.0, 0.0);

        let mut next_t = vec![0.0; grid.cells()];
        let mut next_s = vec![0.0; grid.cells()];
        erode_deposit(grid, &cfg, &terrain, &sediment, &vegetation, &velocity, &mut next_t, &mut next_s);
        assert!((next_s[grid.idx(1, 1)] - 1e-4).abs() < 1e-9);
    }

    #[test]
    fn test_vegetation_attenuates_capacity() {
        let grid = Grid::new(4, 4);
        let mut cfg = cfg();
        cfg.vegetation_enabled = true;
        cfg.vegetation_attenuation = 9.0;
        cfg.min_tilt = 1.0;
        let terrain = vec![0.0; grid.cells()];
        let sediment = vec![0.0; grid.cells()];
        let mut vegetation = vec![0.0; grid.cells()];
        let bare = grid.idx(1, 1);
        let green = grid.idx(2, 2);
        vegetation[green] = 1.0;
        let mut velocity = zero_velocity(grid);
        velocity[bare] = Vec2::new(1.0, 0.0);
        velocity[green] = Vec2::new(1.0, 0.0);

        let mut next_t = vec![0.0; grid.cells()];
        let mut next_s = vec![0.0; grid.cells()];
        erode_deposit(grid, &cfg, &terrain, &sediment, &vegetation, &velocity, &mut next_t, &mut next_s);
        // Attenuation factor 10: a tenth of the bare-ground pickup.
        assert!((next_s[bare] - 10.0 * next_s[green]).abs() < 1e-6);
    }

    #[test]
    fn test_terrain_may_cut_below_zero() {
        let grid = Grid::new(4, 4);
        let mut cfg = cfg();
        cfg.min_tilt = 1.0;
        let terrain = vec![0.0; grid.cells()];
        let sediment = vec![0.0; grid.cells()];
        let vegetation = vec![0.0; grid.cells()];
        let mut velocity = zero_velocity(grid);
        velocity[grid.idx(1, 1)] = Vec2::new(5.0, 0.0);

        let mut next_t = vec![0.0; grid.cells()];
        let mut next_s = vec![0.0; grid.cells()];
        erode_deposit(grid, &cfg, &terrain, &sediment, &vegetation, &velocity, &mut next_t, &mut next_s);
        assert!(next_t[grid.idx(1, 1)] < 0.0);
    }

    #[test]
    fn test_drowned_vegetation_dies_and_sheds() {
        let mut cfg = cfg();
        cfg.vegetation_enabled = true;
        cfg.vegetation_drown_time = 0.05;
        cfg.vegetation_decay_rate = 1.0;
        cfg.vegetation_pickup_rate = 10.0;
        cfg.submerge_threshold = 0.01;

        let cells = 4;
        let water = vec![0.5; cells];
        let mut velocity = vec![Vec2::ZERO; cells];
        velocity[1] = Vec2::new(3.0, 0.0);
        let vegetation = vec![0.2; cells];
        let time_submerged = vec![0.1; cells]; // already past the grace period
        let dead = vec![0.0; cells];
        let suspended_dead = vec![0.0; cells];

        let mut nv = vec![0.0; cells];
        let mut nts = vec![0.0; cells];
        let mut nd = vec![0.0; cells];
        let mut nsd = vec![0.0; cells];
        update_vegetation(
            &cfg, &water, &velocity, &vegetation, &time_submerged, &dead, &suspended_dead,
            &mut nv, &mut nts, &mut nd, &mut nsd,
        );

        // Still cell: converts but keeps its dead matter attached.
        assert!(nv[0] < 0.2);
        assert!(nd[0] > 0.0);
        assert_eq!(nsd[0], 0.0);
        // Flowing cell: part of the dead matter went into suspension.
        assert!(nsd[1] > 0.0);
        assert!(nd[1] < nd[0]);
        // Clock keeps running while submerged.
        assert!((nts[0] - 0.11).abs() < 1e-6);
    }

    #[test]
    fn test_cover_above_maximum_is_capped() {
        let mut cfg = cfg();
        cfg.vegetation_enabled = true;
        cfg.max_vegetation = 0.2;

        let water = vec![0.0; 2];
        let velocity = vec![Vec2::ZERO; 2];
        let vegetation = vec![0.5, 0.1];
        let time_submerged = vec![0.0; 2];
        let dead = vec![0.0; 2];
        let suspended_dead = vec![0.0; 2];

        let mut nv = vec![0.0; 2];
        let mut nts = vec![0.0; 2];
        let mut nd = vec![0.0; 2];
        let mut nsd = vec![0.0; 2];
        update_vegetation(
            &cfg, &water, &velocity, &vegetation, &time_submerged, &dead, &suspended_dead,
            &mut nv, &mut nts, &mut nd, &mut nsd,
        );
        assert_eq!(nv[0], 0.2);
        assert_eq!(nv[1], 0.1);
    }

    #[test]
    fn test_submersion_clock_resets_when_dry() {
        let mut cfg = cfg();
        cfg.vegetation_enabled = true;

        let water = vec![0.0; 2];
        let velocity = vec![Vec2::ZERO; 2];
        let vegetation = vec![0.2; 2];
        let time_submerged = vec![5.0; 2];
        let dead = vec![0.1; 2];
        let suspended_dead = vec![0.0; 2];

        let mut nv = vec![0.0; 2];
        let mut nts = vec![0.0; 2];
        let mut nd = vec![0.0; 2];
        let mut nsd = vec![0.0; 2];
        update_vegetation(
            &cfg, &water, &velocity, &vegetation, &time_submerged, &dead, &suspended_dead,
            &mut nv, &mut nts, &mut nd, &mut nsd,
        );
        assert_eq!(nts[0], 0.0);
        assert_eq!(nv[0], 0.2);
    }
}
