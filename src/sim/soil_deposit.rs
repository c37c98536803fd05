//! Applies the scheduled talus transfers to the regolith layer.
//!
//! Runs after every cell has finished scheduling, so each cell can settle
//! its own balance: subtract what it sheds, add what its eight neighbors
//! shed toward it. Updates the regolith field in place; only the scratch
//! fields and the cell's own height are read.

use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fields::{SoilCornerFlux, SoilFlux};
use crate::grid::{diag_opposite, ortho_opposite, Grid, DIAG, ORTHO};

pub fn apply_soil_flow(
    grid: Grid,
    _config: &SimConfig,
    ortho_flux: &SoilFlux,
    diag_flux: &SoilCornerFlux,
    regolith: &mut [f32],
) {
    regolith.par_iter_mut().enumerate().for_each(|(i, r)| {
        let (x, y) = grid.coords(i);

        let mut balance =
            -(ortho_flux[i].iter().sum::<f32>() + diag_flux[i].iter().sum::<f32>());
        for dir in 0..4 {
            let (dx, dy) = ORTHO[dir];
            if let Some(j) = grid.checked_neighbor(x, y, dx, dy) {
                balance += ortho_flux[j][ortho_opposite(dir)];
            }
        }
        for dir in 0..4 {
            let (dx, dy) = DIAG[dir];
            if let Some(j) = grid.checked_neighbor(x, y, dx, dy) {
                balance += diag_flux[j][diag_opposite(dir)];
            }
        }

        *r = (*r + balance).max(0.0);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::soil_flow::schedule_soil_flow;

    #[test]
    fn test_balance_conserves_soil() {
        let grid = Grid::new(5, 5);
        let cfg = SimConfig::quiescent(5, 5);
        let mut ortho = vec![[0.0f32; 4]; grid.cells()];
        let mut diag = vec![[0.0f32; 4]; grid.cells()];
        ortho[grid.idx(2, 2)] = [0.1, 0.2, 0.05, 0.15];
        diag[grid.idx(2, 2)] = [0.02, 0.03, 0.01, 0.04];
        ortho[grid.idx(1, 1)][1] = 0.07;

        let mut regolith = vec![1.0; grid.cells()];
        let before: f32 = regolith.iter().sum();
        apply_soil_flow(grid, &cfg, &ortho, &diag, &mut regolith);
        let after: f32 = regolith.iter().sum();
        assert!((before - after).abs() < 1e-5);
    }

    #[test]
    fn test_edge_and_corner_spikes_conserve_soil() {
        let grid = Grid::new(5, 5);
        let mut cfg = SimConfig::quiescent(5, 5);
        cfg.dt = 0.01;
        cfg.talus_angle_deg = 30.0;
        cfg.talus_rate = 10.0;

        // Spikes on every kind of boundary cell; diagonal channels that
        // leave the grid must neither lose nor duplicate soil.
        for spike in [grid.idx(0, 2), grid.idx(4, 2), grid.idx(2, 0), grid.idx(0, 0), grid.idx(4, 4)] {
            let terrain = vec![0.0; grid.cells()];
            let mut regolith = vec![0.1; grid.cells()];
            regolith[spike] = 3.0;
            let water = vec![0.0; grid.cells()];
            let before: f32 = regolith.iter().sum();

            let mut ortho = vec![[0.0f32; 4]; grid.cells()];
            let mut diag = vec![[0.0f32; 4]; grid.cells()];
            for _ in 0..200 {
                schedule_soil_flow(grid, &cfg, &terrain, &regolith, &water, &mut ortho, &mut diag);
                apply_soil_flow(grid, &cfg, &ortho, &diag, &mut regolith);
            }

            let after: f32 = regolith.iter().sum();
            assert!(
                (before - after).abs() < 1e-3,
                "soil drift {} for spike at {}",
                before - after,
                spike
            );
            assert!(regolith[spike] < 3.0);
        }
    }

    #[test]
    fn test_schedule_then_apply_relaxes_spike() {
        let grid = Grid::new(5, 5);
        let mut cfg = SimConfig::quiescent(5, 5);
        cfg.dt = 0.01;
        cfg.talus_angle_deg = 30.0;
        cfg.talus_rate = 10.0;

        let terrain = vec![0.0; grid.cells()];
        let mut regolith = vec![0.1; grid.cells()];
        let spike = grid.idx(2, 2);
        regolith[spike] = 3.0;
        let water = vec![0.0; grid.cells()];

        let before: f32 = regolith.iter().sum();
        let mut ortho = vec![[0.0f32; 4]; grid.cells()];
        let mut diag = vec![[0.0f32; 4]; grid.cells()];
        for _ in 0..50 {
            schedule_soil_flow(grid, &cfg, &terrain, &regolith, &water, &mut ortho, &mut diag);
            apply_soil_flow(grid, &cfg, &ortho, &diag, &mut regolith);
        }

        let after: f32 = regolith.iter().sum();
        assert!((before - after).abs() < 1e-3, "soil drift {}", before - after);
        assert!(regolith[spike] < 3.0);
        assert!(regolith[grid.idx(1, 2)] > 0.1);
        assert!(regolith.iter().all(|&r| r >= 0.0));
    }
}
