//! Read-only views of committed simulation state.

use glam::Vec2;

use crate::grid::Grid;

/// A borrowed view of the committed state at the end of a tick.
///
/// All slices have `grid.cells()` elements in row-major order. The view is
/// what exporters and observers consume; the simulation's double-buffered
/// internals never leak out.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub grid: Grid,
    pub terrain: &'a [f32],
    pub regolith: &'a [f32],
    pub vegetation: &'a [f32],
    pub water: &'a [f32],
    pub suspended_sediment: &'a [f32],
    pub suspended_dead_vegetation: &'a [f32],
    pub dead_vegetation: &'a [f32],
    pub velocity: &'a [Vec2],
}

impl Snapshot<'_> {
    /// Total standing water volume over the grid. Suspended sediment is
    /// tracked separately and counted by [`Snapshot::total_solid`].
    pub fn total_water(&self) -> f64 {
        self.water.iter().map(|&w| w as f64).sum()
    }

    /// Total solid material: terrain, regolith, and suspended sediment.
    pub fn total_solid(&self) -> f64 {
        self.terrain
            .iter()
            .zip(self.regolith)
            .zip(self.suspended_sediment)
            .map(|((&t, &r), &s)| t as f64 + r as f64 + s as f64)
            .sum()
    }

    /// Min/max over any scalar field of the snapshot.
    pub fn field_range(field: &[f32]) -> (f32, f32) {
        field.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }

    /// Combined solid surface (terrain + regolith) per cell.
    pub fn solid_surface(&self) -> Vec<f32> {
        self.terrain
            .iter()
            .zip(self.regolith)
            .map(|(&t, &r)| t + r)
            .collect()
    }
}
