//! Double-buffered simulation field storage.
//!
//! Every persistent field group is held in two arenas selected by a parity
//! bit. During a tick, stages read the "current" arena (last tick's
//! committed state) or the already-completed portion of the "next" arena,
//! and write only the "next" arena, always one cell per invocation, which
//! keeps every stage race-free under a parallel for. The commit at tick end
//! flips the parity bit; nothing is copied.

use glam::Vec2;

use crate::grid::Grid;

/// Cardinal flux channel indices, matching [`crate::grid::ORTHO`].
pub const FLUX_LEFT: usize = 0;
pub const FLUX_RIGHT: usize = 1;
pub const FLUX_TOP: usize = 2;
pub const FLUX_BOTTOM: usize = 3;

/// One cell of externally supplied initial state.
///
/// Produced by a terrain/vegetation generator (see [`crate::gen`]) or any
/// other seed source. Auxiliary water fields (suspended sediment, submerged
/// time, dead vegetation) always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InitialColumn {
    /// Bedrock terrain height. May be negative.
    pub terrain: f32,
    /// Loose soil layer height, >= 0.
    pub regolith: f32,
    /// Living vegetation height, >= 0.
    pub vegetation: f32,
    /// Standing water height, >= 0.
    pub water: f32,
}

/// Per-cell column heights: the terrain / regolith / vegetation / water
/// stack, stored as one flat channel per layer.
#[derive(Debug, Clone)]
pub struct ColumnFields {
    pub terrain: Vec<f32>,
    pub regolith: Vec<f32>,
    pub vegetation: Vec<f32>,
    pub water: Vec<f32>,
}

impl ColumnFields {
    pub fn from_initial(columns: &[InitialColumn]) -> Self {
        Self {
            terrain: columns.iter().map(|c| c.terrain).collect(),
            regolith: columns.iter().map(|c| c.regolith).collect(),
            vegetation: columns.iter().map(|c| c.vegetation).collect(),
            water: columns.iter().map(|c| c.water).collect(),
        }
    }

    /// Total column height (terrain + regolith + vegetation + water) at a cell.
    #[inline]
    pub fn total_height(&self, idx: usize) -> f32 {
        self.terrain[idx] + self.regolith[idx] + self.vegetation[idx] + self.water[idx]
    }

    /// Solid surface height (terrain + regolith) at a cell.
    #[inline]
    pub fn solid_height(&self, idx: usize) -> f32 {
        self.terrain[idx] + self.regolith[idx]
    }
}

/// Per-cell auxiliary water state.
#[derive(Debug, Clone)]
pub struct WaterAuxFields {
    /// Sediment mass suspended in the water column.
    pub suspended_sediment: Vec<f32>,
    /// Dead vegetation mass suspended in the water column.
    pub suspended_dead_vegetation: Vec<f32>,
    /// Accumulated time this cell has been continuously submerged.
    pub time_submerged: Vec<f32>,
    /// Dead vegetation still attached to the column surface.
    pub dead_vegetation: Vec<f32>,
}

impl WaterAuxFields {
    pub fn zeroed(cells: usize) -> Self {
        Self {
            suspended_sediment: vec![0.0; cells],
            suspended_dead_vegetation: vec![0.0; cells],
            time_submerged: vec![0.0; cells],
            dead_vegetation: vec![0.0; cells],
        }
    }
}

/// Directional outflow per cell: `[left, right, top, bottom]`.
pub type FluxField = Vec<[f32; 4]>;

/// Derived 2D flow velocity per cell.
pub type VelocityField = Vec<Vec2>;

/// Per-tick scratch for the talus solver: scheduled outgoing soil transfer
/// per cardinal direction. Fully rewritten every tick, never committed.
pub type SoilFlux = Vec<[f32; 4]>;

/// Per-tick scratch for diagonal talus transfers.
pub type SoilCornerFlux = Vec<[f32; 4]>;

/// Per-tick scratch for upwind sediment transport: the amount of suspended
/// sediment / dead vegetation leaving each cell, and the cardinal direction
/// it leaves through (`None` when the cell does not shed this tick).
#[derive(Debug, Clone)]
pub struct TransferScratch {
    pub sediment_out: Vec<f32>,
    pub dead_vegetation_out: Vec<f32>,
    pub dir: Vec<Option<u8>>,
}

impl TransferScratch {
    pub fn zeroed(cells: usize) -> Self {
        Self {
            sediment_out: vec![0.0; cells],
            dead_vegetation_out: vec![0.0; cells],
            dir: vec![None; cells],
        }
    }
}

/// A field group held in two arenas selected by a parity bit.
#[derive(Debug, Clone)]
pub struct Buffered<T> {
    arenas: [T; 2],
    cur: usize,
}

impl<T: Clone> Buffered<T> {
    /// Seeds both arenas with the same initial state.
    pub fn new(initial: T) -> Self {
        Self {
            arenas: [initial.clone(), initial],
            cur: 0,
        }
    }
}

impl<T> Buffered<T> {
    /// The committed arena: read-only for the duration of a tick.
    #[inline]
    pub fn cur(&self) -> &T {
        &self.arenas[self.cur]
    }

    /// Read-only view of the in-progress arena. Valid for stages running
    /// after the barrier of the stage that wrote it.
    #[inline]
    pub fn next(&self) -> &T {
        &self.arenas[self.cur ^ 1]
    }

    /// Simultaneous read-current / write-next access for a stage kernel.
    #[inline]
    pub fn split(&mut self) -> (&T, &mut T) {
        let (lo, hi) = self.arenas.split_at_mut(1);
        if self.cur == 0 {
            (&lo[0], &mut hi[0])
        } else {
            (&hi[0], &mut lo[0])
        }
    }

    /// Mutable access to the in-progress arena only.
    #[inline]
    pub fn next_mut(&mut self) -> &mut T {
        &mut self.arenas[self.cur ^ 1]
    }

    /// Publishes "next" as "current" by flipping the parity bit.
    #[inline]
    pub fn commit(&mut self) {
        self.cur ^= 1;
    }
}

/// Allocates an all-zero flux field for a grid.
pub fn zero_flux(grid: Grid) -> FluxField {
    vec![[0.0; 4]; grid.cells()]
}

/// Allocates an all-zero velocity field for a grid.
pub fn zero_velocity(grid: Grid) -> VelocityField {
    vec![Vec2::ZERO; grid.cells()]
}
