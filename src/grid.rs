//! Grid dimensions and clamped neighbor lookup.
//!
//! The simulation runs on a rectangular W×H grid stored row-major. Edges
//! clamp to the nearest valid index (no wraparound): a lookup that would
//! step off the grid returns the cell itself, which callers treat as
//! "no neighbor" (zero flux, zero transfer).

/// Cardinal direction offsets in channel order: left, right, top, bottom.
pub const ORTHO: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Diagonal direction offsets: top-left, top-right, bottom-left, bottom-right.
pub const DIAG: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Index of the opposite cardinal direction (left/right, top/bottom).
#[inline]
pub const fn ortho_opposite(dir: usize) -> usize {
    dir ^ 1
}

/// Index of the opposite diagonal direction.
#[inline]
pub const fn diag_opposite(dir: usize) -> usize {
    3 - dir
}

/// Rectangular grid dimensions with row-major flat indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        debug_assert!(width >= 2 && height >= 2);
        Self { width, height }
    }

    /// Total number of cells.
    #[inline]
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Flat index of cell (x, y).
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Cell coordinates of a flat index.
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        debug_assert!(idx < self.cells());
        (idx % self.width, idx / self.width)
    }

    /// Flat index of the neighbor at (dx, dy), clamped to the grid.
    ///
    /// Returns the cell's own index when the step leaves the grid; callers
    /// compare against the origin index to detect missing neighbors.
    #[inline]
    pub fn neighbor(&self, x: usize, y: usize, dx: i32, dy: i32) -> usize {
        let nx = (x as i32 + dx).clamp(0, self.width as i32 - 1) as usize;
        let ny = (y as i32 + dy).clamp(0, self.height as i32 - 1) as usize;
        self.idx(nx, ny)
    }

    /// Flat index of the neighbor at (dx, dy), or `None` if the step
    /// leaves the grid on either axis.
    ///
    /// Unlike [`Grid::neighbor`], a diagonal step that crosses the
    /// boundary on only one axis is still a missing neighbor; clamping
    /// such a step would alias it to an orthogonal neighbor.
    #[inline]
    pub fn checked_neighbor(&self, x: usize, y: usize, dx: i32, dy: i32) -> Option<usize> {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx < 0 || ny < 0 || nx >= self.width as i32 || ny >= self.height as i32 {
            return None;
        }
        Some(self.idx(nx as usize, ny as usize))
    }

    /// Clamped cardinal neighbor by direction channel (see [`ORTHO`]).
    #[inline]
    pub fn ortho_neighbor(&self, x: usize, y: usize, dir: usize) -> usize {
        let (dx, dy) = ORTHO[dir];
        self.neighbor(x, y, dx, dy)
    }
}
