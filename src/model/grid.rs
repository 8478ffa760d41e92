use serde::{Deserialize, Serialize};

use crate::{Point, Vector};

use super::ModelError;

/// Plasma state of one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellPlasma {
    /// Mass density (g/cm^3).
    #[serde(default)]
    pub rho: f64,
    /// Total hydrogen number density (cm^-3).
    #[serde(default)]
    pub n_h: f64,
    /// Electron number density (cm^-3).
    #[serde(default)]
    pub n_e: f64,
    /// Bulk velocity (cm/s).
    #[serde(default = "Vector::zero")]
    pub velocity: Vector,
    /// Number density per ion (cm^-3), indexed like the atomic data.
    #[serde(default)]
    pub ion_density: Vec<f64>,
}

impl CellPlasma {
    pub fn new(rho: f64, n_h: f64, n_e: f64) -> Self {
        Self {
            rho,
            n_h,
            n_e,
            velocity: Vector::zero(),
            ion_density: Vec::new(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_ions(mut self, ion_density: Vec<f64>) -> Self {
        self.ion_density = ion_density;
        self
    }

    /// Density of ion `n`, zero if the cell does not track it.
    pub fn ion(&self, n: usize) -> f64 {
        self.ion_density.get(n).copied().unwrap_or(0.0)
    }
}

/// Part of a trajectory inside a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Flat cell index.
    pub cell: usize,
    /// Distance from the trajectory origin to the cell entry point.
    pub t_start: f64,
    /// Path length inside the cell.
    pub length: f64,
}

/// Uniform axis-aligned grid of plasma cells.
///
/// Cells are stored flat with `k` (z) varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianGrid {
    /// Minimum corner of the grid (cm).
    pub origin: Point,
    /// Cell edge lengths along x, y, z (cm).
    pub cell_size: [f64; 3],
    /// Number of cells along x, y, z.
    pub dims: [usize; 3],
    pub cells: Vec<CellPlasma>,
}

impl CartesianGrid {
    pub fn new(
        origin: Point,
        cell_size: [f64; 3],
        dims: [usize; 3],
        cells: Vec<CellPlasma>,
    ) -> Result<Self, ModelError> {
        let grid = Self {
            origin,
            cell_size,
            dims,
            cells,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Grid with the same plasma in every cell.
    pub fn uniform(
        origin: Point,
        cell_size: [f64; 3],
        dims: [usize; 3],
        plasma: CellPlasma,
    ) -> Result<Self, ModelError> {
        let ncells = dims.iter().product();
        Self::new(origin, cell_size, dims, vec![plasma; ncells])
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.origin.is_finite() {
            return Err(ModelError::InvalidGeometry("grid origin is not finite".into()));
        }
        if self.cell_size.iter().any(|&h| !(h.is_finite() && h > 0.0)) {
            return Err(ModelError::InvalidGeometry(format!(
                "cell sizes must be positive, got {:?}",
                self.cell_size
            )));
        }
        if self.dims.contains(&0) {
            return Err(ModelError::InvalidGeometry(format!(
                "grid dimensions must be non-zero, got {:?}",
                self.dims
            )));
        }
        let expected: usize = self.dims.iter().product();
        if self.cells.len() != expected {
            return Err(ModelError::CellCountMismatch {
                expected,
                got: self.cells.len(),
            });
        }
        Ok(())
    }

    pub fn ncells(&self) -> usize {
        self.cells.len()
    }

    /// Minimum and maximum corners.
    pub fn bounds(&self) -> (Point, Point) {
        let max = Point::new(
            self.origin.x + self.cell_size[0] * self.dims[0] as f64,
            self.origin.y + self.cell_size[1] * self.dims[1] as f64,
            self.origin.z + self.cell_size[2] * self.dims[2] as f64,
        );
        (self.origin, max)
    }

    /// Checks if a point is inside the grid (boundaries included).
    pub fn contains(&self, pos: Point) -> bool {
        let (min, max) = self.bounds();
        (0..3).all(|a| {
            let c = pos.coordinate(a);
            c >= min.coordinate(a) && c <= max.coordinate(a)
        })
    }

    pub fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    /// Index of the cell holding `pos`, or None outside the grid.
    pub fn cell_at(&self, pos: Point) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let mut ijk = [0usize; 3];
        for (a, slot) in ijk.iter_mut().enumerate() {
            let x = (pos.coordinate(a) - self.origin.coordinate(a)) / self.cell_size[a];
            *slot = (x.floor() as usize).min(self.dims[a] - 1);
        }
        Some(self.flat_index(ijk[0], ijk[1], ijk[2]))
    }

    pub fn cell(&self, index: usize) -> Option<&CellPlasma> {
        self.cells.get(index)
    }

    /// Walks the cells crossed by the ray `origin + t * direction`, `t >= 0`.
    ///
    /// Uses 3D-DDA, so segment lengths are exact up to rounding and no
    /// position nudging across cell faces is needed. Returns None if the
    /// origin lies outside the grid. `direction` must be a unit vector.
    pub fn walk(&self, origin: Point, direction: Vector) -> Option<CellWalk<'_>> {
        if !self.contains(origin) {
            return None;
        }

        let mut idx = [0i64; 3];
        let mut step = [0i64; 3];
        let mut t_next = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];

        for a in 0..3 {
            let h = self.cell_size[a];
            let n = self.dims[a] as i64;
            let x = origin.coordinate(a) - self.origin.coordinate(a);
            let d = direction.component(a);

            if d > 0.0 {
                let i = ((x / h).floor() as i64).clamp(0, n - 1);
                idx[a] = i;
                step[a] = 1;
                t_next[a] = (((i + 1) as f64 * h - x) / d).max(0.0);
                t_delta[a] = h / d;
            } else if d < 0.0 {
                let i = ((x / h).ceil() as i64 - 1).clamp(0, n - 1);
                idx[a] = i;
                step[a] = -1;
                t_next[a] = ((i as f64 * h - x) / d).max(0.0);
                t_delta[a] = -h / d;
            } else {
                idx[a] = ((x / h).floor() as i64).clamp(0, n - 1);
            }
        }

        Some(CellWalk {
            grid: self,
            idx,
            step,
            t_next,
            t_delta,
            t: 0.0,
            done: false,
        })
    }
}

/// Iterator over the cell segments along a ray.
pub struct CellWalk<'a> {
    grid: &'a CartesianGrid,
    idx: [i64; 3],
    step: [i64; 3],
    t_next: [f64; 3],
    t_delta: [f64; 3],
    t: f64,
    done: bool,
}

impl Iterator for CellWalk<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.done {
            return None;
        }

        // Axis whose cell face is crossed first
        let mut axis = 0;
        for a in 1..3 {
            if self.t_next[a] < self.t_next[axis] {
                axis = a;
            }
        }
        let t_exit = self.t_next[axis];
        if !t_exit.is_finite() {
            self.done = true;
            return None;
        }

        let cell = self.grid.flat_index(
            self.idx[0] as usize,
            self.idx[1] as usize,
            self.idx[2] as usize,
        );
        let segment = Segment {
            cell,
            t_start: self.t,
            length: (t_exit - self.t).max(0.0),
        };

        self.t = t_exit;
        self.idx[axis] += self.step[axis];
        if self.idx[axis] < 0 || self.idx[axis] >= self.grid.dims[axis] as i64 {
            self.done = true;
        } else {
            self.t_next[axis] += self.t_delta[axis];
        }

        Some(segment)
    }
}
