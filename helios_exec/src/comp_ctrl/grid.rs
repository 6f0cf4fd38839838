//! # Compensation grid
//!
//! A square grid of Z offsets covering `-size..size` in X and Y. Node `(i, j)`
//! lies at `(i * cell - size, j * cell - size)` with `cell = 2 * size /
//! grid_size`, node values are computed from the probe samples by inverse
//! distance weighting and queried by bilinear interpolation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fs, path::Path};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{CompCtrlError, ProbeSample, IDW_EPSILON};
use util::maths::{clamp, lerp};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Grid of Z offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct CompGrid {
    /// Half extent of the grid
    ///
    /// Units: millimeters
    size_mm: f64,

    /// Number of nodes along each axis
    grid_size: usize,

    /// Distance between adjacent nodes
    ///
    /// Units: millimeters
    cell_mm: f64,

    /// Node offsets indexed by `[x index, y index]`
    ///
    /// Units: millimeters
    offsets: Array2<f64>,
}

/// The minimal representation of a [`CompGrid`] for saving to disk.
#[derive(Serialize, Deserialize)]
pub(super) struct SerializableCompGrid {
    size_mm: f64,
    grid_size: usize,
    offsets: Array2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CompGrid {
    /// Create a grid with every node at zero offset.
    pub fn new(size_mm: f64, grid_size: usize) -> Result<Self, CompCtrlError> {
        if !size_mm.is_finite() || size_mm <= 0.0 {
            return Err(CompCtrlError::InvalidParams(format!(
                "grid size_mm must be finite and positive, found {}",
                size_mm
            )));
        }
        if grid_size < 2 {
            return Err(CompCtrlError::InvalidParams(format!(
                "grid_size must be at least 2, found {}",
                grid_size
            )));
        }

        let num_nodes = grid_size
            .checked_mul(grid_size)
            .ok_or(CompCtrlError::OutOfMemory)?;

        let mut data = Vec::new();
        data.try_reserve_exact(num_nodes)
            .map_err(|_| CompCtrlError::OutOfMemory)?;
        data.resize(num_nodes, 0.0);

        let offsets = Array2::from_shape_vec((grid_size, grid_size), data)
            .map_err(|_| CompCtrlError::IncompatibleGrid)?;

        Ok(Self {
            size_mm,
            grid_size,
            cell_mm: 2.0 * size_mm / grid_size as f64,
            offsets,
        })
    }

    /// Create a grid populated from the given samples.
    pub fn build(
        size_mm: f64,
        grid_size: usize,
        samples: &[ProbeSample],
    ) -> Result<Self, CompCtrlError> {
        let mut grid = Self::new(size_mm, grid_size)?;
        grid.rebuild(samples);
        Ok(grid)
    }

    /// Recompute every node from the given samples, reusing the storage.
    pub fn rebuild(&mut self, samples: &[ProbeSample]) {
        let size_mm = self.size_mm;
        let cell_mm = self.cell_mm;

        for ((i, j), offset) in self.offsets.indexed_iter_mut() {
            *offset = idw_offset(
                size_mm,
                i as f64 * cell_mm - size_mm,
                j as f64 * cell_mm - size_mm,
                samples,
            );
        }
    }

    /// Get the bilinearly interpolated offset at the given position.
    ///
    /// Positions outside the grid take the value at the nearest point of the
    /// border cell.
    pub fn offset_at(&self, x_mm: f64, y_mm: f64) -> f64 {
        let (i, tx) = self.cell_coord(x_mm);
        let (j, ty) = self.cell_coord(y_mm);

        let z0 = lerp(self.offsets[[i, j]], self.offsets[[i + 1, j]], tx);
        let z1 = lerp(self.offsets[[i, j + 1]], self.offsets[[i + 1, j + 1]], tx);

        lerp(z0, z1, ty)
    }

    /// Position of node `(i, j)`.
    pub fn node_position(&self, i: usize, j: usize) -> (f64, f64) {
        (
            i as f64 * self.cell_mm - self.size_mm,
            j as f64 * self.cell_mm - self.size_mm,
        )
    }

    /// True if this grid has the given extent and number of nodes.
    pub fn is_compatible(&self, size_mm: f64, grid_size: usize) -> bool {
        self.size_mm == size_mm && self.grid_size == grid_size
    }

    pub fn size_mm(&self) -> f64 {
        self.size_mm
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn cell_mm(&self) -> f64 {
        self.cell_mm
    }

    pub fn offsets(&self) -> &Array2<f64> {
        &self.offsets
    }

    /// Load a grid from the given path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CompCtrlError> {
        let s = fs::read_to_string(path).map_err(CompCtrlError::IoError)?;

        let ser: SerializableCompGrid =
            serde_json::from_str(&s).map_err(CompCtrlError::DeserializeError)?;

        ser.to_grid()
    }

    /// Save the grid to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CompCtrlError> {
        let s = serde_json::to_string(&SerializableCompGrid::from_grid(self))
            .map_err(CompCtrlError::SerializeError)?;

        fs::write(path, s).map_err(CompCtrlError::IoError)
    }

    /// Index of the lower node of the cell containing `pos_mm` along one axis
    /// and the fractional position inside that cell.
    fn cell_coord(&self, pos_mm: f64) -> (usize, f64) {
        let u = (pos_mm + self.size_mm) / self.cell_mm;
        let idx = clamp(u.floor(), 0.0, (self.grid_size - 2) as f64);

        (idx as usize, clamp(u - idx, 0.0, 1.0))
    }
}

impl SerializableCompGrid {
    pub(super) fn from_grid(grid: &CompGrid) -> Self {
        Self {
            size_mm: grid.size_mm,
            grid_size: grid.grid_size,
            offsets: grid.offsets.clone(),
        }
    }

    pub(super) fn to_grid(self) -> Result<CompGrid, CompCtrlError> {
        let mut grid = CompGrid::new(self.size_mm, self.grid_size)?;

        if self.offsets.shape() != grid.offsets.shape()
            || !self.offsets.iter().all(|v| v.is_finite())
        {
            return Err(CompCtrlError::IncompatibleGrid);
        }

        grid.offsets.assign(&self.offsets);

        Ok(grid)
    }
}

/// Inverse distance weighted offset of the samples at the given position.
///
/// Distances are normalised by `size_mm`. With no samples the offset is zero.
pub fn idw_offset(size_mm: f64, x_mm: f64, y_mm: f64, samples: &[ProbeSample]) -> f64 {
    let mut sum_weights = 0.0;
    let mut sum_offsets = 0.0;

    for s in samples {
        let dx = (x_mm - s.x_mm) / size_mm;
        let dy = (y_mm - s.y_mm) / size_mm;
        let weight = 1.0 / (dx.powi(2) + dy.powi(2) + IDW_EPSILON);

        sum_weights += weight;
        sum_offsets += weight * s.z_offset_mm;
    }

    if sum_weights > 0.0 {
        sum_offsets / sum_weights
    } else {
        0.0
    }
}
