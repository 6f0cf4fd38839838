//! Compensation transform

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CompGrid;
use crate::kin_ctrl::CartesianPos;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction in which a compensation transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompDirection {
    /// Logical to machine coordinates, the offset is added to Z.
    Apply,

    /// Machine to logical coordinates, the offset is subtracted from Z.
    Invert,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A Z compensation which can be installed into the motion pipeline.
///
/// Implementations are called once per segment, so `offset_at` must not
/// allocate or block.
pub trait CompensationTransform: Send + Sync {
    /// Z offset at the given XY position.
    fn offset_at(&self, x_mm: f64, y_mm: f64) -> f64;

    /// Adjust the Z coordinate of `target` in place.
    ///
    /// XY are never changed, so `Invert` exactly undoes `Apply` up to
    /// floating point rounding.
    fn transform(&self, target: &mut CartesianPos, direction: CompDirection) {
        let offset_mm = self.offset_at(target[0], target[1]);

        match direction {
            CompDirection::Apply => target[2] += offset_mm,
            CompDirection::Invert => target[2] -= offset_mm,
        }
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Compensation by bilinear lookup into a shared grid.
#[derive(Debug, Clone)]
pub struct GridCompensation {
    grid: Arc<CompGrid>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GridCompensation {
    pub fn new(grid: Arc<CompGrid>) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &Arc<CompGrid> {
        &self.grid
    }
}

impl CompensationTransform for GridCompensation {
    fn offset_at(&self, x_mm: f64, y_mm: f64) -> f64 {
        self.grid.offset_at(x_mm, y_mm)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::comp_ctrl::ProbeSample;

    #[test]
    fn test_invertibility() {
        let samples = [
            ProbeSample {
                x_mm: -50.0,
                y_mm: 30.0,
                z_offset_mm: 0.8,
            },
            ProbeSample {
                x_mm: 140.0,
                y_mm: -90.0,
                z_offset_mm: -0.35,
            },
        ];
        let comp = GridCompensation::new(Arc::new(CompGrid::build(300.0, 24, &samples).unwrap()));

        for &(x, y, z) in [(0.0, 0.0, 0.0), (-50.0, 30.0, 2.0), (333.0, -401.0, 10.5)].iter() {
            let logical = CartesianPos::new(x, y, z);

            let mut machine = logical;
            comp.transform(&mut machine, CompDirection::Apply);
            assert_eq!(machine[0], x);
            assert_eq!(machine[1], y);
            assert!((machine[2] - z - comp.offset_at(x, y)).abs() < 1e-12);

            comp.transform(&mut machine, CompDirection::Invert);
            assert!((machine - logical).norm() < 1e-9);
        }
    }
}
