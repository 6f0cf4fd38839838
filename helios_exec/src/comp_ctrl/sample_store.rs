//! Probe sample storage

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::CompCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single probed bed height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSample {
    /// Units: millimeters
    pub x_mm: f64,

    /// Units: millimeters
    pub y_mm: f64,

    /// Height of the bed relative to the machine Z origin at this point.
    ///
    /// Units: millimeters
    pub z_offset_mm: f64,
}

/// Fixed capacity collection of probe samples.
///
/// All storage is reserved up front, pushing never reallocates.
#[derive(Debug)]
pub struct ProbeSampleStore {
    samples: Vec<ProbeSample>,
    max_count: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProbeSampleStore {
    /// Create an empty store able to hold `max_count` samples.
    pub fn with_capacity(max_count: usize) -> Result<Self, CompCtrlError> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(max_count)
            .map_err(|_| CompCtrlError::OutOfMemory)?;

        Ok(Self { samples, max_count })
    }

    /// Append a sample, failing if the store is full.
    pub fn push(&mut self, sample: ProbeSample) -> Result<(), CompCtrlError> {
        if self.is_full() {
            return Err(CompCtrlError::CapacityExceeded {
                max_count: self.max_count,
            });
        }

        self.samples.push(sample);

        Ok(())
    }

    /// Drop every sample after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.samples.truncate(len)
    }

    pub fn clear(&mut self) {
        self.samples.clear()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.max_count
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn as_slice(&self) -> &[ProbeSample] {
        &self.samples
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample(i: usize) -> ProbeSample {
        ProbeSample {
            x_mm: i as f64,
            y_mm: -(i as f64),
            z_offset_mm: 0.1 * i as f64,
        }
    }

    #[test]
    fn test_capacity() {
        let mut store = ProbeSampleStore::with_capacity(3).unwrap();
        assert!(store.is_empty());

        for i in 0..3 {
            store.push(sample(i)).unwrap();
        }
        assert!(store.is_full());

        match store.push(sample(3)) {
            Err(CompCtrlError::CapacityExceeded { max_count }) => assert_eq!(max_count, 3),
            r => panic!("Expected capacity error, got {:?}", r),
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.as_slice()[2], sample(2));
    }

    #[test]
    fn test_truncate_and_clear() {
        let mut store = ProbeSampleStore::with_capacity(5).unwrap();
        for i in 0..4 {
            store.push(sample(i)).unwrap();
        }

        store.truncate(1);
        assert_eq!(store.as_slice(), &[sample(0)]);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.max_count(), 5);
    }

    #[test]
    fn test_zero_capacity() {
        let mut store = ProbeSampleStore::with_capacity(0).unwrap();
        assert!(store.is_full());
        assert!(store.push(sample(0)).is_err());
    }
}
