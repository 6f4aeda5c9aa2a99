//! Parameters for vertex selection.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bvh::DEFAULT_LEAF_SIZE;
use crate::error::{SelectError, SelectResult};

/// Highest accepted accuracy value.
pub const MAX_ACCURACY: u32 = 4;

/// BVH leaf padding contributed by each accuracy step in volume mode.
pub const EPSILON_PER_ACCURACY_STEP: f64 = 0.001;

/// Algorithm used to decide whether an active vertex is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectionMode {
    /// Select vertices whose rounded world position equals the rounded
    /// position of some selection-mesh vertex.
    #[default]
    Proximity,

    /// Select vertices lying on the interior side of any selection mesh.
    Volume,
}

/// Parameters for vertex selection.
///
/// `accuracy` means different things per mode: the number of decimal digits
/// compared in [`SelectionMode::Proximity`], and a multiplier for the BVH
/// leaf padding (`accuracy * 0.001`) in [`SelectionMode::Volume`].
///
/// # Example
///
/// ```
/// use mesh_select::{SelectionMode, SelectionParams};
///
/// let params = SelectionParams::default();
/// assert_eq!(params.mode, SelectionMode::Proximity);
/// assert_eq!(params.accuracy, 2);
///
/// let volume = SelectionParams::volume(1).with_bvh_leaf_size(8);
/// assert!(volume.validate().is_ok());
///
/// assert!(SelectionParams::proximity(5).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelectionParams {
    /// Selection algorithm.
    pub mode: SelectionMode,

    /// Decimal precision (proximity) or epsilon multiplier (volume), 0..=4.
    pub accuracy: u32,

    /// Maximum triangles per BVH leaf in volume mode.
    pub bvh_leaf_size: usize,

    /// Minimum vertex (or triangle) count before work is spread across
    /// rayon tasks. Results do not depend on this value.
    pub parallel_threshold: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Proximity,
            accuracy: 2,
            bvh_leaf_size: DEFAULT_LEAF_SIZE,
            parallel_threshold: 1024,
        }
    }
}

impl SelectionParams {
    /// Proximity matching at the given decimal precision.
    #[must_use]
    pub fn proximity(accuracy: u32) -> Self {
        Self {
            mode: SelectionMode::Proximity,
            accuracy,
            ..Self::default()
        }
    }

    /// Volume classification with the given epsilon multiplier.
    #[must_use]
    pub fn volume(accuracy: u32) -> Self {
        Self {
            mode: SelectionMode::Volume,
            accuracy,
            ..Self::default()
        }
    }

    /// Set the selection mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the accuracy.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy: u32) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the maximum triangles per BVH leaf.
    #[must_use]
    pub const fn with_bvh_leaf_size(mut self, size: usize) -> Self {
        self.bvh_leaf_size = size;
        self
    }

    /// Set the parallel threshold. `usize::MAX` keeps everything sequential.
    #[must_use]
    pub const fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// BVH leaf padding used in volume mode.
    #[must_use]
    pub fn volume_epsilon(&self) -> f64 {
        f64::from(self.accuracy) * EPSILON_PER_ACCURACY_STEP
    }

    /// Check that every parameter is within range.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::InvalidParameter`] if `accuracy` exceeds
    /// [`MAX_ACCURACY`] or `bvh_leaf_size` is zero.
    pub fn validate(&self) -> SelectResult<()> {
        if self.accuracy > MAX_ACCURACY {
            return Err(SelectError::invalid_parameter(format!(
                "accuracy must be in 0..={MAX_ACCURACY}, got {}",
                self.accuracy
            )));
        }
        if self.bvh_leaf_size == 0 {
            return Err(SelectError::invalid_parameter(
                "bvh_leaf_size must be at least 1",
            ));
        }
        Ok(())
    }
}
