//! Per-vertex selection results.

use crate::error::{SelectError, SelectResult};

/// One flag per active-mesh vertex, in vertex index order.
///
/// # Example
///
/// ```
/// use mesh_select::SelectionMask;
///
/// let mask: SelectionMask = [true, false, true].into_iter().collect();
/// assert_eq!(mask.selected_count(), 2);
/// assert_eq!(mask.selected_indices().collect::<Vec<_>>(), vec![0, 2]);
///
/// // Add to an existing host selection without clearing anything.
/// let mut host = vec![false, true, false];
/// mask.merge_into(&mut host).unwrap();
/// assert_eq!(host, vec![true, true, true]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionMask {
    selected: Vec<bool>,
}

impl SelectionMask {
    /// Create a mask with nothing selected.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            selected: vec![false; len],
        }
    }

    /// Wrap an existing flag vector.
    #[must_use]
    pub const fn from_vec(selected: Vec<bool>) -> Self {
        Self { selected }
    }

    /// Number of vertices covered by the mask.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether the mask covers no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether vertex `index` is selected. Out-of-range indices are not.
    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    /// Number of selected vertices.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// Indices of selected vertices in ascending order.
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
    }

    /// Flags as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.selected
    }

    /// Consume the mask and return the flags.
    #[must_use]
    pub fn into_vec(self) -> Vec<bool> {
        self.selected
    }

    /// Element-wise OR of two masks over the same vertices.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::MaskLengthMismatch`] if the lengths differ.
    pub fn union(&self, other: &Self) -> SelectResult<Self> {
        self.check_len(other.len())?;
        Ok(self
            .selected
            .iter()
            .zip(&other.selected)
            .map(|(&a, &b)| a || b)
            .collect())
    }

    /// OR the mask into a host selection buffer.
    ///
    /// Vertices already selected in `target` stay selected; nothing is
    /// ever deselected.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::MaskLengthMismatch`] if `target` has a
    /// different length.
    pub fn merge_into(&self, target: &mut [bool]) -> SelectResult<()> {
        self.check_len(target.len())?;
        for (dst, &src) in target.iter_mut().zip(&self.selected) {
            *dst |= src;
        }
        Ok(())
    }

    fn check_len(&self, actual: usize) -> SelectResult<()> {
        if actual == self.len() {
            Ok(())
        } else {
            Err(SelectError::MaskLengthMismatch {
                expected: self.len(),
                actual,
            })
        }
    }
}

impl FromIterator<bool> for SelectionMask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}

impl From<SelectionMask> for Vec<bool> {
    fn from(mask: SelectionMask) -> Self {
        mask.selected
    }
}
