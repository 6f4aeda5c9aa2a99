//! Vertex selection by rounded-position equality.
//!
//! Every selection-mesh vertex is rounded to a fixed number of decimal
//! digits and stored in a hash set. An active vertex is selected when its
//! rounded position is in the set. This is equality of rounded values, not
//! a distance tolerance: two points 0.001 apart can fall into different
//! buckets while two points 0.009 apart share one.
//!
//! Rounding works on the exact binary value of each coordinate, with ties
//! going to the even neighbour. `1.115` is stored as `1.11499999...` and so
//! rounds to `1.11` at two digits, and `0.125` rounds to `0.12`. The sign is
//! part of the key, so `-0.001` and `0.001` land in different buckets at two
//! digits even though both round to zero.

// IEEE 754 field extraction narrows the 11-bit exponent field to i32.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use hashbrown::HashSet;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{SelectError, SelectResult};
use crate::mask::SelectionMask;
use crate::params::MAX_ACCURACY;
use crate::snapshot::GeometrySnapshot;

const MANTISSA_BITS: u32 = 52;
const EXPONENT_MASK: u64 = 0x7ff;
const EXPONENT_BIAS: i32 = 1075;

/// Number of decimal digits compared, validated to `0..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precision(u8);

impl Precision {
    /// Create a precision of `digits` decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::InvalidParameter`] if `digits` exceeds 4.
    pub fn new(digits: u32) -> SelectResult<Self> {
        match u8::try_from(digits) {
            Ok(d) if digits <= MAX_ACCURACY => Ok(Self(d)),
            _ => Err(SelectError::invalid_parameter(format!(
                "precision must be in 0..={MAX_ACCURACY}, got {digits}"
            ))),
        }
    }

    /// Number of decimal digits.
    #[must_use]
    pub const fn digits(self) -> u8 {
        self.0
    }

    /// Round a point to this precision.
    #[must_use]
    pub fn quantize(self, point: &Point3<f64>) -> QuantizedKey {
        QuantizedKey {
            precision: self,
            coords: [
                self.round(point.x),
                self.round(point.y),
                self.round(point.z),
            ],
        }
    }

    /// Round one coordinate to a whole number of `10^-digits` steps.
    ///
    /// The value is split into `mantissa * 2^exponent` and scaled by
    /// `10^digits` in 128-bit integers, so no precision is lost before the
    /// final round-half-to-even.
    fn round(self, value: f64) -> RoundedCoord {
        if value.is_nan() {
            return RoundedCoord::NaN;
        }
        let negative = value.is_sign_negative();
        if value.is_infinite() {
            return RoundedCoord::Infinite { negative };
        }

        let bits = value.to_bits();
        let biased = ((bits >> MANTISSA_BITS) & EXPONENT_MASK) as i32;
        let fraction = bits & ((1 << MANTISSA_BITS) - 1);
        let (mantissa, exponent) = if biased == 0 {
            (fraction, 1 - EXPONENT_BIAS)
        } else {
            (fraction | (1 << MANTISSA_BITS), biased - EXPONENT_BIAS)
        };

        // mantissa < 2^53 and 10^digits < 2^14, so this cannot overflow
        let scaled = u128::from(mantissa) * 10u128.pow(u32::from(self.0));
        let shift = exponent.unsigned_abs();

        let steps = if exponent >= 0 {
            if shift > scaled.leading_zeros() {
                return RoundedCoord::Whole(bits);
            }
            scaled << shift
        } else if shift >= u128::BITS {
            0
        } else {
            let quotient = scaled >> shift;
            let remainder = scaled & ((1u128 << shift) - 1);
            let half = 1u128 << (shift - 1);
            if remainder > half || (remainder == half && quotient & 1 == 1) {
                quotient + 1
            } else {
                quotient
            }
        };

        RoundedCoord::Steps { negative, steps }
    }
}

/// One coordinate rounded to a fixed decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundedCoord {
    /// A finite value as a whole number of `10^-digits` steps.
    ///
    /// `negative` is the sign of the unrounded value, so `-0.001` and
    /// `0.0` stay apart at two digits.
    Steps {
        /// Sign bit of the original coordinate.
        negative: bool,
        /// Magnitude in `10^-digits` units.
        steps: u128,
    },

    /// A value beyond the 128-bit step range, keyed by its bit pattern.
    /// Such values are already whole numbers, so no rounding applies.
    Whole(u64),

    /// Positive or negative infinity.
    Infinite {
        /// Sign of the infinity.
        negative: bool,
    },

    /// Any NaN. Matches other NaNs and nothing else.
    NaN,
}

/// A point rounded to a fixed decimal precision.
///
/// Keys remember their precision, so keys built at different precisions
/// never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedKey {
    precision: Precision,
    coords: [RoundedCoord; 3],
}

impl QuantizedKey {
    /// Precision the key was built at.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Rounded coordinates.
    #[must_use]
    pub const fn coords(&self) -> [RoundedCoord; 3] {
        self.coords
    }
}

/// Set of rounded selection-mesh positions.
///
/// # Example
///
/// ```
/// use mesh_select::{GeometrySnapshot, Precision, ProximityMatcher};
/// use nalgebra::{Matrix4, Point3};
///
/// let selection = GeometrySnapshot::build(
///     &[Point3::new(1.004, 2.0, 3.0)],
///     &Matrix4::identity(),
///     &[],
/// ).unwrap();
///
/// let matcher = ProximityMatcher::new(&[selection], Precision::new(2).unwrap());
/// assert!(matcher.matches(&Point3::new(0.996, 2.0, 3.0)));
/// assert!(!matcher.matches(&Point3::new(1.006, 2.0, 3.0)));
/// ```
#[derive(Debug, Clone)]
pub struct ProximityMatcher {
    precision: Precision,
    keys: HashSet<QuantizedKey>,
}

impl ProximityMatcher {
    /// Collect the rounded positions of every selection-snapshot point.
    #[must_use]
    pub fn new(selection: &[GeometrySnapshot], precision: Precision) -> Self {
        let capacity = selection.iter().map(GeometrySnapshot::vertex_count).sum();
        let mut keys = HashSet::with_capacity(capacity);
        for snapshot in selection {
            keys.extend(snapshot.points().iter().map(|p| precision.quantize(p)));
        }

        debug!(
            points = capacity,
            unique_keys = keys.len(),
            digits = precision.digits(),
            "Built proximity key set"
        );

        Self { precision, keys }
    }

    /// Precision shared by every key in the set.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Number of distinct rounded positions.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Whether `point` rounds to a stored position.
    #[must_use]
    pub fn matches(&self, point: &Point3<f64>) -> bool {
        self.keys.contains(&self.precision.quantize(point))
    }

    /// Match every point of `active`, in index order.
    ///
    /// Runs on the rayon pool once `active` has at least
    /// `parallel_threshold` points; the result is the same either way.
    #[must_use]
    pub fn match_snapshot(
        &self,
        active: &GeometrySnapshot,
        parallel_threshold: usize,
    ) -> SelectionMask {
        let test = |(index, point): (usize, &Point3<f64>)| {
            let hit = self.matches(point);
            if hit {
                trace!(vertex = index, "Proximity match");
            }
            hit
        };

        let points = active.points();
        let selected: Vec<bool> = if points.len() >= parallel_threshold {
            points.par_iter().enumerate().map(test).collect()
        } else {
            points.iter().enumerate().map(test).collect()
        };
        SelectionMask::from_vec(selected)
    }
}

/// Match `active` against `selection` at the given precision, sequentially.
#[must_use]
pub fn match_vertices(
    selection: &[GeometrySnapshot],
    active: &GeometrySnapshot,
    precision: Precision,
) -> SelectionMask {
    ProximityMatcher::new(selection, precision).match_snapshot(active, usize::MAX)
}
