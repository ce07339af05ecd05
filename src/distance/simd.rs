//! Pure Rust SIMD implementations for distance calculations
//!
//! Portable 8-lane implementation that works across platforms.

use crate::distance::{check_lengths, DistanceFunction};
use crate::Result;
use wide::f32x8;

/// Load eight lanes from the front of a slice
#[inline]
fn load8(values: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; 8];
    lanes.copy_from_slice(&values[..8]);
    f32x8::from(lanes)
}

/// SIMD-optimized L2 distance calculator using the `wide` crate
pub struct SimdDistance {
    dimension: usize,
}

impl SimdDistance {
    /// Create a new SIMD distance calculator
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// SIMD squared L2 distance (no sqrt)
    #[inline]
    pub(crate) fn l2_distance_squared_simd(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let len = a.len();

        let mut sum8 = f32x8::splat(0.0);
        let mut i = 0;

        // Process 16 elements at a time (2 x f32x8)
        while i + 16 <= len {
            let a8_1 = load8(&a[i..i + 8]);
            let b8_1 = load8(&b[i..i + 8]);
            let diff1 = a8_1 - b8_1;
            sum8 = diff1.mul_add(diff1, sum8);

            let a8_2 = load8(&a[i + 8..i + 16]);
            let b8_2 = load8(&b[i + 8..i + 16]);
            let diff2 = a8_2 - b8_2;
            sum8 = diff2.mul_add(diff2, sum8);

            i += 16;
        }

        while i + 8 <= len {
            let a8 = load8(&a[i..i + 8]);
            let b8 = load8(&b[i..i + 8]);
            let diff = a8 - b8;
            sum8 = diff.mul_add(diff, sum8);
            i += 8;
        }

        // Sum the lanes
        let mut sum = sum8.to_array().iter().sum::<f32>();

        // Tail
        while i < len {
            let diff = a[i] - b[i];
            sum += diff * diff;
            i += 1;
        }

        sum
    }
}

impl DistanceFunction for SimdDistance {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_lengths(a, b, self.dimension)?;
        Ok(Self::l2_distance_squared_simd(a, b).sqrt())
    }

    fn distance_squared(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_lengths(a, b, self.dimension)?;
        Ok(Self::l2_distance_squared_simd(a, b))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "simd"
    }
}
