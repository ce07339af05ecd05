//! Scalar (non-SIMD) distance calculations
//!
//! Used for short subspaces where SIMD lanes would mostly sit idle, and as the
//! reference the SIMD path is checked against.

use crate::distance::{check_lengths, DistanceFunction};
use crate::Result;

/// Scalar L2 distance calculator (no SIMD)
pub struct ScalarDistance {
    dimension: usize,
}

impl ScalarDistance {
    /// Create a new scalar distance calculator
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Scalar squared L2 distance (avoids sqrt)
    #[inline]
    pub(crate) fn l2_distance_squared_scalar(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());

        let mut sum = 0.0f32;
        for (x, y) in a.iter().zip(b.iter()) {
            let diff = x - y;
            sum += diff * diff;
        }
        sum
    }
}

impl DistanceFunction for ScalarDistance {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_lengths(a, b, self.dimension)?;
        Ok(Self::l2_distance_squared_scalar(a, b).sqrt())
    }

    fn distance_squared(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_lengths(a, b, self.dimension)?;
        Ok(Self::l2_distance_squared_scalar(a, b))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "scalar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_distance() {
        let calc = ScalarDistance::new(4);
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![5.0, 6.0, 7.0, 8.0];

        let dist = calc.distance(&a, &b).unwrap();
        assert_relative_eq!(dist, 8.0, epsilon = 1e-5);

        let dist_sq = calc.distance_squared(&a, &b).unwrap();
        assert_relative_eq!(dist_sq, 64.0, epsilon = 1e-5);
    }

    #[test]
    fn test_identical_vectors() {
        let calc = ScalarDistance::new(3);
        let a = vec![0.5, -1.5, 2.0];
        assert_eq!(calc.distance(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let calc = ScalarDistance::new(4);
        let err = calc.distance(&[1.0, 2.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::DimensionMismatch { expected, actual }) => {
                assert_eq!(*expected, 4);
                assert_eq!(*actual, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(calc.distance(&[1.0, 2.0, 3.0, 4.0], &[1.0]).is_err());
    }
}
