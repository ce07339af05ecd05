//! Euclidean distance calculations
//!
//! All clustering and nearest-centroid search in this crate goes through the
//! [`DistanceFunction`] trait. Two implementations exist: a plain scalar loop
//! and a portable SIMD version built on the `wide` crate.

use crate::{Error, Result};

/// Portable SIMD implementations using pure Rust
pub mod simd;

/// Scalar (non-SIMD) implementations as fallback
pub mod scalar;

/// Dimension at which the 8-lane SIMD path starts to pay off
pub const SIMD_MIN_DIMENSION: usize = 8;

/// Trait for distance calculation functions
pub trait DistanceFunction: Send + Sync {
    /// Euclidean distance between two vectors of the configured dimension
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32>;

    /// Squared Euclidean distance (no sqrt)
    fn distance_squared(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        let d = self.distance(a, b)?;
        Ok(d * d)
    }

    /// Dimension this function was created for
    fn dimension(&self) -> usize;

    /// Short implementation name, used in logs
    fn name(&self) -> &'static str;
}

/// Factory function to create the best L2 distance function for a dimension
pub fn create_distance_function(dimension: usize) -> Box<dyn DistanceFunction> {
    if dimension >= SIMD_MIN_DIMENSION {
        log::debug!("Using portable SIMD L2 distance (dim={})", dimension);
        Box::new(simd::SimdDistance::new(dimension))
    } else {
        log::debug!("Using scalar L2 distance (dim={})", dimension);
        Box::new(scalar::ScalarDistance::new(dimension))
    }
}

/// Euclidean distance between two slices of equal, non-zero length
///
/// Picks the same implementation as [`create_distance_function`] for the
/// slice length, so results match bit for bit.
pub fn l2_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_lengths(a, b, a.len())?;

    let squared = if a.len() >= SIMD_MIN_DIMENSION {
        simd::SimdDistance::l2_distance_squared_simd(a, b)
    } else {
        scalar::ScalarDistance::l2_distance_squared_scalar(a, b)
    };
    Ok(squared.sqrt())
}

/// Shared precondition: both inputs must have the expected, non-zero length
#[inline]
pub(crate) fn check_lengths(a: &[f32], b: &[f32], expected: usize) -> Result<()> {
    if expected == 0 {
        return Err(Error::DimensionMismatch { expected: 1, actual: 0 }.into());
    }
    if a.len() != expected {
        return Err(Error::DimensionMismatch { expected, actual: a.len() }.into());
    }
    if b.len() != expected {
        return Err(Error::DimensionMismatch { expected, actual: b.len() }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_factory_selection() {
        assert_eq!(create_distance_function(2).name(), "scalar");
        assert_eq!(create_distance_function(16).name(), "simd");
        assert_eq!(create_distance_function(16).dimension(), 16);
    }

    #[test]
    fn test_implementations_agree() {
        for dim in [1usize, 3, 8, 13, 16, 37, 128] {
            let a: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.37).sin()).collect();
            let b: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.11).cos()).collect();

            let scalar = scalar::ScalarDistance::new(dim);
            let simd = simd::SimdDistance::new(dim);

            assert_relative_eq!(
                scalar.distance(&a, &b).unwrap(),
                simd.distance(&a, &b).unwrap(),
                epsilon = 1e-4
            );
            assert_relative_eq!(
                scalar.distance_squared(&a, &b).unwrap(),
                simd.distance_squared(&a, &b).unwrap(),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn test_l2_distance_free_function() {
        let dist = l2_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert_relative_eq!(dist, 5.0, epsilon = 1e-6);

        let a: Vec<f32> = (0..32).map(|i| i as f32 * 0.5).collect();
        let b: Vec<f32> = (0..32).map(|i| i as f32 * -0.25).collect();
        let via_trait = create_distance_function(32).distance(&a, &b).unwrap();
        assert_eq!(l2_distance(&a, &b).unwrap(), via_trait);

        assert!(l2_distance(&[1.0, 2.0], &[1.0]).is_err());
        assert!(l2_distance(&[], &[]).is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let empty: [f32; 0] = [];
        for distance_fn in [
            Box::new(scalar::ScalarDistance::new(0)) as Box<dyn DistanceFunction>,
            Box::new(simd::SimdDistance::new(0)),
            create_distance_function(0),
        ] {
            let err = distance_fn.distance(&empty, &empty).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<Error>(),
                Some(Error::DimensionMismatch { expected: 1, actual: 0 })
            ));
            assert!(distance_fn.distance_squared(&empty, &empty).is_err());
        }
    }
}
