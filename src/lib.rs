//! pqcodec: Product Quantization for compact vector storage
//!
//! This crate trains per-subspace k-means codebooks and uses them to encode
//! high-dimensional vectors into short codes (one centroid index per subspace)
//! and to decode those codes back into approximate vectors.

#![warn(missing_docs)]

/// Euclidean distance functions with portable SIMD
pub mod distance;

/// Product quantization: k-means, codebooks, encode/decode
pub mod pq;

/// Vector generation and error helpers
pub mod utils;

// Re-export commonly used types
pub use distance::{create_distance_function, l2_distance, DistanceFunction};
pub use pq::{
    build_codebook, decode, encode, Codebook, KMeans, KMeansParams, KMeansResult, PQCode,
    PQParams, PQTrainingResult, ProductQuantizer,
};

/// Result type for pqcodec operations
pub type Result<T> = anyhow::Result<T>;

/// Error types for pqcodec operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid dimension for vectors or codes
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length required by the codebook or distance function
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Code value outside the centroid alphabet of its subspace
    #[error("Invalid code {code} for subspace {subspace} (num_centroids {num_centroids})")]
    InvalidCode {
        /// Subspace the code belongs to
        subspace: usize,
        /// Offending code value
        code: usize,
        /// Number of centroids in that subspace
        num_centroids: usize,
    },

    /// Subspace index outside the codebook
    #[error("Subspace index {subspace} out of range (num_subspaces {num_subspaces})")]
    InvalidSubspace {
        /// Requested subspace
        subspace: usize,
        /// Number of subspaces in the codebook
        num_subspaces: usize,
    },

    /// Invalid setup: geometry, cluster counts or training data
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
