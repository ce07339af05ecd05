//! Product Quantization for compression
//!
//! Training (`kmeans`, `quantizer`) produces a [`Codebook`]; `codec` turns
//! single vectors into codes and back.

/// Trained centroid sets and their persistence
pub mod codebook;
/// Single-vector encode/decode
pub mod codec;
/// Seedable k-means clustering
pub mod kmeans;
/// Parameters and per-subspace training orchestration
pub mod quantizer;

pub use codebook::{Codebook, CodebookStats};
pub use codec::{decode, encode, PQCode};
pub use kmeans::{KMeans, KMeansParams, KMeansResult};
pub use quantizer::{build_codebook, PQParams, PQTrainingResult, ProductQuantizer, SubspaceConvergence};

/// Largest supported number of centroids per subspace (codes are `u16`)
pub const MAX_CENTROIDS: usize = u16::MAX as usize + 1;
