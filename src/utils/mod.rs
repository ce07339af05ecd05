//! Utility functions for pqcodec
//!
//! Synthetic dataset generators used by the demo binary, benches and tests,
//! plus small helpers for measuring reconstruction quality.

use rand::Rng;

/// Generate `num_vectors` vectors with coordinates drawn uniformly from `[0, 1)`
pub fn generate_uniform_vectors<R: Rng + ?Sized>(
    num_vectors: usize,
    dimension: usize,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    (0..num_vectors)
        .map(|_| (0..dimension).map(|_| rng.gen::<f32>()).collect())
        .collect()
}

/// Generate well-separated clusters of points around random centers
///
/// Vectors are emitted cluster by cluster (not shuffled), so the cluster of
/// vector `i` is `i / vectors_per_cluster`.
pub fn generate_clustered_vectors<R: Rng + ?Sized>(
    num_clusters: usize,
    vectors_per_cluster: usize,
    dimension: usize,
    cluster_spread: f32,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    let mut vectors = Vec::with_capacity(num_clusters * vectors_per_cluster);

    for cluster_id in 0..num_clusters {
        // Centers sit on a coarse lattice so clusters never overlap
        let offset = cluster_id as f32 * 100.0;
        let center: Vec<f32> = (0..dimension)
            .map(|_| offset + rng.gen_range(-10.0..10.0))
            .collect();

        for _ in 0..vectors_per_cluster {
            let vector: Vec<f32> = center
                .iter()
                .map(|&c| c + rng.gen_range(-cluster_spread..cluster_spread))
                .collect();
            vectors.push(vector);
        }
    }

    vectors
}

/// Sum of squared coordinate differences between an original and its reconstruction
pub fn squared_error(original: &[f32], reconstructed: &[f32]) -> f32 {
    original
        .iter()
        .zip(reconstructed.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

/// Mean squared error per coordinate
pub fn mean_squared_error(original: &[f32], reconstructed: &[f32]) -> f32 {
    if original.is_empty() {
        return 0.0;
    }
    squared_error(original, reconstructed) / original.len() as f32
}
