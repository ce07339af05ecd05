//! K-means clustering for Product Quantization
//!
//! Lloyd-style k-means used to train one centroid set per subspace. The
//! initialization, tie-breaking and empty-cluster behavior are fixed so that a
//! seeded run is exactly reproducible.

use crate::distance::{create_distance_function, DistanceFunction};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// K-means clustering parameters
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansParams {
    /// Number of clusters (centroids)
    pub k: usize,
    /// Optional cap on update iterations; `None` runs until assignments are stable
    pub max_iterations: Option<usize>,
    /// Random seed for reproducible initialization
    pub seed: Option<u64>,
    /// Run the assignment step on the rayon pool
    pub parallel_assignment: bool,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 256,
            max_iterations: None,
            seed: None,
            parallel_assignment: false,
        }
    }
}

/// K-means clustering result
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster centroids [k x dimension]
    pub centroids: Vec<Vec<f32>>,
    /// Assignment of each point to its nearest final centroid
    pub assignments: Vec<usize>,
    /// Final inertia (sum of squared distances to assigned centroids)
    pub inertia: f32,
    /// Inertia after every assignment pass, starting with the initial centroids
    pub inertia_history: Vec<f32>,
    /// Number of update iterations performed
    pub iterations: usize,
    /// Whether assignments stabilized before any iteration cap
    pub converged: bool,
    /// How many times a centroid had no points and kept its previous value
    pub empty_cluster_events: usize,
}

/// K-means clusterer with an explicit, seedable random source
pub struct KMeans {
    params: KMeansParams,
    dimension: usize,
    distance_fn: Box<dyn DistanceFunction>,
    rng: StdRng,
}

impl KMeans {
    /// Create a new K-means clusterer, seeded from `params.seed` or OS entropy
    pub fn new(params: KMeansParams, dimension: usize) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(params, dimension, rng)
    }

    /// Create a K-means clusterer driven by the given random source
    pub fn with_rng(params: KMeansParams, dimension: usize, rng: StdRng) -> Self {
        Self {
            params,
            dimension,
            distance_fn: create_distance_function(dimension),
            rng,
        }
    }

    /// Parameters this clusterer was built with
    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    /// Fit K-means to the data, sampling the initial centroids at random
    pub fn fit(&mut self, data: &[Vec<f32>]) -> Result<KMeansResult> {
        self.validate_data(data)?;
        let centroids = self.init_random(data);
        self.run(data, centroids)
    }

    /// Fit K-means starting from caller-provided centroids
    pub fn fit_from(&self, data: &[Vec<f32>], initial_centroids: Vec<Vec<f32>>) -> Result<KMeansResult> {
        self.validate_data(data)?;

        if initial_centroids.len() != self.params.k {
            return Err(Error::Configuration(format!(
                "Expected {} initial centroids, got {}",
                self.params.k,
                initial_centroids.len()
            ))
            .into());
        }
        for centroid in &initial_centroids {
            if centroid.len() != self.dimension {
                return Err(Error::DimensionMismatch {
                    expected: self.dimension,
                    actual: centroid.len(),
                }
                .into());
            }
        }

        self.run(data, initial_centroids)
    }

    /// Predict cluster assignments for new data
    pub fn predict(&self, data: &[Vec<f32>], centroids: &[Vec<f32>]) -> Result<Vec<usize>> {
        data.iter()
            .map(|point| self.find_closest_centroid(point, centroids).map(|(idx, _)| idx))
            .collect()
    }

    fn validate_data(&self, data: &[Vec<f32>]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::Configuration("Cannot cluster empty dataset".to_string()).into());
        }

        if self.params.k == 0 {
            return Err(Error::Configuration("Number of clusters k must be >= 1".to_string()).into());
        }

        if self.dimension == 0 {
            return Err(Error::Configuration("Vector dimension must be >= 1".to_string()).into());
        }

        for (i, point) in data.iter().enumerate() {
            if point.len() != self.dimension {
                return Err(Error::Configuration(format!(
                    "Dimension mismatch at point {}: expected {}, got {}",
                    i,
                    self.dimension,
                    point.len()
                ))
                .into());
            }
        }

        if data.len() < self.params.k {
            return Err(Error::Configuration(format!(
                "Number of data points ({}) must be >= k ({})",
                data.len(),
                self.params.k
            ))
            .into());
        }

        Ok(())
    }

    /// Draw `k` data points uniformly, with replacement
    fn init_random(&mut self, data: &[Vec<f32>]) -> Vec<Vec<f32>> {
        (0..self.params.k)
            .map(|_| data[self.rng.gen_range(0..data.len())].clone())
            .collect()
    }

    fn run(&self, data: &[Vec<f32>], mut centroids: Vec<Vec<f32>>) -> Result<KMeansResult> {
        let (mut assignments, mut inertia) = self.assign(data, &centroids)?;
        let mut inertia_history = vec![inertia];
        let mut iterations = 0;
        let mut empty_cluster_events = 0;

        let converged = loop {
            if let Some(max_iterations) = self.params.max_iterations {
                if iterations >= max_iterations {
                    log::warn!(
                        "K-means did not converge within {} iterations (k={}, n={}); returning best effort",
                        max_iterations,
                        self.params.k,
                        data.len()
                    );
                    break false;
                }
            }

            empty_cluster_events += self.update_centroids(data, &assignments, &mut centroids);
            iterations += 1;

            let (next_assignments, next_inertia) = self.assign(data, &centroids)?;
            let changed = assignments
                .iter()
                .zip(next_assignments.iter())
                .filter(|(old, new)| old != new)
                .count();

            assignments = next_assignments;
            inertia = next_inertia;
            inertia_history.push(inertia);

            if changed == 0 {
                break true;
            }
        };

        Ok(KMeansResult {
            centroids,
            assignments,
            inertia,
            inertia_history,
            iterations,
            converged,
            empty_cluster_events,
        })
    }

    /// Assignment step: nearest centroid per point, plus the resulting inertia
    fn assign(&self, data: &[Vec<f32>], centroids: &[Vec<f32>]) -> Result<(Vec<usize>, f32)> {
        let nearest: Vec<(usize, f32)> = if self.params.parallel_assignment {
            data.par_iter()
                .map(|point| self.find_closest_centroid(point, centroids))
                .collect::<Result<Vec<_>>>()?
        } else {
            data.iter()
                .map(|point| self.find_closest_centroid(point, centroids))
                .collect::<Result<Vec<_>>>()?
        };

        let inertia = nearest
            .iter()
            .map(|&(_, distance)| f64::from(distance) * f64::from(distance))
            .sum::<f64>() as f32;
        let assignments = nearest.into_iter().map(|(idx, _)| idx).collect();

        Ok((assignments, inertia))
    }

    /// Find the closest centroid to a point; the lowest index wins ties
    fn find_closest_centroid(&self, point: &[f32], centroids: &[Vec<f32>]) -> Result<(usize, f32)> {
        let mut min_distance = f32::INFINITY;
        let mut closest_idx = 0;

        for (idx, centroid) in centroids.iter().enumerate() {
            let distance = self.distance_fn.distance(point, centroid)?;
            if distance < min_distance {
                min_distance = distance;
                closest_idx = idx;
            }
        }

        Ok((closest_idx, min_distance))
    }

    /// Update step: move each centroid to the mean of its points.
    ///
    /// A centroid that received no points keeps its previous value; it is
    /// neither reseeded nor dropped. Returns the number of such empty clusters.
    fn update_centroids(&self, data: &[Vec<f32>], assignments: &[usize], centroids: &mut [Vec<f32>]) -> usize {
        // f64 accumulators keep the means stable for large clusters
        let mut sums = vec![vec![0.0f64; self.dimension]; self.params.k];
        let mut counts = vec![0usize; self.params.k];

        for (point, &cluster_idx) in data.iter().zip(assignments.iter()) {
            counts[cluster_idx] += 1;
            for (sum, &value) in sums[cluster_idx].iter_mut().zip(point.iter()) {
                *sum += f64::from(value);
            }
        }

        let mut empty = 0;
        for (cluster_idx, (sum, &count)) in sums.iter().zip(counts.iter()).enumerate() {
            if count == 0 {
                log::debug!("Cluster {} is empty; keeping its previous centroid", cluster_idx);
                empty += 1;
                continue;
            }

            let count = count as f64;
            for (value, &total) in centroids[cluster_idx].iter_mut().zip(sum.iter()) {
                *value = (total / count) as f32;
            }
        }

        empty
    }
}
