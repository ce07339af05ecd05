//! Product quantizer implementation
//!
//! Splits the vector space into `M` equal subspaces, trains an independent
//! k-means codebook for each one and exposes single-vector encode/decode.

use crate::pq::codec::{self, PQCode};
use crate::pq::kmeans::{KMeans, KMeansParams, KMeansResult};
use crate::pq::{Codebook, MAX_CENTROIDS};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

/// Product Quantization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PQParams {
    /// Number of subspaces (M)
    pub num_subspaces: usize,
    /// Number of centroids per subspace (K)
    pub num_centroids: usize,
    /// Random seed for reproducible training; subspace `m` uses `seed + m`
    pub seed: Option<u64>,
    /// Optional cap on k-means iterations per subspace
    pub max_iterations: Option<usize>,
    /// Train subspaces concurrently on the rayon pool
    pub parallel: bool,
}

impl Default for PQParams {
    fn default() -> Self {
        Self {
            num_subspaces: 8,
            num_centroids: 256,
            seed: None,
            max_iterations: None,
            parallel: true,
        }
    }
}

impl PQParams {
    /// Create new PQ parameters with `num_subspaces` (M) and `num_centroids` (K)
    pub fn new(num_subspaces: usize, num_centroids: usize) -> Self {
        Self {
            num_subspaces,
            num_centroids,
            ..Default::default()
        }
    }

    /// Fix the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap k-means iterations per subspace
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Enable or disable parallel subspace training
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load parameters from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let params: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(params)
    }

    /// Validate parameters against vector dimension
    pub fn validate(&self, dimension: usize) -> Result<()> {
        if self.num_subspaces == 0 {
            return Err(Error::Configuration("Number of subspaces must be >= 1".to_string()).into());
        }

        if self.num_centroids == 0 || self.num_centroids > MAX_CENTROIDS {
            return Err(Error::Configuration(format!(
                "Number of centroids must be between 1 and {}, got {}",
                MAX_CENTROIDS, self.num_centroids
            ))
            .into());
        }

        if dimension == 0 {
            return Err(Error::Configuration("Vector dimension must be >= 1".to_string()).into());
        }

        if dimension % self.num_subspaces != 0 {
            return Err(Error::Configuration(format!(
                "Vector dimension ({}) must be divisible by number of subspaces ({})",
                dimension, self.num_subspaces
            ))
            .into());
        }

        Ok(())
    }

    /// Seed for the k-means run of one subspace
    pub fn subspace_seed(&self, subspace_idx: usize) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_add(subspace_idx as u64))
    }
}

/// Product Quantizer for vector compression
#[derive(Debug, Clone)]
pub struct ProductQuantizer {
    params: PQParams,
    dimension: usize,
    subspace_dim: usize,
    codebook: Option<Codebook>,
}

impl ProductQuantizer {
    /// Create a new untrained product quantizer
    pub fn new(params: PQParams, dimension: usize) -> Result<Self> {
        params.validate(dimension)?;

        let subspace_dim = dimension / params.num_subspaces;

        Ok(Self {
            params,
            dimension,
            subspace_dim,
            codebook: None,
        })
    }

    /// Wrap an already trained (e.g. loaded) codebook
    pub fn from_codebook(codebook: Codebook) -> Self {
        let params = PQParams::new(codebook.num_subspaces(), codebook.num_centroids());

        Self {
            params,
            dimension: codebook.dimension(),
            subspace_dim: codebook.subspace_dimension(),
            codebook: Some(codebook),
        }
    }

    /// PQ configuration parameters
    pub fn params(&self) -> &PQParams {
        &self.params
    }

    /// Vector dimension (D)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Subspace dimension (D / M)
    pub fn subspace_dimension(&self) -> usize {
        self.subspace_dim
    }

    /// Whether the quantizer has been trained
    pub fn is_trained(&self) -> bool {
        self.codebook.is_some()
    }

    /// Trained codebook
    pub fn codebook(&self) -> Result<&Codebook> {
        self.codebook
            .as_ref()
            .ok_or_else(|| Error::InvalidState("Quantizer must be trained first".to_string()).into())
    }

    /// Consume the quantizer and return its codebook
    pub fn into_codebook(self) -> Result<Codebook> {
        self.codebook
            .ok_or_else(|| Error::InvalidState("Quantizer must be trained first".to_string()).into())
    }

    /// Train the product quantizer on a dataset
    ///
    /// Each subspace is clustered independently. With `params.parallel` the
    /// subspaces run on the rayon pool; every task owns its own training slice
    /// and result, and the ordered collect is the only join point. Seeds are
    /// derived per subspace up front, so the outcome does not depend on
    /// scheduling. Retraining replaces the previous codebook only on success.
    pub fn train(&mut self, data: &[Vec<f32>]) -> Result<PQTrainingResult> {
        self.validate_training_data(data)?;

        let training_start = Instant::now();
        let num_subspaces = self.params.num_subspaces;

        let results: Vec<KMeansResult> = if self.params.parallel {
            (0..num_subspaces)
                .into_par_iter()
                .map(|subspace_idx| self.train_subspace(data, subspace_idx))
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..num_subspaces)
                .map(|subspace_idx| self.train_subspace(data, subspace_idx))
                .collect::<Result<Vec<_>>>()?
        };

        let mut training_stats = PQTrainingResult {
            subspace_inertias: Vec::with_capacity(num_subspaces),
            convergence_info: Vec::with_capacity(num_subspaces),
            total_training_time: Duration::ZERO,
        };
        let mut centroids = Vec::with_capacity(num_subspaces);

        for result in results {
            training_stats.subspace_inertias.push(result.inertia);
            training_stats.convergence_info.push(SubspaceConvergence {
                iterations: result.iterations,
                converged: result.converged,
                inertia: result.inertia,
                empty_cluster_events: result.empty_cluster_events,
            });
            centroids.push(result.centroids);
        }

        self.codebook = Some(Codebook::new(centroids)?);
        training_stats.total_training_time = training_start.elapsed();

        log::info!(
            "Trained PQ codebook: {} subspaces x {} centroids (dim={}, n={}) in {:?}",
            num_subspaces,
            self.params.num_centroids,
            self.dimension,
            data.len(),
            training_stats.total_training_time
        );
        if !training_stats.all_converged() {
            log::warn!("Some subspaces hit the iteration cap before converging");
        }

        Ok(training_stats)
    }

    /// Encode a single vector using the trained quantizer
    pub fn encode(&self, vector: &[f32]) -> Result<PQCode> {
        codec::encode(vector, self.codebook()?)
    }

    /// Decode a PQ code back to an approximate vector
    pub fn decode(&self, code: &[u16]) -> Result<Vec<f32>> {
        codec::decode(code, self.codebook()?)
    }

    /// L2 distance between a vector and its reconstruction
    pub fn reconstruction_error(&self, vector: &[f32]) -> Result<f32> {
        let code = self.encode(vector)?;
        let decoded = self.decode(&code)?;
        Ok(crate::utils::squared_error(vector, &decoded).sqrt())
    }

    fn validate_training_data(&self, data: &[Vec<f32>]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::Configuration("Cannot train on empty dataset".to_string()).into());
        }

        for (i, vector) in data.iter().enumerate() {
            if vector.len() != self.dimension {
                return Err(Error::Configuration(format!(
                    "Vector {} has dimension {}, expected {}",
                    i,
                    vector.len(),
                    self.dimension
                ))
                .into());
            }
        }

        if data.len() < self.params.num_centroids {
            return Err(Error::Configuration(format!(
                "Need at least {} training vectors for {} centroids, got {}",
                self.params.num_centroids,
                self.params.num_centroids,
                data.len()
            ))
            .into());
        }

        Ok(())
    }

    fn train_subspace(&self, data: &[Vec<f32>], subspace_idx: usize) -> Result<KMeansResult> {
        let start_dim = subspace_idx * self.subspace_dim;
        let end_dim = start_dim + self.subspace_dim;

        let subspace_data: Vec<Vec<f32>> = data
            .iter()
            .map(|vector| vector[start_dim..end_dim].to_vec())
            .collect();

        let kmeans_params = KMeansParams {
            k: self.params.num_centroids,
            max_iterations: self.params.max_iterations,
            seed: self.params.subspace_seed(subspace_idx),
            parallel_assignment: false,
        };

        let mut kmeans = KMeans::new(kmeans_params, self.subspace_dim);
        let result = kmeans.fit(&subspace_data)?;

        log::debug!(
            "Subspace {}: {} iterations, converged={}, inertia={:.6}, empty clusters={}",
            subspace_idx,
            result.iterations,
            result.converged,
            result.inertia,
            result.empty_cluster_events
        );

        Ok(result)
    }
}

/// Train a codebook over `data` with the given parameters
///
/// The vector dimension is taken from the first sample.
pub fn build_codebook(data: &[Vec<f32>], params: &PQParams) -> Result<Codebook> {
    let dimension = data
        .first()
        .map(Vec::len)
        .ok_or_else(|| Error::Configuration("Cannot train on empty dataset".to_string()))?;

    let mut pq = ProductQuantizer::new(params.clone(), dimension)?;
    pq.train(data)?;
    pq.into_codebook()
}

/// Per-subspace k-means outcome
#[derive(Debug, Clone, PartialEq)]
pub struct SubspaceConvergence {
    /// Update iterations performed
    pub iterations: usize,
    /// Whether assignments stabilized
    pub converged: bool,
    /// Final inertia
    pub inertia: f32,
    /// Empty clusters that kept their previous centroid
    pub empty_cluster_events: usize,
}

/// Product quantization training statistics
#[derive(Debug)]
pub struct PQTrainingResult {
    /// Inertia (within-cluster sum of squares) for each subspace
    pub subspace_inertias: Vec<f32>,
    /// Convergence information per subspace
    pub convergence_info: Vec<SubspaceConvergence>,
    /// Total time spent training
    pub total_training_time: Duration,
}

impl PQTrainingResult {
    /// Get average inertia across all subspaces
    pub fn average_inertia(&self) -> f32 {
        if self.subspace_inertias.is_empty() {
            0.0
        } else {
            self.subspace_inertias.iter().sum::<f32>() / self.subspace_inertias.len() as f32
        }
    }

    /// Check if all subspaces converged
    pub fn all_converged(&self) -> bool {
        self.convergence_info.iter().all(|info| info.converged)
    }

    /// Empty-cluster events summed over all subspaces
    pub fn total_empty_cluster_events(&self) -> usize {
        self.convergence_info.iter().map(|info| info.empty_cluster_events).sum()
    }
}
