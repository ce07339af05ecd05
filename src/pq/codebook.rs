//! Codebook storage for product quantization
//!
//! A codebook holds one centroid set per subspace. It is built once by
//! training and then only read, so a shared `&Codebook` can serve any number
//! of concurrent encoders and decoders.

use crate::distance::l2_distance;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Trained product quantization codebook
///
/// Centroids are laid out as `[M x K x SUBDIM]` where `M` is the number of
/// subspaces, `K` the number of centroids per subspace and `SUBDIM` the
/// subspace width. The full vector dimension is `M * SUBDIM`.
///
/// Deserialization goes through [`Codebook::new`], so a decoded codebook
/// always has geometry that agrees with its centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCodebook")]
pub struct Codebook {
    centroids: Vec<Vec<Vec<f32>>>,
    num_subspaces: usize,
    num_centroids: usize,
    subspace_dimension: usize,
    dimension: usize,
}

/// Serialized form of [`Codebook`], checked before it becomes one
#[derive(Deserialize)]
struct RawCodebook {
    centroids: Vec<Vec<Vec<f32>>>,
    num_subspaces: usize,
    num_centroids: usize,
    subspace_dimension: usize,
    dimension: usize,
}

impl TryFrom<RawCodebook> for Codebook {
    type Error = Error;

    fn try_from(raw: RawCodebook) -> std::result::Result<Self, Self::Error> {
        let codebook = Codebook::new(raw.centroids).map_err(|e| match e.downcast::<Error>() {
            Ok(err) => err,
            Err(other) => Error::Configuration(other.to_string()),
        })?;

        let stored = (raw.num_subspaces, raw.num_centroids, raw.subspace_dimension, raw.dimension);
        let actual = (
            codebook.num_subspaces,
            codebook.num_centroids,
            codebook.subspace_dimension,
            codebook.dimension,
        );
        if stored != actual {
            return Err(Error::Configuration(format!(
                "Stored geometry (M, K, SUBDIM, D) = {:?} doesn't match centroids {:?}",
                stored, actual
            )));
        }

        Ok(codebook)
    }
}

impl Codebook {
    /// Create a codebook from per-subspace centroid sets, validating their shape
    pub fn new(centroids: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        let num_subspaces = centroids.len();
        if num_subspaces == 0 {
            return Err(Error::Configuration("Cannot create codebook with no subspaces".to_string()).into());
        }

        let num_centroids = centroids[0].len();
        let subspace_dimension = match centroids[0].first() {
            Some(centroid) if !centroid.is_empty() => centroid.len(),
            _ => {
                return Err(Error::Configuration("Cannot create codebook with empty centroids".to_string()).into())
            }
        };

        let codebook = Self {
            centroids,
            num_subspaces,
            num_centroids,
            subspace_dimension,
            dimension: num_subspaces * subspace_dimension,
        };
        codebook.check_shape()?;

        Ok(codebook)
    }

    /// Full vector dimension (`M * SUBDIM`)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of subspaces (`M`), which is also the code length
    pub fn num_subspaces(&self) -> usize {
        self.num_subspaces
    }

    /// Number of centroids per subspace (`K`)
    pub fn num_centroids(&self) -> usize {
        self.num_centroids
    }

    /// Width of each subspace (`SUBDIM`)
    pub fn subspace_dimension(&self) -> usize {
        self.subspace_dimension
    }

    /// All centroid sets
    pub fn centroids(&self) -> &[Vec<Vec<f32>>] {
        &self.centroids
    }

    /// Get centroids for a specific subspace
    pub fn subspace_centroids(&self, subspace_idx: usize) -> Result<&[Vec<f32>]> {
        self.centroids
            .get(subspace_idx)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                Error::InvalidSubspace {
                    subspace: subspace_idx,
                    num_subspaces: self.num_subspaces,
                }
                .into()
            })
    }

    /// Get a specific centroid
    pub fn centroid(&self, subspace_idx: usize, centroid_idx: usize) -> Result<&[f32]> {
        let subspace = self.subspace_centroids(subspace_idx)?;
        subspace.get(centroid_idx).map(Vec::as_slice).ok_or_else(|| {
            Error::InvalidCode {
                subspace: subspace_idx,
                code: centroid_idx,
                num_centroids: self.num_centroids,
            }
            .into()
        })
    }

    /// Subspace slice of a full-dimensional vector; callers check its length first
    pub(crate) fn subvector<'a>(&self, vector: &'a [f32], subspace_idx: usize) -> &'a [f32] {
        let start = subspace_idx * self.subspace_dimension;
        &vector[start..start + self.subspace_dimension]
    }

    /// Find closest centroid in a subspace; the lowest index wins ties
    pub fn find_closest_centroid(&self, subspace_idx: usize, subvector: &[f32]) -> Result<(usize, f32)> {
        let subspace_centroids = self.subspace_centroids(subspace_idx)?;

        if subvector.len() != self.subspace_dimension {
            return Err(Error::DimensionMismatch {
                expected: self.subspace_dimension,
                actual: subvector.len(),
            }
            .into());
        }

        let mut min_distance = f32::INFINITY;
        let mut best_idx = 0;

        for (idx, centroid) in subspace_centroids.iter().enumerate() {
            let distance = l2_distance(subvector, centroid)?;
            if distance < min_distance {
                min_distance = distance;
                best_idx = idx;
            }
        }

        Ok((best_idx, min_distance))
    }

    /// Save codebook to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Load codebook from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let codebook: Self = bincode::deserialize_from(reader)?;
        codebook.validate()?;
        Ok(codebook)
    }

    /// Save codebook in JSON format (human readable)
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load codebook from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let codebook: Self = serde_json::from_reader(reader)?;
        codebook.validate()?;
        Ok(codebook)
    }

    /// Get memory usage statistics
    pub fn memory_stats(&self) -> CodebookStats {
        let total_centroids = self.num_subspaces * self.num_centroids;
        let memory_bytes = total_centroids * self.subspace_dimension * std::mem::size_of::<f32>();
        let code_bytes = self.num_subspaces * std::mem::size_of::<u16>();

        CodebookStats {
            memory_bytes,
            num_subspaces: self.num_subspaces,
            num_centroids: self.num_centroids,
            subspace_dimension: self.subspace_dimension,
            total_centroids,
            code_bytes,
            compression_ratio: (self.dimension * std::mem::size_of::<f32>()) as f32 / code_bytes as f32,
        }
    }

    /// Validate codebook integrity, including that every value is finite
    pub fn validate(&self) -> Result<()> {
        self.check_shape()?;

        for (i, subspace) in self.centroids.iter().enumerate() {
            for (j, centroid) in subspace.iter().enumerate() {
                if let Some((k, value)) = centroid.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                    return Err(Error::Configuration(format!(
                        "Invalid value {} at centroid [{}, {}][{}]",
                        value, i, j, k
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    fn check_shape(&self) -> Result<()> {
        if self.centroids.len() != self.num_subspaces || self.num_subspaces == 0 {
            return Err(Error::Configuration(format!(
                "Centroids length {} doesn't match num_subspaces {}",
                self.centroids.len(),
                self.num_subspaces
            ))
            .into());
        }

        if self.num_centroids == 0 || self.num_centroids > super::MAX_CENTROIDS {
            return Err(Error::Configuration(format!(
                "Number of centroids must be between 1 and {}, got {}",
                super::MAX_CENTROIDS,
                self.num_centroids
            ))
            .into());
        }

        for (i, subspace) in self.centroids.iter().enumerate() {
            if subspace.len() != self.num_centroids {
                return Err(Error::Configuration(format!(
                    "Subspace {} has {} centroids, expected {}",
                    i,
                    subspace.len(),
                    self.num_centroids
                ))
                .into());
            }

            for (j, centroid) in subspace.iter().enumerate() {
                if centroid.len() != self.subspace_dimension {
                    return Err(Error::Configuration(format!(
                        "Centroid [{}, {}] has dimension {}, expected {}",
                        i,
                        j,
                        centroid.len(),
                        self.subspace_dimension
                    ))
                    .into());
                }
            }
        }

        if self.dimension != self.num_subspaces * self.subspace_dimension {
            return Err(Error::Configuration(format!(
                "Dimension {} doesn't match num_subspaces * subspace_dimension ({} * {})",
                self.dimension, self.num_subspaces, self.subspace_dimension
            ))
            .into());
        }

        Ok(())
    }
}

/// Codebook memory and structure statistics
#[derive(Debug)]
pub struct CodebookStats {
    /// Total memory used by codebook centroids in bytes
    pub memory_bytes: usize,
    /// Number of subspaces
    pub num_subspaces: usize,
    /// Number of centroids per subspace
    pub num_centroids: usize,
    /// Dimension of each subspace
    pub subspace_dimension: usize,
    /// Total number of centroids across all subspaces
    pub total_centroids: usize,
    /// Bytes per encoded vector
    pub code_bytes: usize,
    /// Compression ratio (original bytes / code bytes)
    pub compression_ratio: f32,
}
