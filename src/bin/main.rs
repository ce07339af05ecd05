//! pqcodec demo command-line interface
//!
//! Generates a uniform random dataset, trains a product quantization codebook
//! on it, then encodes and decodes the first vector and prints both.

use clap::Parser;
use console::style;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use pqcodec::utils::{generate_uniform_vectors, mean_squared_error};
use pqcodec::{PQParams, ProductQuantizer};

#[derive(Parser)]
#[command(name = "pqcodec")]
#[command(about = "Product quantization codebook training and vector encode/decode")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Full vector dimension (D)
    #[arg(short, long, default_value_t = 128)]
    pub dimension: usize,

    /// Number of subspaces (M); must divide the dimension
    #[arg(short = 'm', long)]
    pub subspaces: Option<usize>,

    /// Centroids per subspace (K)
    #[arg(short = 'k', long)]
    pub centroids: Option<usize>,

    /// Number of random training vectors
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub vectors: usize,

    /// Random seed for data generation and training
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Cap on k-means iterations per subspace
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Train subspaces one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Load PQ parameters from a JSON file (flags override it)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Save the trained codebook (bincode, or JSON for a .json path)
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn pq_params(&self) -> pqcodec::Result<PQParams> {
        let mut params = match &self.config {
            Some(path) => PQParams::from_json_file(path)?,
            None => PQParams::default(),
        };

        if let Some(subspaces) = self.subspaces {
            params.num_subspaces = subspaces;
        }
        if let Some(centroids) = self.centroids {
            params.num_centroids = centroids;
        }
        if self.seed.is_some() {
            params.seed = self.seed;
        }
        if self.max_iterations.is_some() {
            params.max_iterations = self.max_iterations;
        }
        if self.sequential {
            params.parallel = false;
        }

        Ok(params)
    }
}

fn format_vector(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{:.3}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> pqcodec::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    println!("{}", style("pqcodec").bold().blue());
    println!("{}", style("Product quantization encode/decode demo").dim());
    println!();

    let params = cli.pq_params()?;
    let mut pq = ProductQuantizer::new(params.clone(), cli.dimension)?;

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let data = generate_uniform_vectors(cli.vectors, cli.dimension, &mut rng);

    println!(
        "Training {} subspaces x {} centroids on {} vectors of dimension {}",
        params.num_subspaces, params.num_centroids, cli.vectors, cli.dimension
    );
    let training = pq.train(&data)?;
    println!(
        "Trained in {:?} (average inertia {:.4}, converged: {})",
        training.total_training_time,
        training.average_inertia(),
        training.all_converged()
    );

    if let Some(path) = &cli.save {
        let codebook = pq.codebook()?;
        if path.extension().map_or(false, |ext| ext == "json") {
            codebook.save_json(path)?;
        } else {
            codebook.save(path)?;
        }
        println!("Saved codebook to {}", style(path.display()).green());
    }

    let original = &data[0];
    let code = pq.encode(original)?;
    let approx = pq.decode(&code)?;

    println!();
    println!("Original vector: {}", format_vector(original));
    println!("Approximated vector: {}", format_vector(&approx));
    println!("Code: {:?}", code);
    println!("Reconstruction MSE: {:.6}", mean_squared_error(original, &approx));

    Ok(())
}
