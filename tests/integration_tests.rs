//! Integration tests for the product quantization pipeline

use approx::assert_relative_eq;
use pqcodec::utils::{generate_clustered_vectors, generate_uniform_vectors, mean_squared_error};
use pqcodec::{build_codebook, decode, encode, Codebook, Error, PQParams, ProductQuantizer};
use rand::prelude::*;
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

#[test]
fn test_train_encode_decode_roundtrip_shapes() {
    let dimension = 64;
    let mut rng = StdRng::seed_from_u64(1);
    let data = generate_uniform_vectors(300, dimension, &mut rng);

    let params = PQParams::new(8, 16).with_seed(42);
    let mut pq = ProductQuantizer::new(params, dimension).expect("Failed to create quantizer");
    let training = pq.train(&data).expect("Failed to train quantizer");

    assert!(training.all_converged());
    assert_eq!(training.subspace_inertias.len(), 8);

    for vector in data.iter().take(20) {
        let code = pq.encode(vector).unwrap();
        assert_eq!(code.len(), 8);
        assert!(code.iter().all(|&c| c < 16));

        let approx = pq.decode(&code).unwrap();
        assert_eq!(approx.len(), dimension);
    }
}

#[test]
fn test_reference_demo_geometry() {
    // D=128, M=8, K=256 on 1000 uniform vectors, capped for test speed
    let mut rng = StdRng::seed_from_u64(2024);
    let data = generate_uniform_vectors(1000, 128, &mut rng);

    let params = PQParams::new(8, 256).with_seed(7).with_max_iterations(20);
    let codebook = build_codebook(&data, &params).unwrap();

    assert_eq!(codebook.num_subspaces(), 8);
    assert_eq!(codebook.num_centroids(), 256);
    assert_eq!(codebook.subspace_dimension(), 16);
    codebook.validate().unwrap();

    let code = encode(&data[0], &codebook).unwrap();
    let approx = decode(&code, &codebook).unwrap();
    assert_eq!(approx.len(), 128);

    // On average the reconstruction beats a constant guess at the cube center
    let center = vec![0.5f32; 128];
    let (pq_error, center_error) = data.iter().take(50).fold((0.0f32, 0.0f32), |(pq, c), v| {
        let approx = decode(&encode(v, &codebook).unwrap(), &codebook).unwrap();
        (pq + mean_squared_error(v, &approx), c + mean_squared_error(v, &center))
    });
    assert!(pq_error < center_error, "{} vs {}", pq_error, center_error);
}

#[test]
fn test_clustered_data_compresses_well() {
    let mut rng = StdRng::seed_from_u64(9);
    let data = generate_clustered_vectors(2, 40, 32, 0.2, &mut rng);

    let codebook = build_codebook(&data, &PQParams::new(4, 16).with_seed(3)).unwrap();

    let total: f32 = data
        .iter()
        .map(|v| {
            let approx = decode(&encode(v, &codebook).unwrap(), &codebook).unwrap();
            mean_squared_error(v, &approx)
        })
        .sum();
    let average = total / data.len() as f32;

    // Each coordinate lies within 0.2 of its cluster center
    assert!(average < 0.2 * 0.2, "average MSE {}", average);
}

#[test]
fn test_codebook_persistence_roundtrip() {
    let mut rng = StdRng::seed_from_u64(5);
    let data = generate_uniform_vectors(100, 16, &mut rng);
    let codebook = build_codebook(&data, &PQParams::new(4, 8).with_seed(1)).unwrap();

    let binary = NamedTempFile::new().unwrap();
    codebook.save(binary.path()).unwrap();
    let from_binary = Codebook::load(binary.path()).unwrap();

    let json = NamedTempFile::new().unwrap();
    codebook.save_json(json.path()).unwrap();
    let from_json = Codebook::load_json(json.path()).unwrap();

    assert_eq!(from_binary, codebook);
    assert_eq!(from_json, codebook);

    let pq = ProductQuantizer::from_codebook(from_binary);
    for vector in data.iter().take(10) {
        assert_eq!(pq.encode(vector).unwrap(), encode(vector, &codebook).unwrap());
    }
}

#[test]
fn test_concurrent_encoding_shares_codebook() {
    let mut rng = StdRng::seed_from_u64(8);
    let data = Arc::new(generate_uniform_vectors(200, 32, &mut rng));
    let codebook = Arc::new(build_codebook(&data, &PQParams::new(4, 16).with_seed(2)).unwrap());

    let expected: Vec<_> = data.iter().map(|v| encode(v, &codebook).unwrap()).collect();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let data = Arc::clone(&data);
            let codebook = Arc::clone(&codebook);
            thread::spawn(move || {
                data.iter()
                    .skip(worker)
                    .step_by(4)
                    .map(|v| encode(v, &codebook).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (worker, handle) in handles.into_iter().enumerate() {
        let codes = handle.join().unwrap();
        for (i, code) in codes.into_iter().enumerate() {
            assert_eq!(code, expected[worker + i * 4]);
        }
    }
}

#[test]
fn test_configuration_errors() {
    let data = vec![vec![0.0f32; 10]; 20];

    // 10 is not divisible by 3
    let err = build_codebook(&data, &PQParams::new(3, 4)).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Configuration(_))));

    // More centroids than samples
    let err = build_codebook(&data, &PQParams::new(2, 50)).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Configuration(_))));

    let err = build_codebook(&data, &PQParams::new(2, 0)).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Configuration(_))));
}

#[test]
fn test_identical_points_collapse() {
    // Every sample equal: all centroids coincide, every code is 0
    let data = vec![vec![1.5f32; 8]; 12];
    let codebook = build_codebook(&data, &PQParams::new(2, 4).with_seed(0)).unwrap();

    let code = encode(&data[0], &codebook).unwrap();
    assert_eq!(code, vec![0, 0]);

    let approx = decode(&code, &codebook).unwrap();
    for value in approx {
        assert_relative_eq!(value, 1.5);
    }
}
