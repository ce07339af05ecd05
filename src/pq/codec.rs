//! Encoding and decoding of single vectors against a trained codebook

use crate::pq::Codebook;
use crate::{Error, Result};

/// Compressed vector: one centroid index per subspace
pub type PQCode = Vec<u16>;

/// Encode a vector as the index of its nearest centroid in every subspace
pub fn encode(vector: &[f32], codebook: &Codebook) -> Result<PQCode> {
    if vector.len() != codebook.dimension() {
        return Err(Error::DimensionMismatch {
            expected: codebook.dimension(),
            actual: vector.len(),
        }
        .into());
    }

    (0..codebook.num_subspaces())
        .map(|subspace_idx| -> Result<u16> {
            let subvector = codebook.subvector(vector, subspace_idx);
            let (code, _) = codebook.find_closest_centroid(subspace_idx, subvector)?;
            // MAX_CENTROIDS keeps every index within u16
            Ok(code as u16)
        })
        .collect()
}

/// Decode a code back into an approximate vector by concatenating centroids
pub fn decode(code: &[u16], codebook: &Codebook) -> Result<Vec<f32>> {
    if code.len() != codebook.num_subspaces() {
        return Err(Error::DimensionMismatch {
            expected: codebook.num_subspaces(),
            actual: code.len(),
        }
        .into());
    }

    let mut decoded = Vec::with_capacity(codebook.dimension());

    for (subspace_idx, &centroid_idx) in code.iter().enumerate() {
        let centroid = codebook.centroid(subspace_idx, centroid_idx as usize)?;
        decoded.extend_from_slice(centroid);
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codebook() -> Codebook {
        Codebook::new(vec![
            vec![vec![0.0, 0.0], vec![10.0, 10.0]],
            vec![vec![1.0, 1.0], vec![-1.0, -1.0]],
            vec![vec![2.0, 0.0], vec![0.0, 2.0]],
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_picks_nearest_per_subspace() {
        let codebook = codebook();
        let code = encode(&[9.0, 8.0, 0.9, 1.2, 0.1, 1.9], &codebook).unwrap();
        assert_eq!(code, vec![1, 0, 1]);
    }

    #[test]
    fn test_decode_concatenates_centroids() {
        let codebook = codebook();
        let decoded = decode(&[1, 1, 0], &codebook).unwrap();
        assert_eq!(decoded, vec![10.0, 10.0, -1.0, -1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_reencode_is_stable() {
        let codebook = codebook();
        let v = [3.0, 4.0, -0.2, 0.3, 1.0, 1.1];

        let code = encode(&v, &codebook).unwrap();
        let reconstructed = decode(&code, &codebook).unwrap();
        assert_eq!(encode(&reconstructed, &codebook).unwrap(), code);
    }

    #[test]
    fn test_encode_wrong_length() {
        let err = encode(&[1.0, 2.0], &codebook()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DimensionMismatch { expected: 6, actual: 2 })
        ));
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = decode(&[0, 1], &codebook()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_decode_out_of_range_code() {
        let err = decode(&[0, 2, 0], &codebook()).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::InvalidCode { subspace, code, num_centroids }) => {
                assert_eq!(*subspace, 1);
                assert_eq!(*code, 2);
                assert_eq!(*num_centroids, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
