//! Seeded synthetic datasets and brute-force ground truth.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::space::l2_distance_squared;

/// A dataset for evaluating the index: database vectors plus held-out
/// queries.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Vectors to index.
    pub train: Vec<Vec<f32>>,
    /// Held-out query vectors.
    pub test: Vec<Vec<f32>>,
    /// Vector dimensionality.
    pub dimension: usize,
}

impl Dataset {
    /// Number of database vectors.
    pub fn n_train(&self) -> usize {
        self.train.len()
    }

    /// Number of query vectors.
    pub fn n_test(&self) -> usize {
        self.test.len()
    }

    /// Borrow the training vectors as the point slices the index consumes.
    pub fn train_points(&self) -> Vec<&[f32]> {
        self.train.iter().map(Vec::as_slice).collect()
    }
}

/// Uniform random vectors in `[0, 1]^d`.
///
/// A structureless baseline; real data tends to cluster, which is what
/// [`create_clustered_dataset`] is for.
pub fn create_benchmark_dataset(
    n_train: usize,
    n_test: usize,
    dimension: usize,
    seed: u64,
) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let train: Vec<Vec<f32>> = (0..n_train)
        .map(|_| (0..dimension).map(|_| rng.random::<f32>()).collect())
        .collect();

    let test: Vec<Vec<f32>> = (0..n_test)
        .map(|_| (0..dimension).map(|_| rng.random::<f32>()).collect())
        .collect();

    Dataset {
        train,
        test,
        dimension,
    }
}

/// Gaussian clusters around uniformly drawn centers.
pub fn create_clustered_dataset(
    n_train: usize,
    n_test: usize,
    dimension: usize,
    n_clusters: usize,
    cluster_std: f32,
    seed: u64,
) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let centers: Vec<Vec<f32>> = (0..n_clusters)
        .map(|_| (0..dimension).map(|_| rng.random::<f32>()).collect())
        .collect();

    let sample_near_center = |rng: &mut StdRng, center: &[f32]| -> Vec<f32> {
        center
            .iter()
            .map(|&c| {
                // Box-Muller for Gaussian noise around the center.
                let u1: f32 = rng.random();
                let u2: f32 = rng.random();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
                (c + z * cluster_std).clamp(0.0, 1.0)
            })
            .collect()
    };

    let train: Vec<Vec<f32>> = (0..n_train)
        .map(|_| {
            let cluster_idx = rng.random_range(0..n_clusters);
            sample_near_center(&mut rng, &centers[cluster_idx])
        })
        .collect();

    let test: Vec<Vec<f32>> = (0..n_test)
        .map(|_| {
            let cluster_idx = rng.random_range(0..n_clusters);
            sample_near_center(&mut rng, &centers[cluster_idx])
        })
        .collect();

    Dataset {
        train,
        test,
        dimension,
    }
}

/// Exact k nearest neighbors of `query` in `database`, by brute force.
///
/// Returns database positions, nearest first, directly comparable to the
/// registry positions the index reports.
pub fn compute_ground_truth(query: &[f32], database: &[Vec<f32>], k: usize) -> Vec<usize> {
    let mut distances: Vec<(usize, f32)> = database
        .iter()
        .enumerate()
        .map(|(i, vec)| (i, l2_distance_squared(query, vec)))
        .collect();

    distances.sort_by(|a, b| a.1.total_cmp(&b.1));
    distances.into_iter().take(k).map(|(id, _)| id).collect()
}

/// Ground truth for every test query of a dataset.
pub fn compute_all_ground_truth(dataset: &Dataset, k: usize) -> Vec<Vec<usize>> {
    dataset
        .test
        .iter()
        .map(|query| compute_ground_truth(query, &dataset.train, k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_dataset_has_requested_shape() {
        let dataset = create_benchmark_dataset(100, 10, 16, 42);
        assert_eq!(dataset.n_train(), 100);
        assert_eq!(dataset.n_test(), 10);
        assert_eq!(dataset.dimension, 16);
        assert_eq!(dataset.train[0].len(), 16);
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = create_benchmark_dataset(50, 5, 8, 7);
        let b = create_benchmark_dataset(50, 5, 8, 7);
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn clustered_dataset_stays_in_unit_cube() {
        let dataset = create_clustered_dataset(500, 50, 16, 8, 0.1, 42);
        for vec in dataset.train.iter().chain(dataset.test.iter()) {
            assert!(vec.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn ground_truth_orders_by_distance() {
        let database = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        ];
        let query = vec![0.1, 0.1];
        let gt = compute_ground_truth(&query, &database, 2);
        assert_eq!(gt[0], 0);
        assert!(gt[1] == 1 || gt[1] == 2);
    }
}
