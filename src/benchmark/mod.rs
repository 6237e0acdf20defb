//! Evaluation utilities for the index.
//!
//! Approximate search is only as good as its measured recall, so the crate
//! ships what the measurement needs: seeded synthetic datasets, brute-force
//! ground truth, and recall@k.

pub mod datasets;
pub mod evaluation;

pub use datasets::{
    compute_all_ground_truth, compute_ground_truth, create_benchmark_dataset,
    create_clustered_dataset, Dataset,
};
pub use evaluation::recall_at_k;
