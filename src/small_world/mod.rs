//! Randomized navigable small world (NSW) graph index.
//!
//! Builds an undirected graph over opaque points by inserting them one at a
//! time: each insertion greedily searches the current graph for its `NN`
//! nearest neighbors, links to them symmetrically, and publishes itself.
//! Queries run the same greedy walk from a handful of random entry points
//! and keep the k nearest points observed.
//!
//! # Quick Start
//!
//! ```ignore
//! use proxima::{KnnCollector, L2Space, SmallWorldIndex, SmallWorldParams};
//!
//! let data: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
//! let params = SmallWorldParams { nn: 10, seed: Some(42), ..Default::default() };
//! let index = SmallWorldIndex::build(&L2Space, &data, params)?;
//!
//! let mut knn = KnnCollector::new(10, |p: &[f32]| proxima::space::l2_distance_squared(&query, p));
//! index.knn_search(&mut knn)?;
//! let hits = knn.into_sorted_hits();
//! ```
//!
//! # Why No Hierarchy?
//!
//! This is the flat, randomized ancestor of HNSW: no layers, no entry-point
//! maintenance, no neighbor diversification. Restarting the walk from
//! several random entries substitutes for the hierarchy's long-range hops.
//! Accuracy comes from `NN`, `initIndexAttempts`, and `initSearchAttempts`
//! rather than from graph shaping, which also means nothing here assumes
//! the distance is a metric: the walk only ever compares distances to the
//! same query.
//!
//! # Concurrency Model
//!
//! The build phase runs many inserters in parallel over a shared, growing
//! graph. Two locks exist: the registry lock (membership and size) and one
//! mutex per node (its adjacency). The registry lock is acquired strictly
//! before any node mutex, and no thread ever holds two node mutexes, so no
//! lock cycle can form. Queries assume a quiescent index; read-only
//! searches may run concurrently with each other.
//!
//! # References
//!
//! - Malkov, Ponomarenko, Logvinov & Krylov (2014). "Approximate nearest
//!   neighbor algorithm based on navigable small world graphs."
//! - Boytsov & Naidan (2013). "Engineering Efficient and Effective
//!   Non-metric Space Library."

mod construction;
mod graph;
mod search;

pub use graph::{SmallWorldIndex, SmallWorldStats, METHOD_NAME};
