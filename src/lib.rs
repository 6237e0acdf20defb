//! proxima: a randomized small-world graph index for approximate
//! nearest-neighbor search.
//!
//! The index maintains an undirected graph over a dataset of opaque,
//! borrowed points. Insertion and query share one primitive: a greedy
//! best-first walk from random entry points that terminates at a local
//! minimum. The graph is built once (concurrently, with per-node locking)
//! and searched many times.
//!
//! Because every comparison is between distances to the same query point,
//! the distance space does not have to be a metric: no triangle
//! inequality, no non-negativity. See [`space::DotProductSpace`] for a
//! deliberately non-metric example.
//!
//! # Components
//!
//! - [`small_world`]: the graph, the inserter, the parallel build driver,
//!   and the greedy walker ([`SmallWorldIndex`]).
//! - [`space`]: the build-time distance abstraction ([`Space`]).
//! - [`query`]: the k-NN query trait and the default result sink
//!   ([`KnnQuery`], [`KnnCollector`]).
//! - [`params`]: the named-option parameter surface
//!   ([`SmallWorldParams`]).
//! - [`benchmark`]: seeded synthetic datasets, brute-force ground truth,
//!   and recall measurement for evaluating the index.
//!
//! # What this is not
//!
//! No deletions, no updates, no persistence, no range queries, no
//! exactness guarantee. Accuracy is tuned with `NN`, `initIndexAttempts`
//! and `initSearchAttempts`, and measured with the `benchmark` module.

pub mod benchmark;
pub mod error;
pub mod params;
pub mod query;
pub mod small_world;
pub mod space;

pub use error::{IndexError, Result};
pub use params::SmallWorldParams;
pub use query::{KnnCollector, KnnQuery};
pub use small_world::{SmallWorldIndex, SmallWorldStats, METHOD_NAME};
pub use space::{DotProductSpace, L2Space, Space};
