//! Graph vertices, the node registry, and the entry-point oracle.
//!
//! The adjacency is a cyclic undirected graph of [`Arc`]-shared nodes. Each
//! node carries its own mutex (`friends`) and the registry carries the list
//! guard; when both are held, the registry lock is acquired strictly first,
//! and no thread ever holds two node mutexes at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::params::{SmallWorldParams, QUERY_TIME_PARAM_NAMES};

/// Identifier reported by [`SmallWorldIndex::method_name`].
pub const METHOD_NAME: &str = "small_world_rand";

/// Sentinel `add_index` of a node that has not been published yet.
pub(crate) const UNPUBLISHED: usize = usize::MAX;

/// Seed offset separating the query-phase RNG stream from worker streams.
const QUERY_RNG_SALT: u64 = 0xA076_1D64_78BD_642F;

/// Shared handle to a graph vertex.
pub(crate) type NodeRef<'p, P> = Arc<SwNode<'p, P>>;

/// A graph vertex: one borrowed data point plus its adjacency.
#[derive(Debug)]
pub(crate) struct SwNode<'p, P: ?Sized> {
    /// The data point. The index never owns or copies points.
    pub(crate) data: &'p P,
    /// Position in the registry. Assigned under the registry lock at
    /// publication, `UNPUBLISHED` until then. Walkers read it without the
    /// registry lock, so it is atomic.
    add_index: AtomicUsize,
    /// Adjacency. Snapshots and appends are serialized per node; the lock
    /// is never held across a distance computation.
    pub(crate) friends: Mutex<Vec<NodeRef<'p, P>>>,
}

impl<'p, P: ?Sized> SwNode<'p, P> {
    /// Construct a detached node: no friends, no publication index.
    pub(crate) fn detached(data: &'p P) -> NodeRef<'p, P> {
        Arc::new(Self {
            data,
            add_index: AtomicUsize::new(UNPUBLISHED),
            friends: Mutex::new(Vec::new()),
        })
    }

    /// Registry position, or [`UNPUBLISHED`] if not yet published.
    pub(crate) fn position(&self) -> usize {
        self.add_index.load(Ordering::Acquire)
    }
}

/// Summary statistics of a built graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SmallWorldStats {
    pub num_nodes: usize,
    /// Directed friend-list entries; each undirected link counts twice.
    pub num_edges: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub avg_degree: f64,
}

/// Randomized small-world graph index over borrowed points.
///
/// Build once with [`SmallWorldIndex::build`], then search many times with
/// [`SmallWorldIndex::knn_search`]. There is no removal or update API.
#[derive(Debug)]
pub struct SmallWorldIndex<'p, P: ?Sized> {
    pub(crate) params: SmallWorldParams,
    /// Effective master seed; worker and query RNG streams derive from it.
    master_seed: u64,
    /// The list guard. Publication takes `write`; size reads, entry
    /// selection, and quiescent query setup take `read`.
    pub(crate) registry: RwLock<Vec<NodeRef<'p, P>>>,
    /// Oracle state for the query phase.
    pub(crate) query_rng: Mutex<StdRng>,
}

/// Uniformly random node of `registry`, or `None` when it is empty.
///
/// The caller must hold the registry lock, or otherwise guarantee the
/// registry is stable (e.g. a quiescent index).
pub(crate) fn random_entry_point<'r, 'p, P: ?Sized>(
    registry: &'r [NodeRef<'p, P>],
    rng: &mut StdRng,
) -> Option<&'r NodeRef<'p, P>> {
    if registry.is_empty() {
        None
    } else {
        Some(&registry[rng.random_range(0..registry.len())])
    }
}

impl<'p, P: ?Sized> SmallWorldIndex<'p, P> {
    /// Empty index with resolved parameters. Callers go through
    /// [`SmallWorldIndex::build`].
    pub(crate) fn with_params(params: SmallWorldParams) -> Self {
        let master_seed = params.seed.unwrap_or_else(rand::random);
        Self {
            params,
            master_seed,
            registry: RwLock::new(Vec::new()),
            query_rng: Mutex::new(StdRng::seed_from_u64(master_seed ^ QUERY_RNG_SALT)),
        }
    }

    /// RNG stream for one build worker, derived from the master seed.
    pub(crate) fn worker_rng(&self, worker: u64) -> StdRng {
        StdRng::seed_from_u64(
            self.master_seed
                .wrapping_add(worker.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        )
    }

    /// Locked entry selection: holds the registry lock for the read.
    pub(crate) fn random_entry_point_locked(&self, rng: &mut StdRng) -> Option<NodeRef<'p, P>> {
        let registry = self.registry.read();
        random_entry_point(&registry, rng).cloned()
    }

    /// Publish a node: assign its registry position and append it, both
    /// under the registry lock. Once this returns, other threads can reach
    /// the node through the entry-point oracle.
    pub(crate) fn publish(&self, node: NodeRef<'p, P>) {
        let mut registry = self.registry.write();
        node.add_index.store(registry.len(), Ordering::Release);
        registry.push(node);
    }

    /// Number of published nodes.
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    /// True when no node has been published.
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }

    /// The data point published at `position`.
    pub fn point_at(&self, position: usize) -> Option<&'p P> {
        self.registry.read().get(position).map(|node| node.data)
    }

    /// Registry positions of the friends of the node at `position`.
    pub fn friends_of(&self, position: usize) -> Option<Vec<usize>> {
        let registry = self.registry.read();
        let node = registry.get(position)?;
        let friends = node.friends.lock();
        Some(friends.iter().map(|f| f.position()).collect())
    }

    /// Degree and edge summary of the graph.
    pub fn stats(&self) -> SmallWorldStats {
        let registry = self.registry.read();
        let mut num_edges = 0usize;
        let mut min_degree = usize::MAX;
        let mut max_degree = 0usize;
        for node in registry.iter() {
            let degree = node.friends.lock().len();
            num_edges += degree;
            min_degree = min_degree.min(degree);
            max_degree = max_degree.max(degree);
        }
        let num_nodes = registry.len();
        SmallWorldStats {
            num_nodes,
            num_edges,
            min_degree: if num_nodes == 0 { 0 } else { min_degree },
            max_degree,
            avg_degree: if num_nodes == 0 {
                0.0
            } else {
                num_edges as f64 / num_nodes as f64
            },
        }
    }

    /// Check the structural invariants on a quiescent index: every node
    /// sits at its assigned registry position, no node befriends itself,
    /// and every friendship is mutual.
    pub fn is_consistent(&self) -> bool {
        let registry = self.registry.read();
        for (position, node) in registry.iter().enumerate() {
            if node.position() != position {
                return false;
            }
            // Snapshot before inspecting the other side, so only one node
            // mutex is ever held.
            let snapshot: Vec<NodeRef<'p, P>> = node.friends.lock().clone();
            for friend in &snapshot {
                if Arc::ptr_eq(friend, node) {
                    return false;
                }
                if friend.position() >= registry.len() {
                    return false;
                }
                let mutual = friend
                    .friends
                    .lock()
                    .iter()
                    .any(|back| Arc::ptr_eq(back, node));
                if !mutual {
                    return false;
                }
            }
        }
        true
    }

    /// The method identifier.
    pub fn method_name(&self) -> &'static str {
        METHOD_NAME
    }

    /// Effective parameters, seed resolution included.
    pub fn params(&self) -> &SmallWorldParams {
        &self.params
    }

    /// The master seed in effect, whether given or drawn from entropy.
    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Apply a query-time option map; only the options named by
    /// [`SmallWorldIndex::query_time_param_names`] are accepted.
    pub fn set_query_time_params(&mut self, options: &Map<String, Value>) -> Result<()> {
        self.params.apply_query_time_options(options)
    }

    /// Names of the parameters that may change after build.
    pub fn query_time_param_names(&self) -> &'static [&'static str] {
        QUERY_TIME_PARAM_NAMES
    }
}

impl<P: ?Sized> Drop for SmallWorldIndex<'_, P> {
    fn drop(&mut self) {
        // Friends lists form Arc cycles; clear the adjacency so the nodes
        // can be freed when the registry goes.
        for node in self.registry.get_mut().iter() {
            node.friends.lock().clear();
        }
    }
}
