//! The greedy k-closest walk, shared by insertion and query.
//!
//! Each attempt starts from a random entry point and expands a best-first
//! frontier until the nearest unexpanded candidate is farther than the
//! worst of the k best distances seen: a local minimum. The visited set is
//! a dense bit-vector sized to a registry snapshot taken at the start of
//! the walk; nodes published after the snapshot are tracked by identity in
//! a small side list so that no node is expanded twice within one walk.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use smallvec::SmallVec;
use tracing::trace;

use super::graph::{NodeRef, SmallWorldIndex, SwNode};
use crate::error::{IndexError, Result};
use crate::query::KnnQuery;

/// An `f32` distance keyed by total order, usable in a heap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DistKey(pub(crate) f32);

impl Eq for DistKey {}

impl PartialOrd for DistKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A node together with its distance to the walk's query.
///
/// Ordered by distance, so a plain `BinaryHeap` is a max-heap over it and
/// `Reverse` turns it into the min-heap frontier.
pub(crate) struct Candidate<'p, P: ?Sized> {
    pub(crate) dist: f32,
    pub(crate) node: NodeRef<'p, P>,
}

impl<P: ?Sized> PartialEq for Candidate<'_, P> {
    fn eq(&self, other: &Self) -> bool {
        self.dist.total_cmp(&other.dist).is_eq()
    }
}

impl<P: ?Sized> Eq for Candidate<'_, P> {}

impl<P: ?Sized> PartialOrd for Candidate<'_, P> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: ?Sized> Ord for Candidate<'_, P> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist.total_cmp(&other.dist)
    }
}

/// How the walk treats nodes published after its registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VisitedPolicy {
    /// Concurrent build: such nodes are expandable but tracked by identity
    /// instead of by bit.
    Tolerant,
    /// Quiescent query: such nodes cannot exist; finding one is an
    /// invariant violation.
    Strict,
}

/// The consumer side of a walk: computes distances and receives each point
/// accepted into the k best seen.
pub(crate) trait WalkDriver<'p, P: ?Sized> {
    fn distance(&mut self, point: &'p P) -> f32;
    fn emit(&mut self, dist: f32, node: &NodeRef<'p, P>);
}

/// Push `d` into the capped k-best heap. Returns whether `d` was accepted:
/// below capacity, or improving on the worst retained.
fn accept(closest: &mut BinaryHeap<DistKey>, k: usize, d: f32) -> bool {
    let worthy = closest.len() < k || closest.peek().is_some_and(|worst| d < worst.0);
    closest.push(DistKey(d));
    if closest.len() > k {
        closest.pop();
    }
    worthy
}

impl<'p, P: ?Sized> SmallWorldIndex<'p, P> {
    /// Run `attempts` greedy walks toward the driver's query, feeding it
    /// every point accepted into the k best seen.
    pub(crate) fn walk<D>(
        &self,
        driver: &mut D,
        k: usize,
        attempts: usize,
        policy: VisitedPolicy,
        rng: &mut StdRng,
    ) -> Result<()>
    where
        D: WalkDriver<'p, P>,
    {
        if k == 0 || attempts == 0 {
            return Ok(());
        }

        // Registry snapshot under the list guard. The visited set covers
        // all attempts of this walk.
        let snapshot_len = self.registry.read().len();
        let mut visited = vec![false; snapshot_len];
        // Identity tracking for nodes published after the snapshot.
        let mut overflow: Vec<*const SwNode<'p, P>> = Vec::new();
        // Friend-list snapshot buffer, reused across expansions.
        let mut scratch: SmallVec<[NodeRef<'p, P>; 16]> = SmallVec::new();

        for _ in 0..attempts {
            let Some(entry) = self.random_entry_point_locked(rng) else {
                // Nothing published yet: this attempt is a no-op.
                continue;
            };

            let mut closest: BinaryHeap<DistKey> = BinaryHeap::with_capacity(k + 1);
            let mut frontier: BinaryHeap<Reverse<Candidate<'p, P>>> = BinaryHeap::new();

            let d = driver.distance(entry.data);
            match mark(&mut visited, &mut overflow, &entry, policy) {
                Mark::Fresh | Mark::Seen => {}
                Mark::Invalid => return Err(IndexError::UninitializedIndex),
            }
            if accept(&mut closest, k, d) {
                driver.emit(d, &entry);
            }
            frontier.push(Reverse(Candidate { dist: d, node: entry }));

            while let Some(Reverse(current)) = frontier.pop() {
                let lower_bound = closest.peek().map_or(f32::INFINITY, |worst| worst.0);
                // Local minimum: the nearest unexpanded candidate cannot
                // improve the k best seen.
                if current.dist > lower_bound {
                    break;
                }

                // Snapshot the adjacency and release the node's lock before
                // any distance computation. The handles stay valid; the
                // list may grow behind us, which later walks will see.
                scratch.clear();
                {
                    let friends = current.node.friends.lock();
                    scratch.extend(friends.iter().cloned());
                }

                for friend in scratch.drain(..) {
                    match mark(&mut visited, &mut overflow, &friend, policy) {
                        Mark::Seen => continue,
                        Mark::Invalid => return Err(IndexError::UninitializedIndex),
                        Mark::Fresh => {}
                    }
                    let d = driver.distance(friend.data);
                    if accept(&mut closest, k, d) {
                        driver.emit(d, &friend);
                    }
                    frontier.push(Reverse(Candidate { dist: d, node: friend }));
                }
            }
        }
        Ok(())
    }

    /// Approximate k-NN search: `query.result_capacity()` nearest points,
    /// funneled through `query.offer`.
    ///
    /// The index must be quiescent: built, with no insertion in flight.
    /// Concurrent read-only searches are fine.
    pub fn knn_search<Q>(&self, query: &mut Q) -> Result<()>
    where
        Q: KnnQuery<'p, P>,
    {
        let k = query.result_capacity();
        let attempts = self.params.init_search_attempts;
        trace!(k, attempts, "knn search");

        // Derive a per-query stream so concurrent searches don't serialize
        // on the shared oracle state.
        let mut rng = {
            use rand::{Rng, SeedableRng};
            let mut shared = self.query_rng.lock();
            StdRng::seed_from_u64(shared.random())
        };

        let mut driver = QueryDriver { query };
        self.walk(&mut driver, k, attempts, VisitedPolicy::Strict, &mut rng)
    }

    /// Range queries are not provided by this method.
    pub fn range_search(&self, _radius: f32) -> Result<()> {
        Err(IndexError::UnsupportedOperation("range search"))
    }
}

/// Outcome of visiting a node against the walk's visited set.
enum Mark {
    /// First visit; the caller should evaluate and expand it.
    Fresh,
    /// Already visited in this walk.
    Seen,
    /// Beyond the snapshot under the strict policy.
    Invalid,
}

fn mark<'p, P: ?Sized>(
    visited: &mut [bool],
    overflow: &mut Vec<*const SwNode<'p, P>>,
    node: &NodeRef<'p, P>,
    policy: VisitedPolicy,
) -> Mark {
    let position = node.position();
    if position < visited.len() {
        if visited[position] {
            Mark::Seen
        } else {
            visited[position] = true;
            Mark::Fresh
        }
    } else {
        match policy {
            VisitedPolicy::Strict => Mark::Invalid,
            VisitedPolicy::Tolerant => {
                // Published after the snapshot (or not yet published, seen
                // through a half-made link): un-markable in the bit-vector,
                // so track it by identity.
                let ptr = std::sync::Arc::as_ptr(node);
                if overflow.contains(&ptr) {
                    Mark::Seen
                } else {
                    overflow.push(ptr);
                    Mark::Fresh
                }
            }
        }
    }
}

struct QueryDriver<'q, Q> {
    query: &'q mut Q,
}

impl<'p, P: ?Sized, Q> WalkDriver<'p, P> for QueryDriver<'_, Q>
where
    Q: KnnQuery<'p, P>,
{
    fn distance(&mut self, point: &'p P) -> f32 {
        self.query.distance_to(point)
    }

    fn emit(&mut self, dist: f32, node: &NodeRef<'p, P>) {
        self.query.offer(dist, node.data);
    }
}
