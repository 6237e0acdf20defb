//! Incremental insertion and the parallel build driver.
//!
//! Insertion walks the current graph to find a neighborhood for the new
//! node, links the node symmetrically to each neighbor, and only then
//! publishes it into the registry. Workers interleave: each one queries a
//! graph the others are still growing, which is what gives the small-world
//! structure its shortcuts.

use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use tracing::debug;

use super::graph::{NodeRef, SmallWorldIndex, SwNode};
use super::search::{Candidate, VisitedPolicy, WalkDriver};
use crate::error::{IndexError, Result};
use crate::params::SmallWorldParams;
use crate::space::Space;

/// Capped max-heap of insertion candidates, deduplicated by node identity.
struct NeighborCollector<'p, P: ?Sized> {
    cap: usize,
    heap: BinaryHeap<Candidate<'p, P>>,
}

impl<'p, P: ?Sized> NeighborCollector<'p, P> {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            heap: BinaryHeap::with_capacity(cap + 1),
        }
    }

    fn offer(&mut self, dist: f32, node: &NodeRef<'p, P>) {
        // The walk may rediscover a node from another attempt's entry
        // point; link each neighbor once.
        if self.heap.iter().any(|c| Arc::ptr_eq(&c.node, node)) {
            return;
        }
        if self.heap.len() < self.cap {
            self.heap.push(Candidate {
                dist,
                node: node.clone(),
            });
        } else if self.heap.peek().is_some_and(|worst| dist < worst.dist) {
            self.heap.push(Candidate {
                dist,
                node: node.clone(),
            });
            self.heap.pop();
        }
    }
}

/// Walk driver for insertion: distances come from the space, accepted
/// nodes become link candidates.
struct InsertDriver<'s, 'p, P: ?Sized, S> {
    space: &'s S,
    new_point: &'p P,
    neighbors: NeighborCollector<'p, P>,
}

impl<'p, P: ?Sized, S> WalkDriver<'p, P> for InsertDriver<'_, 'p, P, S>
where
    S: Space<P>,
{
    fn distance(&mut self, point: &'p P) -> f32 {
        self.space.index_time_distance(self.new_point, point)
    }

    fn emit(&mut self, dist: f32, node: &NodeRef<'p, P>) {
        self.neighbors.offer(dist, node);
    }
}

/// Symmetrically append two nodes to each other's friends lists.
///
/// Each append takes only its own node's lock, one at a time; the transient
/// one-sided state between the two appends is tolerated by the walker.
fn link<'p, P: ?Sized>(a: &NodeRef<'p, P>, b: &NodeRef<'p, P>) {
    a.friends.lock().push(b.clone());
    b.friends.lock().push(a.clone());
}

impl<'p, P: ?Sized> SmallWorldIndex<'p, P> {
    /// Build an index over `data`, in input order.
    ///
    /// The first point seeds the graph; the rest are inserted by
    /// `indexThreadQty` workers (serially when that is 0 or 1). Points are
    /// borrowed for the life of the index, never copied.
    pub fn build<S>(space: &S, data: &[&'p P], params: SmallWorldParams) -> Result<Self>
    where
        S: Space<P>,
        P: Sync,
    {
        params.validate()?;
        let index = Self::with_params(params);
        debug!(
            nn = index.params.nn,
            init_index_attempts = index.params.init_index_attempts,
            init_search_attempts = index.params.init_search_attempts,
            index_thread_qty = index.params.index_thread_qty,
            seed = index.seed(),
            "building small_world_rand index"
        );

        if data.is_empty() {
            return Ok(index);
        }

        // The seed node is published directly: it has no neighbors to
        // find, and one node must exist before any concurrent add runs.
        index.publish(SwNode::detached(data[0]));

        let workers = index.params.index_thread_qty;
        if workers <= 1 {
            let mut rng = index.worker_rng(0);
            for &point in &data[1..] {
                index.add(space, SwNode::detached(point), &mut rng)?;
            }
        } else {
            index.build_parallel(space, data, workers)?;
        }
        Ok(index)
    }

    fn build_parallel<S>(&self, space: &S, data: &[&'p P], workers: usize) -> Result<()>
    where
        S: Space<P>,
        P: Sync,
    {
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || -> Result<()> {
                        let mut rng = self.worker_rng(worker as u64);
                        // Element 0 is the already-published seed.
                        for position in (1..data.len()).filter(|i| i % workers == worker) {
                            self.add(space, SwNode::detached(data[position]), &mut rng)?;
                        }
                        Ok(())
                    })
                })
                .collect();

            let mut first_error = None;
            for handle in handles {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        first_error.get_or_insert(e);
                    }
                    Err(_) => {
                        first_error
                            .get_or_insert(IndexError::WorkerFailed("worker panicked".into()));
                    }
                }
            }
            match first_error {
                None => {
                    debug!(workers, "indexing workers finished");
                    Ok(())
                }
                Some(e) => Err(e),
            }
        })
    }

    /// Insert one detached node: find its neighborhood, link it, publish it.
    ///
    /// The registry must already hold the seed node; insertion into an
    /// empty graph is a protocol violation, not a fallback path.
    pub(crate) fn add<S>(&self, space: &S, node: NodeRef<'p, P>, rng: &mut StdRng) -> Result<()>
    where
        S: Space<P>,
    {
        node.friends.lock().clear();

        if self.registry.read().is_empty() {
            return Err(IndexError::EmptyRegistry);
        }

        let mut driver = InsertDriver {
            space,
            new_point: node.data,
            neighbors: NeighborCollector::new(self.params.nn),
        };
        self.walk(
            &mut driver,
            self.params.nn,
            self.params.init_index_attempts,
            VisitedPolicy::Tolerant,
            rng,
        )?;

        // Link order (worst candidate first, off the heap) does not
        // matter for the structure.
        let mut neighbors = driver.neighbors.heap;
        while let Some(candidate) = neighbors.pop() {
            link(&candidate.node, &node);
        }

        self.publish(node);
        Ok(())
    }
}
